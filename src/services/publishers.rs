//! Publisher, book series and publication series mutations.

use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::repository::publishers::{self, BookseriesRow, PublisherRow, PubseriesRow};
use crate::repository::{logs, Repository};
use crate::services::audit::{
    self, clean_description, clean_string, rel_id, str_differ, IntOpts, OldValues,
};

#[derive(Clone)]
pub struct PublishersService {
    repo: Repository,
}

impl PublishersService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn create_publisher(&self, user_id: Option<i32>, data: &Value) -> ApiResult<i32> {
        let name = clean_string(data.get("name"))
            .ok_or_else(|| ApiError::BadRequest("Nimi on pakollinen tieto.".to_string()))?;
        let fullname = clean_string(data.get("fullname"));

        let mut tx = self.repo.pool.begin().await?;
        if publishers::publisher_name_in_use(tx.as_mut(), &name, fullname.as_deref(), 0).await? {
            return Err(ApiError::Conflict("Nimi on jo käytössä.".to_string()));
        }
        let row = PublisherRow {
            id: 0,
            name: name.clone(),
            fullname,
            description: clean_description(data.get("description")),
            image_src: clean_string(data.get("image_src")),
            image_attr: clean_string(data.get("image_attr")),
        };
        let publisher_id = publishers::insert_publisher_row(tx.as_mut(), &row).await?;
        logs::log_create(tx.as_mut(), "publisher", publisher_id, &name, user_id).await?;
        tx.commit().await?;
        Ok(publisher_id)
    }

    pub async fn update_publisher(&self, user_id: Option<i32>, data: &Value) -> ApiResult<()> {
        let id = audit::require_int(
            data.get("id"),
            IntOpts::positive(),
            "Virheellinen tunniste.",
        )?;

        let mut tx = self.repo.pool.begin().await?;
        let Some(mut row) = publishers::fetch_publisher_row(tx.as_mut(), id).await? else {
            return Err(ApiError::BadRequest("Kustantajaa ei löydy.".to_string()));
        };
        let mut old = OldValues::new();

        if data.get("name").is_some() {
            let new = clean_string(data.get("name"))
                .ok_or_else(|| ApiError::BadRequest("Nimi on pakollinen tieto.".to_string()))?;
            if str_differ(Some(&row.name), Some(&new)) {
                if publishers::publisher_name_in_use(tx.as_mut(), &new, None, id).await? {
                    return Err(ApiError::Conflict("Nimi on jo käytössä.".to_string()));
                }
                old.record("Nimi", Some(row.name.clone()));
                row.name = new;
            }
        }
        if data.get("fullname").is_some() {
            let new = clean_string(data.get("fullname"));
            if str_differ(row.fullname.as_deref(), new.as_deref()) {
                if let Some(fullname) = &new {
                    if publishers::publisher_name_in_use(tx.as_mut(), "", Some(fullname), id)
                        .await?
                    {
                        return Err(ApiError::Conflict("Nimi on jo käytössä.".to_string()));
                    }
                }
                old.record("Koko nimi", row.fullname.clone());
                row.fullname = new;
            }
        }
        if data.get("description").is_some() {
            let new = clean_description(data.get("description"));
            if str_differ(row.description.as_deref(), new.as_deref()) {
                old.record("Kuvaus", row.description.clone());
                row.description = new;
            }
        }
        if data.get("image_src").is_some() {
            let new = clean_string(data.get("image_src"));
            if str_differ(row.image_src.as_deref(), new.as_deref()) {
                old.record("Kuvan lähde", row.image_src.clone());
                row.image_src = new;
            }
        }

        if old.is_empty() {
            return Ok(());
        }
        publishers::update_publisher_row(tx.as_mut(), &row).await?;
        logs::log_update(tx.as_mut(), "publisher", id, &row.name, user_id, &old).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_publisher(&self, user_id: Option<i32>, id: i32) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        let Some(row) = publishers::fetch_publisher_row(tx.as_mut(), id).await? else {
            return Err(ApiError::BadRequest("Kustantajaa ei löydy.".to_string()));
        };

        let mut old = OldValues::new();
        old.record("Nimi", Some(row.name.clone()));
        logs::log_delete(tx.as_mut(), "publisher", id, &row.name, user_id, &old).await?;
        publishers::delete_publisher_cascade(tx.as_mut(), id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn create_bookseries(&self, user_id: Option<i32>, data: &Value) -> ApiResult<i32> {
        let name = clean_string(data.get("name"))
            .ok_or_else(|| ApiError::BadRequest("Nimi puuttuu.".to_string()))?;

        let mut tx = self.repo.pool.begin().await?;
        if publishers::bookseries_name_in_use(tx.as_mut(), &name, 0).await? {
            return Err(ApiError::Conflict("Nimi on jo olemassa.".to_string()));
        }
        let row = BookseriesRow {
            id: 0,
            name: name.clone(),
            orig_name: clean_string(data.get("orig_name")),
            image_src: clean_string(data.get("image_src")),
            image_attr: clean_string(data.get("image_attr")),
            important: data
                .get("important")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        };
        let series_id = publishers::insert_bookseries_row(tx.as_mut(), &row).await?;
        logs::log_create(tx.as_mut(), "bookseries", series_id, &name, user_id).await?;
        tx.commit().await?;
        Ok(series_id)
    }

    pub async fn update_bookseries(&self, user_id: Option<i32>, data: &Value) -> ApiResult<()> {
        let id = audit::require_int(
            data.get("id"),
            IntOpts::positive(),
            "Virheellinen tunniste.",
        )?;

        let mut tx = self.repo.pool.begin().await?;
        let Some(mut row) = publishers::fetch_bookseries_row(tx.as_mut(), id).await? else {
            return Err(ApiError::BadRequest("Kirjasarjaa ei löydy.".to_string()));
        };
        let mut old = OldValues::new();

        if data.get("name").is_some() {
            let new = clean_string(data.get("name"))
                .ok_or_else(|| ApiError::BadRequest("Nimi ei voi olla tyhjä.".to_string()))?;
            if str_differ(Some(&row.name), Some(&new)) {
                if publishers::bookseries_name_in_use(tx.as_mut(), &new, id).await? {
                    return Err(ApiError::Conflict("Nimi on jo olemassa.".to_string()));
                }
                old.record("Nimi", Some(row.name.clone()));
                row.name = new;
            }
        }
        if data.get("orig_name").is_some() {
            let new = clean_string(data.get("orig_name"));
            if str_differ(row.orig_name.as_deref(), new.as_deref()) {
                old.record("Alkukielinen nimi", row.orig_name.clone());
                row.orig_name = new;
            }
        }
        if let Some(new) = data.get("important").and_then(Value::as_bool) {
            if row.important != new {
                old.record("Tärkeä", Some(row.important.to_string()));
                row.important = new;
            }
        }

        if old.is_empty() {
            return Ok(());
        }
        publishers::update_bookseries_row(tx.as_mut(), &row).await?;
        logs::log_update(tx.as_mut(), "bookseries", id, &row.name, user_id, &old).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_bookseries(&self, user_id: Option<i32>, id: i32) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        let Some(row) = publishers::fetch_bookseries_row(tx.as_mut(), id).await? else {
            return Err(ApiError::BadRequest("Kirjasarjaa ei löydy.".to_string()));
        };

        let mut old = OldValues::new();
        old.record("Nimi", Some(row.name.clone()));
        logs::log_delete(tx.as_mut(), "bookseries", id, &row.name, user_id, &old).await?;
        publishers::delete_bookseries_row(tx.as_mut(), id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn create_pubseries(&self, user_id: Option<i32>, data: &Value) -> ApiResult<i32> {
        let name = clean_string(data.get("name"))
            .ok_or_else(|| ApiError::BadRequest("Sarjan nimi on pakollinen tieto.".to_string()))?;
        let publisher_id = rel_id(data.get("publisher"))
            .or_else(|| audit::check_int(data.get("publisher_id"), IntOpts::positive()))
            .ok_or_else(|| ApiError::BadRequest("Kustantaja on pakollinen tieto.".to_string()))?;

        let mut tx = self.repo.pool.begin().await?;
        if publishers::pubseries_name_in_use(tx.as_mut(), &name, 0).await? {
            return Err(ApiError::Conflict(format!("Sarja on jo olemassa: {name}")));
        }
        if publishers::fetch_publisher_row(tx.as_mut(), publisher_id)
            .await?
            .is_none()
        {
            return Err(ApiError::BadRequest(format!(
                "Kustantajaa ei ole olemassa: {publisher_id}"
            )));
        }
        let row = PubseriesRow {
            id: 0,
            name,
            publisher_id: Some(publisher_id),
            important: data
                .get("important")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            image_src: clean_string(data.get("image_src")),
            image_attr: clean_string(data.get("image_attr")),
        };
        let series_id = publishers::insert_pubseries_row(tx.as_mut(), &row).await?;
        logs::log_create(tx.as_mut(), "pubseries", series_id, &row.name, user_id).await?;
        tx.commit().await?;
        Ok(series_id)
    }

    pub async fn update_pubseries(&self, user_id: Option<i32>, data: &Value) -> ApiResult<()> {
        let id = audit::require_int(
            data.get("id"),
            IntOpts::positive(),
            "Virheellinen tunniste.",
        )?;

        let mut tx = self.repo.pool.begin().await?;
        let Some(mut row) = publishers::fetch_pubseries_row(tx.as_mut(), id).await? else {
            return Err(ApiError::BadRequest(format!("Sarjaa ei löydy: {id}")));
        };
        let mut old = OldValues::new();

        if data.get("name").is_some() {
            let new = clean_string(data.get("name")).ok_or_else(|| {
                ApiError::BadRequest("Sarjan nimi on pakollinen tieto.".to_string())
            })?;
            if str_differ(Some(&row.name), Some(&new)) {
                if publishers::pubseries_name_in_use(tx.as_mut(), &new, id).await? {
                    return Err(ApiError::Conflict(format!("Sarja on jo olemassa: {new}")));
                }
                old.record("Nimi", Some(row.name.clone()));
                row.name = new;
            }
        }
        if data.get("publisher").is_some() || data.get("publisher_id").is_some() {
            let new = rel_id(data.get("publisher"))
                .or_else(|| audit::check_int(data.get("publisher_id"), IntOpts::positive()))
                .ok_or_else(|| {
                    ApiError::BadRequest("Kustantaja on pakollinen tieto.".to_string())
                })?;
            if row.publisher_id != Some(new) {
                if publishers::fetch_publisher_row(tx.as_mut(), new).await?.is_none() {
                    return Err(ApiError::BadRequest(format!("Kustantajaa ei löydy: {new}")));
                }
                old.record_i32("Kustantaja", row.publisher_id);
                row.publisher_id = Some(new);
            }
        }
        if let Some(new) = data.get("important").and_then(Value::as_bool) {
            if row.important != new {
                old.record("Tärkeä", Some(row.important.to_string()));
                row.important = new;
            }
        }
        if data.get("image_src").is_some() {
            let new = clean_string(data.get("image_src"));
            if str_differ(row.image_src.as_deref(), new.as_deref()) {
                old.record("Kuvan lähde", row.image_src.clone());
                row.image_src = new;
            }
        }

        if old.is_empty() {
            return Ok(());
        }
        publishers::update_pubseries_row(tx.as_mut(), &row).await?;
        logs::log_update(tx.as_mut(), "pubseries", id, &row.name, user_id, &old).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_pubseries(&self, user_id: Option<i32>, id: i32) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        let Some(row) = publishers::fetch_pubseries_row(tx.as_mut(), id).await? else {
            return Err(ApiError::NotFound(format!("Sarjaa ei löydy: {id}")));
        };

        let mut old = OldValues::new();
        old.record("Nimi", Some(row.name.clone()));
        logs::log_delete(tx.as_mut(), "pubseries", id, &row.name, user_id, &old).await?;
        publishers::delete_pubseries_row(tx.as_mut(), id).await?;
        tx.commit().await?;
        Ok(())
    }
}
