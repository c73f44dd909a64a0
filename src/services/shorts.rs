//! Short story mutations.

use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::models::refs::role;
use crate::models::short::ShortRow;
use crate::repository::{logs, shorts, Repository};
use crate::services::audit::{
    self, check_int, clean_string, rel_id, rel_id_list, str_differ, IntOpts, OldValues,
};
use crate::services::contributors;

#[derive(Clone)]
pub struct ShortsService {
    repo: Repository,
}

impl ShortsService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn create(&self, user_id: Option<i32>, data: &Value) -> ApiResult<i32> {
        let title = clean_string(data.get("title"))
            .ok_or_else(|| ApiError::BadRequest("Otsikko ei voi olla tyhjä.".to_string()))?;
        let contributions = contributors::filter_roles(
            contributors::parse_contributions(data.get("contributors"))?,
            &role::SHORT_ROLES,
        );
        if !contributions.iter().any(|c| c.role.id == role::AUTHOR) {
            return Err(ApiError::BadRequest("Tekijä puuttuu.".to_string()));
        }

        let row = ShortRow {
            id: 0,
            title: title.clone(),
            orig_title: clean_string(data.get("orig_title")),
            language: rel_id(data.get("language")),
            pubyear: check_int(data.get("pubyear"), IntOpts::lenient()),
            story_type: rel_id(data.get("story_type")),
        };

        let mut tx = self.repo.pool.begin().await?;
        let short_id = shorts::insert_row(tx.as_mut(), &row).await?;
        contributors::save_short_contributions(tx.as_mut(), short_id, &contributions).await?;
        if let Some(tags) = rel_id_list(data.get("tags")) {
            shorts::set_tags(tx.as_mut(), short_id, &tags).await?;
        }
        logs::log_create(tx.as_mut(), "shortstory", short_id, &title, user_id).await?;
        tx.commit().await?;
        Ok(short_id)
    }

    pub async fn update(&self, user_id: Option<i32>, data: &Value) -> ApiResult<()> {
        let id = audit::require_int(
            data.get("id"),
            IntOpts::positive(),
            "Virheellinen tunniste.",
        )?;

        let mut tx = self.repo.pool.begin().await?;
        let Some(mut row) = shorts::fetch_row(tx.as_mut(), id).await? else {
            return Err(ApiError::BadRequest("Novellia ei löydy.".to_string()));
        };
        let mut old = OldValues::new();

        if data.get("title").is_some() {
            let new = clean_string(data.get("title"))
                .ok_or_else(|| ApiError::BadRequest("Nimi on pakollinen tieto.".to_string()))?;
            if str_differ(Some(&row.title), Some(&new)) {
                old.record("Nimi", Some(row.title.clone()));
                row.title = new;
            }
        }
        if data.get("orig_title").is_some() {
            let new = clean_string(data.get("orig_title"));
            if str_differ(row.orig_title.as_deref(), new.as_deref()) {
                old.record("Alkukielinen nimi", row.orig_title.clone());
                row.orig_title = new;
            }
        }
        if data.get("language").is_some() {
            let new = rel_id(data.get("language"));
            if row.language != new {
                old.record_i32("Kieli", row.language);
                row.language = new;
            }
        }
        if data.get("pubyear").is_some() {
            let new = check_int(data.get("pubyear"), IntOpts::lenient());
            if row.pubyear != new {
                old.record_i32("Julkaistu", row.pubyear);
                row.pubyear = new;
            }
        }
        if data.get("story_type").is_some() {
            let new = rel_id(data.get("story_type"));
            if row.story_type != new {
                old.record_i32("Tyyppi", row.story_type);
                row.story_type = new;
            }
        }

        if data.get("contributors").is_some() {
            let new = contributors::filter_roles(
                contributors::parse_contributions(data.get("contributors"))?,
                &role::SHORT_ROLES,
            );
            if !new.iter().any(|c| c.role.id == role::AUTHOR) {
                return Err(ApiError::BadRequest("Tekijä puuttuu.".to_string()));
            }
            let existing = contributors::short_contributions(tx.as_mut(), id).await?;
            if contributors::have_changed(&existing, &new) {
                old.record(
                    "Tekijät",
                    Some(contributors::contributors_string(&existing)),
                );
                contributors::save_short_contributions(tx.as_mut(), id, &new).await?;
            }
        }

        if let Some(new) = rel_id_list(data.get("tags")) {
            let existing = shorts::tag_ids(tx.as_mut(), id).await?;
            let (to_add, to_remove) = audit::join_changes(&existing, &new);
            if !to_add.is_empty() || !to_remove.is_empty() {
                old.record(
                    "Asiasanat",
                    Some(
                        existing
                            .iter()
                            .map(|t| t.to_string())
                            .collect::<Vec<_>>()
                            .join(","),
                    ),
                );
                shorts::set_tags(tx.as_mut(), id, &new).await?;
            }
        }

        if old.is_empty() {
            return Ok(());
        }
        shorts::update_row(tx.as_mut(), &row).await?;
        logs::log_update(tx.as_mut(), "shortstory", id, &row.title, user_id, &old).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn delete(&self, user_id: Option<i32>, id: i32) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        let Some(row) = shorts::fetch_row(tx.as_mut(), id).await? else {
            return Err(ApiError::BadRequest("Novellia ei löydy.".to_string()));
        };

        let mut old = OldValues::new();
        old.record("Nimi", Some(row.title.clone()));
        logs::log_delete(tx.as_mut(), "shortstory", id, &row.title, user_id, &old).await?;
        shorts::delete_cascade(tx.as_mut(), id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Attach a tag to a story.
    pub async fn add_tag(&self, short_id: i32, tag_id: i32) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        if shorts::fetch_row(tx.as_mut(), short_id).await?.is_none() {
            return Err(ApiError::BadRequest("Novellia ei löydy.".to_string()));
        }
        sqlx::query(
            "INSERT INTO storytag (shortstory_id, tag_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(short_id)
        .bind(tag_id)
        .execute(tx.as_mut())
        .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn remove_tag(&self, short_id: i32, tag_id: i32) -> ApiResult<()> {
        sqlx::query("DELETE FROM storytag WHERE shortstory_id = $1 AND tag_id = $2")
            .bind(short_id)
            .bind(tag_id)
            .execute(&self.repo.pool)
            .await?;
        Ok(())
    }
}
