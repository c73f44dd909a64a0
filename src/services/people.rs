//! Person mutations: create, partial update with change logging and
//! guarded delete.

use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::models::person::PersonRow;
use crate::repository::{logs, people, Repository};
use crate::services::audit::{
    self, check_int, clean_description, clean_string, rel_id, str_differ, IntOpts, OldValues,
};
use crate::services::works::parse_links;

#[derive(Clone)]
pub struct PeopleService {
    repo: Repository,
}

impl PeopleService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn create(&self, user_id: Option<i32>, data: &Value) -> ApiResult<i32> {
        let name = clean_string(data.get("name"))
            .ok_or_else(|| ApiError::BadRequest("Nimi ei voi olla tyhjä.".to_string()))?;

        let row = PersonRow {
            id: 0,
            name: name.clone(),
            // Listing sorts by alt_name, so it defaults to the name.
            alt_name: clean_string(data.get("alt_name")).or_else(|| Some(name.clone())),
            fullname: clean_string(data.get("fullname")),
            other_names: clean_string(data.get("other_names")),
            first_name: clean_string(data.get("first_name")),
            last_name: clean_string(data.get("last_name")),
            image_src: clean_string(data.get("image_src")),
            image_attr: clean_string(data.get("image_attr")),
            dob: check_int(data.get("dob"), IntOpts::lenient()),
            dod: check_int(data.get("dod"), IntOpts::lenient()),
            bio: clean_description(data.get("bio")),
            bio_src: clean_string(data.get("bio_src")),
            nationality_id: rel_id(data.get("nationality")),
            imported_string: clean_string(data.get("imported_string")),
        };

        let mut tx = self.repo.pool.begin().await?;
        let person_id = people::insert_row(tx.as_mut(), &row).await?;
        if let Some(links) = parse_links(data.get("links")) {
            people::save_links(tx.as_mut(), person_id, &links).await?;
        }
        logs::log_create(tx.as_mut(), "person", person_id, &name, user_id).await?;
        tx.commit().await?;
        Ok(person_id)
    }

    pub async fn update(&self, user_id: Option<i32>, data: &Value) -> ApiResult<()> {
        let id = audit::require_int(
            data.get("id"),
            IntOpts::positive(),
            "Virheellinen tunniste.",
        )?;

        let mut tx = self.repo.pool.begin().await?;
        let Some(mut row) = people::fetch_row(tx.as_mut(), id).await? else {
            return Err(ApiError::BadRequest("Henkilöä ei löydy.".to_string()));
        };
        let mut old = OldValues::new();

        if data.get("name").is_some() {
            let new = clean_string(data.get("name"))
                .ok_or_else(|| ApiError::BadRequest("Nimi ei voi olla tyhjä.".to_string()))?;
            if str_differ(Some(&row.name), Some(&new)) {
                old.record("Nimi", Some(row.name.clone()));
                row.name = new;
            }
        }
        if data.get("alt_name").is_some() {
            let new = clean_string(data.get("alt_name"));
            if str_differ(row.alt_name.as_deref(), new.as_deref()) {
                old.record("Vaihtoehtoinen nimi", row.alt_name.clone());
                row.alt_name = new;
            }
        }
        if data.get("fullname").is_some() {
            let new = clean_string(data.get("fullname"));
            if str_differ(row.fullname.as_deref(), new.as_deref()) {
                old.record("Koko nimi", row.fullname.clone());
                row.fullname = new;
            }
        }
        if data.get("other_names").is_some() {
            let new = clean_string(data.get("other_names"));
            if str_differ(row.other_names.as_deref(), new.as_deref()) {
                old.record("Muut nimet", row.other_names.clone());
                row.other_names = new;
            }
        }
        if data.get("first_name").is_some() {
            let new = clean_string(data.get("first_name"));
            if str_differ(row.first_name.as_deref(), new.as_deref()) {
                old.record("Etunimi", row.first_name.clone());
                row.first_name = new;
            }
        }
        if data.get("last_name").is_some() {
            let new = clean_string(data.get("last_name"));
            if str_differ(row.last_name.as_deref(), new.as_deref()) {
                old.record("Sukunimi", row.last_name.clone());
                row.last_name = new;
            }
        }
        if data.get("image_src").is_some() {
            let new = clean_string(data.get("image_src"));
            if str_differ(row.image_src.as_deref(), new.as_deref()) {
                old.record("Kuvan lähde", row.image_src.clone());
                row.image_src = new;
            }
        }
        if data.get("dob").is_some() {
            let new = check_int(data.get("dob"), IntOpts::lenient());
            if row.dob != new {
                old.record_i32("Syntymävuosi", row.dob);
                row.dob = new;
            }
        }
        if data.get("dod").is_some() {
            let new = check_int(data.get("dod"), IntOpts::lenient());
            if row.dod != new {
                old.record_i32("Kuolinvuosi", row.dod);
                row.dod = new;
            }
        }
        if data.get("bio").is_some() {
            let new = clean_description(data.get("bio"));
            if str_differ(row.bio.as_deref(), new.as_deref()) {
                old.record("Biografia", row.bio.clone());
                row.bio = new;
            }
        }
        if data.get("bio_src").is_some() {
            let new = clean_string(data.get("bio_src"));
            if str_differ(row.bio_src.as_deref(), new.as_deref()) {
                old.record("Biografian lähde", row.bio_src.clone());
                row.bio_src = new;
            }
        }
        if data.get("nationality").is_some() {
            let new = rel_id(data.get("nationality"));
            if row.nationality_id != new {
                old.record_i32("Kansallisuus", row.nationality_id);
                row.nationality_id = new;
            }
        }

        if let Some(new) = parse_links(data.get("links")) {
            let existing = people::links(tx.as_mut(), id).await?;
            if existing != new {
                let (to_add, to_remove) = audit::join_link_changes(&existing, &new);
                old.record(
                    "Linkit",
                    Some(format!("+{} -{}", to_add.join(" "), to_remove.join(" "))),
                );
                people::save_links(tx.as_mut(), id, &new).await?;
            }
        }

        if old.is_empty() {
            return Ok(());
        }
        people::update_row(tx.as_mut(), &row).await?;
        logs::log_update(tx.as_mut(), "person", id, &row.name, user_id, &old).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Delete a person. Refused while any contribution, award or alias
    /// still references them.
    pub async fn delete(&self, user_id: Option<i32>, id: i32) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        let Some(row) = people::fetch_row(tx.as_mut(), id).await? else {
            return Err(ApiError::BadRequest("Henkilöä ei löydy.".to_string()));
        };
        if let Some(blocker) = people::deletion_blocker(tx.as_mut(), id).await? {
            return Err(ApiError::BadRequest(blocker.to_string()));
        }

        let mut old = OldValues::new();
        old.record("Nimi", Some(row.name.clone()));
        logs::log_delete(tx.as_mut(), "person", id, &row.name, user_id, &old).await?;
        people::delete_row(tx.as_mut(), id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Attach a tag to a person.
    pub async fn add_tag(&self, person_id: i32, tag_id: i32) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        if people::fetch_row(tx.as_mut(), person_id).await?.is_none() {
            return Err(ApiError::BadRequest("Henkilöä ei löydy.".to_string()));
        }
        sqlx::query(
            "INSERT INTO persontag (person_id, tag_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(person_id)
        .bind(tag_id)
        .execute(tx.as_mut())
        .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn remove_tag(&self, person_id: i32, tag_id: i32) -> ApiResult<()> {
        sqlx::query("DELETE FROM persontag WHERE person_id = $1 AND tag_id = $2")
            .bind(person_id)
            .bind(tag_id)
            .execute(&self.repo.pool)
            .await?;
        Ok(())
    }
}
