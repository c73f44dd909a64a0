//! Work mutations: create with its first edition, partial update with
//! change logging, cascaded delete and the contained-shorts protocol.

use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::models::edition::EditionRow;
use crate::models::refs::{role, Link};
use crate::models::work::WorkRow;
use crate::repository::{editions, logs, works, Repository};
use crate::services::audit::{
    self, check_int, clean_description, clean_string, rel_id, rel_id_list, str_differ, IntOpts,
    OldValues,
};
use crate::services::contributors;

#[derive(Clone)]
pub struct WorksService {
    repo: Repository,
}

pub(crate) fn parse_links(value: Option<&Value>) -> Option<Vec<Link>> {
    let Some(Value::Array(items)) = value else {
        return None;
    };
    Some(
        items
            .iter()
            .filter_map(|item| {
                let link = item.get("link")?.as_str()?.trim();
                if link.is_empty() {
                    return None;
                }
                Some(Link {
                    link: link.to_string(),
                    description: item
                        .get("description")
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|d| !d.is_empty())
                        .map(String::from),
                })
            })
            .collect(),
    )
}

fn links_string(links: &[Link]) -> String {
    links
        .iter()
        .map(|l| l.link.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn ids_string(ids: &[i32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl WorksService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a work together with its first edition. Returns the new id.
    pub async fn create(&self, user_id: Option<i32>, data: &Value) -> ApiResult<i32> {
        let title = clean_string(data.get("title"))
            .ok_or_else(|| ApiError::BadRequest("Tyhjä nimi.".to_string()))?;

        let contributions = contributors::filter_roles(
            contributors::parse_contributions(data.get("contributions"))?,
            &role::WORK_ROLES,
        );
        if !contributions
            .iter()
            .any(|c| c.role.id == role::AUTHOR || c.role.id == role::EDITOR)
        {
            return Err(ApiError::BadRequest(
                "Ei kirjoittajaa tai toimittajaa.".to_string(),
            ));
        }

        let pubyear = check_int(data.get("pubyear"), IntOpts::lenient());
        let row = WorkRow {
            id: 0,
            title: title.clone(),
            subtitle: clean_string(data.get("subtitle")),
            orig_title: clean_string(data.get("orig_title")),
            pubyear,
            language: rel_id(data.get("language")),
            bookseries_id: rel_id(data.get("bookseries")),
            bookseriesnum: clean_string(data.get("bookseriesnum")),
            bookseriesorder: check_int(data.get("bookseriesorder"), IntOpts::lenient()),
            work_type: rel_id(data.get("work_type")),
            description: clean_description(data.get("description")),
            descr_attr: clean_string(data.get("descr_attr")),
            misc: clean_string(data.get("misc")),
            imported_string: clean_string(data.get("imported_string")),
            author_str: None,
        };

        let mut tx = self.repo.pool.begin().await?;
        let work_id = works::insert_row(tx.as_mut(), &row).await?;
        contributors::save_work_contributions(tx.as_mut(), work_id, &contributions).await?;

        if let Some(genres) = rel_id_list(data.get("genres")) {
            works::set_genres(tx.as_mut(), work_id, &genres).await?;
        }
        if let Some(tags) = rel_id_list(data.get("tags")) {
            works::set_tags(tx.as_mut(), work_id, &tags).await?;
        }
        if let Some(links) = parse_links(data.get("links")) {
            works::save_links(tx.as_mut(), work_id, &links).await?;
        }

        // Every work has at least one edition from the moment it exists.
        let edition = EditionRow {
            id: 0,
            title: title.clone(),
            subtitle: row.subtitle.clone(),
            pubyear: pubyear.unwrap_or(0),
            publisher_id: None,
            editionnum: Some(1),
            version: Some(1),
            isbn: None,
            printedin: None,
            pubseries_id: None,
            pubseriesnum: None,
            coll_info: None,
            pages: None,
            binding_id: Some(1),
            format_id: Some(1),
            size: None,
            dustcover: Some(1),
            coverimage: Some(1),
            misc: None,
            imported_string: None,
            verified: false,
        };
        let edition_id = editions::insert_row(tx.as_mut(), &edition).await?;
        works::link_to_edition(tx.as_mut(), work_id, edition_id).await?;

        logs::log_create(tx.as_mut(), "work", work_id, &title, user_id).await?;
        tx.commit().await?;
        Ok(work_id)
    }

    /// Partial update. Only fields present in the body are touched; a
    /// body that changes nothing emits no log rows.
    pub async fn update(&self, user_id: Option<i32>, data: &Value) -> ApiResult<()> {
        let id = audit::require_int(
            data.get("id"),
            IntOpts::positive(),
            "Virheellinen tunniste.",
        )?;

        let mut tx = self.repo.pool.begin().await?;
        let Some(mut row) = works::fetch_row(tx.as_mut(), id).await? else {
            return Err(ApiError::BadRequest("Teosta ei löydy.".to_string()));
        };
        let mut old = OldValues::new();

        if data.get("title").is_some() {
            let new = clean_string(data.get("title"))
                .ok_or_else(|| ApiError::BadRequest("Tyhjä nimi.".to_string()))?;
            if str_differ(Some(&row.title), Some(&new)) {
                old.record("Nimeke", Some(row.title.clone()));
                row.title = new;
            }
        }
        if data.get("subtitle").is_some() {
            let new = clean_string(data.get("subtitle"));
            if str_differ(row.subtitle.as_deref(), new.as_deref()) {
                old.record("Alaotsikko", row.subtitle.clone());
                row.subtitle = new;
            }
        }
        if data.get("orig_title").is_some() {
            let new = clean_string(data.get("orig_title"));
            if str_differ(row.orig_title.as_deref(), new.as_deref()) {
                old.record("Alkukielinen nimi", row.orig_title.clone());
                row.orig_title = new;
            }
        }
        if data.get("pubyear").is_some() {
            let new = audit::require_int(
                data.get("pubyear"),
                IntOpts::lenient(),
                "Virheellinen julkaisuvuosi.",
            )?;
            if row.pubyear != Some(new) {
                old.record_i32("Julkaisuvuosi", row.pubyear);
                row.pubyear = Some(new);
            }
        }
        if data.get("language").is_some() {
            let new = rel_id(data.get("language"));
            if row.language != new {
                old.record_i32("Kieli", row.language);
                row.language = new;
            }
        }
        if data.get("bookseries").is_some() {
            let new = rel_id(data.get("bookseries"));
            if row.bookseries_id != new {
                old.record_i32("Kirjasarja", row.bookseries_id);
                row.bookseries_id = new;
            }
        }
        if data.get("bookseriesnum").is_some() {
            let new = clean_string(data.get("bookseriesnum"));
            if str_differ(row.bookseriesnum.as_deref(), new.as_deref()) {
                old.record("Kirjasarjan numero", row.bookseriesnum.clone());
                row.bookseriesnum = new;
            }
        }
        if data.get("bookseriesorder").is_some() {
            let new = check_int(data.get("bookseriesorder"), IntOpts::lenient());
            if row.bookseriesorder != new {
                old.record_i32("Kirjasarjan järjestys", row.bookseriesorder);
                row.bookseriesorder = new;
            }
        }
        if data.get("work_type").is_some() {
            let new = rel_id(data.get("work_type"));
            if row.work_type != new {
                old.record_i32("Tyyppi", row.work_type);
                row.work_type = new;
            }
        }
        if data.get("description").is_some() {
            let new = clean_description(data.get("description"));
            if str_differ(row.description.as_deref(), new.as_deref()) {
                old.record("Kuvaus", row.description.clone());
                row.description = new;
            }
        }
        if data.get("descr_attr").is_some() {
            let new = clean_string(data.get("descr_attr"));
            if str_differ(row.descr_attr.as_deref(), new.as_deref()) {
                old.record("Kuvauksen lähde", row.descr_attr.clone());
                row.descr_attr = new;
            }
        }
        if data.get("misc").is_some() {
            let new = clean_string(data.get("misc"));
            if str_differ(row.misc.as_deref(), new.as_deref()) {
                old.record("Muuta", row.misc.clone());
                row.misc = new;
            }
        }
        if data.get("imported_string").is_some() {
            let new = clean_string(data.get("imported_string"));
            if str_differ(row.imported_string.as_deref(), new.as_deref()) {
                old.record("Lähde", row.imported_string.clone());
                row.imported_string = new;
            }
        }

        if data.get("contributions").is_some() {
            let new = contributors::filter_roles(
                contributors::parse_contributions(data.get("contributions"))?,
                &role::WORK_ROLES,
            );
            if !new
                .iter()
                .any(|c| c.role.id == role::AUTHOR || c.role.id == role::EDITOR)
            {
                return Err(ApiError::BadRequest(
                    "Ei kirjoittajaa tai toimittajaa.".to_string(),
                ));
            }
            let existing = contributors::work_contributions(tx.as_mut(), id).await?;
            if contributors::have_changed(&existing, &new) {
                old.record(
                    "Tekijät",
                    Some(contributors::contributors_string(&existing)),
                );
                contributors::save_work_contributions(tx.as_mut(), id, &new).await?;
            }
        }

        if let Some(new) = rel_id_list(data.get("genres")) {
            let existing = works::genre_ids(tx.as_mut(), id).await?;
            let (to_add, to_remove) = audit::join_changes(&existing, &new);
            if !to_add.is_empty() || !to_remove.is_empty() {
                old.record("Genret", Some(ids_string(&existing)));
                works::set_genres(tx.as_mut(), id, &new).await?;
            }
        }
        if let Some(new) = rel_id_list(data.get("tags")) {
            let existing = works::tag_ids(tx.as_mut(), id).await?;
            let (to_add, to_remove) = audit::join_changes(&existing, &new);
            if !to_add.is_empty() || !to_remove.is_empty() {
                old.record("Asiasanat", Some(ids_string(&existing)));
                works::set_tags(tx.as_mut(), id, &new).await?;
            }
        }
        if let Some(new) = parse_links(data.get("links")) {
            let existing = works::links(tx.as_mut(), id).await?;
            if existing != new {
                old.record("Linkit", Some(links_string(&existing)));
                works::save_links(tx.as_mut(), id, &new).await?;
            }
        }

        works::update_row(tx.as_mut(), &row).await?;
        if !old.is_empty() {
            logs::log_update(tx.as_mut(), "work", id, &row.title, user_id, &old).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Delete the work, its editions and every dependent row.
    pub async fn delete(&self, user_id: Option<i32>, id: i32) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        let Some(row) = works::fetch_row(tx.as_mut(), id).await? else {
            return Err(ApiError::BadRequest("Teosta ei löydy.".to_string()));
        };

        for edition_id in works::edition_ids(tx.as_mut(), id).await? {
            editions::delete_cascade(tx.as_mut(), edition_id).await?;
        }
        works::delete_row(tx.as_mut(), id).await?;

        let mut old = OldValues::new();
        old.record("Nimi", Some(row.title.clone()));
        logs::log_delete(tx.as_mut(), "work", id, &row.title, user_id, &old).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Replace the ordered contained-shorts list on every edition of the
    /// work.
    pub async fn save_shorts(&self, work_id: i32, short_ids: &[i32]) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        if works::fetch_row(tx.as_mut(), work_id).await?.is_none() {
            return Err(ApiError::BadRequest("Teosta ei löydy.".to_string()));
        }
        works::save_shorts(tx.as_mut(), work_id, short_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Attach a tag to a work.
    pub async fn add_tag(&self, work_id: i32, tag_id: i32) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        if works::fetch_row(tx.as_mut(), work_id).await?.is_none() {
            return Err(ApiError::BadRequest("Teosta ei löydy.".to_string()));
        }
        sqlx::query(
            "INSERT INTO worktag (work_id, tag_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(work_id)
        .bind(tag_id)
        .execute(tx.as_mut())
        .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn remove_tag(&self, work_id: i32, tag_id: i32) -> ApiResult<()> {
        sqlx::query("DELETE FROM worktag WHERE work_id = $1 AND tag_id = $2")
            .bind(work_id)
            .bind(tag_id)
            .execute(&self.repo.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_links_drops_empty_rows() {
        let value = json!([
            {"link": "https://example.fi", "description": "kotisivu"},
            {"link": "", "description": "tyhjä"},
            {"link": "   "}
        ]);
        let links = parse_links(Some(&value)).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].link, "https://example.fi");
        assert_eq!(links[0].description.as_deref(), Some("kotisivu"));
    }

    #[test]
    fn parse_links_requires_an_array() {
        assert!(parse_links(Some(&json!("x"))).is_none());
        assert!(parse_links(None).is_none());
    }
}
