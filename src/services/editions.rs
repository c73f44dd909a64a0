//! Edition mutations: create, partial update with change logging, copy,
//! delete (the last edition of a work is protected) and cover images.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::models::refs::role;
use crate::repository::{editions, logs, works, Repository};
use crate::services::audit::{
    self, check_int, clean_string, rel_id, str_differ, IntOpts, OldValues,
};
use crate::services::contributors;

/// Tri-state flags on an edition (dustcover, coverimage).
const FLAG_VALUES: [i32; 3] = [1, 2, 3];

fn dustcover_label(value: Option<i32>) -> &'static str {
    match value {
        Some(2) => "Kyllä",
        Some(3) => "Ei",
        _ => "Ei tietoa",
    }
}

fn coverimage_label(value: Option<i32>) -> &'static str {
    match value {
        Some(2) => "Ei",
        Some(3) => "Kyllä",
        _ => "Ei tietoa",
    }
}

/// Cover filenames are reduced to a safe basename: path separators and
/// anything outside a conservative character set are dropped, and only
/// .jpg files are accepted.
pub fn sanitize_cover_filename(name: &str) -> ApiResult<String> {
    static UNSAFE_CHARS: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid regex"));
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let safe = UNSAFE_CHARS.replace_all(base, "").into_owned();
    let lowered = safe.to_lowercase();
    if safe.len() <= 4 || !lowered.ends_with(".jpg") {
        return Err(ApiError::BadRequest(
            "Virheellinen kuvan tyyppi.".to_string(),
        ));
    }
    Ok(safe)
}

#[derive(Clone)]
pub struct EditionsService {
    repo: Repository,
    cover_dir: String,
}

impl EditionsService {
    pub fn new(repo: Repository, cover_dir: String) -> Self {
        Self { repo, cover_dir }
    }

    /// Create an edition for an existing work. Returns the new id.
    pub async fn create(&self, user_id: Option<i32>, data: &Value) -> ApiResult<i32> {
        let work_id = audit::require_int(
            data.get("work_id"),
            IntOpts::positive(),
            "Virheellinen teoksen tunniste.",
        )?;
        let title = clean_string(data.get("title"))
            .ok_or_else(|| ApiError::BadRequest("Otsikko ei voi olla tyhjä.".to_string()))?;
        let pubyear = audit::require_int(
            data.get("pubyear"),
            IntOpts::lenient(),
            "Julkaisuvuosi ei voi olla tyhjä.",
        )?;
        let publisher_id = rel_id(data.get("publisher")).ok_or_else(|| {
            ApiError::BadRequest("Kustantaja on pakollinen tieto.".to_string())
        })?;

        let row = crate::models::edition::EditionRow {
            id: 0,
            title: title.clone(),
            subtitle: clean_string(data.get("subtitle")),
            pubyear,
            publisher_id: Some(publisher_id),
            editionnum: check_int(data.get("editionnum"), IntOpts::positive()),
            version: check_int(data.get("version"), IntOpts::positive()),
            isbn: clean_string(data.get("isbn")),
            printedin: clean_string(data.get("printedin")),
            pubseries_id: rel_id(data.get("pubseries")),
            pubseriesnum: check_int(data.get("pubseriesnum"), IntOpts::lenient()),
            coll_info: clean_string(data.get("coll_info")),
            pages: check_int(data.get("pages"), IntOpts::lenient()),
            binding_id: rel_id(data.get("binding")),
            format_id: rel_id(data.get("format")),
            size: check_int(data.get("size"), IntOpts::lenient()),
            dustcover: check_int(data.get("dustcover"), IntOpts::allowed(&FLAG_VALUES)).or(Some(1)),
            coverimage: check_int(data.get("coverimage"), IntOpts::allowed(&FLAG_VALUES))
                .or(Some(1)),
            misc: clean_string(data.get("misc")),
            imported_string: clean_string(data.get("imported_string")),
            verified: data.get("verified").and_then(Value::as_bool).unwrap_or(false),
        };

        let mut tx = self.repo.pool.begin().await?;
        if works::fetch_row(tx.as_mut(), work_id).await?.is_none() {
            return Err(ApiError::BadRequest("Teosta ei löydy.".to_string()));
        }
        let edition_id = editions::insert_row(tx.as_mut(), &row).await?;
        works::link_to_edition(tx.as_mut(), work_id, edition_id).await?;

        if data.get("contributors").is_some() {
            let new = contributors::filter_roles(
                contributors::parse_contributions(data.get("contributors"))?,
                &role::EDITION_ROLES,
            );
            contributors::save_edition_contributions(tx.as_mut(), edition_id, &new).await?;
        }

        logs::log_create(tx.as_mut(), "edition", edition_id, &title, user_id).await?;
        tx.commit().await?;
        Ok(edition_id)
    }

    /// Partial update with per-field change logging.
    #[allow(clippy::too_many_lines)]
    pub async fn update(&self, user_id: Option<i32>, data: &Value) -> ApiResult<()> {
        let id = audit::require_int(
            data.get("id"),
            IntOpts::positive(),
            "Virheellinen tunniste.",
        )?;

        let mut tx = self.repo.pool.begin().await?;
        let Some(mut row) = editions::fetch_row(tx.as_mut(), id).await? else {
            return Err(ApiError::BadRequest("Painosta ei löydy.".to_string()));
        };
        let mut old = OldValues::new();

        if data.get("title").is_some() {
            let new = clean_string(data.get("title"))
                .ok_or_else(|| ApiError::BadRequest("Otsikko ei voi olla tyhjä.".to_string()))?;
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
        if data.get("pubyear").is_some() {
            let new = audit::require_int(
                data.get("pubyear"),
                IntOpts::lenient(),
                "Julkaisuvuosi ei voi olla tyhjä.",
            )?;
            if row.pubyear != new {
                old.record_i32("Kustannusvuosi", Some(row.pubyear));
                row.pubyear = new;
            }
        }
        if let Some(value) = data.get("publisher") {
            if !value.is_null() {
                let new = rel_id(Some(value)).ok_or_else(|| {
                    ApiError::BadRequest("Kustantaja on pakollinen tieto.".to_string())
                })?;
                if row.publisher_id != Some(new) {
                    old.record_i32("Kustantaja", row.publisher_id);
                    row.publisher_id = Some(new);
                }
            }
        }
        if let Some(value) = data.get("editionnum") {
            if value.is_null() {
                return Err(ApiError::BadRequest(
                    "Painosnumero ei voi olla tyhjä.".to_string(),
                ));
            }
            let new = audit::require_int(
                Some(value),
                IntOpts::positive(),
                "Virheellinen painosnumero.",
            )?;
            if row.editionnum != Some(new) {
                old.record_i32("Painosnro", row.editionnum);
                row.editionnum = Some(new);
            }
        }
        if let Some(value) = data.get("version") {
            let new = if value.is_null() || value.as_str() == Some("") {
                None
            } else {
                Some(audit::require_int(
                    Some(value),
                    IntOpts::positive(),
                    "Virheellinen laitos.",
                )?)
            };
            if row.version != new {
                old.record_i32("Laitosnro", row.version);
                row.version = new;
            }
        }
        if data.get("isbn").is_some() {
            let new = clean_string(data.get("isbn"));
            if str_differ(row.isbn.as_deref(), new.as_deref()) {
                old.record("ISBN", row.isbn.clone());
                row.isbn = new;
            }
        }
        if let Some(value) = data.get("pages") {
            let new = if value.is_null() {
                None
            } else {
                Some(audit::require_int(
                    Some(value),
                    IntOpts::lenient(),
                    "Virheellinen sivumäärä.",
                )?)
            };
            if row.pages != new {
                old.record_i32("Sivuja", row.pages);
                row.pages = new;
            }
        }
        if let Some(value) = data.get("binding") {
            if !value.is_null() {
                let new = rel_id(Some(value))
                    .ok_or_else(|| ApiError::BadRequest("Virheellinen sidonta.".to_string()))?;
                if row.binding_id != Some(new) {
                    old.record_i32("Sidonta", row.binding_id);
                    row.binding_id = Some(new);
                }
            }
        }
        if let Some(value) = data.get("format") {
            if !value.is_null() {
                let new = rel_id(Some(value))
                    .ok_or_else(|| ApiError::BadRequest("Virheellinen formaatti.".to_string()))?;
                if row.format_id != Some(new) {
                    old.record_i32("Formaatti", row.format_id);
                    row.format_id = Some(new);
                }
            }
        }
        if let Some(value) = data.get("size") {
            let new = if value.is_null() {
                None
            } else {
                Some(audit::require_int(
                    Some(value),
                    IntOpts::lenient(),
                    "Virheellinen koko.",
                )?)
            };
            if row.size != new {
                old.record_i32("Koko", row.size);
                row.size = new;
            }
        }
        if data.get("printedin").is_some() {
            let new = clean_string(data.get("printedin"));
            if str_differ(row.printedin.as_deref(), new.as_deref()) {
                old.record("Painopaikka", row.printedin.clone());
                row.printedin = new;
            }
        }
        if data.get("pubseries").is_some() {
            let new = rel_id(data.get("pubseries"));
            if row.pubseries_id != new {
                old.record_i32("Kustantajan sarja", row.pubseries_id);
                row.pubseries_id = new;
            }
        }
        if let Some(value) = data.get("pubseriesnum") {
            let new = if value.is_null() {
                None
            } else {
                Some(audit::require_int(
                    Some(value),
                    IntOpts::lenient(),
                    "Virheellinen sarjan numero.",
                )?)
            };
            if row.pubseriesnum != new {
                old.record_i32("Kustantajan sarjan numero", row.pubseriesnum);
                row.pubseriesnum = new;
            }
        }
        if data.get("dustcover").is_some() {
            let new = audit::require_int(
                data.get("dustcover"),
                IntOpts::allowed(&FLAG_VALUES),
                "Virheellinen kansipaperin tyyppi.",
            )?;
            if row.dustcover != Some(new) {
                old.record("Kansipaperi", Some(dustcover_label(row.dustcover).to_string()));
                row.dustcover = Some(new);
            }
        }
        if data.get("coverimage").is_some() {
            let new = audit::require_int(
                data.get("coverimage"),
                IntOpts::allowed(&FLAG_VALUES),
                "Virheellinen kansikuvan tyyppi.",
            )?;
            if row.coverimage != Some(new) {
                old.record(
                    "Ylivetokansi",
                    Some(coverimage_label(row.coverimage).to_string()),
                );
                row.coverimage = Some(new);
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
        if let Some(value) = data.get("verified").and_then(Value::as_bool) {
            if row.verified != value {
                old.record(
                    "Tarkastettu",
                    Some(if row.verified { "Kyllä" } else { "Ei" }.to_string()),
                );
                row.verified = value;
            }
        }

        if data.get("contributors").is_some() {
            let new = contributors::filter_roles(
                contributors::parse_contributions(data.get("contributors"))?,
                &role::EDITION_ROLES,
            );
            let existing = contributors::edition_contributions(tx.as_mut(), id).await?;
            if contributors::have_changed(&existing, &new) {
                old.record(
                    "Tekijät",
                    Some(contributors::contributors_string(&existing)),
                );
                contributors::save_edition_contributions(tx.as_mut(), id, &new).await?;
            }
        }

        if old.is_empty() {
            return Ok(());
        }
        editions::update_row(tx.as_mut(), &row).await?;
        logs::log_update(tx.as_mut(), "edition", id, &row.title, user_id, &old).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Duplicate an edition including its contributor rows. The copy
    /// starts life as the next printing of the same work.
    pub async fn copy(&self, user_id: Option<i32>, id: i32) -> ApiResult<i32> {
        let mut tx = self.repo.pool.begin().await?;
        let Some(mut row) = editions::fetch_row(tx.as_mut(), id).await? else {
            return Err(ApiError::BadRequest("Painosta ei löydy.".to_string()));
        };
        let work_id = editions::work_id_of(tx.as_mut(), id)
            .await?
            .ok_or_else(|| ApiError::BadRequest("Painosta ei löydy.".to_string()))?;

        row.editionnum = Some(row.editionnum.unwrap_or(1) + 1);
        row.verified = false;
        let new_id = editions::insert_row(tx.as_mut(), &row).await?;
        works::link_to_edition(tx.as_mut(), work_id, new_id).await?;

        let contributions = contributors::edition_contributions(tx.as_mut(), id).await?;
        contributors::save_edition_contributions(tx.as_mut(), new_id, &contributions).await?;

        logs::log_create(tx.as_mut(), "edition", new_id, &row.title, user_id).await?;
        tx.commit().await?;
        Ok(new_id)
    }

    /// Delete an edition. The last edition of a work cannot be deleted;
    /// delete the work instead.
    pub async fn delete(&self, user_id: Option<i32>, id: i32) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        let Some(row) = editions::fetch_row(tx.as_mut(), id).await? else {
            return Err(ApiError::BadRequest("Painosta ei löydy.".to_string()));
        };
        if let Some(work_id) = editions::work_id_of(tx.as_mut(), id).await? {
            if editions::edition_count_of_work(tx.as_mut(), work_id).await? <= 1 {
                return Err(ApiError::BadRequest(
                    "Teoksen viimeistä painosta ei voi poistaa.".to_string(),
                ));
            }
        }

        let mut old = OldValues::new();
        old.record(
            "Painos",
            Some(format!(
                "-Painos: {}, Laitos: {}",
                row.editionnum.unwrap_or(1),
                row.version.unwrap_or(1)
            )),
        );
        logs::log_delete(tx.as_mut(), "edition", id, &row.title, user_id, &old).await?;
        editions::delete_cascade(tx.as_mut(), id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Replace the ordered contained-shorts list of one edition.
    pub async fn save_shorts(&self, edition_id: i32, short_ids: &[i32]) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        if editions::fetch_row(tx.as_mut(), edition_id).await?.is_none() {
            return Err(ApiError::BadRequest("Painosta ei löydy.".to_string()));
        }
        editions::save_shorts(tx.as_mut(), edition_id, short_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Attach a cover image path; replaces the existing one if present.
    pub async fn add_image(
        &self,
        user_id: Option<i32>,
        edition_id: i32,
        filename: &str,
    ) -> ApiResult<()> {
        let safe = sanitize_cover_filename(filename)?;
        let src = format!("{}/{safe}", self.cover_dir.trim_end_matches('/'));
        let mut tx = self.repo.pool.begin().await?;
        let Some(row) = editions::fetch_row(tx.as_mut(), edition_id).await? else {
            return Err(ApiError::BadRequest("Painosta ei löydy.".to_string()));
        };
        let previous = editions::add_image(tx.as_mut(), edition_id, &src).await?;
        let mut old = OldValues::new();
        old.record("Kansikuva", previous);
        logs::log_update(tx.as_mut(), "edition", edition_id, &row.title, user_id, &old).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn remove_image(
        &self,
        user_id: Option<i32>,
        edition_id: i32,
        image_id: i32,
    ) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        let Some(row) = editions::fetch_row(tx.as_mut(), edition_id).await? else {
            return Err(ApiError::BadRequest("Painosta ei löydy.".to_string()));
        };
        let Some(removed) = editions::remove_image(tx.as_mut(), image_id).await? else {
            return Err(ApiError::BadRequest("Kuvaa ei löydy.".to_string()));
        };
        let mut old = OldValues::new();
        old.record("Kansikuva", Some(removed));
        logs::log_delete(tx.as_mut(), "edition", edition_id, &row.title, user_id, &old).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_filenames_are_sanitized() {
        assert_eq!(
            sanitize_cover_filename("../etc/kansi.jpg").unwrap(),
            "kansi.jpg"
        );
        assert_eq!(
            sanitize_cover_filename("a b\\c?.jpg").unwrap(),
            "c.jpg"
        );
        assert!(sanitize_cover_filename("kansi.png").is_err());
        assert!(sanitize_cover_filename(".jpg").is_err());
        assert!(sanitize_cover_filename("").is_err());
    }

    #[test]
    fn flag_labels_follow_the_stored_encoding() {
        assert_eq!(dustcover_label(Some(2)), "Kyllä");
        assert_eq!(dustcover_label(Some(3)), "Ei");
        assert_eq!(dustcover_label(Some(1)), "Ei tietoa");
        assert_eq!(dustcover_label(None), "Ei tietoa");
        assert_eq!(coverimage_label(Some(2)), "Ei");
        assert_eq!(coverimage_label(Some(3)), "Kyllä");
    }
}
