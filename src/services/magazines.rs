//! Issue mutations, article tag handling and the disabled legacy
//! magazine endpoints.

use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::models::magazine::IssueRow;
use crate::models::refs::role;
use crate::repository::{logs, magazines, Repository};
use crate::services::audit::{
    self, check_int, clean_description, clean_string, rel_id, rel_id_list, str_differ, IntOpts,
    OldValues,
};
use crate::services::contributors;
use crate::services::editions::sanitize_cover_filename;

/// Display name for an issue, e.g. "3/2001" or "3b/2001".
fn issue_name(row: &IssueRow) -> String {
    let number = row
        .number
        .map(|n| n.to_string())
        .unwrap_or_default();
    let extra = row.number_extra.as_deref().unwrap_or("");
    let year = row.year.map(|y| y.to_string()).unwrap_or_default();
    format!("{number}{extra}/{year}")
}

#[derive(Clone)]
pub struct MagazinesService {
    repo: Repository,
}

impl MagazinesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// The legacy magazine mutation endpoints are kept routable but
    /// disabled until the editor side exists.
    pub fn update_magazine(&self) -> ApiResult<()> {
        Err(ApiError::NotAllowed("Ei toteutettu.".to_string()))
    }

    pub async fn create_issue(&self, user_id: Option<i32>, data: &Value) -> ApiResult<i32> {
        let magazine_id = audit::require_int(
            data.get("magazine_id"),
            IntOpts::positive(),
            "Lehden tunniste puuttuu.",
        )?;

        let mut tx = self.repo.pool.begin().await?;
        let magazine_exists: Option<(i32,)> =
            sqlx::query_as("SELECT id FROM magazine WHERE id = $1")
                .bind(magazine_id)
                .fetch_optional(tx.as_mut())
                .await?;
        if magazine_exists.is_none() {
            return Err(ApiError::BadRequest(
                "Lehden tunniste on virheellinen.".to_string(),
            ));
        }
        let size_id = match data.get("size") {
            Some(Value::Null) | None => None,
            size => {
                let id = rel_id(size).ok_or_else(|| {
                    ApiError::BadRequest("Julkaisukoko on virheellinen.".to_string())
                })?;
                let known: Option<(i32,)> =
                    sqlx::query_as("SELECT id FROM publicationsize WHERE id = $1")
                        .bind(id)
                        .fetch_optional(tx.as_mut())
                        .await?;
                if known.is_none() {
                    return Err(ApiError::BadRequest(format!(
                        "Julkaisukoko on virheellinen: {id}."
                    )));
                }
                Some(id)
            }
        };

        let row = IssueRow {
            id: 0,
            magazine_id,
            year: check_int(data.get("year"), IntOpts::lenient()),
            number: check_int(data.get("number"), IntOpts::lenient()),
            number_extra: clean_string(data.get("number_extra")),
            count: check_int(data.get("count"), IntOpts::lenient()),
            pages: check_int(data.get("pages"), IntOpts::lenient()),
            size_id,
            title: clean_string(data.get("title")),
            notes: clean_description(data.get("notes")),
            link: clean_string(data.get("link")),
            image_src: clean_string(data.get("image_src")),
        };
        let issue_id = magazines::insert_issue_row(tx.as_mut(), &row).await?;

        if data.get("contributors").is_some() {
            let contributions = contributors::filter_roles(
                contributors::parse_contributions(data.get("contributors"))?,
                &role::ISSUE_ROLES,
            );
            contributors::save_issue_contributions(tx.as_mut(), issue_id, &contributions).await?;
        }
        logs::log_create(tx.as_mut(), "issue", issue_id, &issue_name(&row), user_id).await?;
        tx.commit().await?;
        Ok(issue_id)
    }

    pub async fn update_issue(&self, user_id: Option<i32>, data: &Value) -> ApiResult<()> {
        let id = audit::require_int(data.get("id"), IntOpts::positive(), "Virheellinen id.")?;

        let mut tx = self.repo.pool.begin().await?;
        let Some(mut row) = magazines::fetch_issue_row(tx.as_mut(), id).await? else {
            return Err(ApiError::BadRequest("Tietuetta ei löydy.".to_string()));
        };
        let mut old = OldValues::new();

        if data.get("number").is_some() {
            let new = check_int(data.get("number"), IntOpts::lenient());
            if row.number != new {
                old.record_i32("Numero", row.number);
                row.number = new;
            }
        }
        if data.get("number_extra").is_some() {
            let new = clean_string(data.get("number_extra"));
            if str_differ(row.number_extra.as_deref(), new.as_deref()) {
                old.record("Numeron tarkenne", row.number_extra.clone());
                row.number_extra = new;
            }
        }
        if data.get("count").is_some() {
            let new = check_int(data.get("count"), IntOpts::lenient());
            if row.count != new {
                old.record_i32("Järjestysnumero", row.count);
                row.count = new;
            }
        }
        if data.get("year").is_some() {
            let new = check_int(data.get("year"), IntOpts::lenient());
            if row.year != new {
                old.record_i32("Vuosi", row.year);
                row.year = new;
            }
        }
        if data.get("notes").is_some() {
            let new = clean_description(data.get("notes"));
            if str_differ(row.notes.as_deref(), new.as_deref()) {
                old.record("Muuta", row.notes.clone());
                row.notes = new;
            }
        }
        if data.get("title").is_some() {
            let new = clean_string(data.get("title"));
            if str_differ(row.title.as_deref(), new.as_deref()) {
                old.record("Nimeke", row.title.clone());
                row.title = new;
            }
        }
        if data.get("link").is_some() {
            let new = clean_string(data.get("link"));
            if str_differ(row.link.as_deref(), new.as_deref()) {
                old.record("Linkki", row.link.clone());
                row.link = new;
            }
        }
        if data.get("size").is_some() {
            let new = match data.get("size") {
                Some(Value::Null) => None,
                size => Some(rel_id(size).ok_or_else(|| {
                    ApiError::BadRequest("Julkaisukoko on virheellinen.".to_string())
                })?),
            };
            if row.size_id != new {
                old.record_i32("Koko", row.size_id);
                row.size_id = new;
            }
        }
        if data.get("pages").is_some() {
            let new = check_int(data.get("pages"), IntOpts::lenient());
            if row.pages != new {
                old.record_i32("Sivuja", row.pages);
                row.pages = new;
            }
        }

        if data.get("contributors").is_some() {
            let new = contributors::filter_roles(
                contributors::parse_contributions(data.get("contributors"))?,
                &role::ISSUE_ROLES,
            );
            let existing = contributors::issue_contributions(tx.as_mut(), id).await?;
            if contributors::have_changed(&existing, &new) {
                old.record(
                    "Tekijät",
                    Some(contributors::contributors_string(&existing)),
                );
                contributors::save_issue_contributions(tx.as_mut(), id, &new).await?;
            }
        }

        if let Some(new) = rel_id_list(data.get("tags")) {
            let existing: Vec<i32> = sqlx::query_scalar(
                "SELECT tag_id FROM issuetag WHERE issue_id = $1 ORDER BY tag_id",
            )
            .bind(id)
            .fetch_all(tx.as_mut())
            .await?;
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
                sqlx::query("DELETE FROM issuetag WHERE issue_id = $1")
                    .bind(id)
                    .execute(tx.as_mut())
                    .await?;
                for tag_id in &new {
                    sqlx::query("INSERT INTO issuetag (issue_id, tag_id) VALUES ($1, $2)")
                        .bind(id)
                        .bind(tag_id)
                        .execute(tx.as_mut())
                        .await?;
                }
            }
        }

        if old.is_empty() {
            return Ok(());
        }
        magazines::update_issue_row(tx.as_mut(), &row).await?;
        logs::log_update(tx.as_mut(), "issue", id, &issue_name(&row), user_id, &old).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_issue(&self, user_id: Option<i32>, id: i32) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        let Some(row) = magazines::fetch_issue_row(tx.as_mut(), id).await? else {
            return Err(ApiError::BadRequest("Tietuetta ei löydy.".to_string()));
        };

        let name = issue_name(&row);
        let mut old = OldValues::new();
        old.record("Numero", Some(name.clone()));
        logs::log_delete(tx.as_mut(), "issue", id, &name, user_id, &old).await?;
        magazines::delete_issue_cascade(tx.as_mut(), id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Replace the ordered contents of an issue.
    pub async fn save_issue_shorts(&self, issue_id: i32, short_ids: &[i32]) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        if magazines::fetch_issue_row(tx.as_mut(), issue_id).await?.is_none() {
            return Err(ApiError::BadRequest("Numeroa ei löydy.".to_string()));
        }
        magazines::save_issue_shorts(tx.as_mut(), issue_id, short_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn add_issue_tag(&self, issue_id: i32, tag_id: i32) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        if magazines::fetch_issue_row(tx.as_mut(), issue_id).await?.is_none() {
            return Err(ApiError::BadRequest("Numeroa ei löydy.".to_string()));
        }
        sqlx::query(
            "INSERT INTO issuetag (issue_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(issue_id)
        .bind(tag_id)
        .execute(tx.as_mut())
        .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn remove_issue_tag(&self, issue_id: i32, tag_id: i32) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM issuetag WHERE issue_id = $1 AND tag_id = $2")
            .bind(issue_id)
            .bind(tag_id)
            .execute(&self.repo.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::BadRequest(
                "Asiasanaa ei löydy numerolta.".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn set_issue_image(
        &self,
        user_id: Option<i32>,
        issue_id: i32,
        filename: &str,
    ) -> ApiResult<()> {
        let clean = sanitize_cover_filename(filename)?;

        let mut tx = self.repo.pool.begin().await?;
        let Some(mut row) = magazines::fetch_issue_row(tx.as_mut(), issue_id).await? else {
            return Err(ApiError::BadRequest("Numeroa ei löydy.".to_string()));
        };
        let mut old = OldValues::new();
        old.record("Kansikuva", row.image_src.clone());
        row.image_src = Some(format!("/static/magazinecovers/{clean}"));
        magazines::update_issue_row(tx.as_mut(), &row).await?;
        logs::log_update(
            tx.as_mut(),
            "issue",
            issue_id,
            &issue_name(&row),
            user_id,
            &old,
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn remove_issue_image(&self, user_id: Option<i32>, issue_id: i32) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        let Some(mut row) = magazines::fetch_issue_row(tx.as_mut(), issue_id).await? else {
            return Err(ApiError::BadRequest("Numeroa ei löydy.".to_string()));
        };
        let Some(previous) = row.image_src.take() else {
            return Err(ApiError::BadRequest("Kuvaa ei löydy.".to_string()));
        };
        let mut old = OldValues::new();
        old.record("Kansikuva", Some(previous));
        magazines::update_issue_row(tx.as_mut(), &row).await?;
        logs::log_delete(
            tx.as_mut(),
            "issue",
            issue_id,
            &issue_name(&row),
            user_id,
            &old,
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn add_article_tag(&self, article_id: i32, tag_id: i32) -> ApiResult<()> {
        let mut tx = self.repo.pool.begin().await?;
        let known: Option<(i32,)> = sqlx::query_as("SELECT id FROM article WHERE id = $1")
            .bind(article_id)
            .fetch_optional(tx.as_mut())
            .await?;
        if known.is_none() {
            return Err(ApiError::BadRequest("Artikkelia ei löydy.".to_string()));
        }
        sqlx::query(
            "INSERT INTO articletag (article_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(article_id)
        .bind(tag_id)
        .execute(tx.as_mut())
        .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn remove_article_tag(&self, article_id: i32, tag_id: i32) -> ApiResult<()> {
        sqlx::query("DELETE FROM articletag WHERE article_id = $1 AND tag_id = $2")
            .bind(article_id)
            .bind(tag_id)
            .execute(&self.repo.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(number: Option<i32>, extra: Option<&str>, year: Option<i32>) -> IssueRow {
        IssueRow {
            id: 1,
            magazine_id: 1,
            year,
            number,
            number_extra: extra.map(str::to_string),
            count: None,
            pages: None,
            size_id: None,
            title: None,
            notes: None,
            link: None,
            image_src: None,
        }
    }

    #[test]
    fn issue_names_combine_number_and_year() {
        assert_eq!(issue_name(&row(Some(3), None, Some(2001))), "3/2001");
        assert_eq!(issue_name(&row(Some(3), Some("b"), Some(2001))), "3b/2001");
        assert_eq!(issue_name(&row(None, None, Some(2001))), "/2001");
    }
}
