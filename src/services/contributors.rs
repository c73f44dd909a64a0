//! Contribution handling shared by works, editions, shorts and issues.
//!
//! Each target has its own contributor table with a role whitelist;
//! saving is always delete-then-reinsert inside the caller's
//! transaction. The derived `author_str` column on works is recomputed
//! here whenever work contributions change.

use serde_json::Value;
use sqlx::PgConnection;

use crate::error::{ApiError, ApiResult};
use crate::models::contributor::{Contribution, ContributorRow};
use crate::models::refs::role;

/// Parse the `contributions` field of a mutation payload. Rows with a
/// missing or zero person or role are empty editor rows and silently
/// dropped; a malformed list is user error.
pub fn parse_contributions(value: Option<&Value>) -> ApiResult<Vec<Contribution>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let list: Vec<Contribution> = serde_json::from_value(value.clone())
        .map_err(|_| ApiError::BadRequest("Virheelliset tekijätiedot.".to_string()))?;
    Ok(list
        .into_iter()
        .filter(|c| c.person.id > 0 && c.role.id > 0)
        .collect())
}

/// Drop contributions whose role is not legal for the target table.
pub fn filter_roles(contributions: Vec<Contribution>, allowed: &[i32]) -> Vec<Contribution> {
    contributions
        .into_iter()
        .filter(|c| {
            let ok = allowed.contains(&c.role.id);
            if !ok {
                tracing::warn!(
                    person = c.person.id,
                    role = c.role.id,
                    "dropping contribution with role not valid for target"
                );
            }
            ok
        })
        .collect()
}

/// Positional comparison of stored contributions against incoming ones.
/// Order matters; a reordered list counts as a change.
pub fn have_changed(old: &[Contribution], new: &[Contribution]) -> bool {
    if old.len() != new.len() {
        return true;
    }
    old.iter().zip(new.iter()).any(|(a, b)| {
        a.person.id != b.person.id
            || a.role.id != b.role.id
            || a.description.as_deref().unwrap_or("") != b.description.as_deref().unwrap_or("")
    })
}

/// Render contributions for a change-log old value, one per line as
/// `Name [Role(description)]`.
pub fn contributors_string(contributions: &[Contribution]) -> String {
    contributions
        .iter()
        .map(|c| {
            let mut s = format!(
                "{} [{}",
                c.person.name.as_deref().unwrap_or(""),
                c.role.name.as_deref().unwrap_or("")
            );
            if let Some(desc) = c.description.as_deref().filter(|d| !d.is_empty()) {
                s.push('(');
                s.push_str(desc);
                s.push(')');
            }
            s.push(']');
            s
        })
        .collect::<Vec<_>>()
        .join("\n")
}

async fn load(
    conn: &mut PgConnection,
    table: &str,
    id_column: &str,
    id: i32,
) -> ApiResult<Vec<Contribution>> {
    let sql = format!(
        "SELECT c.person_id, p.name AS person_name, c.role_id, r.name AS role_name, \
                c.description \
         FROM {table} c \
         JOIN person p ON p.id = c.person_id \
         JOIN contributorrole r ON r.id = c.role_id \
         WHERE c.{id_column} = $1 \
         ORDER BY c.id"
    );
    let rows: Vec<ContributorRow> = sqlx::query_as(&sql).bind(id).fetch_all(conn).await?;
    Ok(rows.into_iter().map(Contribution::from).collect())
}

async fn save(
    conn: &mut PgConnection,
    table: &str,
    id_column: &str,
    id: i32,
    contributions: &[Contribution],
) -> ApiResult<()> {
    sqlx::query(&format!("DELETE FROM {table} WHERE {id_column} = $1"))
        .bind(id)
        .execute(&mut *conn)
        .await?;
    let insert = format!(
        "INSERT INTO {table} ({id_column}, person_id, role_id, description) \
         VALUES ($1, $2, $3, $4)"
    );
    for c in contributions {
        sqlx::query(&insert)
            .bind(id)
            .bind(c.person.id)
            .bind(c.role.id)
            .bind(c.description.as_deref())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn work_contributions(conn: &mut PgConnection, work_id: i32) -> ApiResult<Vec<Contribution>> {
    load(conn, "workcontributor", "work_id", work_id).await
}

pub async fn save_work_contributions(
    conn: &mut PgConnection,
    work_id: i32,
    contributions: &[Contribution],
) -> ApiResult<()> {
    save(conn, "workcontributor", "work_id", work_id, contributions).await?;
    update_author_str(conn, work_id).await?;
    Ok(())
}

pub async fn edition_contributions(
    conn: &mut PgConnection,
    edition_id: i32,
) -> ApiResult<Vec<Contribution>> {
    load(conn, "editioncontributor", "edition_id", edition_id).await
}

pub async fn save_edition_contributions(
    conn: &mut PgConnection,
    edition_id: i32,
    contributions: &[Contribution],
) -> ApiResult<()> {
    save(
        conn,
        "editioncontributor",
        "edition_id",
        edition_id,
        contributions,
    )
    .await
}

pub async fn short_contributions(
    conn: &mut PgConnection,
    short_id: i32,
) -> ApiResult<Vec<Contribution>> {
    load(conn, "storycontributor", "shortstory_id", short_id).await
}

pub async fn save_short_contributions(
    conn: &mut PgConnection,
    short_id: i32,
    contributions: &[Contribution],
) -> ApiResult<()> {
    save(
        conn,
        "storycontributor",
        "shortstory_id",
        short_id,
        contributions,
    )
    .await
}

pub async fn issue_contributions(
    conn: &mut PgConnection,
    issue_id: i32,
) -> ApiResult<Vec<Contribution>> {
    load(conn, "issuecontributor", "issue_id", issue_id).await
}

pub async fn save_issue_contributions(
    conn: &mut PgConnection,
    issue_id: i32,
    contributions: &[Contribution],
) -> ApiResult<()> {
    save(conn, "issuecontributor", "issue_id", issue_id, contributions).await
}

/// Derive the display author string for a work: authors joined with
/// " & "; if the work has no authors, editors with a " (toim.)" suffix.
pub fn author_str_from(contributions: &[Contribution]) -> String {
    let names = |role_id: i32| -> Vec<&str> {
        contributions
            .iter()
            .filter(|c| c.role.id == role_id)
            .filter_map(|c| c.person.name.as_deref())
            .collect()
    };
    let authors = names(role::AUTHOR);
    if !authors.is_empty() {
        return authors.join(" & ");
    }
    let editors = names(role::EDITOR);
    if editors.is_empty() {
        return String::new();
    }
    format!("{} (toim.)", editors.join(" & "))
}

/// Recompute and persist `work.author_str`.
pub async fn update_author_str(conn: &mut PgConnection, work_id: i32) -> ApiResult<String> {
    let contributions = work_contributions(&mut *conn, work_id).await?;
    let author_str = author_str_from(&contributions);
    sqlx::query("UPDATE work SET author_str = $1 WHERE id = $2")
        .bind(&author_str)
        .bind(work_id)
        .execute(conn)
        .await?;
    Ok(author_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::contributor::ContributionRef;
    use serde_json::json;

    fn contribution(person: i32, role_id: i32, name: &str, role_name: &str) -> Contribution {
        Contribution {
            person: ContributionRef {
                id: person,
                name: Some(name.to_string()),
            },
            role: ContributionRef {
                id: role_id,
                name: Some(role_name.to_string()),
            },
            description: None,
        }
    }

    #[test]
    fn parse_drops_empty_rows() {
        let value = json!([
            {"person": {"id": 1}, "role": {"id": 1}},
            {"person": {"id": 0}, "role": {"id": 1}},
            {"person": {"id": 2}, "role": {"id": 0}}
        ]);
        let parsed = parse_contributions(Some(&value)).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].person.id, 1);
    }

    #[test]
    fn parse_rejects_malformed_payload() {
        let value = json!([{"person": "not an object"}]);
        assert!(parse_contributions(Some(&value)).is_err());
    }

    #[test]
    fn filter_roles_drops_illegal_roles() {
        let contribs = vec![
            contribution(1, role::AUTHOR, "A", "Kirjoittaja"),
            contribution(2, role::TRANSLATOR, "B", "Kääntäjä"),
        ];
        let filtered = filter_roles(contribs, &role::WORK_ROLES);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].role.id, role::AUTHOR);
    }

    #[test]
    fn have_changed_is_positional() {
        let a = contribution(1, 1, "A", "Kirjoittaja");
        let b = contribution(2, 1, "B", "Kirjoittaja");
        assert!(!have_changed(
            &[a.clone(), b.clone()],
            &[a.clone(), b.clone()]
        ));
        assert!(have_changed(&[a.clone(), b.clone()], &[b.clone(), a.clone()]));
        assert!(have_changed(&[a.clone()], &[a.clone(), b]));

        let mut with_desc = a.clone();
        with_desc.description = Some("suom.".to_string());
        assert!(have_changed(&[a], &[with_desc]));
    }

    #[test]
    fn author_str_prefers_authors() {
        let contribs = vec![
            contribution(1, role::AUTHOR, "Leena Krohn", "Kirjoittaja"),
            contribution(2, role::AUTHOR, "Johanna Sinisalo", "Kirjoittaja"),
            contribution(3, role::EDITOR, "Toim. Ihminen", "Toimittaja"),
        ];
        assert_eq!(author_str_from(&contribs), "Leena Krohn & Johanna Sinisalo");
    }

    #[test]
    fn author_str_falls_back_to_editors() {
        let contribs = vec![contribution(3, role::EDITOR, "Toim. Ihminen", "Toimittaja")];
        assert_eq!(author_str_from(&contribs), "Toim. Ihminen (toim.)");
        assert_eq!(author_str_from(&[]), "");
    }

    #[test]
    fn contributors_string_formats_lines() {
        let mut c = contribution(1, role::TRANSLATOR, "Kersti Juva", "Kääntäjä");
        c.description = Some("osa 1".to_string());
        let plain = contribution(2, role::ILLUSTRATOR, "Hannu Lukkarinen", "Kuvittaja");
        assert_eq!(
            contributors_string(&[c, plain]),
            "Kersti Juva [Kääntäjä(osa 1)]\nHannu Lukkarinen [Kuvittaja]"
        );
    }
}
