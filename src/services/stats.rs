//! Read-only aggregates over the catalog graph. Queries run directly
//! against the pool; every shape is fixed and counts are exact.
//!
//! "First edition" throughout means editionnum is null or 1 and version
//! is null or 1.

use indexmap::IndexMap;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::{ApiError, ApiResult};

const TOP_COUNT: usize = 10;
const FIRST_EDITION: &str =
    "(e.editionnum IS NULL OR e.editionnum = 1) AND (e.version IS NULL OR e.version = 1)";

#[derive(Clone)]
pub struct StatsService {
    pool: PgPool,
}

/// One row of a top-N person or publisher listing. The trailing "Muut"
/// row has a null id and aggregates everything outside the top N.
#[derive(Debug, Clone, Serialize)]
pub struct TopCountRow {
    pub id: Option<i32>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    pub genres: IndexMap<String, i64>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct YearCountRow {
    pub year: i32,
    pub count: i64,
    pub language_id: Option<i32>,
    pub language_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StoryYearCountRow {
    pub year: i32,
    pub count: i64,
    pub storytype_id: Option<i32>,
    pub storytype_name: Option<String>,
    pub language_id: Option<i32>,
    pub language_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct IssueYearCountRow {
    pub year: i32,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NationalityCountRow {
    pub nationality_id: Option<i32>,
    pub nationality: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MiscStats {
    pub total_pages: i64,
    pub stack_height_meters: f64,
    pub hardback_count: i64,
    pub paperback_count: i64,
    pub total_editions: i64,
    pub total_works: i64,
}

/// Stack height in meters for a page total, assuming 100 pages = 15 mm,
/// rounded to two decimals.
pub fn stack_height(total_pages: i64) -> f64 {
    ((total_pages as f64) / 100.0 * 0.015 * 100.0).round() / 100.0
}

#[derive(FromRow)]
struct AbbrCount {
    abbr: String,
    count: i64,
}

#[derive(FromRow)]
struct EntityTotal {
    id: i32,
    name: String,
    alt_name: Option<String>,
    nationality: Option<String>,
    total: i64,
}

#[derive(FromRow)]
struct PublisherTotal {
    id: i32,
    name: String,
    fullname: Option<String>,
    total: i64,
}

#[derive(FromRow)]
struct Breakdown {
    entity_id: i32,
    abbr: String,
    count: i64,
}

impl StatsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Work counts per genre, keyed by abbreviation.
    pub async fn genre_counts(&self) -> ApiResult<IndexMap<String, i64>> {
        let rows: Vec<AbbrCount> = sqlx::query_as(
            "SELECT g.abbr, count(wg.work_id) AS count \
             FROM genre g \
             LEFT JOIN workgenre wg ON wg.genre_id = g.id \
             GROUP BY g.id, g.abbr \
             ORDER BY g.id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| (r.abbr, r.count)).collect())
    }

    /// Most productive authors with per-genre work counts. Optional
    /// genre abbreviation restricts the ranking to that genre.
    pub async fn author_counts(
        &self,
        count: Option<usize>,
        genre: Option<&str>,
    ) -> ApiResult<Vec<TopCountRow>> {
        let genre_abbrs = self.genre_abbrs().await?;
        let genre_filter = match genre {
            Some(abbr) => {
                let id: Option<(i32,)> = sqlx::query_as("SELECT id FROM genre WHERE abbr = $1")
                    .bind(abbr)
                    .fetch_optional(&self.pool)
                    .await?;
                match id {
                    Some((id,)) => Some(id),
                    None => {
                        return Err(ApiError::BadRequest(format!("Tuntematon genre: {abbr}")))
                    }
                }
            }
            None => None,
        };

        let mut totals_sql = String::from(
            "SELECT p.id, p.name, p.alt_name, c.name AS nationality, \
                    count(DISTINCT wc.work_id) AS total \
             FROM person p \
             JOIN workcontributor wc ON wc.person_id = p.id AND wc.role_id = 1 \
             LEFT JOIN country c ON c.id = p.nationality_id ",
        );
        if genre_filter.is_some() {
            totals_sql.push_str(
                "JOIN workgenre wg ON wg.work_id = wc.work_id AND wg.genre_id = $1 ",
            );
        }
        totals_sql.push_str("GROUP BY p.id, p.name, p.alt_name, c.name ORDER BY total DESC");

        let mut totals_query = sqlx::query_as::<_, EntityTotal>(&totals_sql);
        if let Some(id) = genre_filter {
            totals_query = totals_query.bind(id);
        }
        let totals = totals_query.fetch_all(&self.pool).await?;

        let breakdowns: Vec<Breakdown> = sqlx::query_as(
            "SELECT wc.person_id AS entity_id, g.abbr, \
                    count(DISTINCT wc.work_id) AS count \
             FROM workcontributor wc \
             JOIN workgenre wg ON wg.work_id = wc.work_id \
             JOIN genre g ON g.id = wg.genre_id \
             WHERE wc.role_id = 1 \
             GROUP BY wc.person_id, g.abbr",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(assemble_top(
            totals
                .into_iter()
                .map(|t| (t.id, t.name, t.alt_name, None, t.nationality, t.total))
                .collect(),
            breakdowns,
            &genre_abbrs,
            count.unwrap_or(TOP_COUNT),
        ))
    }

    /// Most productive short story authors, partitioned by story type
    /// rather than genre.
    pub async fn story_person_counts(&self, count: Option<usize>) -> ApiResult<Vec<TopCountRow>> {
        let type_names: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM storytype ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        let type_names: Vec<String> = type_names.into_iter().map(|(n,)| n).collect();

        let totals: Vec<EntityTotal> = sqlx::query_as(
            "SELECT p.id, p.name, p.alt_name, c.name AS nationality, \
                    count(DISTINCT sc.shortstory_id) AS total \
             FROM person p \
             JOIN storycontributor sc ON sc.person_id = p.id AND sc.role_id = 1 \
             LEFT JOIN country c ON c.id = p.nationality_id \
             GROUP BY p.id, p.name, p.alt_name, c.name \
             ORDER BY total DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let breakdowns: Vec<Breakdown> = sqlx::query_as(
            "SELECT sc.person_id AS entity_id, st.name AS abbr, \
                    count(DISTINCT sc.shortstory_id) AS count \
             FROM storycontributor sc \
             JOIN shortstory s ON s.id = sc.shortstory_id \
             JOIN storytype st ON st.id = s.story_type \
             WHERE sc.role_id = 1 \
             GROUP BY sc.person_id, st.name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(assemble_top(
            totals
                .into_iter()
                .map(|t| (t.id, t.name, t.alt_name, None, t.nationality, t.total))
                .collect(),
            breakdowns,
            &type_names,
            count.unwrap_or(TOP_COUNT),
        ))
    }

    /// Biggest publishers by distinct edition count with per-genre
    /// breakdown.
    pub async fn publisher_counts(&self, count: Option<usize>) -> ApiResult<Vec<TopCountRow>> {
        let genre_abbrs = self.genre_abbrs().await?;

        let totals: Vec<PublisherTotal> = sqlx::query_as(
            "SELECT pub.id, pub.name, pub.fullname, count(DISTINCT e.id) AS total \
             FROM publisher pub \
             JOIN edition e ON e.publisher_id = pub.id \
             GROUP BY pub.id, pub.name, pub.fullname \
             ORDER BY total DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let breakdowns: Vec<Breakdown> = sqlx::query_as(
            "SELECT e.publisher_id AS entity_id, g.abbr, \
                    count(DISTINCT e.id) AS count \
             FROM edition e \
             JOIN part pt ON pt.edition_id = e.id \
             JOIN workgenre wg ON wg.work_id = pt.work_id \
             JOIN genre g ON g.id = wg.genre_id \
             WHERE e.publisher_id IS NOT NULL \
             GROUP BY e.publisher_id, g.abbr",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(assemble_top(
            totals
                .into_iter()
                .map(|t| (t.id, t.name, None, t.fullname, None, t.total))
                .collect(),
            breakdowns,
            &genre_abbrs,
            count.unwrap_or(TOP_COUNT),
        ))
    }

    /// First editions per publication year, grouped by the work's
    /// original language.
    pub async fn works_by_year(&self) -> ApiResult<Vec<YearCountRow>> {
        let sql = format!(
            "SELECT e.pubyear AS year, count(e.id) AS count, \
                    l.id AS language_id, l.name AS language_name \
             FROM edition e \
             LEFT JOIN part pt ON pt.edition_id = e.id \
             LEFT JOIN work w ON w.id = pt.work_id \
             LEFT JOIN language l ON l.id = w.language \
             WHERE {FIRST_EDITION} \
             GROUP BY e.pubyear, l.id, l.name \
             ORDER BY e.pubyear, l.name"
        );
        Ok(sqlx::query_as(&sql).fetch_all(&self.pool).await?)
    }

    /// Original publications per year from `work.pubyear`.
    pub async fn orig_works_by_year(&self) -> ApiResult<Vec<YearCountRow>> {
        Ok(sqlx::query_as(
            "SELECT w.pubyear AS year, count(w.id) AS count, \
                    l.id AS language_id, l.name AS language_name \
             FROM work w \
             LEFT JOIN language l ON l.id = w.language \
             WHERE w.pubyear IS NOT NULL AND w.pubyear > 0 \
             GROUP BY w.pubyear, l.id, l.name \
             ORDER BY w.pubyear, l.name",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Short stories per original year, grouped by story type and
    /// language.
    pub async fn stories_by_year(&self) -> ApiResult<Vec<StoryYearCountRow>> {
        Ok(sqlx::query_as(
            "SELECT s.pubyear AS year, count(s.id) AS count, \
                    st.id AS storytype_id, st.name AS storytype_name, \
                    l.id AS language_id, l.name AS language_name \
             FROM shortstory s \
             LEFT JOIN storytype st ON st.id = s.story_type \
             LEFT JOIN language l ON l.id = s.language \
             WHERE s.pubyear IS NOT NULL AND s.pubyear > 0 \
             GROUP BY s.pubyear, st.id, st.name, l.id, l.name \
             ORDER BY s.pubyear, st.name, l.name",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Magazine issues per year.
    pub async fn issues_per_year(&self) -> ApiResult<Vec<IssueYearCountRow>> {
        Ok(sqlx::query_as(
            "SELECT i.year, count(i.id) AS count \
             FROM issue i \
             WHERE i.year IS NOT NULL \
             GROUP BY i.year \
             ORDER BY i.year",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Work counts by author nationality, descending.
    pub async fn nationality_counts(&self) -> ApiResult<Vec<NationalityCountRow>> {
        Ok(sqlx::query_as(
            "SELECT c.id AS nationality_id, c.name AS nationality, \
                    count(DISTINCT wc.work_id) AS count \
             FROM person p \
             LEFT JOIN country c ON c.id = p.nationality_id \
             JOIN workcontributor wc ON wc.person_id = p.id AND wc.role_id = 1 \
             GROUP BY c.id, c.name \
             ORDER BY count DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Short story counts by author nationality, descending.
    pub async fn story_nationality_counts(&self) -> ApiResult<Vec<NationalityCountRow>> {
        Ok(sqlx::query_as(
            "SELECT c.id AS nationality_id, c.name AS nationality, \
                    count(DISTINCT sc.shortstory_id) AS count \
             FROM person p \
             LEFT JOIN country c ON c.id = p.nationality_id \
             JOIN storycontributor sc ON sc.person_id = p.id AND sc.role_id = 1 \
             GROUP BY c.id, c.name \
             ORDER BY count DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn misc(&self) -> ApiResult<MiscStats> {
        let sql = format!(
            "SELECT coalesce(sum(e.pages), 0) FROM edition e \
             WHERE {FIRST_EDITION} AND e.pages IS NOT NULL"
        );
        let (total_pages,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;

        let hardback_count = self
            .binding_count(&[
                "%kovakantinen%",
                "%sidottu%",
                "%hardback%",
                "%hard%",
            ])
            .await?;
        let paperback_count = self
            .binding_count(&[
                "%pehmeäkantinen%",
                "%nidottu%",
                "%paperback%",
                "%soft%",
                "%pokkari%",
            ])
            .await?;

        let (total_editions,): (i64,) = sqlx::query_as("SELECT count(*) FROM edition")
            .fetch_one(&self.pool)
            .await?;
        let (total_works,): (i64,) = sqlx::query_as("SELECT count(*) FROM work")
            .fetch_one(&self.pool)
            .await?;

        Ok(MiscStats {
            total_pages,
            stack_height_meters: stack_height(total_pages),
            hardback_count,
            paperback_count,
            total_editions,
            total_works,
        })
    }

    async fn binding_count(&self, patterns: &[&str]) -> ApiResult<i64> {
        let sql = format!(
            "SELECT count(e.id) FROM edition e \
             JOIN bindingtype b ON b.id = e.binding_id \
             WHERE {FIRST_EDITION} AND lower(b.name) ILIKE ANY($1)"
        );
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(&patterns)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn genre_abbrs(&self) -> ApiResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT abbr FROM genre ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(a,)| a).collect())
    }
}

type TotalTuple = (
    i32,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    i64,
);

/// Split ranked totals into the top N rows plus a trailing "Muut" row
/// that absorbs the remainder, so column totals reconcile.
fn assemble_top(
    totals: Vec<TotalTuple>,
    breakdowns: Vec<Breakdown>,
    all_keys: &[String],
    top: usize,
) -> Vec<TopCountRow> {
    let mut per_entity: std::collections::HashMap<i32, IndexMap<String, i64>> =
        std::collections::HashMap::new();
    for b in breakdowns {
        per_entity.entry(b.entity_id).or_default().insert(b.abbr, b.count);
    }

    let mut result: Vec<TopCountRow> = Vec::new();
    let mut other_genres: IndexMap<String, i64> =
        all_keys.iter().map(|k| (k.clone(), 0)).collect();
    let mut other_total = 0i64;

    for (idx, (id, name, alt_name, fullname, nationality, total)) in
        totals.into_iter().enumerate()
    {
        let genres = per_entity.remove(&id).unwrap_or_default();
        if idx < top {
            result.push(TopCountRow {
                id: Some(id),
                name,
                alt_name,
                fullname,
                nationality,
                genres,
                total,
            });
        } else {
            for (key, count) in genres {
                *other_genres.entry(key).or_insert(0) += count;
            }
            other_total += total;
        }
    }

    result.push(TopCountRow {
        id: None,
        name: "Muut".to_string(),
        alt_name: None,
        fullname: None,
        nationality: None,
        genres: other_genres,
        total: other_total,
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_height_rounds_to_two_decimals() {
        assert_eq!(stack_height(0), 0.0);
        assert_eq!(stack_height(100), 0.02);
        assert_eq!(stack_height(1_234_567), 185.19);
    }

    #[test]
    fn year_and_nationality_rows_serialize_flat() {
        let row = YearCountRow {
            year: 1984,
            count: 7,
            language_id: Some(1),
            language_name: Some("suomi".into()),
        };
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            serde_json::json!({
                "year": 1984,
                "count": 7,
                "language_id": 1,
                "language_name": "suomi",
            })
        );

        let row = NationalityCountRow {
            nationality_id: None,
            nationality: None,
            count: 3,
        };
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            serde_json::json!({
                "nationality_id": null,
                "nationality": null,
                "count": 3,
            })
        );
    }

    #[test]
    fn top_rows_followed_by_muut() {
        let totals = vec![
            (1, "A".to_string(), None, None, None, 10),
            (2, "B".to_string(), None, None, None, 5),
            (3, "C".to_string(), None, None, None, 2),
        ];
        let breakdowns = vec![
            Breakdown {
                entity_id: 1,
                abbr: "SF".into(),
                count: 10,
            },
            Breakdown {
                entity_id: 3,
                abbr: "SF".into(),
                count: 2,
            },
        ];
        let keys = vec!["SF".to_string(), "F".to_string()];
        let rows = assemble_top(totals, breakdowns, &keys, 2);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].id, Some(1));
        assert_eq!(rows[1].id, Some(2));
        let muut = &rows[2];
        assert_eq!(muut.id, None);
        assert_eq!(muut.name, "Muut");
        assert_eq!(muut.total, 2);
        assert_eq!(muut.genres["SF"], 2);
        assert_eq!(muut.genres["F"], 0);
    }
}
