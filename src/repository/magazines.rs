//! Magazine, issue and article persistence.

use sqlx::{PgConnection, Pool, Postgres};

use crate::error::ApiResult;
use crate::models::magazine::{
    Article, ArticleBrief, Issue, IssueBrief, IssueRow, Magazine, MagazineBrief,
};
use crate::models::refs::IdName;
use crate::models::short::ShortBrief;
use crate::services::contributors;

const ISSUE_COLUMNS: &str = "id, magazine_id, year, number, number_extra, count, \
     pages, size_id, title, notes, link, image_src";

pub async fn fetch_issue_row(conn: &mut PgConnection, id: i32) -> ApiResult<Option<IssueRow>> {
    let sql = format!("SELECT {ISSUE_COLUMNS} FROM issue WHERE id = $1");
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(conn).await?)
}

pub async fn insert_issue_row(conn: &mut PgConnection, row: &IssueRow) -> ApiResult<i32> {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO issue (magazine_id, year, number, number_extra, count, \
                            pages, size_id, title, notes, link, image_src) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING id",
    )
    .bind(row.magazine_id)
    .bind(row.year)
    .bind(row.number)
    .bind(&row.number_extra)
    .bind(row.count)
    .bind(row.pages)
    .bind(row.size_id)
    .bind(&row.title)
    .bind(&row.notes)
    .bind(&row.link)
    .bind(&row.image_src)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn update_issue_row(conn: &mut PgConnection, row: &IssueRow) -> ApiResult<()> {
    sqlx::query(
        "UPDATE issue SET magazine_id = $1, year = $2, number = $3, number_extra = $4, \
                count = $5, pages = $6, size_id = $7, title = $8, notes = $9, \
                link = $10, image_src = $11 \
         WHERE id = $12",
    )
    .bind(row.magazine_id)
    .bind(row.year)
    .bind(row.number)
    .bind(&row.number_extra)
    .bind(row.count)
    .bind(row.pages)
    .bind(row.size_id)
    .bind(&row.title)
    .bind(&row.notes)
    .bind(&row.link)
    .bind(&row.image_src)
    .bind(row.id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Delete an issue together with its junction rows and articles.
pub async fn delete_issue_cascade(conn: &mut PgConnection, id: i32) -> ApiResult<()> {
    sqlx::query("DELETE FROM issuecontributor WHERE issue_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM issueshortstory WHERE issue_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM issuetag WHERE issue_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "DELETE FROM articleauthor WHERE article_id IN \
         (SELECT id FROM article WHERE issue_id = $1)",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;
    sqlx::query(
        "DELETE FROM articletag WHERE article_id IN \
         (SELECT id FROM article WHERE issue_id = $1)",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;
    sqlx::query("DELETE FROM article WHERE issue_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM issue WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Replace the ordered short story list of an issue.
pub async fn save_issue_shorts(
    conn: &mut PgConnection,
    issue_id: i32,
    short_ids: &[i32],
) -> ApiResult<()> {
    sqlx::query("DELETE FROM issueshortstory WHERE issue_id = $1")
        .bind(issue_id)
        .execute(&mut *conn)
        .await?;
    for (order, short_id) in short_ids.iter().enumerate() {
        sqlx::query(
            "INSERT INTO issueshortstory (issue_id, shortstory_id, order_num) \
             VALUES ($1, $2, $3)",
        )
        .bind(issue_id)
        .bind(short_id)
        .bind((order + 1) as i32)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct MagazinesRepository {
    pool: Pool<Postgres>,
}

impl MagazinesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> ApiResult<Vec<MagazineBrief>> {
        Ok(
            sqlx::query_as("SELECT id, name, issn FROM magazine ORDER BY name")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    pub async fn get(&self, id: i32) -> ApiResult<Option<Magazine>> {
        #[derive(sqlx::FromRow)]
        struct MagazineRow {
            id: i32,
            name: String,
            description: Option<String>,
            issn: Option<String>,
            link: Option<String>,
            type_id: Option<i32>,
            publisher_id: Option<i32>,
        }

        let Some(row) = sqlx::query_as::<_, MagazineRow>(
            "SELECT id, name, description, issn, link, type_id, publisher_id \
             FROM magazine WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let magazine_type: Option<IdName> = match row.type_id {
            Some(type_id) => {
                sqlx::query_as("SELECT id, name FROM magazinetype WHERE id = $1")
                    .bind(type_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };
        let publisher: Option<IdName> = match row.publisher_id {
            Some(publisher_id) => {
                sqlx::query_as("SELECT id, name FROM publisher WHERE id = $1")
                    .bind(publisher_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        let issues: Vec<IssueBrief> = sqlx::query_as(
            "SELECT i.id, i.magazine_id, i.year, i.number, i.number_extra, i.count, \
                    m.name AS magazine_name, \
                    concat(i.number, coalesce(i.number_extra, ''), '/', i.year) \
                        AS cover_number \
             FROM issue i \
             JOIN magazine m ON m.id = i.magazine_id \
             WHERE i.magazine_id = $1 \
             ORDER BY i.year, i.number",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let tags: Vec<IdName> = sqlx::query_as(
            "SELECT t.id, t.name FROM tag t \
             JOIN magazinetag mt ON mt.tag_id = t.id \
             WHERE mt.magazine_id = $1 ORDER BY t.name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Magazine {
            id: row.id,
            name: row.name,
            description: row.description,
            issn: row.issn,
            link: row.link,
            magazine_type,
            publisher,
            issues,
            tags,
        }))
    }

    pub async fn get_issue(&self, id: i32) -> ApiResult<Option<Issue>> {
        let mut conn = self.pool.acquire().await?;
        let Some(row) = fetch_issue_row(conn.as_mut(), id).await? else {
            return Ok(None);
        };
        let contributors = contributors::issue_contributions(conn.as_mut(), id).await?;
        drop(conn);

        let magazine: IdName = sqlx::query_as("SELECT id, name FROM magazine WHERE id = $1")
            .bind(row.magazine_id)
            .fetch_one(&self.pool)
            .await?;

        let size: Option<IdName> = match row.size_id {
            Some(size_id) => {
                sqlx::query_as("SELECT id, name FROM publicationsize WHERE id = $1")
                    .bind(size_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        let articles: Vec<ArticleBrief> = sqlx::query_as(
            "SELECT id, title, person FROM article WHERE issue_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let stories: Vec<ShortBrief> = sqlx::query_as(
            "SELECT s.id, s.title, s.orig_title, s.pubyear, st.name AS story_type, \
                    (SELECT string_agg(p.name, ' & ') \
                     FROM storycontributor sc \
                     JOIN person p ON p.id = sc.person_id \
                     WHERE sc.shortstory_id = s.id AND sc.role_id = 1) AS author_str \
             FROM shortstory s \
             JOIN issueshortstory iss ON iss.shortstory_id = s.id \
             LEFT JOIN storytype st ON st.id = s.story_type \
             WHERE iss.issue_id = $1 \
             ORDER BY iss.order_num",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let tags: Vec<IdName> = sqlx::query_as(
            "SELECT t.id, t.name FROM tag t \
             JOIN issuetag it ON it.tag_id = t.id \
             WHERE it.issue_id = $1 ORDER BY t.name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Issue {
            id: row.id,
            magazine,
            year: row.year,
            number: row.number,
            number_extra: row.number_extra,
            count: row.count,
            pages: row.pages,
            size,
            title: row.title,
            notes: row.notes,
            link: row.link,
            image_src: row.image_src,
            contributors,
            articles,
            stories,
            tags,
        }))
    }

    pub async fn issue_shorts(&self, issue_id: i32) -> ApiResult<Vec<ShortBrief>> {
        Ok(sqlx::query_as(
            "SELECT s.id, s.title, s.orig_title, s.pubyear, st.name AS story_type, \
                    (SELECT string_agg(p.name, ' & ') \
                     FROM storycontributor sc \
                     JOIN person p ON p.id = sc.person_id \
                     WHERE sc.shortstory_id = s.id AND sc.role_id = 1) AS author_str \
             FROM shortstory s \
             JOIN issueshortstory iss ON iss.shortstory_id = s.id \
             LEFT JOIN storytype st ON st.id = s.story_type \
             WHERE iss.issue_id = $1 \
             ORDER BY iss.order_num",
        )
        .bind(issue_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn issue_articles(&self, issue_id: i32) -> ApiResult<Vec<ArticleBrief>> {
        Ok(sqlx::query_as(
            "SELECT id, title, person FROM article WHERE issue_id = $1 ORDER BY id",
        )
        .bind(issue_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn get_article(&self, id: i32) -> ApiResult<Option<Article>> {
        #[derive(sqlx::FromRow)]
        struct ArticleRow {
            id: i32,
            title: String,
            person: Option<String>,
            issue_id: Option<i32>,
            excerpt: Option<String>,
        }

        let Some(row) = sqlx::query_as::<_, ArticleRow>(
            "SELECT id, title, person, issue_id, excerpt FROM article WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let author_rel: Vec<IdName> = sqlx::query_as(
            "SELECT p.id, p.name FROM person p \
             JOIN articleauthor aa ON aa.person_id = p.id \
             WHERE aa.article_id = $1 ORDER BY p.name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let tags: Vec<IdName> = sqlx::query_as(
            "SELECT t.id, t.name FROM tag t \
             JOIN articletag atg ON atg.tag_id = t.id \
             WHERE atg.article_id = $1 ORDER BY t.name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Article {
            id: row.id,
            title: row.title,
            person: row.person,
            issue_id: row.issue_id,
            excerpt: row.excerpt,
            author_rel,
            tags,
        }))
    }

}
