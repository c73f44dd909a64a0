//! Free-text search across works, people, short stories, articles and
//! publishers. Each search word is matched as a case-insensitive
//! substring; an entity already hit by an earlier word has its score
//! multiplied by the new per-word score, so multi-word matches compound.

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::ApiResult;

pub const PERSON_NAME: i64 = 20;
pub const PERSON_OTHER: i64 = 10;
pub const WORK_TITLE: i64 = 19;
pub const WORK_OTHER: i64 = 9;
pub const STORY_NAME: i64 = 18;
pub const STORY_OTHER: i64 = 8;
pub const ARTICLE_TITLE: i64 = 17;
pub const ARTICLE_OTHER: i64 = 7;
pub const PUBLISHER_NAME: i64 = 16;
pub const PUBLISHER_OTHER: i64 = 6;
pub const STARTS_WITH: i64 = 10;

const MAX_RESULTS: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResultItem {
    pub id: i32,
    pub img: String,
    pub header: String,
    pub description: String,
    pub author: String,
    #[serde(rename = "type")]
    pub result_type: &'static str,
    pub score: i64,
}

/// Score a hit given the primary name fields: a match in any name field
/// earns the name score plus a prefix bonus, anything else the lesser
/// "other" score.
pub fn score_hit(name_fields: &[Option<&str>], word: &str, name_score: i64, other_score: i64) -> i64 {
    let mut best = other_score;
    for field in name_fields.iter().flatten() {
        let lower = field.to_lowercase();
        if lower.contains(word) {
            best = name_score;
            if lower.starts_with(word) {
                return name_score + STARTS_WITH;
            }
        }
    }
    best
}

/// Wrap the first case-insensitive occurrence of `word` in `<b>` tags.
pub fn highlight(text: &str, word: &str) -> String {
    let lower = text.to_lowercase();
    match lower.find(word) {
        Some(start) => {
            // Byte offsets from the lowercase copy are only safe on
            // char boundaries of the original.
            if !text.is_char_boundary(start) || !text.is_char_boundary(start + word.len()) {
                return text.to_string();
            }
            format!(
                "{}<b>{}</b>{}",
                &text[..start],
                &text[start..start + word.len()],
                &text[start + word.len()..]
            )
        }
        None => text.to_string(),
    }
}

/// Nationality and lifespan summary shown under a person hit, e.g.
/// "Suomi (1920-1995)". Each component is elided when absent.
pub fn person_description(
    nationality: Option<&str>,
    dob: Option<i32>,
    dod: Option<i32>,
    bio: Option<&str>,
) -> String {
    let mut out = String::new();
    if let Some(nat) = nationality {
        out.push_str(nat);
    }
    if dob.is_some() || dod.is_some() {
        out.push_str(" (");
        if let Some(dob) = dob {
            out.push_str(&dob.to_string());
        }
        out.push('-');
        if let Some(dod) = dod {
            out.push_str(&dod.to_string());
        }
        out.push(')');
    }
    if !out.is_empty() {
        out.push_str("<br />");
    }
    if let Some(bio) = bio {
        out.push_str(bio);
    }
    out
}

#[derive(Debug, FromRow)]
struct PersonHit {
    id: i32,
    name: String,
    alt_name: Option<String>,
    fullname: Option<String>,
    dob: Option<i32>,
    dod: Option<i32>,
    bio: Option<String>,
    nationality_name: Option<String>,
}

#[derive(Debug, FromRow)]
struct WorkHit {
    id: i32,
    title: String,
    description: Option<String>,
    author_str: Option<String>,
}

#[derive(Debug, FromRow)]
struct StoryHit {
    id: i32,
    title: String,
    authors: Option<String>,
}

#[derive(Debug, FromRow)]
struct ArticleHit {
    id: i32,
    title: String,
    excerpt: Option<String>,
}

#[derive(Debug, FromRow)]
struct PublisherHit {
    id: i32,
    name: String,
    fullname: Option<String>,
    description: Option<String>,
}

struct ResultSet {
    items: indexmap::IndexMap<(&'static str, i32), SearchResultItem>,
}

impl ResultSet {
    fn new() -> Self {
        Self {
            items: indexmap::IndexMap::new(),
        }
    }

    fn add(&mut self, kind: &'static str, id: i32, score: i64, build: impl FnOnce() -> SearchResultItem) {
        match self.items.get_mut(&(kind, id)) {
            Some(existing) => existing.score *= score,
            None => {
                self.items.insert((kind, id), build());
            }
        }
    }

    fn finish(self) -> Vec<SearchResultItem> {
        let mut results: Vec<SearchResultItem> = self.items.into_values().collect();
        results.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.header.cmp(&b.header)));
        results.truncate(MAX_RESULTS);
        results
    }
}

/// Run the full search for a whitespace-separated pattern.
pub async fn search_all(pool: &PgPool, pattern: &str) -> ApiResult<Vec<SearchResultItem>> {
    let mut results = ResultSet::new();
    for word in pattern.split_whitespace() {
        let word = word.to_lowercase();
        let like = format!("%{word}%");
        search_people(pool, &mut results, &word, &like).await?;
        search_works(pool, &mut results, &word, &like).await?;
        search_stories(pool, &mut results, &word, &like).await?;
        search_articles(pool, &mut results, &word, &like).await?;
        search_publishers(pool, &mut results, &word, &like).await?;
    }
    Ok(results.finish())
}

async fn search_people(
    pool: &PgPool,
    results: &mut ResultSet,
    word: &str,
    like: &str,
) -> ApiResult<()> {
    let hits: Vec<PersonHit> = sqlx::query_as(
        "SELECT p.id, p.name, p.alt_name, p.fullname, p.dob, p.dod, p.bio, \
                c.name AS nationality_name \
         FROM person p \
         LEFT JOIN country c ON c.id = p.nationality_id \
         WHERE p.name ILIKE $1 OR p.fullname ILIKE $1 OR p.other_names ILIKE $1 \
            OR p.alt_name ILIKE $1 OR p.bio ILIKE $1 \
         ORDER BY p.name",
    )
    .bind(like)
    .fetch_all(pool)
    .await?;
    for hit in hits {
        let score = score_hit(
            &[
                hit.fullname.as_deref(),
                Some(&hit.name),
                hit.alt_name.as_deref(),
            ],
            word,
            PERSON_NAME,
            PERSON_OTHER,
        );
        results.add("person", hit.id, score, || {
            let description = highlight(
                &person_description(
                    hit.nationality_name.as_deref(),
                    hit.dob,
                    hit.dod,
                    hit.bio.as_deref(),
                ),
                word,
            );
            SearchResultItem {
                id: hit.id,
                img: String::new(),
                header: hit.name.clone(),
                description,
                author: String::new(),
                result_type: "person",
                score,
            }
        });
    }
    Ok(())
}

async fn search_works(
    pool: &PgPool,
    results: &mut ResultSet,
    word: &str,
    like: &str,
) -> ApiResult<()> {
    let hits: Vec<WorkHit> = sqlx::query_as(
        "SELECT w.id, w.title, w.description, w.author_str \
         FROM work w \
         WHERE w.title ILIKE $1 OR w.subtitle ILIKE $1 OR w.orig_title ILIKE $1 \
            OR w.misc ILIKE $1 OR w.description ILIKE $1 \
         ORDER BY w.title",
    )
    .bind(like)
    .fetch_all(pool)
    .await?;
    for hit in hits {
        let score = score_hit(&[Some(&hit.title)], word, WORK_TITLE, WORK_OTHER);
        results.add("work", hit.id, score, || SearchResultItem {
            id: hit.id,
            img: String::new(),
            header: hit.title.clone(),
            description: highlight(hit.description.as_deref().unwrap_or(""), word),
            author: hit.author_str.clone().unwrap_or_default(),
            result_type: "work",
            score,
        });
    }
    Ok(())
}

async fn search_stories(
    pool: &PgPool,
    results: &mut ResultSet,
    word: &str,
    like: &str,
) -> ApiResult<()> {
    let hits: Vec<StoryHit> = sqlx::query_as(
        "SELECT s.id, s.title, \
                (SELECT string_agg(p.name, ', ') \
                 FROM storycontributor sc \
                 JOIN person p ON p.id = sc.person_id \
                 WHERE sc.shortstory_id = s.id AND sc.role_id = 1) AS authors \
         FROM shortstory s \
         WHERE s.title ILIKE $1 \
         ORDER BY s.title",
    )
    .bind(like)
    .fetch_all(pool)
    .await?;
    for hit in hits {
        let score = score_hit(&[Some(&hit.title)], word, STORY_NAME, STORY_OTHER);
        results.add("story", hit.id, score, || SearchResultItem {
            id: hit.id,
            img: String::new(),
            header: hit.title.clone(),
            description: String::new(),
            author: hit.authors.clone().unwrap_or_default(),
            result_type: "story",
            score,
        });
    }
    Ok(())
}

async fn search_articles(
    pool: &PgPool,
    results: &mut ResultSet,
    word: &str,
    like: &str,
) -> ApiResult<()> {
    let hits: Vec<ArticleHit> = sqlx::query_as(
        "SELECT a.id, a.title, a.excerpt FROM article a \
         WHERE a.title ILIKE $1 OR a.excerpt ILIKE $1 \
         ORDER BY a.title",
    )
    .bind(like)
    .fetch_all(pool)
    .await?;
    for hit in hits {
        let score = score_hit(&[Some(&hit.title)], word, ARTICLE_TITLE, ARTICLE_OTHER);
        results.add("article", hit.id, score, || SearchResultItem {
            id: hit.id,
            img: String::new(),
            header: hit.title.clone(),
            description: highlight(hit.excerpt.as_deref().unwrap_or(""), word),
            author: String::new(),
            result_type: "article",
            score,
        });
    }
    Ok(())
}

async fn search_publishers(
    pool: &PgPool,
    results: &mut ResultSet,
    word: &str,
    like: &str,
) -> ApiResult<()> {
    let hits: Vec<PublisherHit> = sqlx::query_as(
        "SELECT pub.id, pub.name, pub.fullname, pub.description FROM publisher pub \
         WHERE pub.name ILIKE $1 OR pub.fullname ILIKE $1 OR pub.description ILIKE $1 \
         ORDER BY pub.name",
    )
    .bind(like)
    .fetch_all(pool)
    .await?;
    for hit in hits {
        let score = score_hit(
            &[Some(&hit.name), hit.fullname.as_deref()],
            word,
            PUBLISHER_NAME,
            PUBLISHER_OTHER,
        );
        results.add("publisher", hit.id, score, || SearchResultItem {
            id: hit.id,
            img: String::new(),
            header: hit.name.clone(),
            description: highlight(hit.description.as_deref().unwrap_or(""), word),
            author: String::new(),
            result_type: "publisher",
            score,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_hit_beats_other() {
        assert_eq!(
            score_hit(&[Some("Foundation")], "foundation", WORK_TITLE, WORK_OTHER),
            WORK_TITLE + STARTS_WITH
        );
        assert_eq!(
            score_hit(&[Some("The Foundation")], "foundation", WORK_TITLE, WORK_OTHER),
            WORK_TITLE
        );
        assert_eq!(
            score_hit(&[Some("Dune")], "foundation", WORK_TITLE, WORK_OTHER),
            WORK_OTHER
        );
    }

    #[test]
    fn person_name_score_outranks_work_title() {
        let person = score_hit(&[Some("Foundation Fan")], "foundation", PERSON_NAME, PERSON_OTHER);
        let work = score_hit(&[Some("Foundation")], "foundation", WORK_TITLE, WORK_OTHER);
        assert!(person + STARTS_WITH >= work);
        assert!(PERSON_NAME > WORK_TITLE);
    }

    #[test]
    fn compounding_is_multiplicative() {
        let mut results = ResultSet::new();
        results.add("work", 1, 19, || SearchResultItem {
            id: 1,
            img: String::new(),
            header: "x".into(),
            description: String::new(),
            author: String::new(),
            result_type: "work",
            score: 19,
        });
        results.add("work", 1, 9, || unreachable!());
        let out = results.finish();
        assert_eq!(out[0].score, 19 * 9);
    }

    #[test]
    fn highlight_wraps_first_match() {
        assert_eq!(highlight("The Foundation saga", "foundation"), "The <b>Foundation</b> saga");
        assert_eq!(highlight("no match", "foundation"), "no match");
    }

    #[test]
    fn person_description_elides_missing_parts() {
        assert_eq!(
            person_description(Some("Suomi"), Some(1920), Some(1995), None),
            "Suomi (1920-1995)<br />"
        );
        assert_eq!(
            person_description(None, Some(1920), None, None),
            " (1920-)<br />"
        );
        assert_eq!(person_description(None, None, None, None), "");
        assert_eq!(
            person_description(None, None, None, Some("bio text")),
            "bio text"
        );
    }
}
