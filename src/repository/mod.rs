//! Repository layer for database operations

pub mod awards;
pub mod editions;
pub mod logs;
pub mod magazines;
pub mod people;
pub mod publishers;
pub mod refs;
pub mod shorts;
pub mod tags;
pub mod users;
pub mod works;

use serde::Serialize;
use sqlx::{Pool, Postgres};

use crate::error::ApiResult;

/// Catalog-wide totals shown on the front page. Short stories only
/// count the actual story types, not interviews or other extras.
#[derive(Debug, Clone, Serialize)]
pub struct FrontpageCounts {
    pub works: i64,
    pub editions: i64,
    pub shorts: i64,
    pub magazines: i64,
    pub covers: i64,
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub works: works::WorksRepository,
    pub editions: editions::EditionsRepository,
    pub people: people::PeopleRepository,
    pub shorts: shorts::ShortsRepository,
    pub magazines: magazines::MagazinesRepository,
    pub publishers: publishers::PublishersRepository,
    pub tags: tags::TagsRepository,
    pub awards: awards::AwardsRepository,
    pub users: users::UsersRepository,
    pub logs: logs::LogsRepository,
    pub refs: refs::RefsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            works: works::WorksRepository::new(pool.clone()),
            editions: editions::EditionsRepository::new(pool.clone()),
            people: people::PeopleRepository::new(pool.clone()),
            shorts: shorts::ShortsRepository::new(pool.clone()),
            magazines: magazines::MagazinesRepository::new(pool.clone()),
            publishers: publishers::PublishersRepository::new(pool.clone()),
            tags: tags::TagsRepository::new(pool.clone()),
            awards: awards::AwardsRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            logs: logs::LogsRepository::new(pool.clone()),
            refs: refs::RefsRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn frontpage_counts(&self) -> ApiResult<FrontpageCounts> {
        let (works,): (i64,) = sqlx::query_as("SELECT count(*) FROM work")
            .fetch_one(&self.pool)
            .await?;
        let (editions,): (i64,) = sqlx::query_as("SELECT count(*) FROM edition")
            .fetch_one(&self.pool)
            .await?;
        let (shorts,): (i64,) =
            sqlx::query_as("SELECT count(*) FROM shortstory WHERE story_type IN (1, 2, 3)")
                .fetch_one(&self.pool)
                .await?;
        let (magazines,): (i64,) = sqlx::query_as("SELECT count(*) FROM magazine")
            .fetch_one(&self.pool)
            .await?;
        let (covers,): (i64,) = sqlx::query_as("SELECT count(*) FROM editionimage")
            .fetch_one(&self.pool)
            .await?;
        Ok(FrontpageCounts {
            works,
            editions,
            shorts,
            magazines,
            covers,
        })
    }
}
