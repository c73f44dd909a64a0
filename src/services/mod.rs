//! Business logic services.

pub mod audit;
pub mod contributors;
pub mod editions;
pub mod filters;
pub mod magazines;
pub mod people;
pub mod publishers;
pub mod search;
pub mod shorts;
pub mod stats;
pub mod users;
pub mod works;

use crate::config::{AuthConfig, ImageConfig};
use crate::repository::Repository;

/// Container for all services. Read paths go straight to the
/// repository; mutations go through the per-entity services.
#[derive(Clone)]
pub struct Services {
    pub repo: Repository,
    pub works: works::WorksService,
    pub editions: editions::EditionsService,
    pub people: people::PeopleService,
    pub shorts: shorts::ShortsService,
    pub magazines: magazines::MagazinesService,
    pub publishers: publishers::PublishersService,
    pub users: users::UsersService,
    pub stats: stats::StatsService,
}

impl Services {
    pub fn new(repo: Repository, auth_config: AuthConfig, images: ImageConfig) -> Self {
        Self {
            works: works::WorksService::new(repo.clone()),
            editions: editions::EditionsService::new(repo.clone(), images.cover_dir),
            people: people::PeopleService::new(repo.clone()),
            shorts: shorts::ShortsService::new(repo.clone()),
            magazines: magazines::MagazinesService::new(repo.clone()),
            publishers: publishers::PublishersService::new(repo.clone()),
            users: users::UsersService::new(repo.clone(), auth_config),
            stats: stats::StatsService::new(repo.pool.clone()),
            repo,
        }
    }
}
