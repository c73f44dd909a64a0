//! SuomiSF Server - Finnish speculative fiction bibliography
//!
//! JSON REST API over the SuomiSF catalog database.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use suomisf_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("suomisf_server={},tower_http=debug", config.logging.level).into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting SuomiSF Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, config.auth.clone(), config.images.clone());

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Authentication
        .route("/login", post(api::auth::login))
        .route("/register", post(api::auth::register))
        .route("/refresh", post(api::auth::refresh))
        // Users
        .route("/users", get(api::users::list))
        .route("/users/:id", get(api::users::get))
        // Works
        .route("/works", post(api::works::create).put(api::works::update))
        .route(
            "/works/:id",
            get(api::works::get).delete(api::works::delete),
        )
        .route("/works/:id/awarded", get(api::works::awards))
        .route("/works/:id/awards", get(api::works::awards))
        .route("/works/:id/changes", get(api::works::changes))
        .route(
            "/works/:id/tags/:tag_id",
            put(api::works::add_tag).delete(api::works::remove_tag),
        )
        .route(
            "/works/shorts",
            post(api::works::save_shorts).put(api::works::save_shorts),
        )
        .route("/works/shorts/:id", get(api::works::shorts))
        .route("/worksbyinitial/:letter", get(api::works::by_initial))
        // Editions
        .route(
            "/editions",
            post(api::editions::create).put(api::editions::update),
        )
        .route(
            "/editions/:id",
            get(api::editions::get).delete(api::editions::delete),
        )
        .route("/editions/:id/copy", post(api::editions::copy))
        .route("/editions/:id/changes", get(api::editions::changes))
        .route("/editions/:id/shorts", get(api::editions::shorts))
        .route("/editions/shorts", put(api::editions::save_shorts))
        .route("/editions/:id/images", post(api::editions::add_image))
        .route(
            "/editions/:id/images/:image_id",
            delete(api::editions::remove_image),
        )
        .route("/editions/:id/owners", get(api::editions::owners))
        .route(
            "/editions/owner",
            post(api::editions::set_owner).put(api::editions::set_owner),
        )
        .route(
            "/editions/:id/owner/:user_id",
            get(api::editions::owner_info).delete(api::editions::remove_owner),
        )
        .route(
            "/editions/wishlist/:user_id",
            get(api::editions::user_wishlist),
        )
        .route("/editions/owned/:user_id", get(api::editions::owned_by))
        .route("/editions/:id/wishlist", get(api::editions::wishlist))
        .route(
            "/editions/:id/wishlist/:user_id",
            get(api::editions::wishlist_contains)
                .put(api::editions::add_to_wishlist)
                .delete(api::editions::remove_from_wishlist),
        )
        // People
        .route("/people/", get(api::people::list))
        .route(
            "/people",
            post(api::people::create).put(api::people::update),
        )
        .route(
            "/people/:id",
            get(api::people::get).delete(api::people::delete),
        )
        .route("/people/:id/awarded", get(api::people::awarded))
        .route("/people/:id/shorts", get(api::people::shorts))
        .route("/people/:id/chiefeditor", get(api::people::chief_editor))
        .route("/people/:id/changes", get(api::people::changes))
        .route(
            "/person/:id/tags/:tag_id",
            put(api::people::add_tag).delete(api::people::remove_tag),
        )
        // Short stories
        .route(
            "/shorts",
            post(api::shorts::create).put(api::shorts::update),
        )
        .route(
            "/shorts/:id",
            get(api::shorts::get).delete(api::shorts::delete),
        )
        .route("/shorts/:id/awarded", get(api::shorts::awarded))
        .route("/shorts/:id/changes", get(api::shorts::changes))
        .route(
            "/story/:id/tags/:tag_id",
            put(api::shorts::add_tag).delete(api::shorts::remove_tag),
        )
        // Magazines, issues and articles
        .route("/magazines", get(api::magazines::list))
        .route(
            "/magazines/:id",
            get(api::magazines::get).patch(api::magazines::update),
        )
        .route(
            "/issues",
            post(api::magazines::create_issue).put(api::magazines::update_issue),
        )
        .route(
            "/issues/:id",
            get(api::magazines::get_issue).delete(api::magazines::delete_issue),
        )
        .route("/issues/:id/shorts", get(api::magazines::issue_shorts))
        .route("/issues/shorts", put(api::magazines::save_issue_shorts))
        .route("/issues/:id/articles", get(api::magazines::issue_articles))
        .route(
            "/issues/:id/tags/:tag_id",
            put(api::magazines::add_issue_tag).delete(api::magazines::remove_issue_tag),
        )
        .route(
            "/issues/:id/images",
            post(api::magazines::set_issue_image).delete(api::magazines::remove_issue_image),
        )
        .route("/articles/:id", get(api::magazines::get_article))
        .route(
            "/articles/:id/tags/:tag_id",
            put(api::magazines::add_article_tag).delete(api::magazines::remove_article_tag),
        )
        // Publishers and series
        .route(
            "/publishers",
            get(api::publishers::list)
                .post(api::publishers::create)
                .put(api::publishers::update),
        )
        .route(
            "/publishers/:id",
            get(api::publishers::get).delete(api::publishers::delete),
        )
        .route(
            "/bookseries",
            get(api::publishers::list_bookseries)
                .post(api::publishers::create_bookseries)
                .put(api::publishers::update_bookseries),
        )
        .route(
            "/bookseries/:id",
            get(api::publishers::get_bookseries).delete(api::publishers::delete_bookseries),
        )
        .route(
            "/pubseries",
            get(api::publishers::list_pubseries)
                .post(api::publishers::create_pubseries)
                .put(api::publishers::update_pubseries),
        )
        .route(
            "/pubseries/:id",
            get(api::publishers::get_pubseries).delete(api::publishers::delete_pubseries),
        )
        // Tags
        .route(
            "/tags",
            get(api::tags::list).post(api::tags::create).put(api::tags::update),
        )
        .route("/tags/types", get(api::tags::types))
        .route(
            "/tags/:id",
            get(api::tags::get).delete(api::tags::delete),
        )
        .route("/tags/:source/merge/:target", post(api::tags::merge))
        // Awards
        .route("/awards", get(api::awards::list))
        .route("/awards/:id", get(api::awards::get))
        .route("/awards/:id/winners", get(api::awards::winners))
        .route(
            "/awards/categories/person",
            get(api::awards::person_categories),
        )
        .route("/awards/categories/work", get(api::awards::work_categories))
        .route(
            "/awards/categories/story",
            get(api::awards::story_categories),
        )
        // Change log
        .route("/changes", get(api::changes::list))
        .route("/changes/:id", delete(api::changes::delete))
        // Latest additions
        .route("/latest/works/:count", get(api::works::latest))
        .route("/latest/editions/:count", get(api::editions::latest))
        .route("/latest/covers/:count", get(api::editions::latest_covers))
        .route("/latest/shorts/:count", get(api::shorts::latest))
        .route("/latest/people/:count", get(api::people::latest))
        // Search
        .route("/search/:pattern", get(api::search::all))
        .route("/searchworks", post(api::search::works))
        .route("/searchshorts", post(api::search::shorts))
        // Statistics
        .route("/stats/genrecounts", get(api::stats::genre_counts))
        .route("/stats/authorcounts", get(api::stats::author_counts))
        .route(
            "/stats/storypersoncounts",
            get(api::stats::story_person_counts),
        )
        .route("/stats/publishercounts", get(api::stats::publisher_counts))
        .route("/stats/worksbyyear", get(api::stats::works_by_year))
        .route(
            "/stats/origworksbyyear",
            get(api::stats::orig_works_by_year),
        )
        .route("/stats/storiesbyyear", get(api::stats::stories_by_year))
        .route("/stats/issuesperyear", get(api::stats::issues_per_year))
        .route(
            "/stats/nationalitycounts",
            get(api::stats::nationality_counts),
        )
        .route(
            "/stats/storynationalitycounts",
            get(api::stats::story_nationality_counts),
        )
        .route("/stats/misc", get(api::stats::misc))
        // Reference data
        .route("/genres", get(api::misc::genres))
        .route("/countries", get(api::misc::countries))
        .route("/languages", get(api::misc::languages))
        .route("/roles/", get(api::misc::roles))
        .route("/roles/:target", get(api::misc::roles_for_target))
        .route("/worktypes", get(api::misc::work_types))
        .route("/shorttypes", get(api::misc::story_types))
        .route("/bindings", get(api::misc::bindings))
        .route("/formats", get(api::misc::formats))
        .route("/publicationsizes", get(api::misc::publication_sizes))
        .route("/magazinetypes", get(api::misc::magazine_types))
        // Quick filters
        .route("/filter/people/:pattern", get(api::misc::filter_people))
        .route("/filter/works/:pattern", get(api::misc::filter_works))
        .route(
            "/filter/publishers/:pattern",
            get(api::misc::filter_publishers),
        )
        .route(
            "/filter/bookseries/:pattern",
            get(api::misc::filter_bookseries),
        )
        .route(
            "/filter/pubseries/:pattern",
            get(api::misc::filter_pubseries),
        )
        .route("/filter/tags/:pattern", get(api::misc::filter_tags))
        .route(
            "/filter/countries/:pattern",
            get(api::misc::filter_countries),
        )
        .route(
            "/filter/languages/:pattern",
            get(api::misc::filter_languages),
        )
        // Front page
        .route("/frontpagedata", get(api::misc::frontpage))
        .route("/firstlettervector/:target", get(api::misc::first_letters))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
