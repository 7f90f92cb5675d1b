use anyhow::Context;
use storage::{Database, models::PointsTable};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod middleware;
mod routes;
mod state;

use config::Config;
use features::ranking::handlers;
use middleware::auth::JwtVerifier;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_ranking,
        handlers::get_my_stats,
        handlers::get_member_stats,
        handlers::get_points_table,
    ),
    components(
        schemas(
            storage::dto::ranking::RankingEntry,
            storage::dto::ranking::RankingEvent,
            storage::dto::ranking::MemberStats,
            storage::dto::ranking::TypeBreakdown,
            storage::dto::ranking::PointsTableResponse,
            storage::dto::ranking::PointsTableEntry,
            storage::dto::ranking::MedalTier,
            storage::models::EventType,
        )
    ),
    tags(
        (name = "rankings", description = "Event attendance ranking endpoints"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting member ranking API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let points = PointsTable::standard();
    tracing::info!("Using points table version {}", points.version());

    let state = AppState::new(
        db,
        points,
        JwtVerifier::new(config.jwt_secret.as_bytes()),
        config.recent_events_limit,
    );

    let app = routes::router(state.clone(), config.cors_allowed_origin.as_deref())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state);

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    axum::serve(listener, app).await?;

    Ok(())
}
