mod config;
mod delivery;
mod domain;
mod repository;
mod telemetry;
mod usecase;

use std::sync::Arc;

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::delivery::http::v1::middleware::identity_middleware;
use crate::delivery::http::v1::photos::list_entity_photos;
use crate::delivery::http::v1::reviews::{
    create_review, delete_review, list_reviews, toggle_helpful, update_review,
};
use crate::repository::postgres::{
    create_pool, PostgresPhotoRepository, PostgresReviewRepository, PostgresVoteRepository,
};
use crate::usecase::enrichment::EnrichmentBatcher;
use crate::usecase::feed::FeedUseCase;
use crate::usecase::jwt::JwtService;
use crate::usecase::reviews::ReviewsUseCase;
use crate::usecase::votes::VotesUseCase;

pub struct AppState {
    pub feed_usecase:
        FeedUseCase<PostgresReviewRepository, PostgresVoteRepository, PostgresPhotoRepository>,
    pub reviews_usecase: ReviewsUseCase<PostgresReviewRepository>,
    pub votes_usecase: VotesUseCase<PostgresVoteRepository, PostgresReviewRepository>,
    pub jwt_service: JwtService,
    pub metrics_handle: PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::AppConfig::from_env();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Initialize tracing subscriber with optional OpenTelemetry layer
    if config.telemetry_enabled {
        let telemetry_config = telemetry::TelemetryConfig {
            service_name: config.telemetry_service_name.clone(),
            service_version: config.telemetry_service_version.clone(),
            environment: config.telemetry_environment.clone(),
            otlp_endpoint: config.telemetry_otlp_endpoint.clone(),
        };

        telemetry::init_telemetry_with_subscriber(&telemetry_config, env_filter)
            .expect("failed to initialize telemetry");
    } else {
        telemetry::init_subscriber_without_telemetry(env_filter);
    }

    tracing::info!("starting the place reviews service");

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");
    metrics_process::Collector::default().describe();
    tracing::info!("prometheus metrics initialized");

    tracing::info!("config loaded, telemetry_enabled={}", config.telemetry_enabled);

    let pool = create_pool(&config.database_url, config.database_max_connections)
        .await
        .expect("failed to create database pool");
    tracing::info!("database pool created");

    sqlx::migrate!().run(&pool).await?;
    tracing::info!("database migrations applied");

    let jwt_service = JwtService::new(config.jwt_secret);

    let batcher = EnrichmentBatcher::new(
        PostgresReviewRepository::new(pool.clone()),
        PostgresVoteRepository::new(pool.clone()),
        PostgresPhotoRepository::new(pool.clone()),
    );
    let feed_usecase = FeedUseCase::new(PostgresReviewRepository::new(pool.clone()), batcher);
    let reviews_usecase = ReviewsUseCase::new(PostgresReviewRepository::new(pool.clone()));
    let votes_usecase = VotesUseCase::new(
        PostgresVoteRepository::new(pool.clone()),
        PostgresReviewRepository::new(pool),
    );

    let shared_state = Arc::new(AppState {
        feed_usecase,
        reviews_usecase,
        votes_usecase,
        jwt_service,
        metrics_handle,
    });

    // Identity is resolved for every API route; the handlers decide which
    // operations require an authenticated or guest identity.
    let reviews_api = Router::new()
        .route("/api/v1/reviews", get(list_reviews).post(create_review))
        .route(
            "/api/v1/reviews/{id}",
            axum::routing::patch(update_review).delete(delete_review),
        )
        .route("/api/v1/reviews/{id}/helpful", post(toggle_helpful))
        .route("/api/v1/entities/photos", get(list_entity_photos))
        .layer(middleware::from_fn_with_state(
            shared_state.clone(),
            identity_middleware,
        ));

    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .merge(reviews_api)
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!("place reviews service running on 0.0.0.0:8080");
    axum::serve(listener, router).await?;

    // Shutdown telemetry on exit
    if config.telemetry_enabled {
        telemetry::shutdown_telemetry();
    }

    Ok(())
}

async fn metrics(State(state): State<Arc<AppState>>) -> String {
    metrics_process::Collector::default().collect();
    state.metrics_handle.render()
}

#[tracing::instrument]
async fn healthz() -> &'static str {
    "OK"
}
