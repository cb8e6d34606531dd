use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vibesync_api::db::{create_pool, run_migrations};
use vibesync_api::routes::configure_routes;
use vibesync_api::security::jwt;
use vibesync_api::services::{
    admin_seed, EmailService, StorageService, SubscriptionService, TierService,
};
use vibesync_api::Config;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");

    tracing::info!("Starting vibesync-api v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    jwt::initialize_secret(&config.jwt.secret, config.jwt.ttl_days)
        .expect("Failed to initialize JWT keys");

    let pool = create_pool(&config.database.url, config.database.max_connections)
        .await
        .expect("Failed to connect to database");

    let run_migrations_on_start = std::env::var("RUN_MIGRATIONS")
        .map(|v| v != "false")
        .unwrap_or(!config.is_production());
    if run_migrations_on_start {
        tracing::info!("Running database migrations");
        run_migrations(&pool).await.expect("Migrations failed");
    }

    if config.admin_seed.on_startup {
        match admin_seed::ensure_admin(&pool, &config.admin_seed).await {
            Ok(admin_seed::SeedOutcome::Created(user)) => {
                tracing::info!(email = %user.email, "admin account created")
            }
            Ok(admin_seed::SeedOutcome::Promoted(user)) => {
                tracing::info!(email = %user.email, "existing account promoted to admin")
            }
            Ok(admin_seed::SeedOutcome::AlreadyAdmin(_)) => {}
            Err(e) => tracing::error!(error = %e, "admin seeding failed"),
        }
    }

    let storage = StorageService::from_config(&config.storage).await;
    let email_service = EmailService::new(config.smtp.clone());
    let subscriptions = SubscriptionService::new(pool.clone());
    let tiers = TierService::new(pool.clone());

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let server_config = config.clone();

    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in server_config.cors.allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors
            .allow_any_method()
            .allow_any_header()
            .max_age(server_config.cors.max_age as usize);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(email_service.clone()))
            .app_data(web::Data::new(subscriptions.clone()))
            .app_data(web::Data::new(tiers.clone()))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
