use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, web};
use dotenv::dotenv;
use env_logger::Env;
use log::{info, warn};
use serde_json::json;

mod database;
mod identity;
mod middleware;
mod reset;
mod router;
mod utils;

use database::{RedisService, connect_to_redis};
use identity::service::MongoUserDirectory;
use middleware::not_found::not_found;
use reset::service::PasswordResetService;
use reset::store::MongoOtpStore;
use router::index::routes;
use utils::email::EmailNotifier;

#[get("/")]
async fn default() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Welcome to the password reset service",
        "httpStatusCode": StatusCode::OK.as_u16(),
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logger with environment variable support
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting server on http://localhost:8000");

    let mongo_client = database::connect_to_mongo()
        .await
        .expect("Failed to connect to MongoDB");

    // Rate limiting is optional; without Redis the OTP request path fails open
    let limiter: Option<RedisService> = match connect_to_redis().await {
        Ok(redis_client) => Some(RedisService::new(&redis_client)),
        Err(e) => {
            warn!("Redis unavailable, OTP rate limiting disabled: {}", e);
            None
        }
    };

    let reset_service = web::Data::new(PasswordResetService::new(
        Arc::new(MongoOtpStore::new(&mongo_client)),
        Arc::new(MongoUserDirectory::new(&mongo_client)),
        Arc::new(EmailNotifier),
        limiter,
    ));

    // Start the HTTP server
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Logger::new("%a %{User-Agent}i"))
            .app_data(reset_service.clone())
            .service(default)
            .configure(routes)
            .default_service(web::route().to(not_found))
    })
    .bind(("localhost", 8000))?
    .run()
    .await?;

    info!("Server has stopped");

    Ok(())
}
