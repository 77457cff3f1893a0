use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde_json::json;

// Fallback for unmatched routes; handler-level 404s keep their own bodies.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "success": false,
        "message": "Route does not exist",
        "httpStatusCode": StatusCode::NOT_FOUND.as_u16(),
        "error": "NOT_FOUND_ERROR",
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
    }))
}
