use super::controller::{forgot_password, reset_password};
use actix_web::web;

pub fn reset_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth/password")
            .route("/forgot", web::post().to(forgot_password))
            .route("/reset", web::post().to(reset_password)),
    );
}
