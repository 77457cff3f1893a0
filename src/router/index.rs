use crate::reset::index::reset_routes;
use actix_web::web;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(reset_routes);
}
