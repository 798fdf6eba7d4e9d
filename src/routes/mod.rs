pub mod tags;

use actix_web::web;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/tags").configure(tags::create_routes));
}
