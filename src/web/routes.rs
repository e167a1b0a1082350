use actix_web::web;
use crate::web::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/chat", web::post().to(handlers::chat))
            .route("/signup", web::post().to(handlers::signup))
            .route("/debug", web::get().to(handlers::debug_info))
            .route("/test", web::get().to(handlers::test))
            .route("/test-openai", web::get().to(handlers::test_upstream)),
    )
    .route("/", web::get().to(handlers::index))
    .route("/signup", web::get().to(handlers::signup_page))
    .route("/health", web::get().to(handlers::health_check));
}
