pub mod auth;
pub mod config;
pub mod provider;
pub mod web;

use actix_web::web::Data;
use tera::Tera;

use auth::AuthClient;
use config::Settings;
use provider::UpstreamClient;

// App state structure
pub struct AppState {
    pub tera: Tera,
    pub settings: Settings,
    pub upstream: Data<UpstreamClient>,
    pub auth: Data<AuthClient>,
}
