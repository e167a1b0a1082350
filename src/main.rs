use actix_files as fs;
use actix_web::{web::Data, App, HttpServer};
use anyhow::Context as _;
use dotenv::dotenv;
use log::{error, info, warn};
use tera::Tera;

use careerpath_server::auth::AuthClient;
use careerpath_server::config::Settings;
use careerpath_server::provider::UpstreamClient;
use careerpath_server::web::routes;
use careerpath_server::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::from_env();
    info!(
        "Starting CareerPath server on {}:{}",
        settings.bind_addr, settings.port
    );
    if settings.provider.api_key.is_none() {
        warn!("No API key configured; chat requests will report a configuration error");
    }
    if settings.auth.api_key.is_none() || settings.auth.project_id.is_none() {
        warn!("Identity backend not configured; sign-up is disabled");
    }

    let upstream = Data::new(UpstreamClient::new(settings.provider.clone()));
    let auth = Data::new(AuthClient::new(settings.auth.clone()));

    // Initialize template engine
    let mut tera = match Tera::new(&settings.template_glob) {
        Ok(t) => t,
        Err(e) => {
            error!("Template parsing error: {}", e);
            std::process::exit(1);
        }
    };
    tera.autoescape_on(vec![".html"]);

    // Create app state
    let app_state = Data::new(AppState {
        tera,
        settings: settings.clone(),
        upstream: upstream.clone(),
        auth: auth.clone(),
    });

    let static_dir = settings.static_dir.clone();

    // Start web server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
            .service(fs::Files::new("/static", static_dir.clone()))
    })
    .bind((settings.bind_addr.as_str(), settings.port))
    .with_context(|| format!("failed to bind {}:{}", settings.bind_addr, settings.port))?
    .run()
    .await
    .context("server terminated with an error")
}
