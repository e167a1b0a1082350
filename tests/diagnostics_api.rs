use actix_web::{test, web::Data, App};
use httpmock::prelude::*;
use serde_json::{json, Value};
use tera::Tera;

use careerpath_server::auth::AuthClient;
use careerpath_server::config::{AuthSettings, ProviderKind, ProviderSettings, Settings};
use careerpath_server::provider::UpstreamClient;
use careerpath_server::web::routes;
use careerpath_server::AppState;

fn app_state(api_base: &str, api_key: Option<&str>) -> Data<AppState> {
    let provider = ProviderSettings {
        kind: ProviderKind::OpenAi,
        api_key: api_key.map(str::to_string),
        api_base: api_base.to_string(),
        model: "gpt-3.5-turbo".to_string(),
        system_prompt: "You are a helpful AI career advisor.".to_string(),
        max_tokens: 300,
    };
    let auth = AuthSettings {
        api_base: "http://localhost:9".to_string(),
        firestore_base: "http://localhost:9".to_string(),
        api_key: None,
        project_id: None,
    };
    let settings = Settings {
        bind_addr: "127.0.0.1".to_string(),
        port: 0,
        static_dir: "./static".to_string(),
        template_glob: "templates/**/*".to_string(),
        provider: provider.clone(),
        auth: auth.clone(),
    };
    Data::new(AppState {
        tera: Tera::default(),
        settings,
        upstream: Data::new(UpstreamClient::new(provider)),
        auth: Data::new(AuthClient::new(auth)),
    })
}

async fn get_json(state: Data<AppState>, uri: &str) -> Value {
    let app = test::init_service(App::new().app_data(state).configure(routes::configure)).await;
    let req = test::TestRequest::get().uri(uri).to_request();
    test::call_and_read_body_json(&app, req).await
}

#[actix_web::test]
async fn debug_reports_key_presence_without_leaking_it() {
    let body = get_json(
        app_state("http://localhost:9", Some("sk-test-1234567890")),
        "/api/debug",
    )
    .await;

    assert_eq!(body["status"], "Server running");
    assert_eq!(body["has_api_key"], true);
    assert_eq!(body["api_key_length"], 18);
    assert_eq!(body["api_key_prefix"], "sk-test...");
    assert_eq!(body["provider"], "openai");
    assert!(body["timestamp"].as_str().is_some());
    // The full key never appears anywhere in the payload
    assert!(!body.to_string().contains("sk-test-1234567890"));
}

#[actix_web::test]
async fn debug_reports_missing_key() {
    let body = get_json(app_state("http://localhost:9", None), "/api/debug").await;

    assert_eq!(body["has_api_key"], false);
    assert_eq!(body["api_key_length"], 0);
    assert_eq!(body["api_key_prefix"], "not found");
}

#[actix_web::test]
async fn test_endpoint_answers_without_upstream_traffic() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(json!({ "choices": [] }));
    });

    let body = get_json(app_state(&server.base_url(), Some("test-key")), "/api/test").await;

    assert_eq!(body["message"], "API working!");
    assert!(body["time"].as_str().is_some());
    assert_eq!(mock.hits(), 0);
}

#[actix_web::test]
async fn upstream_probe_reports_success() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(json!({
            "choices": [{"message": {"role": "assistant", "content": "pong"}}]
        }));
    });

    let body = get_json(
        app_state(&server.base_url(), Some("test-key")),
        "/api/test-openai",
    )
    .await;

    assert_eq!(body["ok"], true);
    assert_eq!(body["reply"], "pong");
    mock.assert();
}

#[actix_web::test]
async fn upstream_probe_reports_failure_flat() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(500).body("boom");
    });

    let body = get_json(
        app_state(&server.base_url(), Some("test-key")),
        "/api/test-openai",
    )
    .await;

    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("server error (500)"));
}

#[actix_web::test]
async fn health_answers_ok() {
    let body = get_json(app_state("http://localhost:9", None), "/health").await;
    assert_eq!(body["status"], "ok");
}
