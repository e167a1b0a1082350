use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use log::{error, info};
use serde_json::json;
use std::env;
use tera::Context;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::web::models::{ChatRequest, ChatResponse, SignupRequest};
use crate::AppState;

/// Sent back without touching the upstream when the message is empty.
const EMPTY_MESSAGE_REPLY: &str = "Please enter a message so I can help.";

// Index page handler
pub async fn index(data: web::Data<AppState>) -> impl Responder {
    let mut context = Context::new();
    context.insert("model", &data.settings.provider.model);
    context.insert("provider", data.settings.provider.kind.label());
    match data.tera.render("index.html", &context) {
        Ok(html) => HttpResponse::Ok().content_type("text/html").body(html),
        Err(e) => {
            error!("Template error: {}", e);
            HttpResponse::InternalServerError().body("Template error")
        }
    }
}

// Sign-up page handler
pub async fn signup_page(data: web::Data<AppState>) -> impl Responder {
    match data.tera.render("signup.html", &Context::new()) {
        Ok(html) => HttpResponse::Ok().content_type("text/html").body(html),
        Err(e) => {
            error!("Template error: {}", e);
            HttpResponse::InternalServerError().body("Template error")
        }
    }
}

// Health check endpoint
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// Chat API endpoint. Every outcome is a 200 with a flat { reply } body;
// failures ride along as human-readable strings.
pub async fn chat(data: web::Data<AppState>, req: web::Json<ChatRequest>) -> impl Responder {
    let message = req.message.trim();
    if message.is_empty() {
        return HttpResponse::Ok().json(ChatResponse {
            reply: EMPTY_MESSAGE_REPLY.to_string(),
        });
    }

    let request_id = Uuid::new_v4();
    info!("Chat request {}: {}", request_id, message);

    match data.upstream.complete(message).await {
        Ok(reply) => {
            info!("Chat request {} answered ({} chars)", request_id, reply.len());
            HttpResponse::Ok().json(ChatResponse { reply })
        }
        Err(e) => {
            error!("Chat request {} failed: {}", request_id, e);
            HttpResponse::Ok().json(ChatResponse {
                reply: e.to_string(),
            })
        }
    }
}

// Server-side diagnostics: key presence, length and prefix only, never
// the key itself.
pub async fn debug_info(data: web::Data<AppState>) -> impl Responder {
    let provider = &data.settings.provider;
    let (length, prefix) = match provider.api_key.as_deref() {
        Some(key) => (
            key.len(),
            format!("{}...", key.chars().take(7).collect::<String>()),
        ),
        None => (0, "not found".to_string()),
    };
    let env_keys: Vec<String> = env::vars()
        .map(|(name, _)| name)
        .filter(|name| name.contains("API") || name.contains("OPENAI"))
        .collect();

    HttpResponse::Ok().json(json!({
        "status": "Server running",
        "has_api_key": provider.api_key.is_some(),
        "api_key_length": length,
        "api_key_prefix": prefix,
        "provider": provider.kind.label(),
        "model": provider.model,
        "env_keys": env_keys,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

// Static acknowledgement, no upstream traffic
pub async fn test() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "API working!",
        "time": Utc::now().to_rfc3339(),
    }))
}

// Upstream connectivity probe; flat 200 either way, like the chat route
pub async fn test_upstream(data: web::Data<AppState>) -> impl Responder {
    match data.upstream.probe().await {
        Ok(reply) => HttpResponse::Ok().json(json!({ "ok": true, "reply": reply })),
        Err(e) => {
            error!("Upstream probe failed: {}", e);
            HttpResponse::Ok().json(json!({ "ok": false, "error": e.to_string() }))
        }
    }
}

// Sign-up API endpoint. Unlike chat this is a completed feature with no
// flattened-status contract to honor, so it uses real HTTP statuses.
pub async fn signup(data: web::Data<AppState>, form: web::Json<SignupRequest>) -> impl Responder {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "error": "email and password are required"
        }));
    }

    match data.auth.register(&form).await {
        Ok(account) => {
            info!("Sign-up completed for {}", account.uid);
            HttpResponse::Ok().json(json!({ "status": "ok", "uid": account.uid }))
        }
        Err(AuthError::NotConfigured) => HttpResponse::ServiceUnavailable().json(json!({
            "error": AuthError::NotConfigured.to_string()
        })),
        Err(e @ AuthError::Rejected { .. }) => {
            HttpResponse::BadRequest().json(json!({ "error": e.to_string() }))
        }
        Err(e) => {
            error!("Sign-up failed: {}", e);
            HttpResponse::BadGateway().json(json!({ "error": e.to_string() }))
        }
    }
}
