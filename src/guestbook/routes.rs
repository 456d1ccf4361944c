use super::error::StoreError;
use super::store::GuestbookStore;
use actix_web::{HttpResponse, Responder, error::InternalError, web};
use serde::{Deserialize, Serialize};

const MISSING_FIELDS: &str = "Missing fields";

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl MessageRequest {
    /// Both fields, trimmed, when neither is blank.
    fn fields(self) -> Option<(String, String)> {
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        Some((clean(self.name)?, clean(self.message)?))
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl MessageResponse {
    fn ok() -> Self {
        Self { success: true, error: None }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self { success: false, error: Some(error.into()) }
    }
}

/// POST /api/message
/// Always answers 200; failures are reported in the body.
async fn post_message(store: web::Data<GuestbookStore>, req: web::Json<MessageRequest>) -> impl Responder {
    let Some((name, message)) = req.into_inner().fields() else {
        tracing::info!("guestbook post rejected: missing fields");
        return HttpResponse::Ok().json(MessageResponse::failure(MISSING_FIELDS));
    };

    let store = store.into_inner();
    let result = web::block(move || store.append(&name, &message))
        .await
        .map_err(StoreError::from)
        .and_then(|appended| appended);

    match result {
        Ok(record) => {
            tracing::info!(name = %record.name, time = %record.time, "guestbook message stored");
            HttpResponse::Ok().json(MessageResponse::ok())
        }
        Err(e) => {
            tracing::error!("Failed to store guestbook message: {}", e);
            HttpResponse::Ok().json(MessageResponse::failure(e.to_string()))
        }
    }
}

/// GET /api/messages
async fn list_messages(store: web::Data<GuestbookStore>) -> impl Responder {
    let store = store.into_inner();
    let result = web::block(move || store.load())
        .await
        .map_err(StoreError::from)
        .and_then(|loaded| loaded);

    match result {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => {
            tracing::error!("Failed to read guestbook: {}", e);
            HttpResponse::InternalServerError().json(MessageResponse::failure(e.to_string()))
        }
    }
}

/// GET /health
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "invitation-guestbook"
    }))
}

/// Malformed bodies still get a 200 with `success: false`.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| {
            tracing::warn!("Rejected guestbook payload: {}", err);
            let response = HttpResponse::Ok().json(MessageResponse::failure(err.to_string()));
            InternalError::from_response(err, response).into()
        })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(health))
        .route("/api/message", web::post().to(post_message))
        .route("/api/messages", web::get().to(list_messages));
}
