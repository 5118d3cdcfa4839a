//! HTTP routes for the chat surface.

use crate::error::ApiError;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use realty_assist_ai::image::{decode_base64_image, sniff_mime};
use realty_assist_ai::FetchedImage;
use realty_assist_conversation::{ImageReference, RawHistoryEntry, Transcript};
use realty_assist_routing::{ChatRequest, ChatResponse, ChatService};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const DEFAULT_UPLOAD_MIME: &str = "image/jpeg";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub chat: ChatService,
}

impl AppState {
    #[must_use]
    pub fn new(chat: ChatService) -> Self {
        Self { chat }
    }
}

/// Builds the application router.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/image-upload-info", get(image_upload_info))
        .route("/chat", post(chat_json))
        .route("/chat/form", post(chat_multipart))
        .route("/chat/with-file", post(chat_multipart))
        .route("/chat/{session_id}", get(chat_history).delete(clear_chat))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON chat body.
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub text: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default, alias = "conversation_history")]
    pub history: Option<Vec<RawHistoryEntry>>,
    /// Raw base64 or a `data:image/...;base64,` URL.
    #[serde(default)]
    pub image_base64: Option<String>,
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Property assistant API is running" }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "strategy": state.chat.router().strategy().to_string(),
        "sessions": state.chat.store().len().await,
    }))
}

async fn image_upload_info() -> Json<Value> {
    Json(json!({
        "message": "Send property images for issue analysis",
        "methods": [
            {
                "endpoint": "/chat",
                "content_type": "application/json",
                "fields": {
                    "text": "message text (required)",
                    "session_id": "conversation to continue (optional)",
                    "history": "list of {role, text} replacing the stored conversation (optional)",
                    "image_base64": "raw base64 or data:image/...;base64,... (optional)"
                }
            },
            {
                "endpoint": "/chat/form",
                "content_type": "multipart/form-data",
                "fields": {
                    "text": "message text",
                    "session_id": "conversation to continue (optional)",
                    "image": "image file (optional)"
                }
            },
            {
                "endpoint": "/chat/with-file",
                "content_type": "multipart/form-data",
                "fields": {
                    "text": "message text",
                    "session_id": "conversation to continue (optional)",
                    "image": "image file (optional)"
                }
            }
        ],
        "notes": "Image URLs written in the message text are downloaded and analyzed as well."
    }))
}

async fn chat_json(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatResponse>, ApiError> {
    let ChatBody {
        text,
        session_id,
        history,
        image_base64,
    } = body;

    let request = ChatRequest {
        text,
        session_id,
        history,
        image: image_base64.as_deref().map(image_from_base64).transpose()?.flatten(),
    };
    Ok(Json(state.chat.handle(request).await?))
}

/// Data URLs are kept verbatim and decoded by the issue capability, which
/// downgrades on failure. Bare base64 has no such fallback and is checked here.
fn image_from_base64(encoded: &str) -> Result<Option<ImageReference>, ApiError> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Ok(None);
    }
    if encoded.starts_with("data:") {
        return Ok(Some(ImageReference::DataUrl(encoded.to_string())));
    }
    let FetchedImage { bytes, mime_type } = decode_base64_image(encoded)
        .map_err(|e| ApiError::BadRequest(format!("invalid image_base64: {e}")))?;
    Ok(Some(ImageReference::InlineData { bytes, mime_type }))
}

async fn chat_multipart(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ChatResponse>, ApiError> {
    let mut request = ChatRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => {
                request.text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            }
            "session_id" => {
                let id = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                request.session_id = Some(id).filter(|id| !id.trim().is_empty());
            }
            "image" | "file" => {
                let declared = field
                    .content_type()
                    .filter(|mime| mime.starts_with("image/"))
                    .map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                if bytes.is_empty() {
                    continue;
                }
                let mime_type = declared
                    .or_else(|| sniff_mime(&bytes).map(str::to_string))
                    .unwrap_or_else(|| DEFAULT_UPLOAD_MIME.to_string());
                request.image = Some(ImageReference::InlineData {
                    bytes: bytes.to_vec(),
                    mime_type,
                });
            }
            other => tracing::debug!(field = other, "ignoring form field"),
        }
    }

    if request.text.trim().is_empty() && request.image.is_none() {
        return Err(ApiError::BadRequest(
            "either text or an image is required".to_string(),
        ));
    }

    Ok(Json(state.chat.handle(request).await?))
}

async fn chat_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Transcript>, ApiError> {
    Ok(Json(state.chat.history(&session_id).await?))
}

async fn clear_chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.chat.clear(&session_id).await?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Conversation {session_id} cleared"),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_image_is_ignored() {
        assert!(image_from_base64("  ").expect("ok").is_none());
    }

    #[test]
    fn data_url_is_passed_through() {
        let image = image_from_base64("data:image/png;base64,iVBORw0KGgo=")
            .expect("ok")
            .expect("image");
        assert_eq!(
            image,
            ImageReference::DataUrl("data:image/png;base64,iVBORw0KGgo=".to_string())
        );
    }

    #[test]
    fn bare_base64_is_decoded() {
        let image = image_from_base64("iVBORw0KGgo=").expect("ok").expect("image");
        match image {
            ImageReference::InlineData { bytes, mime_type } => {
                assert_eq!(mime_type, "image/png");
                assert_eq!(bytes.len(), 8);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalid_bare_base64_is_rejected() {
        assert!(matches!(
            image_from_base64("not base64!!"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn history_alias_is_accepted() {
        let body: ChatBody = serde_json::from_value(json!({
            "text": "hi",
            "conversation_history": [{"role": "user", "text": "earlier"}]
        }))
        .expect("parse");
        assert_eq!(body.history.map(|h| h.len()), Some(1));
    }
}
