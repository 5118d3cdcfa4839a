//! In-memory fakes shared by the crate's tests.

use async_trait::async_trait;
use realty_assist_ai::{
    FetchedImage, ImageError, ImageFetcher, LlmBackend, LlmError, LlmRequest, LlmResponse, ToolCall,
};
use realty_assist_conversation::{ConversationTurn, Gazetteer, LocationSource};
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) const MODEL: &str = "scripted";

/// Backend that replays a fixed script and records every request.
pub(crate) struct ScriptedBackend {
    script: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedBackend {
    pub(crate) fn new(script: impl IntoIterator<Item = Result<LlmResponse, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replying<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(texts.into_iter().map(text))
    }

    pub(crate) fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> LlmRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("at least one request")
    }
}

pub(crate) fn text(reply: &str) -> Result<LlmResponse, LlmError> {
    Ok(LlmResponse::text(MODEL, reply))
}

pub(crate) fn tool(name: &str, arguments: JsonValue) -> Result<LlmResponse, LlmError> {
    Ok(LlmResponse::tool_call(MODEL, ToolCall::new(name, arguments)))
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(LlmError::RequestFailed {
                    reason: "script exhausted".to_string(),
                })
            })
    }

    fn model(&self) -> &str {
        MODEL
    }
}

/// Image fetcher with a canned result.
pub(crate) struct FakeFetcher {
    result: Result<FetchedImage, ImageError>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub(crate) fn png() -> Self {
        Self {
            result: Ok(FetchedImage {
                bytes: vec![0x89, b'P', b'N', b'G'],
                mime_type: "image/png".to_string(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(status: u16) -> Self {
        Self {
            result: Err(ImageError::BadStatus {
                url: "https://example.com".to_string(),
                status,
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ImageError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.result.clone()
    }
}

/// Location source that counts how often it is consulted.
#[derive(Default)]
pub(crate) struct CountingLocator {
    inner: Gazetteer,
    calls: AtomicUsize,
}

impl CountingLocator {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LocationSource for CountingLocator {
    fn infer(&self, history: &[ConversationTurn]) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.infer(history)
    }
}
