//! Image loading for multimodal requests.
//!
//! Images arrive as remote URLs, `data:` URLs embedded in message text, or
//! raw uploads. All of them end up as bytes plus a MIME type.

use crate::error::ImageError;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_MIME: &str = "image/jpeg";

/// Image bytes ready to be attached to a model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Loads image content by URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetches the image at `url`. `data:` URLs are decoded in place.
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ImageError>;
}

/// Downloads images over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    /// Creates a fetcher with the given download timeout.
    ///
    /// # Errors
    ///
    /// Returns `FetchFailed` if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, ImageError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ImageError::FetchFailed {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    #[instrument(skip(self, url), fields(inline = url.starts_with("data:")))]
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ImageError> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }

        let fetch_failed = |e: reqwest::Error| ImageError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(fetch_failed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let header_mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
            .filter(|v| v.starts_with("image/"));
        let mime_type = header_mime
            .or_else(|| mime_from_extension(url).map(str::to_string))
            .unwrap_or_else(|| DEFAULT_MIME.to_string());

        let bytes = response.bytes().await.map_err(fetch_failed)?.to_vec();
        debug!(bytes = bytes.len(), mime_type = %mime_type, "image downloaded");

        Ok(FetchedImage { bytes, mime_type })
    }
}

/// Decodes a `data:image/<subtype>;base64,<payload>` URL.
///
/// # Errors
///
/// Returns `DecodeFailed` if the URL is not a base64 image data URL or the
/// payload is not valid base64.
pub fn decode_data_url(data_url: &str) -> Result<FetchedImage, ImageError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| decode_failed("missing 'data:' prefix"))?;
    let (mime_type, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| decode_failed("missing ';base64,' marker"))?;
    if !mime_type.starts_with("image/") {
        return Err(decode_failed(format!("unsupported media type '{mime_type}'")));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| decode_failed(e.to_string()))?;

    Ok(FetchedImage {
        bytes,
        mime_type: mime_type.to_ascii_lowercase(),
    })
}

/// Decodes an uploaded image given either as a data URL or as bare base64.
///
/// Bare payloads get their MIME type from the leading magic bytes.
///
/// # Errors
///
/// Returns `DecodeFailed` on malformed input.
pub fn decode_base64_image(encoded: &str) -> Result<FetchedImage, ImageError> {
    let encoded = encoded.trim();
    if encoded.starts_with("data:") {
        return decode_data_url(encoded);
    }

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| decode_failed(e.to_string()))?;
    let mime_type = sniff_mime(&bytes).unwrap_or(DEFAULT_MIME).to_string();
    Ok(FetchedImage { bytes, mime_type })
}

/// Guesses a MIME type from a URL's file extension.
#[must_use]
pub fn mime_from_extension(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Identifies common image formats by their signature.
#[must_use]
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}

fn decode_failed(reason: impl Into<String>) -> ImageError {
    ImageError::DecodeFailed {
        reason: reason.into(),
    }
}
