//! Context extraction from free text.
//!
//! Pure functions that find an image reference embedded in a message and
//! recover a location the user already mentioned, so capabilities do not
//! ask for information the conversation already holds.

use crate::message::{ConversationTurn, ImageReference};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Prompt used when an image arrives without any accompanying text.
pub const DEFAULT_IMAGE_PROMPT: &str = "Please analyze this property image.";

const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Known cities and countries, checked in order.
const KNOWN_PLACES: &[&str] = &[
    "Mumbai",
    "Delhi",
    "Bangalore",
    "Hyderabad",
    "Chennai",
    "Kolkata",
    "Pune",
    "Ahmedabad",
    "Jaipur",
    "Lucknow",
    "Kanpur",
    "Nagpur",
    "New York",
    "Los Angeles",
    "Chicago",
    "Houston",
    "Phoenix",
    "Philadelphia",
    "San Antonio",
    "San Diego",
    "Dallas",
    "San Jose",
    "India",
    "USA",
    "United States",
    "UK",
    "United Kingdom",
    "Canada",
    "Australia",
];

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid regex"));

static DATA_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"data:image/[^;\s]+;base64,[a-zA-Z0-9+/]+=*").expect("valid regex")
});

/// Capitalized phrase after a locative preposition. Only the preposition is
/// case-insensitive.
static LOCATIVE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?i:in|from|at|is|am)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").expect("valid regex")
});

static DEFAULT_GAZETTEER: LazyLock<Gazetteer> = LazyLock::new(|| {
    Gazetteer::new(KNOWN_PLACES.iter().copied()).expect("valid gazetteer patterns")
});

/// Byte ranges of remote image URLs in `text`, in scan order.
fn image_url_spans(text: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    URL_REGEX.find_iter(text).filter_map(|m| {
        let url = m
            .as_str()
            .trim_end_matches(|c| matches!(c, '.' | ',' | '!' | '?' | ')' | ']' | '}'));
        let lower = url.to_ascii_lowercase();
        IMAGE_EXTENSIONS
            .iter()
            .any(|ext| lower.ends_with(ext))
            .then_some(m.start()..m.start() + url.len())
    })
}

/// Finds the first image reference in `text`.
///
/// Remote image URLs take precedence over inline `data:` fragments. A miss
/// means "no image", not an error.
#[must_use]
pub fn find_image_reference(text: &str) -> Option<ImageReference> {
    if let Some(span) = image_url_spans(text).next() {
        return Some(ImageReference::RemoteUrl(text[span].to_string()));
    }
    DATA_URL_REGEX
        .find(text)
        .map(|m| ImageReference::DataUrl(m.as_str().to_string()))
}

/// Removes image URLs and inline image fragments from `text`, trimming the
/// ends of what remains.
#[must_use]
pub fn strip_image_reference(text: &str) -> String {
    let mut residual = String::with_capacity(text.len());
    let mut last = 0;
    for span in image_url_spans(text) {
        residual.push_str(&text[last..span.start]);
        last = span.end;
    }
    residual.push_str(&text[last..]);

    DATA_URL_REGEX
        .replace_all(&residual, "")
        .trim()
        .to_string()
}

/// Stripped text, or [`DEFAULT_IMAGE_PROMPT`] if nothing remains.
#[must_use]
pub fn image_context_or_default(text: &str) -> String {
    let residual = strip_image_reference(text);
    if residual.is_empty() {
        DEFAULT_IMAGE_PROMPT.to_string()
    } else {
        residual
    }
}

/// Infers a location from history using the built-in gazetteer.
#[must_use]
pub fn infer_location(history: &[ConversationTurn]) -> Option<String> {
    DEFAULT_GAZETTEER.infer(history)
}

/// Something that can recover a location from conversation history.
pub trait LocationSource: Send + Sync {
    fn infer(&self, history: &[ConversationTurn]) -> Option<String>;
}

/// A fixed list of place names plus a locative-phrase fallback.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    places: Vec<(String, Regex)>,
}

impl Gazetteer {
    /// Builds a gazetteer from place names. Earlier names win.
    ///
    /// # Errors
    ///
    /// Returns an error if a name produces an oversized pattern.
    pub fn new<I, S>(names: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let places = names
            .into_iter()
            .map(|name| {
                let name = name.into();
                let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&name)))?;
                Ok::<_, regex::Error>((name, pattern))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { places })
    }

    /// Finds a location mentioned in a single piece of text.
    #[must_use]
    pub fn locate(&self, text: &str) -> Option<String> {
        if let Some((name, _)) = self.places.iter().find(|(_, re)| re.is_match(text)) {
            return Some(name.clone());
        }
        LOCATIVE_REGEX
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

impl Default for Gazetteer {
    fn default() -> Self {
        DEFAULT_GAZETTEER.clone()
    }
}

impl LocationSource for Gazetteer {
    /// Scans user turns from most recent to oldest and returns the first hit.
    fn infer(&self, history: &[ConversationTurn]) -> Option<String> {
        history
            .iter()
            .rev()
            .filter(|turn| turn.is_user())
            .find_map(|turn| self.locate(turn.content()))
    }
}
