//! Error handling foundation shared by the realty-assist crates.
//!
//! Library crates define their own domain error enums next to the code that
//! produces them. Service-level operations wrap those enums in a rootcause
//! [`Report`] so that the HTTP layer can inspect the typed context while the
//! report keeps the full chain for logging.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
///
/// `C` is the typed context of the report, e.g. `AssistError`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
