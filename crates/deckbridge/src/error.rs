//! Error types for deckbridge.

use thiserror::Error;

/// Result type for deckbridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during deck conversion.
#[derive(Debug, Error)]
pub enum Error {
    /// Input text was not valid JSON.
    #[error("Invalid JSON format")]
    InvalidJson(#[source] serde_json::Error),

    /// File extension does not match any recognized importer.
    ///
    /// Carries the offending extension (lowercased, possibly empty).
    #[error("Unsupported file format. Use JSON or CSV.")]
    UnsupportedFormat(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A card references a note id not present in the deck.
    #[error("card {card} references missing note {note}")]
    DanglingCard {
        /// Card id.
        card: String,
        /// The missing note id.
        note: String,
    },

    /// Two media entries share the same filename.
    #[error("duplicate media filename: {0}")]
    DuplicateMediaFile(String),

    /// SQLite error (apkg feature).
    #[cfg(feature = "apkg")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// ZIP error (apkg feature).
    #[cfg(feature = "apkg")]
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A media payload was not valid base64 (apkg feature).
    #[cfg(feature = "apkg")]
    #[error("invalid base64 media payload: {filename}")]
    InvalidMedia {
        /// Filename of the media entry.
        filename: String,
        /// The decode failure.
        #[source]
        source: base64::DecodeError,
    },
}
