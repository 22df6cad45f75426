//! Anki-compatible flashcard deck conversion.
//!
//! `deckbridge` translates between an application-internal flashcard
//! representation and an Anki-style note/card/deck/media graph, serializes
//! decks to JSON or CSV, and parses all of those back. It is a leaf
//! library: pure data transforms with no network access, and filesystem
//! access only at the thin [`import::import_file`] /
//! [`export::ExportFile::write_to_dir`] edges.
//!
//! # Formats
//!
//! - **JSON** — the full deck graph, pretty-printed. Import is permissive:
//!   missing keys degrade to empty values, only unparseable JSON fails.
//! - **CSV** — `Front,Back,Tags,Type,Extra,Header,Source`, built directly
//!   from the flashcards (no deck intermediate), RFC-4180-style quoting.
//!   Lines are split on `\n` before tokenizing, so quoted fields cannot
//!   carry embedded newlines.
//! - **`.ankijson`** — the JSON payload under a different extension, kept
//!   for compatibility with earlier exports. Not a real Anki package.
//! - **`.apkg`** (feature `apkg`, default on) — a real Anki package: a ZIP
//!   containing a SQLite collection plus media. Write-only; there is no
//!   package importer.
//!
//! # Example
//!
//! ```
//! use deckbridge::{export, import, Flashcard};
//!
//! let cards = vec![Flashcard::new("2 + 2 = ?", "4").tag("math")];
//!
//! let json = export::to_json(&cards, "Math");
//! let imported = import::from_json(&json)?;
//! assert_eq!(imported[0].front, "2 + 2 = ?");
//! # Ok::<(), deckbridge::Error>(())
//! ```
//!
//! # Concurrency
//!
//! Every call builds its own deck and record objects; there is no shared
//! mutable state, so concurrent use needs no locking. Parse failures
//! surface immediately with no retries or partial results.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod card;
pub mod deck;
pub mod error;
pub mod export;
pub mod import;

mod csv;

#[cfg(feature = "apkg")]
pub mod apkg;

pub use card::{CardKind, Flashcard, RawFlashcard};
pub use deck::{Card, Deck, Media, Note, NoteFields, NoteModel};
pub use error::{Error, Result};
pub use export::{DEFAULT_DECK_NAME, ExportFile, ExportFormat, ExportOptions};

#[cfg(feature = "apkg")]
pub use apkg::ApkgWriter;
