//! Flashcard export: deck construction, JSON/CSV serialization, file naming.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::card::Flashcard;
use crate::csv;
use crate::deck::{Card, Deck, Media, Note, NoteFields, NoteModel};
use crate::error::Result;

/// Deck name used when the caller passes an empty one.
pub const DEFAULT_DECK_NAME: &str = "Exported Deck";

/// Column order shared by CSV export and import.
pub const CSV_HEADER: [&str; 7] = ["Front", "Back", "Tags", "Type", "Extra", "Header", "Source"];

/// Output format for [`export_deck`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Pretty-printed deck JSON.
    #[default]
    Json,
    /// Header row plus one row per flashcard.
    Csv,
    /// The JSON payload under an `.ankijson` extension.
    ///
    /// Not a real Anki package; kept for compatibility with decks exported
    /// by earlier versions of the host application. Use [`Apkg`] for files
    /// Anki itself can open.
    ///
    /// [`Apkg`]: ExportFormat::Apkg
    Anki,
    /// A real `.apkg` package: a ZIP containing a SQLite collection.
    #[cfg(feature = "apkg")]
    Apkg,
}

/// Options for [`export_deck`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Output format (default: JSON).
    pub format: ExportFormat,
}

/// A named, typed payload ready to hand to the host environment.
///
/// The library never writes anywhere on its own; callers either persist the
/// content themselves or use [`write_to_dir`](Self::write_to_dir).
#[derive(Debug, Clone)]
pub struct ExportFile {
    /// Suggested filename, `<deck name>_<epoch-ms>.<ext>` with whitespace
    /// runs in the name replaced by underscores.
    pub filename: String,
    /// MIME type of the content.
    pub mime_type: &'static str,
    /// File content.
    pub content: Vec<u8>,
}

impl ExportFile {
    /// Write the payload into `dir` under its own filename.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(&self.filename);
        std::fs::write(&path, &self.content)?;
        Ok(path)
    }
}

/// Per-batch id generator: a timestamp base plus a monotonic counter, so ids
/// stay unique even when a whole batch is exported within one millisecond.
struct IdGen {
    base: i64,
    seq: u64,
}

impl IdGen {
    fn new() -> Self {
        Self {
            base: Utc::now().timestamp_millis(),
            seq: 0,
        }
    }

    fn next(&mut self, prefix: char) -> String {
        let id = format!("{}{}_{}", prefix, self.base, self.seq);
        self.seq += 1;
        id
    }
}

/// Build an Anki-compatible deck from internal flashcards.
///
/// Cards are processed in input order. Each flashcard becomes one note plus
/// its generated cards: reversed-basic notes get two (ord 0 and 1), cloze
/// notes get one at `cloze_number - 1` (ord 0 when unset), basic notes get
/// one at ord 0. Data-URL images are split off into the deck's media list
/// and referenced from the note's `Extra` field.
pub fn deck_from_cards(cards: &[Flashcard], deck_name: &str) -> Deck {
    let name = if deck_name.is_empty() {
        DEFAULT_DECK_NAME
    } else {
        deck_name
    };
    let mut deck = Deck::new(name, format!("Deck exported on {}", Utc::now().to_rfc3339()));
    let mut ids = IdGen::new();

    for flashcard in cards {
        let model = NoteModel::for_kind(flashcard.kind);
        let mut note = Note {
            id: ids.next('n'),
            model_name: model.name().to_string(),
            fields: NoteFields {
                front: flashcard.front.clone(),
                back: flashcard.back.clone(),
                extra: flashcard.extra.clone(),
                header: flashcard.header.clone(),
                source: flashcard.source.clone(),
                tags: flashcard.tags.join(" "),
            },
            tags: flashcard.tags.clone(),
            note_type: model.code(),
        };

        match model {
            NoteModel::BasicReversed => {
                deck.cards.push(Card::new(ids.next('c'), note.id.clone(), 0));
                deck.cards.push(Card::new(ids.next('c'), note.id.clone(), 1));
            }
            NoteModel::Cloze => {
                let ord = flashcard.cloze_number.map_or(0, |n| i64::from(n) - 1);
                deck.cards.push(Card::new(ids.next('c'), note.id.clone(), ord));
            }
            NoteModel::Basic => {
                deck.cards.push(Card::new(ids.next('c'), note.id.clone(), 0));
            }
        }

        for (index, image) in flashcard.images.iter().enumerate() {
            if !image.starts_with("data:") {
                continue;
            }
            // Everything up to the first comma is the data-URL prefix.
            let payload = image.split_once(',').map(|(_, p)| p).unwrap_or("");
            let filename = format!("img_{}_{}.png", note.id, index);
            deck.media.push(Media {
                filename: filename.clone(),
                data: payload.to_string(),
            });
            note.fields.extra.push_str(&format!("\n<img src=\"{filename}\">"));
        }

        deck.notes.push(note);
    }

    deck
}

/// Serialize flashcards as a pretty-printed Anki-compatible deck.
pub fn to_json(cards: &[Flashcard], deck_name: &str) -> String {
    let deck = deck_from_cards(cards, deck_name);
    serde_json::to_string_pretty(&deck).unwrap()
}

/// Serialize flashcards as CSV, bypassing the deck intermediate.
///
/// Produces the [`CSV_HEADER`] row followed by one row per flashcard, with
/// tags joined by `", "` and every field quote-escaped as needed. Lines are
/// `\n`-joined with no trailing newline.
pub fn to_csv(cards: &[Flashcard]) -> String {
    let mut lines = Vec::with_capacity(cards.len() + 1);
    lines.push(CSV_HEADER.join(","));

    for card in cards {
        let row = [
            csv::escape_field(&card.front),
            csv::escape_field(&card.back),
            csv::escape_field(&card.tags.join(", ")),
            csv::escape_field(card.kind.as_str()),
            csv::escape_field(&card.extra),
            csv::escape_field(&card.header),
            csv::escape_field(&card.source),
        ];
        lines.push(row.join(","));
    }

    lines.join("\n")
}

/// Export flashcards as a named file payload in the requested format.
pub fn export_deck(
    cards: &[Flashcard],
    deck_name: &str,
    options: ExportOptions,
) -> Result<ExportFile> {
    let stem = file_stem(deck_name);

    let file = match options.format {
        ExportFormat::Json => ExportFile {
            filename: format!("{stem}.json"),
            mime_type: "application/json",
            content: to_json(cards, deck_name).into_bytes(),
        },
        ExportFormat::Csv => ExportFile {
            filename: format!("{stem}.csv"),
            mime_type: "text/csv",
            content: to_csv(cards).into_bytes(),
        },
        ExportFormat::Anki => ExportFile {
            filename: format!("{stem}.ankijson"),
            mime_type: "application/json",
            content: to_json(cards, deck_name).into_bytes(),
        },
        #[cfg(feature = "apkg")]
        ExportFormat::Apkg => ExportFile {
            filename: format!("{stem}.apkg"),
            mime_type: "application/apkg",
            content: crate::apkg::ApkgWriter::from_cards(cards, deck_name).to_bytes()?,
        },
    };

    Ok(file)
}

/// `<deck name with whitespace runs replaced by "_">_<epoch-ms>`.
fn file_stem(deck_name: &str) -> String {
    let name = if deck_name.is_empty() {
        DEFAULT_DECK_NAME
    } else {
        deck_name
    };
    let whitespace = regex_lite::Regex::new(r"\s+").unwrap();
    format!(
        "{}_{}",
        whitespace.replace_all(name, "_"),
        Utc::now().timestamp_millis()
    )
}
