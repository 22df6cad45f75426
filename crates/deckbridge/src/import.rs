//! Flashcard import: deck JSON, CSV, and extension-based file routing.

use std::path::Path;

use chrono::Utc;
use regex_lite::Regex;

use crate::card::{CardKind, Flashcard};
use crate::csv;
use crate::deck::Deck;
use crate::error::{Error, Result};

/// Parse deck JSON into internal flashcards.
///
/// Fails with [`Error::InvalidJson`] when the text is not valid JSON.
/// Parsed values are treated permissively: missing keys degrade to empty
/// sequences and empty strings rather than erroring, so a partial deck
/// imports as far as its content allows.
pub fn from_json(text: &str) -> Result<Vec<Flashcard>> {
    let deck: Deck = serde_json::from_str(text).map_err(Error::InvalidJson)?;
    Ok(cards_from_deck(&deck))
}

/// Convert a parsed deck into internal flashcards, one per note, in order.
///
/// The kind is derived from the note's type code and model name. When the
/// note's `Extra` field carries `<img src="...">` tags and the deck has
/// media, each tag is resolved against the media list by exact filename and
/// reconstituted as a PNG data-URL in tag-appearance order; unmatched
/// filenames are skipped.
pub fn cards_from_deck(deck: &Deck) -> Vec<Flashcard> {
    let img_tag = Regex::new(r#"<img src="([^"]+)">"#).unwrap();
    let now = Utc::now().to_rfc3339();

    deck.notes
        .iter()
        .map(|note| {
            let mut images = Vec::new();
            if !note.fields.extra.is_empty() && !deck.media.is_empty() {
                for capture in img_tag.captures_iter(&note.fields.extra) {
                    if let Some(media) = deck.find_media(&capture[1]) {
                        images.push(format!("data:image/png;base64,{}", media.data));
                    }
                }
            }

            Flashcard {
                id: note.id.clone(),
                kind: CardKind::from_note(note.note_type, &note.model_name),
                front: note.fields.front.clone(),
                back: note.fields.back.clone(),
                extra: note.fields.extra.clone(),
                header: note.fields.header.clone(),
                source: note.fields.source.clone(),
                tags: note.tags.clone(),
                images,
                cloze_number: None,
                difficulty: Some("medium".to_string()),
                created_at: Some(now.clone()),
            }
        })
        .collect()
}

/// Parse CSV text into internal flashcards.
///
/// The first line is consumed as a header without validation; blank lines
/// are skipped. Positional columns map per [`CSV_HEADER`]: front, back,
/// tags (split on `", "`), kind (defaults to basic when the column is
/// empty), extra, header, source. Ids are synthesized unique within the
/// batch from a timestamp base and the row index.
///
/// [`CSV_HEADER`]: crate::export::CSV_HEADER
pub fn from_csv(text: &str) -> Vec<Flashcard> {
    let base = Utc::now().timestamp_millis();
    let mut cards = Vec::new();

    for (row, line) in text.split('\n').enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }

        let values = csv::parse_line(line);
        let tags = match values.get(2) {
            Some(t) if !t.is_empty() => t.split(", ").map(String::from).collect(),
            _ => Vec::new(),
        };
        let kind = match values.get(3) {
            Some(k) if !k.is_empty() => CardKind::parse(k),
            _ => CardKind::Basic,
        };

        cards.push(Flashcard {
            id: format!("imported_{base}_{row}"),
            kind,
            front: column(&values, 0),
            back: column(&values, 1),
            tags,
            extra: column(&values, 4),
            header: column(&values, 5),
            source: column(&values, 6),
            ..Default::default()
        });
    }

    cards
}

fn column(values: &[String], index: usize) -> String {
    values.get(index).cloned().unwrap_or_default()
}

/// Route `content` to the right importer based on `filename`'s extension.
///
/// `json` and `ankijson` (case-insensitive) go to [`from_json`], `csv` to
/// [`from_csv`]; anything else fails with [`Error::UnsupportedFormat`].
pub fn import_str(filename: &str, content: &str) -> Result<Vec<Flashcard>> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "json" | "ankijson" => from_json(content),
        "csv" => Ok(from_csv(content)),
        _ => Err(Error::UnsupportedFormat(extension)),
    }
}

/// Read a file and import it based on its extension.
pub fn import_file(path: impl AsRef<Path>) -> Result<Vec<Flashcard>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    import_str(name, &content)
}
