//! Anki-compatible deck interchange structures.
//!
//! A [`Deck`] is the object graph produced by export and consumed by import:
//! notes carry the field values, cards carry per-direction scheduling
//! placeholders, media carries base64 image payloads. Every field defaults,
//! so a parsed deck with missing keys degrades to empty sequences instead of
//! failing.

use serde::{Deserialize, Serialize};

use crate::card::CardKind;
use crate::error::{Error, Result};

/// An Anki-compatible deck: notes, their cards, and attached media.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deck {
    /// Deck label.
    pub name: String,
    /// Free-text description, stamped with the export time.
    pub desc: String,
    /// Notes in insertion order.
    pub notes: Vec<Note>,
    /// Cards in insertion order; each references a note by id.
    pub cards: Vec<Card>,
    /// Media payloads referenced from note fields.
    pub media: Vec<Media>,
}

impl Deck {
    /// Create an empty deck.
    pub fn new(name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            ..Default::default()
        }
    }

    /// Look up a media entry by exact filename.
    pub fn find_media(&self, filename: &str) -> Option<&Media> {
        self.media.iter().find(|m| m.filename == filename)
    }

    /// Check structural invariants: every card must reference a note present
    /// in this deck, and media filenames must be unique.
    ///
    /// Export-produced decks always pass. Import deliberately does not call
    /// this, staying permissive with hand-built or partial decks.
    pub fn validate(&self) -> Result<()> {
        let note_ids: std::collections::HashSet<_> =
            self.notes.iter().map(|n| n.id.as_str()).collect();

        for card in &self.cards {
            if !note_ids.contains(card.nid.as_str()) {
                return Err(Error::DanglingCard {
                    card: card.id.clone(),
                    note: card.nid.clone(),
                });
            }
        }

        let mut seen = std::collections::HashSet::new();
        for media in &self.media {
            if !seen.insert(media.filename.as_str()) {
                return Err(Error::DuplicateMediaFile(media.filename.clone()));
            }
        }

        Ok(())
    }
}

/// The three note models this crate emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteModel {
    /// One card, front to back.
    Basic,
    /// Two cards, one per direction.
    BasicReversed,
    /// One card per cloze deletion.
    Cloze,
}

impl NoteModel {
    /// The model used when exporting a card of the given kind.
    pub fn for_kind(kind: CardKind) -> Self {
        match kind {
            CardKind::Basic => NoteModel::Basic,
            CardKind::BasicInverted => NoteModel::BasicReversed,
            CardKind::Cloze => NoteModel::Cloze,
        }
    }

    /// Canonical model name as it appears in Anki.
    pub fn name(&self) -> &'static str {
        match self {
            NoteModel::Basic => "Basic",
            NoteModel::BasicReversed => "Basic (and reversed card)",
            NoteModel::Cloze => "Cloze",
        }
    }

    /// Integer type code (0 = basic, 1 = reversed, 2 = cloze).
    pub fn code(&self) -> i64 {
        match self {
            NoteModel::Basic => 0,
            NoteModel::BasicReversed => 1,
            NoteModel::Cloze => 2,
        }
    }
}

/// A note: the field values one or more cards are generated from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    /// Unique id within the deck.
    pub id: String,
    /// Model name; canonical values come from [`NoteModel::name`].
    #[serde(rename = "modelName")]
    pub model_name: String,
    /// Field values.
    pub fields: NoteFields,
    /// Tags as a sequence.
    pub tags: Vec<String>,
    /// Integer type code (0 = basic, 1 = reversed, 2 = cloze).
    #[serde(rename = "type")]
    pub note_type: i64,
}

/// The named fields of a note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteFields {
    /// Recall side A.
    #[serde(rename = "Front")]
    pub front: String,
    /// Recall side B.
    #[serde(rename = "Back")]
    pub back: String,
    /// Supplementary text; image tags land here.
    #[serde(rename = "Extra")]
    pub extra: String,
    /// Free-text metadata.
    #[serde(rename = "Header")]
    pub header: String,
    /// Free-text metadata.
    #[serde(rename = "Source")]
    pub source: String,
    /// Space-joined tag string.
    #[serde(rename = "Tags")]
    pub tags: String,
}

/// A card generated from a note, with zeroed scheduling placeholders.
///
/// This crate does not track spaced-repetition history; the scheduling
/// columns exist for format compatibility and are zero-initialized on
/// export (ease factor 2500).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Card {
    /// Unique id within the deck.
    pub id: String,
    /// Owning note's id.
    pub nid: String,
    /// 0-based position among cards generated from the same note.
    pub ord: i64,
    /// Card state (0 = new).
    #[serde(rename = "type")]
    pub card_type: i64,
    /// Scheduling queue (0 = new).
    pub queue: i64,
    /// Due position.
    pub due: i64,
    /// Current interval in days.
    pub ivl: i64,
    /// Ease factor (2500 = 250%).
    pub factor: i64,
    /// Number of reviews.
    pub reps: i64,
    /// Number of lapses.
    pub lapses: i64,
    /// Reviews left today.
    pub left: i64,
}

impl Card {
    /// Create a fresh card for a note with default scheduling state.
    pub fn new(id: impl Into<String>, nid: impl Into<String>, ord: i64) -> Self {
        Self {
            id: id.into(),
            nid: nid.into(),
            ord,
            factor: 2500,
            ..Default::default()
        }
    }
}

/// A media payload attached to a deck.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Media {
    /// Filename referenced by `<img src="...">` tags in note fields.
    pub filename: String,
    /// Base64 payload with any `data:...;base64,` prefix stripped.
    pub data: String,
}
