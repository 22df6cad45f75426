//! Internal flashcard records and boundary normalization.
//!
//! Application code tends to hand us loosely shaped records where the same
//! logical field travels under one of several keys (`front`/`question`,
//! `back`/`answer`, `extra`/`explanation`). [`RawFlashcard`] captures that
//! external shape; [`Flashcard`] is the strict record the rest of the crate
//! works with. Normalization happens exactly once, at the deserialization
//! boundary, instead of fallback chains scattered through the converters.

use serde::{Deserialize, Serialize};

/// Kind of flashcard, mirroring the Anki note model it maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    /// Front/back card, one direction.
    #[default]
    Basic,
    /// Front/back card reviewed in both directions.
    BasicInverted,
    /// Fill-in-the-blank card using `{{c1::...}}` deletions.
    Cloze,
}

impl CardKind {
    /// Parse a kind string permissively; anything unrecognized is `Basic`.
    pub fn parse(s: &str) -> Self {
        match s {
            "cloze" => CardKind::Cloze,
            "basic_inverted" => CardKind::BasicInverted,
            _ => CardKind::Basic,
        }
    }

    /// The wire string for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CardKind::Basic => "basic",
            CardKind::BasicInverted => "basic_inverted",
            CardKind::Cloze => "cloze",
        }
    }

    /// Derive the kind from a note's type code and model name.
    ///
    /// The type code wins when recognized; otherwise the model name is
    /// matched by substring so decks from other tools (e.g. a model named
    /// "Basic (and reversed card)") still map correctly.
    pub fn from_note(type_code: i64, model_name: &str) -> Self {
        let lower = model_name.to_lowercase();
        if type_code == 2 || lower.contains("cloze") {
            CardKind::Cloze
        } else if type_code == 1 || lower.contains("reversed") {
            CardKind::BasicInverted
        } else {
            CardKind::Basic
        }
    }
}

/// A flashcard in the application-internal representation.
///
/// Deserialization goes through [`RawFlashcard`], so JSON produced by the
/// host application may use the alias keys (`question`, `answer`,
/// `explanation`) interchangeably with the canonical ones.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawFlashcard")]
pub struct Flashcard {
    /// Opaque identifier. Synthesized on import when the source has none.
    pub id: String,
    /// Card kind; defaults to basic.
    #[serde(rename = "type")]
    pub kind: CardKind,
    /// Recall side A.
    pub front: String,
    /// Recall side B.
    pub back: String,
    /// Supplementary text. Image tags are appended here during export.
    pub extra: String,
    /// Free-text metadata.
    pub header: String,
    /// Free-text metadata.
    pub source: String,
    /// Ordered labels, space-joined on the Anki side.
    pub tags: Vec<String>,
    /// Data-URL images (`data:<mime>;base64,<payload>`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// 1-based cloze deletion index, meaningful only for cloze cards.
    #[serde(rename = "clozeNumber", skip_serializing_if = "Option::is_none")]
    pub cloze_number: Option<u32>,
    /// Stamped to "medium" on deck import; never set by export paths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// Import timestamp (RFC 3339); never set by export paths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Flashcard {
    /// Create a basic card with the given sides.
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            ..Default::default()
        }
    }

    /// Set the card kind.
    pub fn kind(mut self, kind: CardKind) -> Self {
        self.kind = kind;
        self
    }

    /// Add a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add a data-URL image.
    pub fn image(mut self, data_url: impl Into<String>) -> Self {
        self.images.push(data_url.into());
        self
    }

    /// Mark this as a cloze card for the given 1-based deletion index.
    pub fn cloze(mut self, number: u32) -> Self {
        self.kind = CardKind::Cloze;
        self.cloze_number = Some(number);
        self
    }
}

/// The loosely-typed external flashcard shape.
///
/// Every field is optional and alias pairs may both be present; conversion
/// into [`Flashcard`] resolves precedence deterministically (`front` over
/// `question`, `back` over `answer`, `extra` over `explanation`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFlashcard {
    /// Opaque identifier.
    pub id: Option<String>,
    /// Kind string; unrecognized values fall back to basic.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Recall side A (canonical key).
    pub front: Option<String>,
    /// Recall side A (alias key).
    pub question: Option<String>,
    /// Recall side B (canonical key).
    pub back: Option<String>,
    /// Recall side B (alias key).
    pub answer: Option<String>,
    /// Supplementary text (canonical key).
    pub extra: Option<String>,
    /// Supplementary text (alias key).
    pub explanation: Option<String>,
    /// Free-text metadata.
    pub header: Option<String>,
    /// Free-text metadata.
    pub source: Option<String>,
    /// Ordered labels.
    pub tags: Vec<String>,
    /// Data-URL images.
    pub images: Vec<String>,
    /// 1-based cloze deletion index.
    #[serde(rename = "clozeNumber")]
    pub cloze_number: Option<u32>,
    /// Difficulty label.
    pub difficulty: Option<String>,
    /// Creation timestamp.
    pub created_at: Option<String>,
}

impl From<RawFlashcard> for Flashcard {
    fn from(raw: RawFlashcard) -> Self {
        Flashcard {
            id: raw.id.unwrap_or_default(),
            kind: raw.kind.as_deref().map(CardKind::parse).unwrap_or_default(),
            front: raw.front.or(raw.question).unwrap_or_default(),
            back: raw.back.or(raw.answer).unwrap_or_default(),
            extra: raw.extra.or(raw.explanation).unwrap_or_default(),
            header: raw.header.unwrap_or_default(),
            source: raw.source.unwrap_or_default(),
            tags: raw.tags,
            images: raw.images,
            cloze_number: raw.cloze_number,
            difficulty: raw.difficulty,
            created_at: raw.created_at,
        }
    }
}
