//! Real `.apkg` package generation.
//!
//! An Anki package is a ZIP holding a SQLite collection (`collection.anki2`,
//! schema version 11), a `media` manifest mapping numbered entries to
//! filenames, and the media files themselves under those numbers. This
//! module turns a [`Deck`] into a package Anki itself can import, unlike the
//! `.ankijson` convenience format which only this library reads.
//!
//! The three note kinds are written with built-in models: Basic (one
//! template), Basic (and reversed card) (two templates), and Cloze (a cloze
//! template over the Front field).

use std::collections::HashMap;
use std::io::{Seek, Write};
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rusqlite::Connection;
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::card::{CardKind, Flashcard};
use crate::deck::{Deck, NoteModel};
use crate::error::{Error, Result};
use crate::export::deck_from_cards;

/// Writer that turns a deck into an Anki package.
pub struct ApkgWriter {
    deck: Deck,
}

impl ApkgWriter {
    /// Create a writer for an already-built deck.
    pub fn new(deck: Deck) -> Self {
        Self { deck }
    }

    /// Build the deck graph from internal flashcards and wrap it.
    pub fn from_cards(cards: &[Flashcard], deck_name: &str) -> Self {
        Self::new(deck_from_cards(cards, deck_name))
    }

    /// Write the package to `path`.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write(file)
    }

    /// Build the package in memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        self.write(&mut buffer)?;
        Ok(buffer.into_inner())
    }

    fn write<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("collection.anki2");

        let conn = Connection::open(&db_path)?;
        self.create_database(&conn)?;
        drop(conn);

        let mut zip = ZipWriter::new(writer);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("collection.anki2", options)?;
        zip.write_all(&std::fs::read(&db_path)?)?;

        let manifest: HashMap<String, &str> = self
            .deck
            .media
            .iter()
            .enumerate()
            .map(|(i, m)| (i.to_string(), m.filename.as_str()))
            .collect();
        zip.start_file("media", options)?;
        zip.write_all(serde_json::to_string(&manifest).unwrap().as_bytes())?;

        for (index, media) in self.deck.media.iter().enumerate() {
            let bytes =
                BASE64
                    .decode(media.data.as_bytes())
                    .map_err(|source| Error::InvalidMedia {
                        filename: media.filename.clone(),
                        source,
                    })?;
            zip.start_file(index.to_string(), options)?;
            zip.write_all(&bytes)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Create and populate the SQLite collection.
    fn create_database(&self, conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA)?;

        let now = chrono::Utc::now().timestamp();
        let now_ms = now * 1000;
        let deck_id = stable_id(&self.deck.name);

        conn.execute(
            "INSERT INTO col (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags)
             VALUES (1, ?, ?, ?, 11, 0, -1, 0, ?, ?, ?, ?, '{}')",
            rusqlite::params![
                now,
                now_ms,
                now_ms,
                DEFAULT_CONF,
                build_models_json(now),
                self.build_decks_json(now, deck_id),
                DEFAULT_DCONF
            ],
        )?;

        // The deck graph uses string ids; SQLite rows need integers. Notes
        // get sequential ids from a millisecond base, and cards resolve
        // their nid through this map.
        let mut note_ids: HashMap<&str, i64> = HashMap::new();

        for (index, note) in self.deck.notes.iter().enumerate() {
            let note_id = now_ms + index as i64;
            note_ids.insert(note.id.as_str(), note_id);

            let model = NoteModel::for_kind(CardKind::from_note(note.note_type, &note.model_name));
            let fields = [
                note.fields.front.as_str(),
                note.fields.back.as_str(),
                note.fields.extra.as_str(),
                note.fields.header.as_str(),
                note.fields.source.as_str(),
            ]
            .join(FIELD_SEPARATOR);
            let tags = if note.tags.is_empty() {
                String::new()
            } else {
                format!(" {} ", note.tags.join(" "))
            };
            let sort_field = note.fields.front.as_str();

            conn.execute(
                "INSERT INTO notes (id, guid, mid, mod, usn, tags, flds, sfld, csum, flags, data)
                 VALUES (?, ?, ?, ?, -1, ?, ?, ?, ?, 0, '')",
                rusqlite::params![
                    note_id,
                    guid(note_id),
                    stable_id(model.name()),
                    now,
                    tags,
                    fields,
                    sort_field,
                    checksum(sort_field)
                ],
            )?;
        }

        for (index, card) in self.deck.cards.iter().enumerate() {
            let card_id = now_ms + self.deck.notes.len() as i64 + index as i64;
            let nid = note_ids
                .get(card.nid.as_str())
                .copied()
                .ok_or_else(|| Error::DanglingCard {
                    card: card.id.clone(),
                    note: card.nid.clone(),
                })?;

            conn.execute(
                "INSERT INTO cards (id, nid, did, ord, mod, usn, type, queue, due, ivl, factor, reps, lapses, left, odue, odid, flags, data)
                 VALUES (?, ?, ?, ?, ?, -1, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, 0, '')",
                rusqlite::params![
                    card_id,
                    nid,
                    deck_id,
                    card.ord,
                    now,
                    card.card_type,
                    card.queue,
                    index as i64 + 1,
                    card.ivl,
                    card.factor,
                    card.reps,
                    card.lapses,
                    card.left
                ],
            )?;
        }

        Ok(())
    }

    /// Decks JSON for the col row: the Default deck plus ours.
    fn build_decks_json(&self, now: i64, deck_id: i64) -> String {
        let mut decks: HashMap<String, serde_json::Value> = HashMap::new();
        decks.insert("1".to_string(), deck_json(1, now, "Default", ""));
        decks.insert(
            deck_id.to_string(),
            deck_json(deck_id, now, &self.deck.name, &self.deck.desc),
        );
        serde_json::to_string(&decks).unwrap()
    }
}

fn deck_json(id: i64, now: i64, name: &str, desc: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "mod": now,
        "name": name,
        "usn": -1,
        "lrnToday": [0, 0],
        "revToday": [0, 0],
        "newToday": [0, 0],
        "timeToday": [0, 0],
        "collapsed": false,
        "browserCollapsed": false,
        "desc": desc,
        "dyn": 0,
        "conf": 1,
        "extendNew": 10,
        "extendRev": 50
    })
}

/// Models JSON for the three built-in note models.
fn build_models_json(now: i64) -> String {
    let mut models: HashMap<String, serde_json::Value> = HashMap::new();

    for model in [NoteModel::Basic, NoteModel::BasicReversed, NoteModel::Cloze] {
        let model_id = stable_id(model.name());

        let fields: Vec<serde_json::Value> = MODEL_FIELDS
            .iter()
            .enumerate()
            .map(|(i, name)| {
                serde_json::json!({
                    "name": name,
                    "ord": i,
                    "sticky": false,
                    "rtl": false,
                    "font": "Arial",
                    "size": 20,
                    "media": []
                })
            })
            .collect();

        let templates: Vec<serde_json::Value> = model_templates(model)
            .iter()
            .enumerate()
            .map(|(i, (name, front, back))| {
                serde_json::json!({
                    "name": name,
                    "ord": i,
                    "qfmt": front,
                    "afmt": back,
                    "bqfmt": "",
                    "bafmt": "",
                    "did": null,
                    "bfont": "",
                    "bsize": 0
                })
            })
            .collect();

        // Cloze models are type 1; standard models type 0.
        let model_type = if model == NoteModel::Cloze { 1 } else { 0 };

        models.insert(
            model_id.to_string(),
            serde_json::json!({
                "id": model_id,
                "name": model.name(),
                "type": model_type,
                "mod": now,
                "usn": -1,
                "sortf": 0,
                "did": null,
                "tmpls": templates,
                "flds": fields,
                "css": DEFAULT_CSS,
                "latexPre": "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n",
                "latexPost": "\\end{document}",
                "latexsvg": false,
                "req": model_requirements(model)
            }),
        );
    }

    serde_json::to_string(&models).unwrap()
}

/// Templates per model: (name, front format, back format).
fn model_templates(model: NoteModel) -> Vec<(&'static str, &'static str, &'static str)> {
    match model {
        NoteModel::Basic => vec![(
            "Card 1",
            "{{Front}}",
            "{{FrontSide}}<hr id=answer>{{Back}}",
        )],
        NoteModel::BasicReversed => vec![
            ("Card 1", "{{Front}}", "{{FrontSide}}<hr id=answer>{{Back}}"),
            ("Card 2", "{{Back}}", "{{FrontSide}}<hr id=answer>{{Front}}"),
        ],
        NoteModel::Cloze => vec![("Cloze", "{{cloze:Front}}", "{{cloze:Front}}<br>{{Extra}}")],
    }
}

/// Which field must be non-empty for each template to generate a card.
fn model_requirements(model: NoteModel) -> serde_json::Value {
    match model {
        NoteModel::Basic => serde_json::json!([[0, "any", [0]]]),
        NoteModel::BasicReversed => serde_json::json!([[0, "any", [0]], [1, "any", [1]]]),
        NoteModel::Cloze => serde_json::json!([[0, "any", [0]]]),
    }
}

/// Generate a stable positive id from a name (for models and decks).
fn stable_id(name: &str) -> i64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    (hasher.finish() & 0x7FFF_FFFF_FFFF) as i64
}

/// Base91 note guid, like Anki's.
fn guid(note_id: i64) -> String {
    const CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!#$%&()*+,-./:;<=>?@[]^_`{|}~";
    let mut n = note_id as u64;
    let mut result = String::new();
    while n > 0 {
        result.push(CHARS[(n % 91) as usize] as char);
        n /= 91;
    }
    result
}

/// Checksum of the sort field with HTML tags stripped.
fn checksum(sort_field: &str) -> i64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    strip_html(sort_field).hash(&mut hasher);
    (hasher.finish() & 0xFFFF_FFFF) as i64
}

fn strip_html(s: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}

/// Field names shared by all three built-in models, in `flds` order.
const MODEL_FIELDS: [&str; 5] = ["Front", "Back", "Extra", "Header", "Source"];

/// Field separator inside `notes.flds` (ASCII unit separator).
const FIELD_SEPARATOR: &str = "\x1f";

/// Collection schema, version 11.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS col (
    id INTEGER PRIMARY KEY, crt INTEGER NOT NULL, mod INTEGER NOT NULL,
    scm INTEGER NOT NULL, ver INTEGER NOT NULL, dty INTEGER NOT NULL,
    usn INTEGER NOT NULL, ls INTEGER NOT NULL, conf TEXT NOT NULL,
    models TEXT NOT NULL, decks TEXT NOT NULL, dconf TEXT NOT NULL,
    tags TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY, guid TEXT NOT NULL, mid INTEGER NOT NULL,
    mod INTEGER NOT NULL, usn INTEGER NOT NULL, tags TEXT NOT NULL,
    flds TEXT NOT NULL, sfld INTEGER NOT NULL, csum INTEGER NOT NULL,
    flags INTEGER NOT NULL, data TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS cards (
    id INTEGER PRIMARY KEY, nid INTEGER NOT NULL, did INTEGER NOT NULL,
    ord INTEGER NOT NULL, mod INTEGER NOT NULL, usn INTEGER NOT NULL,
    type INTEGER NOT NULL, queue INTEGER NOT NULL, due INTEGER NOT NULL,
    ivl INTEGER NOT NULL, factor INTEGER NOT NULL, reps INTEGER NOT NULL,
    lapses INTEGER NOT NULL, left INTEGER NOT NULL, odue INTEGER NOT NULL,
    odid INTEGER NOT NULL, flags INTEGER NOT NULL, data TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS revlog (
    id INTEGER PRIMARY KEY, cid INTEGER NOT NULL, usn INTEGER NOT NULL,
    ease INTEGER NOT NULL, ivl INTEGER NOT NULL, lastIvl INTEGER NOT NULL,
    factor INTEGER NOT NULL, time INTEGER NOT NULL, type INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS graves (
    usn INTEGER NOT NULL, oid INTEGER NOT NULL, type INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_notes_usn ON notes (usn);
CREATE INDEX IF NOT EXISTS ix_cards_usn ON cards (usn);
CREATE INDEX IF NOT EXISTS ix_revlog_usn ON revlog (usn);
CREATE INDEX IF NOT EXISTS ix_cards_nid ON cards (nid);
CREATE INDEX IF NOT EXISTS ix_cards_sched ON cards (did, queue, due);
CREATE INDEX IF NOT EXISTS ix_revlog_cid ON revlog (cid);
CREATE INDEX IF NOT EXISTS ix_notes_csum ON notes (csum);
";

/// Default collection configuration.
const DEFAULT_CONF: &str = r#"{"activeDecks":[1],"curDeck":1,"newSpread":0,"collapseTime":1200,"timeLim":0,"estTimes":true,"dueCounts":true,"curModel":null,"nextPos":1,"sortType":"noteFld","sortBackwards":false,"addToCur":true}"#;

/// Default deck options group.
const DEFAULT_DCONF: &str = r#"{"1":{"id":1,"mod":0,"name":"Default","usn":0,"maxTaken":60,"autoplay":true,"timer":0,"replayq":true,"new":{"bury":true,"delays":[1,10],"initialFactor":2500,"ints":[1,4,7],"order":1,"perDay":20,"separate":true},"rev":{"bury":true,"ease4":1.3,"fuzz":0.05,"ivlFct":1,"maxIvl":36500,"perDay":100,"hardFactor":1.2},"lapse":{"delays":[10],"leechAction":0,"leechFails":8,"minInt":1,"mult":0},"dyn":false}}"#;

const DEFAULT_CSS: &str = ".card {\n    font-family: arial;\n    font-size: 20px;\n    text-align: center;\n    color: black;\n    background-color: white;\n}";
