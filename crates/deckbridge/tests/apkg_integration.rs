//! Integration tests for .apkg generation.
//!
//! These open the generated package with the same crates used to write it
//! and check the collection contents.

#![cfg(feature = "apkg")]

use std::io::Read;

use deckbridge::{ApkgWriter, CardKind, Flashcard, export, ExportFormat, ExportOptions};
use rusqlite::Connection;

fn sample_cards() -> Vec<Flashcard> {
    vec![
        Flashcard::new("What is 2+2?", "4").tag("math"),
        Flashcard::new("hola", "hello").kind(CardKind::BasicInverted),
        Flashcard::new("The capital of France is {{c1::Paris}}", "").cloze(1),
        Flashcard::new("diagram", "see image").image("data:image/png;base64,iVBORw0KGgo="),
    ]
}

fn extract_collection(apkg: &[u8]) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(apkg)).unwrap();
    let mut db = Vec::new();
    archive
        .by_name("collection.anki2")
        .unwrap()
        .read_to_end(&mut db)
        .unwrap();
    db
}

#[test]
fn test_collection_rows() {
    let bytes = ApkgWriter::from_cards(&sample_cards(), "Integration Deck")
        .to_bytes()
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("collection.anki2");
    std::fs::write(&db_path, extract_collection(&bytes)).unwrap();

    let conn = Connection::open(&db_path).unwrap();

    let notes: i64 = conn
        .query_row("SELECT COUNT(*) FROM notes", [], |r| r.get(0))
        .unwrap();
    assert_eq!(notes, 4);

    // 1 basic + 2 reversed + 1 cloze + 1 basic-with-image.
    let cards: i64 = conn
        .query_row("SELECT COUNT(*) FROM cards", [], |r| r.get(0))
        .unwrap();
    assert_eq!(cards, 5);

    let models: String = conn
        .query_row("SELECT models FROM col", [], |r| r.get(0))
        .unwrap();
    assert!(models.contains("\"Basic\""));
    assert!(models.contains("Basic (and reversed card)"));
    assert!(models.contains("\"Cloze\""));

    let decks: String = conn
        .query_row("SELECT decks FROM col", [], |r| r.get(0))
        .unwrap();
    assert!(decks.contains("Integration Deck"));

    // Tags stored space-joined with surrounding spaces.
    let tags: String = conn
        .query_row("SELECT tags FROM notes ORDER BY id LIMIT 1", [], |r| r.get(0))
        .unwrap();
    assert_eq!(tags, " math ");

    // Fields joined by the unit separator.
    let flds: String = conn
        .query_row("SELECT flds FROM notes ORDER BY id LIMIT 1", [], |r| r.get(0))
        .unwrap();
    assert!(flds.starts_with("What is 2+2?\u{1f}4\u{1f}"));
}

#[test]
fn test_media_manifest() {
    let bytes = ApkgWriter::from_cards(&sample_cards(), "Media Deck")
        .to_bytes()
        .unwrap();

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();

    let mut manifest = String::new();
    archive
        .by_name("media")
        .unwrap()
        .read_to_string(&mut manifest)
        .unwrap();
    let manifest: serde_json::Value = serde_json::from_str(&manifest).unwrap();
    let filename = manifest["0"].as_str().unwrap();
    assert!(filename.starts_with("img_"));
    assert!(filename.ends_with("_0.png"));

    // Entry "0" holds the decoded PNG header bytes.
    let mut payload = Vec::new();
    archive
        .by_name("0")
        .unwrap()
        .read_to_end(&mut payload)
        .unwrap();
    assert_eq!(&payload[..4], b"\x89PNG");
}

#[test]
fn test_export_deck_apkg_format() {
    let file = export::export_deck(
        &sample_cards(),
        "My Deck",
        ExportOptions {
            format: ExportFormat::Apkg,
        },
    )
    .unwrap();

    assert!(file.filename.starts_with("My_Deck_"));
    assert!(file.filename.ends_with(".apkg"));
    assert_eq!(file.mime_type, "application/apkg");

    // Content is a readable ZIP.
    let archive = zip::ZipArchive::new(std::io::Cursor::new(file.content)).unwrap();
    let names: Vec<_> = archive.file_names().collect();
    assert!(names.contains(&"collection.anki2"));
    assert!(names.contains(&"media"));
}
