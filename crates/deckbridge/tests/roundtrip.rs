//! End-to-end conversion tests across the JSON and CSV paths.

use deckbridge::{CardKind, Error, Flashcard, export, import};

#[test]
fn test_csv_round_trip() {
    let cards = vec![
        Flashcard {
            front: "What is the capital of France?".into(),
            back: "Paris".into(),
            extra: "Seine river".into(),
            header: "Geography".into(),
            source: "Atlas p.12".into(),
            tags: vec!["geo".into(), "europe".into()],
            ..Default::default()
        },
        Flashcard::new("2 + 2", "4").kind(CardKind::BasicInverted),
    ];

    let csv = export::to_csv(&cards);
    let imported = import::from_csv(&csv);

    assert_eq!(imported.len(), 2);
    for (original, round_tripped) in cards.iter().zip(&imported) {
        assert_eq!(round_tripped.front, original.front);
        assert_eq!(round_tripped.back, original.back);
        assert_eq!(round_tripped.tags, original.tags);
        assert_eq!(round_tripped.extra, original.extra);
        assert_eq!(round_tripped.header, original.header);
        assert_eq!(round_tripped.source, original.source);
        assert_eq!(round_tripped.kind, original.kind);
    }
}

#[test]
fn test_csv_quoting_round_trip() {
    let tricky = "He said \"hi\", twice";
    let cards = vec![Flashcard::new(tricky, "quoted")];

    let csv = export::to_csv(&cards);
    assert!(csv.contains("\"He said \"\"hi\"\", twice\""));

    let imported = import::from_csv(&csv);
    assert_eq!(imported[0].front, tricky);
}

#[test]
fn test_json_round_trip_with_media() {
    let cards = vec![
        Flashcard::new("picture question", "picture answer")
            .image("data:image/png;base64,QUJD"),
    ];

    let json = export::to_json(&cards, "Media Deck");
    let imported = import::from_json(&json).unwrap();

    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].front, "picture question");
    assert_eq!(imported[0].images, vec!["data:image/png;base64,QUJD"]);
    assert_eq!(imported[0].difficulty.as_deref(), Some("medium"));
}

#[test]
fn test_json_round_trip_kinds() {
    let cards = vec![
        Flashcard::new("b", "1"),
        Flashcard::new("r", "2").kind(CardKind::BasicInverted),
        Flashcard::new("{{c2::x}}", "").cloze(2),
    ];

    let json = export::to_json(&cards, "Kinds");
    let imported = import::from_json(&json).unwrap();

    assert_eq!(imported[0].kind, CardKind::Basic);
    assert_eq!(imported[1].kind, CardKind::BasicInverted);
    assert_eq!(imported[2].kind, CardKind::Cloze);
}

#[test]
fn test_card_count_invariant() {
    let cards = vec![
        Flashcard::new("basic", "a"),
        Flashcard::new("reversed", "b").kind(CardKind::BasicInverted),
        Flashcard::new("{{c2::cloze}}", "").cloze(2),
    ];

    let deck = export::deck_from_cards(&cards, "Counts");
    assert_eq!(deck.notes.len(), 3);
    assert_eq!(deck.cards.len(), 4);

    let cloze_card = deck
        .cards
        .iter()
        .find(|c| c.nid == deck.notes[2].id)
        .unwrap();
    assert_eq!(cloze_card.ord, 1);
}

#[test]
fn test_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deck.txt");
    std::fs::write(&path, "some text").unwrap();

    let err = import::import_file(&path).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));
    assert_eq!(err.to_string(), "Unsupported file format. Use JSON or CSV.");
}

#[test]
fn test_empty_input() {
    let deck = export::deck_from_cards(&[], "Empty");
    assert_eq!(deck.name, "Empty");
    assert!(deck.notes.is_empty());
    assert!(deck.cards.is_empty());
    assert!(deck.media.is_empty());

    assert_eq!(export::to_csv(&[]), "Front,Back,Tags,Type,Extra,Header,Source");
}

#[test]
fn test_field_alias_precedence() {
    // Both alias keys present: the canonical key wins, never merged.
    let card: Flashcard =
        serde_json::from_str(r#"{"front": "A", "question": "B"}"#).unwrap();

    let deck = export::deck_from_cards(&[card], "Precedence");
    assert_eq!(deck.notes[0].fields.front, "A");
}

#[test]
fn test_export_file_write_to_dir() {
    let dir = tempfile::tempdir().unwrap();
    let cards = vec![Flashcard::new("q", "a")];

    let file = export::export_deck(&cards, "Disk Deck", Default::default()).unwrap();
    let path = file.write_to_dir(dir.path()).unwrap();

    assert!(path.exists());
    let imported = import::import_file(&path).unwrap();
    assert_eq!(imported[0].front, "q");
}

#[test]
fn test_ankijson_route_through_import() {
    let cards = vec![Flashcard::new("q", "a")];
    let json = export::to_json(&cards, "Deck");

    let imported = import::import_str("deck.ankijson", &json).unwrap();
    assert_eq!(imported.len(), 1);
}
