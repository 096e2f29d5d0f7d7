use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::flashcard::Flashcard;

// Leftmost bracketed span, greedy across newlines. Not balanced: prose
// brackets around the payload get swallowed too.
static PAYLOAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)(\[.*\]|\{.*\})").expect("payload pattern is a valid regex")
});

#[derive(Deserialize)]
#[serde(untagged)]
enum FlashcardPayload {
    Many(Vec<Flashcard>),
    One(Flashcard),
}

impl FlashcardPayload {
    fn into_cards(self) -> Vec<Flashcard> {
        match self {
            FlashcardPayload::Many(cards) => cards,
            FlashcardPayload::One(card) => vec![card],
        }
    }
}

/// Returns the candidate JSON span inside a model response, or the whole
/// text when it contains no `[...]` or `{...}` span.
pub fn extract_payload(text: &str) -> &str {
    PAYLOAD_RE
        .find(text)
        .map(|found| found.as_str())
        .unwrap_or(text)
}

/// Parses a model response into flashcards.
///
/// The trimmed text is first read as strict JSON; only when that fails is
/// the bracket-scanned span used. Every card must have a non-blank `front`
/// and `back`, and at least one card must be present.
pub fn parse_flashcards(text: &str) -> Result<Vec<Flashcard>> {
    let trimmed = text.trim();
    let payload = match serde_json::from_str::<FlashcardPayload>(trimmed) {
        Ok(payload) => payload,
        Err(_) => {
            let candidate = extract_payload(trimmed);
            serde_json::from_str::<FlashcardPayload>(candidate)
                .with_context(|| "Response does not contain a flashcard JSON payload")?
        }
    };

    let cards = payload.into_cards();
    if cards.is_empty() {
        bail!("Response contained an empty flashcard list");
    }
    if let Some(position) = cards.iter().position(|card| !card.is_populated()) {
        bail!("Flashcard {} is missing its front or back text", position + 1);
    }

    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn extracts_array_from_fenced_prose() {
        let raw = "Sure! Here you go:\n```json\n[{\"front\":\"Q1\",\"back\":\"A1\"}]\n```";
        assert_eq!(extract_payload(raw), r#"[{"front":"Q1","back":"A1"}]"#);

        let cards = parse_flashcards(raw).unwrap();
        assert_eq!(cards, vec![Flashcard::new("Q1", "A1").unwrap()]);
    }

    #[test]
    fn extraction_spans_lines_greedily() {
        let raw = "cards:\n[\n  {\"front\": \"a\", \"back\": \"b\"},\n  {\"front\": \"c\", \"back\": \"d\"}\n]\nthanks";
        let extracted = extract_payload(raw);
        assert!(extracted.starts_with('['));
        assert!(extracted.ends_with(']'));
        assert_eq!(parse_flashcards(raw).unwrap().len(), 2);
    }

    #[test]
    fn falls_back_to_object_span() {
        let raw = "Here: {\"front\": \"X\", \"back\": \"Y\"} done";
        assert_eq!(extract_payload(raw), r#"{"front": "X", "back": "Y"}"#);
        assert_eq!(
            parse_flashcards(raw).unwrap(),
            vec![Flashcard::new("X", "Y").unwrap()]
        );
    }

    #[test]
    fn leftmost_opener_wins() {
        let raw = "{note} then [1]";
        assert_eq!(extract_payload(raw), "{note}");
    }

    #[test]
    fn no_brackets_returns_raw_text() {
        let raw = "I cannot help with that.";
        assert_eq!(extract_payload(raw), raw);
        assert!(parse_flashcards(raw).is_err());
    }

    #[test]
    fn over_capture_fails_to_parse() {
        let raw = "[draft] [{\"front\":\"Q\",\"back\":\"A\"}]";
        assert_eq!(extract_payload(raw), raw);
        assert!(parse_flashcards(raw).is_err());
    }

    #[test]
    fn rejects_blank_sides() {
        let raw = r#"[{"front":"Q","back":"A"},{"front":"  ","back":"B"}]"#;
        assert!(parse_flashcards(raw).is_err());
    }

    #[test]
    fn rejects_missing_fields() {
        assert!(parse_flashcards(r#"[{"front":"Q"}]"#).is_err());
        assert!(parse_flashcards(r#"[{"question":"Q","answer":"A"}]"#).is_err());
    }

    #[test]
    fn rejects_empty_list() {
        assert!(parse_flashcards("[]").is_err());
    }

    #[test]
    fn ignores_extra_fields() {
        let raw = r#"[{"front":"Q","back":"A","hint":"h"}]"#;
        assert_eq!(parse_flashcards(raw).unwrap().len(), 1);
    }

    proptest! {
        #[test]
        fn extraction_is_idempotent(text in "\\PC*") {
            let once = extract_payload(&text);
            prop_assert_eq!(extract_payload(once), once);
        }

        #[test]
        fn clean_json_is_unchanged(
            sides in prop::collection::vec(("[a-zA-Z0-9 ?]{1,20}", "[a-zA-Z0-9 .]{1,20}"), 1..6)
        ) {
            let cards: Vec<Flashcard> = sides
                .iter()
                .map(|(front, back)| Flashcard { front: front.clone(), back: back.clone() })
                .collect();
            let json = serde_json::to_string(&cards).unwrap();
            prop_assert_eq!(extract_payload(&json), json.as_str());
        }
    }
}
