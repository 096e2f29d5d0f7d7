use std::path::Path;

use anyhow::Result;

use crate::deck::{TopicGroup, read_deck, remove_card};
use crate::palette::Palette;
use crate::utils::pluralize;

pub fn run(deck: &Path, delete: Option<usize>) -> Result<()> {
    if let Some(position) = delete {
        let removed = remove_card(deck, position)?;
        println!(
            "Removed card {}: {}",
            position,
            Palette::paint(Palette::WARNING, &removed.front)
        );
        return Ok(());
    }

    let groups = read_deck(deck)?;
    print!("{}", render_library(&groups));
    Ok(())
}

/// Cards are numbered across topics, matching the positions `--delete` takes.
pub fn render_library(groups: &[TopicGroup]) -> String {
    if groups.is_empty() {
        return format!("{}\n", Palette::dim("No saved flashcards yet."));
    }

    let mut out = String::new();
    let mut position = 0;
    for group in groups {
        out.push_str(&format!(
            "{} {}\n",
            Palette::paint(Palette::ACCENT, &group.topic),
            Palette::dim(format!("({})", pluralize("card", group.cards.len())))
        ));
        for card in &group.cards {
            position += 1;
            out.push_str(&format!(
                "  {} {}\n     {}\n",
                Palette::paint(Palette::INFO, format!("{position:>2}.")),
                card.front,
                Palette::dim(&card.back)
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcard::Flashcard;

    #[test]
    fn empty_library_message() {
        assert!(render_library(&[]).contains("No saved flashcards yet."));
    }

    #[test]
    fn numbers_cards_across_topics() {
        let groups = vec![
            TopicGroup {
                topic: "Cells".into(),
                cards: vec![Flashcard::new("Q1", "A1").unwrap()],
            },
            TopicGroup {
                topic: "Genetics".into(),
                cards: vec![
                    Flashcard::new("Q2", "A2").unwrap(),
                    Flashcard::new("Q3", "A3").unwrap(),
                ],
            },
        ];
        let rendered = render_library(&groups);
        assert!(rendered.contains("1 card"));
        assert!(rendered.contains("2 cards"));
        assert!(rendered.contains(" 3.\x1b[0m Q3"));
    }
}
