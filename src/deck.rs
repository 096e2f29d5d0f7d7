//! Markdown decks holding saved flashcards.
//!
//! A deck is a list of `# topic` headings, each followed by `Q:`/`A:` blocks
//! separated by blank lines. Cards before the first heading belong to
//! [`DEFAULT_TOPIC`].
//!
//! Card text is stored one trimmed line per line with blank lines dropped.
//! A continuation line that would read as structure (`#`, `Q:`, `A:`) or
//! that starts with `\` is written with a leading `\`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::flashcard::Flashcard;
use crate::utils::{is_markdown, trim_line};

pub const DEFAULT_TOPIC: &str = "General";

const ESCAPE: char = '\\';

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicGroup {
    pub topic: String,
    pub cards: Vec<Flashcard>,
}

impl TopicGroup {
    fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            cards: Vec::new(),
        }
    }
}

fn ensure_markdown(path: &Path) -> Result<()> {
    if !is_markdown(path) {
        bail!("Deck path must be a markdown file: {}", path.display());
    }
    Ok(())
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(file)
}

/// Appends `cards` under a fresh `# topic` heading.
pub fn append_cards(path: &Path, topic: &str, cards: &[Flashcard]) -> Result<()> {
    ensure_markdown(path)?;
    if cards.is_empty() {
        return Ok(());
    }

    let topic = trim_line(topic).unwrap_or(DEFAULT_TOPIC);
    let existing_len = fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    let mut file = create_file(path)
        .with_context(|| format!("Failed to open deck at {}", path.display()))?;
    if existing_len > 0 {
        writeln!(file)?;
    }
    writeln!(file, "# {topic}")?;
    for card in cards {
        writeln!(file)?;
        writeln!(file, "{}", card_block(card))?;
    }

    Ok(())
}

pub fn read_deck(path: &Path) -> Result<Vec<TopicGroup>> {
    ensure_markdown(path)?;
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Failed to read deck at {}", path.display()));
        }
    };

    parse_deck(&contents).with_context(|| format!("Invalid deck at {}", path.display()))
}

/// Removes the card at 1-based `position` (in listing order) and rewrites
/// the deck.
pub fn remove_card(path: &Path, position: usize) -> Result<Flashcard> {
    let mut groups = read_deck(path)?;

    let mut remaining = position;
    let mut removed = None;
    if remaining > 0 {
        for group in &mut groups {
            if remaining <= group.cards.len() {
                removed = Some(group.cards.remove(remaining - 1));
                break;
            }
            remaining -= group.cards.len();
        }
    }
    let Some(removed) = removed else {
        bail!("No card at position {position} in {}", path.display());
    };

    groups.retain(|group| !group.cards.is_empty());
    fs::write(path, render_deck(&groups))
        .with_context(|| format!("Failed to write deck at {}", path.display()))?;

    Ok(removed)
}

#[derive(Copy, Clone)]
enum Section {
    Question,
    Answer,
    None,
}

#[derive(Default)]
struct PendingCard {
    start_line: usize,
    question: Vec<String>,
    answer: Vec<String>,
}

fn parse_deck(contents: &str) -> Result<Vec<TopicGroup>> {
    let mut groups: Vec<TopicGroup> = Vec::new();
    let mut topic = DEFAULT_TOPIC.to_string();
    let mut pending: Option<PendingCard> = None;
    let mut section = Section::None;

    for (line_idx, raw_line) in contents.lines().enumerate() {
        let Some(line) = trim_line(raw_line) else {
            flush(&mut groups, &topic, pending.take())?;
            section = Section::None;
            continue;
        };

        if let Some(heading) = line.strip_prefix("# ") {
            flush(&mut groups, &topic, pending.take())?;
            section = Section::None;
            topic = trim_line(heading).unwrap_or(DEFAULT_TOPIC).to_string();
            continue;
        }

        if let Some(rest) = line.strip_prefix("Q:") {
            flush(&mut groups, &topic, pending.take())?;
            let mut card = PendingCard {
                start_line: line_idx + 1,
                ..PendingCard::default()
            };
            card.question.extend(trim_line(rest).map(str::to_string));
            pending = Some(card);
            section = Section::Question;
            continue;
        }

        let Some(card) = pending.as_mut() else {
            bail!("Line {}: text outside of a card: {line}", line_idx + 1);
        };

        if let Some(rest) = line.strip_prefix("A:") {
            card.answer.clear();
            card.answer.extend(trim_line(rest).map(str::to_string));
            section = Section::Answer;
            continue;
        }

        match section {
            Section::Question => card.question.push(decode_line(line).to_string()),
            Section::Answer => card.answer.push(decode_line(line).to_string()),
            Section::None => {}
        }
    }
    flush(&mut groups, &topic, pending.take())?;

    Ok(groups)
}

fn flush(
    groups: &mut Vec<TopicGroup>,
    topic: &str,
    pending: Option<PendingCard>,
) -> Result<()> {
    let Some(pending) = pending else {
        return Ok(());
    };

    let card = Flashcard::new(&pending.question.join("\n"), &pending.answer.join("\n"))
        .with_context(|| format!("Incomplete card starting at line {}", pending.start_line))?;

    match groups.iter_mut().find(|group| group.topic == topic) {
        Some(group) => group.cards.push(card),
        None => {
            let mut group = TopicGroup::new(topic);
            group.cards.push(card);
            groups.push(group);
        }
    }
    Ok(())
}

fn needs_escape(line: &str) -> bool {
    line.starts_with('#')
        || line.starts_with("Q:")
        || line.starts_with("A:")
        || line.starts_with(ESCAPE)
}

fn encode_side(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (idx, line) in text.lines().filter_map(trim_line).enumerate() {
        if idx > 0 {
            out.push('\n');
            if needs_escape(line) {
                out.push(ESCAPE);
            }
        }
        out.push_str(line);
    }
    out
}

fn decode_line(line: &str) -> &str {
    line.strip_prefix(ESCAPE).unwrap_or(line)
}

fn card_block(card: &Flashcard) -> String {
    format!(
        "Q: {}\nA: {}",
        encode_side(&card.front),
        encode_side(&card.back)
    )
}

fn render_deck(groups: &[TopicGroup]) -> String {
    let mut out = String::new();
    for group in groups {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("# {}\n", group.topic));
        for card in &group.cards {
            out.push('\n');
            out.push_str(&card_block(card));
            out.push('\n');
        }
    }
    out
}
