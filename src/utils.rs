use std::path::Path;

use anyhow::{Result, anyhow};
use directories::ProjectDirs;

pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

pub fn trim_line(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

pub fn pluralize(word: &str, count: usize) -> String {
    pluralize_with(word, count, |n| n.to_string())
}

pub fn pluralize_with<F>(word: &str, count: usize, format_count: F) -> String
where
    F: Fn(usize) -> String,
{
    let count_str = format_count(count);

    if count == 1 {
        format!("{count_str} {word}")
    } else {
        format!("{count_str} {word}s")
    }
}

pub fn strip_controls_and_escapes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            // ANSI escape sequence (ESC … letter)
            '\x1b' => {
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }

            c if c.is_control() => {}

            c => out.push(c),
        }
    }

    out.trim().to_string()
}

pub fn get_data_dir() -> Result<std::path::PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "bluestudy")
        .ok_or_else(|| anyhow!("Could not determine project directory"))?;

    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_controls_and_escapes() {
        let input = "\x1b[1mkey-123\x1b[0m\r";
        assert_eq!(strip_controls_and_escapes(input), "key-123");
    }

    #[test]
    fn test_is_markdown() {
        assert!(is_markdown(Path::new("biology.md")));
        assert!(is_markdown(Path::new("decks/Chem.MD")));
        assert!(!is_markdown(Path::new("biology.txt")));
    }

    #[test]
    fn test_trim_line() {
        assert_eq!(trim_line("  k1 "), Some("k1"));
        assert_eq!(trim_line(" \t "), None);
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("flashcard", 1), "1 flashcard");
        assert_eq!(pluralize("flashcard", 5), "5 flashcards");
        assert_eq!(pluralize("key", 0), "0 keys");
    }
}
