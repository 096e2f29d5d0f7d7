use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::utils::trim_line;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

impl Flashcard {
    pub fn new(front: &str, back: &str) -> Result<Self> {
        let Some(front) = trim_line(front) else {
            bail!("Invalid flashcard: front must not be empty");
        };
        let Some(back) = trim_line(back) else {
            bail!("Invalid flashcard: back must not be empty");
        };

        Ok(Self {
            front: front.to_string(),
            back: back.to_string(),
        })
    }

    /// Both sides carry text once surrounding whitespace is removed.
    pub fn is_populated(&self) -> bool {
        trim_line(&self.front).is_some() && trim_line(&self.back).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_sides() {
        let card = Flashcard::new("  What is Rust? ", "\tA language\n").unwrap();
        assert_eq!(card.front, "What is Rust?");
        assert_eq!(card.back, "A language");
    }

    #[test]
    fn new_rejects_blank_sides() {
        assert!(Flashcard::new("   ", "answer").is_err());
        assert!(Flashcard::new("question", "").is_err());
    }

    #[test]
    fn populated_requires_both_sides() {
        let card = Flashcard {
            front: "Q".into(),
            back: " ".into(),
        };
        assert!(!card.is_populated());
    }
}
