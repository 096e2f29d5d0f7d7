pub const DEFAULT_CARD_COUNT: usize = 5;

const MAX_WORDS_PER_SIDE: usize = 20;
const MAX_ASSISTANT_WORDS: usize = 150;

pub fn flashcard_prompt(subject: &str, topic: &str, count: usize) -> String {
    format!(
        "Generate {count} short flashcards for {subject}: {topic}.\n\
         Keep 'front' and 'back' text under {MAX_WORDS_PER_SIDE} words each.\n\
         Return ONLY a JSON array.\n\
         Format: [{{\"front\": \"Q\", \"back\": \"A\"}}]",
        subject = subject.trim(),
        topic = topic.trim(),
    )
}

pub fn assistant_prompt(question: &str) -> String {
    format!(
        "System: You are a concise study assistant. Answer in under {MAX_ASSISTANT_WORDS} words.\n\
         User Question: {}",
        question.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flashcard_prompt_interpolates_parameters() {
        let prompt = flashcard_prompt(" Biology ", "Cell respiration", 5);
        assert!(prompt.starts_with("Generate 5 short flashcards for Biology: Cell respiration."));
        assert!(prompt.contains("Return ONLY a JSON array."));
        assert!(prompt.contains(r#"[{"front": "Q", "back": "A"}]"#));
    }

    #[test]
    fn assistant_prompt_carries_question() {
        let prompt = assistant_prompt("  What is ATP?\n");
        assert!(prompt.contains("under 150 words"));
        assert!(prompt.ends_with("User Question: What is ATP?"));
    }
}
