use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::deck::{DEFAULT_TOPIC, append_cards};
use crate::flashcard::Flashcard;
use crate::llm::{
    CredentialPool, CredentialRotatingGenerator, OpenAiGenerator, TextGenerator,
    flashcard_prompt, resolve_model,
};
use crate::palette::Palette;
use crate::utils::{pluralize, trim_line};

pub const EXHAUSTED_MESSAGE: &str = "All AI keys failed, please try again later";

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub count: usize,
    pub prompt: Option<String>,
    pub save: Option<PathBuf>,
    pub json: bool,
}

impl GenerateRequest {
    fn prompt(&self) -> Result<String> {
        if let Some(prompt) = self.prompt.as_deref().and_then(trim_line) {
            return Ok(prompt.to_string());
        }
        let subject = self.subject.as_deref().and_then(trim_line);
        let topic = self.topic.as_deref().and_then(trim_line);
        match (subject, topic) {
            (Some(subject), Some(topic)) => Ok(flashcard_prompt(subject, topic, self.count)),
            _ => bail!("Provide --subject and --topic, or a full --prompt."),
        }
    }

    fn deck_topic(&self) -> &str {
        self.topic
            .as_deref()
            .and_then(trim_line)
            .or_else(|| self.subject.as_deref().and_then(trim_line))
            .unwrap_or(DEFAULT_TOPIC)
    }
}

pub async fn run(request: GenerateRequest, model: Option<String>) -> Result<()> {
    let (pool, source) = CredentialPool::load()?;
    if let Some(source) = source {
        info!(
            keys = pool.len(),
            source = source.description(),
            "Loaded flashcard API keys"
        );
    }

    let generator = CredentialRotatingGenerator::new(
        Arc::new(pool),
        OpenAiGenerator::from_env(),
        resolve_model(model),
    );
    let output = generate(&generator, &request).await?;
    print!("{output}");
    Ok(())
}

/// Runs one generation and returns what should be printed.
pub async fn generate<G: TextGenerator>(
    generator: &CredentialRotatingGenerator<G>,
    request: &GenerateRequest,
) -> Result<String> {
    let prompt = request.prompt()?;
    let report = generator.generate_with_report(&prompt).await;
    if let Some(failure) = report.failure() {
        warn!(error = %failure, "Flashcard generation gave up");
        bail!(EXHAUSTED_MESSAGE);
    }
    let cards = report.cards;

    let mut output = if request.json {
        format!("{}\n", serde_json::to_string_pretty(&cards)?)
    } else {
        render_cards(&cards)
    };

    if let Some(deck) = &request.save {
        let topic = request.deck_topic();
        append_cards(deck, topic, &cards)?;
        if !request.json {
            output.push_str(&format!(
                "\nSaved {} to {} under \"{}\".\n",
                pluralize("flashcard", cards.len()),
                Palette::paint(Palette::ACCENT, deck.display()),
                topic
            ));
        }
    }

    Ok(output)
}

fn render_cards(cards: &[Flashcard]) -> String {
    let mut out = String::new();
    for (idx, card) in cards.iter().enumerate() {
        out.push_str(&format!(
            "{} {}\n   {}\n",
            Palette::paint(Palette::INFO, format!("{:>2}.", idx + 1)),
            card.front,
            Palette::dim(&card.back)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use async_trait::async_trait;
    use tempfile::tempdir;

    use super::*;
    use crate::deck::read_deck;

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl TextGenerator for Fixed {
        async fn complete(&self, _credential: &str, _model: &str, prompt: &str) -> Result<String> {
            assert!(prompt.contains("Photosynthesis") || prompt == "custom prompt");
            self.0
                .map(str::to_string)
                .ok_or_else(|| anyhow!("429 Too Many Requests"))
        }
    }

    fn request() -> GenerateRequest {
        GenerateRequest {
            subject: Some("Biology".into()),
            topic: Some("Photosynthesis".into()),
            count: 5,
            prompt: None,
            save: None,
            json: false,
        }
    }

    fn generator(reply: Option<&'static str>) -> CredentialRotatingGenerator<Fixed> {
        CredentialRotatingGenerator::new(
            Arc::new(CredentialPool::parse("k1,k2")),
            Fixed(reply),
            "test-model",
        )
    }

    const REPLY: &str = "```json\n[{\"front\":\"Where?\",\"back\":\"Chloroplast\"}]\n```";

    #[tokio::test]
    async fn prints_numbered_cards() {
        let output = generate(&generator(Some(REPLY)), &request()).await.unwrap();
        assert!(output.contains("Where?"));
        assert!(output.contains("Chloroplast"));
    }

    #[tokio::test]
    async fn json_output_is_parseable() {
        let mut request = request();
        request.json = true;
        let output = generate(&generator(Some(REPLY)), &request).await.unwrap();
        let cards: Vec<Flashcard> = serde_json::from_str(&output).unwrap();
        assert_eq!(cards, vec![Flashcard::new("Where?", "Chloroplast").unwrap()]);
    }

    #[tokio::test]
    async fn exhausted_pool_is_an_error() {
        let err = generate(&generator(None), &request()).await.unwrap_err();
        assert_eq!(err.to_string(), EXHAUSTED_MESSAGE);
    }

    #[tokio::test]
    async fn saves_under_topic() {
        let dir = tempdir().unwrap();
        let deck = dir.path().join("bio.md");
        let mut request = request();
        request.save = Some(deck.clone());

        generate(&generator(Some(REPLY)), &request).await.unwrap();

        let groups = read_deck(&deck).unwrap();
        assert_eq!(groups[0].topic, "Photosynthesis");
        assert_eq!(groups[0].cards.len(), 1);
    }

    #[tokio::test]
    async fn explicit_prompt_skips_subject() {
        let request = GenerateRequest {
            subject: None,
            topic: None,
            prompt: Some("custom prompt".into()),
            ..request()
        };
        assert!(generate(&generator(Some(REPLY)), &request).await.is_ok());
    }

    #[test]
    fn missing_subject_is_rejected() {
        let request = GenerateRequest {
            subject: None,
            ..request()
        };
        assert!(request.prompt().is_err());
    }
}
