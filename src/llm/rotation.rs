use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, warn};

use super::client::TextGenerator;
use super::credentials::{CredentialPool, mask};
use super::extract::parse_flashcards;
use crate::flashcard::Flashcard;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("model call failed: {0}")]
    CallFailed(String),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("no credential produced flashcards ({attempts} tried)")]
    PoolExhausted { attempts: usize },
}

/// One credential's try. The credential is stored masked.
#[derive(Debug)]
pub struct GenerationAttempt {
    pub credential: String,
    pub outcome: Result<usize, GenerationError>,
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    pub cards: Vec<Flashcard>,
    pub attempts: Vec<GenerationAttempt>,
}

impl GenerationReport {
    pub fn failure(&self) -> Option<GenerationError> {
        if self.cards.is_empty() {
            Some(GenerationError::PoolExhausted {
                attempts: self.attempts.len(),
            })
        } else {
            None
        }
    }
}

/// Tries every credential of the pool once, in a fresh random order, until
/// one returns a parseable flashcard payload.
///
/// Attempts run one after another; there is no fan-out across credentials.
/// Failures never escape: an exhausted or empty pool yields no cards.
pub struct CredentialRotatingGenerator<G> {
    pool: Arc<CredentialPool>,
    backend: G,
    model: String,
}

impl<G: TextGenerator> CredentialRotatingGenerator<G> {
    pub fn new(pool: Arc<CredentialPool>, backend: G, model: impl Into<String>) -> Self {
        Self {
            pool,
            backend,
            model: model.into(),
        }
    }

    pub async fn generate(&self, prompt: &str) -> Vec<Flashcard> {
        self.generate_with_report(prompt).await.cards
    }

    pub async fn generate_with_report(&self, prompt: &str) -> GenerationReport {
        let mut report = GenerationReport::default();
        if self.pool.is_empty() {
            error!("No flashcard API keys configured; skipping generation");
            return report;
        }

        let order = self.pool.shuffled(&mut rand::rng());
        for (idx, credential) in order.into_iter().enumerate() {
            let masked = mask(credential);
            let outcome = self.attempt(credential, prompt).await;

            match outcome {
                Ok(cards) => {
                    debug!(
                        attempt = idx + 1,
                        credential = %masked,
                        cards = cards.len(),
                        "Flashcards accepted"
                    );
                    report.attempts.push(GenerationAttempt {
                        credential: masked,
                        outcome: Ok(cards.len()),
                    });
                    report.cards = cards;
                    return report;
                }
                Err(err) => {
                    warn!(
                        attempt = idx + 1,
                        credential = %masked,
                        error = %err,
                        "Key failed or rate limited, trying next"
                    );
                    report.attempts.push(GenerationAttempt {
                        credential: masked,
                        outcome: Err(err),
                    });
                }
            }
        }

        warn!(attempts = report.attempts.len(), "All flashcard API keys failed");
        report
    }

    async fn attempt(
        &self,
        credential: &str,
        prompt: &str,
    ) -> Result<Vec<Flashcard>, GenerationError> {
        let text = self
            .backend
            .complete(credential, &self.model, prompt)
            .await
            .map_err(|err| GenerationError::CallFailed(format!("{err:#}")))?;

        parse_flashcards(&text)
            .map_err(|err| GenerationError::MalformedPayload(format!("{err:#}")))
    }
}
