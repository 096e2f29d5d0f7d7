use tracing::error;

use super::client::TextGenerator;
use super::prompts::assistant_prompt;
use crate::utils::trim_line;

pub const UNAVAILABLE_REPLY: &str = "Sorry, I couldn't process your request at the moment.";
pub const EMPTY_QUESTION_REPLY: &str = "No prompt provided.";

/// Single-credential study assistant. Never fails: errors become a fixed
/// apology.
pub async fn ask<G: TextGenerator + ?Sized>(
    backend: &G,
    credential: &str,
    model: &str,
    question: &str,
) -> String {
    let Some(question) = trim_line(question) else {
        return EMPTY_QUESTION_REPLY.to_string();
    };

    match backend
        .complete(credential, model, &assistant_prompt(question))
        .await
    {
        Ok(answer) => answer,
        Err(err) => {
            error!(error = %format!("{err:#}"), "Error while calling the study assistant");
            UNAVAILABLE_REPLY.to_string()
        }
    }
}
