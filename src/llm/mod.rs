pub mod assistant;
pub mod client;
pub mod credentials;
pub mod extract;
pub mod prompts;
pub mod response;
pub mod rotation;

pub use assistant::ask;
pub use client::{OpenAiGenerator, TextGenerator, resolve_model};
pub use credentials::{
    ASSISTANT_KEY_ENV, AuthStore, CredentialPool, CredentialSource, FLASHCARD_KEYS_ENV,
    assistant_key, mask, prompt_for_api_key,
};
pub use extract::{extract_payload, parse_flashcards};
pub use prompts::{DEFAULT_CARD_COUNT, flashcard_prompt};
pub use rotation::{CredentialRotatingGenerator, GenerationError, GenerationReport};
