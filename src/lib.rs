pub mod commands;
pub mod deck;
pub mod flashcard;
pub mod llm;
pub mod palette;
pub mod utils;

pub use flashcard::Flashcard;
pub use llm::{CredentialPool, CredentialRotatingGenerator, TextGenerator};
