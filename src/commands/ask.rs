use anyhow::{Result, anyhow};

use crate::llm::{
    ASSISTANT_KEY_ENV, CredentialPool, OpenAiGenerator, assistant_key, ask, resolve_model,
};

pub async fn run(question: &str, model: Option<String>) -> Result<()> {
    let (pool, _) = CredentialPool::load()?;
    let key = assistant_key(&pool)?.ok_or_else(|| {
        anyhow!(
            "The study assistant is disabled. To enable, set {} or run `bluestudy keys --assistant <KEY>`.",
            ASSISTANT_KEY_ENV
        )
    })?;

    let backend = OpenAiGenerator::from_env();
    let answer = ask(&backend, &key, &resolve_model(model), question).await;
    println!("{answer}");
    Ok(())
}
