use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dialoguer::{Password, theme::ColorfulTheme};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::palette::Palette;
use crate::utils::{get_data_dir, strip_controls_and_escapes, trim_line};

pub const FLASHCARD_KEYS_ENV: &str = "GEN_AI_KEY_FLASH";
pub const ASSISTANT_KEY_ENV: &str = "GEN_AI_KEY";

const AUTH_FILE_NAME: &str = "auth.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    AuthFile,
}

impl CredentialSource {
    pub fn description(&self) -> &'static str {
        match self {
            CredentialSource::Environment => "environment variable",
            CredentialSource::AuthFile => "local auth file",
        }
    }
}

/// Ordered, read-only set of API credentials used for flashcard generation.
///
/// Entries are trimmed and never blank. Duplicates are kept, so a key listed
/// twice is tried twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPool {
    keys: Vec<String>,
}

impl CredentialPool {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = keys
            .into_iter()
            .filter_map(|key| trim_line(key.as_ref()).map(str::to_string))
            .collect();
        Self { keys }
    }

    /// Parses a comma-separated list such as `"k1, k2,,k3"`.
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    /// Environment first, then the auth file. An environment value that
    /// parses to nothing does not shadow the auth file.
    pub fn load() -> Result<(Self, Option<CredentialSource>)> {
        let env_value = env::var(FLASHCARD_KEYS_ENV).ok();
        let store = AuthStore::locate()?;
        Self::resolve(env_value.as_deref(), &store)
    }

    fn resolve(
        env_value: Option<&str>,
        store: &AuthStore,
    ) -> Result<(Self, Option<CredentialSource>)> {
        if let Some(raw) = env_value {
            let pool = Self::parse(raw);
            if !pool.is_empty() {
                return Ok((pool, Some(CredentialSource::Environment)));
            }
        }

        let auth = store.read()?.unwrap_or_default();
        let pool = Self::new(&auth.flashcard_keys);
        if pool.is_empty() {
            return Ok((pool, None));
        }
        Ok((pool, Some(CredentialSource::AuthFile)))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// A fresh random ordering of the pool. The pool itself is untouched.
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<&str> {
        let mut order: Vec<&str> = self.keys.iter().map(String::as_str).collect();
        order.shuffle(rng);
        order
    }
}

/// Renders a credential for logs and listings without exposing it.
pub fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("…{tail}")
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct AuthFile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    flashcard_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assistant_key: Option<String>,
}

impl AuthFile {
    fn is_empty(&self) -> bool {
        self.flashcard_keys.is_empty() && self.assistant_key.is_none()
    }
}

/// The `auth.json` file in the data directory.
#[derive(Debug, Clone)]
pub struct AuthStore {
    path: PathBuf,
}

impl AuthStore {
    pub fn locate() -> Result<Self> {
        let data_dir = get_data_dir()?;
        Ok(Self::at(data_dir.join(AUTH_FILE_NAME)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn add_flashcard_key(&self, key: &str) -> Result<usize> {
        let trimmed = trim_line(key).with_context(|| "Cannot store an empty API key")?;
        let mut auth = self.read()?.unwrap_or_default();
        auth.flashcard_keys.push(trimmed.to_string());
        self.write(&auth)?;
        Ok(auth.flashcard_keys.len())
    }

    pub fn clear_flashcard_keys(&self) -> Result<bool> {
        let Some(mut auth) = self.read()? else {
            return Ok(false);
        };
        if auth.flashcard_keys.is_empty() {
            return Ok(false);
        }
        auth.flashcard_keys.clear();
        self.write_or_remove(&auth)?;
        Ok(true)
    }

    pub fn set_assistant_key(&self, key: &str) -> Result<()> {
        let trimmed = trim_line(key).with_context(|| "Cannot store an empty API key")?;
        let mut auth = self.read()?.unwrap_or_default();
        auth.assistant_key = Some(trimmed.to_string());
        self.write(&auth)
    }

    pub fn assistant_key(&self) -> Result<Option<String>> {
        let key = self
            .read()?
            .and_then(|auth| auth.assistant_key)
            .and_then(|key| trim_line(&key).map(str::to_string));
        Ok(key)
    }

    fn read(&self) -> Result<Option<AuthFile>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(parse_auth_contents(&contents, &self.path)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("Failed to read auth file at {}", self.path.display())),
        }
    }

    fn write(&self, value: &AuthFile) -> Result<()> {
        let contents = serialize_auth(value)?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write auth file at {}", self.path.display()))?;
        Ok(())
    }

    fn write_or_remove(&self, value: &AuthFile) -> Result<()> {
        if value.is_empty() {
            fs::remove_file(&self.path).with_context(|| {
                format!(
                    "Failed to remove empty auth file at {}",
                    self.path.display()
                )
            })?;
            return Ok(());
        }
        self.write(value)
    }
}

/// Key for the single-credential study assistant: `GEN_AI_KEY`, then the
/// auth file, then the first flashcard credential.
pub fn assistant_key(pool: &CredentialPool) -> Result<Option<String>> {
    let env_value = env::var(ASSISTANT_KEY_ENV).ok();
    resolve_assistant_key(env_value.as_deref(), &AuthStore::locate()?, pool)
}

fn resolve_assistant_key(
    env_value: Option<&str>,
    store: &AuthStore,
    pool: &CredentialPool,
) -> Result<Option<String>> {
    if let Some(key) = env_value.and_then(trim_line) {
        return Ok(Some(key.to_string()));
    }
    if let Some(key) = store.assistant_key()? {
        return Ok(Some(key));
    }
    Ok(pool.keys().first().cloned())
}

pub fn prompt_for_api_key(prompt: &str) -> Result<String> {
    println!("\n{}", prompt);
    println!(
        "{} to enable AI flashcards. It's stored locally for future use.",
        Palette::paint(Palette::SUCCESS, "Enter your API key")
    );
    println!(
        "{}",
        Palette::dim("Leave the field blank to skip.")
    );
    let raw_password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API Key")
        .allow_empty_password(true)
        .interact()?;

    Ok(strip_controls_and_escapes(&raw_password))
}

fn parse_auth_contents(contents: &str, path: &Path) -> Result<AuthFile> {
    if contents.trim().is_empty() {
        return Ok(AuthFile::default());
    }

    serde_json::from_str(contents)
        .with_context(|| format!("Failed to parse auth file at {}", path.display()))
}

fn serialize_auth(value: &AuthFile) -> Result<String> {
    let contents = serde_json::to_string_pretty(value)?;
    Ok(format!("{}\n", contents))
}
