use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueHint};
use tracing_subscriber::{EnvFilter, fmt};

use bluestudy::commands::generate::GenerateRequest;
use bluestudy::commands::{ask, generate, library};
use bluestudy::llm::{
    self, AuthStore, CredentialPool, DEFAULT_CARD_COUNT, FLASHCARD_KEYS_ENV, OpenAiGenerator,
};
use bluestudy::palette::Palette;
use bluestudy::utils::pluralize;

const DEFAULT_LOG_FILTER: &str = "bluestudy=warn";

#[derive(Parser, Debug)]
#[command(
    name = "bluestudy",
    version,
    about = "AI flashcards and a study assistant for the terminal.",
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true,
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate flashcards, rotating through the configured API keys
    Generate {
        /// Subject, e.g. "Biology"
        #[arg(long, required_unless_present = "prompt")]
        subject: Option<String>,
        /// Topic within the subject, e.g. "Photosynthesis"
        #[arg(long, required_unless_present = "prompt")]
        topic: Option<String>,
        /// Number of flashcards to ask for
        #[arg(long, default_value_t = DEFAULT_CARD_COUNT)]
        count: usize,
        /// Send this prompt verbatim instead of the built-in flashcard prompt
        #[arg(long)]
        prompt: Option<String>,
        /// Model identifier
        #[arg(long)]
        model: Option<String>,
        /// Append the generated cards to this markdown deck
        #[arg(long, value_name = "DECK", value_hint = ValueHint::FilePath)]
        save: Option<PathBuf>,
        /// Print the cards as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Ask the study assistant a question
    Ask {
        #[arg(value_name = "QUESTION", num_args = 1.., required = true)]
        question: Vec<String>,
        /// Model identifier
        #[arg(long)]
        model: Option<String>,
    },
    /// List the flashcards saved in a deck
    Library {
        #[arg(value_name = "DECK", value_hint = ValueHint::FilePath)]
        deck: PathBuf,
        /// Remove the card at this position instead of listing
        #[arg(long, value_name = "N")]
        delete: Option<usize>,
    },
    /// Manage API keys
    Keys {
        /// Add a flashcard API key to the local auth file. Prompts when no key is given.
        #[arg(long, value_name = "KEY", num_args = 0..=1, conflicts_with = "clear")]
        add: Option<Option<String>>,
        /// Store the study assistant's API key in the local auth file
        #[arg(long, value_name = "KEY")]
        assistant: Option<String>,
        /// Remove all stored flashcard API keys
        #[arg(long)]
        clear: bool,
        /// Show the configured flashcard keys, masked
        #[arg(long)]
        list: bool,
        /// Check every configured flashcard key against the API
        #[arg(long, conflicts_with = "clear")]
        test: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run_cli().await {
        eprintln!("{:?}", err);
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate {
            subject,
            topic,
            count,
            prompt,
            model,
            save,
            json,
        } => {
            let request = GenerateRequest {
                subject,
                topic,
                count,
                prompt,
                save,
                json,
            };
            generate::run(request, model).await?;
        }
        Command::Ask { question, model } => {
            ask::run(&question.join(" "), model).await?;
        }
        Command::Library { deck, delete } => library::run(&deck, delete)?,
        Command::Keys {
            add,
            assistant,
            clear,
            list,
            test,
        } => handle_keys_command(add, assistant, clear, list, test).await?,
    }

    Ok(())
}

async fn handle_keys_command(
    add: Option<Option<String>>,
    assistant: Option<String>,
    clear: bool,
    list: bool,
    test: bool,
) -> Result<()> {
    let store = AuthStore::locate()?;
    let mut action_taken = false;

    if let Some(key) = add {
        let key = match key {
            Some(key) => key,
            None => llm::prompt_for_api_key("Add a key to the flashcard rotation.")?,
        };
        if key.trim().is_empty() {
            println!("No key entered; nothing stored.");
        } else {
            let total = store.add_flashcard_key(&key)?;
            println!(
                "Stored flashcard API key {} ({} in the local auth file).",
                llm::mask(key.trim()),
                pluralize("key", total)
            );
        }
        action_taken = true;
    }

    if let Some(key) = assistant {
        store.set_assistant_key(&key)?;
        println!("Stored the study assistant API key in the local auth file.");
        action_taken = true;
    }

    if clear {
        if store.clear_flashcard_keys()? {
            println!("Removed the stored flashcard API keys.");
        } else {
            println!("No flashcard API keys found in the auth file.");
        }
        action_taken = true;
    }

    if list || test {
        let (pool, source) = CredentialPool::load()?;
        let Some(source) = source else {
            bail!(
                "No flashcard API keys configured. Set {} or run `bluestudy keys --add <KEY>`.",
                FLASHCARD_KEYS_ENV
            );
        };
        println!(
            "{} from the {}:",
            pluralize("flashcard key", pool.len()),
            source.description()
        );

        let backend = OpenAiGenerator::from_env();
        let mut valid = 0;
        for (idx, key) in pool.keys().iter().enumerate() {
            let status = if test {
                match backend.healthcheck(key).await {
                    Ok(()) => {
                        valid += 1;
                        Palette::paint(Palette::SUCCESS, "valid")
                    }
                    Err(err) => Palette::paint(Palette::DANGER, format!("failed: {err:#}")),
                }
            } else {
                String::new()
            };
            println!("  {:>2}. {} {}", idx + 1, llm::mask(key), status);
        }

        if test && valid == 0 {
            bail!("None of the configured flashcard API keys are valid.");
        }
        action_taken = true;
    }

    if !action_taken {
        bail!("No action provided. Use --add, --assistant, --clear, --list, or --test.");
    }
    Ok(())
}
