mod gateway;
mod replies;

use clap::{Parser, Subcommand};
use gateway::{handoff, Gateway, Platforms};
use kondate_channels::{LineChannel, SlackChannel};
use kondate_core::{
    config::{self, shellexpand, Config},
    error::KondateError,
    intent::{self, Intent},
    message::Platform,
    prompt::{build_prompt, PromptTemplate},
    traits::{CompletionRequest, Provider},
};
use kondate_memory::Store;
use kondate_providers::{AnthropicProvider, OpenAiProvider};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "kondate",
    version,
    about = "Kondate — dinner suggestions for Slack and LINE"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server and background generator.
    Start,
    /// Check platforms, provider and ingredient store.
    Status,
    /// Print the intent assigned to some text.
    Classify {
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Generate suggestions for some text and print them.
    Suggest {
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.command {
        Commands::Start => {
            let _guard = init_logging(&cfg, true)?;
            cfg.validate()?;

            let provider = build_provider(&cfg)?;
            if !provider.is_available().await {
                anyhow::bail!("provider '{}' is not available", provider.name());
            }
            let platforms = build_platforms(&cfg)?;
            let store = Store::new(&cfg.memory).await?;
            let (queue, jobs) = handoff::channel(cfg.generation.queue_capacity);

            println!("Kondate — Starting webhook server...");
            let gw = Arc::new(Gateway::new(
                provider,
                platforms,
                Arc::new(store),
                Arc::new(queue),
                cfg.server.clone(),
                cfg.generation.clone(),
            ));
            gw.run(jobs).await?;
        }
        Commands::Status => {
            let _guard = init_logging(&cfg, false)?;
            status(&cli.config, &cfg).await;
        }
        Commands::Classify { text } => {
            let _guard = init_logging(&cfg, false)?;
            let text = text.join(" ");
            let intent = intent::classify(&text);
            println!("intent: {}", intent.kind());
            match intent {
                Intent::GenerateFromIngredients(t) | Intent::GenerateFromMood(t) => {
                    println!("input:  {t}");
                }
                Intent::StoreAdd(items) => println!("items:  {}", items.join(" | ")),
                _ => {}
            }
        }
        Commands::Suggest { text } => {
            let _guard = init_logging(&cfg, false)?;
            if text.is_empty() {
                anyhow::bail!("no text provided. Usage: kondate suggest <ingredients or mood>");
            }
            suggest(&cfg, &text.join(" ")).await?;
        }
    }

    Ok(())
}

/// Load the config file and overlay secrets from the environment.
fn load_config(path: &str) -> anyhow::Result<Config> {
    let mut cfg = config::load(path)?;
    cfg.apply_env(|key| std::env::var(key).ok());
    Ok(cfg)
}

/// `RUST_LOG` wins over `bot.log_level`. With `to_file`, logs also go to
/// `{data_dir}/logs/kondate.log`.
fn init_logging(cfg: &Config, to_file: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.bot.log_level));

    if !to_file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    }

    let logs_dir = PathBuf::from(shellexpand(&cfg.bot.data_dir)).join("logs");
    std::fs::create_dir_all(&logs_dir)?;
    let file_appender = tracing_appender::rolling::never(&logs_dir, "kondate.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::io::stderr.and(file_writer))
        .init();
    Ok(Some(guard))
}

/// Build the configured provider.
fn build_provider(cfg: &Config) -> anyhow::Result<Arc<dyn Provider>> {
    match cfg.provider.default.as_str() {
        "anthropic" => {
            let a = cfg.provider.anthropic.clone().unwrap_or_default();
            Ok(Arc::new(AnthropicProvider::from_config(a.api_key, a.model)))
        }
        "openai" => {
            let o = cfg.provider.openai.clone().unwrap_or_default();
            Ok(Arc::new(OpenAiProvider::from_config(
                o.base_url, o.api_key, o.model,
            )))
        }
        other => anyhow::bail!("unsupported provider: {other}"),
    }
}

/// Build every enabled chat platform.
fn build_platforms(cfg: &Config) -> anyhow::Result<Platforms> {
    let mut platforms: Platforms = Platforms::new();

    if let Some(slack) = cfg.channel.slack.as_ref().filter(|s| s.enabled) {
        if slack.bot_token.is_empty() {
            tracing::warn!("Slack bot_token is empty; event replies cannot be delivered");
        }
        platforms.insert(Platform::Slack, Arc::new(SlackChannel::new(slack.clone())));
    }

    if let Some(line) = cfg.channel.line.as_ref().filter(|l| l.enabled) {
        if line.channel_access_token.is_empty() {
            tracing::warn!("LINE channel_access_token is empty; replies cannot be delivered");
        }
        platforms.insert(Platform::Line, Arc::new(LineChannel::new(line.clone())));
    }

    if platforms.is_empty() {
        anyhow::bail!("No platforms enabled. Enable Slack or LINE in config.toml.");
    }
    Ok(platforms)
}

async fn status(config_path: &str, cfg: &Config) {
    println!("Kondate — Status Check\n");
    println!("Config: {config_path}");
    match cfg.validate() {
        Ok(()) => println!("Validation: ok"),
        Err(e) => println!("Validation: {e}"),
    }
    println!();

    match build_provider(cfg) {
        Ok(provider) => println!(
            "  provider {}: {}",
            provider.name(),
            if provider.is_available().await {
                "available"
            } else {
                "not available"
            }
        ),
        Err(e) => println!("  provider: {e}"),
    }

    match &cfg.channel.slack {
        Some(s) if s.enabled && !s.signing_secret.is_empty() => {
            println!("  slack: configured")
        }
        Some(s) if s.enabled => println!("  slack: enabled but missing signing_secret"),
        Some(_) => println!("  slack: disabled"),
        None => println!("  slack: not configured"),
    }
    match &cfg.channel.line {
        Some(l) if l.enabled && !l.channel_secret.is_empty() => println!("  line: configured"),
        Some(l) if l.enabled => println!("  line: enabled but missing channel_secret"),
        Some(_) => println!("  line: disabled"),
        None => println!("  line: not configured"),
    }

    match Store::new(&cfg.memory).await {
        Ok(store) => {
            let line = store_status(
                &cfg.memory.db_path,
                store.user_count().await,
                store.db_size().await,
            );
            println!("  store: {line}");
        }
        Err(e) => println!("  store: {e}"),
    }
}

fn store_status(
    db_path: &str,
    users: Result<i64, KondateError>,
    size: Result<u64, KondateError>,
) -> String {
    match (users, size) {
        (Ok(users), Ok(size)) => format!("{db_path} ({users} users, {size} bytes)"),
        (Err(e), _) | (_, Err(e)) => format!("{db_path} (error: {e})"),
    }
}

/// One-shot generation from the terminal.
async fn suggest(cfg: &Config, text: &str) -> anyhow::Result<()> {
    let (template, input) = match intent::classify(text) {
        Intent::GenerateFromIngredients(t) => (PromptTemplate::Ingredients, t),
        Intent::GenerateFromMood(t) => (PromptTemplate::Mood, t),
        other => anyhow::bail!(
            "'{text}' is a {} command, not a generation request",
            other.kind()
        ),
    };

    let provider = build_provider(cfg)?;
    if !provider.is_available().await {
        anyhow::bail!("provider '{}' is not available", provider.name());
    }

    let request = CompletionRequest {
        prompt: build_prompt(template, &input),
        max_tokens: cfg.generation.max_tokens,
        temperature: cfg.generation.temperature,
    };
    let timeout = Duration::from_secs(cfg.generation.timeout_secs);
    let recipes = gateway::generator::generate(provider.as_ref(), request, timeout).await?;

    println!("{}: {input}\n", template.label());
    for recipe in recipes {
        println!("{}. {}", recipe.number, recipe.name);
        if !recipe.description.is_empty() {
            println!("   {}", recipe.description.replace('\n', "\n   "));
        }
        if !recipe.missing_items.is_empty() {
            println!("   追加で必要: {}", recipe.missing_items.join("、"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_status_reports_counts() {
        assert_eq!(
            store_status("db.sqlite", Ok(3), Ok(4096)),
            "db.sqlite (3 users, 4096 bytes)"
        );
    }

    #[test]
    fn test_store_status_reports_errors() {
        let line = store_status(
            "db.sqlite",
            Err(KondateError::Memory("no such table: ingredients".into())),
            Ok(4096),
        );
        assert!(line.contains("error"), "{line}");
        assert!(line.contains("no such table"), "{line}");
        assert!(!line.contains("0 users"), "{line}");

        let line = store_status("db.sqlite", Ok(3), Err(KondateError::Memory("io".into())));
        assert!(line.contains("error"), "{line}");
    }
}
