//! Verifies that the configured provider key works by sending one prompt.

use async_openai::config::OpenAIConfig;
use clap::Parser;
use learnpath_api::config::{Config, ConfigError};
use learnpath_core::llm_client::{LLMClient, OpenAICompatibleClient};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about = "Check that the text-generation API key is valid and has quota")]
struct Args {
    /// Prompt to send.
    #[arg(long, default_value = "Hello")]
    prompt: String,
    /// Model to use instead of CHAT_MODEL.
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(ConfigError::MissingVar(msg)) => {
            eprintln!("ERROR: API key not found: {}", msg);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("API key found for provider {:?}.", config.provider);

    let Some(api_key) = config.api_key() else {
        eprintln!("ERROR: {} is empty.", config.provider.key_var());
        return ExitCode::FAILURE;
    };
    let model = args.model.unwrap_or_else(|| config.chat_model.clone());
    let client = OpenAICompatibleClient::new(
        OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(config.provider.api_base()),
        model.clone(),
    );

    println!("Sending a single request to '{}'...", model);
    match client.complete(args.prompt).await {
        Ok(reply) => {
            let preview: String = reply.chars().take(50).collect();
            println!("SUCCESS: the key is valid and has quota.");
            println!("First words of the reply: {}...", preview);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ERROR: the API call failed.");
            eprintln!("The quota may be exhausted, or the API is not enabled for this project.");
            eprintln!("--- Full error ---\n{:?}\n------------------", e);
            ExitCode::FAILURE
        }
    }
}
