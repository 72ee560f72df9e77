use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod assemble;
mod chunker;
mod cli;
mod config;
mod openai;
mod storage;
mod store;
mod vault;

use cli::QuerySuggestions;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = cli::Args::parse();

    let storage = storage::BackendLocal::new(&config::base_path())
        .context("failed to create application base directory")?;
    let config = config::Config::load(&storage);
    let state = config::State::load(&storage);
    let mut app = app::App::new(config, state, Box::new(storage));

    match args.command {
        cli::Command::Key {} => {
            let key = inquire::Password::new("OpenAI API key:")
                .without_confirmation()
                .prompt()?;
            app.set_api_key(key);
            println!("API key saved.");
            Ok(())
        }

        cli::Command::Ingest {} => {
            let summary = app.ingest().await?;
            println!(
                "Ingested {} chunks from {} notes.",
                summary.chunks, summary.notes
            );
            Ok(())
        }

        cli::Command::Ask { question } => {
            let question = match question {
                Some(question) => question,
                None => inquire::Text::new("Question:")
                    .with_autocomplete(QuerySuggestions)
                    .prompt()?,
            };

            let answer = app.ask(&question).await?;
            println!("{answer}");
            Ok(())
        }

        cli::Command::Status {} => {
            let status = app.status()?;
            println!("{}", serde_json::to_string_pretty(&status).unwrap());
            Ok(())
        }
    }
}
