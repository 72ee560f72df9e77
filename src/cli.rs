use clap::{Parser, Subcommand};
use inquire::autocompletion::{Autocomplete, Replacement};
use inquire::CustomUserError;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store the OpenAI API key (prompted for, never echoed back)
    Key {},

    /// Rebuild the vector collection from the tagged notes in the vault
    Ingest {},

    /// Ask a question against the ingested notes
    Ask {
        /// The question. When omitted, prompts with example suggestions
        /// (free text allowed).
        question: Option<String>,
    },

    /// Show when the vault was last ingested and whether it has changed since
    Status {},
}

/// Example questions offered by the `ask` prompt.
const SUGGESTIONS: &[&str] = &[
    "What do my notes say about AI?",
    "What have I been working on lately?",
    "What is a second brain?",
];

/// Suggests example questions matching whatever is typed so far,
/// case-insensitive contains. Anything typed is accepted as-is when no
/// suggestion matches.
#[derive(Clone, Default)]
pub struct QuerySuggestions;

impl Autocomplete for QuerySuggestions {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        let needle = input.to_lowercase();
        Ok(SUGGESTIONS
            .iter()
            .filter(|s| s.to_lowercase().contains(&needle))
            .map(|s| s.to_string())
            .collect())
    }

    fn get_completion(
        &mut self,
        _input: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        Ok(highlighted_suggestion)
    }
}
