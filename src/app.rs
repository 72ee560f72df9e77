use anyhow::{Context, Result};

use crate::assemble::assemble;
use crate::chunker::chunk_notes;
use crate::config::{Config, State};
use crate::openai::OpenAi;
use crate::storage::StorageManager;
use crate::store::VectorStore;
use crate::vault::{Vault, VaultError};

/// What an ingestion run processed, for the CLI to report.
#[derive(Debug, Clone, Copy)]
pub struct IngestSummary {
    pub notes: usize,
    pub chunks: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Status {
    pub last_updated: String,
    pub tagged_notes: usize,
    /// Newest tagged-note mtime is more recent than the last ingest.
    pub stale: bool,
}

/// Owns the loaded config and persisted state and wires the vault, the
/// OpenAI gateways, and the vector store into the two pipelines.
pub struct App {
    config: Config,
    state: State,
    storage: Box<dyn StorageManager>,
}

impl App {
    pub fn new(config: Config, state: State, storage: Box<dyn StorageManager>) -> Self {
        Self {
            config,
            state,
            storage,
        }
    }

    fn vault(&self) -> Result<Vault, VaultError> {
        Vault::from_config_dir(&self.config.vault_dir)
    }

    fn openai(&self) -> Result<OpenAi> {
        let api_key = self
            .state
            .resolve_api_key()
            .context("no API key set; run `sb key` or export OPENAI_API_KEY")?;
        Ok(OpenAi::new(
            &self.config.openai_url,
            api_key,
            &self.config.embedding_model,
            &self.config.chat_model,
        ))
    }

    pub fn set_api_key(&mut self, key: String) {
        self.state.api_key = key;
        self.state.save(self.storage.as_ref());
    }

    /// Ingestion pipeline: list tagged notes, chunk, embed in one batch,
    /// rewrite the vector collection, then stamp the state. Any failure
    /// aborts before the stamp so a re-run never thinks the work is done.
    pub async fn ingest(&mut self) -> Result<IngestSummary> {
        let vault = self.vault()?;
        let notes = vault.list_tagged(&self.config.tag)?;
        log::info!("{} notes tagged {}", notes.len(), self.config.tag);

        // One flat sequence; ids are sequential over the whole run, not
        // per note.
        let chunks = chunk_notes(&notes);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        let openai = self.openai()?;
        let embeddings = openai
            .embed_batch(&texts)
            .await
            .context("embedding request failed")?;

        // Reset only after embedding succeeded, so a provider failure
        // leaves the previous collection intact.
        let store = VectorStore::connect(&self.config.qdrant_url)?;
        store.reset_all().await?;
        store.create_collection(&self.config.collection).await?;

        if !chunks.is_empty() {
            let ids: Vec<u64> = (0..chunks.len() as u64).collect();
            let paragraphs: Vec<usize> = chunks.iter().map(|c| c.paragraph).collect();
            let labels: Vec<String> = chunks.iter().map(|c| c.note.clone()).collect();
            store
                .upsert(&self.config.collection, &ids, &embeddings, &paragraphs, &labels)
                .await?;
        }

        // Stamped even when zero notes matched: the vault was seen as-is.
        self.state.touch();
        self.state.save(self.storage.as_ref());

        Ok(IngestSummary {
            notes: notes.len(),
            chunks: chunks.len(),
        })
    }

    /// Query pipeline: embed the question, fetch the nearest chunks,
    /// assemble their current text as context, ask the chat model.
    /// Any failure aborts; no partial answer.
    pub async fn ask(&self, question: &str) -> Result<String> {
        let openai = self.openai()?;

        let query_embedding = openai
            .embed_batch(&[question.to_string()])
            .await
            .context("embedding request failed")?
            .into_iter()
            .next()
            .context("embedding provider returned nothing for the question")?;

        let store = VectorStore::connect(&self.config.qdrant_url)?;
        let hits = store
            .search(&self.config.collection, query_embedding, self.config.top_k)
            .await?;
        log::debug!("{} nearest chunks for question", hits.len());

        let vault = self.vault()?;
        let context = assemble(&vault, &hits)?;

        let answer = openai
            .answer(&context, question)
            .await
            .context("completion request failed")?;
        Ok(answer)
    }

    pub fn status(&self) -> Result<Status> {
        let vault = self.vault()?;
        let notes = vault.list_tagged(&self.config.tag)?;
        let newest_ms = notes.iter().map(|n| n.modified_ms).max().unwrap_or(0);

        Ok(Status {
            last_updated: self.state.last_updated.clone(),
            tagged_notes: notes.len(),
            stale: newest_ms > self.state.unix_last_updated,
        })
    }
}
