use serde::{Deserialize, Serialize};

use crate::storage::StorageManager;

/// Tag a note must carry to be picked up by ingestion.
const DEFAULT_TAG: &str = "#second-brain";
/// Name of the vector collection holding the note chunks.
const DEFAULT_COLLECTION: &str = "second-brain";
/// Qdrant gRPC endpoint.
const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
/// OpenAI-compatible API base url.
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
/// Embedding model (1536 dimensions).
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
/// Chat model used to answer questions.
const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
/// How many nearest chunks feed the answer context.
const DEFAULT_TOP_K: usize = 2;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory containing the markdown note vault.
    /// Empty until the user sets it; commands that need it will say so.
    #[serde(default)]
    pub vault_dir: String,

    #[serde(default = "default_tag")]
    pub tag: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,

    #[serde(default = "default_openai_url")]
    pub openai_url: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_tag() -> String {
    DEFAULT_TAG.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

fn default_openai_url() -> String {
    DEFAULT_OPENAI_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl Config {
    fn validate(&self) {
        if !self.tag.starts_with('#') {
            panic!("tag must start with '#', got '{}'", self.tag);
        }
        if self.collection.is_empty() {
            panic!("collection must not be empty");
        }
        if self.top_k == 0 {
            panic!("top_k must be greater than 0");
        }
    }

    pub fn load(store: &dyn StorageManager) -> Self {
        // create new if does not exist
        if !store.exists("config.yaml") {
            let fresh = serde_yml::to_string(&Self {
                tag: default_tag(),
                collection: default_collection(),
                qdrant_url: default_qdrant_url(),
                openai_url: default_openai_url(),
                embedding_model: default_embedding_model(),
                chat_model: default_chat_model(),
                top_k: default_top_k(),
                ..Self::default()
            })
            .unwrap();
            store
                .write("config.yaml", fresh.as_bytes())
                .expect("failed to write default config");
        }

        let config_str = String::from_utf8(
            store.read("config.yaml").expect("failed to read config"),
        )
        .expect("config file is not valid utf8");
        let config: Self = serde_yml::from_str(&config_str).expect("config is malformed");

        config.validate();

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config).unwrap() {
            config.save(store);
        }

        config
    }

    pub fn save(&self, store: &dyn StorageManager) {
        let config_str = serde_yml::to_string(&self).unwrap();
        store
            .write("config.yaml", config_str.as_bytes())
            .expect("failed to write config");
    }
}

/// Mutable record persisted between runs: when ingestion last completed
/// and the API key entered with `sb key`. Loaded with defaults merged in,
/// saved wholesale after every mutation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct State {
    #[serde(default = "default_last_updated")]
    pub last_updated: String,

    #[serde(default)]
    pub unix_last_updated: i64,

    #[serde(default)]
    pub api_key: String,
}

fn default_last_updated() -> String {
    "Never Updated".to_string()
}

impl Default for State {
    fn default() -> Self {
        Self {
            last_updated: default_last_updated(),
            unix_last_updated: 0,
            api_key: String::new(),
        }
    }
}

impl State {
    pub fn load(store: &dyn StorageManager) -> Self {
        if !store.exists("state.yaml") {
            return Self::default();
        }

        let state_str = String::from_utf8(
            store.read("state.yaml").expect("failed to read state"),
        )
        .expect("state file is not valid utf8");

        serde_yml::from_str(&state_str).expect("state is malformed")
    }

    pub fn save(&self, store: &dyn StorageManager) {
        let state_str = serde_yml::to_string(&self).unwrap();
        store
            .write("state.yaml", state_str.as_bytes())
            .expect("failed to write state");
    }

    /// Record that an ingestion run just completed.
    pub fn touch(&mut self) {
        let now = chrono::Local::now();
        self.last_updated = now.format("%Y-%m-%d %H:%M:%S").to_string();
        self.unix_last_updated = now.timestamp_millis();
    }

    /// The key used for the embedding and completion APIs: the stored one,
    /// or OPENAI_API_KEY from the environment when none has been saved.
    pub fn resolve_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())
    }
}

/// Base directory for config and state, `~/.local/share/sb` unless
/// SB_BASE_PATH overrides it.
pub fn base_path() -> String {
    std::env::var("SB_BASE_PATH").unwrap_or_else(|_| {
        let home = homedir::my_home()
            .expect("Could not determine home directory")
            .expect("Home directory path is empty");
        format!("{}/.local/share/sb", home.to_string_lossy())
    })
}
