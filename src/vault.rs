use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

/// Inline tags the way the note app writes them: `#second-brain`,
/// `#projects/rust`. A `#` followed by whitespace (markdown heading) does
/// not match.
static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"#[A-Za-z][A-Za-z0-9_/-]*").expect("invalid tag regex")
});

/// A markdown note, read fresh from disk. Snapshots are never cached
/// between pipeline runs; every run re-reads the vault.
#[derive(Debug, Clone)]
pub struct Note {
    /// Vault-relative path, the note's identity.
    pub path: String,
    /// Raw file content.
    pub content: String,
    /// Inline tags found in the content, `#` included.
    pub tags: Vec<String>,
    /// Modification time, unix milliseconds.
    pub modified_ms: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("vault directory is not set; add vault_dir to config.yaml")]
    NotConfigured,
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("walk error: {0}")]
    Walk(String),
    #[error("read error for {0}: {1}")]
    Read(PathBuf, std::io::Error),
}

/// Read access to the markdown vault. Wraps the directory the user points
/// `sb` at; nothing here ever writes to it.
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config_dir(vault_dir: &str) -> Result<Self, VaultError> {
        if vault_dir.is_empty() {
            return Err(VaultError::NotConfigured);
        }
        Ok(Self::new(vault_dir))
    }

    /// Every `.md` note in the vault, in deterministic listing order
    /// (lexicographic by file name). Hidden entries are skipped and
    /// symlinked directories are not followed.
    pub fn scan(&self) -> Result<Vec<Note>, VaultError> {
        if !self.root.is_dir() {
            return Err(VaultError::NotADirectory(self.root.clone()));
        }

        let mut notes = Vec::new();
        // depth 0 is the root itself; it must walk even when the vault
        // lives in a dot-named directory like ~/.notes
        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        {
            let entry = entry.map_err(|e| VaultError::Walk(e.to_string()))?;
            let path = entry.path();
            if !path.is_file() || path.extension().map_or(true, |e| e != "md") {
                continue;
            }

            let content = std::fs::read_to_string(path)
                .map_err(|e| VaultError::Read(path.to_path_buf(), e))?;
            let modified_ms = modified_ms(path);

            notes.push(Note {
                path: self.relative_path(path),
                tags: extract_tags(&content),
                content,
                modified_ms,
            });
        }

        Ok(notes)
    }

    /// Notes carrying `tag` exactly. A vault with no matches is an empty
    /// result, not an error.
    pub fn list_tagged(&self, tag: &str) -> Result<Vec<Note>, VaultError> {
        Ok(self
            .scan()?
            .into_iter()
            .filter(|note| note.tags.iter().any(|t| t == tag))
            .collect())
    }

    /// Resolve a stored label back to a note: the first note (in listing
    /// order) whose path contains `label` as a substring. With several
    /// matches the first one wins; that tie-break is deliberate and relied
    /// on by the query pipeline.
    pub fn find_by_label(&self, label: &str) -> Result<Option<Note>, VaultError> {
        Ok(self
            .scan()?
            .into_iter()
            .find(|note| note.path.contains(label)))
    }

    fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn modified_ms(path: &Path) -> i64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn extract_tags(content: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for m in TAG_RE.find_iter(content) {
        let tag = m.as_str();
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_note(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn extract_tags_skips_headings() {
        let tags = extract_tags("# Heading\n\nBody #second-brain and #ai/llm.");
        assert_eq!(tags, vec!["#second-brain", "#ai/llm"]);
    }

    #[test]
    fn list_tagged_filters_exactly() {
        let dir = tempfile::tempdir().unwrap();
        write_note(dir.path(), "a.md", "tagged #second-brain note");
        write_note(dir.path(), "b.md", "related #second-brain-archive note");
        write_note(dir.path(), "c.md", "plain note, no tag at all");

        let vault = Vault::new(dir.path());
        let notes = vault.list_tagged("#second-brain").unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].path, "a.md");
    }

    #[test]
    fn untagged_note_never_included() {
        let dir = tempfile::tempdir().unwrap();
        write_note(dir.path(), "a.md", "second-brain mentioned without hash");

        let vault = Vault::new(dir.path());
        assert!(vault.list_tagged("#second-brain").unwrap().is_empty());
    }

    #[test]
    fn find_by_label_takes_first_match_in_listing_order() {
        let dir = tempfile::tempdir().unwrap();
        write_note(dir.path(), "notes-a.md", "first");
        write_note(dir.path(), "notes-b.md", "second");

        let vault = Vault::new(dir.path());
        let note = vault.find_by_label("notes").unwrap().unwrap();
        assert_eq!(note.path, "notes-a.md");
        assert!(vault.find_by_label("missing").unwrap().is_none());
    }

    #[test]
    fn dot_named_vault_root_is_still_walked() {
        // The hidden filter applies to entries inside the vault, never to
        // the root itself.
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join(".notes");
        std::fs::create_dir(&root).unwrap();
        write_note(&root, "a.md", "#second-brain kept");

        let hidden_sub = root.join(".obsidian");
        std::fs::create_dir(&hidden_sub).unwrap();
        write_note(&hidden_sub, "b.md", "#second-brain but under a hidden dir");

        let vault = Vault::new(&root);
        let notes = vault.list_tagged("#second-brain").unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].path, "a.md");
    }

    #[test]
    fn repeated_tags_are_reported_once() {
        let tags = extract_tags("#a then #b then #a again");
        assert_eq!(tags, vec!["#a", "#b"]);
    }

    #[test]
    fn non_markdown_and_hidden_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_note(dir.path(), "a.md", "#second-brain yes");
        write_note(dir.path(), "b.txt", "#second-brain but not markdown");
        write_note(dir.path(), ".hidden.md", "#second-brain but hidden");

        let vault = Vault::new(dir.path());
        let notes = vault.scan().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].path, "a.md");
    }

    #[test]
    fn missing_vault_dir_is_an_error() {
        let vault = Vault::new("/nonexistent/sb-vault");
        assert!(matches!(vault.scan(), Err(VaultError::NotADirectory(_))));
        assert!(matches!(
            Vault::from_config_dir(""),
            Err(VaultError::NotConfigured)
        ));
    }
}
