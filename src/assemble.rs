use crate::chunker::split_paragraphs;
use crate::store::Hit;
use crate::vault::{Vault, VaultError};

/// Build the answer context from search hits: re-read each hit's note,
/// re-split it, and take the paragraph the hit points at. Chunks are never
/// cached from ingestion time, so this always reflects the vault as it is
/// now.
///
/// Each extracted paragraph is appended with a single leading space, in
/// hit order. A hit whose note no longer resolves, or whose paragraph
/// index is out of range after an edit, is stale; it is skipped with a
/// warning rather than failing the whole query.
pub fn assemble(vault: &Vault, hits: &[Hit]) -> Result<String, VaultError> {
    let mut context = String::new();

    for hit in hits {
        let note = match vault.find_by_label(&hit.label)? {
            Some(note) => note,
            None => {
                log::warn!("no note matches label '{}', skipping hit", hit.label);
                continue;
            }
        };

        let paragraphs = split_paragraphs(&note.content);
        match paragraphs.get(hit.paragraph) {
            Some(text) => {
                context.push(' ');
                context.push_str(text);
            }
            None => {
                log::warn!(
                    "paragraph {} of '{}' is gone (note has {} now), skipping stale hit",
                    hit.paragraph,
                    note.path,
                    paragraphs.len()
                );
            }
        }
    }

    Ok(context)
}
