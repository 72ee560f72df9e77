use once_cell::sync::Lazy;
use regex::Regex;

use crate::vault::Note;

/// Paragraph boundary: two or more consecutive line breaks, optionally
/// with whitespace between them. `\s` covers the interior newlines, so a
/// whole blank run collapses into one boundary.
static PARAGRAPH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("invalid paragraph regex"));

/// A paragraph-sized slice of a note, addressed by (note path, paragraph
/// index). The index is the 0-based position in the note's split sequence
/// and is what gets stored next to the vector, so splitting must stay
/// deterministic: the same content always yields the same indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub note: String,
    pub paragraph: usize,
    pub text: String,
}

/// Split raw note content into paragraphs. Segments are kept verbatim,
/// empty ones included; empty input yields a single empty paragraph.
pub fn split_paragraphs(content: &str) -> Vec<String> {
    PARAGRAPH_RE
        .split(content)
        .map(|s| s.to_string())
        .collect()
}

/// Chunk one note, preserving paragraph order and indices.
pub fn chunk_note(note: &Note) -> Vec<Chunk> {
    split_paragraphs(&note.content)
        .into_iter()
        .enumerate()
        .map(|(paragraph, text)| Chunk {
            note: note.path.clone(),
            paragraph,
            text,
        })
        .collect()
}

/// Chunk all notes into one flat ordered sequence.
pub fn chunk_notes(notes: &[Note]) -> Vec<Chunk> {
    notes.iter().flat_map(chunk_note).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(path: &str, content: &str) -> Note {
        Note {
            path: path.to_string(),
            content: content.to_string(),
            tags: Vec::new(),
            modified_ms: 0,
        }
    }

    #[test]
    fn splits_on_blank_line_runs() {
        let paragraphs = split_paragraphs("Oliver likes AI.\n\nOliver likes cats.");
        assert_eq!(paragraphs, vec!["Oliver likes AI.", "Oliver likes cats."]);

        // three newlines and whitespace-only blank lines are one boundary
        let paragraphs = split_paragraphs("a\n\n\nb\n  \nc");
        assert_eq!(paragraphs, vec!["a", "b", "c"]);
    }

    #[test]
    fn single_newline_is_not_a_boundary() {
        assert_eq!(split_paragraphs("a\nb"), vec!["a\nb"]);
    }

    #[test]
    fn empty_input_yields_single_empty_chunk() {
        assert_eq!(split_paragraphs(""), vec![""]);
    }

    #[test]
    fn splitting_is_deterministic() {
        let content = "P1\n\nP2\n\n\nP3\n";
        assert_eq!(split_paragraphs(content), split_paragraphs(content));
    }

    #[test]
    fn chunk_note_assigns_zero_based_indices() {
        let n = note("A.md", "Oliver likes AI.\n\nOliver likes cats.");
        let chunks = chunk_note(&n);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].note, "A.md");
        assert_eq!(chunks[1].paragraph, 1);
        assert_eq!(chunks[1].text, "Oliver likes cats.");
    }

    #[test]
    fn chunk_notes_flattens_in_note_order() {
        let notes = vec![note("A.md", "a1\n\na2"), note("B.md", "b1")];
        let chunks = chunk_notes(&notes);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].note, "B.md");
        // paragraph indices restart per note; ids are assigned later over
        // the flattened sequence
        assert_eq!(chunks[2].paragraph, 0);
    }
}
