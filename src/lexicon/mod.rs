//! Pronunciation dictionaries
//!
//! A `LexiconStore` holds named dictionaries parsed from pronunciation
//! lexicon documents. The markup rewriter walks them in the order they were
//! added, and walks each dictionary's entries longest grapheme first.

pub mod package;
pub mod parser;

use crate::Result;
use log::{debug, info};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

pub use package::{LexiconPackage, PackageInfo};
pub use parser::{normalize_phoneme, parse_lexicon, ParsedLexicon};

/// Lexicon store shared between callers and the speech worker
pub type SharedLexicons = Arc<RwLock<LexiconStore>>;

/// One pronunciation rule as written in a lexicon document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    /// Surface spellings that all share this pronunciation
    pub graphemes: Vec<String>,

    /// Normalized phonetic string
    pub phoneme: String,

    /// Literal replacement text, preferred over the phoneme when present
    pub alias: Option<String>,
}

/// One grapheme of a lexeme, the unit the rewriter matches on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub grapheme: String,
    pub phoneme: String,
    pub alias: Option<String>,
}

impl Entry {
    /// Grapheme length in characters, the sort key of a dictionary
    pub fn grapheme_len(&self) -> usize {
        self.grapheme.chars().count()
    }
}

/// A named collection of pronunciation entries
///
/// Entries are kept sorted by grapheme length, longest first, so a
/// multi-word or suffixed grapheme is always substituted before any
/// shorter grapheme contained in it. Ties keep document order.
#[derive(Debug, Clone)]
pub struct Dictionary {
    id: String,
    entries: Vec<Entry>,
}

impl Dictionary {
    /// Build a dictionary from parsed lexemes
    pub fn new(id: impl Into<String>, lexemes: Vec<Lexeme>) -> Self {
        let mut entries: Vec<Entry> = lexemes
            .into_iter()
            .flat_map(|lexeme| {
                let Lexeme {
                    graphemes,
                    phoneme,
                    alias,
                } = lexeme;
                graphemes.into_iter().map(move |grapheme| Entry {
                    grapheme,
                    phoneme: phoneme.clone(),
                    alias: alias.clone(),
                })
            })
            .collect();

        // Vec::sort_by is stable
        entries.sort_by(|a, b| b.grapheme_len().cmp(&a.grapheme_len()));

        Self {
            id: id.into(),
            entries,
        }
    }

    /// Parse a lexicon document into a dictionary
    pub fn parse(id: impl Into<String>, source: &str) -> Result<Self> {
        let parsed = parse_lexicon(source)?;
        Ok(Self::new(id, parsed.lexemes))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Insertion-ordered set of dictionaries keyed by identifier
#[derive(Debug, Default)]
pub struct LexiconStore {
    dictionaries: Vec<Dictionary>,
}

impl LexiconStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store wrapped for sharing with a speech worker
    pub fn shared() -> SharedLexicons {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Parse `source` and register it under `id`
    ///
    /// An existing dictionary with the same identifier is removed first; the
    /// new one is appended at the end of the application order. Nothing is
    /// changed when parsing fails. Returns the number of entries added.
    pub fn add_lexicon(&mut self, id: &str, source: &str) -> Result<usize> {
        let parsed = parse_lexicon(source)?;
        if parsed.dropped > 0 {
            debug!(
                "Lexicon {}: dropped {} rules without a usable phoneme",
                id, parsed.dropped
            );
        }

        let dictionary = Dictionary::new(id, parsed.lexemes);
        let added = dictionary.len();
        self.insert(dictionary);

        info!(
            "Added lexicon {} ({} entries, {} total)",
            id,
            added,
            self.entry_count()
        );
        Ok(added)
    }

    /// Read a lexicon file and register it under its path
    pub fn add_lexicon_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        self.add_lexicon(&path.to_string_lossy(), &source)
    }

    /// Register an already built dictionary, replacing any with the same id
    pub fn insert(&mut self, dictionary: Dictionary) {
        self.remove_lexicon(dictionary.id());
        self.dictionaries.push(dictionary);
    }

    /// Remove a dictionary; unknown identifiers are ignored
    pub fn remove_lexicon(&mut self, id: &str) {
        if let Some(idx) = self.dictionaries.iter().position(|d| d.id() == id) {
            self.dictionaries.remove(idx);
            debug!("Removed lexicon {}", id);
        }
    }

    pub fn has_lexicon(&self, id: &str) -> bool {
        self.dictionaries.iter().any(|d| d.id() == id)
    }

    pub fn get(&self, id: &str) -> Option<&Dictionary> {
        self.dictionaries.iter().find(|d| d.id() == id)
    }

    /// Dictionaries in the order they were added
    pub fn dictionaries(&self) -> impl Iterator<Item = &Dictionary> {
        self.dictionaries.iter()
    }

    /// Number of dictionaries
    pub fn len(&self) -> usize {
        self.dictionaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionaries.is_empty()
    }

    /// Number of entries across all dictionaries
    pub fn entry_count(&self) -> usize {
        self.dictionaries.iter().map(Dictionary::len).sum()
    }
}
