//! In-process ranked index over package metadata.
//!
//! Models the external full-text collaborator for the binary and the tests:
//! documents are built from name, summary and description, matches are
//! scored by term frequency and returned in descending relevance order with
//! a stable name tie-break.

use crate::error::QueryError;
use crate::index::{Index, TermWeight, TextQuery};
use crate::package::PackageInstance;

/// Weight multiplier applied to `+term` matches.
const LOVE_BOOST: f64 = 2.0;

struct Document {
    name: String,
    tokens: Vec<String>,
}

/// A ranked in-memory index built from a package set.
pub struct MemoryIndex {
    documents: Vec<Document>,
}

impl MemoryIndex {
    pub fn build(packages: &[PackageInstance]) -> Self {
        let documents = packages
            .iter()
            .map(|pkg| Document {
                name: pkg.name.clone(),
                tokens: tokenize(&format!(
                    "{} {} {}",
                    pkg.name, pkg.summary, pkg.description
                )),
            })
            .collect();
        MemoryIndex { documents }
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn term_frequency(tokens: &[String], term: &str) -> usize {
    tokens.iter().filter(|t| t.as_str() == term).count()
}

fn phrase_frequency(tokens: &[String], words: &[String]) -> usize {
    if words.is_empty() || tokens.len() < words.len() {
        return 0;
    }
    tokens
        .windows(words.len())
        .filter(|window| window.iter().zip(words).all(|(t, w)| t == w))
        .count()
}

/// Score a document against a query. `None` means the document does not
/// match at all; `Some(score)` carries the relevance contribution.
fn score(tokens: &[String], query: &TextQuery) -> Option<f64> {
    match query {
        TextQuery::Term { text, weight } => {
            let tf = term_frequency(tokens, text);
            match weight {
                TermWeight::Normal => (tf > 0).then_some(tf as f64),
                TermWeight::Love => (tf > 0).then_some(tf as f64 * LOVE_BOOST),
                // A hated term excludes the document; its absence matches
                // without contributing relevance.
                TermWeight::Hate => (tf == 0).then_some(0.0),
            }
        }
        TextQuery::Phrase(words) => {
            let hits = phrase_frequency(tokens, words);
            (hits > 0).then_some(hits as f64 * words.len() as f64)
        }
        TextQuery::And(parts) => {
            if parts.is_empty() {
                return None;
            }
            let mut total = 0.0;
            for part in parts {
                total += score(tokens, part)?;
            }
            Some(total)
        }
        TextQuery::Or(parts) => {
            let mut total = 0.0;
            let mut matched = false;
            for part in parts {
                if let Some(s) = score(tokens, part) {
                    total += s;
                    matched = true;
                }
            }
            matched.then_some(total)
        }
        TextQuery::Not(inner) => match score(tokens, inner) {
            Some(_) => None,
            None => Some(0.0),
        },
    }
}

impl Index for MemoryIndex {
    fn reopen(&mut self) -> Result<(), QueryError> {
        // An on-disk index would re-read its latest committed generation
        // here; the in-memory document set is always current.
        Ok(())
    }

    fn query(&self, query: &TextQuery, limit: usize) -> Result<Vec<String>, QueryError> {
        let mut matches: Vec<(f64, &str)> = self
            .documents
            .iter()
            .filter_map(|doc| score(&doc.tokens, query).map(|s| (s, doc.name.as_str())))
            .collect();
        matches.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        Ok(matches
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.to_string())
            .collect())
    }
}
