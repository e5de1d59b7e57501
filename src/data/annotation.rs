//! Gene annotation map and actionable reference list

use std::collections::HashMap;

use crate::error::{PipelineError, Result};

/// Normalize a gene identifier for joining: trim whitespace, lowercase.
///
/// Both sides of the actionable join go through this, so entries that differ
/// only by case or padding still match.
pub fn normalize_gene_id(id: &str) -> String {
    id.trim().to_lowercase()
}

/// Mapping from gene identifier to display symbol.
/// Genes without an entry keep their original identifier.
#[derive(Debug, Clone, Default)]
pub struct AnnotationMap {
    symbols: HashMap<String, String>,
}

impl AnnotationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mapping. The first mapping for a gene id wins; later
    /// duplicates are ignored.
    pub fn insert(&mut self, gene_id: &str, symbol: &str) {
        self.symbols
            .entry(gene_id.to_string())
            .or_insert_with(|| symbol.to_string());
    }

    /// Look up the symbol for a gene id
    pub fn symbol_for(&self, gene_id: &str) -> Option<&str> {
        self.symbols.get(gene_id).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// One row of the actionable reference table: a gene id plus any extra
/// columns, carried through to the output verbatim.
#[derive(Debug, Clone)]
pub struct ActionableEntry {
    pub gene_id: String,
    pub extra: Vec<String>,
}

/// Curated reference list of actionable genes, used as a join target.
#[derive(Debug, Clone)]
pub struct ActionableList {
    /// Names of the extra columns (everything except the gene id column)
    extra_columns: Vec<String>,
    entries: Vec<ActionableEntry>,
    /// Normalized gene id -> entry index; first occurrence wins
    index: HashMap<String, usize>,
}

impl ActionableList {
    pub fn new(extra_columns: Vec<String>, entries: Vec<ActionableEntry>) -> Result<Self> {
        for entry in &entries {
            if entry.extra.len() != extra_columns.len() {
                return Err(PipelineError::DimensionMismatch {
                    expected: format!("{} extra columns", extra_columns.len()),
                    got: format!("{} extra columns for gene '{}'", entry.extra.len(), entry.gene_id),
                });
            }
        }

        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let key = normalize_gene_id(&entry.gene_id);
            if index.insert(key, i).is_some() {
                log::warn!(
                    "Duplicate actionable gene '{}'; keeping the last entry",
                    entry.gene_id
                );
            }
        }

        Ok(Self {
            extra_columns,
            entries,
            index,
        })
    }

    /// An empty list (valid input; produces zero hits)
    pub fn empty() -> Self {
        Self {
            extra_columns: Vec::new(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by gene id, using the normalized join key
    pub fn lookup(&self, gene_id: &str) -> Option<&ActionableEntry> {
        self.index
            .get(&normalize_gene_id(gene_id))
            .map(|&i| &self.entries[i])
    }
}
