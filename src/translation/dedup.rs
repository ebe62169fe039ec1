/*!
 * Source text deduplication.
 *
 * Product feeds repeat the same description across many rows (variants,
 * color options). Collapsing identical source strings before translation
 * cuts both cost and latency; each unique text remembers every row it must
 * be written back to.
 */

use std::collections::HashMap;

use crate::csv_processor::SourceItem;

/// One distinct source text and every row that carries it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueItem {
    /// The source text, exact bytes, no normalization
    pub text: String,
    /// Row indices sharing this text, in encounter order
    pub row_indices: Vec<usize>,
}

/// Result of a deduplication pass
#[derive(Debug, Clone)]
pub struct DedupResult {
    /// Distinct texts in first-occurrence order
    pub unique: Vec<UniqueItem>,
    /// Number of source items before deduplication
    pub total_original: usize,
    /// Number of distinct texts
    pub total_unique: usize,
}

impl DedupResult {
    /// Rows saved by deduplication
    pub fn saved(&self) -> usize {
        self.total_original - self.total_unique
    }

    /// Percentage of rows saved, for reporting
    pub fn savings_percent(&self) -> f64 {
        if self.total_original == 0 {
            return 0.0;
        }
        (1.0 - self.total_unique as f64 / self.total_original as f64) * 100.0
    }
}

/// Collapse textually identical source strings into unique work items.
///
/// Matching is exact - no trimming, no case folding - so two cells translate
/// identically only when their bytes agree. First-occurrence order is
/// preserved to keep downstream batch numbering deterministic.
pub fn deduplicate(source_items: &[SourceItem]) -> DedupResult {
    let mut index_by_text: HashMap<&str, usize> = HashMap::new();
    let mut unique: Vec<UniqueItem> = Vec::new();

    for item in source_items {
        match index_by_text.get(item.text.as_str()) {
            Some(&i) => unique[i].row_indices.push(item.row_index),
            None => {
                index_by_text.insert(item.text.as_str(), unique.len());
                unique.push(UniqueItem {
                    text: item.text.clone(),
                    row_indices: vec![item.row_index],
                });
            }
        }
    }

    DedupResult {
        total_original: source_items.len(),
        total_unique: unique.len(),
        unique,
    }
}
