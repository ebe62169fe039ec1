/*!
 * Batch planning.
 *
 * Unique texts are partitioned into request-sized batches with a
 * content-aware policy: markup cells go one per request under a
 * tag-preserving prompt, plain cells are greedily packed up to a character
 * budget. Packing is a deliberately simple bin-packing approximation -
 * deterministic and order-preserving, not optimal.
 */

use super::dedup::UniqueItem;

/// Default character budget for a plain-text batch
pub const DEFAULT_BATCH_CHARS: usize = 2000;

/// One request payload: a group of unique texts sharing a prompt variant
#[derive(Debug, Clone)]
pub struct Batch {
    /// Items in this batch, order matching the encoded request
    pub items: Vec<UniqueItem>,
    /// Whether this batch holds a single markup cell
    pub is_markup: bool,
}

impl Batch {
    /// The texts to encode, in item order
    pub fn texts(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.text.as_str()).collect()
    }

    /// Total source characters in this batch
    pub fn char_count(&self) -> usize {
        self.items.iter().map(|i| i.text.len()).sum()
    }
}

/// Markup detection heuristic: a '<' and a '>' anywhere in the cell.
///
/// This is evidence, not a parser - literal angle brackets in plain text are
/// accepted as false positives, which only costs a slightly less efficient
/// singleton request.
pub fn contains_markup(text: &str) -> bool {
    text.contains('<') && text.contains('>')
}

/// Partition unique items into batches.
///
/// Markup items each become their own singleton batch: tag structure is
/// fragile under paraphrasing, and sharing a request risks cross-item
/// bleeding. Plain items are packed in encounter order; a batch closes
/// before an item would push it past `max_chars`, and an item larger than
/// the whole budget stays alone in its own batch - a source string is never
/// split mid-text.
pub fn plan_batches(items: &[UniqueItem], max_chars: usize) -> Vec<Batch> {
    let mut batches = Vec::new();
    let mut current: Vec<UniqueItem> = Vec::new();
    let mut current_chars = 0usize;

    for item in items {
        if contains_markup(&item.text) {
            batches.push(Batch { items: vec![item.clone()], is_markup: true });
            continue;
        }

        let text_len = item.text.len();
        if current_chars + text_len > max_chars && !current.is_empty() {
            batches.push(Batch { items: std::mem::take(&mut current), is_markup: false });
            current_chars = 0;
        }

        current.push(item.clone());
        current_chars += text_len;
    }

    if !current.is_empty() {
        batches.push(Batch { items: current, is_markup: false });
    }

    batches
}
