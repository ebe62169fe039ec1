/*!
 * CSV feed parsing and writing.
 *
 * Feeds follow the Shopify translation export layout: a fixed source column,
 * a fixed target column for translations, and a field-type column in which
 * `handle` marks slug rows. Parsing is deliberately lenient - rows with
 * variable column counts are tolerated and padded up to the target column.
 */

use std::collections::{HashMap, HashSet};

use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};

use crate::app_config::CsvConfig;
use crate::errors::CsvError;

/// One non-empty source cell, tagged with its absolute row index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
    /// Absolute row index in the file (header is row 0)
    pub row_index: usize,
    /// Raw cell content
    pub text: String,
}

/// A parsed CSV feed: every row (header included) plus the extracted source cells
#[derive(Debug, Clone)]
pub struct CsvDocument {
    /// All rows, header at index 0
    pub rows: Vec<Vec<String>>,
    /// Non-empty source cells in row order
    pub source_texts: Vec<SourceItem>,
}

/// One output file, possibly a part of a split
#[derive(Debug, Clone)]
pub struct CsvPart {
    /// File name for this part
    pub name: String,
    /// CSV content
    pub content: String,
}

/// CSV feed processor bound to a column layout
#[derive(Debug, Clone)]
pub struct CsvProcessor {
    source_column: usize,
    target_column: usize,
    field_column: usize,
}

impl CsvProcessor {
    /// Create a processor for the given column layout
    pub fn new(config: &CsvConfig) -> Self {
        Self {
            source_column: config.source_column,
            target_column: config.target_column,
            field_column: config.field_column,
        }
    }

    /// Parse a CSV feed and extract the source cells to translate.
    ///
    /// The header row is kept at index 0 and never yields a source item.
    pub fn parse(&self, data: &[u8]) -> Result<CsvDocument, CsvError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data);

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut source_texts = Vec::new();

        for (row_index, record) in reader.records().enumerate() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(|f| f.to_string()).collect();

            // Pad so both the source and target columns always exist
            let last_column = self.source_column.max(self.target_column);
            while row.len() <= last_column {
                row.push(String::new());
            }

            if row_index > 0 {
                let source_text = &row[self.source_column];
                if !source_text.trim().is_empty() {
                    source_texts.push(SourceItem {
                        row_index,
                        text: source_text.clone(),
                    });
                }
            }

            rows.push(row);
        }

        Ok(CsvDocument { rows, source_texts })
    }

    /// Write translations into the target column by row index
    pub fn insert_translations(&self, rows: &mut [Vec<String>], translations: &HashMap<usize, String>) {
        for (&row_index, translation) in translations {
            if let Some(row) = rows.get_mut(row_index) {
                while row.len() <= self.target_column {
                    row.push(String::new());
                }
                row[self.target_column] = translation.clone();
            }
        }
    }

    /// Normalize translated handle rows into unique URL-safe slugs.
    ///
    /// Rows whose field-type cell is `handle` get their target cell
    /// lowercased, accent-folded and hyphenated; collisions receive a
    /// zero-padded numeric suffix so every handle in the file stays unique.
    pub fn normalize_handles(&self, rows: &mut [Vec<String>]) {
        let mut used: HashSet<String> = HashSet::new();

        for row in rows.iter_mut().skip(1) {
            let is_handle = row
                .get(self.field_column)
                .map(|f| f.trim().eq_ignore_ascii_case("handle"))
                .unwrap_or(false);
            if !is_handle {
                continue;
            }

            let Some(cell) = row.get_mut(self.target_column) else {
                continue;
            };
            if cell.trim().is_empty() {
                continue;
            }

            let base = slugify(cell);
            let mut candidate = base.clone();
            let mut suffix = 0u32;
            while !used.insert(candidate.clone()) {
                suffix += 1;
                candidate = format!("{}-{:03}", base, suffix);
            }
            *cell = candidate;
        }
    }

    /// Generate CSV text from rows, quoting every field
    pub fn generate_csv(&self, rows: &[Vec<String>]) -> Result<String, CsvError> {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(Vec::new());

        for row in rows {
            writer.write_record(row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| CsvError::Generate(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| CsvError::Generate(e.to_string()))
    }

    /// Split CSV content into parts under a byte limit.
    ///
    /// Splits only on record boundaries - a newline inside a quoted field
    /// never ends a part. Each part repeats the header row.
    pub fn split_if_oversized(&self, name: &str, content: &str, max_bytes: usize) -> Vec<CsvPart> {
        if content.len() <= max_bytes {
            return vec![CsvPart { name: name.to_string(), content: content.to_string() }];
        }

        let records = split_records(content);
        let Some((header, data_records)) = records.split_first() else {
            return vec![CsvPart { name: name.to_string(), content: content.to_string() }];
        };

        let stem = name.strip_suffix(".csv").unwrap_or(name);
        let mut parts = Vec::new();
        let mut current = header.to_string();

        for record in data_records {
            if current.len() + record.len() > max_bytes && current.len() > header.len() {
                parts.push(current);
                current = header.to_string();
            }
            current.push_str(record);
        }
        if current.len() > header.len() {
            parts.push(current);
        }

        let total = parts.len();
        parts
            .into_iter()
            .enumerate()
            .map(|(i, content)| CsvPart {
                name: format!("{}_part{}of{}.csv", stem, i + 1, total),
                content,
            })
            .collect()
    }
}

/// Split CSV text into records (newline included), honoring quoted fields
fn split_records(content: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, b) in content.bytes().enumerate() {
        match b {
            b'"' => in_quotes = !in_quotes,
            b'\n' if !in_quotes => {
                records.push(&content[start..=i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < content.len() {
        records.push(&content[start..]);
    }

    records
}

/// Turn a translated handle value into a URL-safe slug: lowercase, accents
/// folded, non-alphanumeric runs collapsed to a single hyphen.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    let mut push = |slug: &mut String, c: char, pending: &mut bool| {
        if *pending && !slug.is_empty() {
            slug.push('-');
        }
        *pending = false;
        slug.push(c);
    };

    for c in text.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            push(&mut slug, c, &mut pending_hyphen);
        } else if let Some(folded) = fold_accent(c) {
            for fc in folded.chars() {
                push(&mut slug, fc, &mut pending_hyphen);
            }
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Fold a lowercase accented Latin character to its ASCII form
fn fold_accent(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'æ' => "ae",
        'œ' => "oe",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}
