/*!
 * Response decoding.
 *
 * Model output is free-form text; turning it back into per-item
 * translations is the fragile part of the pipeline, so it lives behind a
 * small decoder seam with two implementations: a pass-through for
 * single-item calls and a marker-delimited decoder for `[k]`-numbered
 * batches. The marker decoder is deliberately lenient - segments are taken
 * in marker order, not matched by ordinal value, then padded or truncated
 * to the expected count. A model that skips or reorders markers therefore
 * produces misaligned output; that limitation is pinned by tests rather
 * than corrected here.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Decode a raw model response into exactly `expected` translations
pub trait ResponseDecoder: Send + Sync {
    /// Split a response body into translations, one per requested text
    fn decode(&self, response: &str, expected: usize) -> Vec<String>;
}

/// Decoder for single-item calls: the whole trimmed body is the translation
#[derive(Debug, Default)]
pub struct PassthroughDecoder;

impl ResponseDecoder for PassthroughDecoder {
    fn decode(&self, response: &str, expected: usize) -> Vec<String> {
        let mut translations = vec![response.trim().to_string()];
        pad_or_truncate(&mut translations, expected);
        translations
    }
}

/// `[k]` markers at line starts
static BRACKET_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\[(\d+)\][ \t]*").expect("valid marker regex"));

/// Legacy `k.` / `k)` markers at line starts
static LEGACY_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(\d+)[.)][ \t]*").expect("valid marker regex"));

/// Decoder for multi-item batches delimited by numbered markers
#[derive(Debug, Default)]
pub struct MarkerDecoder;

impl ResponseDecoder for MarkerDecoder {
    fn decode(&self, response: &str, expected: usize) -> Vec<String> {
        let mut markers: Vec<(usize, usize)> = BRACKET_MARKER
            .find_iter(response)
            .map(|m| (m.start(), m.end()))
            .collect();

        // Older models answered with "1." / "1)" numbering; fall back to it
        // only when no bracket markers were produced at all
        if markers.is_empty() {
            markers = LEGACY_MARKER
                .find_iter(response)
                .map(|m| (m.start(), m.end()))
                .collect();
        }

        let mut translations = Vec::with_capacity(expected);

        if markers.is_empty() {
            // No numbering at all: the whole body is one translation. Only
            // valid for a one-text batch; for larger batches this silently
            // drops the rest, which padding below papers over.
            let trimmed = response.trim();
            if !trimmed.is_empty() {
                translations.push(trimmed.to_string());
            }
        } else {
            for (i, &(_, content_start)) in markers.iter().enumerate() {
                let content_end = markers
                    .get(i + 1)
                    .map(|&(next_start, _)| next_start)
                    .unwrap_or(response.len());
                translations.push(response[content_start..content_end].trim().to_string());
            }
        }

        pad_or_truncate(&mut translations, expected);
        translations
    }
}

/// Pick the decoder for a batch shape
pub fn decoder_for(is_markup: bool, text_count: usize) -> &'static dyn ResponseDecoder {
    static PASSTHROUGH: PassthroughDecoder = PassthroughDecoder;
    static MARKER: MarkerDecoder = MarkerDecoder;

    if is_markup || text_count <= 1 {
        &PASSTHROUGH
    } else {
        &MARKER
    }
}

fn pad_or_truncate(translations: &mut Vec<String>, expected: usize) {
    while translations.len() < expected {
        translations.push(String::new());
    }
    translations.truncate(expected);
}
