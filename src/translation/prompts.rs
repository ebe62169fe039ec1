/*!
 * Prompt templates for feed translation.
 *
 * Two variants exist per target language: a single-item prompt for markup
 * cells (and one-text batches), and a batch prompt that adds the `[k]`
 * numbering contract and the slug translation rule. Prompts are rendered
 * once per language at startup, so every request for a language shares a
 * byte-identical system prompt - which is also what makes provider-side
 * prompt caching effective. An unsupported language fails here, at resolve
 * time, never mid-job.
 */

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::errors::ValidationError;
use crate::language_utils::LANGUAGES;

/// Single-item prompt: full model attention on one cell, tags preserved verbatim.
const SINGLE_TEMPLATE: &str = "\
You are a professional e-commerce translator.
Translate the content into {language}.
IMPORTANT RULES:
- Keep ALL HTML tags exactly as they are (<p>, <br>, <strong>, <div>, <span>, etc.)
- Do NOT translate: brand names, product codes, numbers, URLs, HTML attributes
- Translate ONLY the visible text between tags
- Reply with ONLY the translated content, no preamble and no notes
- If the content is empty or contains only HTML without text, return it as is";

/// Batch prompt: adds the numbered-line contract and the slug rule.
const BATCH_TEMPLATE: &str = "\
You are a professional e-commerce translator.
Each input line starts with a numeric marker like [1], [2], [3].
Translate each line into {language}.
IMPORTANT RULES:
- Start every translated line with the same [k] marker as its input line, in the same order
- One translation per input line, never merge or skip lines
- Do NOT translate: brand names, product codes, numbers, URLs
- For hyphen-separated handle values (like kids-christmas-sweater), translate each word and keep the hyphens
- Reply with ONLY the numbered translations, nothing else";

/// The rendered prompt pair for one target language
#[derive(Debug, Clone)]
pub struct PromptPair {
    /// Single-item / markup prompt
    pub single: String,
    /// Multi-item batch prompt
    pub batch: String,
}

impl PromptPair {
    /// Select the variant for a batch shape.
    ///
    /// Markup cells and one-text batches use the single-item prompt; only
    /// genuine multi-item batches carry the numbering contract.
    pub fn select(&self, is_markup: bool, text_count: usize) -> &str {
        if is_markup || text_count <= 1 {
            &self.single
        } else {
            &self.batch
        }
    }
}

static PROMPTS: Lazy<HashMap<&'static str, PromptPair>> = Lazy::new(|| {
    LANGUAGES
        .iter()
        .map(|lang| {
            let pair = PromptPair {
                single: SINGLE_TEMPLATE.replace("{language}", lang.name),
                batch: BATCH_TEMPLATE.replace("{language}", lang.name),
            };
            (lang.code, pair)
        })
        .collect()
});

/// Resolve the prompt pair for a target language.
pub fn resolve(language_code: &str) -> Result<&'static PromptPair, ValidationError> {
    let code = language_code.to_lowercase();
    PROMPTS
        .get(code.as_str())
        .ok_or(ValidationError::UnsupportedLanguage(code))
}
