/*!
 * Target language utilities.
 *
 * The set of supported target languages is deliberately closed: a language is
 * only usable if a prompt pair has been authored for it (see
 * `translation::prompts`). Validation against this table happens at job
 * initialization, before any network call.
 */

use anyhow::{Result, anyhow};

/// A supported target language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// ISO 639-1 code
    pub code: &'static str,
    /// English display name
    pub name: &'static str,
    /// Name in the language itself
    pub native_name: &'static str,
}

/// All languages the translator can target
pub const LANGUAGES: &[Language] = &[
    Language { code: "fr", name: "French", native_name: "Français" },
    Language { code: "en", name: "English", native_name: "English" },
    Language { code: "de", name: "German", native_name: "Deutsch" },
    Language { code: "es", name: "Spanish", native_name: "Español" },
    Language { code: "it", name: "Italian", native_name: "Italiano" },
    Language { code: "pt", name: "Portuguese", native_name: "Português" },
    Language { code: "nl", name: "Dutch", native_name: "Nederlands" },
    Language { code: "pl", name: "Polish", native_name: "Polski" },
    Language { code: "sv", name: "Swedish", native_name: "Svenska" },
    Language { code: "da", name: "Danish", native_name: "Dansk" },
    Language { code: "zh", name: "Simplified Chinese", native_name: "简体中文" },
    Language { code: "ja", name: "Japanese", native_name: "日本語" },
    Language { code: "ko", name: "Korean", native_name: "한국어" },
    Language { code: "fi", name: "Finnish", native_name: "Suomi" },
];

/// Look up a language by its ISO code
pub fn find_language(code: &str) -> Option<&'static Language> {
    let code = code.to_lowercase();
    LANGUAGES.iter().find(|l| l.code == code)
}

/// Check whether a target language code is supported
pub fn is_supported(code: &str) -> bool {
    find_language(code).is_some()
}

/// Get the English display name for a language code
pub fn get_language_name(code: &str) -> Result<&'static str> {
    find_language(code)
        .map(|l| l.name)
        .ok_or_else(|| anyhow!("Unsupported language code: {}", code))
}

/// All supported language codes, in table order
pub fn supported_codes() -> Vec<&'static str> {
    LANGUAGES.iter().map(|l| l.code).collect()
}
