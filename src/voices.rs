//! Target-language catalog.
//!
//! Maps a human language name to its ISO code (for translation requests)
//! and a neural TTS voice id (for synthesis). Unknown languages fall back
//! to Spanish, the service's original default.

/// Metadata for one supported target language.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageInfo {
    /// Lowercase human name used in submissions (e.g. "spanish").
    pub name: &'static str,
    /// ISO code sent to the translation service.
    pub code: &'static str,
    /// TTS voice identifier.
    pub voice: &'static str,
}

/// Catalog of supported target languages.
pub const LANGUAGES: &[LanguageInfo] = &[
    LanguageInfo {
        name: "spanish",
        code: "es",
        voice: "es-ES-AlvaroNeural",
    },
    LanguageInfo {
        name: "french",
        code: "fr",
        voice: "fr-FR-HenriNeural",
    },
    LanguageInfo {
        name: "german",
        code: "de",
        voice: "de-DE-ConradNeural",
    },
    LanguageInfo {
        name: "japanese",
        code: "ja",
        voice: "ja-JP-KeitaNeural",
    },
    LanguageInfo {
        name: "chinese",
        code: "zh-cn",
        voice: "zh-CN-YunxiNeural",
    },
    LanguageInfo {
        name: "korean",
        code: "ko",
        voice: "ko-KR-InJoonNeural",
    },
    LanguageInfo {
        name: "portuguese",
        code: "pt",
        voice: "pt-BR-AntonioNeural",
    },
    LanguageInfo {
        name: "italian",
        code: "it",
        voice: "it-IT-DiegoNeural",
    },
    LanguageInfo {
        name: "arabic",
        code: "ar",
        voice: "ar-SA-HamedNeural",
    },
    LanguageInfo {
        name: "hindi",
        code: "hi",
        voice: "hi-IN-MadhurNeural",
    },
    LanguageInfo {
        name: "russian",
        code: "ru",
        voice: "ru-RU-DmitryNeural",
    },
    LanguageInfo {
        name: "turkish",
        code: "tr",
        voice: "tr-TR-AhmetNeural",
    },
];

/// Looks up a language by name (case-insensitive).
pub fn get_language(name: &str) -> Option<&'static LanguageInfo> {
    let lowered = name.to_lowercase();
    LANGUAGES.iter().find(|l| l.name == lowered)
}

/// ISO code for a target language, defaulting to Spanish.
pub fn language_code(name: &str) -> &'static str {
    get_language(name).map(|l| l.code).unwrap_or("es")
}

/// TTS voice id for a target language, defaulting to Spanish.
pub fn language_voice(name: &str) -> &'static str {
    get_language(name)
        .map(|l| l.voice)
        .unwrap_or("es-ES-AlvaroNeural")
}

/// All supported languages, for listings.
pub fn list_languages() -> &'static [LanguageInfo] {
    LANGUAGES
}
