//! Language codes and display names.
//!
//! Prompts use full language names ("Polish", "Brazilian Portuguese"); book
//! metadata gets a normalized BCP 47 tag ("pl", "pt-BR").

/// Normalize case and separators of a language tag.
///
/// `PL` -> `pl`, `pt_br` -> `pt-BR`, `zh-hant-tw` -> `zh-Hant-TW`.
pub fn normalize_tag(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .filter(|part| !part.is_empty())
        .enumerate()
        .map(|(idx, part)| {
            if idx == 0 {
                part.to_ascii_lowercase()
            } else if part.len() == 4 && part.chars().all(|c| c.is_ascii_alphabetic()) {
                let mut script = part.to_ascii_lowercase();
                script[..1].make_ascii_uppercase();
                script
            } else if part.len() == 2 || (part.len() == 3 && part.chars().all(|c| c.is_ascii_digit())) {
                part.to_ascii_uppercase()
            } else {
                part.to_ascii_lowercase()
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Names for tags whose regional variant has a common English name.
const VARIANT_NAMES: &[(&str, &str)] = &[
    ("en-US", "American English"),
    ("en-GB", "British English"),
    ("en-AU", "Australian English"),
    ("en-CA", "Canadian English"),
    ("es-ES", "European Spanish"),
    ("es-MX", "Mexican Spanish"),
    ("es-419", "Latin American Spanish"),
    ("pt-BR", "Brazilian Portuguese"),
    ("pt-PT", "European Portuguese"),
    ("fr-CA", "Canadian French"),
    ("fr-CH", "Swiss French"),
    ("de-AT", "Austrian German"),
    ("de-CH", "Swiss High German"),
    ("nl-BE", "Flemish"),
    ("zh-Hans", "Simplified Chinese"),
    ("zh-Hant", "Traditional Chinese"),
];

fn language_name(language: &str) -> Option<&'static str> {
    let name = match language {
        "ar" => "Arabic",
        "bg" => "Bulgarian",
        "ca" => "Catalan",
        "cs" => "Czech",
        "da" => "Danish",
        "de" => "German",
        "el" => "Greek",
        "en" => "English",
        "eo" => "Esperanto",
        "es" => "Spanish",
        "et" => "Estonian",
        "fa" => "Persian",
        "fi" => "Finnish",
        "fr" => "French",
        "ga" => "Irish",
        "he" => "Hebrew",
        "hi" => "Hindi",
        "hr" => "Croatian",
        "hu" => "Hungarian",
        "id" => "Indonesian",
        "is" => "Icelandic",
        "it" => "Italian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "la" => "Latin",
        "lt" => "Lithuanian",
        "lv" => "Latvian",
        "nb" => "Norwegian Bokmål",
        "nl" => "Dutch",
        "no" => "Norwegian",
        "pl" => "Polish",
        "pt" => "Portuguese",
        "ro" => "Romanian",
        "ru" => "Russian",
        "sk" => "Slovak",
        "sl" => "Slovenian",
        "sr" => "Serbian",
        "sv" => "Swedish",
        "th" => "Thai",
        "tr" => "Turkish",
        "uk" => "Ukrainian",
        "vi" => "Vietnamese",
        "zh" => "Chinese",
        _ => return None,
    };
    Some(name)
}

/// Full English name of a language code.
///
/// Regional variants without a name of their own render as
/// `Language (REGION)`. Unknown languages come back as given.
pub fn full_language_name(code: &str) -> String {
    let tag = normalize_tag(code);

    // Longest known prefix wins: zh-Hant-TW -> zh-Hant
    let mut prefix = tag.as_str();
    loop {
        if let Some((_, name)) = VARIANT_NAMES.iter().find(|(variant, _)| *variant == prefix) {
            return name.to_string();
        }
        match prefix.rsplit_once('-') {
            Some((head, _)) if head.contains('-') => prefix = head,
            _ => break,
        }
    }

    let mut parts = tag.splitn(2, '-');
    let language = parts.next().unwrap_or_default();
    match (language_name(language), parts.next()) {
        (Some(name), None) => name.to_string(),
        (Some(name), Some(rest)) => format!("{} ({})", name, rest),
        (None, _) => code.trim().to_string(),
    }
}
