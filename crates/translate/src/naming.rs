//! Output file naming.

/// Replace every character outside `[A-Za-z0-9._-]` with `-`.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// `<title>_<author>_<model>_t<temperature>_<to_lang>.epub`, lower-cased.
///
/// Missing title or author parts are left out; with neither, `untitled`
/// takes their place.
pub fn generate_book_filename(
    to_lang: &str,
    model: &str,
    temperature: f32,
    title: Option<&str>,
    author: Option<&str>,
) -> String {
    let title = title.filter(|t| !t.is_empty());
    let author = author.filter(|a| !a.is_empty());

    let mut parts: Vec<String> = Vec::new();
    parts.extend(title.map(str::to_string));
    parts.extend(author.map(str::to_string));
    if parts.is_empty() {
        parts.push("untitled".to_string());
    }
    parts.push(model.to_string());
    parts.push(format!("t{}", format_temperature(temperature)));
    parts.push(to_lang.to_string());

    format!("{}.epub", sanitize_text(&parts.join("_")).to_lowercase())
}

/// `0.7` -> `0.7`, `1` -> `1.0`.
fn format_temperature(temperature: f32) -> String {
    if temperature.fract() == 0.0 {
        format!("{:.1}", temperature)
    } else {
        temperature.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_with_all_parts() {
        assert_eq!(
            generate_book_filename("es", "gpt-4", 0.7, Some("The Great Gatsby"), Some("F. Scott Fitzgerald")),
            "the-great-gatsby_f.-scott-fitzgerald_gpt-4_t0.7_es.epub"
        );
    }

    #[test]
    fn test_filename_without_author() {
        assert_eq!(
            generate_book_filename("fr", "gpt-3.5", 0.8, Some("Don Quixote"), None),
            "don-quixote_gpt-3.5_t0.8_fr.epub"
        );
    }

    #[test]
    fn test_filename_without_title() {
        assert_eq!(
            generate_book_filename("de", "gpt-4", 0.9, None, Some("Miguel de Cervantes")),
            "miguel-de-cervantes_gpt-4_t0.9_de.epub"
        );
    }

    #[test]
    fn test_filename_without_title_and_author() {
        assert_eq!(
            generate_book_filename("it", "gpt-3.5", 0.6, None, None),
            "untitled_gpt-3.5_t0.6_it.epub"
        );
        assert_eq!(
            generate_book_filename("PL", "gpt-4o-mini", 1.0, Some(""), None),
            "untitled_gpt-4o-mini_t1.0_pl.epub"
        );
    }

    #[test]
    fn test_sanitize_special_characters() {
        assert_eq!(sanitize_text("Hello! @World% (2023)"), "Hello---World---2023-");
        assert_eq!(sanitize_text("Hello_World-2023.txt"), "Hello_World-2023.txt");
        assert_eq!(sanitize_text("My Book Title"), "My-Book-Title");
        assert_eq!(sanitize_text("Zażółć"), "Za----");
    }
}
