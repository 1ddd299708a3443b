//! Text normalization and cleanup.
//!
//! Court systems emit inconsistent text: HTML-escaped bodies, mixed
//! accent usage, OCR artifacts. Everything here is pure string work so
//! the matchers downstream can rely on a single canonical form.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Upper-case and strip combining diacritical marks (NFD, marks removed).
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    text.to_uppercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Lower-case, accent-folded copy of `text` plus a byte-offset map back
/// into the original.
///
/// Folding changes byte lengths ("ç" is two bytes, "c" is one), so match
/// positions found in the folded copy cannot index the original directly.
/// `map[i]` gives the original byte offset of the character that produced
/// folded byte `i`; slicing the original at `map[m.start()]` is always a
/// char boundary.
pub fn fold_for_matching(text: &str) -> (String, Vec<usize>) {
    let mut folded = String::with_capacity(text.len());
    let mut map = Vec::with_capacity(text.len());

    for (orig_idx, ch) in text.char_indices() {
        for base in ch.nfd().filter(|c| !is_combining_mark(*c)) {
            for low in base.to_lowercase() {
                let before = folded.len();
                folded.push(low);
                for _ in before..folded.len() {
                    map.push(orig_idx);
                }
            }
        }
    }

    (folded, map)
}

static RE_BR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<\s*br\s*/?\s*>").unwrap());
static RE_PARA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</\s*p\s*>").unwrap());
static RE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</\s*(div|tr|li)\s*>").unwrap());
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static RE_BLANKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n+").unwrap());
static RE_ENTITY_DEC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#(\d+);").unwrap());
static RE_ENTITY_HEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#x([0-9a-fA-F]+);").unwrap());
static RE_CONTROL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f]").unwrap());

/// Decode the HTML entities that actually show up in court mail.
pub fn unescape_entities(text: &str) -> String {
    let text = RE_ENTITY_DEC.replace_all(text, |caps: &regex::Captures| {
        caps[1]
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    let text = RE_ENTITY_HEX.replace_all(&text, |caps: &regex::Captures| {
        u32::from_str_radix(&caps[1], 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Convert an HTML body to clean plain text.
///
/// Entities unescaped, line-break tags become newlines, remaining tags
/// stripped, whitespace collapsed, control characters removed.
pub fn clean_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let text = unescape_entities(html);
    let text = RE_BR.replace_all(&text, "\n");
    let text = RE_PARA.replace_all(&text, "\n\n");
    let text = RE_BLOCK.replace_all(&text, "\n");
    let text = RE_TAG.replace_all(&text, " ");
    let text = RE_CONTROL.replace_all(&text, "");
    tidy_whitespace(&text)
}

/// Collapse runs of spaces/tabs and excessive blank lines.
pub fn tidy_whitespace(text: &str) -> String {
    let text = RE_SPACES.replace_all(text, " ");
    let text = RE_BLANKS.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_and_accents() {
        assert_eq!(normalize("Petição"), normalize("PETICAO"));
        assert_eq!(normalize("Sentença"), "SENTENCA");
        assert_eq!(normalize("ação ordinária"), "ACAO ORDINARIA");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("Publicação: Decisão Interlocutória");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn fold_preserves_offsets_into_original() {
        let original = "Publicação: 1. PROCESSO";
        let (folded, map) = fold_for_matching(original);
        assert_eq!(folded, "publicacao: 1. processo");

        let pos = folded.find("1").unwrap();
        assert_eq!(&original[map[pos]..map[pos] + 1], "1");

        // Offset past the multibyte "çã" still lands on a char boundary.
        let pos = folded.find("processo").unwrap();
        assert!(original.is_char_boundary(map[pos]));
        assert!(original[map[pos]..].starts_with("PROCESSO"));
    }

    #[test]
    fn fold_handles_plain_ascii() {
        let (folded, map) = fold_for_matching("ABC def");
        assert_eq!(folded, "abc def");
        assert_eq!(map.len(), folded.len());
        assert_eq!(map[4], 4);
    }

    #[test]
    fn clean_html_strips_tags_and_entities() {
        let html = "<p>Prazo de 15 dias</p><br>POLO ATIVO: Jo&#227;o &amp; Cia";
        let text = clean_html(html);
        assert!(text.contains("Prazo de 15 dias"));
        assert!(text.contains("& Cia"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn clean_html_decodes_numeric_entities() {
        assert_eq!(clean_html("Jo&#227;o &#x26; filhos"), "João & filhos");
    }

    #[test]
    fn clean_html_converts_breaks_to_newlines() {
        let text = clean_html("linha um<br/>linha dois</p>fim");
        assert!(text.contains("linha um\nlinha dois"));
    }

    #[test]
    fn tidy_whitespace_collapses_runs() {
        assert_eq!(
            tidy_whitespace("a  \t b\n\n\n\n\nc"),
            "a b\n\nc"
        );
    }
}
