//! Candidate slugs: `uf-name-words`, e.g. `pe-nunes-rafael-mendes-coelho`.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WHITESPACE_RX: Regex = Regex::new(r"\s+").unwrap();
    static ref NON_WORD_RX: Regex = Regex::new(r"[^A-Za-z0-9_-]+").unwrap();
    static ref DASHES_RX: Regex = Regex::new(r"-{2,}").unwrap();
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("Parameter slug is required")]
    Missing,
    #[error("Invalid slug format: {0}")]
    Malformed(String),
}

/// A candidate slug split into its state code and name components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSlug {
    /// Upper-cased state code, e.g. `PE`.
    pub uf: String,
    /// Name part as it appeared in the slug, e.g. `nunes-rafael`.
    pub name_slug: String,
    /// Name part upper-cased with dashes as spaces, e.g. `NUNES RAFAEL`.
    pub full_name: String,
}

pub fn parse_candidate_slug(slug: &str) -> Result<CandidateSlug, SlugError> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(SlugError::Missing);
    }

    let mut parts = slug.split('-');
    let uf = parts.next().unwrap_or_default();
    let name_parts: Vec<&str> = parts.collect();

    if uf.is_empty() || name_parts.is_empty() || name_parts.iter().all(|p| p.is_empty()) {
        return Err(SlugError::Malformed(slug.to_string()));
    }

    let name_slug = name_parts.join("-");
    let full_name = name_slug.to_uppercase().replace('-', " ");

    Ok(CandidateSlug {
        uf: uf.to_uppercase(),
        name_slug,
        full_name,
    })
}

/// Strip diacritics: NFD decomposition with combining marks removed.
pub fn fold_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

pub fn slugify(text: &str) -> String {
    let folded = fold_accents(text).to_lowercase();
    let dashed = WHITESPACE_RX.replace_all(folded.trim(), "-");
    let cleaned = NON_WORD_RX.replace_all(&dashed, "");
    let collapsed = DASHES_RX.replace_all(&cleaned, "-");
    collapsed.trim_matches('-').to_string()
}

pub fn candidate_slug(uf: &str, name: &str) -> String {
    format!("{}-{}", slugify(uf), slugify(name))
}

/// Distinctive words (length >= 4) of a name slug, upper-cased: the first one
/// and the second-to-last one (or the only one).
pub fn distinctive_words(name_slug: &str) -> Vec<String> {
    let words: Vec<&str> = name_slug.split('-').filter(|w| w.len() >= 4).collect();

    match words.len() {
        0 => Vec::new(),
        1 => vec![words[0].to_uppercase()],
        n => vec![words[0].to_uppercase(), words[n - 2].to_uppercase()],
    }
}

/// Two-letter state code, upper-cased.
pub fn normalize_uf(raw: &str) -> Option<String> {
    let uf = raw.trim();
    if uf.len() == 2 && uf.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(uf.to_ascii_uppercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_candidate_slug() {
        let parsed = parse_candidate_slug("pe-nunes-rafael-mendes-coelho").unwrap();
        assert_eq!("PE", parsed.uf);
        assert_eq!("nunes-rafael-mendes-coelho", parsed.name_slug);
        assert_eq!("NUNES RAFAEL MENDES COELHO", parsed.full_name);
    }

    #[test]
    fn test_parse_rejects_bad_slugs() {
        assert_eq!(Err(SlugError::Missing), parse_candidate_slug("  "));
        assert!(matches!(parse_candidate_slug("pe"), Err(SlugError::Malformed(_))));
        assert!(matches!(parse_candidate_slug("-joao"), Err(SlugError::Malformed(_))));
        assert!(matches!(parse_candidate_slug("pe-"), Err(SlugError::Malformed(_))));
    }

    #[test]
    fn test_slugify() {
        assert_eq!("joao-andre-da-conceicao", slugify("  JOÃO ANDRÉ  DA CONCEIÇÃO "));
        assert_eq!("davila", slugify("D'ÁVILA"));
        assert_eq!("ze-do-povo", slugify("ZÉ - DO POVO"));
        assert_eq!("", slugify("---"));
    }

    #[test]
    fn test_candidate_slug() {
        assert_eq!("pe-george-bastos", candidate_slug("PE", "GEORGE BASTOS"));
    }

    #[test]
    fn test_distinctive_words() {
        assert!(distinctive_words("ze-da-luz").is_empty());
        assert_eq!(vec!["RAFAEL"], distinctive_words("ze-rafael"));
        assert_eq!(
            vec!["NUNES", "MENDES"],
            distinctive_words("nunes-rafael-mendes-coelho")
        );
        assert_eq!(vec!["NUNES", "NUNES"], distinctive_words("nunes-coelho"));
    }

    #[test]
    fn test_fold_accents() {
        assert_eq!("NAO ELEITO", fold_accents("NÃO ELEITO"));
        assert_eq!("MEDIA", fold_accents("MÉDIA"));
    }

    #[test]
    fn test_normalize_uf() {
        assert_eq!(Some("SP".to_string()), normalize_uf("sp"));
        assert_eq!(None, normalize_uf("SPX"));
        assert_eq!(None, normalize_uf("1A"));
    }
}
