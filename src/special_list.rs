//! Special client list — publications mentioning these names are
//! silently skipped instead of filed as cards.
//!
//! Loaded once at startup from a newline-delimited file (`#` comments and
//! blank lines ignored). A missing file is not an error: the list is then
//! empty and never matches, so the bot runs fine with the feature
//! unconfigured.

use std::path::Path;

use tracing::{info, warn};

use crate::text::normalize;

/// Normalized client names checked against every publication.
#[derive(Debug, Clone, Default)]
pub struct SpecialList {
    entries: Vec<String>,
}

impl SpecialList {
    /// Load the list from `path`. Absent file ⇒ empty list (fail-open).
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Special list not found, running with empty list");
                return Self::default();
            }
        };

        let list = Self::from_lines(&content);
        info!(path = %path.display(), entries = list.entries.len(), "Special list loaded");
        list
    }

    /// Build a list from newline-delimited content.
    pub fn from_lines(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(normalize)
            .collect();
        Self { entries }
    }

    /// Build a list from raw entries (used in tests and config overrides).
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries.into_iter().map(|e| normalize(e.as_ref())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check whether any configured name appears in the publication text.
    ///
    /// The input is normalized once; entries are tested in load order and
    /// the first hit wins.
    pub fn matches(&self, publication_text: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let haystack = normalize(publication_text);
        self.entries
            .iter()
            .find(|name| haystack.contains(name.as_str()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn matches_accent_and_case_insensitive() {
        let list = SpecialList::from_entries(["ACME CORP"]);
        assert_eq!(
            list.matches("cliente: Acme Corp, processo 0001"),
            Some("ACME CORP")
        );
    }

    #[test]
    fn first_entry_wins_on_ties() {
        let list = SpecialList::from_entries(["Banco Azul", "Azul"]);
        assert_eq!(list.matches("intimação do BANCO AZUL S.A."), Some("BANCO AZUL"));
    }

    #[test]
    fn empty_list_never_matches() {
        let list = SpecialList::default();
        assert_eq!(list.matches("qualquer publicação"), None);
    }

    #[test]
    fn from_lines_skips_comments_and_blanks() {
        let list = SpecialList::from_lines("# clientes\n\nJosé & Filhos\n  \n# fim\nACME\n");
        assert_eq!(list.len(), 2);
        assert_eq!(list.matches("contrato da JOSE & FILHOS ltda"), Some("JOSE & FILHOS"));
    }

    #[test]
    fn load_missing_file_is_fail_open() {
        let list = SpecialList::load(Path::new("/nonexistent/lista_especial.txt"));
        assert!(list.is_empty());
        assert_eq!(list.matches("ACME"), None);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# lista\nConstrutora Horizonte\n").unwrap();
        let list = SpecialList::load(file.path());
        assert_eq!(list.len(), 1);
        assert_eq!(
            list.matches("POLO ATIVO: CONSTRUTORA HORIZONTE LTDA"),
            Some("CONSTRUTORA HORIZONTE")
        );
    }
}
