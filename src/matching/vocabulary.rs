//! Known-name vocabulary
//!
//! Loaded once at startup and shared read-only between scans.

use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::error::DetectError;

const BUILTIN_NAMES: &str = include_str!("../../data/pokedex_gen1.txt");

/// Ordered list of valid names
///
/// Order matters: when two names score the same the earlier one wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    names: Vec<String>,
}

impl Vocabulary {
    /// Build a vocabulary from names, dropping blanks and later duplicates
    pub fn new<I, S>(names: I) -> Result<Self, DetectError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();

        for name in names {
            let name: String = name.into();
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if seen.insert(name.to_string()) {
                kept.push(name.to_string());
            }
        }

        if kept.is_empty() {
            return Err(DetectError::Vocabulary("vocabulary is empty".to_string()));
        }

        Ok(Self { names: kept })
    }

    /// The first-generation names shipped with the binary
    pub fn builtin() -> Self {
        Self {
            names: parse_lines(BUILTIN_NAMES),
        }
    }

    /// Load from a file
    ///
    /// `.json` files hold an array of strings; anything else is one name per
    /// line with `#` comments.
    pub fn load(path: &Path) -> Result<Self, DetectError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DetectError::Vocabulary(format!("failed to read {}: {e}", path.display()))
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let names = if is_json {
            serde_json::from_str::<Vec<String>>(&content).map_err(|e| {
                DetectError::Vocabulary(format!("invalid JSON in {}: {e}", path.display()))
            })?
        } else {
            parse_lines(&content)
        };

        let vocabulary = Self::new(names)?;
        info!("Loaded {} names from {:?}", vocabulary.len(), path);
        Ok(vocabulary)
    }

    /// Load from `path` if given, otherwise use the built-in list
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, DetectError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let vocabulary = Self::builtin();
                debug!("Using built-in vocabulary ({} names)", vocabulary.len());
                Ok(vocabulary)
            }
        }
    }

    /// Names in vocabulary order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_vocabulary() {
        let vocabulary = Vocabulary::builtin();
        assert_eq!(vocabulary.len(), 150);
        assert!(vocabulary.contains("Pikachu"));
        assert!(vocabulary.contains("Mew"));
        assert_eq!(vocabulary.names().next(), Some("Bulbasaur"));
    }

    #[test]
    fn test_new_drops_duplicates_and_blanks() {
        let vocabulary = Vocabulary::new(["Pikachu", " ", "Raichu", "Pikachu"]).unwrap();
        let names: Vec<&str> = vocabulary.names().collect();
        assert_eq!(names, vec!["Pikachu", "Raichu"]);
    }

    #[test]
    fn test_new_rejects_empty() {
        let result = Vocabulary::new(Vec::<String>::new());
        assert!(matches!(result, Err(DetectError::Vocabulary(_))));
    }

    #[test]
    fn test_load_text_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# custom list").unwrap();
        writeln!(file, "Pikachu").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  Eevee  ").unwrap();

        let vocabulary = Vocabulary::load(file.path()).unwrap();
        let names: Vec<&str> = vocabulary.names().collect();
        assert_eq!(names, vec!["Pikachu", "Eevee"]);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"["Salamèche", "Carapuce", "Bulbizarre"]"#).unwrap();

        let vocabulary = Vocabulary::load(file.path()).unwrap();
        assert_eq!(vocabulary.len(), 3);
        assert!(vocabulary.contains("Salamèche"));
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{not an array").unwrap();

        assert!(Vocabulary::load(file.path()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Vocabulary::load(Path::new("/nonexistent/pokedex.txt"));
        assert!(matches!(result, Err(DetectError::Vocabulary(_))));
    }

    #[test]
    fn test_load_or_builtin() {
        let vocabulary = Vocabulary::load_or_builtin(None).unwrap();
        assert_eq!(vocabulary, Vocabulary::builtin());
    }
}
