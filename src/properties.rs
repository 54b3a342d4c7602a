use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};

/// A flat string-to-string configuration map.
///
/// Properties come from files of `key = value` lines and from command-line
/// overrides; later sources override earlier ones. Lines whose first column
/// is `#` are comments, keys and values are trimmed of surrounding
/// whitespace.
#[derive(Debug, Default, Clone)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Create an empty property map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a property.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Look up a property, falling back to `default`.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Set a property, overriding any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Parse a property if present.
    pub fn parse<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e| anyhow::anyhow!("invalid value {raw:?} for property {key:?}: {e}")),
        }
    }

    /// Parse a property, falling back to `default`.
    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        Ok(self.parse(key)?.unwrap_or(default))
    }

    /// Parse a property that must be present.
    pub fn parse_required<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.parse(key)?
            .with_context(|| format!("missing required property {key:?}"))
    }

    /// Merge the `key = value` lines of `input` into the map.
    pub fn load_str(&mut self, input: &str) {
        for line in input.lines() {
            if line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            self.set(key.trim(), value.trim());
        }
    }

    /// Merge a properties file into the map.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read properties file {}", path.display()))?;
        self.load_str(&content);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn trims_keys_and_values() {
        let mut props = Properties::new();
        props.load_str("  table =  usertable  \nfieldcount=10");
        assert_eq!(props.get("table"), Some("usertable"));
        assert_eq!(props.parse_or("fieldcount", 0usize).unwrap(), 10);
    }

    #[test]
    fn comments_and_garbage_are_skipped() {
        let mut props = Properties::new();
        props.load_str("# a comment\nnot a property line\nkey=value");
        assert!(!props.contains("# a comment"));
        assert_eq!(props.get("key"), Some("value"));
    }

    #[test]
    fn later_sources_override_earlier() {
        let mut props = Properties::new();
        props.load_str("threads=4");
        props.load_str("threads=8");
        assert_eq!(props.get("threads"), Some("8"));
    }

    #[test]
    fn invalid_numbers_are_config_errors() {
        let mut props = Properties::new();
        props.set("recordcount", "not-a-number");
        assert!(props.parse_or("recordcount", 0u64).is_err());
    }

    #[test]
    fn loads_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# workload\nrecordcount = 1000").unwrap();

        let mut props = Properties::new();
        props.load_file(file.path()).unwrap();
        assert_eq!(props.parse_required::<u64>("recordcount").unwrap(), 1000);

        assert!(Properties::new().load_file("/nonexistent/path.properties").is_err());
    }
}
