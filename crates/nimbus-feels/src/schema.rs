//! Ordered feature names the trained model expects.

use crate::error::FeelsLikeError;

/// Feature names in training order. `len()` is the model's input width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Parse the newline-delimited asset. Lines are trimmed, blank lines skipped.
    pub fn from_text(text: &str) -> Result<Self, FeelsLikeError> {
        let names: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self::from_names(names)
    }

    pub fn from_names(names: Vec<String>) -> Result<Self, FeelsLikeError> {
        if names.is_empty() {
            return Err(FeelsLikeError::asset("feature names", "no feature names listed"));
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Find the full name for a short identifier.
    ///
    /// Training pipelines prefix names with a namespace (`num__Humidity`), so
    /// an exact match wins, then a match on a `__` boundary, then any suffix.
    /// Within each tier the first entry in schema order is returned.
    pub fn resolve(&self, short: &str) -> Option<&str> {
        if let Some(exact) = self.names.iter().find(|n| n.as_str() == short) {
            return Some(exact.as_str());
        }

        let suffixed: Vec<&String> = self.names.iter().filter(|n| n.ends_with(short)).collect();
        if suffixed.len() > 1 {
            tracing::debug!(
                "Feature '{}' suffix-matches {} schema entries: {:?}",
                short,
                suffixed.len(),
                suffixed
            );
        }

        let boundary = format!("__{}", short);
        suffixed
            .iter()
            .copied()
            .find(|n| n.ends_with(&boundary))
            .or_else(|| suffixed.first().copied())
            .map(String::as_str)
    }

    /// Identifiers from `shorts` with no schema entry.
    pub fn unresolved<'a>(&self, shorts: &[&'a str]) -> Vec<&'a str> {
        shorts
            .iter()
            .copied()
            .filter(|s| self.resolve(s).is_none())
            .collect()
    }
}
