use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered sequence of name segments identifying a module.
///
/// An empty path means "the current module or a builtin".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Path {
    pub segments: Vec<String>,
}

impl Path {
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a path from `::`-separated text; `""` yields the empty path.
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self::empty();
        }
        Self {
            segments: text.split("::").map(str::to_string).collect(),
        }
    }

    pub fn from_slice(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|seg| seg.to_string()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn head(&self) -> Option<&str> {
        self.segments.first().map(|seg| seg.as_str())
    }

    pub fn tail(&self) -> Option<&str> {
        self.segments.last().map(|seg| seg.as_str())
    }

    pub fn with_segment(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    pub fn to_key(&self) -> String {
        self.segments.join("::")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_segments() {
        let path = Path::parse("alox::main");
        assert_eq!(path.segments, vec!["alox", "main"]);
        assert_eq!(path.to_string(), "alox::main");
        assert_eq!(path.with_segment("inner").tail(), Some("inner"));
    }

    #[test]
    fn empty_text_is_empty_path() {
        assert!(Path::parse("").is_empty());
        assert_eq!(Path::parse(""), Path::empty());
    }
}
