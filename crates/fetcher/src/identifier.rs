//! Item identifiers and their mapping onto URL segments and local paths.
//!
//! An identifier is used verbatim: new-style ids such as `1910.02474` are a
//! single segment, old-style ids such as `hep-th/9901001` span two. The only
//! checks made are the ones that keep the local path beneath the download
//! and extraction roots.

use crate::error::FetchError;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// A validated item identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Validates an identifier so it can be joined onto a local root.
    ///
    /// Rejects:
    /// - empty identifiers
    /// - absolute paths
    /// - `.` and `..` segments
    /// - empty segments (`a//b`, leading or trailing `/`)
    ///
    /// # Examples
    ///
    /// ```
    /// use fetcher::Identifier;
    ///
    /// let id = Identifier::new("hep-th/9901001").unwrap();
    /// assert_eq!(id.segments().collect::<Vec<_>>(), ["hep-th", "9901001"]);
    ///
    /// assert!(Identifier::new("../etc/passwd").is_err());
    /// ```
    pub fn new(identifier: impl Into<String>) -> Result<Self, FetchError> {
        let identifier = identifier.into();
        let reject = |reason: &str| FetchError::InvalidIdentifier {
            identifier: identifier.clone(),
            reason: reason.to_string(),
        };

        if identifier.is_empty() {
            return Err(reject("identifier is empty"));
        }

        if Path::new(&identifier).is_absolute() || identifier.starts_with('/') {
            return Err(reject("absolute path not allowed"));
        }

        for segment in identifier.split('/') {
            match segment {
                "" => return Err(reject("empty path segment")),
                "." | ".." => return Err(reject("relative path segment")),
                _ => {}
            }
        }

        // Catches platform-specific forms such as `C:` or `a\..\b` on Windows.
        let escapes = Path::new(&identifier)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(reject("path escapes the output directory"));
        }

        Ok(Self(identifier))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Segments appended to the e-print URL path.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// The identifier as a path relative to an output root.
    pub fn relative_path(&self) -> PathBuf {
        self.segments().collect()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_style_identifier() {
        let id = Identifier::new("1910.02474").unwrap();
        assert_eq!(id.as_str(), "1910.02474");
        assert_eq!(id.relative_path(), Path::new("1910.02474"));
        assert_eq!(id.segments().count(), 1);
    }

    #[test]
    fn test_old_style_identifier() {
        let id = Identifier::new("hep-th/9901001").unwrap();
        assert_eq!(id.relative_path(), Path::new("hep-th").join("9901001"));
        assert_eq!(id.to_string(), "hep-th/9901001");
    }

    #[test]
    fn test_versioned_and_unusual_identifiers_pass_through() {
        for raw in ["1910.02474v2", "odd name", "a#b", "q?x=1", "日本"] {
            let id = Identifier::new(raw).unwrap();
            assert_eq!(id.as_str(), raw);
        }
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(
            Identifier::new(""),
            Err(FetchError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_rejects_absolute() {
        assert!(Identifier::new("/etc/passwd").is_err());
    }

    #[test]
    fn test_rejects_traversal() {
        assert!(Identifier::new("..").is_err());
        assert!(Identifier::new("../secret").is_err());
        assert!(Identifier::new("hep-th/../../x").is_err());
        assert!(Identifier::new("./1910.02474").is_err());
    }

    #[test]
    fn test_rejects_empty_segments() {
        assert!(Identifier::new("hep-th//9901001").is_err());
        assert!(Identifier::new("hep-th/").is_err());
    }

    #[test]
    fn test_from_str() {
        let id: Identifier = "1910.02474".parse().unwrap();
        assert_eq!(id.as_ref(), "1910.02474");
    }
}
