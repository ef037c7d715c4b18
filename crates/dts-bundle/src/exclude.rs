//! Exclusion of program files from the bundle.

use crate::error::BundleError;
use camino::{Utf8Path, Utf8PathBuf};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Used when the caller gives no exclusion patterns.
pub const DEFAULT_EXCLUDE: &str = "node_modules/**/*.d.ts";

/// Glob patterns compiled once and matched against program files.
///
/// Relative patterns match paths relative to the base directory; absolute
/// patterns match the absolute path.
#[derive(Debug, Clone)]
pub struct ExcludeSet {
    base_dir: Utf8PathBuf,
    patterns: Vec<String>,
    globs: GlobSet,
}

impl ExcludeSet {
    pub fn new(base_dir: &Utf8Path, patterns: &[String]) -> Result<Self, BundleError> {
        let patterns: Vec<String> = if patterns.is_empty() {
            vec![DEFAULT_EXCLUDE.to_string()]
        } else {
            patterns
                .iter()
                .map(|p| p.trim_start_matches("./").to_string())
                .collect()
        };

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|err| {
                    BundleError::Configuration(format!(
                        "invalid exclude pattern '{}': {}",
                        pattern, err
                    ))
                })?;
            builder.add(glob);
        }
        let globs = builder
            .build()
            .map_err(|err| BundleError::Configuration(err.to_string()))?;

        Ok(Self {
            base_dir: base_dir.to_owned(),
            patterns,
            globs,
        })
    }

    /// The effective patterns.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_excluded(&self, path: &Utf8Path) -> bool {
        if self.globs.is_match(path) {
            return true;
        }
        path.strip_prefix(&self.base_dir)
            .map(|relative| self.globs.is_match(relative))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pattern() {
        let set = ExcludeSet::new(Utf8Path::new("/project"), &[]).unwrap();
        assert_eq!(set.patterns(), ["node_modules/**/*.d.ts"]);
        assert!(set.is_excluded(Utf8Path::new("/project/node_modules/dep/index.d.ts")));
        assert!(set.is_excluded(Utf8Path::new("/project/node_modules/@scope/dep/lib/a.d.ts")));
        assert!(!set.is_excluded(Utf8Path::new("/project/src/index.ts")));
        assert!(!set.is_excluded(Utf8Path::new("/project/src/node_modules.d.ts")));
    }

    #[test]
    fn test_relative_and_absolute_patterns() {
        let set = ExcludeSet::new(
            Utf8Path::new("/project"),
            &["./tests/**/*.ts".to_string(), "/project/legacy.ts".to_string()],
        )
        .unwrap();
        assert!(set.is_excluded(Utf8Path::new("/project/tests/unit/a.ts")));
        assert!(set.is_excluded(Utf8Path::new("/project/legacy.ts")));
        assert!(!set.is_excluded(Utf8Path::new("/project/index.ts")));
        // Custom patterns replace the default
        assert!(!set.is_excluded(Utf8Path::new("/project/node_modules/dep/index.d.ts")));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = ExcludeSet::new(Utf8Path::new("/project"), &["a[".to_string()]).unwrap_err();
        assert!(matches!(err, BundleError::Configuration(_)));
    }
}
