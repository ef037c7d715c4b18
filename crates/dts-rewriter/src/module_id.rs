//! Path to module identifier mapping.

use camino::Utf8Path;
use std::path::MAIN_SEPARATOR;

/// Suffixes stripped from file names, longest first.
const MODULE_SUFFIXES: &[&str] = &[
    ".d.mts", ".d.cts", ".d.ts", ".tsx", ".mts", ".cts", ".ts",
];

/// Script extensions written in specifiers under `node16`/`nodenext`.
const SCRIPT_EXTENSIONS: &[&str] = &[".js", ".jsx", ".mjs", ".cjs"];

/// Converts platform path separators to `/`.
pub fn filename_to_mid(filename: &str) -> String {
    filename.replace(MAIN_SEPARATOR, "/")
}

/// Strips a declaration or TypeScript source suffix from a file name.
pub fn strip_module_suffix(filename: &str) -> &str {
    MODULE_SUFFIXES
        .iter()
        .find_map(|suffix| filename.strip_suffix(suffix))
        .unwrap_or(filename)
}

/// Computes the module identifier of `path` relative to `root`.
///
/// The result uses `/` separators, has no leading separator and no suffix.
/// When `name` is non-empty it is prepended as the first segment.
pub fn to_module_id(path: &Utf8Path, root: &Utf8Path, name: Option<&str>) -> String {
    let relative = path
        .strip_prefix(root)
        .map(|rel| rel.as_str())
        .unwrap_or(path.as_str());
    let mid = filename_to_mid(strip_module_suffix(relative));
    let mid = mid.trim_start_matches('/');

    match name.filter(|name| !name.is_empty()) {
        Some(name) => format!("{}/{}", name.trim_end_matches('/'), mid),
        None => mid.to_string(),
    }
}

/// Resolves a relative specifier against the directory of `current_module_id`.
///
/// `.` and `..` segments are folded; parents that climb above the first
/// segment are kept, matching a plain path join. A trailing script or
/// TypeScript extension is dropped so the result names a module block.
pub fn resolve_relative(current_module_id: &str, specifier: &str) -> String {
    let mut segments: Vec<&str> = match current_module_id.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    };

    let specifier = filename_to_mid(specifier);
    for segment in specifier.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return ".".to_string();
    }
    let joined = segments.join("/");
    let without_script = SCRIPT_EXTENSIONS
        .iter()
        .find_map(|ext| joined.strip_suffix(ext))
        .unwrap_or(joined.as_str());
    strip_module_suffix(without_script).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_id_with_name() {
        let id = to_module_id(
            Utf8Path::new("/project/src/sub/Bar.d.ts"),
            Utf8Path::new("/project/src"),
            Some("foo"),
        );
        assert_eq!(id, "foo/sub/Bar");
    }

    #[test]
    fn test_module_id_without_name() {
        let id = to_module_id(
            Utf8Path::new("/project/src/index.d.ts"),
            Utf8Path::new("/project/src"),
            None,
        );
        assert_eq!(id, "index");

        let id = to_module_id(
            Utf8Path::new("/project/src/index.d.ts"),
            Utf8Path::new("/project/src"),
            Some(""),
        );
        assert_eq!(id, "index");
    }

    #[test]
    fn test_strip_suffixes() {
        assert_eq!(strip_module_suffix("a/b.d.ts"), "a/b");
        assert_eq!(strip_module_suffix("a/b.tsx"), "a/b");
        assert_eq!(strip_module_suffix("a/b.ts"), "a/b");
        assert_eq!(strip_module_suffix("a/b.d.mts"), "a/b");
        assert_eq!(strip_module_suffix("a/b.js"), "a/b.js");
    }

    #[test]
    fn test_resolve_relative_sibling() {
        assert_eq!(resolve_relative("foo/index", "./Bar"), "foo/Bar");
        assert_eq!(resolve_relative("foo/sub/a", "../b"), "foo/b");
        assert_eq!(resolve_relative("foo/a", "./sub/../c"), "foo/c");
    }

    #[test]
    fn test_resolve_relative_without_directory() {
        assert_eq!(resolve_relative("index", "./y"), "y");
        assert_eq!(resolve_relative("index", "../x"), "../x");
        assert_eq!(resolve_relative("a/b", ".."), ".");
    }

    #[test]
    fn test_resolve_relative_drops_extensions() {
        assert_eq!(resolve_relative("foo/index", "./Bar.js"), "foo/Bar");
        assert_eq!(resolve_relative("foo/index", "./sub/util.mjs"), "foo/sub/util");
        assert_eq!(resolve_relative("foo/index", "./types.d.ts"), "foo/types");
        assert_eq!(resolve_relative("foo/index", "./data.json"), "foo/data.json");
    }
}
