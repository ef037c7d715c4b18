//! Lexical path helpers.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

const DECLARATION_SUFFIXES: &[&str] = &[".d.ts", ".d.mts", ".d.cts"];

/// Removes `.` components and folds `..` into the preceding component.
///
/// The file system is not consulted, so symlinks are not resolved.
pub fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut components: Vec<Utf8Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => match components.last() {
                Some(Utf8Component::Normal(_)) => {
                    components.pop();
                }
                Some(Utf8Component::RootDir) | Some(Utf8Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            other => components.push(other),
        }
    }
    if components.is_empty() {
        return Utf8PathBuf::from(".");
    }
    components.into_iter().collect()
}

/// Joins a relative `path` onto `cwd` and normalizes the result.
pub fn absolutize(path: &Utf8Path, cwd: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&cwd.join(path))
    }
}

/// Returns true for `.d.ts`, `.d.mts` and `.d.cts` files.
pub fn is_declaration_file(path: &Utf8Path) -> bool {
    let name = path.file_name().unwrap_or_default();
    DECLARATION_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Returns the name of the declaration file the compiler emits for a source
/// file.
pub fn declaration_file_name(source: &Utf8Path) -> Utf8PathBuf {
    match source.extension() {
        Some("mts") | Some("mjs") => source.with_extension("d.mts"),
        Some("cts") | Some("cjs") => source.with_extension("d.cts"),
        _ => source.with_extension("d.ts"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Utf8Path::new("/a/./b/../c")), Utf8Path::new("/a/c"));
        assert_eq!(normalize(Utf8Path::new("/../a")), Utf8Path::new("/a"));
        assert_eq!(normalize(Utf8Path::new("../a/b/..")), Utf8Path::new("../a"));
        assert_eq!(normalize(Utf8Path::new("./")), Utf8Path::new("."));
    }

    #[test]
    fn test_absolutize() {
        let cwd = Utf8Path::new("/project");
        assert_eq!(absolutize(Utf8Path::new("src/a.ts"), cwd), Utf8Path::new("/project/src/a.ts"));
        assert_eq!(absolutize(Utf8Path::new("/other/../b.ts"), cwd), Utf8Path::new("/b.ts"));
    }

    #[test]
    fn test_declaration_names() {
        assert!(is_declaration_file(Utf8Path::new("/a/b.d.ts")));
        assert!(!is_declaration_file(Utf8Path::new("/a/b.ts")));
        assert_eq!(declaration_file_name(Utf8Path::new("sub/Bar.ts")), Utf8Path::new("sub/Bar.d.ts"));
        assert_eq!(declaration_file_name(Utf8Path::new("App.tsx")), Utf8Path::new("App.d.ts"));
        assert_eq!(declaration_file_name(Utf8Path::new("esm.mts")), Utf8Path::new("esm.d.mts"));
    }
}
