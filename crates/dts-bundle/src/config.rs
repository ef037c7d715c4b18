//! Project configuration loading.

use crate::error::BundleError;
use camino::{Utf8Path, Utf8PathBuf};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use indexmap::IndexSet;
use serde::Deserialize;
use std::fs;
use tsc_runner::{absolutize, normalize, ModuleResolution, ScriptTarget};
use walkdir::WalkDir;

/// Extensions of files picked up by `include` patterns.
const INPUT_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".mts", ".cts"];

const DEFAULT_INCLUDE: &str = "**/*";
const DEFAULT_EXCLUDE: &[&str] = &["node_modules", "bower_components", "jspm_packages"];

/// TypeScript project configuration as written on disk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsConfig {
    extends: Option<Extends>,
    files: Option<Vec<String>>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    #[serde(default)]
    compiler_options: CompilerOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Extends {
    One(String),
    Many(Vec<String>),
}

/// TypeScript compiler options relevant to declaration bundling.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompilerOptions {
    target: Option<String>,
    out_dir: Option<String>,
    root_dir: Option<String>,
    module_resolution: Option<String>,
    jsx: Option<String>,
}

/// Patterns together with the directory they are relative to.
#[derive(Debug, Clone)]
struct PatternList {
    dir: Utf8PathBuf,
    patterns: Vec<String>,
}

/// Settings merged across an `extends` chain, paths already absolute.
#[derive(Debug, Clone, Default)]
struct Layer {
    files: Option<Vec<Utf8PathBuf>>,
    include: Option<PatternList>,
    exclude: Option<PatternList>,
    target: Option<String>,
    out_dir: Option<Utf8PathBuf>,
    root_dir: Option<Utf8PathBuf>,
    module_resolution: Option<String>,
    jsx: Option<String>,
}

impl Layer {
    /// Overrides every setting `other` defines.
    fn apply(&mut self, other: Layer) {
        if other.files.is_some() {
            self.files = other.files;
        }
        if other.include.is_some() {
            self.include = other.include;
        }
        if other.exclude.is_some() {
            self.exclude = other.exclude;
        }
        if other.target.is_some() {
            self.target = other.target;
        }
        if other.out_dir.is_some() {
            self.out_dir = other.out_dir;
        }
        if other.root_dir.is_some() {
            self.root_dir = other.root_dir;
        }
        if other.module_resolution.is_some() {
            self.module_resolution = other.module_resolution;
        }
        if other.jsx.is_some() {
            self.jsx = other.jsx;
        }
    }
}

/// A loaded project configuration.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// The configuration file.
    pub path: Utf8PathBuf,
    /// Effective input files, absolute, in configuration order.
    pub files: Vec<Utf8PathBuf>,
    pub target: Option<ScriptTarget>,
    pub out_dir: Option<Utf8PathBuf>,
    pub root_dir: Option<Utf8PathBuf>,
    pub module_resolution: Option<ModuleResolution>,
    pub jsx: Option<String>,
}

impl ProjectConfig {
    /// Locates the configuration for `project`, a file or a directory
    /// containing `tsconfig.json`.
    pub fn find(project: &Utf8Path) -> Option<Utf8PathBuf> {
        let candidate = if project.is_dir() {
            project.join("tsconfig.json")
        } else {
            project.to_owned()
        };
        candidate.is_file().then_some(candidate)
    }

    /// Loads a configuration file, following `extends`, and expands its
    /// input file list.
    pub fn load(path: &Utf8Path) -> Result<Self, BundleError> {
        let path = normalize(path);
        let mut chain = Vec::new();
        let layer = load_layer(&path, &mut chain)?;
        let dir = parent_dir(&path);

        let invalid = |message: String| BundleError::ConfigParse {
            path: path.clone(),
            message,
        };
        let target = layer
            .target
            .as_deref()
            .map(str::parse::<ScriptTarget>)
            .transpose()
            .map_err(|err| invalid(err.to_string()))?;
        let module_resolution = layer
            .module_resolution
            .as_deref()
            .map(str::parse::<ModuleResolution>)
            .transpose()
            .map_err(|err| invalid(err.to_string()))?;

        let files = expand_inputs(&layer, &dir).map_err(invalid)?;

        Ok(Self {
            path,
            files,
            target,
            out_dir: layer.out_dir,
            root_dir: layer.root_dir,
            module_resolution,
            jsx: layer.jsx,
        })
    }

    /// The directory containing the configuration file.
    pub fn dir(&self) -> Utf8PathBuf {
        parent_dir(&self.path)
    }
}

fn parent_dir(path: &Utf8Path) -> Utf8PathBuf {
    path.parent().map(Utf8Path::to_owned).unwrap_or_default()
}

fn load_layer(path: &Utf8Path, chain: &mut Vec<Utf8PathBuf>) -> Result<Layer, BundleError> {
    let parse_error = |message: String| BundleError::ConfigParse {
        path: path.to_owned(),
        message,
    };

    if chain.iter().any(|seen| seen == path) {
        return Err(parse_error(format!(
            "circularity detected while resolving configuration: {}",
            path
        )));
    }
    chain.push(path.to_owned());

    let content = fs::read_to_string(path).map_err(|err| parse_error(err.to_string()))?;
    let content = remove_trailing_commas(&remove_json_comments(&content));
    let config: TsConfig = serde_json::from_str(&content).map_err(|err| {
        parse_error(format!(
            "{}({},{}): {}",
            path,
            err.line(),
            err.column(),
            err
        ))
    })?;

    let dir = parent_dir(path);
    let mut layer = Layer::default();

    let parents = match config.extends {
        Some(Extends::One(parent)) => vec![parent],
        Some(Extends::Many(parents)) => parents,
        None => Vec::new(),
    };
    for parent in parents {
        let parent_path = resolve_extends(&dir, &parent)
            .ok_or_else(|| parse_error(format!("File '{}' not found.", parent)))?;
        layer.apply(load_layer(&parent_path, chain)?);
    }

    let options = config.compiler_options;
    layer.apply(Layer {
        files: config.files.map(|files| {
            files
                .iter()
                .map(|file| absolutize(Utf8Path::new(file), &dir))
                .collect()
        }),
        include: config.include.map(|patterns| PatternList {
            dir: dir.clone(),
            patterns,
        }),
        exclude: config.exclude.map(|patterns| PatternList {
            dir: dir.clone(),
            patterns,
        }),
        target: options.target,
        out_dir: options
            .out_dir
            .map(|out_dir| absolutize(Utf8Path::new(&out_dir), &dir)),
        root_dir: options
            .root_dir
            .map(|root_dir| absolutize(Utf8Path::new(&root_dir), &dir)),
        module_resolution: options.module_resolution,
        jsx: options.jsx,
    });

    chain.pop();
    Ok(layer)
}

/// Resolves an `extends` entry: a relative or absolute path, or a package
/// under `node_modules` in the configuration directory or an ancestor.
fn resolve_extends(dir: &Utf8Path, spec: &str) -> Option<Utf8PathBuf> {
    let with_json = |path: Utf8PathBuf| -> Option<Utf8PathBuf> {
        if path.is_file() {
            return Some(normalize(&path));
        }
        let json = Utf8PathBuf::from(format!("{}.json", path));
        if json.is_file() {
            return Some(normalize(&json));
        }
        let nested = path.join("tsconfig.json");
        nested.is_file().then(|| normalize(&nested))
    };

    let spec_path = Utf8Path::new(spec);
    if spec.starts_with('.') || spec_path.is_absolute() {
        return with_json(absolutize(spec_path, dir));
    }

    let mut current = Some(dir);
    while let Some(ancestor) = current {
        if let Some(found) = with_json(ancestor.join("node_modules").join(spec)) {
            return Some(found);
        }
        current = ancestor.parent();
    }
    None
}

/// Computes the input list: explicit `files` followed by `include` matches
/// that are not excluded.
fn expand_inputs(layer: &Layer, config_dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, String> {
    let mut inputs: IndexSet<Utf8PathBuf> = IndexSet::new();
    if let Some(files) = &layer.files {
        inputs.extend(files.iter().cloned());
    }

    let include = match (&layer.include, &layer.files) {
        (Some(include), _) => Some(include.clone()),
        (None, None) => Some(PatternList {
            dir: config_dir.to_owned(),
            patterns: vec![DEFAULT_INCLUDE.to_string()],
        }),
        (None, Some(_)) => None,
    };
    let Some(include) = include else {
        return Ok(inputs.into_iter().collect());
    };

    let exclude = layer.exclude.clone().unwrap_or_else(|| PatternList {
        dir: config_dir.to_owned(),
        patterns: DEFAULT_EXCLUDE.iter().map(|p| p.to_string()).collect(),
    });

    let include_set = build_glob_set(&include.patterns, false)?;
    let exclude_set = build_glob_set(&exclude.patterns, true)?;
    let is_excluded = |path: &Utf8Path| {
        if layer.out_dir.as_ref().is_some_and(|out| path.starts_with(out)) {
            return true;
        }
        path.strip_prefix(&exclude.dir)
            .map(|relative| exclude_set.is_match(relative))
            .unwrap_or(false)
    };

    let walker = WalkDir::new(&include.dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || Utf8Path::from_path(entry.path()).is_some_and(|path| !is_excluded(path))
        });

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(path) = Utf8PathBuf::try_from(entry.into_path()) else {
            continue;
        };
        let file_name = path.file_name().unwrap_or_default();
        if !INPUT_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext)) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(&include.dir) else {
            continue;
        };
        if include_set.is_match(relative) {
            inputs.insert(normalize(&path));
        }
    }

    Ok(inputs.into_iter().collect())
}

/// Builds a glob set for `include` or `exclude` patterns. A pattern naming a
/// directory also matches everything below it.
fn build_glob_set(patterns: &[String], exclude: bool) -> Result<GlobSet, String> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.trim_start_matches("./").trim_end_matches('/');
        let last = pattern.rsplit('/').next().unwrap_or(pattern);
        let names_directory = !last.contains(['*', '?', '.']);

        let mut expanded = vec![pattern.to_string()];
        if exclude {
            expanded.push(format!("{}/**", pattern));
        } else if names_directory {
            expanded.push(format!("{}/**/*", pattern));
        }

        for glob in expanded {
            let glob = GlobBuilder::new(&glob)
                .literal_separator(true)
                .build()
                .map_err(|err| format!("invalid pattern '{}': {}", pattern, err))?;
            builder.add(glob);
        }
    }
    builder.build().map_err(|err| err.to_string())
}

/// Removes single-line and multi-line comments from JSON.
///
/// Newlines inside block comments are kept so parser positions stay valid.
fn remove_json_comments(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '"' {
                in_string = false;
            } else if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            }
        } else if c == '"' {
            result.push(c);
            in_string = true;
        } else if c == '/' {
            match chars.peek() {
                Some('/') => {
                    chars.next();
                    while let Some(&next) = chars.peek() {
                        if next == '\n' {
                            break;
                        }
                        chars.next();
                    }
                }
                Some('*') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '*' && chars.peek() == Some(&'/') {
                            chars.next();
                            break;
                        }
                        if next == '\n' {
                            result.push('\n');
                        }
                    }
                }
                _ => {
                    result.push(c);
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Removes commas that directly precede a closing bracket or brace.
fn remove_trailing_commas(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '"' {
                in_string = false;
            } else if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                result.push(c);
            }
            ',' => {
                let mut lookahead = chars.clone();
                let next = lookahead.find(|ch| !ch.is_whitespace());
                if !matches!(next, Some(']') | Some('}')) {
                    result.push(c);
                }
            }
            _ => result.push(c),
        }
    }

    result
}
