//! Bundling options.

use camino::Utf8PathBuf;
use dts_rewriter::{ResolveModuleId, ResolveModuleImport};
use std::fmt;
use std::sync::Arc;
use tsc_runner::{ModuleResolution, ScriptTarget};

/// Receives human-readable progress messages.
pub type MessageSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Platform end-of-line sequence.
#[cfg(windows)]
pub const DEFAULT_EOL: &str = "\r\n";
#[cfg(not(windows))]
pub const DEFAULT_EOL: &str = "\n";

pub const DEFAULT_INDENT: &str = "\t";

/// Caller-supplied configuration for [`crate::generate`].
#[derive(Clone, Default)]
pub struct Options {
    /// Root of the sources. Module identifiers are relative to it.
    pub base_dir: Option<Utf8PathBuf>,
    /// Project configuration file, or a directory containing `tsconfig.json`.
    pub project: Option<Utf8PathBuf>,
    /// Input files, relative to the base directory.
    pub files: Vec<Utf8PathBuf>,
    /// Glob patterns of files to leave out of the bundle.
    pub exclude: Vec<String>,
    /// Paths written as `/// <reference path="..." />` lines.
    pub externs: Vec<String>,
    /// Type packages written as `/// <reference types="..." />` lines.
    pub types: Vec<String>,
    pub eol: Option<String>,
    pub indent: Option<String>,
    /// Module identifier whose exports are re-exported under `name`.
    pub main: Option<String>,
    /// Package name. Prepended to every computed module identifier.
    pub name: Option<String>,
    /// Path of the bundle to write.
    pub out: Utf8PathBuf,
    pub module_resolution: Option<ModuleResolution>,
    pub target: Option<ScriptTarget>,
    /// Prepended to module identifiers not chosen by a hook.
    pub prefix: Option<String>,
    /// Progress messages.
    pub sink: Option<MessageSink>,
    /// Also report the resolved configuration through `sink`.
    pub verbose: bool,
    pub resolve_module_id: Option<ResolveModuleId>,
    pub resolve_module_import: Option<ResolveModuleImport>,
}

impl Options {
    pub fn eol(&self) -> &str {
        self.eol.as_deref().unwrap_or(DEFAULT_EOL)
    }

    pub fn indent(&self) -> &str {
        self.indent.as_deref().unwrap_or(DEFAULT_INDENT)
    }

    pub(crate) fn send_message(&self, message: &str) {
        if let Some(sink) = &self.sink {
            sink(message);
        }
    }

    pub(crate) fn verbose_message(&self, message: &str) {
        if self.verbose {
            self.send_message(message);
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("base_dir", &self.base_dir)
            .field("project", &self.project)
            .field("files", &self.files)
            .field("exclude", &self.exclude)
            .field("externs", &self.externs)
            .field("types", &self.types)
            .field("eol", &self.eol)
            .field("indent", &self.indent)
            .field("main", &self.main)
            .field("name", &self.name)
            .field("out", &self.out)
            .field("module_resolution", &self.module_resolution)
            .field("target", &self.target)
            .field("prefix", &self.prefix)
            .field("verbose", &self.verbose)
            .field("resolve_module_id", &self.resolve_module_id.is_some())
            .field("resolve_module_import", &self.resolve_module_import.is_some())
            .finish_non_exhaustive()
    }
}
