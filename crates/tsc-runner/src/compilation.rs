//! Compilation results.

use crate::parser::TscDiagnostic;
use crate::request::EmitRequest;
use crate::runner::TscError;
use camino::{Utf8Path, Utf8PathBuf};

/// How a unit's declaration text came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// The input already was a declaration file; the text is its content.
    Declaration,
    /// The compiler emitted the text from a source file.
    Emitted,
    /// The compiler produced no declaration for this source file.
    NotEmitted,
}

/// One program file and the declaration produced for it.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    /// The program file, absolute and normalized.
    pub source_path: Utf8PathBuf,
    /// Where the declaration lives relative to the root directory. Equal to
    /// `source_path` for declaration inputs; for emitted units this is the
    /// emitted file name placed under the root directory.
    pub declaration_path: Utf8PathBuf,
    pub kind: UnitKind,
    /// Declaration text. Empty for [`UnitKind::NotEmitted`].
    pub text: String,
    pub diagnostics: Vec<TscDiagnostic>,
}

impl CompilationUnit {
    /// A unit for an input that already is a declaration file.
    pub fn declaration(path: impl Into<Utf8PathBuf>, text: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            declaration_path: path.clone(),
            source_path: path,
            kind: UnitKind::Declaration,
            text: text.into(),
            diagnostics: Vec::new(),
        }
    }

    /// A unit whose declaration was emitted by the compiler.
    pub fn emitted(
        source_path: impl Into<Utf8PathBuf>,
        declaration_path: impl Into<Utf8PathBuf>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            declaration_path: declaration_path.into(),
            kind: UnitKind::Emitted,
            text: text.into(),
            diagnostics: Vec::new(),
        }
    }

    /// A source unit without emitted output.
    pub fn not_emitted(source_path: impl Into<Utf8PathBuf>) -> Self {
        let source_path = source_path.into();
        Self {
            declaration_path: source_path.clone(),
            source_path,
            kind: UnitKind::NotEmitted,
            text: String::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<TscDiagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn path(&self) -> &Utf8Path {
        &self.source_path
    }
}

/// The outcome of one emit run.
#[derive(Debug, Clone, Default)]
pub struct Compilation {
    /// Every program file, in the order the compiler listed them.
    pub units: Vec<CompilationUnit>,
    /// Diagnostics not attached to any listed file.
    pub global_diagnostics: Vec<TscDiagnostic>,
}

/// Produces declarations for a set of inputs.
#[allow(async_fn_in_trait)]
pub trait DeclarationEmitter {
    /// Compiles the request and reports each program file with its emitted
    /// declaration and diagnostics.
    async fn emit(&self, request: &EmitRequest) -> Result<Compilation, TscError>;
}
