//! Bundling errors.

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;
use tsc_runner::TscError;

/// Errors that abort a bundling run.
#[derive(Debug, Error, Diagnostic)]
pub enum BundleError {
    /// Options are incomplete or contradictory, or no project configuration
    /// was found where one was expected.
    #[error("{0}")]
    #[diagnostic(code(dts_bundle::configuration))]
    Configuration(String),

    /// The project configuration could not be read or is invalid.
    #[error("failed to load {path}:\n{message}")]
    #[diagnostic(code(dts_bundle::config_parse))]
    ConfigParse { path: Utf8PathBuf, message: String },

    /// The compiler reported diagnostics, or emitted text could not be
    /// processed.
    #[error("{0}")]
    #[diagnostic(
        code(dts_bundle::emitter),
        help("fix the reported errors and run again; the output file may be incomplete")
    )]
    Emitter(String),

    /// Writing the output file failed.
    #[error("failed to write {path}: {source}")]
    #[diagnostic(code(dts_bundle::stream))]
    Stream {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compiler could not be located or run.
    #[error("{0}")]
    #[diagnostic(code(dts_bundle::compiler))]
    Compiler(#[from] TscError),
}

impl BundleError {
    pub(crate) fn stream(path: &camino::Utf8Path, source: std::io::Error) -> Self {
        Self::Stream {
            path: path.to_owned(),
            source,
        }
    }
}
