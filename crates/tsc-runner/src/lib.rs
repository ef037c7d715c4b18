//! TypeScript compiler runner for declaration emission.
//!
//! This crate drives `tsc` (or `tsgo`) as a child process with
//! declaration-only emission into a temporary directory, then reports every
//! file of the resulting program as a [`CompilationUnit`] in the order the
//! compiler listed them, with its diagnostics attached.
//!
//! Consumers depend on the [`DeclarationEmitter`] trait rather than on
//! [`TscRunner`] directly, so the emit step can be replaced in tests.
//!
//! # Example
//!
//! ```ignore
//! use tsc_runner::{DeclarationEmitter, EmitRequest, TscRunner};
//! use camino::Utf8PathBuf;
//!
//! #[tokio::main]
//! async fn main() {
//!     let root = Utf8PathBuf::from("/path/to/project");
//!     let runner = TscRunner::resolve(&root).unwrap();
//!     let request = EmitRequest {
//!         root_dir: root.clone(),
//!         files: vec![root.join("index.ts")],
//!         ..Default::default()
//!     };
//!
//!     let compilation = runner.emit(&request).await.unwrap();
//!     for unit in &compilation.units {
//!         println!("{} ({} diagnostics)", unit.source_path, unit.diagnostics.len());
//!     }
//! }
//! ```

mod compilation;
mod parser;
mod paths;
mod request;
mod runner;

pub use compilation::{Compilation, CompilationUnit, DeclarationEmitter, UnitKind};
pub use parser::{parse_tsc_output, DiagnosticPosition, DiagnosticSeverity, TscDiagnostic, TscOutput};
pub use paths::{absolutize, declaration_file_name, is_declaration_file, normalize};
pub use request::{EmitRequest, ModuleResolution, NewLine, ScriptTarget, UnknownValue};
pub use runner::{TscError, TscRunner, TSC_ENV_VAR};
