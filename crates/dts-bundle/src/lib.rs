//! Bundles the declarations of a TypeScript project into a single file.
//!
//! The compiler emits one declaration per source file. Each emitted external
//! module is rewritten so its module references resolve by identifier and is
//! wrapped in a `declare module '<id>' { ... }` block. Pass-through `.d.ts`
//! files and global scripts are copied verbatim. An optional main module can
//! be aliased under the package name.
//!
//! # Example
//!
//! ```ignore
//! use dts_bundle::{generate, Options};
//! use camino::Utf8PathBuf;
//!
//! #[tokio::main]
//! async fn main() {
//!     let options = Options {
//!         name: Some("foo".to_string()),
//!         base_dir: Some(Utf8PathBuf::from("src")),
//!         files: vec![Utf8PathBuf::from("index.ts")],
//!         main: Some("foo/index".to_string()),
//!         out: Utf8PathBuf::from("dist/foo.d.ts"),
//!         ..Default::default()
//!     };
//!     generate(options).await.unwrap();
//! }
//! ```

mod config;
mod error;
mod exclude;
mod options;
mod orchestrator;
mod output;

pub use config::ProjectConfig;
pub use error::BundleError;
pub use exclude::{ExcludeSet, DEFAULT_EXCLUDE};
pub use options::{MessageSink, Options, DEFAULT_EOL, DEFAULT_INDENT};
pub use orchestrator::{generate, generate_with};
pub use output::{indent_lines, main_alias_block, module_block, BundleWriter};

pub use dts_rewriter::{ImportContext, ModuleIdContext, ResolveModuleId, ResolveModuleImport};
pub use tsc_runner::{ModuleResolution, ScriptTarget};
