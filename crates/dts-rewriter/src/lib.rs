//! Declaration-file rewriting for dts-bundle.
//!
//! This crate contains the pure half of the bundler: it turns file paths into
//! module identifiers, parses emitted `.d.ts` text with SWC, and rewrites the
//! module references inside each declaration so that it resolves inside a
//! single merged namespace of `declare module '<id>' { ... }` blocks.
//!
//! Rewriting never re-prints the syntax tree. It copies the source text
//! verbatim and substitutes text only at the nodes a replacer asks for.
//!
//! # Example
//!
//! ```
//! use camino::Utf8Path;
//! use dts_rewriter::{parse_declaration, rewrite, bundle_rules, DeclaredModules, ModuleResolver};
//!
//! let source = "export * from './Bar';\nexport declare const x: number;\n";
//! let parsed = parse_declaration(Utf8Path::new("/src/index.d.ts"), source).unwrap();
//! let declared = DeclaredModules::default();
//! let resolver = ModuleResolver::new(&declared);
//!
//! let output = rewrite(&parsed, bundle_rules(&resolver, "foo/index"));
//! assert_eq!(output, "export * from 'foo/Bar';\nexport const x: number;\n");
//! ```

mod declared;
mod exports;
mod module_id;
mod parse;
mod resolve;
mod rewrite;

pub use declared::{ambient_module_names, DeclaredModules};
pub use exports::ExportShape;
pub use module_id::{filename_to_mid, resolve_relative, strip_module_suffix, to_module_id};
pub use parse::{parse_declaration, ParsedDeclaration, RewriteError};
pub use resolve::{
    resolve_module_id, ImportContext, ModuleIdContext, ModuleResolver, ResolveModuleId,
    ResolveModuleImport,
};
pub use rewrite::{apply_edits, bundle_rules, collect_edits, rewrite, DeclarationNode, Edit};
