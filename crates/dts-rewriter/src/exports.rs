//! Export shape detection for the main module alias.

use crate::parse::ParsedDeclaration;
use swc_ecma_ast::{ExportSpecifier, ModuleDecl, ModuleExportName, ModuleItem, NamedExport};

/// Which kinds of exports a module declaration has at its top level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportShape {
    /// `export default`, `export =`, or a specifier exported as `default`.
    pub default_export: bool,
    /// Any other exported binding or re-export.
    pub named_exports: bool,
}

impl ExportShape {
    /// Inspects the top-level items of `parsed`.
    pub fn of(parsed: &ParsedDeclaration) -> Self {
        let mut shape = Self::default();
        for item in &parsed.module().body {
            let ModuleItem::ModuleDecl(decl) = item else {
                continue;
            };
            match decl {
                ModuleDecl::ExportDefaultDecl(_)
                | ModuleDecl::ExportDefaultExpr(_)
                | ModuleDecl::TsExportAssignment(_) => shape.default_export = true,
                ModuleDecl::ExportDecl(_) | ModuleDecl::ExportAll(_) => {
                    shape.named_exports = true
                }
                ModuleDecl::TsImportEquals(import) if import.is_export => {
                    shape.named_exports = true
                }
                ModuleDecl::ExportNamed(named) => shape.merge_named(named),
                _ => {}
            }
        }
        shape
    }

    /// Combines two shapes.
    pub fn merge(self, other: Self) -> Self {
        Self {
            default_export: self.default_export || other.default_export,
            named_exports: self.named_exports || other.named_exports,
        }
    }

    fn merge_named(&mut self, named: &NamedExport) {
        for specifier in &named.specifiers {
            match specifier {
                ExportSpecifier::Named(spec) => {
                    let exported = spec.exported.as_ref().unwrap_or(&spec.orig);
                    if is_default_name(exported) {
                        self.default_export = true;
                    } else {
                        self.named_exports = true;
                    }
                }
                ExportSpecifier::Default(_) => self.default_export = true,
                ExportSpecifier::Namespace(_) => self.named_exports = true,
            }
        }
    }
}

fn is_default_name(name: &ModuleExportName) -> bool {
    match name {
        ModuleExportName::Ident(ident) => &*ident.sym == "default",
        ModuleExportName::Str(lit) => lit.value.as_str() == Some("default"),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}
