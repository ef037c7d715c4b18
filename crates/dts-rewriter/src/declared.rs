//! Ambient module pre-pass.

use crate::parse::ParsedDeclaration;
use crate::rewrite::{collect_edits, DeclarationNode};
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use swc_ecma_ast::TsModuleName;

/// Names declared through `declare module '<name>' { ... }` anywhere in the
/// input set.
///
/// Built once from every parsed declaration before any file is rewritten, so
/// classification does not depend on file order.
#[derive(Debug, Clone, Default)]
pub struct DeclaredModules {
    names: FxHashSet<SmolStr>,
}

impl DeclaredModules {
    /// Collects the ambient module names of all `declarations`.
    pub fn collect<'a>(declarations: impl IntoIterator<Item = &'a ParsedDeclaration>) -> Self {
        declarations
            .into_iter()
            .flat_map(ambient_module_names)
            .collect()
    }

    /// Returns true if `name` was declared as an ambient module.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<SmolStr> for DeclaredModules {
    fn from_iter<I: IntoIterator<Item = SmolStr>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// Returns the string-literal names of every module declaration in `parsed`,
/// nested ones included.
pub fn ambient_module_names(parsed: &ParsedDeclaration) -> Vec<SmolStr> {
    let mut names = Vec::new();
    collect_edits(parsed, |node| {
        if let DeclarationNode::ModuleDeclaration(decl) = node {
            if let TsModuleName::Str(name) = &decl.id {
                if let Some(name) = name.value.as_str() {
                    names.push(SmolStr::new(name));
                }
            }
        }
        None
    });
    names
}
