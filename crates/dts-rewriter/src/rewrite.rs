//! Text-preserving structural rewrite of declaration files.
//!
//! The walker visits the syntax tree once in source order and offers a small
//! set of node kinds to a replacer. When the replacer returns a substitution,
//! the node's whole extent is replaced and its children are skipped; otherwise
//! the walk descends. Text outside replaced extents is copied verbatim.

use crate::parse::ParsedDeclaration;
use crate::resolve::ModuleResolver;
use std::ops::Range;
use swc_common::Spanned;
use swc_ecma_ast::{
    Decl, ExportAll, ImportDecl, Module, ModuleDecl, ModuleItem, NamedExport, Stmt, Str,
    TsExternalModuleRef, TsImportType, TsModuleDecl, TsModuleName,
};
use swc_ecma_visit::{Visit, VisitWith};

const DECLARE_KEYWORD: &str = "declare";

/// A node offered to a replacer.
#[derive(Debug, Clone, Copy)]
pub enum DeclarationNode<'a> {
    /// `require('<path>')` in an `import x = require('<path>')` declaration.
    ExternalModuleReference(&'a Str),
    /// The string-literal specifier of an import or export declaration.
    ModuleSpecifier(&'a Str),
    /// The argument of an `import('<path>')` type.
    ImportType(&'a Str),
    /// The `declare` modifier of a top-level declaration, with the whitespace
    /// that follows it.
    DeclareKeyword,
    /// A `declare module` or `namespace` declaration.
    ModuleDeclaration(&'a TsModuleDecl),
}

impl DeclarationNode<'_> {
    /// The module path this node refers to, if any.
    pub fn referenced_module(&self) -> Option<&str> {
        match self {
            Self::ExternalModuleReference(lit)
            | Self::ModuleSpecifier(lit)
            | Self::ImportType(lit) => lit.value.as_str(),
            Self::DeclareKeyword | Self::ModuleDeclaration(_) => None,
        }
    }
}

/// A substitution of a byte range of the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

/// Walks `parsed` and returns the substitutions requested by `replacer`, in
/// source order.
pub fn collect_edits<F>(parsed: &ParsedDeclaration, replacer: F) -> Vec<Edit>
where
    F: FnMut(&DeclarationNode<'_>) -> Option<String>,
{
    let mut walker = Walker {
        parsed,
        replacer,
        edits: Vec::new(),
    };
    parsed.module().visit_with(&mut walker);
    walker.edits
}

/// Rewrites `parsed` with the substitutions requested by `replacer`.
pub fn rewrite<F>(parsed: &ParsedDeclaration, replacer: F) -> String
where
    F: FnMut(&DeclarationNode<'_>) -> Option<String>,
{
    let edits = collect_edits(parsed, replacer);
    apply_edits(parsed.source(), &edits)
}

/// Applies ordered, non-overlapping edits to `source`.
///
/// An edit starting inside an already replaced range is dropped.
pub fn apply_edits(source: &str, edits: &[Edit]) -> String {
    let mut out = String::with_capacity(
        source.len() + edits.iter().map(|e| e.replacement.len()).sum::<usize>(),
    );
    let mut cursor = 0;
    for edit in edits {
        if edit.range.start < cursor || edit.range.end > source.len() {
            continue;
        }
        out.push_str(&source[cursor..edit.range.start]);
        out.push_str(&edit.replacement);
        cursor = edit.range.end;
    }
    out.push_str(&source[cursor..]);
    out
}

/// The replacer used for bundling: drops top-level `declare` modifiers and
/// translates module references through `resolver`.
pub fn bundle_rules<'r>(
    resolver: &'r ModuleResolver<'r>,
    current_module_id: &'r str,
) -> impl FnMut(&DeclarationNode<'_>) -> Option<String> + 'r {
    move |node: &DeclarationNode<'_>| match node {
        DeclarationNode::DeclareKeyword => Some(String::new()),
        DeclarationNode::ExternalModuleReference(_) => {
            let resolved = resolver.resolve(node.referenced_module()?, current_module_id)?;
            Some(format!("require('{}')", resolved))
        }
        DeclarationNode::ModuleSpecifier(_) | DeclarationNode::ImportType(_) => {
            let resolved = resolver.resolve(node.referenced_module()?, current_module_id)?;
            Some(format!("'{}'", resolved))
        }
        DeclarationNode::ModuleDeclaration(_) => None,
    }
}

struct Walker<'p, F> {
    parsed: &'p ParsedDeclaration,
    replacer: F,
    edits: Vec<Edit>,
}

impl<F> Walker<'_, F>
where
    F: FnMut(&DeclarationNode<'_>) -> Option<String>,
{
    /// Offers `node` to the replacer. Returns true if it was replaced.
    fn offer(&mut self, node: DeclarationNode<'_>, range: Range<usize>) -> bool {
        match (self.replacer)(&node) {
            Some(replacement) => {
                self.edits.push(Edit { range, replacement });
                true
            }
            None => false,
        }
    }
}

impl<F> Visit for Walker<'_, F>
where
    F: FnMut(&DeclarationNode<'_>) -> Option<String>,
{
    fn visit_module(&mut self, module: &Module) {
        for item in &module.body {
            if let Some(range) = declare_keyword(self.parsed, item) {
                self.offer(DeclarationNode::DeclareKeyword, range);
            }
            item.visit_with(self);
        }
    }

    fn visit_ts_external_module_ref(&mut self, node: &TsExternalModuleRef) {
        let range = self.parsed.range(node.span);
        if !self.offer(DeclarationNode::ExternalModuleReference(&node.expr), range) {
            node.visit_children_with(self);
        }
    }

    fn visit_import_decl(&mut self, node: &ImportDecl) {
        let range = self.parsed.range(node.src.span);
        self.offer(DeclarationNode::ModuleSpecifier(&node.src), range);
        node.specifiers.visit_with(self);
    }

    fn visit_named_export(&mut self, node: &NamedExport) {
        node.specifiers.visit_with(self);
        if let Some(src) = &node.src {
            let range = self.parsed.range(src.span);
            self.offer(DeclarationNode::ModuleSpecifier(src), range);
        }
    }

    fn visit_export_all(&mut self, node: &ExportAll) {
        let range = self.parsed.range(node.src.span);
        self.offer(DeclarationNode::ModuleSpecifier(&node.src), range);
    }

    fn visit_ts_import_type(&mut self, node: &TsImportType) {
        let range = self.parsed.range(node.arg.span);
        if self.offer(DeclarationNode::ImportType(&node.arg), range) {
            node.type_args.visit_with(self);
        } else {
            node.visit_children_with(self);
        }
    }

    fn visit_ts_module_decl(&mut self, node: &TsModuleDecl) {
        let range = self.parsed.range(node.span);
        if !self.offer(DeclarationNode::ModuleDeclaration(node), range) {
            node.visit_children_with(self);
        }
    }
}

/// Locates the removable `declare` modifier of a top-level item.
fn declare_keyword(parsed: &ParsedDeclaration, item: &ModuleItem) -> Option<Range<usize>> {
    let decl = match item {
        ModuleItem::Stmt(Stmt::Decl(decl)) => decl,
        ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => &export.decl,
        _ => return None,
    };
    if !has_removable_declare(decl) {
        return None;
    }

    let source = parsed.source();
    let item_start = parsed.offset(item.span_lo());
    let decl_start = parsed.offset(decl.span_lo());

    // SWC spans start either at the modifier or at the declaration keyword.
    let mut start = item_start;
    if let Some(rest) = source.get(start..).and_then(|s| s.strip_prefix("export")) {
        let trimmed = rest.trim_start();
        if trimmed.len() < rest.len() {
            start = source.len() - trimmed.len();
        }
    }
    if source.get(start..)?.starts_with(DECLARE_KEYWORD) {
        return keyword_with_trailing_space(source, start);
    }

    let before = source.get(item_start..decl_start)?.trim_end();
    let prefix = before.strip_suffix(DECLARE_KEYWORD)?;
    if prefix.chars().last().is_some_and(|c| !c.is_whitespace()) {
        return None;
    }
    keyword_with_trailing_space(source, item_start + prefix.len())
}

fn keyword_with_trailing_space(source: &str, start: usize) -> Option<Range<usize>> {
    let end = start + DECLARE_KEYWORD.len();
    let rest = source.get(end..)?;
    let spaces = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    if spaces == 0 {
        return None;
    }
    Some(start..end + spaces)
}

/// Global augmentations and string-named ambient modules keep their modifier.
fn has_removable_declare(decl: &Decl) -> bool {
    match decl {
        Decl::Class(class) => class.declare,
        Decl::Fn(func) => func.declare,
        Decl::Var(var) => var.declare,
        Decl::TsInterface(interface) => interface.declare,
        Decl::TsTypeAlias(alias) => alias.declare,
        Decl::TsEnum(en) => en.declare,
        Decl::TsModule(module) => {
            module.declare
                && matches!(&module.id, TsModuleName::Ident(ident) if &*ident.sym != "global")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_declaration;
    use camino::Utf8Path;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> ParsedDeclaration {
        parse_declaration(Utf8Path::new("/base/test.d.ts"), source).unwrap()
    }

    #[test]
    fn test_no_replacement_is_identity() {
        let source = "/** docs */\nexport declare function a(x: number): string;\n\nexport {};\n";
        let parsed = parse(source);
        assert_eq!(rewrite(&parsed, |_| None), source);
    }

    #[test]
    fn test_declare_keyword_removed_at_top_level() {
        let parsed = parse(
            "export declare class Foo {\n}\ndeclare const bar: number;\nexport declare namespace N {\n    const x: number;\n}\n",
        );
        let out = rewrite(&parsed, |node| {
            matches!(node, DeclarationNode::DeclareKeyword).then(String::new)
        });
        assert_eq!(
            out,
            "export class Foo {\n}\nconst bar: number;\nexport namespace N {\n    const x: number;\n}\n"
        );
    }

    #[test]
    fn test_declare_global_is_kept() {
        let source = "export {};\ndeclare global {\n    interface Window {\n    }\n}\n";
        let parsed = parse(source);
        let out = rewrite(&parsed, |node| {
            matches!(node, DeclarationNode::DeclareKeyword).then(String::new)
        });
        assert_eq!(out, source);
    }

    #[test]
    fn test_specifiers_are_offered_in_order() {
        let parsed = parse(
            "import { A } from './a';\nimport B = require('./b');\nexport * from './c';\nexport { D } from \"./d\";\nexport declare const e: import('./e').E;\n",
        );
        let mut seen = Vec::new();
        collect_edits(&parsed, |node| {
            if let Some(path) = node.referenced_module() {
                seen.push(path.to_string());
            }
            None
        });
        assert_eq!(seen, vec!["./a", "./b", "./c", "./d", "./e"]);
    }

    #[test]
    fn test_replacement_skips_children() {
        let parsed = parse("export namespace Outer {\n    namespace Inner {\n    }\n}\n");
        let mut offered = 0;
        let out = rewrite(&parsed, |node| match node {
            DeclarationNode::ModuleDeclaration(_) => {
                offered += 1;
                Some("/* elided */".to_string())
            }
            _ => None,
        });
        assert_eq!(offered, 1);
        assert_eq!(out, "export /* elided */\n");
    }

    #[test]
    fn test_apply_edits_drops_overlaps() {
        let edits = vec![
            Edit {
                range: 0..3,
                replacement: "x".to_string(),
            },
            Edit {
                range: 2..4,
                replacement: "y".to_string(),
            },
            Edit {
                range: 4..5,
                replacement: "z".to_string(),
            },
        ];
        assert_eq!(apply_edits("abcdef", &edits), "xdzf");
    }
}
