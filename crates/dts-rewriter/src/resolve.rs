//! Module reference resolution.

use crate::declared::DeclaredModules;
use crate::module_id::resolve_relative;
use camino::Utf8Path;
use std::sync::Arc;

/// Arguments passed to a resolve-module-import hook.
#[derive(Debug, Clone, Copy)]
pub struct ImportContext<'a> {
    /// The specifier exactly as written in the declaration.
    pub imported_module_id: &'a str,
    /// Identifier of the module containing the reference.
    pub current_module_id: &'a str,
    /// Whether the specifier names an ambient `declare module`.
    pub is_declared_external_module: bool,
}

/// Arguments passed to a resolve-module-id hook.
#[derive(Debug, Clone, Copy)]
pub struct ModuleIdContext<'a> {
    /// Path of the declaration being wrapped.
    pub declaration_path: &'a Utf8Path,
    /// Path relative to the base or output directory, `/`-separated, no suffix.
    pub relative_module_path: &'a str,
    /// The computed identifier, including the configured name.
    pub current_module_id: &'a str,
}

/// Caller hook overriding how a module reference is translated.
///
/// A `None` or empty result falls back to the built-in translation.
pub type ResolveModuleImport = Arc<dyn Fn(&ImportContext<'_>) -> Option<String> + Send + Sync>;

/// Caller hook overriding the identifier of a wrapped module.
pub type ResolveModuleId = Arc<dyn Fn(&ModuleIdContext<'_>) -> Option<String> + Send + Sync>;

/// Translates module references found inside a declaration.
#[derive(Clone)]
pub struct ModuleResolver<'a> {
    declared: &'a DeclaredModules,
    prefix: Option<&'a str>,
    hook: Option<&'a ResolveModuleImport>,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(declared: &'a DeclaredModules) -> Self {
        Self {
            declared,
            prefix: None,
            hook: None,
        }
    }

    /// Prefixes built-in relative translations with `prefix/`.
    pub fn with_prefix(mut self, prefix: Option<&'a str>) -> Self {
        self.prefix = prefix.filter(|p| !p.is_empty());
        self
    }

    pub fn with_hook(mut self, hook: Option<&'a ResolveModuleImport>) -> Self {
        self.hook = hook;
        self
    }

    /// Returns the translated identifier for `specifier`, or `None` to leave
    /// the reference as written.
    pub fn resolve(&self, specifier: &str, current_module_id: &str) -> Option<String> {
        let is_declared_external_module = self.declared.contains(specifier);

        if let Some(hook) = self.hook {
            let context = ImportContext {
                imported_module_id: specifier,
                current_module_id,
                is_declared_external_module,
            };
            if let Some(resolved) = hook(&context).filter(|r| !r.is_empty()) {
                return Some(resolved);
            }
        }

        if !specifier.starts_with('.') {
            return None;
        }

        let resolved = resolve_relative(current_module_id, specifier);
        match self.prefix {
            Some(prefix) if !is_declared_external_module => Some(format!("{}/{}", prefix, resolved)),
            _ => Some(resolved),
        }
    }
}

impl std::fmt::Debug for ModuleResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleResolver")
            .field("declared", &self.declared.len())
            .field("prefix", &self.prefix)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// Chooses the identifier of a wrapped module block.
///
/// A non-empty hook result is used verbatim; otherwise the computed
/// identifier is used, prefixed when a prefix is configured.
pub fn resolve_module_id(
    context: &ModuleIdContext<'_>,
    hook: Option<&ResolveModuleId>,
    prefix: Option<&str>,
) -> String {
    if let Some(resolved) = hook.and_then(|hook| hook(context)).filter(|r| !r.is_empty()) {
        return resolved;
    }
    match prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}/{}", prefix, context.current_module_id),
        None => context.current_module_id.to_string(),
    }
}
