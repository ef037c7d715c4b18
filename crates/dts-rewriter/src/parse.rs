//! Declaration parsing with SWC.

use camino::{Utf8Path, Utf8PathBuf};
use std::ops::Range;
use std::sync::Arc;
use swc_common::{BytePos, FileName, SourceMap, Span, Spanned};
use swc_ecma_ast::{Module, ModuleItem};
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};
use thiserror::Error;

/// Errors produced while preparing a declaration for rewriting.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The declaration text could not be parsed.
    #[error("{path}({line},{column}): {message}")]
    Parse {
        path: Utf8PathBuf,
        /// 1-indexed line number.
        line: u32,
        /// 1-indexed column number.
        column: u32,
        message: String,
    },
}

/// A parsed declaration file together with the text it was parsed from.
#[derive(Debug)]
pub struct ParsedDeclaration {
    path: Utf8PathBuf,
    source: String,
    module: Module,
    file_start: BytePos,
}

impl ParsedDeclaration {
    /// The path the declaration was parsed from.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The original declaration text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed module.
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Returns true if the file has a top-level import or export, i.e. it is
    /// an external module rather than a global script.
    pub fn is_external_module(&self) -> bool {
        self.module
            .body
            .iter()
            .any(|item| matches!(item, ModuleItem::ModuleDecl(_)))
    }

    /// Converts an SWC position into a byte offset in [`Self::source`].
    pub(crate) fn offset(&self, pos: BytePos) -> usize {
        (pos.0.saturating_sub(self.file_start.0) as usize).min(self.source.len())
    }

    /// Converts an SWC span into a byte range in [`Self::source`].
    pub(crate) fn range(&self, span: Span) -> Range<usize> {
        self.offset(span.lo)..self.offset(span.hi)
    }
}

/// Parses declaration text.
///
/// Recoverable parser errors are ignored; only a failure to produce a module
/// is reported.
pub fn parse_declaration(
    path: &Utf8Path,
    source: impl Into<String>,
) -> Result<ParsedDeclaration, RewriteError> {
    let source = source.into();
    let cm: Arc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Custom(path.to_string()).into(), source.clone());
    let file_start = fm.start_pos;

    let syntax = Syntax::Typescript(TsSyntax {
        tsx: false,
        dts: true,
        no_early_errors: true,
        ..Default::default()
    });

    let mut parser = Parser::new(syntax, StringInput::from(&*fm), None);
    let module = parser.parse_module().map_err(|err| {
        let offset = err.span().lo.0.saturating_sub(file_start.0) as usize;
        let (line, column) = line_column(&source, offset);
        RewriteError::Parse {
            path: path.to_owned(),
            line,
            column,
            message: err.kind().msg().to_string(),
        }
    })?;

    let recovered = parser.take_errors();
    if !recovered.is_empty() {
        tracing::debug!(
            "{}: ignoring {} recoverable parse errors",
            path,
            recovered.len()
        );
    }

    Ok(ParsedDeclaration {
        path: path.to_owned(),
        source,
        module,
        file_start,
    })
}

/// Returns the 1-indexed line and column of a byte offset.
fn line_column(source: &str, offset: usize) -> (u32, u32) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line as u32, column as u32)
}
