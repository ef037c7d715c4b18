//! Bundle output assembly.

use crate::error::BundleError;
use camino::{Utf8Path, Utf8PathBuf};
use dts_rewriter::ExportShape;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tsc_runner::ScriptTarget;

/// Inserts `indent` after every `eol` that is followed by more text on the
/// same line.
pub fn indent_lines(content: &str, eol: &str, indent: &str) -> String {
    if eol.is_empty() {
        return content.to_string();
    }
    let mut out = String::with_capacity(content.len() + content.len() / 8);
    let mut rest = content;
    while let Some(pos) = rest.find(eol) {
        let end = pos + eol.len();
        out.push_str(&rest[..end]);
        rest = &rest[end..];
        if !rest.is_empty() && !rest.starts_with(eol) {
            out.push_str(indent);
        }
    }
    out.push_str(rest);
    out
}

/// Formats one `declare module` block around rewritten declaration text.
pub fn module_block(id: &str, content: &str, eol: &str, indent: &str) -> String {
    format!(
        "declare module '{id}' {{{eol}{indent}{body}{eol}}}{eol}",
        body = indent_lines(content, eol, indent)
    )
}

/// Formats the block aliasing `name` to the main module.
///
/// A module with no detected exports is re-exported with `export *`.
pub fn main_alias_block(
    name: &str,
    main: &str,
    shape: ExportShape,
    target: ScriptTarget,
    eol: &str,
    indent: &str,
) -> String {
    let mut block = format!("declare module '{name}' {{{eol}");
    if target.supports_es_modules() {
        if shape.default_export {
            block.push_str(&format!("{indent}export {{default}} from '{main}';{eol}"));
        }
        if shape.named_exports || !shape.default_export {
            block.push_str(&format!("{indent}export * from '{main}';{eol}"));
        }
    } else {
        block.push_str(&format!("{indent}import main = require('{main}');{eol}"));
        block.push_str(&format!("{indent}export = main;{eol}"));
    }
    block.push_str(&format!("}}{eol}"));
    block
}

/// Sequential writer of the bundle.
pub struct BundleWriter<W> {
    out: W,
    path: Utf8PathBuf,
    eol: String,
    indent: String,
}

impl BundleWriter<BufWriter<File>> {
    /// Creates (or truncates) the output file, creating parent directories.
    pub async fn create(path: &Utf8Path, eol: &str, indent: &str) -> Result<Self, BundleError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| BundleError::stream(path, err))?;
        }
        let file = File::create(path)
            .await
            .map_err(|err| BundleError::stream(path, err))?;
        Ok(Self::new(BufWriter::new(file), path, eol, indent))
    }
}

impl<W: AsyncWrite + Unpin> BundleWriter<W> {
    pub fn new(out: W, path: &Utf8Path, eol: &str, indent: &str) -> Self {
        Self {
            out,
            path: path.to_owned(),
            eol: eol.to_string(),
            indent: indent.to_string(),
        }
    }

    pub async fn write_reference_path(&mut self, path: &str) -> Result<(), BundleError> {
        let line = format!("/// <reference path=\"{}\" />{}", path, self.eol);
        self.write_raw(&line).await
    }

    pub async fn write_reference_types(&mut self, name: &str) -> Result<(), BundleError> {
        let line = format!("/// <reference types=\"{}\" />{}", name, self.eol);
        self.write_raw(&line).await
    }

    pub async fn write_module(&mut self, id: &str, content: &str) -> Result<(), BundleError> {
        let block = module_block(id, content, &self.eol, &self.indent);
        self.write_raw(&block).await
    }

    pub async fn write_main_alias(
        &mut self,
        name: &str,
        main: &str,
        shape: ExportShape,
        target: ScriptTarget,
    ) -> Result<(), BundleError> {
        let block = main_alias_block(name, main, shape, target, &self.eol, &self.indent);
        self.write_raw(&block).await
    }

    pub async fn write_raw(&mut self, text: &str) -> Result<(), BundleError> {
        self.out
            .write_all(text.as_bytes())
            .await
            .map_err(|err| BundleError::stream(&self.path, err))
    }

    /// Flushes and closes the destination. Returns the underlying writer.
    pub async fn finish(mut self) -> Result<W, BundleError> {
        self.out
            .flush()
            .await
            .map_err(|err| BundleError::stream(&self.path, err))?;
        self.out
            .shutdown()
            .await
            .map_err(|err| BundleError::stream(&self.path, err))?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_indent_skips_blank_and_trailing_lines() {
        assert_eq!(
            indent_lines("a;\nb;\n\nc;\n", "\n", "\t"),
            "a;\n\tb;\n\n\tc;\n"
        );
        assert_eq!(indent_lines("a;\r\nb;\r\n", "\r\n", "  "), "a;\r\n  b;\r\n");
        assert_eq!(indent_lines("", "\n", "\t"), "");
    }

    #[test]
    fn test_module_block() {
        assert_eq!(
            module_block("foo/Bar", "export class Bar {\n}\n", "\n", "\t"),
            "declare module 'foo/Bar' {\n\texport class Bar {\n\t}\n\n}\n"
        );
    }

    #[test]
    fn test_main_alias_es2015() {
        let shape = ExportShape {
            default_export: true,
            named_exports: true,
        };
        assert_eq!(
            main_alias_block("foo", "foo/index", shape, ScriptTarget::Es2015, "\n", "\t"),
            "declare module 'foo' {\n\texport {default} from 'foo/index';\n\texport * from 'foo/index';\n}\n"
        );

        let named_only = ExportShape {
            default_export: false,
            named_exports: true,
        };
        assert_eq!(
            main_alias_block("foo", "foo/index", named_only, ScriptTarget::EsNext, "\n", "    "),
            "declare module 'foo' {\n    export * from 'foo/index';\n}\n"
        );
    }

    #[test]
    fn test_main_alias_without_exports_reexports_all() {
        assert_eq!(
            main_alias_block(
                "foo",
                "foo/index",
                ExportShape::default(),
                ScriptTarget::Es2015,
                "\n",
                "\t"
            ),
            "declare module 'foo' {\n\texport * from 'foo/index';\n}\n"
        );
    }

    #[test]
    fn test_main_alias_pre_es2015() {
        assert_eq!(
            main_alias_block(
                "foo",
                "foo/index",
                ExportShape::default(),
                ScriptTarget::Es5,
                "\n",
                "\t"
            ),
            "declare module 'foo' {\n\timport main = require('foo/index');\n\texport = main;\n}\n"
        );
    }

    #[tokio::test]
    async fn test_writer_output() {
        let mut writer = BundleWriter::new(Vec::new(), Utf8Path::new("out.d.ts"), "\n", "\t");
        writer.write_reference_path("../typings/node.d.ts").await.unwrap();
        writer.write_reference_types("jest").await.unwrap();
        writer.write_module("foo/index", "export * from 'foo/Bar';\n").await.unwrap();
        let out = writer.finish().await.unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "/// <reference path=\"../typings/node.d.ts\" />\n\
             /// <reference types=\"jest\" />\n\
             declare module 'foo/index' {\n\texport * from 'foo/Bar';\n\n}\n"
        );
    }
}
