//! Runs the emitter against a scripted stand-in for the compiler.

#![cfg(unix)]

use camino::Utf8PathBuf;
use pretty_assertions::assert_eq;
use std::os::unix::fs::PermissionsExt;
use tsc_runner::{DeclarationEmitter, EmitRequest, ScriptTarget, TscError, TscRunner, UnitKind};

/// Emits a declaration for `index.ts` only, lists three program files and
/// reports one diagnostic, like `tsc --listFiles` would.
fn write_script(path: &Utf8PathBuf, root: &Utf8PathBuf) {
    let script = format!(
        r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--outDir" ]; then out="$2"; fi
  shift
done
printf 'export declare const x: number;\n' > "$out/index.d.ts"
echo "Bar.ts(2,5): error TS2304: Cannot find name 'y'."
echo "{root}/types.d.ts"
echo "{root}/index.ts"
echo "{root}/Bar.ts"
exit 2
"#
    );
    std::fs::write(path, script).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[tokio::test]
async fn test_emit_pairs_outputs_with_program_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    std::fs::write(root.join("types.d.ts"), "declare var t: 1;\n").unwrap();
    let script = root.join("fake-tsc");
    write_script(&script, &root);

    let runner = TscRunner::new(script);
    let request = EmitRequest {
        root_dir: root.clone(),
        files: vec![root.join("index.ts"), root.join("Bar.ts")],
        target: Some(ScriptTarget::Es2015),
        ..Default::default()
    };
    let compilation = runner.emit(&request).await.unwrap();

    assert!(compilation.global_diagnostics.is_empty());
    let kinds: Vec<UnitKind> = compilation.units.iter().map(|unit| unit.kind).collect();
    assert_eq!(
        kinds,
        vec![UnitKind::Declaration, UnitKind::Emitted, UnitKind::NotEmitted]
    );

    let types = &compilation.units[0];
    assert_eq!(types.text, "declare var t: 1;\n");

    let index = &compilation.units[1];
    assert_eq!(index.source_path, root.join("index.ts"));
    assert_eq!(index.declaration_path, root.join("index.d.ts"));
    assert_eq!(index.text, "export declare const x: number;\n");
    assert!(index.diagnostics.is_empty());

    let bar = &compilation.units[2];
    assert_eq!(bar.diagnostics.len(), 1);
    assert_eq!(bar.diagnostics[0].code, "TS2304");
    assert_eq!(bar.diagnostics[0].start.line, 2);
}

#[tokio::test]
async fn test_missing_binary() {
    let runner = TscRunner::new(Utf8PathBuf::from("/nonexistent/bin/tsc"));
    let request = EmitRequest {
        root_dir: Utf8PathBuf::from("/tmp"),
        ..Default::default()
    };
    let err = runner.emit(&request).await.unwrap_err();
    assert!(matches!(err, TscError::BinaryMissing(_)));
}
