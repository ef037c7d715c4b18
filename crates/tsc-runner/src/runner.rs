//! TypeScript compiler process runner.

use crate::compilation::{Compilation, CompilationUnit, DeclarationEmitter};
use crate::parser::{parse_tsc_output, TscDiagnostic, TscOutput};
use crate::paths::{absolutize, declaration_file_name, is_declaration_file, normalize};
use crate::request::EmitRequest;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// Environment variable overriding the compiler executable.
pub const TSC_ENV_VAR: &str = "DTS_BUNDLE_TSC";

/// Executable names probed in order.
const COMPILER_NAMES: &[&str] = &["tsc", "tsgo"];

/// Error types for the compiler runner.
#[derive(Debug, Error)]
pub enum TscError {
    /// Failed to spawn the compiler process.
    #[error("failed to spawn {path}: {source}")]
    SpawnFailed {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compiler exited without reporting files or diagnostics.
    #[error("compiler exited with code {code}: {stderr}")]
    ProcessFailed { code: i32, stderr: String },

    /// No compiler executable could be located.
    #[error("TypeScript compiler not found; install typescript or set DTS_BUNDLE_TSC")]
    NotFound,

    /// The configured compiler executable does not exist.
    #[error("compiler binary not found at: {0}")]
    BinaryMissing(Utf8PathBuf),

    /// Failed to create the temporary output directory.
    #[error("failed to create temporary directory: {0}")]
    TempDirFailed(#[source] std::io::Error),

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// Failed to read a program file or an emitted declaration.
    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs the TypeScript compiler to emit declarations.
#[derive(Debug, Clone)]
pub struct TscRunner {
    /// Path to the compiler binary.
    tsc_path: Utf8PathBuf,
}

impl TscRunner {
    /// Creates a runner for the given compiler binary.
    pub fn new(tsc_path: Utf8PathBuf) -> Self {
        Self { tsc_path }
    }

    /// Locates a compiler starting from `start_dir`.
    pub fn resolve(start_dir: &Utf8Path) -> Result<Self, TscError> {
        Self::find_tsc(Some(start_dir))
            .map(Self::new)
            .ok_or(TscError::NotFound)
    }

    pub fn tsc_path(&self) -> &Utf8Path {
        &self.tsc_path
    }

    /// Attempts to find a compiler in the environment, the project, PATH, or
    /// common locations.
    ///
    /// Search order:
    /// 1. The `DTS_BUNDLE_TSC` environment variable
    /// 2. `node_modules/.bin` in `start_dir` or any ancestor
    /// 3. System PATH
    /// 4. Common installation locations
    pub fn find_tsc(start_dir: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
        if let Ok(value) = std::env::var(TSC_ENV_VAR) {
            if !value.trim().is_empty() {
                let expanded = shellexpand::tilde(&value);
                return Some(Utf8PathBuf::from(expanded.as_ref()));
            }
        }

        let mut current = start_dir;
        while let Some(dir) = current {
            for name in COMPILER_NAMES {
                for candidate in bin_candidates(&dir.join("node_modules/.bin"), name) {
                    if candidate.exists() {
                        return Some(candidate);
                    }
                }
            }
            current = dir.parent();
        }

        for name in COMPILER_NAMES {
            if let Ok(path) = which::which(name) {
                if let Ok(utf8_path) = Utf8PathBuf::try_from(path) {
                    return Some(utf8_path);
                }
            }
        }

        let common_paths = [
            "/usr/local/bin/tsc",
            "/usr/bin/tsc",
            "~/.local/bin/tsc",
            "~/.npm-global/bin/tsc",
        ];
        for path in common_paths {
            let expanded = shellexpand::tilde(path);
            let path = Utf8Path::new(expanded.as_ref());
            if path.exists() {
                return Some(path.to_owned());
            }
        }

        None
    }

    async fn run(&self, request: &EmitRequest, out_dir: &Utf8Path) -> Result<TscOutput, TscError> {
        if !self.tsc_path.exists() {
            return Err(TscError::BinaryMissing(self.tsc_path.clone()));
        }

        let args = command_args(request, out_dir);
        tracing::debug!("running {} {}", self.tsc_path, args.join(" "));

        let output = Command::new(&self.tsc_path)
            .args(&args)
            .current_dir(&request.root_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| TscError::SpawnFailed {
                path: self.tsc_path.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let parsed = parse_tsc_output(&stdout, &request.root_dir);

        // Non-zero exit is expected when diagnostics are reported
        if !output.status.success() && parsed.listed_files.is_empty() && parsed.diagnostics.is_empty()
        {
            return Err(TscError::ProcessFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: if stderr.trim().is_empty() {
                    stdout.to_string()
                } else {
                    stderr.to_string()
                },
            });
        }

        Ok(parsed)
    }
}

impl DeclarationEmitter for TscRunner {
    async fn emit(&self, request: &EmitRequest) -> Result<Compilation, TscError> {
        let temp_dir = tempfile::Builder::new()
            .prefix("dts-bundle-")
            .tempdir()
            .map_err(TscError::TempDirFailed)?;
        let out_dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf())
            .map_err(|err| TscError::NonUtf8Path(err.into_path_buf()))?;

        let output = self.run(request, &out_dir).await?;
        collect_units(request, &out_dir, output).await
    }
}

/// Builds the compiler command line.
pub(crate) fn command_args(request: &EmitRequest, out_dir: &Utf8Path) -> Vec<String> {
    let mut args = Vec::new();

    match &request.project {
        Some(project) => {
            args.push("--project".to_string());
            args.push(project.to_string());
        }
        None => {
            args.extend(request.files.iter().map(|file| file.to_string()));
            if let Some(mode) = request.module_resolution {
                args.push("--module".to_string());
                args.push(mode.module_kind().to_string());
                args.push("--moduleResolution".to_string());
                args.push(mode.as_str().to_string());
            }
            if let Some(target) = request.target {
                args.push("--target".to_string());
                args.push(target.as_str().to_string());
            }
            if let Some(jsx) = &request.jsx {
                args.push("--jsx".to_string());
                args.push(jsx.clone());
            }
        }
    }

    if !request.types.is_empty() {
        args.push("--types".to_string());
        args.push(request.types.join(","));
    }

    for flag in ["--declaration", "--emitDeclarationOnly", "--listFiles"] {
        args.push(flag.to_string());
    }
    for (flag, value) in [
        ("--noEmit", "false"),
        ("--pretty", "false"),
        ("--newLine", request.new_line.as_str()),
    ] {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
    args.push("--outDir".to_string());
    args.push(out_dir.to_string());
    args.push("--rootDir".to_string());
    args.push(request.root_dir.to_string());

    args
}

/// Pairs each listed program file with its declaration text and diagnostics.
async fn collect_units(
    request: &EmitRequest,
    out_dir: &Utf8Path,
    output: TscOutput,
) -> Result<Compilation, TscError> {
    let root_dir = normalize(&request.root_dir);

    let mut by_file: IndexMap<Utf8PathBuf, Vec<TscDiagnostic>> = IndexMap::new();
    let mut global_diagnostics = Vec::new();
    for diag in output.diagnostics {
        match &diag.file {
            Some(file) => by_file.entry(file.clone()).or_default().push(diag),
            None => global_diagnostics.push(diag),
        }
    }

    let mut units = Vec::with_capacity(output.listed_files.len());
    for source_path in output.listed_files {
        let source_path = absolutize(&source_path, &root_dir);
        let diagnostics = by_file.shift_remove(&source_path).unwrap_or_default();

        let unit = if is_declaration_file(&source_path) {
            let text = read_text(&source_path).await?;
            CompilationUnit::declaration(source_path, text)
        } else {
            match source_path.strip_prefix(&root_dir) {
                Ok(relative) => {
                    let declaration_name = declaration_file_name(relative);
                    let emitted_path = out_dir.join(&declaration_name);
                    if emitted_path.exists() {
                        let text = read_text(&emitted_path).await?;
                        CompilationUnit::emitted(
                            source_path,
                            root_dir.join(&declaration_name),
                            text,
                        )
                    } else {
                        tracing::debug!("no declaration emitted for {}", source_path);
                        CompilationUnit::not_emitted(source_path)
                    }
                }
                Err(_) => CompilationUnit::not_emitted(source_path),
            }
        };
        units.push(unit.with_diagnostics(diagnostics));
    }

    // Diagnostics for files the compiler did not list
    global_diagnostics.extend(by_file.into_values().flatten());

    Ok(Compilation {
        units,
        global_diagnostics,
    })
}

async fn read_text(path: &Utf8Path) -> Result<String, TscError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| TscError::ReadFailed {
            path: path.to_owned(),
            source,
        })
}

fn bin_candidates(bin_dir: &Utf8Path, name: &str) -> Vec<Utf8PathBuf> {
    if cfg!(windows) {
        vec![bin_dir.join(format!("{name}.cmd")), bin_dir.join(name)]
    } else {
        vec![bin_dir.join(name)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{DiagnosticPosition, DiagnosticSeverity};
    use crate::request::{ModuleResolution, NewLine, ScriptTarget};
    use crate::UnitKind;
    use pretty_assertions::assert_eq;

    fn request(root: &Utf8Path) -> EmitRequest {
        EmitRequest {
            root_dir: root.to_owned(),
            files: vec![root.join("index.ts"), root.join("Bar.ts")],
            ..Default::default()
        }
    }

    #[test]
    fn test_command_args_explicit_files() {
        let mut req = request(Utf8Path::new("/project"));
        req.target = Some(ScriptTarget::Es5);
        req.module_resolution = Some(ModuleResolution::Node10);
        req.types = vec!["node".to_string(), "jest".to_string()];
        req.new_line = NewLine::CrLf;

        let args = command_args(&req, Utf8Path::new("/tmp/out"));
        assert_eq!(
            args,
            vec![
                "/project/index.ts",
                "/project/Bar.ts",
                "--module",
                "commonjs",
                "--moduleResolution",
                "node10",
                "--target",
                "es5",
                "--types",
                "node,jest",
                "--declaration",
                "--emitDeclarationOnly",
                "--listFiles",
                "--noEmit",
                "false",
                "--pretty",
                "false",
                "--newLine",
                "crlf",
                "--outDir",
                "/tmp/out",
                "--rootDir",
                "/project",
            ]
        );
    }

    #[test]
    fn test_command_args_project_ignores_files() {
        let mut req = request(Utf8Path::new("/project"));
        req.project = Some(Utf8PathBuf::from("/project/tsconfig.json"));
        req.target = Some(ScriptTarget::Es2015);

        let args = command_args(&req, Utf8Path::new("/tmp/out"));
        assert_eq!(&args[..2], &["--project", "/project/tsconfig.json"]);
        assert!(!args.iter().any(|a| a.ends_with("index.ts")));
        assert!(!args.iter().any(|a| a == "--target"));
    }

    #[tokio::test]
    async fn test_collect_units_pairs_outputs() {
        let root = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let root_dir = Utf8PathBuf::try_from(root.path().to_path_buf()).unwrap();
        let out_dir = Utf8PathBuf::try_from(out.path().to_path_buf()).unwrap();

        std::fs::write(root_dir.join("typings.d.ts"), "declare const x: number;\n").unwrap();
        std::fs::create_dir_all(out_dir.join("sub")).unwrap();
        std::fs::write(out_dir.join("sub/Bar.d.ts"), "export declare class Bar {\n}\n").unwrap();

        let bar = root_dir.join("sub/Bar.ts");
        let missing = root_dir.join("missing.ts");
        let output = TscOutput {
            diagnostics: vec![
                TscDiagnostic {
                    file: Some(bar.clone()),
                    start: DiagnosticPosition { line: 1, column: 1 },
                    code: "TS1005".to_string(),
                    message: "';' expected.".to_string(),
                    severity: DiagnosticSeverity::Error,
                },
                TscDiagnostic {
                    file: Some(Utf8PathBuf::from("/elsewhere/x.ts")),
                    start: DiagnosticPosition { line: 2, column: 3 },
                    code: "TS2304".to_string(),
                    message: "Cannot find name 'y'.".to_string(),
                    severity: DiagnosticSeverity::Error,
                },
            ],
            listed_files: vec![root_dir.join("typings.d.ts"), bar.clone(), missing.clone()],
        };

        let compilation = collect_units(&request(&root_dir), &out_dir, output)
            .await
            .unwrap();

        assert_eq!(compilation.units.len(), 3);
        assert_eq!(compilation.units[0].kind, UnitKind::Declaration);
        assert_eq!(compilation.units[0].text, "declare const x: number;\n");

        assert_eq!(compilation.units[1].kind, UnitKind::Emitted);
        assert_eq!(compilation.units[1].declaration_path, root_dir.join("sub/Bar.d.ts"));
        assert_eq!(compilation.units[1].diagnostics.len(), 1);

        assert_eq!(compilation.units[2].kind, UnitKind::NotEmitted);
        assert_eq!(compilation.units[2].source_path, missing);

        assert_eq!(compilation.global_diagnostics.len(), 1);
        assert_eq!(compilation.global_diagnostics[0].code, "TS2304");
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let runner = TscRunner::new(Utf8PathBuf::from("/nonexistent/bin/tsc"));
        let err = runner
            .emit(&request(Utf8Path::new("/project")))
            .await
            .unwrap_err();
        assert!(matches!(err, TscError::BinaryMissing(_)));
    }
}
