//! Compiler output parser.
//!
//! Understands the `--pretty false` diagnostic format of `tsc`,
//! `file(line,col): error TS1234: message`, the `tsgo` format,
//! `file:line:col - error TS1234: message`, and the absolute paths printed by
//! `--listFiles`.

use crate::paths::absolutize;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A diagnostic reported by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TscDiagnostic {
    /// The file the diagnostic belongs to, absolute and normalized. `None` for
    /// program-wide diagnostics such as invalid options.
    pub file: Option<Utf8PathBuf>,
    pub start: DiagnosticPosition,
    /// The error code, e.g. `TS2322`.
    pub code: String,
    pub message: String,
    pub severity: DiagnosticSeverity,
}

/// A position in a diagnostic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticPosition {
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number.
    pub column: u32,
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Suggestion,
    Message,
}

impl DiagnosticSeverity {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Suggestion => "suggestion",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for TscDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}({},{}): ", file, self.start.line, self.start.column)?;
        }
        write!(f, "{} {}: {}", self.severity.as_str(), self.code, self.message)
    }
}

/// Parsed compiler output.
#[derive(Debug, Default)]
pub struct TscOutput {
    pub diagnostics: Vec<TscDiagnostic>,
    /// Program files in compiler order, absolute and normalized.
    pub listed_files: Vec<Utf8PathBuf>,
}

/// Parses compiler stdout. Relative paths are resolved against `cwd`.
pub fn parse_tsc_output(output: &str, cwd: &Utf8Path) -> TscOutput {
    let mut parsed = TscOutput::default();
    let mut continues_diagnostic = false;

    for line in output.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continues_diagnostic = false;
            continue;
        }

        if let Some(diag) = parse_diagnostic_line(line, cwd) {
            parsed.diagnostics.push(diag);
            continues_diagnostic = true;
            continue;
        }

        // Chained messages are indented under their diagnostic
        if continues_diagnostic && line.starts_with(' ') {
            if let Some(last) = parsed.diagnostics.last_mut() {
                last.message.push('\n');
                last.message.push_str(line);
            }
            continue;
        }
        continues_diagnostic = false;

        let path = Utf8Path::new(line.trim());
        if path.is_absolute() {
            parsed.listed_files.push(absolutize(path, cwd));
        }
    }

    parsed
}

/// Parses a single diagnostic line in either supported format.
fn parse_diagnostic_line(line: &str, cwd: &Utf8Path) -> Option<TscDiagnostic> {
    if let Some(rest) = strip_severity(line) {
        // Program-wide diagnostic: `error TS5023: message`
        let (severity, rest) = rest;
        let (code, message) = split_code(rest)?;
        return Some(TscDiagnostic {
            file: None,
            start: DiagnosticPosition::default(),
            code,
            message,
            severity,
        });
    }

    parse_tsc_format(line, cwd).or_else(|| parse_tsgo_format(line, cwd))
}

/// `file(line,col): error TS1234: message`
fn parse_tsc_format(line: &str, cwd: &Utf8Path) -> Option<TscDiagnostic> {
    for (idx, _) in line.match_indices("): ") {
        let location = &line[..idx];
        let Some(open) = location.rfind('(') else {
            continue;
        };
        let Some((line_str, col_str)) = location[open + 1..].split_once(',') else {
            continue;
        };
        let (Ok(line_num), Ok(column)) = (line_str.parse::<u32>(), col_str.parse::<u32>()) else {
            continue;
        };
        let Some((severity, rest)) = strip_severity(&line[idx + 3..]) else {
            continue;
        };
        let (code, message) = split_code(rest)?;
        return Some(TscDiagnostic {
            file: Some(absolutize(Utf8Path::new(&location[..open]), cwd)),
            start: DiagnosticPosition {
                line: line_num,
                column,
            },
            code,
            message,
            severity,
        });
    }
    None
}

/// `file:line:col - error TS1234: message`
fn parse_tsgo_format(line: &str, cwd: &Utf8Path) -> Option<TscDiagnostic> {
    let (location, message_part) = line.split_once(" - ")?;

    let loc_parts: Vec<&str> = location.rsplitn(3, ':').collect();
    if loc_parts.len() < 3 {
        return None;
    }
    let column: u32 = loc_parts[0].parse().ok()?;
    let line_num: u32 = loc_parts[1].parse().ok()?;
    let file_path = loc_parts[2];

    let (severity, rest) = strip_severity(message_part)?;
    let (code, message) = split_code(rest)?;

    Some(TscDiagnostic {
        file: Some(absolutize(Utf8Path::new(file_path), cwd)),
        start: DiagnosticPosition {
            line: line_num,
            column,
        },
        code,
        message,
        severity,
    })
}

fn strip_severity(text: &str) -> Option<(DiagnosticSeverity, &str)> {
    const SEVERITIES: &[(&str, DiagnosticSeverity)] = &[
        ("error ", DiagnosticSeverity::Error),
        ("warning ", DiagnosticSeverity::Warning),
        ("suggestion ", DiagnosticSeverity::Suggestion),
        ("message ", DiagnosticSeverity::Message),
    ];
    SEVERITIES.iter().find_map(|(prefix, severity)| {
        let rest = text.strip_prefix(prefix)?;
        rest.starts_with("TS").then_some((*severity, rest))
    })
}

/// Splits `TS1234: message` into code and message.
fn split_code(rest: &str) -> Option<(String, String)> {
    let (code, message) = rest.split_once(':')?;
    let code = code.trim();
    if !code.starts_with("TS") || !code[2..].chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((code.to_string(), message.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CWD: &str = "/project";

    #[test]
    fn test_parse_tsc_diagnostic_line() {
        let line = "src/App.ts(10,5): error TS2322: Type 'string' is not assignable to type 'number'.";
        let diag = parse_diagnostic_line(line, Utf8Path::new(CWD)).unwrap();
        assert_eq!(diag.file.as_deref(), Some(Utf8Path::new("/project/src/App.ts")));
        assert_eq!(diag.start, DiagnosticPosition { line: 10, column: 5 });
        assert_eq!(diag.code, "TS2322");
        assert_eq!(
            diag.message,
            "Type 'string' is not assignable to type 'number'."
        );
        assert_eq!(diag.severity, DiagnosticSeverity::Error);
    }

    #[test]
    fn test_parse_path_with_parentheses() {
        let line = "src/(group)/a.ts(1,2): error TS1005: ';' expected.";
        let diag = parse_diagnostic_line(line, Utf8Path::new(CWD)).unwrap();
        assert_eq!(diag.file.as_deref(), Some(Utf8Path::new("/project/src/(group)/a.ts")));
        assert_eq!(diag.code, "TS1005");
    }

    #[test]
    fn test_parse_tsgo_diagnostic_line() {
        let line = "src/App.ts:3:7 - error TS2304: Cannot find name 'foo'.";
        let diag = parse_diagnostic_line(line, Utf8Path::new(CWD)).unwrap();
        assert_eq!(diag.file.as_deref(), Some(Utf8Path::new("/project/src/App.ts")));
        assert_eq!(diag.start, DiagnosticPosition { line: 3, column: 7 });
        assert_eq!(diag.code, "TS2304");
    }

    #[test]
    fn test_parse_global_diagnostic() {
        let diag =
            parse_diagnostic_line("error TS5023: Unknown compiler option 'foo'.", Utf8Path::new(CWD))
                .unwrap();
        assert_eq!(diag.file, None);
        assert_eq!(diag.code, "TS5023");
        assert_eq!(diag.to_string(), "error TS5023: Unknown compiler option 'foo'.");
    }

    #[test]
    fn test_parse_listed_files_and_continuations() {
        let output = "/usr/lib/node_modules/typescript/lib/lib.es5.d.ts\n\
                      /project/index.ts\n\
                      index.ts(2,1): error TS2322: Type 'A' is not assignable to type 'B'.\n  \
                      Property 'x' is missing.\n\
                      /project/Bar.ts\n\
                      \n\
                      Found 1 error.\n";
        let parsed = parse_tsc_output(output, Utf8Path::new(CWD));
        assert_eq!(
            parsed.listed_files,
            vec![
                Utf8PathBuf::from("/usr/lib/node_modules/typescript/lib/lib.es5.d.ts"),
                Utf8PathBuf::from("/project/index.ts"),
                Utf8PathBuf::from("/project/Bar.ts"),
            ]
        );
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(
            parsed.diagnostics[0].message,
            "Type 'A' is not assignable to type 'B'.\n  Property 'x' is missing."
        );
    }

    #[test]
    fn test_display_with_file() {
        let diag = TscDiagnostic {
            file: Some(Utf8PathBuf::from("/project/a.ts")),
            start: DiagnosticPosition { line: 1, column: 9 },
            code: "TS1005".to_string(),
            message: "';' expected.".to_string(),
            severity: DiagnosticSeverity::Error,
        };
        assert_eq!(diag.to_string(), "/project/a.ts(1,9): error TS1005: ';' expected.");
    }

    #[test]
    fn test_parse_empty_output() {
        let parsed = parse_tsc_output("", Utf8Path::new(CWD));
        assert!(parsed.diagnostics.is_empty());
        assert!(parsed.listed_files.is_empty());
    }
}
