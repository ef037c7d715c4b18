//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::Parser;
use dts_bundle::{ModuleResolution, Options, ScriptTarget};
use std::sync::Arc;

/// Bundles TypeScript declaration files into a single module declaration file.
#[derive(Debug, Parser)]
#[command(name = "dts-bundle")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Package name, prepended to every module identifier
    #[arg(long)]
    pub name: Option<String>,

    /// Directory the module identifiers are relative to
    #[arg(long = "baseDir")]
    pub base_dir: Option<Utf8PathBuf>,

    /// Path to tsconfig.json, or a directory containing one
    #[arg(long)]
    pub project: Option<Utf8PathBuf>,

    /// Output file
    #[arg(long)]
    pub out: Utf8PathBuf,

    /// Module identifier to alias as the package name
    #[arg(long)]
    pub main: Option<String>,

    /// Prefix for computed module identifiers
    #[arg(long)]
    pub prefix: Option<String>,

    /// Glob pattern of files to leave out (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Path to reference with `/// <reference path>` (repeatable)
    #[arg(long = "extern")]
    pub externs: Vec<String>,

    /// Type package to reference with `/// <reference types>` (repeatable)
    #[arg(long)]
    pub types: Vec<String>,

    /// End of line sequence: lf, crlf, or an escaped literal such as "\r\n"
    #[arg(long, value_parser = parse_eol)]
    pub eol: Option<String>,

    /// Indentation, escapes such as "\t" allowed
    #[arg(long, value_parser = parse_escaped)]
    pub indent: Option<String>,

    /// Language level of the emitted declarations (es5, es2015, ..., esnext)
    #[arg(long)]
    pub target: Option<ScriptTarget>,

    /// Module resolution mode (classic, node, node16, nodenext, bundler)
    #[arg(long = "moduleResolution")]
    pub module_resolution: Option<ModuleResolution>,

    /// Print the resolved configuration
    #[arg(long)]
    pub verbose: bool,

    /// Input files, relative to the base directory
    pub files: Vec<Utf8PathBuf>,
}

impl Args {
    /// Converts the arguments into bundling options that report progress on
    /// stdout.
    pub fn into_options(self) -> Options {
        Options {
            base_dir: self.base_dir,
            project: self.project,
            files: self.files,
            exclude: self.exclude,
            externs: self.externs,
            types: self.types,
            eol: self.eol,
            indent: self.indent,
            main: self.main,
            name: self.name,
            out: self.out,
            module_resolution: self.module_resolution,
            target: self.target,
            prefix: self.prefix,
            sink: Some(Arc::new(|message: &str| println!("{}", message))),
            verbose: self.verbose,
            resolve_module_id: None,
            resolve_module_import: None,
        }
    }
}

fn parse_eol(value: &str) -> Result<String, String> {
    match value.to_ascii_lowercase().as_str() {
        "lf" => Ok("\n".to_string()),
        "crlf" => Ok("\r\n".to_string()),
        _ => parse_escaped(value),
    }
}

fn parse_escaped(value: &str) -> Result<String, String> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => return Err(format!("unsupported escape '\\{}'", other)),
            None => return Err("trailing backslash".to_string()),
        }
    }
    if out.is_empty() {
        return Err("value must not be empty".to_string());
    }
    Ok(out)
}
