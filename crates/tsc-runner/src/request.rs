//! Compiler settings for one emit run.

use camino::Utf8PathBuf;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A value that does not name a known compiler setting.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

/// Language level of the emitted code. Ordered from oldest to newest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScriptTarget {
    Es3,
    Es5,
    Es2015,
    Es2016,
    Es2017,
    Es2018,
    Es2019,
    Es2020,
    Es2021,
    Es2022,
    Es2023,
    Es2024,
    #[default]
    EsNext,
}

impl ScriptTarget {
    /// The spelling accepted by `--target`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Es3 => "es3",
            Self::Es5 => "es5",
            Self::Es2015 => "es2015",
            Self::Es2016 => "es2016",
            Self::Es2017 => "es2017",
            Self::Es2018 => "es2018",
            Self::Es2019 => "es2019",
            Self::Es2020 => "es2020",
            Self::Es2021 => "es2021",
            Self::Es2022 => "es2022",
            Self::Es2023 => "es2023",
            Self::Es2024 => "es2024",
            Self::EsNext => "esnext",
        }
    }

    /// Whether ES module syntax is available at this level.
    pub fn supports_es_modules(&self) -> bool {
        *self >= Self::Es2015
    }
}

impl FromStr for ScriptTarget {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let target = match s.trim().to_ascii_lowercase().as_str() {
            "es3" => Self::Es3,
            "es5" => Self::Es5,
            "es6" | "es2015" => Self::Es2015,
            "es2016" => Self::Es2016,
            "es2017" => Self::Es2017,
            "es2018" => Self::Es2018,
            "es2019" => Self::Es2019,
            "es2020" => Self::Es2020,
            "es2021" => Self::Es2021,
            "es2022" => Self::Es2022,
            "es2023" => Self::Es2023,
            "es2024" => Self::Es2024,
            "esnext" | "latest" => Self::EsNext,
            _ => {
                return Err(UnknownValue {
                    kind: "target",
                    value: s.to_string(),
                })
            }
        };
        Ok(target)
    }
}

impl fmt::Display for ScriptTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the compiler resolves module specifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleResolution {
    Classic,
    Node10,
    Node16,
    NodeNext,
    Bundler,
}

impl ModuleResolution {
    /// The spelling accepted by `--moduleResolution`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Node10 => "node10",
            Self::Node16 => "node16",
            Self::NodeNext => "nodenext",
            Self::Bundler => "bundler",
        }
    }

    /// The `--module` kind the compiler accepts alongside this mode.
    pub fn module_kind(&self) -> &'static str {
        match self {
            Self::Classic | Self::Node10 => "commonjs",
            Self::Node16 => "node16",
            Self::NodeNext => "nodenext",
            Self::Bundler => "esnext",
        }
    }
}

impl FromStr for ModuleResolution {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mode = match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Self::Classic,
            "node" | "node10" => Self::Node10,
            "node16" => Self::Node16,
            "nodenext" => Self::NodeNext,
            "bundler" => Self::Bundler,
            _ => {
                return Err(UnknownValue {
                    kind: "module resolution",
                    value: s.to_string(),
                })
            }
        };
        Ok(mode)
    }
}

impl fmt::Display for ModuleResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line terminator of emitted files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NewLine {
    #[default]
    Lf,
    CrLf,
}

impl NewLine {
    /// Picks the terminator matching an end-of-line string.
    pub fn from_eol(eol: &str) -> Self {
        if eol == "\r\n" {
            Self::CrLf
        } else {
            Self::Lf
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "lf",
            Self::CrLf => "crlf",
        }
    }
}

/// Everything the compiler needs for one declaration-emit run.
#[derive(Debug, Clone, Default)]
pub struct EmitRequest {
    /// Root of the input tree; emitted declarations mirror its layout.
    pub root_dir: Utf8PathBuf,
    /// Project configuration to compile. When set, `files` is ignored and the
    /// configuration decides the program.
    pub project: Option<Utf8PathBuf>,
    /// Input files, used when no project is given.
    pub files: Vec<Utf8PathBuf>,
    pub target: Option<ScriptTarget>,
    pub module_resolution: Option<ModuleResolution>,
    pub jsx: Option<String>,
    /// Ambient type packages to include.
    pub types: Vec<String>,
    pub new_line: NewLine,
}
