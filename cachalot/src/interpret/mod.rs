// SPDX-License-Identifier: GPL-3.0-or-later

//! Semantic interpretation of compiler invocations for caching.
//!
//! This module decides whether an invocation is cacheable and how to split it
//! into a preprocessing and a compilation step. The main pieces are:
//! - `options`: the static knowledge base of compiler option spellings and
//!   their syntactic attributes, one table per dialect.
//! - `splitter`: the state machine that walks the argument vector and
//!   produces the two sub-invocation argument vectors.
//! - `paths`: base-directory path rewriting for cache portability.
//! - `response`: `@file` response-file expansion.
//!
//! The dialect is an explicit parameter everywhere; there is no process-wide
//! compiler selection, so concurrent invocations are fully independent.

pub mod options;
pub mod paths;
pub mod response;
pub mod splitter;

use serde::Serialize;
use std::borrow::Cow;
use std::path::Path;
use thiserror::Error;

pub use paths::Relativizer;
pub use splitter::Splitter;

/// The option spelling convention of a compiler driver: Unix style (`-flag`)
/// or MSVC style (`/flag`). Selected once per invocation from the detected
/// driver name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Unix,
    Msvc,
}

impl Dialect {
    /// Guesses the dialect from the compiler executable name.
    pub fn guess(compiler: &str) -> Dialect {
        let name = Path::new(compiler)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(compiler);
        let name = name.strip_suffix(".exe").unwrap_or(name);
        match name {
            "cl" | "clang-cl" => Dialect::Msvc,
            _ => Dialect::Unix,
        }
    }

    /// The object file extension the compiler emits by default.
    pub fn object_extension(self) -> &'static str {
        match self {
            Dialect::Unix => "o",
            Dialect::Msvc => "obj",
        }
    }

    /// MSVC tooling accepts Unix-style dashes for most of its options; the
    /// knowledge base stores the slash spelling, so lookups rewrite a leading
    /// `-` to `/` first. Unix spellings are searched verbatim.
    pub(crate) fn translate(self, option: &str) -> Cow<'_, str> {
        match self {
            Dialect::Msvc if option.starts_with('-') => Cow::Owned(format!("/{}", &option[1..])),
            _ => Cow::Borrowed(option),
        }
    }
}

/// Whether the invocation can be served from the cache, and if not, why the
/// caller has to fall back to the real compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Outcome {
    /// The invocation is cacheable.
    Success,
    /// The entire purpose of the invocation is preprocessor output, which the
    /// cache does not memoize.
    ExplicitPreprocessing,
    /// An option makes caching this invocation unsafe or infeasible.
    UnsupportedOption { option: String },
}

/// The result of splitting a compiler invocation. Constructed once per
/// invocation, immutable after the splitter returns, owned by the caching
/// orchestrator for the remainder of the request.
///
/// The resolved input and output paths travel here rather than in the
/// argument vectors; the orchestrator appends them when it assembles the real
/// sub-invocations.
#[derive(Debug, PartialEq, Serialize)]
pub struct Split {
    pub outcome: Outcome,
    /// Arguments of the preprocessing sub-invocation, compiler name first.
    pub preprocessor_arguments: Vec<String>,
    /// Arguments of the compilation sub-invocation, compiler name first.
    pub compiler_arguments: Vec<String>,
    /// The single source input, relativized when it falls under the base
    /// directory.
    pub input_file: Option<String>,
    /// The object output, captured from `-o`/`/Fo` or inferred from the input
    /// file name.
    pub output_file: Option<String>,
    /// The executable output (MSVC `/Fe`), when one is named.
    pub output_executable: Option<String>,
    /// The dependency file (`-MF`, `-Wp,-MD,…`), when one is named.
    pub dependency_file: Option<String>,
    /// False when an option rules out the direct (no-preprocessing) cache
    /// mode for this invocation.
    pub direct_mode_possible: bool,
}

/// Conditions that are fatal for the invocation. Every one of them is a
/// deterministic function of the arguments and the file system at call time;
/// nothing is retried here.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("multiple input files: {first} and {second}")]
    MultipleInputFiles { first: String, second: String },
    #[error("no input file found")]
    NoInputFile,
    #[error("missing argument to {option}")]
    MissingArgument { option: String },
    #[error(transparent)]
    ResponseFile(#[from] response::ResponseFileError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_guess() {
        assert_eq!(Dialect::guess("cl"), Dialect::Msvc);
        assert_eq!(Dialect::guess("cl.exe"), Dialect::Msvc);
        assert_eq!(Dialect::guess("clang-cl"), Dialect::Msvc);
        assert_eq!(Dialect::guess("C:/tools/cl.exe"), Dialect::Msvc);

        assert_eq!(Dialect::guess("cc"), Dialect::Unix);
        assert_eq!(Dialect::guess("gcc"), Dialect::Unix);
        assert_eq!(Dialect::guess("/usr/bin/clang++"), Dialect::Unix);
    }

    #[test]
    fn test_dialect_translation() {
        assert_eq!(Dialect::Msvc.translate("-Fofoo.obj"), "/Fofoo.obj");
        assert_eq!(Dialect::Msvc.translate("/Fofoo.obj"), "/Fofoo.obj");
        assert_eq!(Dialect::Unix.translate("-Ifoo"), "-Ifoo");
    }

    #[test]
    fn test_object_extension() {
        assert_eq!(Dialect::Unix.object_extension(), "o");
        assert_eq!(Dialect::Msvc.object_extension(), "obj");
    }
}
