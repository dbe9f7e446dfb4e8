// SPDX-License-Identifier: GPL-3.0-or-later

//! Response file (`@file`) expansion.
//!
//! Build systems pass long argument lists through files; a `@file` argument
//! stands for the tokenized contents of that file. The tokens are split the
//! way a shell command line would be, so quoted values with spaces survive.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResponseFileError {
    #[error("cannot read response file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot tokenize response file {path}: {source}")]
    Tokenize {
        path: PathBuf,
        #[source]
        source: shell_words::ParseError,
    },
}

/// The file a response-file argument refers to, for `@file` and the `-@file`
/// spelling some drivers accept. `None` for ordinary arguments.
pub fn reference(argument: &str) -> Option<&str> {
    let trimmed = argument.strip_prefix('-').unwrap_or(argument);
    trimmed.strip_prefix('@')
}

/// Reads and tokenizes a response file.
pub fn expand(path: &Path) -> Result<Vec<String>, ResponseFileError> {
    let content = fs::read_to_string(path).map_err(|source| ResponseFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    shell_words::split(&content).map_err(|source| ResponseFileError::Tokenize {
        path: path.to_path_buf(),
        source,
    })
}
