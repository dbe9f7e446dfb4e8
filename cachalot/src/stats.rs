// SPDX-License-Identifier: GPL-3.0-or-later

//! Statistics for the interpretation layer.
//!
//! One counter per terminal condition, updated lock-free with atomic
//! operations so any number of concurrent invocations can share a single
//! instance. After processing, the collected numbers can be logged to show
//! how invocations were classified.

use crate::interpret::{Outcome, ProcessError};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters over the outcome taxonomy of the argument interpretation.
#[derive(Debug, Default)]
pub struct InterpretationStatistics {
    /// Invocations that can be served from the cache.
    pub cacheable: AtomicUsize,

    /// Invocations whose whole purpose is preprocessor output.
    pub preprocessing_requested: AtomicUsize,

    /// Invocations bypassed because of an option the cache cannot handle.
    pub unsupported_options: AtomicUsize,

    /// Invocations naming more than one source file.
    pub multiple_input_files: AtomicUsize,

    /// Invocations naming no source file at all.
    pub missing_input_files: AtomicUsize,

    /// Invocations with a value-taking option at the end of the vector.
    pub bad_arguments: AtomicUsize,

    /// Invocations with an unreadable or untokenizable response file.
    pub response_file_errors: AtomicUsize,
}

impl InterpretationStatistics {
    /// Creates a new instance wrapped in an `Arc` for sharing.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_outcome(&self, outcome: &Outcome) {
        match outcome {
            Outcome::Success => &self.cacheable,
            Outcome::ExplicitPreprocessing => &self.preprocessing_requested,
            Outcome::UnsupportedOption { .. } => &self.unsupported_options,
        }
        .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self, error: &ProcessError) {
        match error {
            ProcessError::MultipleInputFiles { .. } => &self.multiple_input_files,
            ProcessError::NoInputFile => &self.missing_input_files,
            ProcessError::MissingArgument { .. } => &self.bad_arguments,
            ProcessError::ResponseFile(_) => &self.response_file_errors,
        }
        .fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Display for InterpretationStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Interpretation outcomes:")?;
        writeln!(f, "  cacheable: {}", self.cacheable.load(Ordering::Relaxed))?;
        writeln!(
            f,
            "  called for preprocessing: {}",
            self.preprocessing_requested.load(Ordering::Relaxed)
        )?;
        writeln!(
            f,
            "  unsupported options: {}",
            self.unsupported_options.load(Ordering::Relaxed)
        )?;
        writeln!(
            f,
            "  multiple input files: {}",
            self.multiple_input_files.load(Ordering::Relaxed)
        )?;
        writeln!(
            f,
            "  missing input files: {}",
            self.missing_input_files.load(Ordering::Relaxed)
        )?;
        writeln!(f, "  bad arguments: {}", self.bad_arguments.load(Ordering::Relaxed))?;
        write!(
            f,
            "  response file errors: {}",
            self.response_file_errors.load(Ordering::Relaxed)
        )
    }
}
