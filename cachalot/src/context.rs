// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::{Context as AnyhowContext, Result};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Application context containing runtime environment information.
///
/// Captured once at startup so that configuration loading and the argument
/// interpretation itself are pure over a stable snapshot, with no further
/// environment reads.
#[derive(Debug, Clone)]
pub struct Context {
    /// Current working directory when the tool was invoked
    pub current_directory: PathBuf,
    /// All environment variables at startup
    pub environment: HashMap<String, String>,
}

impl Context {
    /// Capture the current application context.
    pub fn capture() -> Result<Self> {
        let current_directory =
            env::current_dir().with_context(|| "Failed to get current working directory")?;
        let environment = env::vars().collect::<HashMap<String, String>>();

        Ok(Context { current_directory, environment })
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Application Context:")?;
        writeln!(f, "Current Directory: {}", self.current_directory.display())?;
        write!(f, "Total Environment Variables: {} entries", self.environment.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_capture() {
        let context = Context::capture().unwrap();
        assert!(context.current_directory.is_absolute());
    }

    #[test]
    fn test_display_format() {
        let context = Context::capture().unwrap();
        let display_output = format!("{}", context);

        assert!(display_output.contains("Application Context:"));
        assert!(display_output.contains("Current Directory:"));
        assert!(display_output.contains("Total Environment Variables:"));
    }
}
