// SPDX-License-Identifier: GPL-3.0-or-later

//! This module defines the configuration of the application.
//!
//! The configuration is either loaded from a file or used with default
//! values, which are defined in the code. Environment variables override
//! whatever the file says, so a build job can flip a single knob without
//! touching the file.
//!
//! The configuration file syntax is based on the YAML format.
//! The default configuration file name is `cachalot.yml`.
//!
//! The configuration file location is searched in the following order:
//! 1. The current working directory
//! 2. The local configuration directory of the user
//! 3. The configuration directory of the user
//! 4. The local configuration directory of the application
//! 5. The configuration directory of the application
//!
//! ```yaml
//! base_dir: /opt/project
//! run_second_cpp: true
//! compiler: msvc
//! ```

// Re-Export the types and the loader module content.
pub use loader::{ConfigError, Loader};
pub use types::*;

mod types {
    use crate::interpret::Dialect;
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::path::PathBuf;

    /// Represents the application configuration.
    #[derive(Debug, Default, PartialEq, Deserialize, Serialize)]
    pub struct Main {
        /// The project root under which path arguments are rewritten to
        /// relative form for cache portability. Absolute, or unset to
        /// disable rewriting.
        #[serde(default)]
        pub base_dir: Option<PathBuf>,
        /// Feed preprocessor-affecting options to the compilation step too,
        /// so the compiler re-reads macros and includes itself instead of
        /// compiling the already-preprocessed output.
        #[serde(default)]
        pub run_second_cpp: bool,
        /// Overrides the dialect guessed from the compiler name.
        #[serde(default)]
        pub compiler: Option<CompilerDialect>,
    }

    impl fmt::Display for Main {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            writeln!(f, "Configuration:")?;
            match serde_yml::to_string(self) {
                Ok(yaml_string) => {
                    for line in yaml_string.lines() {
                        writeln!(f, "{}", line)?;
                    }
                    Ok(())
                }
                Err(_) => {
                    panic!("configuration can't be serialized")
                }
            }
        }
    }

    /// The argument dialects we can be told to assume.
    #[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
    #[serde(rename_all = "lowercase")]
    pub enum CompilerDialect {
        #[serde(alias = "gcc", alias = "clang", alias = "gnu")]
        Unix,
        #[serde(alias = "cl", alias = "clang-cl")]
        Msvc,
    }

    impl CompilerDialect {
        pub fn dialect(self) -> Dialect {
            match self {
                CompilerDialect::Unix => Dialect::Unix,
                CompilerDialect::Msvc => Dialect::Msvc,
            }
        }
    }
}

mod loader {
    use super::types::Main;
    use crate::context::Context;
    use directories::{BaseDirs, ProjectDirs};
    use log::debug;
    use std::fs;
    use std::path::{Path, PathBuf};
    use thiserror::Error;

    const CONFIG_FILE_NAME: &str = "cachalot.yml";
    const KEY_BASE_DIR: &str = "CACHALOT_BASEDIR";
    const KEY_RUN_SECOND_CPP: &str = "CACHALOT_RUN_SECOND_CPP";

    #[derive(Debug, Error)]
    pub enum ConfigError {
        #[error("Failed to read configuration file {path}: {source}")]
        Io {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        #[error("Failed to parse configuration file {path}: {source}")]
        Syntax {
            path: PathBuf,
            #[source]
            source: serde_yml::Error,
        },
        #[error("The base directory {0} is not absolute")]
        RelativeBaseDir(PathBuf),
    }

    pub struct Loader {}

    impl Loader {
        /// Loads the configuration from the specified file or the default
        /// locations, applies environment overrides and validates the result.
        ///
        /// If the configuration file is specified, it will be used. Otherwise
        /// the default locations are searched, and when none of them has a
        /// file the defaults apply.
        pub fn load(context: &Context, filename: &Option<String>) -> Result<Main, ConfigError> {
            let mut configuration = if let Some(path) = filename {
                Self::from_file(Path::new(path))?
            } else {
                Self::from_default_locations(context)?
            };
            Self::apply_environment(&mut configuration, context);
            Self::validate(&configuration)?;
            Ok(configuration)
        }

        fn from_default_locations(context: &Context) -> Result<Main, ConfigError> {
            for location in Self::file_locations(context) {
                debug!("Checking configuration file: {}", location.display());
                if location.exists() {
                    return Self::from_file(location.as_path());
                }
            }
            debug!("Configuration file not found. Using the default configuration.");
            Ok(Main::default())
        }

        fn from_file(path: &Path) -> Result<Main, ConfigError> {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            serde_yml::from_str(&content).map_err(|source| ConfigError::Syntax {
                path: path.to_path_buf(),
                source,
            })
        }

        /// The default locations where the configuration file can be found.
        fn file_locations(context: &Context) -> Vec<PathBuf> {
            let mut locations = Vec::new();

            locations.push(context.current_directory.join(CONFIG_FILE_NAME));
            if let Some(base_dirs) = BaseDirs::new() {
                locations.push(base_dirs.config_local_dir().join(CONFIG_FILE_NAME));
                locations.push(base_dirs.config_dir().join(CONFIG_FILE_NAME));
            }
            if let Some(project_dirs) = ProjectDirs::from("com.github", "cachalot", "Cachalot") {
                locations.push(project_dirs.config_local_dir().join(CONFIG_FILE_NAME));
                locations.push(project_dirs.config_dir().join(CONFIG_FILE_NAME));
            }

            locations
        }

        fn apply_environment(configuration: &mut Main, context: &Context) {
            if let Some(value) = context.environment.get(KEY_BASE_DIR) {
                configuration.base_dir = Some(PathBuf::from(value));
            }
            if let Some(value) = context.environment.get(KEY_RUN_SECOND_CPP) {
                configuration.run_second_cpp =
                    matches!(value.as_str(), "1" | "true" | "yes" | "on");
            }
        }

        fn validate(configuration: &Main) -> Result<(), ConfigError> {
            if let Some(base_dir) = &configuration.base_dir {
                if !base_dir.is_absolute() {
                    return Err(ConfigError::RelativeBaseDir(base_dir.clone()));
                }
            }
            Ok(())
        }
    }
}
