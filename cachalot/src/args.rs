// SPDX-License-Identifier: GPL-3.0-or-later

//! This module contains the command line interface of the application.
//!
//! The command line parsing is implemented using the `clap` library. The
//! module defines types to represent a structured form of the program
//! invocation: the compiler command to interpret and where to write the
//! report.

use anyhow::anyhow;
use clap::{arg, command, ArgAction, ArgMatches, Command};

const DEFAULT_OUTPUT_FILE: &str = "-";

/// Represents the command line arguments of the application.
#[derive(Debug, PartialEq)]
pub struct Arguments {
    // The path of the configuration file.
    pub config: Option<String>,
    // Where the report is written; `-` stands for the standard output.
    pub output: String,
    // The compiler invocation to interpret, compiler name first.
    pub command: Vec<String>,
}

impl TryFrom<ArgMatches> for Arguments {
    type Error = anyhow::Error;

    fn try_from(matches: ArgMatches) -> Result<Self, Self::Error> {
        let config = matches.get_one::<String>("config").map(String::to_string);
        let output = matches
            .get_one::<String>("output")
            .map(String::to_string)
            .expect("output is defaulted");
        let command: Vec<String> = matches
            .get_many::<String>("COMMAND")
            .ok_or_else(|| anyhow!("missing compiler command"))?
            .cloned()
            .collect();

        Ok(Arguments { config, output, command })
    }
}

/// Represents the command line interface of the application.
///
/// The compiler invocation comes after a `--` separator, exactly as the build
/// system would have spelled it.
pub fn cli() -> Command {
    command!().arg_required_else_help(true).args(&[
        arg!(-c --config <FILE> "Path of the config file"),
        arg!(-o --output <FILE> "Path of the report file")
            .default_value(DEFAULT_OUTPUT_FILE)
            .hide_default_value(false),
        arg!(<COMMAND> "Compiler invocation")
            .action(ArgAction::Append)
            .value_terminator("--")
            .num_args(1..)
            .last(true)
            .required(true),
    ])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_full_call() {
        let execution = vec![
            "cachalot",
            "-c",
            "~/cachalot.yml",
            "-o",
            "report.json",
            "--",
            "gcc",
            "-c",
            "foo.c",
        ];

        let matches = cli().get_matches_from(execution);
        let arguments = Arguments::try_from(matches).unwrap();

        assert_eq!(
            arguments,
            Arguments {
                config: Some("~/cachalot.yml".into()),
                output: "report.json".into(),
                command: vec!["gcc", "-c", "foo.c"].into_iter().map(String::from).collect(),
            }
        );
    }

    #[test]
    fn test_defaults() {
        let execution = vec!["cachalot", "--", "cc", "-c", "foo.c", "-o", "foo.o"];

        let matches = cli().get_matches_from(execution);
        let arguments = Arguments::try_from(matches).unwrap();

        assert_eq!(
            arguments,
            Arguments {
                config: None,
                output: "-".into(),
                command: vec!["cc", "-c", "foo.c", "-o", "foo.o"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            }
        );
    }

    #[test]
    fn test_compiler_options_are_not_parsed_as_own_options() {
        // the -o after the separator belongs to the compiler, not to us
        let execution = vec!["cachalot", "--", "cc", "-o", "foo.o", "-c", "foo.c"];

        let matches = cli().get_matches_from(execution);
        let arguments = Arguments::try_from(matches).unwrap();

        assert_eq!(arguments.output, "-");
        assert_eq!(
            arguments.command,
            vec!["cc", "-o", "foo.o", "-c", "foo.c"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }
}
