// SPDX-License-Identifier: GPL-3.0-or-later

use cachalot::interpret::{Dialect, Relativizer, Splitter};
use cachalot::stats::InterpretationStatistics;
use cachalot::{args, config, context};
use std::fs::File;
use std::io::Write;
use std::process::ExitCode;

/// Driver function of the application.
fn main() -> anyhow::Result<ExitCode> {
    // Initialize the logging system.
    env_logger::init();
    // Get the package name and version from Cargo
    let pkg_name = env!("CARGO_PKG_NAME");
    let pkg_version = env!("CARGO_PKG_VERSION");
    log::info!("{pkg_name} v{pkg_version}");

    // Capture application context.
    let context = context::Context::capture()?;
    log::info!("{context}");
    // Parse the command line arguments.
    let matches = args::cli().get_matches();
    let arguments = args::Arguments::try_from(matches)?;
    // Load the configuration.
    let configuration = config::Loader::load(&context, &arguments.config)?;
    log::info!("{configuration}");

    let dialect = configuration
        .compiler
        .map(config::CompilerDialect::dialect)
        .unwrap_or_else(|| Dialect::guess(&arguments.command[0]));
    log::debug!("interpreting for the {dialect:?} dialect");

    let relativizer =
        Relativizer::new(configuration.base_dir.clone(), context.current_directory.clone());
    let splitter = Splitter::new(dialect, configuration.run_second_cpp, &relativizer);
    let statistics = InterpretationStatistics::new();

    let exit_code = match splitter.split(&arguments.command) {
        Ok(split) => {
            statistics.record_outcome(&split.outcome);
            write_report(&arguments.output, &serde_json::to_value(&split)?)?;
            ExitCode::SUCCESS
        }
        Err(error) => {
            statistics.record_error(&error);
            log::error!("{error}");
            let report = serde_json::json!({ "error": error.to_string() });
            write_report(&arguments.output, &report)?;
            ExitCode::FAILURE
        }
    };
    log::info!("{statistics}");

    Ok(exit_code)
}

fn write_report(output: &str, report: &serde_json::Value) -> anyhow::Result<()> {
    if output == "-" {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, report)?;
        writeln!(handle)?;
    } else {
        let file = File::create(output)?;
        serde_json::to_writer_pretty(file, report)?;
    }
    Ok(())
}
