// SPDX-License-Identifier: GPL-3.0-or-later

//! The argument-splitting state machine.
//!
//! Walks the invocation left to right, consults the option knowledge base per
//! token and produces two argument vectors: one for the preprocessing
//! sub-invocation and one for the compilation sub-invocation. Along the way
//! it extracts the single source input, captures or infers the object output
//! and routes dependency-generation options to the preprocessor side only.
//!
//! Options the cache cannot handle do not abort the walk: the splitter
//! finishes a best-effort split and reports the bypass reason, so the caller
//! can still run the real compiler unmodified and account for the miss
//! precisely.

use super::options;
use super::paths::Relativizer;
use super::response;
use super::{Dialect, Outcome, ProcessError, Split};
use std::fs;
use std::path::{Path, PathBuf};

pub struct Splitter<'a> {
    dialect: Dialect,
    run_second_cpp: bool,
    paths: &'a Relativizer,
}

/// Accumulated walk state. Common arguments reach both sub-invocations,
/// preprocessor arguments reach the compilation step only when a second
/// preprocessor run is configured, dependency arguments never do.
#[derive(Default)]
struct Walk {
    common: Vec<String>,
    cpp: Vec<String>,
    dep: Vec<String>,
    input_file: Option<String>,
    captured_output: Option<String>,
    captured_executable: Option<String>,
    dependency_file: Option<String>,
    found_compile_only: bool,
    found_assembly_only: bool,
    direct_mode_ruled_out: bool,
    bypass: Option<Outcome>,
    fatal: Option<ProcessError>,
}

impl Walk {
    fn note_unsupported(&mut self, option: &str) {
        log::debug!("option {option} is unsupported for caching");
        if self.bypass.is_none() {
            self.bypass = Some(Outcome::UnsupportedOption { option: option.to_string() });
        }
    }

    fn note_preprocessing(&mut self, option: &str) {
        log::debug!("{option} calls for preprocessing; nothing to cache");
        // An explicit preprocessing request wins over any other bypass reason,
        // no matter where it sits in the vector.
        self.bypass = Some(Outcome::ExplicitPreprocessing);
    }

    fn note_fatal(&mut self, error: ProcessError) {
        log::debug!("{error}");
        if self.fatal.is_none() {
            self.fatal = Some(error);
        }
    }
}

impl<'a> Splitter<'a> {
    pub fn new(dialect: Dialect, run_second_cpp: bool, paths: &'a Relativizer) -> Self {
        Splitter { dialect, run_second_cpp, paths }
    }

    /// Splits a full compiler invocation (compiler name first) into the
    /// preprocessing and compilation argument vectors.
    pub fn split(&self, arguments: &[String]) -> Result<Split, ProcessError> {
        let mut argv: Vec<String> = arguments.to_vec();
        if argv.is_empty() {
            return Err(ProcessError::NoInputFile);
        }
        let compiler = argv[0].clone();
        let mut walk = Walk::default();

        let mut i = 1;
        while i < argv.len() {
            let argument = argv[i].clone();

            // Response files splice in place and are re-examined from the
            // same position; the spliced tokens may refer to further files.
            if let Some(file) = response::reference(&argument) {
                let tokens = response::expand(&self.resolve(file))?;
                log::debug!("expanded {argument} into {} arguments", tokens.len());
                argv.splice(i..=i, tokens);
                continue;
            }

            if self.requests_preprocessing(&argument) {
                walk.note_preprocessing(&argument);
                i += 1;
                continue;
            }

            if options::is_too_hard(&argument, self.dialect) {
                walk.note_unsupported(&argument);
                i += 1;
                continue;
            }

            if self.requests_compile_only(&argument) {
                // re-appended at the end of the compiler arguments
                walk.found_compile_only = true;
                i += 1;
                continue;
            }

            if self.dialect == Dialect::Unix && argument == "-S" {
                walk.found_assembly_only = true;
                walk.common.push(argument);
                i += 1;
                continue;
            }

            if self.dialect == Dialect::Unix && argument.starts_with("-Wp,") {
                self.forwarded_preprocessor_argument(&argument, &mut walk);
                i += 1;
                continue;
            }

            if self.dialect == Dialect::Unix && argument.starts_with("-M") {
                if let Some(consumed) = self.dependency_argument(&argv, i, &mut walk) {
                    i += consumed;
                    continue;
                }
                // not a dependency flag after all; classify normally
            }

            if self.dialect == Dialect::Unix && argument.starts_with("-fprofile-") {
                walk.common.push(self.rewrite_profile_argument(&argument));
                i += 1;
                continue;
            }

            if self.dialect == Dialect::Unix && (argument == "-g3" || argument == "-ggdb3") {
                // full macro debug info embeds what the preprocessor would see
                log::debug!("{argument} used; direct mode ruled out");
                walk.direct_mode_ruled_out = true;
                walk.common.push(argument);
                i += 1;
                continue;
            }

            if self.dialect == Dialect::Unix {
                if let Some(value) = argument.strip_prefix("--sysroot=") {
                    let rewritten = format!("--sysroot={}", self.paths.relativize(value));
                    walk.common.push(rewritten);
                    i += 1;
                    continue;
                }
                if argument == "--sysroot" {
                    let Some(value) = argv.get(i + 1) else {
                        walk.note_fatal(ProcessError::MissingArgument { option: argument });
                        i += 1;
                        continue;
                    };
                    walk.common.push(argument.clone());
                    walk.common.push(self.paths.relativize(value));
                    i += 2;
                    continue;
                }
            }

            if argument == "-o" {
                let Some(value) = argv.get(i + 1) else {
                    walk.note_fatal(ProcessError::MissingArgument { option: argument });
                    i += 1;
                    continue;
                };
                walk.captured_output = Some(value.clone());
                i += 2;
                continue;
            }
            // alternate form of -o with no space
            if self.dialect == Dialect::Unix && argument.len() > 2 && argument.starts_with("-o") {
                walk.captured_output = Some(argument["-o".len()..].to_string());
                i += 1;
                continue;
            }

            if self.dialect == Dialect::Msvc {
                if let Some(consumed) = self.msvc_output_argument(&argv, i, &mut walk) {
                    i += consumed;
                    continue;
                }
            }

            i += self.classify(&argv, i, &mut walk);
        }

        self.finish(compiler, walk)
    }

    /// Generic, table-driven handling of one token; returns how many
    /// arguments were consumed. Exact lookup first, prefix lookup as the
    /// fallback for concatenated forms, then the input-file / passthrough
    /// default.
    fn classify(&self, argv: &[String], i: usize, walk: &mut Walk) -> usize {
        let argument = &argv[i];
        let spelling = self.dialect.translate(argument);

        if let Some(attributes) = options::lookup_exact(argument, self.dialect) {
            if attributes.too_hard_for_direct_mode() {
                log::debug!("{argument} used; direct mode ruled out");
                walk.direct_mode_ruled_out = true;
            }
            if attributes.takes_arg() {
                // the next element is the value, even if it looks like a flag
                let Some(value) = argv.get(i + 1) else {
                    walk.note_fatal(ProcessError::MissingArgument { option: argument.clone() });
                    return 1;
                };
                let value = if attributes.takes_path() {
                    self.paths.relativize(value)
                } else {
                    value.clone()
                };
                let destination = if attributes.affects_preprocessor() {
                    &mut walk.cpp
                } else {
                    &mut walk.common
                };
                destination.push(spelling.into_owned());
                destination.push(value);
                return 2;
            }
            let destination = if attributes.affects_preprocessor() {
                &mut walk.cpp
            } else {
                &mut walk.common
            };
            destination.push(spelling.into_owned());
            return 1;
        }

        if let Some((_, attributes)) = options::lookup_prefix(argument, self.dialect) {
            if let Some(offset) = options::concatenated_arg_offset(argument, self.dialect) {
                // concatenated path value: relativize and re-join without a
                // separator
                let value = self.paths.relativize(&argument[offset..]);
                let rejoined = format!("{}{}", &spelling[..offset], value);
                if attributes.affects_preprocessor() {
                    walk.cpp.push(rejoined);
                } else {
                    walk.common.push(rejoined);
                }
                return 1;
            }
            if options::prefix_affects_preprocessor(argument, self.dialect) {
                walk.cpp.push(spelling.into_owned());
                return 1;
            }
            // recognized spelling, nothing special about the value
            walk.common.push(spelling.into_owned());
            return 1;
        }

        if !argument.starts_with('-') && self.is_regular_file(argument) {
            if let Some(first) = &walk.input_file {
                walk.note_fatal(ProcessError::MultipleInputFiles {
                    first: first.clone(),
                    second: argument.clone(),
                });
            } else {
                walk.input_file = Some(self.paths.relativize(argument));
            }
            return 1;
        }

        // Unknown options and non-file tokens pass through unchanged, in
        // their original relative order.
        walk.common.push(argument.clone());
        1
    }

    /// `-MD`, `-MF foo.d` and friends: preprocessor side files only, never
    /// re-triggered during compilation. Both the separate and the
    /// concatenated value forms are forwarded verbatim, spelling included,
    /// because downstream consumers depend on exact target formatting.
    fn dependency_argument(&self, argv: &[String], i: usize, walk: &mut Walk) -> Option<usize> {
        let argument = &argv[i];
        match argument.as_str() {
            "-MD" | "-MMD" | "-MP" | "-MG" => {
                walk.dep.push(argument.clone());
                return Some(1);
            }
            _ => {}
        }
        for option in ["-MF", "-MT", "-MQ"] {
            if let Some(value) = argument.strip_prefix(option) {
                if value.is_empty() {
                    let Some(value) = argv.get(i + 1) else {
                        walk.note_fatal(ProcessError::MissingArgument { option: argument.clone() });
                        return Some(1);
                    };
                    if option == "-MF" {
                        walk.dependency_file = Some(self.paths.relativize(value));
                    }
                    walk.dep.push(argument.clone());
                    walk.dep.push(value.clone());
                    return Some(2);
                }
                if option == "-MF" {
                    walk.dependency_file = Some(self.paths.relativize(value));
                }
                walk.dep.push(argument.clone());
                return Some(1);
            }
        }
        None
    }

    /// The `-Wp,…` comma-joined preprocessor-forwarding form.
    fn forwarded_preprocessor_argument(&self, argument: &str, walk: &mut Walk) {
        // -Wp,-P strips the line information the cache keys on
        if argument == "-Wp,-P" || argument.contains(",-P,") || argument.ends_with(",-P") {
            walk.note_unsupported(argument);
            return;
        }
        for (option, offset) in [("-Wp,-MD,", 8), ("-Wp,-MMD,", 9)] {
            if argument.starts_with(option) && !argument[offset..].contains(',') {
                walk.dependency_file = Some(self.paths.relativize(&argument[offset..]));
                walk.dep.push(argument.to_string());
                return;
            }
        }
        if argument.starts_with("-Wp,-M") {
            // -Wp,-MP, -Wp,-MT,target, -Wp,-MQ,target, -Wp,-MF,file: these
            // affect only the dependency side files
            walk.dep.push(argument.to_string());
            return;
        }
        // Anything else forwarded to the preprocessor is opaque; the
        // preprocessor run sees it, the direct mode cannot.
        walk.direct_mode_ruled_out = true;
        walk.cpp.push(argument.to_string());
    }

    /// `-fprofile-generate=dir` and friends hash better with a canonical
    /// directory; only an existing one can be resolved.
    fn rewrite_profile_argument(&self, argument: &str) -> String {
        let Some((option, directory)) = argument.split_once('=') else {
            return argument.to_string();
        };
        match self.resolve(directory).canonicalize() {
            Ok(canonical) => {
                let rewritten = format!("{}={}", option, canonical.display());
                log::debug!("rewriting {argument} to {rewritten}");
                rewritten
            }
            Err(_) => argument.to_string(),
        }
    }

    /// MSVC output file arguments. `/Fo` names the object output and is
    /// captured rather than forwarded; `/Fe` names the executable and is
    /// recorded but travels on through the generic classification.
    fn msvc_output_argument(&self, argv: &[String], i: usize, walk: &mut Walk) -> Option<usize> {
        let spelling = self.dialect.translate(&argv[i]);
        if let Some(rest) = spelling.strip_prefix("/Fo") {
            if rest.is_empty() || rest == ":" {
                let Some(value) = argv.get(i + 1) else {
                    walk.note_fatal(ProcessError::MissingArgument { option: argv[i].clone() });
                    return Some(1);
                };
                walk.captured_output = Some(strip_quotes(value).to_string());
                return Some(2);
            }
            let value = rest.strip_prefix(':').unwrap_or(rest);
            walk.captured_output = Some(strip_quotes(value).to_string());
            return Some(1);
        }
        if let Some(rest) = spelling.strip_prefix("/Fe") {
            let value = if rest.is_empty() || rest == ":" {
                argv.get(i + 1).map(|next| strip_quotes(next).to_string())
            } else {
                Some(strip_quotes(rest.strip_prefix(':').unwrap_or(rest)).to_string())
            };
            if let Some(value) = value {
                walk.captured_executable = Some(value);
            }
            // fall through: the tokens themselves stay in the vectors
        }
        None
    }

    fn finish(&self, compiler: String, mut walk: Walk) -> Result<Split, ProcessError> {
        let bypass = walk.bypass.take();
        if let Some(error) = walk.fatal.take() {
            // a bypass reason outranks structural errors found in the same walk
            if bypass.is_none() {
                return Err(error);
            }
        }
        if bypass.is_none() && walk.input_file.is_none() {
            return Err(ProcessError::NoInputFile);
        }

        let output_file = self.resolve_output(&walk);
        let output_executable = walk
            .captured_executable
            .as_deref()
            .map(|value| self.paths.relativize(value));

        let mut preprocessor_arguments =
            Vec::with_capacity(1 + walk.common.len() + walk.cpp.len() + walk.dep.len());
        preprocessor_arguments.push(compiler.clone());
        preprocessor_arguments.extend(walk.common.iter().cloned());
        preprocessor_arguments.extend(walk.cpp.iter().cloned());
        preprocessor_arguments.extend(walk.dep.iter().cloned());

        let mut compiler_arguments = Vec::with_capacity(2 + walk.common.len() + walk.cpp.len());
        compiler_arguments.push(compiler);
        compiler_arguments.extend(walk.common);
        if self.run_second_cpp {
            compiler_arguments.extend(walk.cpp);
        }
        if walk.found_compile_only {
            compiler_arguments.push(String::from("-c"));
        }

        Ok(Split {
            outcome: bypass.unwrap_or(Outcome::Success),
            preprocessor_arguments,
            compiler_arguments,
            input_file: walk.input_file,
            output_file,
            output_executable,
            dependency_file: walk.dependency_file,
            direct_mode_possible: !walk.direct_mode_ruled_out,
        })
    }

    /// The object output: captured, synthesized from the source name for the
    /// directory-only form, or defaulted from the source name.
    fn resolve_output(&self, walk: &Walk) -> Option<String> {
        let extension = if walk.found_assembly_only {
            "s"
        } else {
            self.dialect.object_extension()
        };
        match &walk.captured_output {
            Some(value) if value.ends_with('/') || value.ends_with('\\') => {
                let stem = source_stem(walk.input_file.as_deref()?)?;
                let directory = value.trim_end_matches(&['/', '\\'][..]);
                Some(format!("{}/{stem}.{extension}", self.paths.relativize(directory)))
            }
            Some(value) => Some(self.paths.relativize(value)),
            None => {
                let stem = source_stem(walk.input_file.as_deref()?)?;
                Some(format!("{stem}.{extension}"))
            }
        }
    }

    fn requests_preprocessing(&self, argument: &str) -> bool {
        match self.dialect {
            Dialect::Unix => argument == "-E" || argument == "-P",
            Dialect::Msvc => {
                matches!(argument, "-E" | "/E" | "-EP" | "/EP" | "-P" | "/P")
            }
        }
    }

    fn requests_compile_only(&self, argument: &str) -> bool {
        argument == "-c" || (self.dialect == Dialect::Msvc && argument == "/c")
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.paths.current_dir().join(candidate)
        }
    }

    fn is_regular_file(&self, argument: &str) -> bool {
        fs::metadata(self.resolve(argument))
            .map(|metadata| metadata.is_file())
            .unwrap_or(false)
    }
}

fn source_stem(input: &str) -> Option<&str> {
    Path::new(input).file_stem().and_then(|stem| stem.to_str())
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}
