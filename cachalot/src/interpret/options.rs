// SPDX-License-Identifier: GPL-3.0-or-later

//! The compiler option knowledge base.
//!
//! Two strictly sorted tables (one per dialect) map option spellings to a
//! small set of syntactic attributes: does the option take a value, may the
//! value be concatenated to the spelling, does the value denote a path, does
//! the option change preprocessor output, and does it rule out caching. The
//! tables are binary-searched both for exact spellings and for spellings that
//! prefix a longer token (the concatenated-argument forms).
//!
//! Options are opaque tokens here; nothing in this module knows what a flag
//! means to the compiler beyond these attributes.

use super::Dialect;

const TOO_HARD: u8 = 1 << 0;
const TOO_HARD_DIRECT: u8 = 1 << 1;
const TAKES_ARG: u8 = 1 << 2;
const TAKES_CONCAT_ARG: u8 = 1 << 3;
const TAKES_PATH: u8 = 1 << 4;
const AFFECTS_CPP: u8 = 1 << 5;

/// The syntactic attributes of a known compiler option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes(u8);

impl Attributes {
    /// The option makes the whole invocation uncacheable.
    pub fn too_hard(self) -> bool {
        self.0 & TOO_HARD != 0
    }

    /// The option is compatible with the preprocessor cache mode but not with
    /// the direct (no-preprocessing) mode.
    pub fn too_hard_for_direct_mode(self) -> bool {
        self.0 & TOO_HARD_DIRECT != 0
    }

    /// The option is followed by a value, as the next argument or
    /// concatenated to the spelling.
    pub fn takes_arg(self) -> bool {
        self.0 & TAKES_ARG != 0
    }

    /// The value may immediately follow the spelling with no separator.
    pub fn takes_concatenated_arg(self) -> bool {
        self.0 & TAKES_CONCAT_ARG != 0
    }

    /// The value denotes a filesystem path and is eligible for
    /// relativization.
    pub fn takes_path(self) -> bool {
        self.0 & TAKES_PATH != 0
    }

    /// The option changes preprocessor output and must always reach the
    /// preprocessing sub-invocation.
    pub fn affects_preprocessor(self) -> bool {
        self.0 & AFFECTS_CPP != 0
    }
}

struct KnownOption {
    name: &'static str,
    attributes: u8,
}

const fn opt(name: &'static str, attributes: u8) -> KnownOption {
    KnownOption { name, attributes }
}

/// Unix-dialect options, strictly sorted by spelling.
#[rustfmt::skip]
static UNIX_OPTIONS: &[KnownOption] = &[
    opt("--param",          TAKES_ARG),
    opt("--save-temps",     TOO_HARD),
    opt("--serialize-diagnostics", TAKES_ARG | TAKES_PATH),
    opt("-A",               TAKES_ARG),
    opt("-B",               TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("-D",               AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG),
    opt("-E",               TOO_HARD),
    opt("-F",               AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("-G",               TAKES_ARG),
    opt("-I",               AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("-L",               TAKES_ARG),
    opt("-M",               TOO_HARD),
    opt("-MF",              TAKES_ARG),
    opt("-MM",              TOO_HARD),
    opt("-MQ",              TAKES_ARG),
    opt("-MT",              TAKES_ARG),
    opt("-P",               TOO_HARD),
    opt("-U",               AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG),
    opt("-V",               TAKES_ARG),
    opt("-Xassembler",      TAKES_ARG),
    opt("-Xclang",          TAKES_ARG),
    opt("-Xlinker",         TAKES_ARG),
    opt("-Xpreprocessor",   AFFECTS_CPP | TOO_HARD_DIRECT | TAKES_ARG),
    opt("-arch",            TAKES_ARG),
    opt("-aux-info",        TAKES_ARG),
    opt("-b",               TAKES_ARG),
    opt("-fmodules",        TOO_HARD),
    opt("-fno-working-directory", AFFECTS_CPP),
    opt("-fplugin=libcc1plugin", TOO_HARD), // interaction with GDB
    opt("-frepo",           TOO_HARD),
    opt("-fworking-directory", AFFECTS_CPP),
    opt("-idirafter",       AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("-iframework",      AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("-imacros",         AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("-imultilib",       AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("-include",         AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("-include-pch",     AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("-install_name",    TAKES_ARG), // Darwin linker option
    opt("-iprefix",         AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("-iquote",          AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("-isysroot",        AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("-isystem",         AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("-iwithprefix",     AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("-iwithprefixbefore", AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("-nostdinc",        AFFECTS_CPP),
    opt("-nostdinc++",      AFFECTS_CPP),
    opt("-remap",           AFFECTS_CPP),
    opt("-save-temps",      TOO_HARD),
    opt("-stdlib=",         AFFECTS_CPP | TAKES_CONCAT_ARG),
    opt("-trigraphs",       AFFECTS_CPP),
    opt("-u",               TAKES_ARG | TAKES_CONCAT_ARG),
];

/// MSVC-dialect options, strictly sorted by spelling.
#[rustfmt::skip]
static MSVC_OPTIONS: &[KnownOption] = &[
    opt("/AI",    AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("/C",     AFFECTS_CPP),
    opt("/D",     AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG),
    opt("/E",     TOO_HARD),
    opt("/EH",    TAKES_CONCAT_ARG),
    opt("/EP",    TOO_HARD),
    opt("/FA",    TAKES_CONCAT_ARG),
    opt("/FC",    0),
    opt("/FI",    AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("/FR",    TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH), // extended.sbr
    opt("/FR:",   TAKES_ARG | TAKES_PATH),                    // extended.sbr
    opt("/FS",    0),
    opt("/FU",    AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH), // force assembly
    opt("/Fa",    TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH), // assembly_listing.txt
    opt("/Fa:",   TAKES_ARG | TAKES_PATH),                    // assembly_listing.txt
    opt("/Fd",    TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH), // debug.pdb
    opt("/Fd:",   TAKES_ARG | TAKES_PATH),                    // debug.pdb
    opt("/Fe",    TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH), // foo.exe
    opt("/Fe:",   TAKES_ARG | TAKES_PATH),                    // foo.exe
    opt("/Fi",    TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH), // foo.i
    opt("/Fi:",   TAKES_ARG | TAKES_PATH),                    // foo.i
    opt("/Fm",    TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH), // map.txt
    opt("/Fm:",   TAKES_ARG | TAKES_PATH),                    // map.txt
    opt("/Fo",    TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH), // foo.obj
    opt("/Fo:",   TAKES_ARG | TAKES_PATH),                    // foo.obj
    opt("/Fp",    TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH), // headers.pch
    opt("/Fp:",   TAKES_ARG | TAKES_PATH),                    // headers.pch
    opt("/Fr",    TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH), // source_browser.sbr
    opt("/Fr:",   TAKES_ARG | TAKES_PATH),                    // source_browser.sbr
    opt("/Fx",    AFFECTS_CPP),
    opt("/GA",    0),
    opt("/GF",    0),
    opt("/GH",    0),
    opt("/GL",    0),
    opt("/GL-",   0),
    opt("/GR",    0),
    opt("/GR-",   0),
    opt("/GS",    0),
    opt("/GS-",   0),
    opt("/GT",    0),
    opt("/GX",    0),
    opt("/GX-",   0),
    opt("/GZ",    0),
    opt("/Ge",    0),
    opt("/Gh",    0),
    opt("/Gm",    0),
    opt("/Gm-",   0),
    opt("/Gs",    TAKES_CONCAT_ARG),
    opt("/Gv",    0),
    opt("/Gw",    0),
    opt("/Gw-",   0),
    opt("/Gy",    0),
    opt("/Gy-",   0),
    opt("/H",     TAKES_CONCAT_ARG),
    opt("/I",     AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH),
    opt("/J",     0),
    opt("/L",     TAKES_ARG),
    opt("/MD",    0),
    opt("/MDd",   0),
    opt("/MP",    TAKES_CONCAT_ARG),
    opt("/MT",    0),
    opt("/MTd",   0),
    opt("/O",     TAKES_CONCAT_ARG),
    opt("/P",     TOO_HARD),
    opt("/Qfast_transcendentals", 0),
    opt("/Qpar",  0),
    opt("/Qpar-", TAKES_CONCAT_ARG),
    opt("/RTC",   TAKES_CONCAT_ARG),
    opt("/TC",    0),
    opt("/TP",    0),
    opt("/Tc",    TAKES_CONCAT_ARG),
    opt("/Tp",    TAKES_CONCAT_ARG),
    opt("/U",     AFFECTS_CPP | TAKES_ARG | TAKES_CONCAT_ARG),
    opt("/V",     TAKES_CONCAT_ARG),
    opt("/W",     TAKES_CONCAT_ARG),
    opt("/WL",    0),
    opt("/WX",    0),
    opt("/Wall",  0),
    opt("/Wv:",   TAKES_CONCAT_ARG),
    opt("/X",     AFFECTS_CPP),
    opt("/Y",     0),
    opt("/Yc",    TAKES_CONCAT_ARG | TAKES_PATH),
    opt("/Yd",    0),
    opt("/Yl",    TAKES_CONCAT_ARG),
    opt("/Yu",    TAKES_CONCAT_ARG | TAKES_PATH),
    opt("/Z7",    0),
    opt("/ZH:",   TAKES_CONCAT_ARG),
    opt("/ZI",    0),
    opt("/ZW",    0),
    opt("/Za",    0),
    opt("/Zc:",   TAKES_CONCAT_ARG),
    opt("/Zi",    0),
    opt("/Zl",    0),
    opt("/Zm",    TAKES_CONCAT_ARG),
    opt("/Zo",    0),
    opt("/Zo-",   0),
    opt("/Zp",    TAKES_CONCAT_ARG),
    opt("/Zs",    0),
    opt("/arch:", TAKES_CONCAT_ARG),
    opt("/await", 0),
    opt("/bigobj", 0),
    opt("/clr",   0),
    opt("/clr:",  TAKES_CONCAT_ARG),
    opt("/constexpr:", TAKES_CONCAT_ARG),
    opt("/doc",   TAKES_ARG | TAKES_CONCAT_ARG | TAKES_PATH), // .xdc
    opt("/errorReport:", TAKES_CONCAT_ARG),
    opt("/execution-charset:", TAKES_CONCAT_ARG),
    opt("/favor:", TAKES_CONCAT_ARG),
    opt("/fp:",   TAKES_CONCAT_ARG),
    opt("/guard:cf", 0),
    opt("/guard:cf-", 0),
    opt("/homeparams", 0),
    opt("/nologo", 0),
    opt("/openmp", 0),
    opt("/sdl",   0),
    opt("/showIncludes", TOO_HARD),
    opt("/source-charset:", TAKES_CONCAT_ARG),
    opt("/u",     AFFECTS_CPP),
    opt("/utf-8", 0),
    opt("/validate-charset", 0),
    opt("/validate-charset-", 0),
    opt("/vd",    TAKES_CONCAT_ARG),
    opt("/vm",    TAKES_CONCAT_ARG),
    opt("/volatile:", TAKES_CONCAT_ARG),
    opt("/w",     TAKES_CONCAT_ARG),
    opt("/wd",    TAKES_CONCAT_ARG),
    opt("/we",    TAKES_CONCAT_ARG),
    opt("/wo",    TAKES_CONCAT_ARG),
];

fn table(dialect: Dialect) -> &'static [KnownOption] {
    match dialect {
        Dialect::Unix => UNIX_OPTIONS,
        Dialect::Msvc => MSVC_OPTIONS,
    }
}

fn find(option: &str, dialect: Dialect) -> Option<&'static KnownOption> {
    let spelling = dialect.translate(option);
    let entries = table(dialect);
    entries
        .binary_search_by(|candidate| candidate.name.cmp(spelling.as_ref()))
        .ok()
        .map(|index| &entries[index])
}

fn find_prefix(option: &str, dialect: Dialect) -> Option<&'static KnownOption> {
    let spelling = dialect.translate(option);
    let entries = table(dialect);
    let query = spelling.as_bytes();
    // An entry matches when its spelling is a literal prefix of the query;
    // the comparison truncates the query to the candidate's length.
    let seed = entries
        .binary_search_by(|candidate| {
            let length = candidate.name.len().min(query.len());
            candidate.name.as_bytes().cmp(&query[..length])
        })
        .ok()?;
    // Several entries can prefix the same token (e.g. /Fo and /Fo:). Paired
    // spellings sit next to each other in the sorted table with the longer
    // one last, so walk right and keep the most specific match.
    let mut index = seed;
    while index + 1 < entries.len() && spelling.starts_with(entries[index + 1].name) {
        index += 1;
    }
    Some(&entries[index])
}

/// Exact-match lookup of `option` in the dialect-appropriate table.
pub fn lookup_exact(option: &str, dialect: Dialect) -> Option<Attributes> {
    find(option, dialect).map(|known| Attributes(known.attributes))
}

/// Finds the known option whose spelling is a literal prefix of `token`,
/// returning the matched spelling with its attributes. Used for detecting
/// concatenated-argument forms; unrelated to exact lookup, which callers must
/// try first.
pub fn lookup_prefix(token: &str, dialect: Dialect) -> Option<(&'static str, Attributes)> {
    find_prefix(token, dialect).map(|known| (known.name, Attributes(known.attributes)))
}

/// The byte offset in `token` where a concatenated value begins, but only
/// when the matched option takes a concatenated path value and the remainder
/// is path-shaped. Lets the caller split `-isystem/usr/include` into
/// `-isystem` and `/usr/include` without a separator.
///
/// Dialect translation only rewrites the first byte, so the offset indexes
/// the original token as well.
pub fn concatenated_arg_offset(token: &str, dialect: Dialect) -> Option<usize> {
    let known = find_prefix(token, dialect)?;
    let attributes = Attributes(known.attributes);
    if !attributes.takes_concatenated_arg() || !attributes.takes_path() {
        return None;
    }
    let offset = known.name.len();
    if has_directory_separator(&token[offset..]) {
        Some(offset)
    } else {
        None
    }
}

/// Whether a token of the form option+value changes preprocessor output.
///
/// Prefix options have to take concatenated values. Path-taking options count
/// when the remainder looks like a path; value-taking options (`-stdlib=c…`)
/// count when it does not. The asymmetry keeps `-stdlib=libc++` spellings and
/// path-like suffixes apart when deciding cacheability impact.
pub fn prefix_affects_preprocessor(token: &str, dialect: Dialect) -> bool {
    let Some(known) = find_prefix(token, dialect) else {
        return false;
    };
    let attributes = Attributes(known.attributes);
    if !attributes.takes_concatenated_arg() || !attributes.affects_preprocessor() {
        return false;
    }
    let value = &token[known.name.len()..];
    if attributes.takes_path() {
        value.contains('.') || has_directory_separator(value)
    } else {
        !value.contains('.') && !has_directory_separator(value)
    }
}

/// The option is in the table and does not rule out caching.
pub fn is_known(option: &str, dialect: Dialect) -> bool {
    matches!(lookup_exact(option, dialect), Some(attributes) if !attributes.too_hard())
}

/// The option rules out caching the invocation.
pub fn is_too_hard(option: &str, dialect: Dialect) -> bool {
    matches!(lookup_exact(option, dialect), Some(attributes) if attributes.too_hard())
}

/// A value counts as path-shaped when it names a directory level, detected as
/// containing a separator.
pub(crate) fn has_directory_separator(value: &str) -> bool {
    value.contains('/') || value.contains('\\')
}
