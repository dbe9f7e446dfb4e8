// SPDX-License-Identifier: GPL-3.0-or-later

//! Rewrites absolute paths under the configured base directory into relative
//! form, so that cache entries stay valid when the build tree is replayed
//! from a different location. Paths outside the base directory are assumed
//! external (system headers, toolchain files) and stay absolute.

use std::path::{Path, PathBuf};

/// Path rewriting for cache portability.
///
/// The rewriting is a pure function of the configured base directory, the
/// current working directory and the file system at call time; instances are
/// cheap to clone and safe to share.
#[derive(Debug, Clone)]
pub struct Relativizer {
    base_dir: Option<PathBuf>,
    current_dir: PathBuf,
}

impl Relativizer {
    pub fn new(base_dir: Option<PathBuf>, current_dir: PathBuf) -> Self {
        Relativizer { base_dir, current_dir }
    }

    /// A relativizer that rewrites nothing.
    pub fn disabled(current_dir: PathBuf) -> Self {
        Relativizer { base_dir: None, current_dir }
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// Rewrites `path` into a form relative to the current working directory
    /// when it falls under the base directory; any other path comes back
    /// unchanged. Mixed separator styles are tolerated and the result always
    /// uses forward slashes.
    pub fn relativize(&self, path: &str) -> String {
        let Some(base_dir) = &self.base_dir else {
            return path.to_string();
        };
        let normalized = normalize_separators(path);
        let base = normalize_separators(&base_dir.to_string_lossy());
        if !normalized.starts_with(&base) {
            return path.to_string();
        }

        let full = PathBuf::from(&normalized);
        // Canonicalization only works for existing paths. For a path that
        // does not exist yet (a to-be-written output, a future include dir),
        // resolve the parent directory and reassemble; when the parent does
        // not exist either there is nothing trustworthy to resolve against.
        if let Ok(canonical) = full.canonicalize() {
            return relative_from(&self.current_dir, &canonical);
        }
        let (Some(parent), Some(file_name)) = (full.parent(), full.file_name()) else {
            return path.to_string();
        };
        match parent.canonicalize() {
            Ok(canonical) => {
                let prefix = relative_from(&self.current_dir, &canonical);
                format!("{}/{}", prefix, file_name.to_string_lossy())
            }
            Err(_) => path.to_string(),
        }
    }
}

/// The relative path from `from` to `to`, both absolute: ascend out of the
/// components `from` does not share with `to`, then descend into the rest of
/// `to`. Two equal paths give `.`.
fn relative_from(from: &Path, to: &Path) -> String {
    let from_components: Vec<_> = from.components().collect();
    let to_components: Vec<_> = to.components().collect();

    let mut common = 0;
    while common < from_components.len()
        && common < to_components.len()
        && from_components[common] == to_components[common]
    {
        common += 1;
    }

    let mut segments: Vec<String> = Vec::new();
    for _ in common..from_components.len() {
        segments.push(String::from(".."));
    }
    for component in &to_components[common..] {
        segments.push(component.as_os_str().to_string_lossy().into_owned());
    }

    if segments.is_empty() {
        String::from(".")
    } else {
        segments.join("/")
    }
}

fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn working_dir() -> (TempDir, PathBuf) {
        let directory = TempDir::new().unwrap();
        let canonical = directory.path().canonicalize().unwrap();
        (directory, canonical)
    }

    fn rooted(cwd: &Path) -> Relativizer {
        Relativizer::new(Some(PathBuf::from("/")), cwd.to_path_buf())
    }

    #[test]
    fn test_missing_file_resolves_through_parent() {
        let (_directory, cwd) = working_dir();
        let relativizer = rooted(&cwd);

        let path = format!("{}/foo.c", cwd.display());
        assert_eq!(relativizer.relativize(&path), "./foo.c");
    }

    #[test]
    fn test_existing_file_resolves_without_dot_prefix() {
        let (_directory, cwd) = working_dir();
        let relativizer = rooted(&cwd);

        fs::write(cwd.join("foo.c"), "int main;").unwrap();
        let path = format!("{}/foo.c", cwd.display());
        assert_eq!(relativizer.relativize(&path), "foo.c");
    }

    #[test]
    fn test_nested_directories() {
        let (_directory, cwd) = working_dir();
        let relativizer = rooted(&cwd);

        fs::create_dir_all(cwd.join("a/b/c")).unwrap();
        assert_eq!(
            relativizer.relativize(&format!("{}/a/foo.c", cwd.display())),
            "a/foo.c"
        );
        assert_eq!(
            relativizer.relativize(&format!("{}/a/b/foo.c", cwd.display())),
            "a/b/foo.c"
        );
        assert_eq!(
            relativizer.relativize(&format!("{}/a/b/c/foo.c", cwd.display())),
            "a/b/c/foo.c"
        );
    }

    #[test]
    fn test_missing_parent_leaves_path_alone() {
        let (_directory, cwd) = working_dir();
        let relativizer = rooted(&cwd);

        fs::create_dir_all(cwd.join("a/b/c")).unwrap();
        let path = format!("{}/a/b/c/d/foo.c", cwd.display());
        assert_eq!(relativizer.relativize(&path), path);
    }

    #[test]
    fn test_path_above_the_working_directory_ascends() {
        let (_directory, cwd) = working_dir();
        fs::create_dir_all(cwd.join("build/sub")).unwrap();
        fs::create_dir_all(cwd.join("include")).unwrap();
        let relativizer = rooted(&cwd.join("build/sub"));

        assert_eq!(
            relativizer.relativize(&format!("{}/include", cwd.display())),
            "../../include"
        );
    }

    #[test]
    fn test_path_outside_base_dir_stays_absolute() {
        let (_directory, cwd) = working_dir();
        let relativizer = Relativizer::new(Some(cwd.clone()), cwd.clone());

        assert_eq!(relativizer.relativize("/usr/include"), "/usr/include");
    }

    #[test]
    fn test_disabled_base_dir_rewrites_nothing() {
        let (_directory, cwd) = working_dir();
        let relativizer = Relativizer::disabled(cwd.clone());

        let path = format!("{}/foo.c", cwd.display());
        assert_eq!(relativizer.relativize(&path), path);
        assert_eq!(relativizer.relativize("."), ".");
    }

    #[test]
    fn test_relative_argument_stays_untouched() {
        let (_directory, cwd) = working_dir();
        let relativizer = Relativizer::new(Some(cwd.clone()), cwd.clone());

        assert_eq!(relativizer.relativize("foo.c"), "foo.c");
        assert_eq!(relativizer.relativize("sub/dir"), "sub/dir");
    }

    #[test]
    fn test_mixed_separators_are_normalized() {
        let (_directory, cwd) = working_dir();
        let relativizer = rooted(&cwd);

        fs::create_dir_all(cwd.join("a/b")).unwrap();
        let path = format!("{}\\a\\foo.c", cwd.display());
        assert_eq!(relativizer.relativize(&path), "a/foo.c");
        let path = format!("{}\\a/b\\foo.c", cwd.display());
        assert_eq!(relativizer.relativize(&path), "a/b/foo.c");
    }

    #[test]
    fn test_round_trip_reproduces_the_absolute_path() {
        let (_directory, cwd) = working_dir();
        let relativizer = rooted(&cwd);

        fs::create_dir_all(cwd.join("a")).unwrap();
        fs::write(cwd.join("a/foo.c"), "").unwrap();
        let original = format!("{}/a/foo.c", cwd.display());

        let relative = relativizer.relativize(&original);
        let reassembled = cwd.join(&relative).canonicalize().unwrap();
        assert_eq!(reassembled, PathBuf::from(&original).canonicalize().unwrap());
    }
}
