//! Source file set and wildcard expansion

use indexmap::IndexSet;
use log::{debug, trace};
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::diagnostic::DiagnosticEngine;

/// Ordered, duplicate-free list of source files
#[derive(Debug, Clone, Default)]
pub struct SourceFileSet {
    files: IndexSet<PathBuf>,
}

impl SourceFileSet {
    /// Add one file. A repeated path warns 2002 and is ignored.
    pub fn add(&mut self, path: PathBuf, diagnostics: &mut DiagnosticEngine) -> bool {
        if self.files.contains(&path) {
            diagnostics.report_warning(
                2002,
                1,
                format!("Source file `{}' specified multiple times", path.display()),
            );
            return false;
        }
        trace!("adding source {}", path.display());
        self.files.insert(path)
    }

    /// First path added; names the default output
    pub fn first(&self) -> Option<&Path> {
        self.files.first().map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Add a literal file or every file matching a `*` pattern. With `recurse`
    /// the pattern is applied in every subdirectory as well.
    pub fn process(&mut self, spec: &str, recurse: bool, diagnostics: &mut DiagnosticEngine) {
        let (dir, pattern) = split_path_and_pattern(spec);

        if !pattern.contains('*') && !recurse {
            self.add(PathBuf::from(spec), diagnostics);
            return;
        }

        let matcher = match wildcard_regex(pattern) {
            Ok(matcher) => matcher,
            Err(e) => {
                debug!("bad wildcard {}: {}", pattern, e);
                diagnostics.report_error(2001, format!("Source file `{}' could not be found", spec));
                return;
            }
        };

        self.expand_directory(Path::new(dir), &matcher, recurse, spec, diagnostics);
    }

    fn expand_directory(
        &mut self,
        dir: &Path,
        matcher: &Regex,
        recurse: bool,
        spec: &str,
        diagnostics: &mut DiagnosticEngine,
    ) {
        if !dir.is_dir() {
            diagnostics.report_error(2001, format!("Source file `{}' could not be found", spec));
            return;
        }

        let mut subdirs = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                subdirs.push(entry.into_path());
            } else if entry.file_name().to_str().is_some_and(|name| matcher.is_match(name)) {
                self.add(entry.into_path(), diagnostics);
            }
        }

        if recurse {
            for subdir in subdirs {
                self.expand_directory(&subdir, matcher, true, spec, diagnostics);
            }
        }
    }
}

/// `src/*.cs` -> (`src`, `*.cs`); a bare pattern searches `.`
fn split_path_and_pattern(spec: &str) -> (&str, &str) {
    match spec.rfind('/').or_else(|| spec.rfind('\\')) {
        Some(0) => ("/", &spec[1..]),
        Some(pos) => (&spec[..pos], &spec[pos + 1..]),
        None => (".", spec),
    }
}

/// Translate a `*`/`?` wildcard into an anchored regex
fn wildcard_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut re = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            _ => re.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    re.push('$');
    Regex::new(&re)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path_and_pattern() {
        assert_eq!(split_path_and_pattern("*.cs"), (".", "*.cs"));
        assert_eq!(split_path_and_pattern("src/*.cs"), ("src", "*.cs"));
        assert_eq!(split_path_and_pattern("src\\a?.cs"), ("src", "a?.cs"));
        assert_eq!(split_path_and_pattern("/x.cs"), ("/", "x.cs"));
    }

    #[test]
    fn test_wildcard_regex() {
        let re = wildcard_regex("a*.cs").unwrap();
        assert!(re.is_match("a.cs"));
        assert!(re.is_match("abc.cs"));
        assert!(!re.is_match("b.cs"));
        assert!(!re.is_match("a.csx"));
    }
}
