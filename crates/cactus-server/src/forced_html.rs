//! Extensionless top-level pages.
//!
//! Site generators emit "pretty URL" pages such as `about` next to
//! `index.html`. Those files carry no extension for content type detection,
//! so they are always served as `text/html`. Only entries directly under the
//! served root qualify; nested extensionless files keep their guessed type.

use std::collections::HashSet;
use std::io;
use std::path::Path;

/// Request paths that are always served as HTML.
///
/// Computed once when the server is constructed and never mutated.
#[derive(Debug, Default)]
pub(crate) struct ForcedHtmlPaths {
    paths: HashSet<String>,
}

impl ForcedHtmlPaths {
    /// Scan the top level of `root` for regular files without a `.` in their name.
    pub(crate) fn scan(root: &Path) -> io::Result<Self> {
        let mut paths = HashSet::new();

        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.contains('.') {
                continue;
            }
            // Follows symlinks, like the responder does when serving
            if entry.path().is_file() {
                paths.insert(name);
            }
        }

        Ok(Self { paths })
    }

    /// Check whether a request path (relative to the root) is forced to HTML.
    pub(crate) fn contains(&self, request_path: &str) -> bool {
        self.paths.contains(request_path.trim_start_matches('/'))
    }

    pub(crate) fn len(&self) -> usize {
        self.paths.len()
    }
}
