//! Content type detection.

use std::path::{Path, PathBuf};

/// Content type detection error.
#[derive(Debug, thiserror::Error)]
pub enum MimeError {
    /// No known content type for the file extension.
    #[error("Cannot determine content type of {}", .0.display())]
    Unknown(PathBuf),
}

/// Guess the content type of a file from its name.
///
/// Only the extension is inspected; the file does not need to exist.
pub(crate) fn guess(path: &Path) -> Result<String, MimeError> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_owned())
        .ok_or_else(|| MimeError::Unknown(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_known_types() {
        assert_eq!(guess(Path::new("style.css")).unwrap(), "text/css");
        assert_eq!(guess(Path::new("app.js")).unwrap(), "text/javascript");
        assert_eq!(guess(Path::new("index.html")).unwrap(), "text/html");
        assert_eq!(guess(Path::new("/site/img/logo.png")).unwrap(), "image/png");
    }

    #[test]
    fn test_guess_without_extension_fails() {
        let err = guess(Path::new("/site/about")).unwrap_err();
        assert!(matches!(err, MimeError::Unknown(_)));
        assert!(err.to_string().contains("/site/about"));
    }

    #[test]
    fn test_guess_unknown_extension_fails() {
        assert!(guess(Path::new("file.unknown_ext_xyz")).is_err());
    }
}
