use relative_path::{Component, RelativePath, RelativePathBuf};
use std::path::Path;

/* 📖 # Why use RelativePathBuf for FilePath?

FilePath wraps RelativePathBuf so every PAL path is relative to the PAL's base
directory rather than an absolute system path. The data directory, the collection
file and every static asset are addressed this way, and the compiler keeps absolute
paths out of the store and asset code.
*/

/// Type-safe wrapper for file paths relative to PAL base directory.
///
/// # Examples
///
/// ```
/// use shelf_base::FilePath;
///
/// let collection = FilePath::from("data").join("items.json");
/// assert_eq!(collection.to_string(), "data/items.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePath(RelativePathBuf);

impl FilePath {
    /// Map a request path onto a path below `root`.
    ///
    /// Returns None if any segment would leave `root` (`..`) or carries a drive or
    /// backslash separator. Empty and `.` segments are skipped.
    pub fn from_url_path(root: &FilePath, url_path: &str) -> Option<FilePath> {
        let mut mapped = root.0.clone();
        for component in RelativePath::new(url_path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(segment) => {
                    if segment.contains('\\') || segment.contains(':') {
                        return None;
                    }
                    mapped.push(segment);
                }
                Component::CurDir => {}
                Component::ParentDir => return None,
            }
        }
        Some(Self(mapped))
    }

    /// Append a path segment.
    pub fn join(&self, segment: impl AsRef<str>) -> FilePath {
        Self(self.0.join(segment.as_ref()))
    }

    /// Final component of the path, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.0.file_name()
    }

    /// Extension of the final component, if any.
    pub fn extension(&self) -> Option<&str> {
        self.0.extension()
    }

    /// Returns the underlying RelativePathBuf as a reference.
    pub fn as_relative(&self) -> &RelativePath {
        &self.0
    }

    /// Converts to a regular Path for use with std::fs operations.
    /// This returns the relative path portion without a base directory.
    pub fn as_path(&self) -> &Path {
        Path::new(self.as_relative().as_str())
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<&Path> for FilePath {
    fn from(p: &Path) -> Self {
        Self(RelativePathBuf::from(p.to_string_lossy().into_owned()))
    }
}

impl std::fmt::Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<RelativePath> for FilePath {
    fn as_ref(&self) -> &RelativePath {
        &self.0
    }
}
