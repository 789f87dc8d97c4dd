//! # Extension Traits
//!
//! Convenience methods on top of [`FsCommands`].
//!
//! ## Available Methods
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`exists`](FsExt::exists) | Check if a path names a node |
//! | [`is_file`](FsExt::is_file) | Check if path is a file (or file link) |
//! | [`is_folder`](FsExt::is_folder) | Check if path is a folder (or folder link) |
//! | [`file_size`](FsExt::file_size) | Size in bytes |
//!
//! ## JSON Support (Feature-Gated)
//!
//! With the `serde` feature enabled, additional methods are available:
//!
//! | Method | Description |
//! |--------|-------------|
//! | `read_json` | Read and deserialize JSON file |
//! | `write_json` | Serialize and write JSON file |
//!
//! Enable with:
//! ```toml
//! [dependencies]
//! memtree = { version = "0.1", features = ["serde"] }
//! ```

use crate::{FsCommands, FsError, FsResult};

/// Extension methods for anything implementing [`FsCommands`].
///
/// # Example
///
/// ```rust
/// use memtree::{FileSystem, FsCommands, FsExt};
///
/// let mut fs = FileSystem::new();
/// fs.mkdir("/data", false).unwrap();
/// assert!(fs.is_folder("/data").unwrap());
/// assert!(!fs.exists("/config.json").unwrap());
/// ```
pub trait FsExt: FsCommands {
    /// Check if the path names a node.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    fn exists(&self, path: &str) -> FsResult<bool> {
        match self.metadata(path) {
            Ok(_) => Ok(true),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if the path points to a file or a link to one.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    fn is_file(&self, path: &str) -> FsResult<bool> {
        match self.metadata(path) {
            Ok(m) => Ok(m.is_file()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if the path points to a folder or a link to one.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    fn is_folder(&self, path: &str) -> FsResult<bool> {
        match self.metadata(path) {
            Ok(m) => Ok(m.is_folder()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Get the size of a node in bytes.
    ///
    /// # Errors
    ///
    /// Returns `FsError::NotFound` if the path doesn't exist.
    fn file_size(&self, path: &str) -> FsResult<u64> {
        Ok(self.metadata(path)?.size)
    }
}

impl<F: FsCommands + ?Sized> FsExt for F {}

// =============================================================================
// JSON Support (Feature-Gated)
// =============================================================================

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use serde::{Serialize, de::DeserializeOwned};

    /// JSON serialization extension methods.
    ///
    /// Available when the `serde` feature is enabled.
    pub trait FsExtJson: FsCommands {
        /// Read a file and deserialize it as JSON.
        ///
        /// # Errors
        ///
        /// - `FsError::NotFound`: File doesn't exist
        /// - `FsError::InvalidData`: File isn't valid UTF-8
        /// - `FsError::Deserialization`: JSON parsing failed
        ///
        /// # Example
        ///
        /// ```rust
        /// # #[cfg(feature = "serde")]
        /// # {
        /// use memtree::{FileSystem, FsCommands, FsExtJson};
        ///
        /// let mut fs = FileSystem::new();
        /// fs.write_file("/config.json", r#"{"depth": 3}"#, false).unwrap();
        /// let value: serde_json::Value = fs.read_json("/config.json").unwrap();
        /// assert_eq!(value["depth"], 3);
        /// # }
        /// ```
        fn read_json<T: DeserializeOwned>(&self, path: &str) -> FsResult<T> {
            let data = self.read_file(path)?;
            serde_json::from_str(&data).map_err(|e| FsError::Deserialization(e.to_string()))
        }

        /// Serialize a value and write it as JSON, replacing the file's content.
        ///
        /// Uses pretty-printing with 2-space indentation.
        ///
        /// # Errors
        ///
        /// - `FsError::Serialization`: JSON serialization failed
        /// - Other `FsError` variants from the underlying `write_file()` call
        fn write_json<T: Serialize>(&mut self, path: &str, value: &T) -> FsResult<()> {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| FsError::Serialization(e.to_string()))?;
            self.write_file(path, &json, false)
        }
    }

    impl<F: FsCommands + ?Sized> FsExtJson for F {}
}

#[cfg(feature = "serde")]
pub use json::FsExtJson;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileSystem, LinkKind};

    fn populated() -> FileSystem {
        let mut fs = FileSystem::new();
        fs.mkdir("/dir", false).unwrap();
        fs.write_file("/dir/test.txt", "0123456789", false).unwrap();
        fs
    }

    #[test]
    fn exists_reports_missing_as_false() {
        let fs = populated();
        assert!(fs.exists("/dir").unwrap());
        assert!(fs.exists("/dir/test.txt").unwrap());
        assert!(!fs.exists("/missing").unwrap());
    }

    #[test]
    fn is_file_and_is_folder() {
        let fs = populated();
        assert!(fs.is_file("/dir/test.txt").unwrap());
        assert!(!fs.is_folder("/dir/test.txt").unwrap());
        assert!(fs.is_folder("/dir").unwrap());
        assert!(!fs.is_file("/dir").unwrap());
        assert!(!fs.is_file("/missing").unwrap());
        assert!(!fs.is_folder("/missing").unwrap());
    }

    #[test]
    fn structural_errors_still_propagate() {
        let fs = populated();
        assert!(matches!(
            fs.is_file("/dir/*"),
            Err(FsError::InvalidPath { .. })
        ));
        assert!(matches!(
            fs.exists("/dir/test.txt/x"),
            Err(FsError::NotAFolder { .. })
        ));
    }

    #[test]
    fn dangling_link_is_an_error_not_absence() {
        let mut fs = populated();
        fs.ln("/dir/test.txt", "/", None, LinkKind::Soft).unwrap();
        fs.rm("/dir/test.txt").unwrap();
        assert!(matches!(
            fs.exists("/test.txt"),
            Err(FsError::LinkDangling { .. })
        ));
    }

    #[test]
    fn file_size_returns_size() {
        let fs = populated();
        assert_eq!(fs.file_size("/dir/test.txt").unwrap(), 10);
        assert_eq!(fs.file_size("/dir").unwrap(), 10);
        assert!(matches!(
            fs.file_size("/missing"),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn fs_ext_available_on_dyn_commands() {
        let fs = populated();
        let commands: &dyn FsCommands = &fs;
        assert!(commands.is_file("/dir/test.txt").unwrap());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip() {
        use crate::TreeConfig;

        let mut fs = FileSystem::new();
        let config = TreeConfig::default().with_max_link_depth(7);
        fs.write_json("/config.json", &config).unwrap();
        let loaded: TreeConfig = fs.read_json("/config.json").unwrap();
        assert_eq!(loaded, config);

        fs.write_file("/bad.json", "{", false).unwrap();
        assert!(matches!(
            fs.read_json::<TreeConfig>("/bad.json"),
            Err(FsError::Deserialization(_))
        ));
    }
}
