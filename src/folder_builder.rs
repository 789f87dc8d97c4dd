//! Folder creation (`mkdir` and `mkdir -p`).
//!
//! New folders are built detached and attached to their parent only after
//! everything beneath them was created, so a failure leaves the visible tree
//! unchanged.

use tracing::debug;

use crate::names::validate_name;
use crate::types::PATH_SEPARATOR;
use crate::{FsError, FsResult, NodeId, Tree};

impl Tree {
    /// Create the folder named by `path`.
    ///
    /// With `make_parents`, missing intermediate folders are created too;
    /// otherwise every component but the last must already exist. Returns the
    /// new folder.
    ///
    /// # Errors
    ///
    /// - [`FsError::NameConflict`] if the final folder already exists
    /// - [`FsError::NotFound`] if a parent is missing and `make_parents` is off
    /// - [`FsError::NotAFolder`] if the path runs through a file
    /// - [`FsError::InvalidPath`] if the path contains `..`
    /// - [`FsError::InvalidName`] for reserved component names
    pub fn build_folder(
        &mut self,
        path: &str,
        make_parents: bool,
        working: NodeId,
        root: NodeId,
    ) -> FsResult<NodeId> {
        let start = if path.starts_with(PATH_SEPARATOR) {
            root
        } else {
            working
        };
        let tokens: Vec<&str> = path
            .split(PATH_SEPARATOR)
            .filter(|token| !token.is_empty() && *token != ".")
            .collect();
        if tokens.contains(&"..") {
            return Err(FsError::InvalidPath {
                path: path.to_string(),
                reason: "'..' is not allowed when creating folders".into(),
            });
        }
        if tokens.is_empty() {
            return Err(FsError::NameConflict {
                name: path.to_string(),
                folder: self.path(start)?,
                operation: "mkdir",
            });
        }

        let folder = self.build_in(start, &tokens, make_parents)?;
        debug!(path, make_parents, "created folder");
        Ok(folder)
    }

    fn build_in(&mut self, current: NodeId, tokens: &[&str], make_parents: bool) -> FsResult<NodeId> {
        let folder = self.folder_target(current, 0)?;
        let Some((&name, rest)) = tokens.split_first() else {
            return Ok(folder);
        };

        if let Some(existing) = self.find_in(folder, name)? {
            if rest.is_empty() {
                return Err(FsError::NameConflict {
                    name: name.to_string(),
                    folder: self.path(folder)?,
                    operation: "mkdir",
                });
            }
            return self.build_in(existing, rest, make_parents);
        }

        if !rest.is_empty() && !make_parents {
            return Err(FsError::NotFound {
                path: format!("{}{}", self.path(folder)?, name),
            });
        }
        validate_name(name)?;

        let staged = self.create_folder(name);
        let result = self
            .build_in(staged, rest, make_parents)
            .and_then(|leaf| self.add_content(folder, staged).map(|()| leaf));
        if result.is_err() {
            self.discard(staged);
        }
        result
    }
}
