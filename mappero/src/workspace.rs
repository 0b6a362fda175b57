//! Workspace layout and directory lifecycle.
//!
//! Every path a stage reads or writes is derived from the workspace root, so
//! the same root always yields the same layout:
//!
//! ```text
//! <root>/
//!   database.db
//!   images/                  default image directory
//!   images_paths.txt         image manifest
//!   config.json              resolved configuration snapshot
//!   sparse/                  SfM output
//!   dense/
//!     fused.ply
//!     meshed-poisson.ply
//!     meshed-delaunay.ply
//!   glomap/                  GLOMAP SfM output
//!     images_paths.txt
//! ```
//!
//! Directories are created on demand and never removed here.

use crate::errors::WorkspaceError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A reconstruction workspace rooted at one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Creates a workspace without touching the filesystem.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Opens an existing workspace.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::MissingRoot`] if the root is not an existing
    /// directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(WorkspaceError::MissingRoot { path: root });
        }
        Ok(Self { root })
    }

    /// Returns the workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The feature/match database shared by the SfM stages.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.root.join("database.db")
    }

    /// Default image directory when none is given explicitly.
    #[must_use]
    pub fn default_image_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    /// Manifest listing discovered images relative to the image directory.
    #[must_use]
    pub fn image_manifest_path(&self) -> PathBuf {
        self.root.join("images_paths.txt")
    }

    /// Snapshot of the resolved configuration.
    #[must_use]
    pub fn config_snapshot_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Sparse model output directory.
    #[must_use]
    pub fn sparse_dir(&self) -> PathBuf {
        self.root.join("sparse")
    }

    /// Dense workspace directory.
    #[must_use]
    pub fn dense_dir(&self) -> PathBuf {
        self.root.join("dense")
    }

    /// Fused dense point cloud.
    #[must_use]
    pub fn fused_cloud_path(&self) -> PathBuf {
        self.dense_dir().join("fused.ply")
    }

    /// Poisson mesh output.
    #[must_use]
    pub fn poisson_mesh_path(&self) -> PathBuf {
        self.dense_dir().join("meshed-poisson.ply")
    }

    /// Delaunay mesh output.
    #[must_use]
    pub fn delaunay_mesh_path(&self) -> PathBuf {
        self.dense_dir().join("meshed-delaunay.ply")
    }

    /// GLOMAP model output directory.
    #[must_use]
    pub fn glomap_dir(&self) -> PathBuf {
        self.root.join("glomap")
    }

    /// Image manifest written by GLOMAP runs.
    #[must_use]
    pub fn glomap_manifest_path(&self) -> PathBuf {
        self.glomap_dir().join("images_paths.txt")
    }

    /// Ensures a directory exists.
    ///
    /// # Errors
    ///
    /// See [`ensure_dir`].
    pub fn ensure(&self, dir: &Path) -> Result<(), WorkspaceError> {
        ensure_dir(dir)
    }
}

/// Creates a directory and its parents if absent.
///
/// Succeeds without changes when the directory already exists.
///
/// # Errors
///
/// Returns [`WorkspaceError::NotADirectory`] if the path exists as a
/// non-directory (including a dangling symlink), or
/// [`WorkspaceError::CreateDir`] if creation fails.
pub fn ensure_dir(dir: &Path) -> Result<(), WorkspaceError> {
    if dir.is_dir() {
        return Ok(());
    }
    // `exists` follows symlinks, so a dangling link would reach create_dir_all.
    if dir.symlink_metadata().is_ok() {
        return Err(WorkspaceError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    std::fs::create_dir_all(dir).map_err(|source| WorkspaceError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    debug!(path = %dir.display(), "Created directory");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_paths() {
        let ws = Workspace::new("/data/gerrard-hall");

        assert_eq!(ws.database_path(), Path::new("/data/gerrard-hall/database.db"));
        assert_eq!(ws.sparse_dir(), Path::new("/data/gerrard-hall/sparse"));
        assert_eq!(ws.dense_dir(), Path::new("/data/gerrard-hall/dense"));
        assert_eq!(ws.fused_cloud_path(), Path::new("/data/gerrard-hall/dense/fused.ply"));
        assert_eq!(
            ws.poisson_mesh_path(),
            Path::new("/data/gerrard-hall/dense/meshed-poisson.ply")
        );
        assert_eq!(
            ws.delaunay_mesh_path(),
            Path::new("/data/gerrard-hall/dense/meshed-delaunay.ply")
        );
        assert_eq!(ws.default_image_dir(), Path::new("/data/gerrard-hall/images"));
        assert_eq!(ws.image_manifest_path(), Path::new("/data/gerrard-hall/images_paths.txt"));
        assert_eq!(ws.config_snapshot_path(), Path::new("/data/gerrard-hall/config.json"));
        assert_eq!(
            ws.glomap_manifest_path(),
            Path::new("/data/gerrard-hall/glomap/images_paths.txt")
        );
    }

    #[test]
    fn test_derived_paths_are_stable() {
        let a = Workspace::new("/ws");
        let b = Workspace::new("/ws");

        assert_eq!(a.database_path(), a.database_path());
        assert_eq!(a.fused_cloud_path(), b.fused_cloud_path());
        assert_eq!(a, b);
    }

    #[test]
    fn test_open_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Workspace::open(dir.path()).is_ok());

        let missing = dir.path().join("missing");
        assert!(matches!(
            Workspace::open(&missing),
            Err(WorkspaceError::MissingRoot { .. })
        ));
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        let sparse = ws.sparse_dir();

        ws.ensure(&sparse).unwrap();
        ws.ensure(&sparse).unwrap();

        assert!(sparse.is_dir());
    }

    #[test]
    fn test_ensure_dir_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("dense").join("stereo").join("depth_maps");

        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_ensure_dir_keeps_existing_contents() {
        let dir = tempfile::tempdir().unwrap();
        let sparse = dir.path().join("sparse");
        std::fs::create_dir(&sparse).unwrap();
        std::fs::write(sparse.join("cameras.bin"), b"model").unwrap();

        ensure_dir(&sparse).unwrap();
        assert_eq!(std::fs::read(sparse.join("cameras.bin")).unwrap(), b"model");
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sparse");
        std::fs::write(&file, b"not a directory").unwrap();

        let err = ensure_dir(&file).unwrap_err();
        assert!(matches!(err, WorkspaceError::NotADirectory { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_ensure_dir_rejects_dangling_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let sparse = dir.path().join("sparse");
        std::os::unix::fs::symlink(dir.path().join("gone"), &sparse).unwrap();

        let err = ensure_dir(&sparse).unwrap_err();
        assert!(matches!(err, WorkspaceError::NotADirectory { .. }));
        assert!(!dir.path().join("gone").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_ensure_dir_accepts_symlink_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("models");
        std::fs::create_dir(&target).unwrap();
        let sparse = dir.path().join("sparse");
        std::os::unix::fs::symlink(&target, &sparse).unwrap();

        ensure_dir(&sparse).unwrap();
    }
}
