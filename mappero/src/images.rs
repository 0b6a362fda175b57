//! Input image discovery.

use crate::errors::MapperoError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Images found under an image root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSet {
    root: PathBuf,
    images: Vec<PathBuf>,
}

impl ImageSet {
    /// Creates an image set from already-known paths.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, images: Vec<PathBuf>) -> Self {
        Self {
            root: root.into(),
            images,
        }
    }

    /// Returns the image root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the image paths.
    #[must_use]
    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    /// Returns the number of images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Returns true if no images were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Returns the image paths relative to the root.
    pub fn relative_paths(&self) -> impl Iterator<Item = &Path> {
        self.images
            .iter()
            .map(|p| p.strip_prefix(&self.root).unwrap_or(p))
    }

    /// Writes the manifest, one root-relative path per line, replacing any
    /// previous manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_manifest(&self, manifest: &Path) -> Result<(), MapperoError> {
        let mut file = fs::File::create(manifest)?;
        for path in self.relative_paths() {
            writeln!(file, "{}", path.display())?;
        }
        Ok(())
    }
}

/// Returns true if the path has a jpg, jpeg or png extension, in any case.
#[must_use]
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Recursively finds images under `root`, sorted by path.
///
/// A missing root yields an empty set.
///
/// # Errors
///
/// Returns an error if the directory tree cannot be read.
pub fn discover_images(root: &Path) -> Result<ImageSet, MapperoError> {
    if !root.is_dir() {
        warn!(path = %root.display(), "Image directory does not exist");
        return Ok(ImageSet::new(root, Vec::new()));
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && is_image_file(entry.path()) {
            images.push(entry.into_path());
        }
    }
    images.sort();

    Ok(ImageSet::new(root, images))
}

/// Finds images and records them in a manifest file.
///
/// # Errors
///
/// Returns an error if discovery or the manifest write fails.
pub fn discover_and_record(root: &Path, manifest: &Path) -> Result<ImageSet, MapperoError> {
    let images = discover_images(root)?;
    images.write_manifest(manifest)?;
    info!(
        count = images.len(),
        root = %root.display(),
        manifest = %manifest.display(),
        "Discovered images"
    );
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a.jpg")));
        assert!(is_image_file(Path::new("a.JPEG")));
        assert!(is_image_file(Path::new("a.Png")));
        assert!(!is_image_file(Path::new("a.tiff")));
        assert!(!is_image_file(Path::new("jpg")));
    }

    #[test]
    fn test_discover_recursive_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b.JPG"));
        touch(&root.join("a.png"));
        touch(&root.join("cam1/c.jpeg"));
        touch(&root.join("notes.txt"));
        touch(&root.join("cam1/mask.bmp"));

        let images = discover_images(root).unwrap();
        let relative: Vec<_> = images.relative_paths().map(Path::to_path_buf).collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("a.png"),
                PathBuf::from("b.JPG"),
                PathBuf::from("cam1/c.jpeg"),
            ]
        );
    }

    #[test]
    fn test_missing_root_is_empty() {
        let images = discover_images(Path::new("/nonexistent/images")).unwrap();
        assert!(images.is_empty());
    }

    #[test]
    fn test_manifest_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("images");
        touch(&root.join("0001.jpg"));
        touch(&root.join("0002.jpg"));
        let manifest = dir.path().join("images_paths.txt");
        fs::write(&manifest, "stale.jpg\nstale2.jpg\nstale3.jpg\n").unwrap();

        let images = discover_and_record(&root, &manifest).unwrap();

        assert_eq!(images.len(), 2);
        assert_eq!(fs::read_to_string(&manifest).unwrap(), "0001.jpg\n0002.jpg\n");
    }

    #[test]
    fn test_empty_directory_writes_empty_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("images_paths.txt");

        let images = discover_and_record(dir.path(), &manifest).unwrap();

        assert!(images.is_empty());
        assert_eq!(fs::read_to_string(&manifest).unwrap(), "");
    }
}
