//! Input fixtures.

use crate::images::ImageSet;
use std::path::PathBuf;

/// An image set of `count` numbered images under `root`.
///
/// The files are not created; stages never read them in tests.
#[must_use]
pub fn fake_images(root: impl Into<PathBuf>, count: usize) -> ImageSet {
    let root = root.into();
    let images = (1..=count)
        .map(|i| root.join(format!("{i:04}.jpg")))
        .collect();
    ImageSet::new(root, images)
}

/// An empty image set under `root`.
#[must_use]
pub fn no_images(root: impl Into<PathBuf>) -> ImageSet {
    ImageSet::new(root, Vec::new())
}
