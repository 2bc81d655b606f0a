//! Input/output directory layout.

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::error::Result;

use super::images::{ImageFormat, save_image};

// ============================================================================
// Constants
// ============================================================================

/// Input subdirectory name under a workspace root.
const INPUT_DIR: &str = "input";

/// Output subdirectory name under a workspace root.
const OUTPUT_DIR: &str = "output";

// ============================================================================
// PathProvider
// ============================================================================

/// Supplies the directories a deployment reads from and writes to.
pub trait PathProvider: Send + Sync {
    /// Directory holding input files.
    fn input_dir(&self) -> &Path;

    /// Directory receiving output files.
    fn output_dir(&self) -> &Path;

    /// Path of a file inside the input directory.
    fn input_file(&self, name: &str) -> PathBuf {
        self.input_dir().join(name)
    }

    /// Path of a file inside the output directory.
    fn output_file(&self, name: &str) -> PathBuf {
        self.output_dir().join(name)
    }

    /// Creates both directories if missing. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if a directory cannot be
    /// created.
    fn ensure_directories(&self) -> Result<()> {
        for dir in [self.input_dir(), self.output_dir()] {
            fs::create_dir_all(dir)?;
        }
        debug!(
            input = %self.input_dir().display(),
            output = %self.output_dir().display(),
            "Workspace directories ready"
        );
        Ok(())
    }

    /// Saves an image into the output directory under a fresh unique name.
    ///
    /// Returns the path written.
    ///
    /// # Errors
    ///
    /// Any error from [`ensure_directories`](Self::ensure_directories) or
    /// [`save_image`].
    fn save_output_image(&self, bytes: &[u8], format: ImageFormat) -> Result<PathBuf> {
        self.ensure_directories()?;
        let path = self.output_file(&format!("{}.{}", Uuid::new_v4(), format.extension()));
        save_image(&path, bytes, format)?;
        Ok(path)
    }
}

// ============================================================================
// Workspace
// ============================================================================

/// Default [`PathProvider`] with explicit input and output directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    input: PathBuf,
    output: PathBuf,
}

impl Workspace {
    /// Lays out `input/` and `output/` under `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            input: root.join(INPUT_DIR),
            output: root.join(OUTPUT_DIR),
        }
    }

    /// Uses two unrelated directories.
    #[must_use]
    pub fn with_dirs(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

impl PathProvider for Workspace {
    fn input_dir(&self) -> &Path {
        &self.input
    }

    fn output_dir(&self) -> &Path {
        &self.output
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_root() {
        let workspace = Workspace::new("/srv/vision");
        assert_eq!(workspace.input_dir(), Path::new("/srv/vision/input"));
        assert_eq!(workspace.output_dir(), Path::new("/srv/vision/output"));
        assert_eq!(
            workspace.output_file("result.png"),
            PathBuf::from("/srv/vision/output/result.png")
        );
    }

    #[test]
    fn test_with_dirs() {
        let workspace = Workspace::with_dirs("/a", "/b");
        assert_eq!(workspace.input_file("x.jpg"), PathBuf::from("/a/x.jpg"));
        assert_eq!(workspace.output_dir(), Path::new("/b"));
    }

    #[test]
    fn test_ensure_directories_is_idempotent() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let workspace = Workspace::new(temp.path().join("nested"));

        workspace.ensure_directories().expect("first call");
        workspace.ensure_directories().expect("second call");

        assert!(workspace.input_dir().is_dir());
        assert!(workspace.output_dir().is_dir());
    }

    #[test]
    fn test_save_output_image_uses_unique_names() {
        use std::io::Cursor;

        use image::{DynamicImage, RgbImage};

        let mut png = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(2, 2))
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .expect("encode sample");

        let temp = tempfile::tempdir().expect("create temp dir");
        let workspace = Workspace::new(temp.path());

        let first = workspace
            .save_output_image(&png, ImageFormat::Png)
            .expect("first save");
        let second = workspace
            .save_output_image(&png, ImageFormat::jpeg(90))
            .expect("second save");

        assert_ne!(first, second);
        assert!(first.starts_with(workspace.output_dir()));
        assert_eq!(first.extension().and_then(|e| e.to_str()), Some("png"));
        assert_eq!(second.extension().and_then(|e| e.to_str()), Some("jpg"));
    }
}
