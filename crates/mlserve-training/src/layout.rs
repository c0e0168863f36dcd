use crate::error::{TrainingError, TrainingResult};
use std::path::{Path, PathBuf};

/// File extension of serialized classifier artifacts.
pub const ARTIFACT_EXTENSION: &str = "json";

/// Filesystem layout for classifier artifacts.
///
/// Every artifact lives directly under the root as `<model_id>.json`, so the
/// path is a pure function of the id.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the artifact for `model_id`.
    ///
    /// Ids that could escape the root directory are rejected.
    pub fn artifact_path(&self, model_id: &str) -> TrainingResult<PathBuf> {
        let id_is_safe = !model_id.is_empty()
            && model_id != "."
            && !model_id.contains("..")
            && !model_id.contains(['/', '\\', '\0']);
        if !id_is_safe {
            return Err(TrainingError::InvalidArtifactId(model_id.to_string()));
        }
        Ok(self.root.join(format!("{model_id}.{ARTIFACT_EXTENSION}")))
    }

    pub fn ensure_root(&self) -> TrainingResult<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let temp = TempDir::new().unwrap();
        let layout = ArtifactLayout::new(temp.path().join("saved_models"));

        let path = layout.artifact_path("model-1").unwrap();
        assert_eq!(path, temp.path().join("saved_models").join("model-1.json"));
        assert_eq!(layout.artifact_path("model-1").unwrap(), path);
    }

    #[test]
    fn test_layout_rejects_escaping_ids() {
        let layout = ArtifactLayout::new("saved_models");
        for id in ["", ".", "..", "../etc/passwd", "a/b", "a\\b"] {
            assert!(layout.artifact_path(id).is_err(), "{id:?} should be rejected");
        }
    }

    #[test]
    fn test_ensure_root_creates_directory() {
        let temp = TempDir::new().unwrap();
        let layout = ArtifactLayout::new(temp.path().join("a").join("b"));
        layout.ensure_root().unwrap();
        assert!(layout.root().is_dir());
    }
}
