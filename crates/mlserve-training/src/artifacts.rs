use crate::classifier::Classifier;
use crate::error::{TrainingError, TrainingResult};
use crate::layout::ArtifactLayout;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Durable blob store mapping a model id to its serialized classifier.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    layout: ArtifactLayout,
}

impl ArtifactStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { layout: ArtifactLayout::new(root) }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn path_for(&self, model_id: &str) -> TrainingResult<PathBuf> {
        self.layout.artifact_path(model_id)
    }

    /// Serializes `classifier` and moves it into place.
    ///
    /// The bytes go to a temporary file in the same directory first and are
    /// renamed over the final path, so readers see either the old or the new
    /// artifact in full.
    pub fn save(&self, model_id: &str, classifier: &Classifier) -> TrainingResult<PathBuf> {
        let path = self.layout.artifact_path(model_id)?;
        self.layout.ensure_root()?;

        let bytes = serde_json::to_vec(classifier)?;
        let mut tmp = NamedTempFile::new_in(self.layout.root())?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| TrainingError::Io(e.error))?;

        debug!(model_id, path = %path.display(), bytes = bytes.len(), "Artifact saved");
        Ok(path)
    }

    /// Loads the classifier for `model_id`.
    ///
    /// Any failure to read or decode is reported as `ArtifactMissing`: callers
    /// only load ids the registry says exist.
    pub fn load(&self, model_id: &str) -> TrainingResult<Classifier> {
        let path = self.layout.artifact_path(model_id)?;
        let bytes = std::fs::read(&path).map_err(|e| TrainingError::ArtifactMissing {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| TrainingError::ArtifactMissing {
            path,
            reason: format!("undecodable artifact: {e}"),
        })
    }

    /// Removes the artifact for `model_id`.
    ///
    /// Returns `false` when there was nothing to remove.
    pub fn delete(&self, model_id: &str) -> TrainingResult<bool> {
        let path = self.layout.artifact_path(model_id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(model_id, path = %path.display(), "Artifact deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(model_id, path = %path.display(), "Artifact already absent on delete");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[must_use]
    pub fn exists(&self, model_id: &str) -> bool {
        self.layout.artifact_path(model_id).is_ok_and(|p| p.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hyperparams::{Hyperparameters, RandomForestParams};
    use tempfile::TempDir;

    fn fitted_classifier() -> Classifier {
        let mut clf = Classifier::new(Hyperparameters::RandomForest(RandomForestParams {
            n_estimators: 3,
            max_depth: Some(2),
            random_state: 1,
        }));
        clf.fit(&[vec![0.0], vec![0.1], vec![1.0], vec![1.1]], &[0, 0, 1, 1]).unwrap();
        clf
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path().join("saved_models"));

        let path = store.save("m1", &fitted_classifier()).unwrap();
        assert!(path.is_file());
        assert!(store.exists("m1"));

        let loaded = store.load("m1").unwrap();
        assert_eq!(loaded.n_features(), Some(1));
    }

    #[test]
    fn test_save_overwrites_and_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path());

        store.save("m1", &fitted_classifier()).unwrap();
        store.save("m1", &fitted_classifier()).unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_load_missing_is_artifact_missing() {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path());
        assert!(matches!(store.load("nope"), Err(TrainingError::ArtifactMissing { .. })));
    }

    #[test]
    fn test_load_corrupt_is_artifact_missing() {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path());
        std::fs::write(store.path_for("bad").unwrap(), b"not json").unwrap();
        let err = store.load("bad").unwrap_err();
        assert!(matches!(err, TrainingError::ArtifactMissing { reason, .. } if reason.contains("undecodable")));
    }

    #[test]
    fn test_delete_tolerates_missing_artifact() {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path());

        store.save("m1", &fitted_classifier()).unwrap();
        assert!(store.delete("m1").unwrap());
        assert!(!store.exists("m1"));
        assert!(!store.delete("m1").unwrap());
    }
}
