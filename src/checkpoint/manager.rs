use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ai::QApproximator;
use crate::checkpoint::metadata::CheckpointMetadata;
use crate::error::CheckpointError;

/// Configuration for the checkpoint manager.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CheckpointManagerConfig {
    pub checkpoint_dir: PathBuf,
    pub keep_last_n: usize,
    pub keep_best_n: usize,
    /// Save every this many episodes.
    pub interval: usize,
}

impl Default for CheckpointManagerConfig {
    fn default() -> Self {
        CheckpointManagerConfig {
            checkpoint_dir: PathBuf::from("checkpoints"),
            keep_last_n: 5,
            keep_best_n: 3,
            interval: 10,
        }
    }
}

/// A checkpoint found on disk.
#[derive(Debug)]
pub struct CheckpointData {
    pub path: PathBuf,
    pub metadata: CheckpointMetadata,
}

/// Manages saving, loading, listing, and pruning checkpoints.
pub struct CheckpointManager {
    config: CheckpointManagerConfig,
}

impl CheckpointManager {
    /// The checkpoint directory is created by the first save.
    pub fn new(config: CheckpointManagerConfig) -> Self {
        CheckpointManager { config }
    }

    pub fn config(&self) -> &CheckpointManagerConfig {
        &self.config
    }

    /// Save weights and metadata under `checkpoint_{episode}`.
    pub fn save_checkpoint(
        &self,
        approximator: &dyn QApproximator,
        metadata: &CheckpointMetadata,
    ) -> Result<PathBuf, CheckpointError> {
        let dir_name = format!("checkpoint_{:07}", metadata.episode);
        let tmp_dir = self.config.checkpoint_dir.join(format!("{}.tmp", dir_name));
        let final_dir = self.config.checkpoint_dir.join(&dir_name);

        fs::create_dir_all(&tmp_dir)?;

        approximator
            .save(&tmp_dir)
            .map_err(CheckpointError::ModelSave)?;

        let meta_json = serde_json::to_string_pretty(metadata)?;
        fs::write(tmp_dir.join("metadata.json"), meta_json)?;

        // Atomic rename
        if final_dir.exists() {
            fs::remove_dir_all(&final_dir)?;
        }
        fs::rename(&tmp_dir, &final_dir)?;

        self.update_latest_symlink(&dir_name)?;
        self.prune_old_checkpoints()?;

        Ok(final_dir)
    }

    pub fn load_checkpoint(&self, dir: &Path) -> Result<CheckpointData, CheckpointError> {
        let meta_path = dir.join("metadata.json");
        let metadata = read_metadata(&meta_path)?;
        Ok(CheckpointData {
            path: dir.to_path_buf(),
            metadata,
        })
    }

    /// Load the checkpoint the `latest` symlink points to.
    pub fn load_latest(&self) -> Result<CheckpointData, CheckpointError> {
        let latest_link = self.config.checkpoint_dir.join("latest");
        if !latest_link.exists() {
            return Err(CheckpointError::NoLatestSymlink(
                self.config.checkpoint_dir.clone(),
            ));
        }
        let resolved = fs::read_link(&latest_link)?;
        let target = if resolved.is_relative() {
            self.config.checkpoint_dir.join(resolved)
        } else {
            resolved
        };
        self.load_checkpoint(&target)
    }

    /// Load the latest weights into `approximator`.
    ///
    /// Returns the checkpoint that was restored, or `None` when nothing could
    /// be loaded and `allow_fresh` let us keep the untrained weights.
    pub fn restore_approximator(
        &self,
        approximator: &mut dyn QApproximator,
        allow_fresh: bool,
    ) -> Result<Option<CheckpointData>, CheckpointError> {
        let loaded = self.load_latest().and_then(|data| {
            approximator
                .load(&data.path)
                .map_err(CheckpointError::ModelLoad)?;
            Ok(data)
        });
        match loaded {
            Ok(data) => {
                tracing::info!(
                    path = %data.path.display(),
                    episode = data.metadata.episode,
                    "restored approximator"
                );
                Ok(Some(data))
            }
            Err(e) if allow_fresh => {
                tracing::warn!(error = %e, "no usable checkpoint, starting from an untrained approximator");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// List all checkpoints sorted by episode (ascending).
    pub fn list_checkpoints(
        &self,
    ) -> Result<Vec<(PathBuf, CheckpointMetadata)>, CheckpointError> {
        let mut results = Vec::new();
        if !self.config.checkpoint_dir.exists() {
            return Ok(results);
        }
        for entry in fs::read_dir(&self.config.checkpoint_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if !name_str.starts_with("checkpoint_") || name_str.ends_with(".tmp") {
                continue;
            }
            let meta_path = path.join("metadata.json");
            if meta_path.exists() {
                let metadata = read_metadata(&meta_path)?;
                results.push((path, metadata));
            }
        }
        results.sort_by_key(|(_, m)| m.episode);
        Ok(results)
    }

    /// Prune old checkpoints, keeping the union of the last N and the best N
    /// by average reward.
    fn prune_old_checkpoints(&self) -> Result<(), CheckpointError> {
        let checkpoints = self.list_checkpoints()?;
        if checkpoints.len() <= self.config.keep_last_n {
            return Ok(());
        }

        let total = checkpoints.len();
        let mut keep: std::collections::HashSet<usize> = (total
            .saturating_sub(self.config.keep_last_n)..total)
            .collect();

        let mut by_reward: Vec<(usize, f32)> = checkpoints
            .iter()
            .enumerate()
            .map(|(i, (_, m))| (i, m.metrics.average_reward))
            .collect();
        by_reward.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        for (i, _) in by_reward.iter().take(self.config.keep_best_n) {
            keep.insert(*i);
        }

        for (i, (path, _)) in checkpoints.iter().enumerate() {
            if !keep.contains(&i) {
                fs::remove_dir_all(path)?;
            }
        }

        Ok(())
    }

    /// Point the `latest` symlink at the given checkpoint directory name.
    fn update_latest_symlink(&self, dir_name: &str) -> Result<(), CheckpointError> {
        let link_path = self.config.checkpoint_dir.join("latest");
        if link_path.exists() || link_path.symlink_metadata().is_ok() {
            fs::remove_file(&link_path)?;
        }
        std::os::unix::fs::symlink(dir_name, &link_path)?;
        Ok(())
    }
}

fn read_metadata(meta_path: &Path) -> Result<CheckpointMetadata, CheckpointError> {
    let meta_json = fs::read_to_string(meta_path).map_err(|e| CheckpointError::MetadataRead {
        path: meta_path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&meta_json).map_err(|e| CheckpointError::MetadataParse {
        path: meta_path.to_path_buf(),
        source: e,
    })
}

/// Seconds since the Unix epoch, for checkpoint timestamps.
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{BurnQApproximator, NetworkConfig};
    use crate::checkpoint::metadata::{CheckpointHyperparameters, CheckpointMetrics};

    fn metadata(episode: usize, average_reward: f32) -> CheckpointMetadata {
        CheckpointMetadata {
            episode,
            timestamp: 1700000000,
            metrics: CheckpointMetrics {
                average_reward,
                last_reward: -0.4,
                average_game_length: 37.5,
                invalid_move_rate: 0.02,
                fit_steps: 1200,
            },
            hyperparameters: CheckpointHyperparameters {
                learning_rate: 0.1,
                discount_factor: 0.9,
                epsilon: 0.1,
                board_width: 5,
                board_height: 5,
                hidden_size: 8,
                network_learning_rate: 1e-3,
            },
        }
    }

    fn manager(dir: &Path, keep_last_n: usize, keep_best_n: usize) -> CheckpointManager {
        CheckpointManager::new(CheckpointManagerConfig {
            checkpoint_dir: dir.to_path_buf(),
            keep_last_n,
            keep_best_n,
            interval: 1,
        })
    }

    fn approximator() -> BurnQApproximator {
        BurnQApproximator::new(
            50,
            &NetworkConfig {
                hidden_size: 8,
                learning_rate: 1e-3,
            },
        )
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 3);
        let approx = approximator();

        let path = manager.save_checkpoint(&approx, &metadata(10, 1.5)).unwrap();
        assert!(path.exists());
        assert!(path.join("metadata.json").exists());
        assert!(path.join("q_network.mpk").exists());

        let data = manager.load_checkpoint(&path).unwrap();
        assert_eq!(data.metadata.episode, 10);
        assert!((data.metadata.metrics.average_reward - 1.5).abs() < 1e-6);

        let mut restored = approximator();
        restored.load(&data.path).unwrap();
    }

    #[test]
    fn test_directory_created_on_first_save() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint_dir = dir.path().join("runs").join("checkpoints");
        let manager = manager(&checkpoint_dir, 5, 3);
        assert!(!checkpoint_dir.exists());
        assert!(manager.list_checkpoints().unwrap().is_empty());

        manager.save_checkpoint(&approximator(), &metadata(10, 0.0)).unwrap();
        assert!(checkpoint_dir.join("checkpoint_0000010").exists());
        assert_eq!(manager.list_checkpoints().unwrap().len(), 1);
    }

    #[test]
    fn test_latest_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 3);
        let approx = approximator();

        manager.save_checkpoint(&approx, &metadata(10, 0.0)).unwrap();
        manager.save_checkpoint(&approx, &metadata(20, 0.0)).unwrap();

        let latest = manager.load_latest().unwrap();
        assert_eq!(latest.metadata.episode, 20);
    }

    #[test]
    fn test_pruning_keeps_last_and_best() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 2, 1);
        let approx = approximator();

        let rewards = [0.5, 0.9, 0.3, 0.6, 0.7];
        for (i, &r) in rewards.iter().enumerate() {
            manager.save_checkpoint(&approx, &metadata((i + 1) * 10, r)).unwrap();
        }

        let episodes: Vec<usize> = manager
            .list_checkpoints()
            .unwrap()
            .iter()
            .map(|(_, m)| m.episode)
            .collect();
        assert_eq!(episodes, vec![20, 40, 50]);
    }

    #[test]
    fn test_load_latest_no_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 3);
        let err = manager.load_latest().unwrap_err();
        assert!(
            matches!(err, CheckpointError::NoLatestSymlink(_)),
            "expected NoLatestSymlink, got: {err}"
        );
    }

    #[test]
    fn test_restore_without_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 3);
        let mut approx = approximator();

        assert!(manager.restore_approximator(&mut approx, false).is_err());
        assert!(manager.restore_approximator(&mut approx, true).unwrap().is_none());
    }

    #[test]
    fn test_restore_latest() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 3);
        manager.save_checkpoint(&approximator(), &metadata(30, 0.0)).unwrap();

        let mut approx = approximator();
        let data = manager.restore_approximator(&mut approx, false).unwrap().unwrap();
        assert_eq!(data.metadata.episode, 30);
    }

    #[test]
    fn test_restore_with_missing_weights_fails_unless_fresh_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 3);
        let path = manager.save_checkpoint(&approximator(), &metadata(30, 0.0)).unwrap();
        fs::remove_file(path.join("q_network.mpk")).unwrap();

        let mut approx = approximator();
        let err = manager.restore_approximator(&mut approx, false).unwrap_err();
        assert!(matches!(err, CheckpointError::ModelLoad(_)));
        assert!(manager.restore_approximator(&mut approx, true).unwrap().is_none());
    }

    #[test]
    fn test_metadata_serde() {
        let json = serde_json::to_string_pretty(&metadata(5000, 2.25)).unwrap();
        let deserialized: CheckpointMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.episode, 5000);
        assert_eq!(deserialized.hyperparameters.board_width, 5);
        assert!((deserialized.metrics.average_reward - 2.25).abs() < 1e-6);
    }
}
