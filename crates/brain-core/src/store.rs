//! Model persistence and the live snapshot handle shared by readers

use brain_common::{BrainError, DesignModel, Result, MODEL_VERSION};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Write `model` as a JSON document. The document is staged in a sibling
/// `.tmp` file and renamed over `path`, so readers never see a partial write.
pub async fn save_model(path: &Path, model: &DesignModel, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_vec_pretty(model)?
    } else {
        serde_json::to_vec(model)?
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let staged = staging_path(path);
    tokio::fs::write(&staged, json).await?;
    if let Err(err) = tokio::fs::rename(&staged, path).await {
        let _ = tokio::fs::remove_file(&staged).await;
        return Err(err.into());
    }
    info!("Saved design model to {:?}", path);
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut staged = path.as_os_str().to_owned();
    staged.push(".tmp");
    PathBuf::from(staged)
}

/// Read a model document, rejecting documents from another major version
pub async fn load_model(path: &Path) -> Result<DesignModel> {
    let bytes = tokio::fs::read(path).await?;
    let model: DesignModel = serde_json::from_slice(&bytes)?;
    check_version(&model.metadata.version)?;
    debug!(
        "Loaded design model from {:?} ({} components)",
        path,
        model.components.len()
    );
    Ok(model)
}

fn major(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

fn check_version(found: &str) -> Result<()> {
    if major(found) != major(MODEL_VERSION) {
        return Err(BrainError::UnsupportedVersion {
            found: found.to_string(),
            expected: MODEL_VERSION.to_string(),
        });
    }
    Ok(())
}

/// Current model snapshot; new snapshots replace the old one atomically
#[derive(Clone)]
pub struct ModelStore {
    sender: Arc<watch::Sender<Arc<DesignModel>>>,
}

impl ModelStore {
    pub fn new(model: DesignModel) -> Self {
        let (sender, _) = watch::channel(Arc::new(model));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// The snapshot readers should use right now
    pub fn snapshot(&self) -> Arc<DesignModel> {
        Arc::clone(&self.sender.borrow())
    }

    pub fn publish(&self, model: DesignModel) {
        let components = model.components.len();
        self.sender.send_replace(Arc::new(model));
        info!("Published new design model snapshot ({} components)", components);
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DesignModel>> {
        self.sender.subscribe()
    }
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new(DesignModel::default())
    }
}
