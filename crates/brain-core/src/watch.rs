use crate::ingest::Ingestor;
use crate::store::ModelStore;
use crate::types::SourceKind;
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Quiet period before a burst of file events triggers re-ingestion
const DEBOUNCE: Duration = Duration::from_millis(250);

/// Re-runs ingestion when template sources change. Dropping it stops watching.
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl SourceWatcher {
    /// Watch the ingestor's root and publish each fresh model into `store`
    pub fn spawn(ingestor: Ingestor, store: ModelStore) -> Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
        let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
            let _ = tx.send(event);
        })
        .context("Failed to start file watcher")?;

        watcher
            .watch(ingestor.root_path(), RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {:?}", ingestor.root_path()))?;
        info!("Watching {:?} for template changes", ingestor.root_path());

        let ignore_patterns = ingestor.config().ignore_patterns.clone();
        // Backends may report canonical paths
        let mut roots = vec![ingestor.root_path().clone()];
        if let Ok(canonical) = ingestor.root_path().canonicalize() {
            if !roots.contains(&canonical) {
                roots.push(canonical);
            }
        }
        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let event = match event {
                    Ok(event) => event,
                    Err(err) => {
                        warn!("Watch error: {}", err);
                        continue;
                    }
                };
                if !is_relevant(&event, &roots, &ignore_patterns) {
                    continue;
                }

                // Collapse bursts from editors writing several files
                tokio::time::sleep(DEBOUNCE).await;
                while rx.try_recv().is_ok() {}

                debug!("Change detected in {:?}, re-extracting", event.paths);
                match ingestor.run().await {
                    Ok(model) => store.publish(model),
                    Err(err) => warn!("Re-extraction failed, keeping previous model: {:#}", err),
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            task,
        })
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

/// Content changes to HTML/CSS files outside ignored directories below a watched root
fn is_relevant(event: &Event, roots: &[PathBuf], ignore_patterns: &[String]) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event.paths.iter().any(|path| {
        let is_source = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(SourceKind::from_extension)
            .is_some();
        is_source && !in_ignored_dir(relative_to_root(path, roots), ignore_patterns)
    })
}

fn relative_to_root<'a>(path: &'a Path, roots: &[PathBuf]) -> &'a Path {
    roots
        .iter()
        .find_map(|root| path.strip_prefix(root).ok())
        .unwrap_or(path)
}

/// Only directories between the root and the file count
fn in_ignored_dir(relative: &Path, ignore_patterns: &[String]) -> bool {
    let Some(parent) = relative.parent() else {
        return false;
    };
    parent.components().any(|component| {
        let name = component.as_os_str().to_string_lossy();
        ignore_patterns.iter().any(|p| *p == name)
    })
}
