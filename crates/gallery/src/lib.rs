//! Shutter Gallery
//!
//! Persists captured artifacts out of the device's transient location.
//! The capture session never saves on its own; the screen layer decides
//! whether a previewed capture is kept and hands it to an [`ArtifactStore`].

use std::path::{Path, PathBuf};

use chrono::Local;

use shutter_common::camera::ArtifactKind;
use shutter_common::config::GalleryConfig;
use shutter_common::error::{ShutterError, ShutterResult};

/// Storage for captured artifacts.
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist the artifact at `uri` and return its persisted uri.
    async fn save(&self, uri: &str, kind: ArtifactKind) -> ShutterResult<String>;
}

/// Filesystem gallery with `photos/` and `videos/` subdirectories.
#[derive(Debug, Clone)]
pub struct GalleryStore {
    root: PathBuf,
    remove_source: bool,
}

impl GalleryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            remove_source: false,
        }
    }

    pub fn from_config(config: &GalleryConfig) -> Self {
        Self::new(config.dir.clone()).with_remove_source(config.remove_source)
    }

    /// Delete the transient file once it has been copied.
    pub fn with_remove_source(mut self, remove: bool) -> Self {
        self.remove_source = remove;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding artifacts of `kind`.
    pub fn dir_for(&self, kind: ArtifactKind) -> PathBuf {
        match kind {
            ArtifactKind::Photo => self.root.join("photos"),
            ArtifactKind::Video => self.root.join("videos"),
        }
    }

    /// Saved artifacts of `kind`, newest first.
    pub async fn list(&self, kind: ArtifactKind) -> ShutterResult<Vec<PathBuf>> {
        let dir = self.dir_for(kind);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }
        // Names start with a sortable timestamp.
        files.sort_by(|a, b| b.cmp(a));
        Ok(files)
    }

    async fn unique_destination(&self, kind: ArtifactKind, ext: &str) -> PathBuf {
        let dir = self.dir_for(kind);
        let prefix = match kind {
            ArtifactKind::Photo => "photo",
            ArtifactKind::Video => "video",
        };
        let stamp = Local::now().format("%Y%m%d_%H%M%S");

        let mut candidate = dir.join(format!("{prefix}_{stamp}.{ext}"));
        let mut n = 1;
        while tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            candidate = dir.join(format!("{prefix}_{stamp}_{n}.{ext}"));
            n += 1;
        }
        candidate
    }
}

/// Local path behind a `file://` uri.
pub fn file_uri_to_path(uri: &str) -> ShutterResult<PathBuf> {
    uri.strip_prefix("file://")
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| ShutterError::unsupported(format!("artifact uri '{uri}'")))
}

fn default_extension(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Photo => "jpg",
        ArtifactKind::Video => "mp4",
    }
}

#[async_trait::async_trait]
impl ArtifactStore for GalleryStore {
    async fn save(&self, uri: &str, kind: ArtifactKind) -> ShutterResult<String> {
        let source = file_uri_to_path(uri)?;
        if !tokio::fs::try_exists(&source).await? {
            return Err(ShutterError::FileNotFound { path: source });
        }

        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| default_extension(kind).to_string());

        tokio::fs::create_dir_all(self.dir_for(kind)).await?;
        let destination = self.unique_destination(kind, &ext).await;
        let bytes = tokio::fs::copy(&source, &destination).await.map_err(|e| {
            ShutterError::storage(format!(
                "failed to copy {} to {}: {e}",
                source.display(),
                destination.display()
            ))
        })?;
        tracing::info!(
            %kind,
            source = %source.display(),
            destination = %destination.display(),
            bytes,
            "Saved artifact to gallery"
        );

        if self.remove_source {
            if let Err(e) = tokio::fs::remove_file(&source).await {
                tracing::warn!(source = %source.display(), error = %e, "Failed to remove transient capture");
            }
        }

        Ok(format!("file://{}", destination.display()))
    }
}
