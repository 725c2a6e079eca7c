//! Asynchronous point cloud fetching
//!
//! The viewer awaits loads without blocking its render loop; decoding
//! runs on the blocking thread pool and the finished cloud is handed
//! back as a [`LoadedCloud`].

use std::future::Future;
use std::path::Path;

use cloudview_core::{Aabb, Bounded, ColoredPointCloud3f, Error, Result};

/// A fully decoded point cloud ready to attach to a viewer
#[derive(Debug, Clone)]
pub struct LoadedCloud {
    pub name: String,
    pub cloud: ColoredPointCloud3f,
    pub bounds: Option<Aabb>,
}

impl LoadedCloud {
    /// Wrap a decoded cloud, computing its bounding box once
    pub fn from_cloud(name: impl Into<String>, cloud: ColoredPointCloud3f) -> Self {
        let bounds = cloud.bounding_box();
        Self {
            name: name.into(),
            cloud,
            bounds,
        }
    }

    /// Number of points in the decoded cloud
    pub fn point_count(&self) -> usize {
        self.cloud.len()
    }
}

/// Asynchronous source of point clouds
///
/// The single entry point the viewer's load operation awaits. Locators
/// are file paths here; a network-backed source would implement the same
/// contract.
pub trait CloudSource {
    /// Fetch and decode the cloud behind `locator`
    fn fetch(&self, locator: &Path) -> impl Future<Output = Result<LoadedCloud>> + Send;
}

/// File-based [`CloudSource`] decoding on the blocking thread pool
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudFetcher;

impl CloudSource for CloudFetcher {
    fn fetch(&self, locator: &Path) -> impl Future<Output = Result<LoadedCloud>> + Send {
        let path = locator.to_path_buf();
        async move {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("PointCloud")
                .to_string();

            let cloud = tokio::task::spawn_blocking(move || crate::read_point_cloud(&path))
                .await
                .map_err(|e| Error::Load(e.to_string()))??;

            Ok(LoadedCloud::from_cloud(name, cloud))
        }
    }
}
