//! Point cloud loading for cloudview
//!
//! This crate reads point clouds from disk in the formats the viewer
//! accepts: PLY through `ply-rs`, and LAS/LAZ/PCD through the pasture
//! library. Format interpretation is entirely delegated to those
//! libraries; this crate only adapts their output to cloudview types
//! and exposes an asynchronous fetch front end for the viewer.

pub mod fetch;
pub mod pasture;
pub mod ply;

pub use fetch::{CloudFetcher, CloudSource, LoadedCloud};
pub use pasture::PastureReader;
pub use ply::{PlyReader, PlyWriter};

use std::path::Path;

use cloudview_core::{ColoredPointCloud3f, Error, Result};

/// Trait for reading point clouds from files
pub trait CloudReader: Send + Sync {
    /// Read a point cloud from the given path
    fn read_point_cloud(&self, path: &Path) -> Result<ColoredPointCloud3f>;

    /// Check if this reader handles the given file, judged by extension
    fn can_read(&self, path: &Path) -> bool;

    /// Get the format name this reader handles
    fn format_name(&self) -> &'static str;
}

/// Trait for writing point clouds to files
pub trait CloudWriter: Send + Sync {
    /// Write a point cloud to the given path
    fn write_point_cloud(&self, cloud: &ColoredPointCloud3f, path: &Path) -> Result<()>;

    /// Get the format name this writer handles
    fn format_name(&self) -> &'static str;
}

/// Auto-detect format by extension and read a point cloud
pub fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<ColoredPointCloud3f> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    match extension.as_deref() {
        Some("ply") => PlyReader.read_point_cloud(path),
        Some("las") | Some("laz") | Some("pcd") => PastureReader.read_point_cloud(path),
        _ => Err(Error::UnsupportedFormat(format!(
            "unsupported point cloud format: {:?}",
            path.extension()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudview_core::{Bounded, ColoredPoint3f, Point3f, PointCloud};
    use std::fs;

    #[test]
    fn ply_roundtrip_preserves_positions_and_colors() {
        let temp_file = "test_lib_roundtrip.ply";

        let mut cloud = PointCloud::new();
        cloud.push(ColoredPoint3f::new(Point3f::new(0.0, 0.0, 0.0), [255, 0, 0]));
        cloud.push(ColoredPoint3f::new(Point3f::new(1.0, 2.0, 3.0), [0, 255, 0]));
        cloud.push(ColoredPoint3f::new(Point3f::new(-1.0, -2.0, -3.0), [0, 0, 255]));

        PlyWriter.write_point_cloud(&cloud, temp_file.as_ref()).unwrap();
        let loaded = read_point_cloud(temp_file).unwrap();

        assert_eq!(cloud.len(), loaded.len());
        for (original, read_back) in cloud.iter().zip(loaded.iter()) {
            assert!((original.position.x - read_back.position.x).abs() < 1e-6);
            assert!((original.position.y - read_back.position.y).abs() < 1e-6);
            assert!((original.position.z - read_back.position.z).abs() < 1e-6);
            assert_eq!(original.color, read_back.color);
        }

        let _ = fs::remove_file(temp_file);
    }

    #[test]
    fn extension_detection_is_case_insensitive() {
        let temp_file = "test_lib_case.PLY";

        let cloud = PointCloud::from_points(vec![ColoredPoint3f::default()]);
        PlyWriter.write_point_cloud(&cloud, temp_file.as_ref()).unwrap();

        let loaded = read_point_cloud(temp_file).unwrap();
        assert_eq!(loaded.len(), 1);

        let _ = fs::remove_file(temp_file);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let result = read_point_cloud("cloud.xyz");
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn loaded_bounds_match_cloud() {
        let temp_file = "test_lib_bounds.ply";

        let mut cloud = PointCloud::new();
        cloud.push(ColoredPoint3f::from_position(Point3f::new(-10.0, 0.0, 0.0)));
        cloud.push(ColoredPoint3f::from_position(Point3f::new(10.0, 0.0, 0.0)));
        PlyWriter.write_point_cloud(&cloud, temp_file.as_ref()).unwrap();

        let loaded = read_point_cloud(temp_file).unwrap();
        let bounds = loaded.bounding_box().unwrap();
        assert_eq!(bounds.center(), Point3f::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max_dimension(), 20.0);

        let _ = fs::remove_file(temp_file);
    }
}
