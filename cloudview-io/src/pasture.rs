//! Pasture-based point cloud format support
//!
//! LAS, LAZ and PCD files are read through the pasture library. Only
//! positions and (when present) RGB colors are carried over; every other
//! attribute the formats define is ignored by the viewer.

use std::path::Path;

use pasture_core::containers::{BorrowedBuffer, VectorBuffer};
use pasture_core::nalgebra::Vector3;
use pasture_core::layout::attributes::{COLOR_RGB, POSITION_3D};

use cloudview_core::{ColoredPoint3f, ColoredPointCloud3f, Error, Point3f, PointCloud, Result};

use crate::CloudReader;

pub struct PastureReader;

impl CloudReader for PastureReader {
    fn read_point_cloud(&self, path: &Path) -> Result<ColoredPointCloud3f> {
        let buffer = pasture_io::base::read_all::<VectorBuffer, _>(path)
            .map_err(|e| Error::InvalidData(e.to_string()))?;

        let positions = buffer.view_attribute::<Vector3<f64>>(&POSITION_3D);

        let colors = if buffer.point_layout().has_attribute(&COLOR_RGB) {
            Some(buffer.view_attribute::<Vector3<u16>>(&COLOR_RGB))
        } else {
            None
        };

        let mut points = Vec::with_capacity(buffer.len());
        for index in 0..buffer.len() {
            let position = positions.at(index);
            // LAS stores 16-bit color channels; keep the high byte
            let color = match &colors {
                Some(colors) => {
                    let c = colors.at(index);
                    [(c.x >> 8) as u8, (c.y >> 8) as u8, (c.z >> 8) as u8]
                }
                None => [255, 255, 255],
            };

            points.push(ColoredPoint3f::new(
                Point3f::new(position.x as f32, position.y as f32, position.z as f32),
                color,
            ));
        }

        Ok(PointCloud::from_points(points))
    }

    fn can_read(&self, path: &Path) -> bool {
        if let Some(extension) = path.extension().and_then(|s| s.to_str()) {
            return matches!(extension.to_lowercase().as_str(), "las" | "laz" | "pcd");
        }
        false
    }

    fn format_name(&self) -> &'static str {
        "pasture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_probe() {
        assert!(PastureReader.can_read("scan.las".as_ref()));
        assert!(PastureReader.can_read("scan.LAZ".as_ref()));
        assert!(PastureReader.can_read("scan.pcd".as_ref()));
        assert!(!PastureReader.can_read("scan.ply".as_ref()));
        assert!(!PastureReader.can_read("scan".as_ref()));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = PastureReader.read_point_cloud("does_not_exist.las".as_ref());
        assert!(result.is_err());
    }
}
