//! PLY format support

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ply_rs::{
    parser::Parser,
    ply::{Addable, DefaultElement, ElementDef, Ply, Property, PropertyDef, PropertyType, ScalarType},
    writer::Writer,
};

use cloudview_core::{ColoredPoint3f, ColoredPointCloud3f, Error, Point3f, PointCloud, Result};

use crate::{CloudReader, CloudWriter};

pub struct PlyReader;
pub struct PlyWriter;

impl CloudReader for PlyReader {
    fn read_point_cloud(&self, path: &Path) -> Result<ColoredPointCloud3f> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let parser = Parser::<DefaultElement>::new();
        let ply = parser.read_ply(&mut reader)?;

        let mut points = Vec::new();

        if let Some(vertex_element) = ply.payload.get("vertex") {
            for vertex in vertex_element {
                let x = scalar_property(vertex, "x")?;
                let y = scalar_property(vertex, "y")?;
                let z = scalar_property(vertex, "z")?;

                let color = color_property(vertex).unwrap_or([255, 255, 255]);
                points.push(ColoredPoint3f::new(Point3f::new(x, y, z), color));
            }
        }

        Ok(PointCloud::from_points(points))
    }

    fn can_read(&self, path: &Path) -> bool {
        matches!(
            path.extension().and_then(|s| s.to_str()),
            Some(ext) if ext.eq_ignore_ascii_case("ply")
        )
    }

    fn format_name(&self) -> &'static str {
        "ply"
    }
}

impl CloudWriter for PlyWriter {
    fn write_point_cloud(&self, cloud: &ColoredPointCloud3f, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let mut ply = Ply::<DefaultElement>::new();

        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = cloud.len();
        for name in ["x", "y", "z"] {
            vertex_element.properties.add(PropertyDef::new(
                name.to_string(),
                PropertyType::Scalar(ScalarType::Float),
            ));
        }
        for name in ["red", "green", "blue"] {
            vertex_element.properties.add(PropertyDef::new(
                name.to_string(),
                PropertyType::Scalar(ScalarType::UChar),
            ));
        }
        ply.header.elements.add(vertex_element);

        let mut vertices = Vec::new();
        for point in cloud.iter() {
            let mut vertex = DefaultElement::new();
            vertex.insert("x".to_string(), Property::Float(point.position.x));
            vertex.insert("y".to_string(), Property::Float(point.position.y));
            vertex.insert("z".to_string(), Property::Float(point.position.z));
            vertex.insert("red".to_string(), Property::UChar(point.color[0]));
            vertex.insert("green".to_string(), Property::UChar(point.color[1]));
            vertex.insert("blue".to_string(), Property::UChar(point.color[2]));
            vertices.push(vertex);
        }
        ply.payload.insert("vertex".to_string(), vertices);

        let writer_instance = Writer::new();
        writer_instance.write_ply(&mut writer, &mut ply)?;

        Ok(())
    }

    fn format_name(&self) -> &'static str {
        "ply"
    }
}

/// Extract a scalar property as f32 from a PLY element
fn scalar_property(element: &DefaultElement, name: &str) -> Result<f32> {
    match element.get(name) {
        Some(Property::Float(value)) => Ok(*value),
        Some(Property::Double(value)) => Ok(*value as f32),
        Some(Property::Int(value)) => Ok(*value as f32),
        Some(Property::UInt(value)) => Ok(*value as f32),
        _ => Err(Error::InvalidData(format!(
            "property '{}' not found or invalid type",
            name
        ))),
    }
}

/// Extract an RGB color from a PLY element, `None` if the file carries none
fn color_property(element: &DefaultElement) -> Option<[u8; 3]> {
    let channel = |name: &str| match element.get(name) {
        Some(Property::UChar(value)) => Some(*value),
        Some(Property::Int(value)) => u8::try_from(*value).ok(),
        Some(Property::UInt(value)) => u8::try_from(*value).ok(),
        _ => None,
    };

    Some([channel("red")?, channel("green")?, channel("blue")?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn ascii_ply_without_colors_defaults_to_white() {
        let temp_file = "test_ply_plain.ply";

        let ply_content = "\
ply
format ascii 1.0
element vertex 2
property float x
property float y
property float z
end_header
0.0 0.0 0.0
1.0 2.0 3.0
";
        fs::write(temp_file, ply_content).unwrap();

        let cloud = PlyReader.read_point_cloud(temp_file.as_ref()).unwrap();
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud[1].position, Point3f::new(1.0, 2.0, 3.0));
        assert_eq!(cloud[0].color, [255, 255, 255]);

        let _ = fs::remove_file(temp_file);
    }

    #[test]
    fn ascii_ply_with_colors() {
        let temp_file = "test_ply_colors.ply";

        let ply_content = "\
ply
format ascii 1.0
element vertex 1
property float x
property float y
property float z
property uchar red
property uchar green
property uchar blue
end_header
5.0 6.0 7.0 10 20 30
";
        fs::write(temp_file, ply_content).unwrap();

        let cloud = PlyReader.read_point_cloud(temp_file.as_ref()).unwrap();
        assert_eq!(cloud.len(), 1);
        assert_eq!(cloud[0].color, [10, 20, 30]);

        let _ = fs::remove_file(temp_file);
    }

    #[test]
    fn truncated_header_is_an_error() {
        let temp_file = "test_ply_invalid.ply";

        fs::write(temp_file, "not_ply\n").unwrap();
        assert!(PlyReader.read_point_cloud(temp_file.as_ref()).is_err());

        let _ = fs::remove_file(temp_file);
    }

    #[test]
    fn reader_advertises_extension() {
        assert!(PlyReader.can_read("scan.ply".as_ref()));
        assert!(PlyReader.can_read("scan.PLY".as_ref()));
        assert!(!PlyReader.can_read("scan.las".as_ref()));
    }
}
