//! Core data structures for cloudview
//!
//! This crate provides the fundamental types shared by the cloudview
//! workspace: points, point clouds, bounding volumes, display poses,
//! and the common error type.

pub mod bounds;
pub mod cloud;
pub mod error;
pub mod point;
pub mod pose;

pub use bounds::*;
pub use cloud::*;
pub use error::*;
pub use point::*;
pub use pose::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};
