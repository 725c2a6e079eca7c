//! Viewer lifecycle management for cloudview
//!
//! The one design-bearing component of the workspace: [`ViewerManager`]
//! owns the render surface (backend + camera + viewport), the currently
//! attached point cloud resource and the render-loop scheduling, and
//! exposes initialize / load / reset / update / destroy to UI shells.
//! Rendering and decoding stay behind the `cloudview-render` and
//! `cloudview-io` collaborators.

pub mod camera;
pub mod events;
pub mod framing;
pub mod manager;
pub mod resource;
pub mod scheduler;
pub mod state;

pub use camera::*;
pub use events::*;
pub use framing::*;
pub use manager::*;
pub use resource::*;
pub use scheduler::*;
pub use state::*;
