pub mod cache;
pub mod component;
pub mod error;
pub mod math;
pub mod operations;
pub mod selection;
pub mod topology;

#[cfg(test)]
mod test_meshes;

pub use component::{Component, MultiComponent, RawComponent};
pub use error::{PolycompError, Result};
pub use selection::{ComponentList, MeshList, MultiComponentList};
