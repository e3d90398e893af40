mod list;
mod mesh_list;
mod multi_list;
mod pattern;
mod position;
mod state;

pub use list::ComponentList;
pub use mesh_list::{MeshList, MeshNode};
pub use multi_list::MultiComponentList;
pub use pattern::{ComponentPattern, IndexRange};
pub use state::{LsFlags, SelectionPrefs, SelectionState};
