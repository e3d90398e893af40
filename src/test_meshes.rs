#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;

use crate::topology::{MeshId, MeshStore, PolyMesh};

/// Installs a test-writer subscriber so `tracing` output shows up in failing tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Unit cube: 8 vertices, 12 edges, 6 faces, 24 UVs in 6 shells.
pub fn cube() -> PolyMesh {
    PolyMesh::cube("pCube1", 1.0).unwrap()
}

/// 2x2 plane: 9 vertices, 12 edges, 4 faces, one UV shell.
///
/// ```text
/// 6---7---8
/// | 2 | 3 |
/// 3---4---5
/// | 0 | 1 |
/// 0---1---2
/// ```
pub fn plane_2x2() -> PolyMesh {
    PolyMesh::plane("pPlane1", 2.0, 2.0, 2, 2).unwrap()
}

/// The 2x2 plane with faces 1 and 2 deleted: two quads touching only at
/// vertex 4.
pub fn diagonal_quads() -> PolyMesh {
    let removed: BTreeSet<u32> = [1, 2].into_iter().collect();
    plane_2x2().without_faces(&removed).unwrap()
}

/// A 3x1 strip with its middle face deleted: two quads sharing nothing.
///
/// ```text
/// 4---5   6---7
/// | 0 |   | 1 |
/// 0---1   2---3
/// ```
pub fn split_strip() -> PolyMesh {
    let removed: BTreeSet<u32> = [1].into_iter().collect();
    PolyMesh::plane("pPlane2", 3.0, 1.0, 3, 1)
        .unwrap()
        .without_faces(&removed)
        .unwrap()
}

/// A store holding a single mesh.
pub fn store_with(mesh: PolyMesh) -> (MeshStore, MeshId) {
    init_tracing();
    let mut store = MeshStore::new();
    let id = store.add_mesh(mesh);
    (store, id)
}

/// Shorthand for an index set.
pub fn set(values: &[u32]) -> BTreeSet<u32> {
    values.iter().copied().collect()
}
