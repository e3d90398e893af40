use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::error::TopologyError;
use crate::math::{Matrix4, Point2, Point3, Space, Vector3, TOLERANCE};

use super::provider::ConvertOptions;
use super::ElementKind;

/// An in-memory polygon mesh.
///
/// Built from vertex positions and per-face vertex lists; the edge table and
/// every incidence table are derived on construction. Edges are numbered in
/// the order they are first met while walking faces in order, and edge `k`
/// of a face joins its corners `k` and `k + 1`.
#[derive(Debug, Clone)]
pub struct PolyMesh {
    name: String,
    points: Vec<Point3>,
    faces: Vec<Vec<u32>>,
    uvs: Vec<Point2>,
    face_uvs: Vec<Vec<u32>>,
    transform: Matrix4,

    edges: Vec<[u32; 2]>,
    face_edges: Vec<Vec<u32>>,
    edge_faces: Vec<Vec<u32>>,
    vertex_edges: Vec<Vec<u32>>,
    vertex_faces: Vec<Vec<u32>>,
    uv_vertex: Vec<u32>,
    uv_faces: Vec<Vec<u32>>,
    vertex_uvs: Vec<Vec<u32>>,
    uv_shells: Vec<u32>,
    uv_shell_count: usize,
}

impl PolyMesh {
    /// Creates a mesh without UVs.
    ///
    /// # Errors
    ///
    /// Returns an error if a face has fewer than three corners, repeats a
    /// vertex, or references a vertex that does not exist.
    pub fn new(
        name: impl Into<String>,
        points: Vec<Point3>,
        faces: Vec<Vec<u32>>,
    ) -> Result<Self, TopologyError> {
        let vertex_count = points.len();
        for (face, verts) in faces.iter().enumerate() {
            if verts.len() < 3 {
                return Err(TopologyError::InvalidMesh(format!(
                    "face {face} has fewer than three vertices"
                )));
            }
            if let Some(&v) = verts.iter().find(|&&v| v as usize >= vertex_count) {
                return Err(TopologyError::InvalidMesh(format!(
                    "face {face} references missing vertex {v}"
                )));
            }
            let unique: BTreeSet<u32> = verts.iter().copied().collect();
            if unique.len() != verts.len() {
                return Err(TopologyError::InvalidMesh(format!(
                    "face {face} repeats a vertex"
                )));
            }
        }

        let mut edges: Vec<[u32; 2]> = Vec::new();
        let mut lookup: HashMap<(u32, u32), u32> = HashMap::new();
        let mut face_edges = Vec::with_capacity(faces.len());
        for verts in &faces {
            let mut ids = Vec::with_capacity(verts.len());
            for (k, &a) in verts.iter().enumerate() {
                let b = verts[(k + 1) % verts.len()];
                let key = (a.min(b), a.max(b));
                let next = index_u32(edges.len())?;
                let id = *lookup.entry(key).or_insert_with(|| {
                    edges.push([a, b]);
                    next
                });
                ids.push(id);
            }
            face_edges.push(ids);
        }

        let mut edge_faces = vec![Vec::new(); edges.len()];
        let mut vertex_faces = vec![Vec::new(); vertex_count];
        for (face, ids) in face_edges.iter().enumerate() {
            let face = index_u32(face)?;
            for &e in ids {
                edge_faces[e as usize].push(face);
            }
            for &v in &faces[face as usize] {
                vertex_faces[v as usize].push(face);
            }
        }
        if let Some(e) = edge_faces.iter().position(|f| f.len() > 2) {
            return Err(TopologyError::InvalidMesh(format!(
                "edge {e} is shared by more than two faces"
            )));
        }

        let mut vertex_edges = vec![Vec::new(); vertex_count];
        for (edge, pair) in edges.iter().enumerate() {
            let edge = index_u32(edge)?;
            vertex_edges[pair[0] as usize].push(edge);
            vertex_edges[pair[1] as usize].push(edge);
        }

        Ok(Self {
            name: name.into(),
            points,
            face_uvs: vec![Vec::new(); faces.len()],
            faces,
            uvs: Vec::new(),
            transform: Matrix4::identity(),
            edges,
            face_edges,
            edge_faces,
            vertex_edges,
            vertex_faces,
            uv_vertex: Vec::new(),
            uv_faces: Vec::new(),
            vertex_uvs: vec![Vec::new(); vertex_count],
            uv_shells: Vec::new(),
            uv_shell_count: 0,
        })
    }

    /// Assigns UV coordinates; `face_uvs[f][k]` is the UV of corner `k` of
    /// face `f`.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout does not match the faces, a UV is
    /// unused, or one UV is shared by two different vertices.
    pub fn with_uvs(
        mut self,
        uvs: Vec<Point2>,
        face_uvs: Vec<Vec<u32>>,
    ) -> Result<Self, TopologyError> {
        if face_uvs.len() != self.faces.len() {
            return Err(TopologyError::InvalidMesh(
                "UV layout does not match face count".into(),
            ));
        }

        let mut uv_vertex: Vec<Option<u32>> = vec![None; uvs.len()];
        let mut uv_faces = vec![Vec::new(); uvs.len()];
        for (face, (verts, ids)) in self.faces.iter().zip(&face_uvs).enumerate() {
            if verts.len() != ids.len() {
                return Err(TopologyError::InvalidMesh(format!(
                    "face {face} has {} corners but {} UVs",
                    verts.len(),
                    ids.len()
                )));
            }
            let face = index_u32(face)?;
            for (&v, &uv) in verts.iter().zip(ids) {
                let slot = uv_vertex.get_mut(uv as usize).ok_or_else(|| {
                    TopologyError::InvalidMesh(format!("face {face} references missing UV {uv}"))
                })?;
                match *slot {
                    Some(owner) if owner != v => {
                        return Err(TopologyError::InvalidMesh(format!(
                            "UV {uv} is shared by vertices {owner} and {v}"
                        )));
                    }
                    _ => *slot = Some(v),
                }
                if uv_faces[uv as usize].last() != Some(&face) {
                    uv_faces[uv as usize].push(face);
                }
            }
        }

        let uv_vertex: Vec<u32> = uv_vertex
            .into_iter()
            .enumerate()
            .map(|(uv, owner)| {
                owner.ok_or_else(|| TopologyError::InvalidMesh(format!("UV {uv} is unused")))
            })
            .collect::<Result<_, _>>()?;

        let mut vertex_uvs = vec![Vec::new(); self.points.len()];
        for (uv, &v) in uv_vertex.iter().enumerate() {
            vertex_uvs[v as usize].push(index_u32(uv)?);
        }

        let (uv_shells, uv_shell_count) = label_uv_shells(uvs.len(), &face_uvs)?;

        self.uvs = uvs;
        self.face_uvs = face_uvs;
        self.uv_vertex = uv_vertex;
        self.uv_faces = uv_faces;
        self.vertex_uvs = vertex_uvs;
        self.uv_shells = uv_shells;
        self.uv_shell_count = uv_shell_count;
        Ok(self)
    }

    /// Sets the object-to-world transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Matrix4) -> Self {
        self.transform = transform;
        self
    }

    /// Returns a copy of the mesh with the given faces deleted.
    ///
    /// Vertices are kept with their ids; edges and UVs are renumbered.
    ///
    /// # Errors
    ///
    /// Returns an error if the remaining faces do not form a valid mesh.
    pub fn without_faces(&self, removed: &BTreeSet<u32>) -> Result<Self, TopologyError> {
        let kept: Vec<usize> = (0..self.faces.len())
            .filter(|&f| u32::try_from(f).map_or(true, |f| !removed.contains(&f)))
            .collect();
        let faces = kept.iter().map(|&f| self.faces[f].clone()).collect();
        let mesh = Self::new(self.name.clone(), self.points.clone(), faces)?
            .with_transform(self.transform);
        if self.uvs.is_empty() {
            return Ok(mesh);
        }

        let mut remap: HashMap<u32, u32> = HashMap::new();
        let mut uvs = Vec::new();
        let mut face_uvs = Vec::with_capacity(kept.len());
        for &f in &kept {
            let mut ids = Vec::with_capacity(self.face_uvs[f].len());
            for &uv in &self.face_uvs[f] {
                let next = index_u32(uvs.len())?;
                let id = *remap.entry(uv).or_insert_with(|| {
                    uvs.push(self.uvs[uv as usize]);
                    next
                });
                ids.push(id);
            }
            face_uvs.push(ids);
        }
        mesh.with_uvs(uvs, face_uvs)
    }

    /// Name of the mesh.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Object-to-world transform.
    #[must_use]
    pub fn transform(&self) -> &Matrix4 {
        &self.transform
    }

    /// Number of elements of `kind`.
    #[must_use]
    pub fn count(&self, kind: ElementKind) -> usize {
        match kind {
            ElementKind::Vertex => self.points.len(),
            ElementKind::Edge => self.edges.len(),
            ElementKind::Face => self.faces.len(),
            ElementKind::UvPoint => self.uvs.len(),
        }
    }

    /// Fails if `index` is not a valid element of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ElementOutOfRange`] for invalid indices.
    pub fn check(&self, kind: ElementKind, index: u32) -> Result<(), TopologyError> {
        let count = self.count(kind);
        if (index as usize) < count {
            Ok(())
        } else {
            Err(TopologyError::ElementOutOfRange { kind, index, count })
        }
    }

    /// Endpoints of an edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge does not exist.
    pub fn edge(&self, edge: u32) -> Result<[u32; 2], TopologyError> {
        self.check(ElementKind::Edge, edge)?;
        Ok(self.edges[edge as usize])
    }

    /// Vertices of a face in winding order.
    ///
    /// # Errors
    ///
    /// Returns an error if the face does not exist.
    pub fn face(&self, face: u32) -> Result<&[u32], TopologyError> {
        self.check(ElementKind::Face, face)?;
        Ok(&self.faces[face as usize])
    }

    /// Edges of a face, edge `k` joining corners `k` and `k + 1`.
    ///
    /// # Errors
    ///
    /// Returns an error if the face does not exist.
    pub fn face_edges(&self, face: u32) -> Result<&[u32], TopologyError> {
        self.check(ElementKind::Face, face)?;
        Ok(&self.face_edges[face as usize])
    }

    /// Vertex positions in the requested space.
    #[must_use]
    pub fn points(&self, space: Space) -> Vec<Point3> {
        match space {
            Space::Object => self.points.clone(),
            Space::World => self
                .points
                .iter()
                .map(|p| self.transform.transform_point(p))
                .collect(),
        }
    }

    /// UV coordinates.
    #[must_use]
    pub fn uvs(&self) -> &[Point2] {
        &self.uvs
    }

    /// Shell id of every UV and the number of shells.
    #[must_use]
    pub fn uv_shells(&self) -> (&[u32], usize) {
        (&self.uv_shells, self.uv_shell_count)
    }

    /// Returns `true` if the edge is used by exactly one face.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge does not exist.
    pub fn is_boundary_edge(&self, edge: u32) -> Result<bool, TopologyError> {
        self.check(ElementKind::Edge, edge)?;
        Ok(self.edge_faces[edge as usize].len() == 1)
    }

    /// Returns `true` if any edge of the face is a boundary edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the face does not exist.
    pub fn is_boundary_face(&self, face: u32) -> Result<bool, TopologyError> {
        Ok(self
            .face_edges(face)?
            .iter()
            .any(|&e| self.edge_faces[e as usize].len() == 1))
    }

    /// Boundary edges reachable from `edge` through shared vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge does not exist.
    pub fn boundary_loop(&self, edge: u32) -> Result<BTreeSet<u32>, TopologyError> {
        let mut visited = BTreeSet::new();
        if !self.is_boundary_edge(edge)? {
            return Ok(visited);
        }
        let mut queue = VecDeque::from([edge]);
        visited.insert(edge);
        while let Some(current) = queue.pop_front() {
            for &v in &self.edges[current as usize] {
                for &next in &self.vertex_edges[v as usize] {
                    if self.edge_faces[next as usize].len() == 1 && visited.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        Ok(visited)
    }

    /// Faces that share an edge with `face`.
    ///
    /// # Errors
    ///
    /// Returns an error if the face does not exist.
    pub fn adjacent_faces(&self, face: u32) -> Result<BTreeSet<u32>, TopologyError> {
        Ok(self
            .face_edges(face)?
            .iter()
            .flat_map(|&e| self.edge_faces[e as usize].iter().copied())
            .filter(|&other| other != face)
            .collect())
    }

    /// Maps a set of `from` elements to `to` elements.
    ///
    /// A target element is included when it is incident to at least one
    /// source element. With `internal`, every source element incident to it
    /// must be selected; with `border`, some but not all of them must be.
    /// Face to edge border conversion therefore leaves out edges on the
    /// mesh's own boundary, since their only face is selected.
    ///
    /// # Errors
    ///
    /// Returns an error if a source index is out of range.
    pub fn convert(
        &self,
        indices: &BTreeSet<u32>,
        from: ElementKind,
        to: ElementKind,
        options: ConvertOptions,
    ) -> Result<BTreeSet<u32>, TopologyError> {
        for &index in indices {
            self.check(from, index)?;
        }
        if from == to {
            return Ok(indices.clone());
        }

        let candidates: BTreeSet<u32> = indices
            .iter()
            .flat_map(|&index| self.incident(from, index, to))
            .collect();
        if !options.internal && !options.border {
            return Ok(candidates);
        }

        Ok(candidates
            .into_iter()
            .filter(|&target| {
                let sources = self.incident(to, target, from);
                let inside = sources.iter().filter(|s| indices.contains(s)).count();
                let all_inside = !sources.is_empty() && inside == sources.len();
                let straddles = inside > 0 && inside < sources.len();
                (!options.internal || all_inside) && (!options.border || straddles)
            })
            .collect())
    }

    /// Elements of kind `to` incident to element `index` of kind `from`.
    /// `index` must already be in range.
    fn incident(&self, from: ElementKind, index: u32, to: ElementKind) -> Vec<u32> {
        use ElementKind::{Edge, Face, UvPoint, Vertex};

        let i = index as usize;
        match (from, to) {
            (Vertex, Vertex) | (Edge, Edge) | (Face, Face) | (UvPoint, UvPoint) => vec![index],
            (Vertex, Edge) => self.vertex_edges[i].clone(),
            (Vertex, Face) => self.vertex_faces[i].clone(),
            (Vertex, UvPoint) => self.vertex_uvs[i].clone(),
            (Edge, Vertex) => self.edges[i].to_vec(),
            (Edge, Face) => self.edge_faces[i].clone(),
            (Edge, UvPoint) => {
                let ends = self.edges[i];
                let mut uvs = Vec::new();
                for &f in &self.edge_faces[i] {
                    let f = f as usize;
                    for (v, &uv) in self.faces[f].iter().zip(&self.face_uvs[f]) {
                        if ends.contains(v) && !uvs.contains(&uv) {
                            uvs.push(uv);
                        }
                    }
                }
                uvs
            }
            (Face, Vertex) => self.faces[i].clone(),
            (Face, Edge) => self.face_edges[i].clone(),
            (Face, UvPoint) => dedup(self.face_uvs[i].iter().copied()),
            (UvPoint, Vertex) => vec![self.uv_vertex[i]],
            (UvPoint, Face) => self.uv_faces[i].clone(),
            (UvPoint, Edge) => {
                let mut edges = Vec::new();
                for &f in &self.uv_faces[i] {
                    let f = f as usize;
                    let n = self.face_uvs[f].len();
                    for (k, &uv) in self.face_uvs[f].iter().enumerate() {
                        if uv == index {
                            edges.push(self.face_edges[f][k]);
                            edges.push(self.face_edges[f][(k + n - 1) % n]);
                        }
                    }
                }
                dedup(edges)
            }
        }
    }

    /// Unit normal of a face (Newell's method).
    ///
    /// # Errors
    ///
    /// Returns an error if the face does not exist.
    pub fn face_normal(&self, face: u32, space: Space) -> Result<Vector3, TopologyError> {
        let verts = self.face(face)?;
        let normal = newell(verts.iter().map(|&v| &self.points[v as usize]));
        Ok(self.to_space(normal, space))
    }

    /// Per-vertex normals. When `angle_weighted` is set each face normal is
    /// weighted by the corner angle at the vertex, otherwise face normals are
    /// averaged evenly.
    #[must_use]
    pub fn vertex_normals(&self, space: Space, angle_weighted: bool) -> Vec<Vector3> {
        let mut sums = vec![Vector3::zeros(); self.points.len()];
        for verts in &self.faces {
            let normal = normalize_or_zero(newell(verts.iter().map(|&v| &self.points[v as usize])));
            let n = verts.len();
            for (k, &v) in verts.iter().enumerate() {
                let weight = if angle_weighted {
                    let here = self.points[v as usize];
                    let prev = self.points[verts[(k + n - 1) % n] as usize] - here;
                    let next = self.points[verts[(k + 1) % n] as usize] - here;
                    if prev.norm() < TOLERANCE || next.norm() < TOLERANCE {
                        0.0
                    } else {
                        prev.angle(&next)
                    }
                } else {
                    1.0
                };
                sums[v as usize] += normal * weight;
            }
        }
        sums.into_iter()
            .map(|sum| self.to_space(sum, space))
            .collect()
    }

    fn to_space(&self, normal: Vector3, space: Space) -> Vector3 {
        match space {
            Space::Object => normalize_or_zero(normal),
            // Normals map through the inverse transpose of the linear part.
            Space::World => self
                .transform
                .fixed_view::<3, 3>(0, 0)
                .into_owned()
                .try_inverse()
                .map_or_else(Vector3::zeros, |inverse| {
                    normalize_or_zero(inverse.transpose() * normal)
                }),
        }
    }
}

fn newell<'p>(points: impl Iterator<Item = &'p Point3>) -> Vector3 {
    let points: Vec<&Point3> = points.collect();
    let n = points.len();
    let mut normal = Vector3::zeros();
    for k in 0..n {
        let a = points[k];
        let b = points[(k + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

fn normalize_or_zero(v: Vector3) -> Vector3 {
    v.try_normalize(TOLERANCE).unwrap_or_else(Vector3::zeros)
}

fn dedup(values: impl IntoIterator<Item = u32>) -> Vec<u32> {
    let mut out = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

fn index_u32(index: usize) -> Result<u32, TopologyError> {
    u32::try_from(index)
        .map_err(|_| TopologyError::InvalidMesh(format!("index {index} exceeds u32 range")))
}

/// Groups UVs that share a face; shell ids follow the order of each
/// shell's lowest UV id.
fn label_uv_shells(
    uv_count: usize,
    face_uvs: &[Vec<u32>],
) -> Result<(Vec<u32>, usize), TopologyError> {
    fn root(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let mut parent: Vec<usize> = (0..uv_count).collect();
    for ids in face_uvs {
        if let Some((&first, rest)) = ids.split_first() {
            for &uv in rest {
                let a = root(&mut parent, first as usize);
                let b = root(&mut parent, uv as usize);
                if a != b {
                    parent[b.max(a)] = a.min(b);
                }
            }
        }
    }

    let mut labels: HashMap<usize, u32> = HashMap::new();
    let mut shells = Vec::with_capacity(uv_count);
    for uv in 0..uv_count {
        let r = root(&mut parent, uv);
        let next = index_u32(labels.len())?;
        shells.push(*labels.entry(r).or_insert(next));
    }
    Ok((shells, labels.len()))
}
