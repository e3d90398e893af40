use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::component::RawComponent;
use crate::error::{Result, SelectionError, TopologyError};
use crate::topology::{ElementKind, MeshId, TopologyProvider};

#[allow(clippy::expect_used)]
static COMPONENT_STRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<mesh>[^.\[\]]+)\.(?P<tag>vtx|e|f|map)\[(?P<ranges>[^\]]+)\]$")
        .expect("component string pattern is valid")
});

/// One bracketed index range of a component string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexRange {
    /// `*`: every element of the kind.
    All,
    /// `start:end`, inclusive. A single index has `start == end`.
    Span(u32, u32),
}

/// A parsed component string such as `pCube1.f[0:3,5]` or `pPlane*.vtx[*]`.
///
/// The mesh name may contain `*` wildcards.
#[derive(Debug, Clone)]
pub struct ComponentPattern {
    mesh: String,
    kind: ElementKind,
    ranges: Vec<IndexRange>,
}

impl ComponentPattern {
    /// Parses a component string.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::Parse`] if the string is not of the form
    /// `mesh.tag[ranges]`.
    pub fn parse(input: &str) -> Result<Self> {
        let parse_error = || SelectionError::Parse(input.to_owned());
        let caps = COMPONENT_STRING.captures(input.trim()).ok_or_else(parse_error)?;

        let kind = ElementKind::from_tag(&caps["tag"]).ok_or_else(parse_error)?;
        let ranges = caps["ranges"]
            .split(',')
            .map(|part| parse_range(part.trim()).ok_or_else(parse_error))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            mesh: caps["mesh"].to_owned(),
            kind,
            ranges,
        })
    }

    /// Mesh name, possibly with wildcards.
    #[must_use]
    pub fn mesh(&self) -> &str {
        &self.mesh
    }

    /// Element kind named by the tag.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// The bracketed ranges in input order.
    #[must_use]
    pub fn ranges(&self) -> &[IndexRange] {
        &self.ranges
    }

    /// Expands the pattern into one raw component per matching mesh, in the
    /// provider's mesh order.
    ///
    /// # Errors
    ///
    /// Returns an error if the name pattern is malformed, a named mesh does
    /// not exist, or an index is past the end of a mesh.
    pub fn resolve(&self, provider: &dyn TopologyProvider) -> Result<Vec<RawComponent>> {
        let meshes = matching_meshes(provider, &self.mesh)?;
        let mut resolved = Vec::with_capacity(meshes.len());
        for mesh in meshes {
            let count = provider.element_count(mesh, self.kind)?;
            let mut indices = BTreeSet::new();
            for range in &self.ranges {
                match *range {
                    IndexRange::All => {
                        indices.extend(0..u32::try_from(count).unwrap_or(u32::MAX));
                    }
                    IndexRange::Span(start, end) => {
                        if end as usize >= count {
                            return Err(TopologyError::ElementOutOfRange {
                                kind: self.kind,
                                index: end,
                                count,
                            }
                            .into());
                        }
                        indices.extend(start..=end);
                    }
                }
            }
            resolved.push(RawComponent {
                mesh,
                kind: self.kind,
                indices,
            });
        }
        Ok(resolved)
    }
}

/// Meshes whose name matches `name`, in the provider's mesh order. Without
/// a `*` the name must match exactly one existing mesh.
pub(super) fn matching_meshes(provider: &dyn TopologyProvider, name: &str) -> Result<Vec<MeshId>> {
    if !name.contains('*') {
        return Ok(vec![provider.find_mesh(name)?]);
    }
    let pattern = wildcard(name)?;
    let mut found = Vec::new();
    for id in provider.mesh_ids() {
        if pattern.is_match(&provider.mesh_name(id)?) {
            found.push(id);
        }
    }
    Ok(found)
}

fn parse_range(part: &str) -> Option<IndexRange> {
    if part == "*" {
        return Some(IndexRange::All);
    }
    match part.split_once(':') {
        Some((start, end)) => {
            let (start, end) = (start.trim().parse().ok()?, end.trim().parse().ok()?);
            (start <= end).then_some(IndexRange::Span(start, end))
        }
        None => {
            let index = part.parse().ok()?;
            Some(IndexRange::Span(index, index))
        }
    }
}

/// Compiles a `*` wildcard name into an anchored regex.
fn wildcard(pattern: &str) -> Result<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$")).map_err(|e| SelectionError::Parse(e.to_string()).into())
}
