use std::fmt;
use std::str::FromStr;

/// The four polygon sub-element types a component can index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Vertex,
    Edge,
    Face,
    UvPoint,
}

impl ElementKind {
    /// All kinds, in declaration order.
    pub const ALL: [ElementKind; 4] = [
        ElementKind::Vertex,
        ElementKind::Edge,
        ElementKind::Face,
        ElementKind::UvPoint,
    ];

    /// Short tag used in component strings such as `pCube1.f[0:3]`.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Vertex => "vtx",
            Self::Edge => "e",
            Self::Face => "f",
            Self::UvPoint => "map",
        }
    }

    /// Looks up a kind by its component-string tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Edge => "edge",
            Self::Face => "face",
            Self::UvPoint => "uv point",
        })
    }
}

impl FromStr for ElementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| format!("unknown component tag `{s}`"))
    }
}
