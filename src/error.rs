use thiserror::Error;

use crate::topology::{ElementKind, MeshId};

/// Top-level error type for polycomp.
#[derive(Debug, Error)]
pub enum PolycompError {
    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Errors raised by operations on a single component.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComponentError {
    #[error("component is empty")]
    Empty,

    #[error("index {index} is out of range for a component of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("expected {expected} component, found {found}")]
    KindMismatch {
        expected: ElementKind,
        found: ElementKind,
    },

    #[error("components are bound to different meshes")]
    MeshMismatch,
}

/// Errors reported by a topology provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("stale mesh reference: {0:?}")]
    StaleReference(MeshId),

    #[error("no mesh named `{0}`")]
    UnknownMesh(String),

    #[error("{kind} index {index} is out of range (count {count})")]
    ElementOutOfRange {
        kind: ElementKind,
        index: u32,
        count: usize,
    },

    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("edges do not form a single chain: {0}")]
    NotAChain(String),
}

/// Errors related to selection lists and component strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("cannot parse component string `{0}`")]
    Parse(String),

    #[error("position {index} is out of range for a list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors caused by host preferences that make a request unanswerable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("ordered selection requested but selection order is not tracked")]
    OrderedSelectionNotTracked,
}

/// Non-fatal conditions. These are logged and never returned as errors;
/// the operation that hit them still yields an empty or best-effort result.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SelectionWarning {
    #[error("nothing is selected")]
    EmptySelection,

    #[error("an invalid selection was made")]
    InvalidSelection,

    #[error("component is bound to a different mesh")]
    MixedMesh,
}

/// Convenience type alias for results using [`PolycompError`].
pub type Result<T> = std::result::Result<T, PolycompError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_errors_display_transparently() {
        let err: PolycompError = ConfigurationError::OrderedSelectionNotTracked.into();
        assert_eq!(
            err.to_string(),
            "ordered selection requested but selection order is not tracked"
        );

        let err: PolycompError = ComponentError::KindMismatch {
            expected: ElementKind::Edge,
            found: ElementKind::Face,
        }
        .into();
        assert_eq!(err.to_string(), "expected edge component, found face");
    }

    #[test]
    fn warnings_have_messages() {
        assert_eq!(
            SelectionWarning::MixedMesh.to_string(),
            "component is bound to a different mesh"
        );
    }
}
