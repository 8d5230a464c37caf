//! Graph input types: edges between node indices and per-node resolution state.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rules::ModuleIndex;

/// An undirected edge between two node indices. `start` is the endpoint whose
/// orbital slot lives in the low byte of the edge's packed slot pair.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub start: usize,
    pub end: usize,
}

impl Edge {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The endpoint opposite `node`, if `node` is one of the endpoints.
    pub fn other(&self, node: usize) -> Option<usize> {
        if node == self.start {
            Some(self.end)
        } else if node == self.end {
            Some(self.start)
        } else {
            None
        }
    }
}

/// Resolution state of a node, as produced by an external solver.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeState {
    /// Not resolved yet.
    #[default]
    Unset,
    /// Node has no orbitals and stays empty.
    Boundary,
    /// No module fits the node.
    Unsolvable,
    /// Reserved for a module that is placed by another pass.
    Placeholder,
    Resolved(ModuleIndex),
}

impl NodeState {
    pub const RAW_UNSET: i32 = -1;
    pub const RAW_BOUNDARY: i32 = -2;
    pub const RAW_UNSOLVABLE: i32 = -3;
    pub const RAW_PLACEHOLDER: i32 = -4;

    /// Decodes the attribute encoding: non-negative values are module indices,
    /// known negative sentinels map to their state, anything else is `Unset`.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            r if r >= 0 => NodeState::Resolved(r as ModuleIndex),
            Self::RAW_BOUNDARY => NodeState::Boundary,
            Self::RAW_UNSOLVABLE => NodeState::Unsolvable,
            Self::RAW_PLACEHOLDER => NodeState::Placeholder,
            _ => NodeState::Unset,
        }
    }

    pub fn to_raw(self) -> i32 {
        match self {
            NodeState::Unset => Self::RAW_UNSET,
            NodeState::Boundary => Self::RAW_BOUNDARY,
            NodeState::Unsolvable => Self::RAW_UNSOLVABLE,
            NodeState::Placeholder => Self::RAW_PLACEHOLDER,
            NodeState::Resolved(m) => m as i32,
        }
    }

    pub fn module(self) -> Option<ModuleIndex> {
        match self {
            NodeState::Resolved(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_resolved(self) -> bool {
        matches!(self, NodeState::Resolved(_))
    }
}
