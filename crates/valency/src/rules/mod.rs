//! Read-only compiled rule tables shared by the matcher and the growth engine.
pub mod bounds;
pub mod module;
pub mod packing;
pub mod pattern;
pub mod socket;

pub use bounds::Aabb;
pub use module::{CompiledBondingRules, CompiledSocket, LayerMasks, ModuleDefinition};
pub use packing::{PackedModuleData, PackedSocketRef};
pub use pattern::{
    CompiledPattern, CompiledPatternSet, OutputStrategy, PatternAdjacency, PatternEntry,
    PatternSettings, TransformMode,
};
pub use socket::{SocketRules, SocketTypeIndex};

/// Row index into [`CompiledBondingRules`].
pub type ModuleIndex = usize;
