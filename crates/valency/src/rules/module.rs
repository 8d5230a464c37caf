//! Compiled module tables.
//!
//! [`CompiledBondingRules`] stores every module as a row across parallel arrays so the
//! matcher and the growth engine can scan them without chasing pointers. Per-layer masks
//! are laid out `[module * layer_count + layer]`; sockets and local transform variants are
//! flattened with a `(start, count)` header per module.
use glam::Affine3A;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rules::bounds::Aabb;
use crate::rules::socket::SocketTypeIndex;
use crate::rules::ModuleIndex;

/// Orbital masks of one module on one layer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerMasks {
    /// Orbitals the module connects through.
    pub orbital: u64,
    /// Orbitals that must have no neighbor.
    pub boundary: u64,
    /// Orbitals that must have a neighbor of any kind.
    pub wildcard: u64,
}

impl LayerMasks {
    pub fn new(orbital: u64) -> Self {
        Self {
            orbital,
            ..Default::default()
        }
    }

    /// Sets the orbitals that must have no neighbor.
    pub fn with_boundary(mut self, boundary: u64) -> Self {
        self.boundary = boundary;
        self
    }

    /// Sets the orbitals that must have a neighbor.
    pub fn with_wildcard(mut self, wildcard: u64) -> Self {
        self.wildcard = wildcard;
        self
    }

    /// Whether a node whose occupied orbitals are `state` can host this module.
    #[inline]
    pub fn fits(&self, state: u64) -> bool {
        state & self.orbital == self.orbital
            && state & self.wildcard == self.wildcard
            && state & self.boundary == 0
    }
}

/// A typed attachment point with its offset from the module origin.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSocket {
    pub name: String,
    pub socket_type: SocketTypeIndex,
    pub offset: Affine3A,
}

impl CompiledSocket {
    pub fn new(name: impl Into<String>, socket_type: SocketTypeIndex, offset: Affine3A) -> Self {
        Self {
            name: name.into(),
            socket_type,
            offset,
        }
    }
}

/// Authoring-side description of one module, appended with
/// [`CompiledBondingRules::push_module`].
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDefinition {
    pub name: String,
    pub weight: f32,
    pub min_spawns: u32,
    /// `None` means unlimited.
    pub max_spawns: Option<u32>,
    pub layers: Vec<LayerMasks>,
    pub dead_end: bool,
    pub local_transforms: Vec<Affine3A>,
    pub local_bounds: Aabb,
    pub sockets: Vec<CompiledSocket>,
}

impl ModuleDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: 1.0,
            min_spawns: 0,
            max_spawns: None,
            layers: Vec::new(),
            dead_end: false,
            local_transforms: Vec::new(),
            local_bounds: Aabb::INVALID,
            sockets: Vec::new(),
        }
    }

    /// Sets the weight.
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the minimum and optional maximum spawn counts.
    pub fn with_spawn_limits(mut self, min_spawns: u32, max_spawns: Option<u32>) -> Self {
        self.min_spawns = min_spawns;
        self.max_spawns = max_spawns;
        self
    }

    /// Appends the masks for the next layer.
    pub fn with_layer(mut self, masks: LayerMasks) -> Self {
        self.layers.push(masks);
        self
    }

    /// Sets whether the module stops growth at its sockets.
    pub fn with_dead_end(mut self, dead_end: bool) -> Self {
        self.dead_end = dead_end;
        self
    }

    /// Adds a local transform variant.
    pub fn with_local_transform(mut self, transform: Affine3A) -> Self {
        self.local_transforms.push(transform);
        self
    }

    /// Sets the local bounds.
    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.local_bounds = bounds;
        self
    }

    /// Adds a socket.
    pub fn with_socket(mut self, socket: CompiledSocket) -> Self {
        self.sockets.push(socket);
        self
    }
}

/// Read-only struct-of-arrays table of compiled modules.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledBondingRules {
    layer_count: usize,
    names: Vec<String>,
    weights: Vec<f32>,
    min_spawns: Vec<u32>,
    max_spawns: Vec<Option<u32>>,
    layer_masks: Vec<LayerMasks>,
    dead_ends: Vec<bool>,
    local_bounds: Vec<Aabb>,
    transform_headers: Vec<(usize, usize)>,
    local_transforms: Vec<Affine3A>,
    socket_headers: Vec<(usize, usize)>,
    sockets: Vec<CompiledSocket>,
}

impl CompiledBondingRules {
    pub fn new(layer_count: usize) -> Result<Self> {
        if layer_count == 0 {
            return Err(Error::InvalidConfig(
                "compiled rules need at least one layer".into(),
            ));
        }
        Ok(Self {
            layer_count,
            ..Default::default()
        })
    }

    /// Appends a module row and returns its index.
    pub fn push_module(&mut self, def: ModuleDefinition) -> Result<ModuleIndex> {
        if def.layers.len() != self.layer_count {
            return Err(Error::SizeMismatch {
                what: "module layer masks",
                expected: self.layer_count,
                actual: def.layers.len(),
            });
        }
        if !def.weight.is_finite() || def.weight < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "module '{}' has invalid weight {}",
                def.name, def.weight
            )));
        }
        if let Some(max) = def.max_spawns {
            if def.min_spawns > max {
                return Err(Error::InvalidConfig(format!(
                    "module '{}' has min_spawns {} above max_spawns {}",
                    def.name, def.min_spawns, max
                )));
            }
        }

        let index = self.names.len();
        self.names.push(def.name);
        self.weights.push(def.weight);
        self.min_spawns.push(def.min_spawns);
        self.max_spawns.push(def.max_spawns);
        self.layer_masks.extend(def.layers);
        self.dead_ends.push(def.dead_end);
        self.local_bounds.push(def.local_bounds);

        self.transform_headers
            .push((self.local_transforms.len(), def.local_transforms.len()));
        self.local_transforms.extend(def.local_transforms);

        self.socket_headers
            .push((self.sockets.len(), def.sockets.len()));
        self.sockets.extend(def.sockets);

        Ok(index)
    }

    pub fn module_count(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    pub fn name(&self, module: ModuleIndex) -> &str {
        &self.names[module]
    }

    pub fn weight(&self, module: ModuleIndex) -> f32 {
        self.weights[module]
    }

    pub fn min_spawns(&self, module: ModuleIndex) -> u32 {
        self.min_spawns[module]
    }

    pub fn max_spawns(&self, module: ModuleIndex) -> Option<u32> {
        self.max_spawns[module]
    }

    pub fn is_dead_end(&self, module: ModuleIndex) -> bool {
        self.dead_ends[module]
    }

    pub fn local_bounds(&self, module: ModuleIndex) -> Aabb {
        self.local_bounds[module]
    }

    pub fn layer_masks(&self, module: ModuleIndex, layer: usize) -> LayerMasks {
        self.layer_masks[module * self.layer_count + layer]
    }

    pub fn sockets(&self, module: ModuleIndex) -> &[CompiledSocket] {
        let (start, count) = self.socket_headers[module];
        &self.sockets[start..start + count]
    }

    pub fn has_sockets(&self, module: ModuleIndex) -> bool {
        self.socket_headers[module].1 > 0
    }

    pub fn has_local_transform(&self, module: ModuleIndex) -> bool {
        self.transform_headers[module].1 > 0
    }

    /// Picks one of the module's local transform variants from a per-placement seed.
    /// Modules without variants use the identity.
    pub fn local_transform(&self, module: ModuleIndex, seed: u64) -> Affine3A {
        let (start, count) = self.transform_headers[module];
        if count == 0 {
            return Affine3A::IDENTITY;
        }
        self.local_transforms[start + (seed % count as u64) as usize]
    }

    /// Indices of all modules with the given name, in table order.
    pub fn modules_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = ModuleIndex> + 'a {
        self.names
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.as_str() == name)
            .map(|(i, _)| i)
    }

    /// Whether `module` fits a node whose occupied orbitals per layer are `node_masks`.
    pub fn module_fits(&self, module: ModuleIndex, node_masks: &[u64]) -> bool {
        if module >= self.module_count() || node_masks.len() != self.layer_count {
            return false;
        }
        node_masks
            .iter()
            .enumerate()
            .all(|(layer, &state)| self.layer_masks(module, layer).fits(state))
    }

    /// Checks that every parallel array agrees with the module count.
    pub fn validate(&self) -> Result<()> {
        let n = self.names.len();
        let checks: [(&'static str, usize, usize); 8] = [
            ("module weights", n, self.weights.len()),
            ("module min spawns", n, self.min_spawns.len()),
            ("module max spawns", n, self.max_spawns.len()),
            ("module layer masks", n * self.layer_count, self.layer_masks.len()),
            ("module dead-end flags", n, self.dead_ends.len()),
            ("module local bounds", n, self.local_bounds.len()),
            ("module transform headers", n, self.transform_headers.len()),
            ("module socket headers", n, self.socket_headers.len()),
        ];
        for (what, expected, actual) in checks {
            if expected != actual {
                return Err(Error::SizeMismatch {
                    what,
                    expected,
                    actual,
                });
            }
        }
        if self.layer_count == 0 {
            return Err(Error::InvalidConfig(
                "compiled rules need at least one layer".into(),
            ));
        }
        let headers_fit = |headers: &[(usize, usize)], len: usize| {
            headers.iter().all(|&(start, count)| start + count <= len)
        };
        if !headers_fit(&self.socket_headers, self.sockets.len())
            || !headers_fit(&self.transform_headers, self.local_transforms.len())
        {
            return Err(Error::InvalidConfig(
                "module header points past its flattened array".into(),
            ));
        }
        Ok(())
    }
}
