//! Socket type registry and compatibility matrix.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum number of socket types, bounded by the width of a compatibility row.
pub const MAX_SOCKET_TYPES: usize = 64;

pub type SocketTypeIndex = usize;

/// Socket type names plus one compatibility bitmask row per type.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocketRules {
    names: Vec<String>,
    compatibility: Vec<u64>,
}

impl SocketRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Registers a new type and returns its index.
    pub fn add_type(&mut self, name: impl Into<String>) -> Result<SocketTypeIndex> {
        let name = name.into();
        if self.names.len() >= MAX_SOCKET_TYPES {
            return Err(Error::InvalidConfig(format!(
                "cannot add socket type '{name}': limit of {MAX_SOCKET_TYPES} reached"
            )));
        }
        if self.find_type(&name).is_some() {
            return Err(Error::InvalidConfig(format!(
                "socket type '{name}' already registered"
            )));
        }
        self.names.push(name);
        self.compatibility.push(0);
        Ok(self.names.len() - 1)
    }

    pub fn find_type(&self, name: &str) -> Option<SocketTypeIndex> {
        self.names.iter().position(|n| n == name)
    }

    /// Like [`find_type`](Self::find_type) but reports unknown names as errors.
    pub fn type_index(&self, name: &str) -> Result<SocketTypeIndex> {
        self.find_type(name).ok_or_else(|| Error::UnknownSocketType {
            name: name.to_owned(),
        })
    }

    pub fn type_name(&self, index: SocketTypeIndex) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Marks `a` as able to connect to `b` (and `b` to `a` when bidirectional).
    /// Out-of-range indices are ignored.
    pub fn set_compatibility(&mut self, a: SocketTypeIndex, b: SocketTypeIndex, bidirectional: bool) {
        let n = self.names.len();
        if a >= n || b >= n {
            return;
        }
        self.compatibility[a] |= 1u64 << b;
        if bidirectional {
            self.compatibility[b] |= 1u64 << a;
        }
    }

    /// Makes every type compatible with itself.
    pub fn initialize_self_compatible(&mut self) {
        for (i, row) in self.compatibility.iter_mut().enumerate() {
            *row |= 1u64 << i;
        }
    }

    pub fn clear_compatibility(&mut self) {
        self.compatibility.iter_mut().for_each(|row| *row = 0);
    }

    /// True if either type's row names the other.
    #[inline]
    pub fn are_compatible(&self, a: SocketTypeIndex, b: SocketTypeIndex) -> bool {
        let (Some(&row_a), Some(&row_b)) = (self.compatibility.get(a), self.compatibility.get(b))
        else {
            return false;
        };
        row_a & (1u64 << b) != 0 || row_b & (1u64 << a) != 0
    }

    pub fn validate(&self) -> Result<()> {
        if self.names.len() > MAX_SOCKET_TYPES {
            return Err(Error::InvalidConfig(format!(
                "{} socket types exceed the limit of {MAX_SOCKET_TYPES}",
                self.names.len()
            )));
        }
        if self.compatibility.len() != self.names.len() {
            return Err(Error::SizeMismatch {
                what: "socket compatibility rows",
                expected: self.names.len(),
                actual: self.compatibility.len(),
            });
        }
        let valid_bits = if self.names.len() == MAX_SOCKET_TYPES {
            u64::MAX
        } else {
            (1u64 << self.names.len()) - 1
        };
        if self.compatibility.iter().any(|row| row & !valid_bits != 0) {
            return Err(Error::InvalidConfig(
                "socket compatibility references an unknown type".into(),
            ));
        }
        Ok(())
    }
}
