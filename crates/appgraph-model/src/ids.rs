//! Typed entity identifiers.
//!
//! The analyzer gives every class, method and variable a stable id before
//! insertion. Ids are what the graph side keys its identity maps on, so two
//! entities with equal names are still distinct as long as their ids differ.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw id.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw id.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Identifies a class within an analyzed application.
    ClassId,
    "class"
);
entity_id!(
    /// Identifies a method within an analyzed application.
    MethodId,
    "method"
);
entity_id!(
    /// Identifies a field (variable) within an analyzed application.
    VariableId,
    "variable"
);

/// Hands out fresh ids when a model is assembled in code.
///
/// One counter is shared by all kinds, so an id value is never reused
/// across kinds either. Analyzers that already carry their own ids can
/// use `ClassId::new` and friends directly.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Creates an allocator starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn class(&mut self) -> ClassId {
        ClassId(self.bump())
    }

    pub fn method(&mut self) -> MethodId {
        MethodId(self.bump())
    }

    pub fn variable(&mut self) -> VariableId {
        VariableId(self.bump())
    }
}
