// src/core/ids.rs

//! Newtype identifiers used throughout the scheduling core.
//!
//! Sessions, kernels, and agents reference each other by id rather than
//! by live object reference (spec.md §9, "cyclic object graphs"); joins
//! happen at query time in the repository layer, not by walking pointers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn nil() -> Self {
                Self(Uuid::nil())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(u: Uuid) -> Self {
                Self(u)
            }
        }
    };
}

uuid_id!(SessionId);
uuid_id!(KernelId);
uuid_id!(AgentId);

/// An API key identifying the owner of a session. Kept as an opaque
/// string rather than a newtype over `Uuid` since access keys are
/// issued by the (out-of-scope) auth layer in whatever shape it likes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccessKey(pub String);

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The name of a scaling group. A `String` newtype rather than a bare
/// `String` so repository/coordinator signatures are self-documenting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScalingGroupName(pub String);

impl fmt::Display for ScalingGroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ScalingGroupName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A three-valued update for a single field, used by administrative
/// override paths that must distinguish "leave unchanged" from
/// "explicitly clear" (spec.md §9, "runtime reflection / dynamic
/// fields"). Replaces sentinel values or reflection with an explicit
/// variant the repository matches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Leave the field as it is.
    Nop,
    /// Write this value.
    Set(T),
    /// Reset the field to its empty/default state.
    Clear,
}

impl<T> FieldUpdate<T> {
    pub fn is_nop(&self) -> bool {
        matches!(self, FieldUpdate::Nop)
    }
}
