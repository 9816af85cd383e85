#[cfg(feature = "ial")]
/// This module provides the bindings of the Euclid `ial-schema` namespace.
pub mod ial;
