/// Element bindings and the instances they populate.
pub mod binding;

/// Type descriptors: shared handles to serde-backed data shapes.
pub mod descriptor;

pub mod generation;

/// Qualified element names.
pub mod name;

/// The namespace binding registry and its builder.
pub mod registry;
