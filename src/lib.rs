//! cloudplat: declarative cloud stacks.
//!
//! An ordered list of resource descriptors is dispatched to a provider's
//! adapter table. Each adapter's outputs land in a shared context that later
//! descriptors reference with `{ref: "<key>.<path>"}`.

pub mod cli;
pub mod components;
pub mod core;
pub mod provenance;
pub mod providers;
pub mod stacks;
