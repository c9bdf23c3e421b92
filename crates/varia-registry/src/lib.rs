//! Runtime type registry and module dispatch for varia.
//!
//! [`TypeRegistry`] assigns stable ids to named types and publishes their
//! operation tables; [`ModuleDispatch`] routes externally-reserved id
//! ranges to optional plug-in tables. Both are consumed by the `Value`
//! container through the [`varia_core::OpsResolver`] seam.

mod dispatch;
mod registry;

pub use dispatch::{ModuleDispatch, ModuleTable};
pub use registry::{normalize_type_name, TypeRegistry};
