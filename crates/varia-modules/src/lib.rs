//! Optional value-type families for the varia type system.
//!
//! Each family reserves one module id range and provides a [`module`]
//! function returning the operation table to install:
//!
//! ```ignore
//! use varia_registry::TypeRegistry;
//!
//! let registry = TypeRegistry::new();
//! registry.install_module(varia_modules::geometry::module());
//! ```

pub mod geometry;

pub use geometry::{Point, PointF, Rect, RectF, Size, SizeF};
