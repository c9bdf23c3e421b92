//! Geometry value types: the plug-in family for module slot 1.
//!
//! These types live outside the core id range; until [`module`] is
//! installed into a registry, constructing any of their ids yields an
//! invalid value and save/load fail closed.

use std::sync::Arc;

use varia_core::{
    module_type_id, DescriptorRef, Reader, StreamCodec, StreamError, TypeDescriptor, TypeId,
    TypeOperations, Writer,
};
use varia_registry::ModuleTable;

/// Module slot reserved for the geometry family.
pub const SLOT: usize = 1;

/// Integer point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Floating-point point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

/// Integer size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

/// Floating-point size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SizeF {
    pub width: f64,
    pub height: f64,
}

/// Integer rectangle (origin plus size).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Floating-point rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RectF {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_point_f(self) -> PointF {
        PointF {
            x: f64::from(self.x),
            y: f64::from(self.y),
        }
    }
}

impl PointF {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Truncating conversion to the integer point.
    pub fn to_point(self) -> Point {
        Point {
            x: self.x as i32,
            y: self.y as i32,
        }
    }
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn to_rect_f(self) -> RectF {
        RectF {
            x: f64::from(self.x),
            y: f64::from(self.y),
            width: f64::from(self.width),
            height: f64::from(self.height),
        }
    }
}

impl RectF {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn to_rect(self) -> Rect {
        Rect {
            x: self.x as i32,
            y: self.y as i32,
            width: self.width as i32,
            height: self.height as i32,
        }
    }
}

macro_rules! impl_codec {
    ($ty:ty { $($field:ident : $write:ident / $read:ident),+ $(,)? }) => {
        impl StreamCodec for $ty {
            fn save(&self, w: &mut Writer) {
                $( w.$write(self.$field); )+
            }

            fn load(r: &mut Reader<'_>) -> Result<Self, StreamError> {
                Ok(Self {
                    $( $field: r.$read()?, )+
                })
            }
        }
    };
}

impl_codec!(Point { x: write_i32 / read_i32, y: write_i32 / read_i32 });
impl_codec!(PointF { x: write_f64 / read_f64, y: write_f64 / read_f64 });
impl_codec!(Size { width: write_i32 / read_i32, height: write_i32 / read_i32 });
impl_codec!(SizeF { width: write_f64 / read_f64, height: write_f64 / read_f64 });
impl_codec!(Rect {
    x: write_i32 / read_i32,
    y: write_i32 / read_i32,
    width: write_i32 / read_i32,
    height: write_i32 / read_i32,
});
impl_codec!(RectF {
    x: write_f64 / read_f64,
    y: write_f64 / read_f64,
    width: write_f64 / read_f64,
    height: write_f64 / read_f64,
});

/// Ids within the family's reserved range, in table order.
pub fn point_id() -> TypeId {
    module_type_id(SLOT, 0)
}

pub fn point_f_id() -> TypeId {
    module_type_id(SLOT, 1)
}

pub fn size_id() -> TypeId {
    module_type_id(SLOT, 2)
}

pub fn size_f_id() -> TypeId {
    module_type_id(SLOT, 3)
}

pub fn rect_id() -> TypeId {
    module_type_id(SLOT, 4)
}

pub fn rect_f_id() -> TypeId {
    module_type_id(SLOT, 5)
}

fn entry<T>(name: &'static str, index: u32) -> DescriptorRef
where
    T: Clone + Default + Send + Sync + PartialEq + StreamCodec + 'static,
{
    let ops = TypeOperations::of::<T>().with_stream::<T>().with_equals::<T>();
    Arc::new(TypeDescriptor::new(name, module_type_id(SLOT, index), ops))
}

/// The geometry family's operation table, ready to install.
pub fn module() -> ModuleTable {
    ModuleTable::new(
        SLOT,
        "geometry",
        vec![
            entry::<Point>("geometry::Point", 0),
            entry::<PointF>("geometry::PointF", 1),
            entry::<Size>("geometry::Size", 2),
            entry::<SizeF>("geometry::SizeF", 3),
            entry::<Rect>("geometry::Rect", 4),
            entry::<RectF>("geometry::RectF", 5),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use varia_core::{OpsResolver, Value, Writer};
    use varia_registry::TypeRegistry;

    #[test]
    fn fail_closed_before_install() {
        let registry = TypeRegistry::new();
        assert!(registry.describe(rect_id()).is_none());
        let v = Value::construct(&registry, rect_id(), None);
        assert!(!v.is_valid());
    }

    #[test]
    fn construct_after_install() {
        let registry = TypeRegistry::new();
        assert!(registry.install_module(module()));
        let desc = registry.describe(point_id()).unwrap();
        assert_eq!(desc.name(), "geometry::Point");

        let value = Value::from_payload(desc, Point::new(3, 4)).unwrap();
        assert_eq!(value.get::<Point>(), Some(&Point::new(3, 4)));
        assert_eq!(value.type_id(), point_id());
    }

    #[test]
    fn lookup_by_name_after_install() {
        let registry = TypeRegistry::new();
        registry.install_module(module());
        assert_eq!(registry.lookup("geometry::RectF"), Some(rect_f_id()));
    }

    #[test]
    fn save_load_round_trip() {
        let registry = TypeRegistry::new();
        registry.install_module(module());
        let desc = registry.resolve(rect_f_id()).unwrap();
        let original = Value::from_payload(desc, RectF::new(0.5, 1.5, 10.0, 20.0)).unwrap();

        let mut w = Writer::new();
        assert!(original.save(&mut w));
        let bytes = w.into_bytes();
        let loaded = Value::load(&registry, &mut varia_core::Reader::new(&bytes)).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn integer_float_conversions() {
        let r = Rect::new(1, 2, 3, 4).to_rect_f();
        assert_eq!(r, RectF::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(r.to_rect(), Rect::new(1, 2, 3, 4));
        assert_eq!(PointF::new(1.9, -1.9).to_point(), Point::new(1, -1));
    }

    #[test]
    fn inline_storage_follows_size() {
        let registry = TypeRegistry::new();
        registry.install_module(module());

        // Rect is 16 bytes: inline. RectF is 32: shared heap.
        let rect = Value::from_payload(registry.resolve(rect_id()).unwrap(), Rect::default());
        assert!(rect.unwrap().uses_inline_storage());
        let rect_f = Value::from_payload(registry.resolve(rect_f_id()).unwrap(), RectF::default());
        assert!(!rect_f.unwrap().uses_inline_storage());
    }
}
