//! `Reflect` for std types.

use std::borrow::Cow;
use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use std::sync::Arc;

use super::{
    addr_of, addr_of_dyn, Field, Handle, MapAccess, MapRef, Pointee, Reflect, Shape, SliceRef, Type,
};

macro_rules! reflect_scalar {
    ($variant:ident as $wide:ty: $($t:ident)*) => {$(
        impl Reflect for $t {
            fn shape(&self) -> Shape<'_> {
                Shape::$variant(*self as $wide)
            }
        }
    )*};
}

reflect_scalar!(Int as i128: i8 i16 i32 i64 i128 isize);
reflect_scalar!(Uint as u128: u8 u16 u32 u64 u128 usize);
reflect_scalar!(Float as f64: f32 f64);

impl Reflect for bool {
    fn shape(&self) -> Shape<'_> {
        Shape::Bool(*self)
    }
}

/// Complex number with `f64` parts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex64 {
    pub re: f64,
    pub im: f64,
}

impl Complex64 {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl Reflect for Complex64 {
    fn shape(&self) -> Shape<'_> {
        Shape::Complex(self.re, self.im)
    }
}

impl Reflect for String {
    fn shape(&self) -> Shape<'_> {
        Shape::Str(self)
    }
}

impl Reflect for &'static str {
    fn shape(&self) -> Shape<'_> {
        Shape::Str(self)
    }
}

impl Reflect for Cow<'static, str> {
    fn shape(&self) -> Shape<'_> {
        Shape::Str(self)
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn shape(&self) -> Shape<'_> {
        Shape::Array(self.iter().map(|v| v as &dyn Reflect).collect())
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn shape(&self) -> Shape<'_> {
        let addr = if self.is_empty() {
            0
        } else {
            addr_of(self.as_ptr())
        };
        Shape::Slice(Some(SliceRef {
            addr,
            items: self.iter().map(|v| v as &dyn Reflect).collect(),
        }))
    }

    fn nil_shape() -> Option<Shape<'static>> {
        Some(Shape::Slice(None))
    }
}

impl<K, V, S> MapAccess for HashMap<K, V, S>
where
    K: Reflect + Eq + Hash,
    V: Reflect,
    S: BuildHasher,
{
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn entries(&self) -> Vec<(&dyn Reflect, &dyn Reflect)> {
        self.iter()
            .map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect))
            .collect()
    }

    fn get(&self, key: &dyn Reflect) -> Option<&dyn Reflect> {
        let key = key.as_any().downcast_ref::<K>()?;
        HashMap::get(self, key).map(|v| v as &dyn Reflect)
    }
}

impl<K, V, S> Reflect for HashMap<K, V, S>
where
    K: Reflect + Eq + Hash,
    V: Reflect,
    S: BuildHasher + 'static,
{
    fn shape(&self) -> Shape<'_> {
        Shape::Map(Some(MapRef {
            addr: addr_of(self as *const Self),
            map: self,
        }))
    }

    fn nil_shape() -> Option<Shape<'static>> {
        Some(Shape::Map(None))
    }
}

impl<K: Reflect + Ord, V: Reflect> MapAccess for BTreeMap<K, V> {
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn entries(&self) -> Vec<(&dyn Reflect, &dyn Reflect)> {
        self.iter()
            .map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect))
            .collect()
    }

    fn get(&self, key: &dyn Reflect) -> Option<&dyn Reflect> {
        let key = key.as_any().downcast_ref::<K>()?;
        BTreeMap::get(self, key).map(|v| v as &dyn Reflect)
    }
}

impl<K: Reflect + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn shape(&self) -> Shape<'_> {
        Shape::Map(Some(MapRef {
            addr: addr_of(self as *const Self),
            map: self,
        }))
    }

    fn nil_shape() -> Option<Shape<'static>> {
        Some(Shape::Map(None))
    }
}

macro_rules! reflect_pointer {
    ($($ptr:ident)*) => {$(
        impl<T: Reflect> Reflect for $ptr<T> {
            fn shape(&self) -> Shape<'_> {
                Shape::Ptr(Some(Pointee {
                    addr: addr_of(&**self as *const T),
                    target: Handle::Borrowed(&**self),
                }))
            }

            fn nil_shape() -> Option<Shape<'static>> {
                Some(Shape::Ptr(None))
            }
        }

        impl Reflect for $ptr<dyn Reflect> {
            fn shape(&self) -> Shape<'_> {
                Shape::Interface(Some(Pointee {
                    addr: addr_of_dyn(&**self),
                    target: Handle::Borrowed(&**self),
                }))
            }

            fn nil_shape() -> Option<Shape<'static>> {
                Some(Shape::Interface(None))
            }
        }
    )*};
}

reflect_pointer!(Box Rc Arc);

/// `Option` of a reference-like type is that type's nil form; `Option` of
/// anything else behaves as a nullable pointer.
impl<T: Reflect> Reflect for Option<T> {
    fn shape(&self) -> Shape<'_> {
        match (self, T::nil_shape()) {
            (Some(v), Some(_)) => v.shape(),
            (Some(v), None) => Shape::Ptr(Some(Pointee {
                addr: addr_of(v as *const T),
                target: Handle::Borrowed(v),
            })),
            (None, Some(nil)) => nil,
            (None, None) => Shape::Ptr(None),
        }
    }

    fn nil_shape() -> Option<Shape<'static>> {
        Some(T::nil_shape().unwrap_or(Shape::Ptr(None)))
    }

    fn identity_type(&self) -> Type {
        match self {
            Some(v) if T::nil_shape().is_some() => v.identity_type(),
            _ => Type::of::<Self>(),
        }
    }
}

impl<T: Reflect> Reflect for RefCell<T> {
    fn shape(&self) -> Shape<'_> {
        let inner = self
            .try_borrow()
            .ok()
            .map(|r| Handle::Guarded(Ref::map(r, |v| v as &dyn Reflect)));
        Shape::Cell(inner)
    }
}

impl Reflect for () {
    fn shape(&self) -> Shape<'_> {
        Shape::Struct(Vec::new())
    }
}

macro_rules! reflect_tuple {
    ($(($($name:ident $idx:tt),+))*) => {$(
        impl<$($name: Reflect),+> Reflect for ($($name,)+) {
            fn shape(&self) -> Shape<'_> {
                Shape::Struct(vec![$(Field::new(stringify!($idx), &self.$idx)),+])
            }
        }
    )*};
}

reflect_tuple! {
    (A 0)
    (A 0, B 1)
    (A 0, B 1, C 2)
    (A 0, B 1, C 2, D 3)
}

macro_rules! reflect_fn {
    ($(($($arg:ident),*))*) => {$(
        impl<R: 'static, $($arg: 'static),*> Reflect for fn($($arg),*) -> R {
            fn shape(&self) -> Shape<'_> {
                Shape::Func(Some(*self as usize))
            }

            fn nil_shape() -> Option<Shape<'static>> {
                Some(Shape::Func(None))
            }
        }
    )*};
}

reflect_fn! {
    ()
    (A)
    (A, B)
    (A, B, C)
}

impl<T: 'static> Reflect for *const T {
    fn shape(&self) -> Shape<'_> {
        Shape::Addr(*self as usize)
    }
}

impl<T: 'static> Reflect for *mut T {
    fn shape(&self) -> Shape<'_> {
        Shape::Addr(*self as usize)
    }
}
