//! Runtime reflection over Rust values.
//!
//! The comparison engine and the renderer never see concrete types. They see a
//! [`Shape`]: a category tag plus borrowed views of whatever the value contains
//! (fields, elements, entries, a pointee). Every comparable type implements
//! [`Reflect`] to produce its shape; std types are covered in `impls`, JSON
//! values in `json`, and named-field structs via [`reflect_struct!`].

use std::any::{Any, TypeId};
use std::cell::Ref;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

mod impls;
mod json;

pub use impls::Complex64;

/// Object-safe access to `Any`, so `&dyn Reflect` can be downcast.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A value the engine can walk and render.
pub trait Reflect: AsAny + 'static {
    /// Category view of this value.
    fn shape(&self) -> Shape<'_>;

    /// Dynamic type of this value. Two values are only compared structurally
    /// when their types are equal.
    fn reflect_type(&self) -> Type {
        Type::of::<Self>()
    }

    /// Shape of the "nil" form of a reference-like type, used by `Option<Self>`.
    /// `None` means the type has no nil form, and `Option<Self>` reflects as a
    /// pointer instead.
    fn nil_shape() -> Option<Shape<'static>>
    where
        Self: Sized,
    {
        None
    }

    /// Type under which this value's address is tracked for cycles. A
    /// wrapper that only adds a nil form reports the type it wraps, so both
    /// name the same identity.
    fn identity_type(&self) -> Type {
        self.reflect_type()
    }
}

/// Type descriptor: identity plus the compiler's name for the type.
#[derive(Clone, Copy)]
pub struct Type {
    id: TypeId,
    name: &'static str,
}

impl Type {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified name, e.g. `alloc::vec::Vec<i32>`.
    pub fn full_name(&self) -> &'static str {
        self.name
    }

    /// Name with module paths stripped, e.g. `Vec<i32>`.
    pub fn name(&self) -> String {
        short_type_name(self.name)
    }

    /// Builtin bool and string types print without annotation even when a
    /// type is requested; their literal form is unambiguous.
    pub(crate) fn is_builtin(&self) -> bool {
        [
            TypeId::of::<bool>(),
            TypeId::of::<String>(),
            TypeId::of::<&'static str>(),
            TypeId::of::<std::borrow::Cow<'static, str>>(),
        ]
        .contains(&self.id)
    }

    /// Whether `Type(nil)` would be ambiguous without parentheses.
    pub(crate) fn needs_parens(&self) -> bool {
        let name = self.name();
        name.starts_with("fn")
            || name.starts_with('*')
            || name.starts_with('&')
            || name.starts_with("dyn ")
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.name)
    }
}

/// Strip `path::` prefixes from every identifier in a type name.
fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
            continue;
        }
        out.push(c);
        if !(c.is_alphanumeric() || c == '_') {
            segment_start = out.len();
        }
    }
    out
}

/// Value category, without contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    Complex,
    Str,
    Array,
    Struct,
    Func,
    Interface,
    Map,
    Ptr,
    Slice,
    Addr,
    Cell,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::Complex => "complex",
            Kind::Str => "string",
            Kind::Array => "array",
            Kind::Struct => "struct",
            Kind::Func => "func",
            Kind::Interface => "interface",
            Kind::Map => "map",
            Kind::Ptr => "ptr",
            Kind::Slice => "slice",
            Kind::Addr => "addr",
            Kind::Cell => "cell",
        };
        f.write_str(name)
    }
}

/// Category view of a value. `None` payloads are the nil form of the
/// reference-like categories.
pub enum Shape<'a> {
    Bool(bool),
    Int(i128),
    Uint(u128),
    Float(f64),
    Complex(f64, f64),
    Str(&'a str),
    /// Fixed-size sequence.
    Array(Vec<&'a dyn Reflect>),
    /// Named-field aggregate.
    Struct(Vec<Field<'a>>),
    /// Function value; the payload is its address.
    Func(Option<usize>),
    /// Boxed dynamic value; the address is that of the contained value, 0
    /// when it has no identity.
    Interface(Option<Pointee<'a>>),
    Map(Option<MapRef<'a>>),
    Ptr(Option<Pointee<'a>>),
    /// Variable-length sequence.
    Slice(Option<SliceRef<'a>>),
    /// Raw address; 0 is null.
    Addr(usize),
    /// Interior-mutability cell, transparent to comparison. `None` when the
    /// cell is mutably borrowed.
    Cell(Option<Handle<'a>>),
}

impl Shape<'_> {
    pub fn kind(&self) -> Kind {
        match self {
            Shape::Bool(_) => Kind::Bool,
            Shape::Int(_) => Kind::Int,
            Shape::Uint(_) => Kind::Uint,
            Shape::Float(_) => Kind::Float,
            Shape::Complex(..) => Kind::Complex,
            Shape::Str(_) => Kind::Str,
            Shape::Array(_) => Kind::Array,
            Shape::Struct(_) => Kind::Struct,
            Shape::Func(_) => Kind::Func,
            Shape::Interface(_) => Kind::Interface,
            Shape::Map(_) => Kind::Map,
            Shape::Ptr(_) => Kind::Ptr,
            Shape::Slice(_) => Kind::Slice,
            Shape::Addr(_) => Kind::Addr,
            Shape::Cell(_) => Kind::Cell,
        }
    }

    /// Identity used for cycle tracking, if this is a non-nil reference with
    /// a meaningful address.
    pub(crate) fn identity(&self) -> Option<usize> {
        let addr = match self {
            Shape::Ptr(Some(p)) | Shape::Interface(Some(p)) => p.addr,
            Shape::Map(Some(m)) => m.addr,
            Shape::Slice(Some(s)) => s.addr,
            _ => return None,
        };
        (addr != 0).then_some(addr)
    }
}

/// Kind of `v`, looking through cells.
pub(crate) fn kind_through_cells(v: &dyn Reflect) -> Kind {
    match v.shape() {
        Shape::Cell(Some(inner)) => kind_through_cells(&*inner),
        shape => shape.kind(),
    }
}

pub struct Field<'a> {
    pub name: &'static str,
    pub value: &'a dyn Reflect,
}

impl<'a> Field<'a> {
    pub fn new(name: &'static str, value: &'a dyn Reflect) -> Self {
        Self { name, value }
    }
}

pub struct Pointee<'a> {
    /// Address of the pointee; 0 for zero-sized or untracked pointees.
    pub addr: usize,
    pub target: Handle<'a>,
}

pub struct SliceRef<'a> {
    /// Address of the backing storage; 0 when there is none.
    pub addr: usize,
    pub items: Vec<&'a dyn Reflect>,
}

pub struct MapRef<'a> {
    pub addr: usize,
    pub map: &'a dyn MapAccess,
}

/// Type-erased access to a keyed collection.
pub trait MapAccess {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in iteration order.
    fn entries(&self) -> Vec<(&dyn Reflect, &dyn Reflect)>;

    /// Look up `key`, which must be of the map's key type.
    fn get(&self, key: &dyn Reflect) -> Option<&dyn Reflect>;
}

/// A view of a child value.
pub enum Handle<'a> {
    Borrowed(&'a dyn Reflect),
    /// Content of a `RefCell`, kept borrowed while the view is alive.
    Guarded(Ref<'a, dyn Reflect>),
    /// A temporary produced while reflecting, e.g. a JSON number.
    Owned(Box<dyn Reflect>),
}

impl Deref for Handle<'_> {
    type Target = dyn Reflect;

    fn deref(&self) -> &Self::Target {
        match self {
            Handle::Borrowed(v) => *v,
            Handle::Guarded(r) => &**r,
            Handle::Owned(b) => &**b,
        }
    }
}

/// Address of `v`, or 0 when `T` is zero-sized and the address carries no
/// identity.
pub(crate) fn addr_of<T>(v: *const T) -> usize {
    if std::mem::size_of::<T>() == 0 {
        0
    } else {
        v as usize
    }
}

/// Data address of a trait object, or 0 when the value is zero-sized.
pub(crate) fn addr_of_dyn(v: &dyn Reflect) -> usize {
    if std::mem::size_of_val(v) == 0 {
        0
    } else {
        v as *const dyn Reflect as *const () as usize
    }
}

/// Implement [`Reflect`] for a struct with named fields.
///
/// ```
/// use reflect_diff::reflect_struct;
///
/// struct Point { x: i32, y: i32 }
/// reflect_struct!(Point { x, y });
/// ```
#[macro_export]
macro_rules! reflect_struct {
    ($name:ident { $($field:ident),* $(,)? }) => {
        impl $crate::Reflect for $name {
            fn shape(&self) -> $crate::Shape<'_> {
                $crate::Shape::Struct(vec![
                    $($crate::Field::new(stringify!($field), &self.$field)),*
                ])
            }
        }
    };
}
