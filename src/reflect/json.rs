//! `Reflect` for `serde_json` values.
//!
//! A JSON value reflects as a boxed dynamic value: `null` is the nil
//! interface, every other variant unwraps to a concrete Rust value (numbers to
//! `i64`, `u64` or `f64`, arrays to `Vec<Value>`, objects to `Map`).

use serde_json::{Map, Number, Value};

use super::{addr_of, Handle, MapAccess, MapRef, Pointee, Reflect, Shape};

fn number(n: &Number) -> Box<dyn Reflect> {
    if let Some(i) = n.as_i64() {
        Box::new(i)
    } else if let Some(u) = n.as_u64() {
        Box::new(u)
    } else {
        Box::new(n.as_f64().unwrap_or(f64::NAN))
    }
}

impl Reflect for Value {
    fn shape(&self) -> Shape<'_> {
        let inner = match self {
            Value::Null => None,
            Value::Bool(b) => Some(Handle::Borrowed(b)),
            Value::Number(n) => Some(Handle::Owned(number(n))),
            Value::String(s) => Some(Handle::Borrowed(s)),
            Value::Array(items) => Some(Handle::Borrowed(items)),
            Value::Object(map) => Some(Handle::Borrowed(map)),
        };
        // JSON trees cannot share nodes, so nothing here is tracked.
        Shape::Interface(inner.map(|target| Pointee { addr: 0, target }))
    }

    fn nil_shape() -> Option<Shape<'static>> {
        Some(Shape::Interface(None))
    }
}

impl MapAccess for Map<String, Value> {
    fn len(&self) -> usize {
        Map::len(self)
    }

    fn entries(&self) -> Vec<(&dyn Reflect, &dyn Reflect)> {
        self.iter()
            .map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect))
            .collect()
    }

    fn get(&self, key: &dyn Reflect) -> Option<&dyn Reflect> {
        let key = key.as_any().downcast_ref::<String>()?;
        Map::get(self, key.as_str()).map(|v| v as &dyn Reflect)
    }
}

impl Reflect for Map<String, Value> {
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
