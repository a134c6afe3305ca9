use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::reflect::{Reflect, Type};

/// Per-type rewrite applied before comparison.
///
/// Both sides of a node of type [`Transform::target`] are rewritten, and the
/// node is equal when the rewritten values are. `apply` must be a pure
/// function of its input.
pub trait Transform: Send + Sync {
    fn target(&self) -> Type;
    /// `None` when `value` is not of the target type.
    fn apply(&self, value: &dyn Reflect) -> Option<Box<dyn Reflect>>;
}

/// Per-type renderer for differing values.
///
/// Called with the original values, and only once they are known to differ.
/// The returned text is the whole description of the node.
pub trait Format: Send + Sync {
    fn target(&self) -> Type;
    /// `None` when either value is not of the target type.
    fn render(&self, a: &dyn Reflect, b: &dyn Reflect) -> Option<String>;
}

/// [`Transform`] backed by a closure over the concrete type.
pub struct FnTransform<T, U, F> {
    f: F,
    _types: PhantomData<fn(&T) -> U>,
}

impl<T, U, F> FnTransform<T, U, F>
where
    T: Reflect,
    U: Reflect,
    F: Fn(&T) -> U + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f, _types: PhantomData }
    }
}

impl<T, U, F> Transform for FnTransform<T, U, F>
where
    T: Reflect,
    U: Reflect,
    F: Fn(&T) -> U + Send + Sync,
{
    fn target(&self) -> Type {
        Type::of::<T>()
    }

    fn apply(&self, value: &dyn Reflect) -> Option<Box<dyn Reflect>> {
        let value = value.as_any().downcast_ref::<T>()?;
        Some(Box::new((self.f)(value)))
    }
}

/// [`Format`] backed by a closure over the concrete type.
pub struct FnFormat<T, F> {
    f: F,
    _types: PhantomData<fn(&T)>,
}

impl<T, F> FnFormat<T, F>
where
    T: Reflect,
    F: Fn(&T, &T) -> String + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f, _types: PhantomData }
    }
}

impl<T, F> Format for FnFormat<T, F>
where
    T: Reflect,
    F: Fn(&T, &T) -> String + Send + Sync,
{
    fn target(&self) -> Type {
        Type::of::<T>()
    }

    fn render(&self, a: &dyn Reflect, b: &dyn Reflect) -> Option<String> {
        let a = a.as_any().downcast_ref::<T>()?;
        let b = b.as_any().downcast_ref::<T>()?;
        Some((self.f)(a, b))
    }
}

/// Thread-safe hook registry, keyed by exact type.
#[derive(Clone, Default)]
pub struct Registry {
    transforms: Arc<HashMap<TypeId, Arc<dyn Transform>>>,
    formats: Arc<HashMap<TypeId, Arc<dyn Format>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in hooks for common normalisations.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_transform(Arc::new(builtins::Lowercase));
        registry.register_format(Arc::new(builtins::TextDelta));
        registry
    }

    /// Replaces any transform registered for the same type.
    pub fn register_transform(&mut self, hook: Arc<dyn Transform>) {
        Arc::make_mut(&mut self.transforms).insert(hook.target().id(), hook);
    }

    /// Replaces any format registered for the same type.
    pub fn register_format(&mut self, hook: Arc<dyn Format>) {
        Arc::make_mut(&mut self.formats).insert(hook.target().id(), hook);
    }

    pub fn transform(&self, ty: Type) -> Option<&Arc<dyn Transform>> {
        self.transforms.get(&ty.id())
    }

    pub fn format(&self, ty: Type) -> Option<&Arc<dyn Format>> {
        self.formats.get(&ty.id())
    }

    /// Number of types with a transform.
    pub fn transform_count(&self) -> usize {
        self.transforms.len()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("transforms", &self.transforms.values().map(|h| h.target()).collect::<Vec<_>>())
            .field("formats", &self.formats.values().map(|h| h.target()).collect::<Vec<_>>())
            .finish()
    }
}

pub mod builtins {
    use super::*;

    /// Compares strings case-insensitively.
    pub struct Lowercase;
    impl Transform for Lowercase {
        fn target(&self) -> Type { Type::of::<String>() }
        fn apply(&self, value: &dyn Reflect) -> Option<Box<dyn Reflect>> {
            let s = value.as_any().downcast_ref::<String>()?;
            Some(Box::new(s.to_lowercase()))
        }
    }

    /// Compares vectors as multisets by sorting both sides.
    pub struct Sorted<T>(PhantomData<fn(&T)>);

    impl<T> Sorted<T> {
        pub fn new() -> Self { Self(PhantomData) }
    }

    impl<T> Default for Sorted<T> {
        fn default() -> Self { Self::new() }
    }

    impl<T: Reflect + Ord + Clone> Transform for Sorted<T> {
        fn target(&self) -> Type { Type::of::<Vec<T>>() }
        fn apply(&self, value: &dyn Reflect) -> Option<Box<dyn Reflect>> {
            let v = value.as_any().downcast_ref::<Vec<T>>()?;
            let mut sorted = v.clone();
            sorted.sort();
            Some(Box::new(sorted))
        }
    }

    /// Compares `f64`s rounded to a number of decimal places.
    pub struct Rounded {
        places: i32,
    }

    impl Rounded {
        pub fn new(places: u8) -> Self { Self { places: i32::from(places) } }
    }

    impl Transform for Rounded {
        fn target(&self) -> Type { Type::of::<f64>() }
        fn apply(&self, value: &dyn Reflect) -> Option<Box<dyn Reflect>> {
            let x = value.as_any().downcast_ref::<f64>()?;
            let scale = 10f64.powi(self.places);
            Some(Box::new((x * scale).round() / scale))
        }
    }

    /// Describes differing strings by the first character where they part.
    pub struct TextDelta;
    impl Format for TextDelta {
        fn target(&self) -> Type { Type::of::<String>() }
        fn render(&self, a: &dyn Reflect, b: &dyn Reflect) -> Option<String> {
            let a = a.as_any().downcast_ref::<String>()?;
            let b = b.as_any().downcast_ref::<String>()?;
            let at = a
                .chars()
                .zip(b.chars())
                .take_while(|(x, y)| x == y)
                .count();
            Some(format!("{a:?} != {b:?} (first difference at char {at})"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::builtins::*;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtins_rewrite_their_target_only() {
        assert!(Lowercase.apply(&5i32).is_none());
        let out = Lowercase.apply(&"MiXeD".to_string()).map(|v| crate::format_short(Some(&*v), false).to_string());
        assert_eq!(out.as_deref(), Some("\"mixed\""));
    }

    #[test]
    fn sorted_and_rounded() {
        let sorted = Sorted::<i32>::new().apply(&vec![3, 1, 2]);
        let text = sorted.map(|v| crate::format_full(Some(&*v)).to_string());
        assert_eq!(text.as_deref(), Some("Vec<i32>{\n    1,\n    2,\n    3,\n}"));

        let rounded = Rounded::new(2).apply(&1.23456f64);
        let text = rounded.map(|v| crate::format_short(Some(&*v), false).to_string());
        assert_eq!(text.as_deref(), Some("1.23"));
    }

    #[test]
    fn text_delta_names_first_difference() {
        let msg = TextDelta.render(&"hello".to_string(), &"help".to_string());
        assert_eq!(msg.as_deref(), Some("\"hello\" != \"help\" (first difference at char 3)"));
    }

    #[test]
    fn with_builtins_registers_string_hooks() {
        let registry = Registry::with_builtins();
        assert!(registry.transform(Type::of::<String>()).is_some());
        assert!(registry.format(Type::of::<String>()).is_some());
        assert!(registry.transform(Type::of::<i32>()).is_none());
    }
}
