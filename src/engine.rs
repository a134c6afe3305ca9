use std::any::TypeId;
use std::collections::HashMap;

use itertools::Itertools;
use tracing::trace;

use crate::comparison::cmp_values;
use crate::config::Config;
use crate::emitter::{Change, CountEmitter, Emitter, Segment};
use crate::reflect::{MapRef, Reflect, Shape, Type};

/// =========================
/// Identity tracking
/// =========================

/// A reference identity: where it points, and what type of reference it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Visit {
    addr: usize,
    ty: TypeId,
}

/// One comparison run. Owns the identity tracker; the configuration is shared
/// and read-only.
pub(crate) struct Differ<'c> {
    config: &'c Config,
    /// Whether transform and format hooks are consulted. Off for the silent
    /// equality checks the hooks themselves trigger.
    hooks: bool,
    a_seen: HashMap<Visit, Visit>,
    b_seen: HashMap<Visit, Visit>,
}

impl<'c> Differ<'c> {
    pub(crate) fn new(config: &'c Config) -> Self {
        Self {
            config,
            hooks: true,
            a_seen: HashMap::new(),
            b_seen: HashMap::new(),
        }
    }

    /// A run over the same configuration with a fresh tracker.
    fn fork(&self, hooks: bool) -> Differ<'c> {
        Differ {
            hooks,
            ..Differ::new(self.config)
        }
    }

    /// Pair `a` with `b`. Returns `Some(true)` when the pair was seen before
    /// (nothing more to compare), `Some(false)` when either side is already
    /// paired with something else, `None` when the pair is new.
    fn visit(&mut self, ty: Type, a: usize, b: usize) -> Option<bool> {
        let a = Visit { addr: a, ty: ty.id() };
        let b = Visit { addr: b, ty: ty.id() };
        if let Some(seen) = self.a_seen.get(&a) {
            return Some(*seen == b);
        }
        if self.b_seen.contains_key(&b) {
            return Some(false);
        }
        self.a_seen.insert(a, b);
        self.b_seen.insert(b, a);
        None
    }

    /// =========================
    /// Walk
    /// =========================

    /// Compare `a` and `b`, emitting every difference through `e`.
    ///
    /// `xform_ok` permits a transform hook at this node; `want_type` asks for
    /// type annotations when rendering leaf values.
    pub(crate) fn walk(
        &mut self,
        e: &mut dyn Emitter,
        a: Option<&dyn Reflect>,
        b: Option<&dyn Reflect>,
        xform_ok: bool,
        want_type: bool,
    ) {
        let (a, b) = match (a, b) {
            (None, None) => return,
            (Some(a), Some(b)) => (a, b),
            (a, b) => {
                e.emit(a, b, Change::Values { want_type: true });
                return;
            }
        };

        let ty = a.reflect_type();
        let bt = b.reflect_type();
        if ty != bt {
            e.emit(Some(a), Some(b), Change::Types(ty, bt));
            return;
        }

        let (sa, sb) = (a.shape(), b.shape());
        if let (Some(pa), Some(pb)) = (sa.identity(), sb.identity()) {
            match self.visit(a.identity_type(), pa, pb) {
                Some(true) => return,
                Some(false) => {
                    trace!(ty = %ty, "uneven cycle");
                    e.emit(Some(a), Some(b), Change::UnevenCycle);
                    return;
                }
                None => {}
            }
        }

        let mut transformed = None;
        if xform_ok && self.hooks {
            if let Some(hook) = self.config.hooks.transform(ty) {
                if let (Some(ax), Some(bx)) = (hook.apply(a), hook.apply(b)) {
                    trace!(ty = %ty, "applied transform");
                    if self.equal(&*ax, &*bx) {
                        return;
                    }
                    transformed = Some((ax, bx));
                }
            }
        }

        if self.hooks {
            if let Some(hook) = self.config.hooks.format(ty) {
                if !self.equal(a, b) {
                    if let Some(text) = hook.render(a, b) {
                        trace!(ty = %ty, "applied format");
                        e.emit(Some(a), Some(b), Change::Custom(text));
                        return;
                    }
                }
            }
        }

        if !self.dispatch(e, a, b, sa, sb, want_type) {
            return;
        }

        // The transformed values differ, or the walk would have stopped at
        // the transform. Make sure the caller sees something, then show how.
        if let Some((ax, bx)) = transformed {
            if !e.did_emit() {
                e.emit(Some(a), Some(b), Change::TransformedDiffer);
                let mut sub = e.sub(Segment::Transformed);
                self.fork(self.hooks)
                    .walk(&mut *sub, Some(&*ax), Some(&*bx), false, true);
            }
        }
    }

    /// Category-specific comparison of two values of the same type. Returns
    /// false when the node is finished and no post-processing may follow.
    fn dispatch(
        &mut self,
        e: &mut dyn Emitter,
        a: &dyn Reflect,
        b: &dyn Reflect,
        sa: Shape<'_>,
        sb: Shape<'_>,
        want_type: bool,
    ) -> bool {
        let values = Change::Values { want_type };
        match (sa, sb) {
            (Shape::Array(xs), Shape::Array(ys)) => self.walk_elems(e, &xs, &ys),
            (Shape::Struct(xs), Shape::Struct(ys)) => {
                for (x, y) in xs.iter().zip(&ys) {
                    let mut sub = e.sub(Segment::Field(x.name));
                    self.walk(&mut *sub, Some(x.value), Some(y.value), true, false);
                }
            }
            (Shape::Func(x), Shape::Func(y)) => {
                if !self.config.equal_funcs && (x.is_some() || y.is_some()) {
                    e.emit(Some(a), Some(b), values);
                }
            }
            (Shape::Interface(x), Shape::Interface(y)) => {
                let same = matches!(
                    (&x, &y),
                    (Some(x), Some(y)) if x.addr != 0 && x.addr == y.addr
                );
                if !same {
                    let x = x.as_ref().map(|p| &*p.target);
                    let y = y.as_ref().map(|p| &*p.target);
                    self.walk(e, x, y, true, true);
                }
            }
            (Shape::Map(x), Shape::Map(y)) => match (x, y) {
                (None, None) => {}
                (Some(x), Some(y)) => {
                    if x.addr != y.addr {
                        self.walk_map(e, x, y);
                    }
                }
                _ => e.emit(Some(a), Some(b), values),
            },
            (Shape::Ptr(x), Shape::Ptr(y)) => match (x, y) {
                (None, None) => {}
                (Some(x), Some(y)) => {
                    if x.addr == 0 || x.addr != y.addr {
                        self.walk(e, Some(&*x.target), Some(&*y.target), true, want_type);
                    }
                }
                _ => e.emit(Some(a), Some(b), values),
            },
            (Shape::Slice(x), Shape::Slice(y)) => match (x, y) {
                (None, None) => {}
                (Some(x), Some(y)) => {
                    let (m, n) = (x.items.len(), y.items.len());
                    if m == n && x.addr == y.addr {
                        return true;
                    }
                    if m != n {
                        e.emit(Some(a), Some(b), Change::Length(m, n));
                        return false;
                    }
                    self.walk_elems(e, &x.items, &y.items);
                }
                _ => e.emit(Some(a), Some(b), values),
            },
            (Shape::Cell(x), Shape::Cell(y)) => match (x, y) {
                (Some(x), Some(y)) => self.walk(e, Some(&*x), Some(&*y), true, want_type),
                _ => e.emit(Some(a), Some(b), values),
            },
            (Shape::Bool(x), Shape::Bool(y)) => self.eqtest(e, a, b, x == y, want_type),
            (Shape::Int(x), Shape::Int(y)) => self.eqtest(e, a, b, x == y, want_type),
            (Shape::Uint(x), Shape::Uint(y)) => self.eqtest(e, a, b, x == y, want_type),
            (Shape::Float(x), Shape::Float(y)) => self.eqtest(e, a, b, x == y, want_type),
            (Shape::Complex(xr, xi), Shape::Complex(yr, yi)) => {
                self.eqtest(e, a, b, xr == yr && xi == yi, want_type)
            }
            (Shape::Str(x), Shape::Str(y)) => {
                if x != y {
                    e.emit(Some(a), Some(b), Change::Values { want_type: false });
                }
            }
            (Shape::Addr(x), Shape::Addr(y)) => self.eqtest(e, a, b, x == y, want_type),
            (sa, sb) => panic!(
                "reflect-diff: type {} reflected as both {} and {}",
                a.reflect_type(),
                sa.kind(),
                sb.kind()
            ),
        }
        true
    }

    fn walk_elems(&mut self, e: &mut dyn Emitter, xs: &[&dyn Reflect], ys: &[&dyn Reflect]) {
        for (i, (x, y)) in xs.iter().zip(ys).enumerate() {
            let mut sub = e.sub(Segment::Index(i));
            self.walk(&mut *sub, Some(*x), Some(*y), true, false);
        }
    }

    fn walk_map(&mut self, e: &mut dyn Emitter, x: MapRef<'_>, y: MapRef<'_>) {
        let (only_a, both, only_b) = key_diff(&x, &y);
        for k in only_a {
            e.sub(Segment::Key(k))
                .emit(x.map.get(k), None, Change::Removed);
        }
        for k in both {
            let mut sub = e.sub(Segment::Key(k));
            self.walk(&mut *sub, x.map.get(k), y.map.get(k), true, false);
        }
        for k in only_b {
            e.sub(Segment::Key(k))
                .emit(None, y.map.get(k), Change::Added);
        }
    }

    fn eqtest(&self, e: &mut dyn Emitter, a: &dyn Reflect, b: &dyn Reflect, same: bool, want_type: bool) {
        if !same {
            e.emit(Some(a), Some(b), Change::Values { want_type });
        }
    }

    /// Whether `a` and `b` are equal under the default rules, without
    /// touching this run's tracker or emitting anything.
    pub(crate) fn equal(&self, a: &dyn Reflect, b: &dyn Reflect) -> bool {
        let mut counter = CountEmitter::default();
        self.fork(false)
            .walk(&mut counter, Some(a), Some(b), true, true);
        !counter.did_emit()
    }
}

/// Partition the keys of two maps into A-only, shared and B-only, each in
/// `cmp_values` order.
fn key_diff<'m>(
    x: &MapRef<'m>,
    y: &MapRef<'m>,
) -> (Vec<&'m dyn Reflect>, Vec<&'m dyn Reflect>, Vec<&'m dyn Reflect>) {
    let (both, only_a): (Vec<_>, Vec<_>) = x
        .map
        .entries()
        .into_iter()
        .map(|(k, _)| k)
        .partition(|k| y.map.get(*k).is_some());
    let only_b = y
        .map
        .entries()
        .into_iter()
        .map(|(k, _)| k)
        .filter(|k| x.map.get(*k).is_none())
        .collect::<Vec<_>>();
    let sort = |keys: Vec<&'m dyn Reflect>| {
        keys.into_iter()
            .sorted_by(|p, q| cmp_values(*p, *q))
            .collect::<Vec<_>>()
    };
    (sort(only_a), sort(both), sort(only_b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiffOption;
    use crate::emitter::{Collector, TextEmitter};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn run(config: &Config, a: &dyn Reflect, b: &dyn Reflect) -> Vec<(String, String)> {
        let mut collector = Collector::default();
        {
            let mut root = TextEmitter::new(&mut collector);
            Differ::new(config).walk(&mut root, Some(a), Some(b), true, true);
        }
        collector
            .reports
            .into_iter()
            .map(|r| (r.path, r.message))
            .collect()
    }

    fn pair(path: &str, message: &str) -> (String, String) {
        (path.to_string(), message.to_string())
    }

    #[test]
    fn top_level_scalars_carry_types() {
        let config = Config::default();
        assert_eq!(run(&config, &1i32, &2i32), vec![pair("", "i32(1) != i32(2)")]);
        assert_eq!(run(&config, &1i32, &1i64), vec![pair("", "i32 != i64")]);
        assert!(run(&config, &"x".to_string(), &"x".to_string()).is_empty());
    }

    #[test]
    fn nested_elements_drop_types() {
        let config = Config::default();
        let diffs = run(&config, &[1u8, 2, 3], &[1u8, 5, 3]);
        assert_eq!(diffs, vec![pair("[1]", "2 != 5")]);
    }

    #[test]
    fn slices_of_different_length_report_once() {
        let config = Config::default();
        let diffs = run(&config, &vec![1, 2], &vec![9, 9, 9]);
        assert_eq!(diffs, vec![pair("", "{len 2} != {len 3}")]);
    }

    #[test]
    fn maps_partition_keys() {
        let config = Config::default();
        let a = BTreeMap::from([("a", 1), ("b", 2), ("c", 3)]);
        let b = BTreeMap::from([("a", 1), ("c", 4), ("d", 5)]);
        assert_eq!(
            run(&config, &a, &b),
            vec![
                pair("[\"b\"]", "(removed)"),
                pair("[\"c\"]", "3 != 4"),
                pair("[\"d\"]", "(added) 5"),
            ]
        );
    }

    #[test]
    fn identical_references_short_circuit() {
        let config = Config::default();
        let shared = std::rc::Rc::new(f64::NAN);
        assert!(run(&config, &shared, &shared.clone()).is_empty());
        assert_eq!(run(&config, &f64::NAN, &f64::NAN).len(), 1);
    }

    #[test]
    fn option_nilness_differs() {
        let config = Config::default();
        let diffs = run(&config, &None::<Box<i32>>, &Some(Box::new(1)));
        assert_eq!(diffs, vec![pair("", "Option<Box<i32>>(nil) != &i32(1)")]);
    }

    #[test]
    fn functions_compare_by_nilness_unless_ignored() {
        fn one() -> i32 {
            1
        }
        let f: fn() -> i32 = one;
        assert_eq!(run(&Config::default(), &f, &f).len(), 1);
        let lax = Config::new([DiffOption::EqualFuncs(true)]);
        assert!(run(&lax, &f, &f).is_empty());
    }

    #[test]
    fn equality_check_ignores_hooks_and_tracker() {
        let config = Config::new([DiffOption::transform(|_: &i32| 0i32)]);
        let differ = Differ::new(&config);
        assert!(!differ.equal(&1i32, &2i32));
        assert!(differ.a_seen.is_empty());
        assert!(run(&config, &1i32, &2i32).is_empty());
    }

    #[test]
    fn format_sees_original_values() {
        let config = Config::new([
            DiffOption::transform(|s: &String| s.len()),
            DiffOption::format(|a: &String, b: &String| format!("{a} vs {b}")),
        ]);
        assert!(run(&config, &"ab".to_string(), &"cd".to_string()).is_empty());
        assert_eq!(
            run(&config, &"ab".to_string(), &"abc".to_string()),
            vec![pair("", "ab vs abc")]
        );
    }

    #[test]
    #[should_panic(expected = "reflected as both")]
    fn inconsistent_shapes_panic() {
        struct Fickle(bool);
        impl Reflect for Fickle {
            fn shape(&self) -> Shape<'_> {
                if self.0 {
                    Shape::Bool(true)
                } else {
                    Shape::Int(0)
                }
            }
        }
        run(&Config::default(), &Fickle(true), &Fickle(false));
    }
}
