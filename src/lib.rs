pub mod errors;
pub mod config;
pub mod hooks;
mod reflect;
mod render;
mod comparison;
mod emitter;
mod engine;

use std::panic::Location;

use tracing::{debug, info};

use emitter::{Emitter, TextEmitter};
use engine::Differ;

pub use comparison::cmp_values;
pub use config::{Config, DiffOption, Level};
pub use emitter::{Change, Collector, Difference, LineSink, Report, Sink};
pub use errors::{DiffError, Result};
pub use hooks::Registry;
pub use reflect::{
    AsAny, Complex64, Field, Handle, Kind, MapAccess, MapRef, Pointee, Reflect, Shape, SliceRef,
    Type,
};
pub use render::{format_full, format_short, Formatted};

/// Compares values under one configuration. The configuration is read-only,
/// so a `Comparator` can be reused and shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    config: Config,
}

impl Comparator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Deliver every difference between `a` and `b` to `sink`. Returns
    /// whether any was found.
    pub fn run(&self, sink: &mut dyn Sink, a: &dyn Reflect, b: &dyn Reflect) -> bool {
        let mut root = TextEmitter::new(sink);
        Differ::new(&self.config).walk(&mut root, Some(a), Some(b), true, true);
        let differs = root.did_emit();
        debug!(
            ty = %a.reflect_type(),
            level = %self.config.level,
            differs,
            "comparison finished"
        );
        differs
    }

    /// Call `f` with each difference line, newline included.
    pub fn each(&self, f: impl FnMut(&str), a: &dyn Reflect, b: &dyn Reflect) {
        let mut sink = LineSink::new(self.config.level, f);
        self.run(&mut sink, a, b);
    }

    /// Difference lines, in emission order.
    pub fn lines(&self, a: &dyn Reflect, b: &dyn Reflect) -> Vec<String> {
        let mut out = Vec::new();
        self.each(|line| out.push(line.to_string()), a, b);
        out
    }

    pub fn reports(&self, a: &dyn Reflect, b: &dyn Reflect) -> Vec<Report> {
        let mut collector = Collector::default();
        self.run(&mut collector, a, b);
        collector.reports
    }

    /// Whether `a` and `b` have no differences at all.
    pub fn equal(&self, a: &dyn Reflect, b: &dyn Reflect) -> bool {
        !self.run(&mut Collector::default(), a, b)
    }
}

/// Compare `a` and `b`, calling `f` with each difference line.
///
/// Options apply on top of `Config::default()`, later ones winning.
///
/// ```
/// let mut out = String::new();
/// reflect_diff::each(|line| out.push_str(line), &vec![1, 2], &vec![1, 3], []);
/// assert_eq!(out, "[1]: 2 != 3\n");
/// ```
pub fn each(
    f: impl FnMut(&str),
    a: &dyn Reflect,
    b: &dyn Reflect,
    opts: impl IntoIterator<Item = DiffOption>,
) {
    Comparator::new(Config::new(opts)).each(f, a, b);
}

/// Convenience: difference lines as a vector.
pub fn lines(
    a: &dyn Reflect,
    b: &dyn Reflect,
    opts: impl IntoIterator<Item = DiffOption>,
) -> Vec<String> {
    Comparator::new(Config::new(opts)).lines(a, b)
}

/// Destination for [`log`]: receives each line with the location of the
/// `log` call that produced it.
pub trait Outputter {
    fn output(&mut self, caller: &'static Location<'static>, line: &str);
}

/// Emits each line as a `tracing` event at INFO, tagged with the caller's
/// file and line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingOutput;

impl Outputter for TracingOutput {
    fn output(&mut self, caller: &'static Location<'static>, line: &str) {
        info!(
            file = caller.file(),
            line = caller.line(),
            "{}",
            line.trim_end_matches('\n')
        );
    }
}

/// Compare `a` and `b`, passing each difference line to `out` together with
/// the location of this call.
#[track_caller]
pub fn log(
    out: &mut dyn Outputter,
    a: &dyn Reflect,
    b: &dyn Reflect,
    opts: impl IntoIterator<Item = DiffOption>,
) {
    let caller = Location::caller();
    each(|line| out.output(caller, line), a, b, opts);
}

/// Panic, listing every difference, unless `a` and `b` are equal. The panic
/// points at the caller.
///
/// ```should_panic
/// reflect_diff::assert_same(&1u8, &2u8, []);
/// ```
#[track_caller]
pub fn assert_same(a: &dyn Reflect, b: &dyn Reflect, opts: impl IntoIterator<Item = DiffOption>) {
    let found = lines(a, b, opts);
    if !found.is_empty() {
        panic!("values differ:\n{}", found.concat());
    }
}
