//! Difference records and the emitters that deliver them.
//!
//! The walker reports through an [`Emitter`], asking it for a child emitter at
//! every descent step. [`TextEmitter`] tracks the path and hands finished
//! [`Difference`] records to a [`Sink`]; [`CountEmitter`] only counts, for
//! silent equality checks.

use std::fmt;

use serde::Serialize;

use crate::config::Level;
use crate::reflect::{Reflect, Type};
use crate::render::{format_full, format_short};

/// What kind of divergence was found.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Both values, rendered short: `a != b`.
    Values { want_type: bool },
    /// Dynamic types differ.
    Types(Type, Type),
    UnevenCycle,
    /// Sequence lengths differ.
    Length(usize, usize),
    /// Map key present only in A.
    Removed,
    /// Map key present only in B.
    Added,
    /// Text produced by a format hook.
    Custom(String),
    /// Structurally equal values whose transforms differ.
    TransformedDiffer,
}

/// One reported point of divergence.
pub struct Difference<'a> {
    pub path: &'a str,
    pub a: Option<&'a dyn Reflect>,
    pub b: Option<&'a dyn Reflect>,
    pub change: &'a Change,
}

impl Difference<'_> {
    /// Description without the path.
    pub fn message(&self) -> String {
        match self.change {
            Change::Values { want_type } => format!(
                "{} != {}",
                format_short(self.a, *want_type),
                format_short(self.b, *want_type)
            ),
            Change::Types(a, b) => format!("{a} != {b}"),
            Change::UnevenCycle => "uneven cycle".to_string(),
            Change::Length(m, n) => format!("{{len {m}}} != {{len {n}}}"),
            Change::Removed => "(removed)".to_string(),
            Change::Added => format!("(added) {}", format_short(self.b, false)),
            Change::Custom(text) => text.clone(),
            Change::TransformedDiffer => "(transformed values differ)".to_string(),
        }
    }

    /// One newline-terminated line at the given verbosity.
    pub fn render(&self, level: Level) -> String {
        let prefix = if self.path.is_empty() {
            String::new()
        } else {
            format!("{}: ", self.path)
        };
        match level {
            Level::Auto => format!("{prefix}{}\n", self.message()),
            Level::PathOnly => format!("{}\n", self.path),
            Level::Full => format!(
                "{prefix}{} != {}\n",
                format_full(self.a),
                format_full(self.b)
            ),
        }
    }
}

impl fmt::Debug for Difference<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Difference")
            .field("path", &self.path)
            .field("change", self.change)
            .finish()
    }
}

/// Owned, serializable form of a [`Difference`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub path: String,
    pub message: String,
}

/// Final destination of differences.
pub trait Sink {
    fn report(&mut self, diff: &Difference<'_>);
}

/// Renders each difference as a line and passes it to a callback.
pub struct LineSink<F> {
    level: Level,
    f: F,
}

impl<F: FnMut(&str)> LineSink<F> {
    pub fn new(level: Level, f: F) -> Self {
        Self { level, f }
    }
}

impl<F: FnMut(&str)> Sink for LineSink<F> {
    fn report(&mut self, diff: &Difference<'_>) {
        (self.f)(&diff.render(self.level));
    }
}

/// Accumulates [`Report`]s.
#[derive(Debug, Default)]
pub struct Collector {
    pub reports: Vec<Report>,
}

impl Sink for Collector {
    fn report(&mut self, diff: &Difference<'_>) {
        self.reports.push(Report {
            path: diff.path.to_string(),
            message: diff.message(),
        });
    }
}

/// One step from a value to a part of it.
pub(crate) enum Segment<'a> {
    Index(usize),
    Field(&'static str),
    Key(&'a dyn Reflect),
    /// From a value to its transformed image.
    Transformed,
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Index(i) => write!(f, "[{i}]"),
            Segment::Field(name) => write!(f, ".{name}"),
            Segment::Key(key) => write!(f, "[{}]", format_short(Some(*key), false)),
            Segment::Transformed => f.write_str("->"),
        }
    }
}

pub(crate) trait Emitter {
    fn emit(&mut self, a: Option<&dyn Reflect>, b: Option<&dyn Reflect>, change: Change);
    /// Emitter for a part of the current value; its emissions count as
    /// emissions of `self`.
    fn sub(&mut self, segment: Segment<'_>) -> Box<dyn Emitter + '_>;
    fn did_emit(&self) -> bool;
}

impl<E: Emitter + ?Sized> Emitter for &mut E {
    fn emit(&mut self, a: Option<&dyn Reflect>, b: Option<&dyn Reflect>, change: Change) {
        (**self).emit(a, b, change)
    }

    fn sub(&mut self, segment: Segment<'_>) -> Box<dyn Emitter + '_> {
        (**self).sub(segment)
    }

    fn did_emit(&self) -> bool {
        (**self).did_emit()
    }
}

pub(crate) struct TextEmitter<'s> {
    path: String,
    did: bool,
    out: &'s mut dyn Sink,
}

impl<'s> TextEmitter<'s> {
    pub(crate) fn new(out: &'s mut dyn Sink) -> Self {
        Self {
            path: String::new(),
            did: false,
            out,
        }
    }
}

impl Sink for TextEmitter<'_> {
    fn report(&mut self, diff: &Difference<'_>) {
        self.did = true;
        self.out.report(diff);
    }
}

impl Emitter for TextEmitter<'_> {
    fn emit(&mut self, a: Option<&dyn Reflect>, b: Option<&dyn Reflect>, change: Change) {
        self.did = true;
        let diff = Difference {
            path: &self.path,
            a,
            b,
            change: &change,
        };
        self.out.report(&diff);
    }

    fn sub(&mut self, segment: Segment<'_>) -> Box<dyn Emitter + '_> {
        let path = format!("{}{}", self.path, segment);
        Box::new(TextEmitter {
            path,
            did: false,
            out: self,
        })
    }

    fn did_emit(&self) -> bool {
        self.did
    }
}

#[derive(Debug, Default)]
pub(crate) struct CountEmitter {
    n: usize,
}

impl Emitter for CountEmitter {
    fn emit(&mut self, _a: Option<&dyn Reflect>, _b: Option<&dyn Reflect>, _change: Change) {
        self.n += 1;
    }

    fn sub(&mut self, _segment: Segment<'_>) -> Box<dyn Emitter + '_> {
        Box::new(self)
    }

    fn did_emit(&self) -> bool {
        self.n > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn render_per_level() {
        let change = Change::Values { want_type: false };
        let diff = Difference {
            path: ".a[1]",
            a: Some(&1i32),
            b: Some(&2i32),
            change: &change,
        };
        assert_eq!(diff.render(Level::Auto), ".a[1]: 1 != 2\n");
        assert_eq!(diff.render(Level::PathOnly), ".a[1]\n");
        assert_eq!(diff.render(Level::Full), ".a[1]: i32(1) != i32(2)\n");
    }

    #[test]
    fn root_difference_has_no_prefix() {
        let change = Change::Types(Type::of::<i32>(), Type::of::<u8>());
        let diff = Difference {
            path: "",
            a: Some(&1i32),
            b: Some(&1u8),
            change: &change,
        };
        assert_eq!(diff.render(Level::Auto), "i32 != u8\n");
    }

    #[test]
    fn added_shows_new_value() {
        let change = Change::Added;
        let diff = Difference {
            path: "[\"b\"]",
            a: None,
            b: Some(&2i32),
            change: &change,
        };
        assert_eq!(diff.message(), "(added) 2");
        assert_eq!(
            Difference { change: &Change::Length(2, 3), ..diff }.message(),
            "{len 2} != {len 3}"
        );
    }

    #[test]
    fn child_emission_marks_parent() {
        let mut collector = Collector::default();
        let mut root = TextEmitter::new(&mut collector);
        {
            let mut field = root.sub(Segment::Field("x"));
            let mut index = field.sub(Segment::Index(3));
            index.emit(Some(&1u8), Some(&2u8), Change::Values { want_type: false });
            assert!(index.did_emit());
            drop(index);
            assert!(field.did_emit());
        }
        assert!(root.did_emit());
        assert_eq!(
            collector.reports,
            vec![Report {
                path: ".x[3]".to_string(),
                message: "1 != 2".to_string()
            }]
        );
    }

    #[test]
    fn count_emitter_shares_its_count() {
        let mut counter = CountEmitter::default();
        {
            let mut child = counter.sub(Segment::Key(&"k"));
            child.emit(None, None, Change::Removed);
        }
        assert!(counter.did_emit());
    }
}
