//! Textual rendering of reflected values.
//!
//! Two forms are produced. The short form is a single line, limited to two
//! levels of nested composites, and shows only the first element, field or
//! entry of each composite. The full form has no practical depth limit and
//! spreads composites with more than one member over several lines, with
//! member labels aligned in a column.
//!
//! ```
//! use reflect_diff::{format_full, format_short};
//!
//! let v = vec![vec![1, 2], vec![3]];
//! assert_eq!(format_short(Some(&v), true).to_string(), "Vec<Vec<i32>>{{...}, ...}");
//! assert_eq!(format_full(Some(&v)).to_string(), "Vec<Vec<i32>>{\n    {\n        1,\n        2,\n    },\n    {3},\n}");
//! ```

use std::any::TypeId;
use std::fmt::{self, Write};

use itertools::Itertools;

use crate::comparison::cmp_values;
use crate::reflect::{kind_through_cells, Kind, Reflect, Shape, Type};

const INDENT: &str = "    ";

/// Address and identity type of each reference being rendered.
type Active = Vec<(usize, TypeId)>;
const SHORT_DEPTH: usize = 2;
const FULL_DEPTH: usize = 100_000_000;

/// Short, single-line rendering of `v`. `None` renders as `nil`.
pub fn format_short(v: Option<&dyn Reflect>, want_type: bool) -> Formatted<'_> {
    Formatted {
        root: v,
        options: Formatter {
            want_type,
            full: false,
            allow_depth: SHORT_DEPTH,
        },
    }
}

/// Full, multi-line rendering of `v`, always annotated with its type.
pub fn format_full(v: Option<&dyn Reflect>) -> Formatted<'_> {
    Formatted {
        root: v,
        options: Formatter {
            want_type: true,
            full: true,
            allow_depth: FULL_DEPTH,
        },
    }
}

/// A value paired with rendering options; rendered through `Display`.
pub struct Formatted<'a> {
    root: Option<&'a dyn Reflect>,
    options: Formatter,
}

impl fmt::Display for Formatted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        let mut active = Vec::new();
        self.options.write_to(
            &mut out,
            self.root,
            self.options.want_type,
            1,
            &mut active,
        )?;
        f.write_str(&out)
    }
}

#[derive(Clone, Copy)]
struct Formatter {
    want_type: bool,
    full: bool,
    allow_depth: usize,
}

impl Formatter {
    /// `active` holds the identities of the references whose targets are
    /// being rendered; meeting one again means a cycle.
    fn write_to(
        &self,
        w: &mut String,
        v: Option<&dyn Reflect>,
        want_type: bool,
        depth: usize,
        active: &mut Active,
    ) -> fmt::Result {
        let Some(v) = v else {
            w.push_str("nil");
            return Ok(());
        };
        let ty = v.reflect_type();
        match v.shape() {
            Shape::Array(items) => self.write_seq(w, ty, &items, want_type, depth, active)?,
            Shape::Slice(Some(slice)) => {
                self.write_seq(w, ty, &slice.items, want_type, depth, active)?
            }
            Shape::Struct(fields) => {
                if want_type {
                    w.push_str(&ty.name());
                }
                if depth >= self.allow_depth && !fields.is_empty() {
                    w.push_str("{...}");
                    return Ok(());
                }
                w.push('{');
                if self.full && fields.len() > 1 {
                    w.push('\n');
                    let mut rows = Vec::with_capacity(fields.len());
                    for field in &fields {
                        let mut value = String::new();
                        self.write_to(&mut value, Some(field.value), false, depth + 1, active)?;
                        rows.push((format!("{}:", field.name), value));
                    }
                    write_table(w, &rows);
                } else if let Some(field) = fields.first() {
                    write!(w, "{}:", field.name)?;
                    self.write_to(w, Some(field.value), false, depth + 1, active)?;
                    if fields.len() > 1 {
                        w.push_str(", ...");
                    }
                }
                w.push('}');
            }
            Shape::Map(Some(map)) => {
                let entries = map
                    .map
                    .entries()
                    .into_iter()
                    .sorted_by(|x, y| cmp_values(x.0, y.0))
                    .collect::<Vec<_>>();
                if want_type {
                    w.push_str(&ty.name());
                }
                if depth >= self.allow_depth && !entries.is_empty() {
                    w.push_str("{...}");
                    return Ok(());
                }
                w.push('{');
                if self.full && entries.len() > 1 {
                    w.push('\n');
                    let mut rows = Vec::with_capacity(entries.len());
                    for (key, value) in &entries {
                        let mut label = String::new();
                        self.write_to(&mut label, Some(*key), false, 0, active)?;
                        label.push(':');
                        let mut text = String::new();
                        self.write_to(&mut text, Some(*value), false, depth + 1, active)?;
                        rows.push((label, text));
                    }
                    write_table(w, &rows);
                } else if let Some((key, value)) = entries.first() {
                    self.write_to(w, Some(*key), false, 0, active)?;
                    w.push(':');
                    self.write_to(w, Some(*value), false, depth + 1, active)?;
                    if entries.len() > 1 {
                        w.push_str(", ...");
                    }
                }
                w.push('}');
            }
            Shape::Ptr(Some(pointee)) => {
                let target = &*pointee.target;
                let inner = kind_through_cells(target);
                if want_type || inner != Kind::Struct {
                    w.push('&');
                }
                let key = (pointee.addr, v.identity_type().id());
                if pointee.addr != 0 && active.contains(&key) {
                    w.push_str("<cycle>");
                    return Ok(());
                }
                // Two or more pointers in a row are confusing without types.
                let want_type = want_type || inner == Kind::Ptr;
                active.push(key);
                let result = self.write_to(w, Some(target), want_type, depth, active);
                active.pop();
                result?;
            }
            Shape::Func(Some(_)) => write!(w, "{ty} {{...}}")?,
            Shape::Slice(None) | Shape::Map(None) | Shape::Ptr(None) | Shape::Func(None) => {
                write_typed_nil(w, ty, want_type)
            }
            Shape::Interface(None) => w.push_str("nil"),
            Shape::Interface(Some(boxed)) => {
                let key = (boxed.addr, v.identity_type().id());
                if boxed.addr != 0 && active.contains(&key) {
                    w.push_str("<cycle>");
                    return Ok(());
                }
                active.push(key);
                let result = self.write_to(w, Some(&*boxed.target), true, depth, active);
                active.pop();
                result?;
            }
            Shape::Cell(Some(inner)) => {
                self.write_to(w, Some(&*inner), want_type, depth, active)?;
            }
            Shape::Cell(None) => w.push_str("<borrowed>"),
            Shape::Bool(b) => write_simple(w, ty, &b.to_string(), want_type && !ty.is_builtin()),
            Shape::Int(i) => write_simple(w, ty, &i.to_string(), want_type),
            Shape::Uint(u) => write_simple(w, ty, &u.to_string(), want_type),
            Shape::Float(x) => write_simple(w, ty, &x.to_string(), want_type),
            Shape::Complex(re, im) => {
                write_simple(w, ty, &format!("({re}{im:+}i)"), want_type)
            }
            Shape::Str(s) => write_simple(w, ty, &format!("{s:?}"), want_type && !ty.is_builtin()),
            Shape::Addr(0) => write_typed_nil(w, ty, want_type),
            Shape::Addr(addr) => write!(w, "({ty})({addr:#x})")?,
        }
        Ok(())
    }

    fn write_seq(
        &self,
        w: &mut String,
        ty: Type,
        items: &[&dyn Reflect],
        want_type: bool,
        depth: usize,
        active: &mut Active,
    ) -> fmt::Result {
        if want_type {
            w.push_str(&ty.name());
        }
        if depth >= self.allow_depth && !items.is_empty() {
            w.push_str("{...}");
            return Ok(());
        }
        w.push('{');
        if self.full && items.len() > 1 {
            w.push('\n');
            for item in items {
                let mut cell = String::new();
                self.write_to(&mut cell, Some(*item), false, depth + 1, active)?;
                cell.push(',');
                for line in cell.lines() {
                    w.push_str(INDENT);
                    w.push_str(line);
                    w.push('\n');
                }
            }
        } else if let Some(first) = items.first() {
            self.write_to(w, Some(*first), false, depth + 1, active)?;
            if items.len() > 1 {
                w.push_str(", ...");
            }
        }
        w.push('}');
        Ok(())
    }
}

/// Write `label value,` rows, one per line and indented, padding labels to a
/// shared column. A row whose value spans several lines closes the current
/// alignment block.
fn write_table(w: &mut String, rows: &[(String, String)]) {
    let mut start = 0;
    while start < rows.len() {
        let end = rows[start..]
            .iter()
            .position(|(_, value)| value.contains('\n'))
            .map_or(rows.len(), |i| start + i + 1);
        let block = &rows[start..end];
        let width = block
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(0);
        for (label, value) in block {
            let mut lines = value.lines();
            let first = lines.next().unwrap_or("");
            w.push_str(INDENT);
            w.push_str(label);
            for _ in label.chars().count()..=width {
                w.push(' ');
            }
            w.push_str(first);
            for line in lines {
                w.push('\n');
                w.push_str(INDENT);
                w.push_str(line);
            }
            w.push_str(",\n");
        }
        start = end;
    }
}

fn write_simple(w: &mut String, ty: Type, text: &str, show_type: bool) {
    if show_type {
        w.push_str(&ty.name());
        w.push('(');
    }
    w.push_str(text);
    if show_type {
        w.push(')');
    }
}

fn write_typed_nil(w: &mut String, ty: Type, show_type: bool) {
    if !show_type {
        w.push_str("nil");
        return;
    }
    if ty.needs_parens() {
        w.push('(');
        w.push_str(&ty.name());
        w.push(')');
    } else {
        w.push_str(&ty.name());
    }
    w.push_str("(nil)");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scalars_carry_type_only_on_request() {
        assert_eq!(format_short(Some(&5i32), true).to_string(), "i32(5)");
        assert_eq!(format_short(Some(&5i32), false).to_string(), "5");
        assert_eq!(format_short(Some(&true), true).to_string(), "true");
        assert_eq!(
            format_short(Some(&"hi\n".to_string()), true).to_string(),
            "\"hi\\n\""
        );
        assert_eq!(format_short(Some(&1.5f64), true).to_string(), "f64(1.5)");
    }

    #[test]
    fn absent_and_typed_nil() {
        assert_eq!(format_short(None, true).to_string(), "nil");
        let none: Option<Box<i32>> = None;
        assert_eq!(format_short(Some(&none), true).to_string(), "Option<Box<i32>>(nil)");
        assert_eq!(format_short(Some(&none), false).to_string(), "nil");
        let null: *const i32 = std::ptr::null();
        assert_eq!(format_short(Some(&null), true).to_string(), "(*const i32)(nil)");
    }

    #[test]
    fn pointer_chains_force_types() {
        let p = Box::new(Box::new(3u8));
        assert_eq!(format_short(Some(&p), false).to_string(), "&&u8(3)");
    }

    #[test]
    fn table_aligns_blocks() {
        let rows = vec![
            ("id:".to_string(), "1".to_string()),
            ("name:".to_string(), "\"n\"".to_string()),
        ];
        let mut out = String::new();
        write_table(&mut out, &rows);
        assert_eq!(out, "    id:   1,\n    name: \"n\",\n");
    }

    #[test]
    fn multi_line_rows_end_a_block() {
        let rows = vec![
            ("a:".to_string(), "{\n    1,\n}".to_string()),
            ("bb:".to_string(), "2".to_string()),
        ];
        let mut out = String::new();
        write_table(&mut out, &rows);
        assert_eq!(out, "    a: {\n        1,\n    },\n    bb: 2,\n");
    }
}
