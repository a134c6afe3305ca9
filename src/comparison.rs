use std::cmp::Ordering;

use crate::reflect::{Reflect, Shape};
use crate::render::format_short;

/// Total order over reflected values, used to sort map keys so that rendering
/// and key iteration never depend on hash order.
///
/// Values of the same category compare by content (numbers numerically with
/// NaN first, strings lexically, composites element by element, references by
/// address with nil first). Anything else falls back to its short rendering.
pub fn cmp_values(a: &dyn Reflect, b: &dyn Reflect) -> Ordering {
    match (a.shape(), b.shape()) {
        (Shape::Bool(x), Shape::Bool(y)) => x.cmp(&y),
        (Shape::Int(x), Shape::Int(y)) => x.cmp(&y),
        (Shape::Uint(x), Shape::Uint(y)) => x.cmp(&y),
        (Shape::Float(x), Shape::Float(y)) => cmp_float(x, y),
        (Shape::Complex(xr, xi), Shape::Complex(yr, yi)) => {
            cmp_float(xr, yr).then_with(|| cmp_float(xi, yi))
        }
        (Shape::Str(x), Shape::Str(y)) => x.cmp(y),
        (Shape::Array(xs), Shape::Array(ys)) => cmp_seq(&xs, &ys),
        (Shape::Struct(xs), Shape::Struct(ys)) => {
            let xs: Vec<_> = xs.iter().map(|f| f.value).collect();
            let ys: Vec<_> = ys.iter().map(|f| f.value).collect();
            cmp_seq(&xs, &ys)
        }
        (Shape::Interface(x), Shape::Interface(y)) => match (x, y) {
            (Some(x), Some(y)) => {
                let (x, y) = (&*x.target, &*y.target);
                let (tx, ty) = (x.reflect_type(), y.reflect_type());
                if tx == ty {
                    cmp_values(x, y)
                } else {
                    tx.name().cmp(&ty.name())
                }
            }
            (x, y) => x.is_some().cmp(&y.is_some()),
        },
        (Shape::Cell(Some(x)), Shape::Cell(Some(y))) => cmp_values(&*x, &*y),
        (Shape::Ptr(x), Shape::Ptr(y)) => cmp_addr(x.map(|p| p.addr), y.map(|p| p.addr)),
        (Shape::Func(x), Shape::Func(y)) => cmp_addr(x, y),
        (Shape::Addr(x), Shape::Addr(y)) => x.cmp(&y),
        _ => format_short(Some(a), false)
            .to_string()
            .cmp(&format_short(Some(b), false).to_string()),
    }
}

fn cmp_float(x: f64, y: f64) -> Ordering {
    match x.partial_cmp(&y) {
        Some(ord) => ord,
        None => y.is_nan().cmp(&x.is_nan()),
    }
}

fn cmp_seq(xs: &[&dyn Reflect], ys: &[&dyn Reflect]) -> Ordering {
    xs.iter()
        .zip(ys)
        .map(|(x, y)| cmp_values(*x, *y))
        .find(|ord| ord.is_ne())
        .unwrap_or_else(|| xs.len().cmp(&ys.len()))
}

fn cmp_addr(x: Option<usize>, y: Option<usize>) -> Ordering {
    x.cmp(&y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn numbers_order_numerically() {
        assert_eq!(cmp_values(&2i32, &10i32), Ordering::Less);
        assert_eq!(cmp_values(&2.5f64, &-1.0f64), Ordering::Greater);
        assert_eq!(cmp_values(&f64::NAN, &-1e300f64), Ordering::Less);
        assert_eq!(cmp_values(&f64::NAN, &f64::NAN), Ordering::Equal);
    }

    #[test]
    fn strings_and_tuples_order_lexically() {
        assert_eq!(
            cmp_values(&"apple".to_string(), &"banana".to_string()),
            Ordering::Less
        );
        assert_eq!(cmp_values(&(1, "b"), &(1, "a")), Ordering::Greater);
        assert_eq!(cmp_values(&[1, 2], &[1, 2]), Ordering::Equal);
    }

    #[test]
    fn nil_sorts_first() {
        assert_eq!(cmp_values(&None::<Box<i32>>, &Some(Box::new(0))), Ordering::Less);
    }
}
