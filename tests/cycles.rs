use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use reflect_diff as rd;
use reflect_diff::{reflect_struct, Reflect};

struct Node {
    value: i32,
    next: RefCell<Option<Rc<Node>>>,
}
reflect_struct!(Node { value, next });

/// Nodes linked in a ring, returned from the first. Leaks; fine for tests.
fn ring(values: &[i32]) -> Rc<Node> {
    let nodes: Vec<Rc<Node>> = values
        .iter()
        .map(|v| {
            Rc::new(Node {
                value: *v,
                next: RefCell::new(None),
            })
        })
        .collect();
    for (i, node) in nodes.iter().enumerate() {
        *node.next.borrow_mut() = Some(Rc::clone(&nodes[(i + 1) % nodes.len()]));
    }
    Rc::clone(&nodes[0])
}

/// Like `Node`, but linked through trait objects.
struct DynNode {
    value: i32,
    next: RefCell<Option<Rc<dyn Reflect>>>,
}
reflect_struct!(DynNode { value, next });

fn dyn_ring(values: &[i32]) -> Rc<DynNode> {
    let nodes: Vec<Rc<DynNode>> = values
        .iter()
        .map(|v| {
            Rc::new(DynNode {
                value: *v,
                next: RefCell::new(None),
            })
        })
        .collect();
    for (i, node) in nodes.iter().enumerate() {
        let next: Rc<dyn Reflect> = Rc::<DynNode>::clone(&nodes[(i + 1) % nodes.len()]);
        *node.next.borrow_mut() = Some(next);
    }
    Rc::clone(&nodes[0])
}

#[test]
fn test_even_cycles_are_equal() {
    assert!(rd::lines(&ring(&[1]), &ring(&[1]), []).is_empty());
    assert!(rd::lines(&ring(&[1, 2, 3]), &ring(&[1, 2, 3]), []).is_empty());
}

#[test]
fn test_uneven_cycle_is_reported_once() {
    let lines = rd::lines(&ring(&[1]), &ring(&[1, 1]), []);
    assert_eq!(lines, vec![".next: uneven cycle\n"]);
}

#[test]
fn test_cycles_through_trait_objects() {
    assert!(rd::lines(&dyn_ring(&[1]), &dyn_ring(&[1]), []).is_empty());
    assert!(rd::lines(&dyn_ring(&[1, 2]), &dyn_ring(&[1, 2]), []).is_empty());
    assert_eq!(
        rd::lines(&dyn_ring(&[1]), &dyn_ring(&[1, 1]), []),
        vec![".next.next: uneven cycle\n"]
    );
    assert_eq!(
        rd::lines(&dyn_ring(&[1, 2]), &dyn_ring(&[1, 3]), []),
        vec![".next.value: 2 != 3\n"]
    );
}

#[test]
fn test_values_inside_cycles_are_compared() {
    let lines = rd::lines(&ring(&[1, 2]), &ring(&[1, 5]), []);
    assert_eq!(lines, vec![".next.value: 2 != 5\n"]);
}

#[test]
fn test_shared_reference_against_distinct_ones() {
    let shared = Rc::new(7);
    let a = vec![Rc::clone(&shared), Rc::clone(&shared)];
    let b = vec![Rc::new(7), Rc::new(7)];
    assert_eq!(rd::lines(&a, &b, []), vec!["[1]: uneven cycle\n"]);
    assert!(rd::lines(&a, &a.clone(), []).is_empty());
}

#[test]
fn test_rendering_a_cycle_terminates() {
    let node = ring(&[1]);
    let full = rd::format_full(Some(&node)).to_string();
    assert!(full.contains("<cycle>"), "got {full}");
    let short = rd::format_short(Some(&node), true).to_string();
    assert_eq!(short, "&Node{value:1, ...}");

    let node = dyn_ring(&[1]);
    let full = rd::format_full(Some(&node)).to_string();
    assert!(full.contains("<cycle>"), "got {full}");
}

#[test]
fn test_mutably_borrowed_cell_is_reported() {
    let a = RefCell::new(1);
    let b = RefCell::new(1);
    let _guard = b.borrow_mut();
    assert_eq!(rd::lines(&a, &b, []), vec!["i32(1) != <borrowed>\n"]);
}
