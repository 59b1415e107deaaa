//! Structural equality for value graphs.

use std::collections::HashMap;

use crate::error::Result;
use crate::shape::{Registry, Shape};
use crate::{Heap, NodeId, Value};

/// Compares two value graphs through a declared shape.
///
/// Besides equal data, reference topology has to match: the first time a
/// pair of nodes is compared they are paired up, and every later reference
/// must respect that pairing. Two graphs with the same cycle but one shared
/// node duplicated are therefore not equal, and cyclic graphs compare in
/// finite time. Only fields the shape declares are compared. `NaN` equals
/// `NaN`.
///
/// # Examples
///
/// ```
/// use graphjson::{graph_equal, Heap, Registry, Shape, Value};
///
/// let registry = Registry::new();
/// let shape = Shape::seq(Shape::String);
/// let a = Value::seq([Value::str("x")]);
/// let heap = Heap::new();
/// assert!(graph_equal(&registry, &shape, (&a, &heap), (&a.clone(), &heap)).unwrap());
/// assert!(!graph_equal(&registry, &shape, (&a, &heap), (&Value::Seq(None), &heap)).unwrap());
/// ```
pub fn graph_equal(
    registry: &Registry,
    shape: &Shape,
    left: (&Value, &Heap),
    right: (&Value, &Heap),
) -> Result<bool> {
    GraphEq {
        registry,
        left: left.1,
        right: right.1,
        forward: HashMap::new(),
        backward: HashMap::new(),
    }
    .eq(shape, left.0, right.0)
}

struct GraphEq<'a> {
    registry: &'a Registry,
    left: &'a Heap,
    right: &'a Heap,
    forward: HashMap<NodeId, NodeId>,
    backward: HashMap<NodeId, NodeId>,
}

impl GraphEq<'_> {
    fn eq(&mut self, shape: &Shape, a: &Value, b: &Value) -> Result<bool> {
        let registry = self.registry;
        Ok(match (registry.resolve(shape)?, a, b) {
            (Shape::Float(_), Value::Float(x), Value::Float(y)) => {
                x == y || (x.is_nan() && y.is_nan())
            }
            (Shape::Array { elem, .. }, Value::Array(xs), Value::Array(ys))
            | (Shape::Seq(elem), Value::Seq(Some(xs)), Value::Seq(Some(ys))) => {
                if xs.len() != ys.len() {
                    return Ok(false);
                }
                for (x, y) in xs.iter().zip(ys) {
                    if !self.eq(elem, x, y)? {
                        return Ok(false);
                    }
                }
                true
            }
            (Shape::Record(record), Value::Record(xs), Value::Record(ys)) => {
                let left = registry.active_fields(record, Some(xs))?;
                let right = registry.active_fields(record, Some(ys))?;
                if left.len() != right.len() {
                    return Ok(false);
                }
                for (field, other) in left.into_iter().zip(right) {
                    if field.name != other.name {
                        return Ok(false);
                    }
                    match (xs.get(&field.name), ys.get(&field.name)) {
                        (Some(x), Some(y)) => {
                            if !self.eq(&field.shape, x, y)? {
                                return Ok(false);
                            }
                        }
                        (None, None) => {}
                        _ => return Ok(false),
                    }
                }
                true
            }
            (Shape::Ref(target), Value::Ref(Some(x)), Value::Ref(Some(y))) => {
                match (self.forward.get(x), self.backward.get(y)) {
                    (Some(paired), _) => return Ok(paired == y),
                    (None, Some(_)) => return Ok(false),
                    (None, None) => {}
                }
                self.forward.insert(*x, *y);
                self.backward.insert(*y, *x);
                let left = self.left;
                let right = self.right;
                match (left.get(*x), right.get(*y)) {
                    (Some(x), Some(y)) => self.eq(target, x, y)?,
                    (None, None) => true,
                    _ => false,
                }
            }
            (_, a, b) => a == b,
        })
    }
}
