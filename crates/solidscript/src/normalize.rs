//! Rewrites a `CSGTerm` DAG into sum-of-products form: a `Union` of
//! `Intersection`/`Difference` chains, with no `Union` nested under an
//! `Intersection` or `Difference` anywhere in the result.
//!
//! The rewrite table distributes `Union` out from under the other two
//! operators until no rewrite applies (a fixed point): each pass strictly
//! reduces the number of `Union` nodes that sit below a non-`Union` node, so
//! the rewrite terminates.

use std::rc::Rc;

use crate::csg::{CSGTerm, OpKind};

#[must_use]
pub fn normalize(term: &Rc<CSGTerm>) -> Rc<CSGTerm> {
    match &**term {
        CSGTerm::Primitive { .. } => Rc::clone(term),
        CSGTerm::BinaryOp { kind, left, right } => {
            let left = normalize(left);
            let right = normalize(right);
            rewrite_top(*kind, left, right)
        }
    }
}

fn rewrite_top(kind: OpKind, left: Rc<CSGTerm>, right: Rc<CSGTerm>) -> Rc<CSGTerm> {
    match kind {
        OpKind::Union => CSGTerm::union(left, right),
        OpKind::Intersection => {
            if let CSGTerm::BinaryOp { kind: OpKind::Union, left: a, right: b } = &*left {
                let rewritten = CSGTerm::union(
                    CSGTerm::intersection(Rc::clone(a), Rc::clone(&right)),
                    CSGTerm::intersection(Rc::clone(b), Rc::clone(&right)),
                );
                return normalize(&rewritten);
            }
            if let CSGTerm::BinaryOp { kind: OpKind::Union, left: a, right: b } = &*right {
                let rewritten = CSGTerm::union(
                    CSGTerm::intersection(Rc::clone(&left), Rc::clone(a)),
                    CSGTerm::intersection(Rc::clone(&left), Rc::clone(b)),
                );
                return normalize(&rewritten);
            }
            CSGTerm::intersection(left, right)
        }
        OpKind::Difference => {
            if let CSGTerm::BinaryOp { kind: OpKind::Union, left: a, right: b } = &*left {
                let rewritten = CSGTerm::union(
                    CSGTerm::difference(Rc::clone(a), Rc::clone(&right)),
                    CSGTerm::difference(Rc::clone(b), Rc::clone(&right)),
                );
                return normalize(&rewritten);
            }
            if let CSGTerm::BinaryOp { kind: OpKind::Union, left: a, right: b } = &*right {
                // x - (y ∪ z) = (x - y) - z, not a union of differences.
                let rewritten = CSGTerm::difference(CSGTerm::difference(Rc::clone(&left), Rc::clone(a)), Rc::clone(b));
                return normalize(&rewritten);
            }
            // `right` being an Intersection is deliberately left alone:
            // `x - (y ∩ z)` has an equivalent union-of-differences rewrite
            // but it is never applied here, matching the source's
            // conservative table.
            CSGTerm::difference(left, right)
        }
    }
}

/// Counts `Union` nodes reachable below a non-`Union` node — zero in any
/// fully normalized term.
#[must_use]
pub fn misplaced_union_count(term: &Rc<CSGTerm>) -> usize {
    fn walk(term: &Rc<CSGTerm>, under_non_union: bool) -> usize {
        match &**term {
            CSGTerm::Primitive { .. } => 0,
            CSGTerm::BinaryOp { kind, left, right } => {
                let is_union = *kind == OpKind::Union;
                let mut count = usize::from(is_union && under_non_union);
                count += walk(left, !is_union || under_non_union);
                count += walk(right, !is_union || under_non_union);
                count
            }
        }
    }
    walk(term, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Polyset;
    use crate::csg::identity;

    fn leaf(label: &str) -> Rc<CSGTerm> {
        CSGTerm::primitive(Rc::new(Polyset::default()), identity(), label)
    }

    #[test]
    fn intersection_distributes_over_left_union() {
        let term = CSGTerm::intersection(CSGTerm::union(leaf("a"), leaf("b")), leaf("c"));
        let normalized = normalize(&term);
        assert_eq!(misplaced_union_count(&normalized), 0);
        assert!(matches!(&*normalized, CSGTerm::BinaryOp { kind: OpKind::Union, .. }));
    }

    #[test]
    fn difference_distributes_over_right_union() {
        let term = CSGTerm::difference(leaf("a"), CSGTerm::union(leaf("b"), leaf("c")));
        let normalized = normalize(&term);
        assert_eq!(misplaced_union_count(&normalized), 0);
        // (a - b) - c, not (a-b) ∪ (a-c): a Difference nested under a Difference, no Union anywhere.
        assert!(matches!(&*normalized, CSGTerm::BinaryOp { kind: OpKind::Difference, left, right }
            if matches!(&**right, CSGTerm::Primitive { label, .. } if label == "c")
            && matches!(&**left, CSGTerm::BinaryOp { kind: OpKind::Difference, .. })));
    }

    #[test]
    fn difference_does_not_distribute_over_right_intersection() {
        let term = CSGTerm::difference(leaf("a"), CSGTerm::intersection(leaf("b"), leaf("c")));
        let normalized = normalize(&term);
        // unchanged in shape: still a single Difference over an Intersection
        assert!(matches!(&*normalized, CSGTerm::BinaryOp { kind: OpKind::Difference, right, .. }
            if matches!(&**right, CSGTerm::BinaryOp { kind: OpKind::Intersection, .. })));
    }

    #[test]
    fn nested_unions_fully_flatten_to_top() {
        let term = CSGTerm::intersection(
            CSGTerm::union(leaf("a"), leaf("b")),
            CSGTerm::union(leaf("c"), leaf("d")),
        );
        let normalized = normalize(&term);
        assert_eq!(misplaced_union_count(&normalized), 0);
    }
}
