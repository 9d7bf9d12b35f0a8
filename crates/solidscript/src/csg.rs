//! `CSGTerm`: a refcounted boolean-operation DAG.
//!
//! Terms are built bottom-up from the [`AbstractNode`] tree by
//! [`AbstractNode::render_csg_term`]: primitive leaves fold together with
//! `Union` in call-site order (or whatever operator the enclosing `union`/
//! `intersection`/`difference` builtin set), and the three tag bits
//! (`root`/`highlight`/`background`) steer what happens to a subtree rather
//! than changing how it is combined.

use std::rc::Rc;

use crate::backend::Polyset;
use crate::node::AbstractNode;

pub type Mat4 = [[f64; 4]; 4];

#[must_use]
pub fn identity() -> Mat4 {
    let mut m = [[0.0; 4]; 4];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    m
}

#[must_use]
pub fn mat4_mul(a: Mat4, b: Mat4) -> Mat4 {
    let mut out = [[0.0; 4]; 4];
    for (i, out_row) in out.iter_mut().enumerate() {
        for (j, cell) in out_row.iter_mut().enumerate() {
            *cell = (0..4).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Union,
    Intersection,
    Difference,
}

/// A node in the term DAG. Cycles are forbidden by construction: a term can
/// only be built from already-built subterms, never from itself.
pub enum CSGTerm {
    Primitive {
        polyset: Rc<Polyset>,
        /// Value-typed transform: the leaf just owns its `[[f64; 4]; 4]`
        /// rather than a raw-pointer matrix with ambiguous ownership.
        transform: Mat4,
        label: String,
    },
    BinaryOp {
        kind: OpKind,
        left: Rc<CSGTerm>,
        right: Rc<CSGTerm>,
    },
}

impl CSGTerm {
    #[must_use]
    pub fn primitive(polyset: Rc<Polyset>, transform: Mat4, label: impl Into<String>) -> Rc<CSGTerm> {
        Rc::new(CSGTerm::Primitive {
            polyset,
            transform,
            label: label.into(),
        })
    }

    #[must_use]
    pub fn binary(kind: OpKind, left: Rc<CSGTerm>, right: Rc<CSGTerm>) -> Rc<CSGTerm> {
        Rc::new(CSGTerm::BinaryOp { kind, left, right })
    }

    #[must_use]
    pub fn union(left: Rc<CSGTerm>, right: Rc<CSGTerm>) -> Rc<CSGTerm> {
        Self::binary(OpKind::Union, left, right)
    }

    #[must_use]
    pub fn intersection(left: Rc<CSGTerm>, right: Rc<CSGTerm>) -> Rc<CSGTerm> {
        Self::binary(OpKind::Intersection, left, right)
    }

    #[must_use]
    pub fn difference(left: Rc<CSGTerm>, right: Rc<CSGTerm>) -> Rc<CSGTerm> {
        Self::binary(OpKind::Difference, left, right)
    }
}

/// `link`/`unlink` are thin, explicit wrappers over `Rc` clone/drop,
/// making term sharing an explicit refcount API rather than implicit
/// borrowing — the wrappers exist to keep call sites readable even though
/// `Rc::clone`/drop alone would do the same job.
#[must_use]
pub fn link(term: &Rc<CSGTerm>) -> Rc<CSGTerm> {
    Rc::clone(term)
}

pub fn unlink(term: Rc<CSGTerm>) {
    drop(term);
}

/// The per-render accumulation result: the primary term plus any terms
/// pulled aside by `%`/`#` tags.
#[derive(Default)]
pub struct RenderedTerms {
    pub primary: Option<Rc<CSGTerm>>,
    pub highlights: Vec<Rc<CSGTerm>>,
    pub backgrounds: Vec<Rc<CSGTerm>>,
}

impl AbstractNode {
    /// Builds the CSG term(s) for this subtree.
    ///
    /// `leaf` converts a primitive node, with its accumulated transform,
    /// directly into a term; for a group node, children are folded
    /// left-to-right with the node's `combine` operator (defaulting to
    /// `Union`), and each child's own highlight/background contributions are
    /// hoisted into the caller's `RenderedTerms` rather than discarded.
    pub fn render_csg_term(&self, leaf: &dyn Fn(&AbstractNode, Mat4) -> Option<Rc<CSGTerm>>) -> RenderedTerms {
        let mut out = RenderedTerms::default();
        self.render_into(leaf, identity(), &mut out);
        out
    }

    fn render_into(&self, leaf: &dyn Fn(&AbstractNode, Mat4) -> Option<Rc<CSGTerm>>, parent_transform: Mat4, out: &mut RenderedTerms) -> Option<Rc<CSGTerm>> {
        let transform = mat4_mul(parent_transform, self.transform);
        let own_term = if self.children.is_empty() {
            leaf(self, transform)
        } else {
            let op = self.combine.unwrap_or(OpKind::Union);
            let mut acc: Option<Rc<CSGTerm>> = None;
            for child in &self.children {
                let child_term = child.render_into(leaf, transform, out);
                acc = match (acc, child_term) {
                    (Some(a), Some(b)) => Some(CSGTerm::binary(op, a, b)),
                    (Some(a), None) => Some(a),
                    (None, b) => b,
                };
            }
            acc
        };

        if self.tag_background {
            if let Some(t) = own_term {
                out.backgrounds.push(t);
            }
            return None;
        }
        if self.tag_highlight {
            if let Some(t) = own_term.clone() {
                out.highlights.push(t);
            }
            return own_term;
        }
        own_term
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instantiation::ModuleInstanciation;

    fn leaf_from_label(node: &AbstractNode, transform: Mat4) -> Option<Rc<CSGTerm>> {
        Some(CSGTerm::primitive(Rc::new(Polyset::default()), transform, node.label.clone()))
    }

    #[test]
    fn siblings_fold_left_to_right_with_union() {
        crate::node::reset_node_counter();
        let mut root = AbstractNode::new_group(&ModuleInstanciation::new("union", vec![]));
        root.children.push(AbstractNode::new_leaf("cube"));
        root.children.push(AbstractNode::new_leaf("sphere"));
        let rendered = root.render_csg_term(&leaf_from_label);
        let Some(term) = rendered.primary else { panic!("expected a term") };
        assert!(matches!(&*term, CSGTerm::BinaryOp { kind: OpKind::Union, .. }));
    }

    #[test]
    fn background_tag_hoists_out_of_primary() {
        crate::node::reset_node_counter();
        let mut root = AbstractNode::new_group(&ModuleInstanciation::new("union", vec![]));
        let mut bg = AbstractNode::new_leaf("cube");
        bg.tag_background = true;
        root.children.push(bg);
        root.children.push(AbstractNode::new_leaf("sphere"));
        let rendered = root.render_csg_term(&leaf_from_label);
        assert_eq!(rendered.backgrounds.len(), 1);
        let Some(term) = rendered.primary else { panic!("expected a term") };
        assert!(matches!(&*term, CSGTerm::Primitive { label, .. } if label == "sphere"));
    }

    #[test]
    fn difference_combine_op_overrides_default_union_fold() {
        crate::node::reset_node_counter();
        let mut root = AbstractNode::new_group(&ModuleInstanciation::new("difference", vec![])).with_combine(OpKind::Difference);
        root.children.push(AbstractNode::new_leaf("cube"));
        root.children.push(AbstractNode::new_leaf("sphere"));
        let rendered = root.render_csg_term(&leaf_from_label);
        let Some(term) = rendered.primary else { panic!("expected a term") };
        assert!(matches!(&*term, CSGTerm::BinaryOp { kind: OpKind::Difference, .. }));
    }
}
