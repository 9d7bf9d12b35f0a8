//! `AbstractNode`: the runtime tree produced by module evaluation.

use std::cell::{Cell, RefCell};

use std::rc::Rc;

use smallvec::SmallVec;

use crate::backend::Polyset;
use crate::csg::{identity, Mat4, OpKind};
use crate::instantiation::ModuleInstanciation;

/// Numeric primitive params rarely exceed 4 entries (`cylinder`'s h/r1/r2 +
/// center flag is the largest), so an inline buffer avoids a heap
/// allocation for the common case.
pub type ParamVec = SmallVec<[f64; 4]>;

thread_local! {
    /// Per-compilation node counter, reset per compilation instead of
    /// leaking across unrelated `compile()` calls. A `thread_local` reset by
    /// `compile::reset_node_counter` plays that role without threading a
    /// counter argument through every `evaluate()` call in the tree — each
    /// compilation already owns the thread it runs on, so this is
    /// equivalent to a field on a `Compiler` that nothing outlives.
    static NODE_COUNTER: Cell<usize> = const { Cell::new(0) };
}

/// Resets the node index counter. Called once at the start of
/// [`crate::compile::compile`].
pub fn reset_node_counter() {
    NODE_COUNTER.with(|c| c.set(0));
}

fn next_index() -> usize {
    NODE_COUNTER.with(|c| {
        let i = c.get();
        c.set(i + 1);
        i
    })
}

/// One node in the abstract tree. `label` is a short human-readable name
/// (the module name at the originating call site) used when building the
/// canonical dump string for cache keys.
pub struct AbstractNode {
    pub index: usize,
    pub label: String,
    pub children: Vec<AbstractNode>,
    /// Tag bits copied from the originating [`ModuleInstanciation`],
    /// consumed by `csg::render_csg_term`.
    pub tag_root: bool,
    pub tag_highlight: bool,
    pub tag_background: bool,
    /// How this node's children combine when more than one produces a term.
    /// `None` means "fold with `Union`" (plain grouping); the `union`/
    /// `intersection`/`difference` builtin modules set this explicitly.
    pub combine: Option<OpKind>,
    /// This node's own transform relative to its parent; composed down the
    /// tree during CSG term construction. Identity for anything that isn't
    /// a transform builtin.
    pub transform: Mat4,
    /// Numeric parameters for a primitive leaf (`cube`'s size, `sphere`'s
    /// radius, ...), consumed by the `leaf` callback passed to
    /// [`AbstractNode::render_csg_term`].
    pub params: ParamVec,
    /// Pre-built geometry for primitives that don't need tessellation
    /// (`polyhedron`'s explicit point/face lists).
    pub explicit_polyset: Option<Rc<Polyset>>,
    dump_cache: RefCell<Option<String>>,
}

impl AbstractNode {
    #[must_use]
    pub fn new_group(inst: &ModuleInstanciation) -> Self {
        Self {
            index: next_index(),
            label: inst.modname.clone(),
            children: Vec::new(),
            tag_root: inst.tag_root,
            tag_highlight: inst.tag_highlight,
            tag_background: inst.tag_background,
            combine: None,
            transform: identity(),
            params: ParamVec::new(),
            explicit_polyset: None,
            dump_cache: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn new_leaf(label: impl Into<String>) -> Self {
        Self {
            index: next_index(),
            label: label.into(),
            children: Vec::new(),
            tag_root: false,
            tag_highlight: false,
            tag_background: false,
            combine: None,
            transform: identity(),
            params: ParamVec::new(),
            explicit_polyset: None,
            dump_cache: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn with_combine(mut self, op: OpKind) -> Self {
        self.combine = Some(op);
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: impl Into<ParamVec>) -> Self {
        self.params = params.into();
        self
    }

    #[must_use]
    pub fn with_explicit_polyset(mut self, polyset: Rc<Polyset>) -> Self {
        self.explicit_polyset = Some(polyset);
        self
    }

    /// Canonical, whitespace-free text dump used as the cache key basis:
    /// `label_id(childdump,childdump,...)` with no spaces;
    /// the `_id` suffix is stripped by [`crate::cache::canonicalize_key`],
    /// not here, since the raw dump is also useful for diagnostics where the
    /// index is exactly what you want to see.
    #[must_use]
    pub fn dump(&self) -> String {
        if let Some(cached) = self.dump_cache.borrow().as_ref() {
            return cached.clone();
        }
        let mut s = format!("{}_{}", self.label, self.index);
        if !self.children.is_empty() {
            s.push('(');
            for (i, child) in self.children.iter().enumerate() {
                if i > 0 {
                    s.push(',');
                }
                s.push_str(&child.dump());
            }
            s.push(')');
        }
        *self.dump_cache.borrow_mut() = Some(s.clone());
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Arg;

    fn inst(name: &str) -> ModuleInstanciation {
        ModuleInstanciation::new(name.to_owned(), Vec::<Arg>::new())
    }

    #[test]
    fn dump_nests_children_in_order() {
        reset_node_counter();
        let mut root = AbstractNode::new_group(&inst("union"));
        root.children.push(AbstractNode::new_leaf("cube"));
        root.children.push(AbstractNode::new_leaf("sphere"));
        assert_eq!(root.dump(), "union_0(cube_1(),sphere_2())");
    }

    #[test]
    fn dump_is_cached_after_first_call() {
        reset_node_counter();
        let leaf = AbstractNode::new_leaf("cube");
        let first = leaf.dump();
        let second = leaf.dump();
        assert_eq!(first, second);
    }
}
