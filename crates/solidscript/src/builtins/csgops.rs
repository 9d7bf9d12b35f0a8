//! Builtin CSG-operator modules: `union`, `difference`, `intersection`
//! (`module.cc::register_builtin_csgops`).
//!
//! Each just tags the resulting node's `combine` operator and re-parents the
//! call site's children; the actual boolean-algebra fold happens later in
//! `csg::AbstractNode::render_csg_term`.

use std::rc::Rc;

use crate::context::Context;
use crate::csg::OpKind;
use crate::diagnostics::DiagnosticSink;
use crate::function::{AbstractModule, ModuleTable};
use crate::instantiation::ModuleInstanciation;
use crate::node::AbstractNode;

pub fn register(modules: &mut ModuleTable) {
    modules.insert(
        "union",
        AbstractModule::Builtin { params: vec![], eval: eval_union },
    );
    modules.insert(
        "difference",
        AbstractModule::Builtin { params: vec![], eval: eval_difference },
    );
    modules.insert(
        "intersection",
        AbstractModule::Builtin { params: vec![], eval: eval_intersection },
    );
}

fn group_with_op(inst: &ModuleInstanciation, ctx: &Rc<Context>, op: OpKind, diags: &mut dyn DiagnosticSink) -> AbstractNode {
    let mut node = AbstractNode::new_group(inst).with_combine(op);
    for child in &inst.children {
        if let Some(n) = child.evaluate(ctx, diags) {
            node.children.push(n);
        }
    }
    node
}

fn eval_union(ctx: &Rc<Context>, inst: &ModuleInstanciation, diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    Some(group_with_op(inst, ctx, OpKind::Union, diags))
}

fn eval_difference(ctx: &Rc<Context>, inst: &ModuleInstanciation, diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    Some(group_with_op(inst, ctx, OpKind::Difference, diags))
}

fn eval_intersection(ctx: &Rc<Context>, inst: &ModuleInstanciation, diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    Some(group_with_op(inst, ctx, OpKind::Intersection, diags))
}
