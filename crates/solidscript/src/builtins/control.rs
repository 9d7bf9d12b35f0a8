//! Builtin control-flow modules: `group` (`module.cc`'s implicit grouping
//! module), `for`/`intersection_for`, and `if` — modeled as
//! `AbstractModule` variants rather than special statements, consistent
//! with OpenSCAD's own module-based control flow (recovered from the
//! reference evaluator's `ForLoop`/`If` handling).

use std::rc::Rc;

use crate::context::Context;
use crate::csg::OpKind;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::function::{AbstractModule, ModuleTable};
use crate::instantiation::ModuleInstanciation;
use crate::node::AbstractNode;
use crate::value::Value;

/// Safety limit on iterations a single `for` can produce, mirroring the
/// reference evaluator's loop-count cap.
const MAX_FOR_ITERATIONS: usize = 10_000;

pub fn register(modules: &mut ModuleTable) {
    modules.insert("group", AbstractModule::Group);
    modules.insert(
        "for",
        AbstractModule::Builtin {
            params: vec![],
            eval: eval_for,
        },
    );
    modules.insert(
        "intersection_for",
        AbstractModule::Builtin {
            params: vec![],
            eval: eval_intersection_for,
        },
    );
    modules.insert(
        "if",
        AbstractModule::Builtin {
            params: vec![crate::function::Param::required("condition")],
            eval: eval_if,
        },
    );
}

fn iterate_values(value: &Value) -> Vec<Value> {
    match value {
        Value::Range(r) => r.values().map(Value::Number).collect(),
        Value::Vector(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn for_body(ctx: &Rc<Context>, inst: &ModuleInstanciation, op: OpKind, diags: &mut dyn DiagnosticSink) -> AbstractNode {
    let mut node = AbstractNode::new_group(inst).with_combine(op);
    let mut produced = 0usize;

    'vars: for arg in &inst.args {
        let Some(varname) = &arg.name else { continue };
        let values = iterate_values(&arg.expr.evaluate(ctx, diags));
        for v in values {
            if produced >= MAX_FOR_ITERATIONS {
                diags.report(Diagnostic::warning("for loop exceeded the maximum iteration count"));
                break 'vars;
            }
            let iter_ctx = Context::child(ctx);
            iter_ctx.set(varname, v);
            let _guard = iter_ctx.activate();
            for child in &inst.children {
                if let Some(n) = child.evaluate(&iter_ctx, diags) {
                    node.children.push(n);
                }
            }
            produced += 1;
        }
    }
    node
}

fn eval_for(ctx: &Rc<Context>, inst: &ModuleInstanciation, diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    Some(for_body(ctx, inst, OpKind::Union, diags))
}

fn eval_intersection_for(ctx: &Rc<Context>, inst: &ModuleInstanciation, diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    Some(for_body(ctx, inst, OpKind::Intersection, diags))
}

/// `if (condition) { ... } else { ... }`. The `else` branch is represented
/// as a single nested instantiation named `else` among this instantiation's
/// call-site children — the external parser's job is to produce that shape,
/// the core just looks for it.
fn eval_if(ctx: &Rc<Context>, inst: &ModuleInstanciation, diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    let condition = ctx.lookup("condition").truthy();
    let mut node = AbstractNode::new_group(inst);
    if condition {
        for child in &inst.children {
            if child.modname == "else" {
                continue;
            }
            if let Some(n) = child.evaluate(ctx, diags) {
                node.children.push(n);
            }
        }
    } else if let Some(else_branch) = inst.children.iter().find(|c| c.modname == "else") {
        for child in &else_branch.children {
            if let Some(n) = child.evaluate(ctx, diags) {
                node.children.push(n);
            }
        }
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Arg, Expression};
    use crate::function::FunctionTable;

    #[test]
    fn for_loop_iterates_a_range_and_binds_the_variable() {
        let mut modules = ModuleTable::new();
        register(&mut modules);
        let root = Context::root(Rc::new(FunctionTable::new()), Rc::new(modules));

        let body = ModuleInstanciation::new("echo_marker", vec![]);
        let inst = ModuleInstanciation::new(
            "for",
            vec![Arg::named(
                "i",
                Expression::Range {
                    begin: Box::new(Expression::Constant(Value::Number(0.0))),
                    step: None,
                    end: Box::new(Expression::Constant(Value::Number(2.0))),
                },
            )],
        )
        .with_children(vec![body]);

        let mut diags = crate::diagnostics::CollectingSink::default();
        let node = inst.evaluate(&root, &mut diags).expect("for always produces a node");
        // each of the 3 iterations tries to evaluate an unregistered
        // "echo_marker" module, so nothing is produced but no panic occurs
        // and one warning per iteration is reported.
        assert!(node.children.is_empty());
        assert_eq!(diags.diagnostics.len(), 3);
    }

    #[test]
    fn if_without_else_skips_body_when_false() {
        let mut modules = ModuleTable::new();
        register(&mut modules);
        let root = Context::root(Rc::new(FunctionTable::new()), Rc::new(modules));

        let inst = ModuleInstanciation::new("if", vec![Arg::named("condition", Expression::Constant(Value::Bool(false)))]);
        let mut diags = crate::diagnostics::CollectingSink::default();
        let node = inst.evaluate(&root, &mut diags).unwrap();
        assert!(node.children.is_empty());
    }
}
