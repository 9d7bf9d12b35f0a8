//! Builtin primitive modules: `cube`, `sphere`, `cylinder`, `polyhedron`
//! (`module.cc::register_builtin_primitives`).

use std::rc::Rc;

use crate::backend::Polyset;
use crate::context::Context;
use crate::diagnostics::DiagnosticSink;
use crate::expr::Expression;
use crate::function::{AbstractModule, ModuleTable, Param};
use crate::instantiation::ModuleInstanciation;
use crate::node::AbstractNode;
use crate::value::Value;

pub fn register(modules: &mut ModuleTable) {
    modules.insert(
        "cube",
        AbstractModule::Builtin {
            params: vec![
                Param::with_default("size", Expression::Constant(Value::Number(1.0))),
                Param::with_default("center", Expression::Constant(Value::Bool(false))),
            ],
            eval: eval_cube,
        },
    );
    modules.insert(
        "sphere",
        AbstractModule::Builtin {
            params: vec![Param::with_default("r", Expression::Constant(Value::Number(1.0)))],
            eval: eval_sphere,
        },
    );
    modules.insert(
        "cylinder",
        AbstractModule::Builtin {
            params: vec![
                Param::with_default("h", Expression::Constant(Value::Number(1.0))),
                Param::with_default("r1", Expression::Constant(Value::Number(1.0))),
                Param::with_default("r2", Expression::Constant(Value::Number(1.0))),
                Param::with_default("center", Expression::Constant(Value::Bool(false))),
            ],
            eval: eval_cylinder,
        },
    );
    modules.insert(
        "polyhedron",
        AbstractModule::Builtin {
            params: vec![
                Param::with_default("points", Expression::Vector(vec![])),
                Param::with_default("faces", Expression::Vector(vec![])),
            ],
            eval: eval_polyhedron,
        },
    );
}

fn eval_cube(ctx: &Rc<Context>, inst: &ModuleInstanciation, _diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    let (sx, sy, sz) = ctx.lookup("size").as_vec3();
    let center = ctx.lookup("center").truthy();
    Some(AbstractNode::new_group(inst).with_params(vec![sx, sy, sz, if center { 1.0 } else { 0.0 }]))
}

fn eval_sphere(ctx: &Rc<Context>, inst: &ModuleInstanciation, _diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    let r = ctx.lookup("r").as_number().unwrap_or(1.0);
    Some(AbstractNode::new_group(inst).with_params(vec![r]))
}

fn eval_cylinder(ctx: &Rc<Context>, inst: &ModuleInstanciation, _diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    let h = ctx.lookup("h").as_number().unwrap_or(1.0);
    let r1 = ctx.lookup("r1").as_number().unwrap_or(1.0);
    let r2 = ctx.lookup("r2").as_number().unwrap_or(1.0);
    let center = ctx.lookup("center").truthy();
    Some(AbstractNode::new_group(inst).with_params(vec![h, r1, r2, if center { 1.0 } else { 0.0 }]))
}

/// Unlike the other primitives, `polyhedron` supplies its own explicit
/// geometry — there is nothing for a [`crate::backend::Tessellator`] to do,
/// so the `Polyset` is built directly from `points`/`faces` here.
fn eval_polyhedron(ctx: &Rc<Context>, inst: &ModuleInstanciation, diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    let points = ctx.lookup("points");
    let faces = ctx.lookup("faces");
    let (Some(points), Some(faces)) = (points.as_vector(), faces.as_vector()) else {
        diags.report(crate::diagnostics::Diagnostic::warning("polyhedron requires points and faces vectors"));
        return None;
    };

    let vertices = points
        .iter()
        .map(|p| {
            let (x, y, z) = p.as_vec3();
            [x, y, z]
        })
        .collect();
    let facets = faces
        .iter()
        .filter_map(Value::as_vector)
        .map(|face| face.iter().filter_map(|i| i.as_number()).map(|f| f as usize).collect())
        .collect();

    let polyset = Rc::new(Polyset { vertices, facets });
    Some(AbstractNode::new_group(inst).with_explicit_polyset(polyset))
}
