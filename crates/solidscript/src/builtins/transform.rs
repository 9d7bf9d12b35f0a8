//! Builtin transform modules: `translate`, `rotate`, `scale`, `mirror`,
//! `multmatrix`, `resize`, `color` (`module.cc::register_builtin_transform`).
//!
//! Each sets the resulting node's `transform` matrix and re-parents the
//! call-site's own children underneath it; [`crate::csg::AbstractNode::render_csg_term`]
//! composes these matrices down the tree.

use std::rc::Rc;

use crate::context::Context;
use crate::csg::{mat4_mul, Mat4};
use crate::diagnostics::DiagnosticSink;
use crate::expr::Expression;
use crate::function::{AbstractModule, ModuleTable, Param};
use crate::instantiation::ModuleInstanciation;
use crate::node::AbstractNode;
use crate::value::Value;

pub fn register(modules: &mut ModuleTable) {
    modules.insert(
        "translate",
        AbstractModule::Builtin {
            params: vec![Param::required("v")],
            eval: eval_translate,
        },
    );
    modules.insert(
        "rotate",
        AbstractModule::Builtin {
            params: vec![Param::required("a")],
            eval: eval_rotate,
        },
    );
    modules.insert(
        "scale",
        AbstractModule::Builtin {
            params: vec![Param::required("v")],
            eval: eval_scale,
        },
    );
    modules.insert(
        "mirror",
        AbstractModule::Builtin {
            params: vec![Param::required("v")],
            eval: eval_mirror,
        },
    );
    modules.insert(
        "multmatrix",
        AbstractModule::Builtin {
            params: vec![Param::required("m")],
            eval: eval_multmatrix,
        },
    );
    modules.insert(
        "resize",
        AbstractModule::Builtin {
            params: vec![Param::required("newsize")],
            eval: eval_resize,
        },
    );
    modules.insert(
        "color",
        AbstractModule::Builtin {
            params: vec![Param::with_default("c", Expression::Vector(vec![]))],
            eval: eval_color,
        },
    );
}

fn group_with_transform(inst: &ModuleInstanciation, ctx: &Rc<Context>, transform: Mat4, diags: &mut dyn DiagnosticSink) -> AbstractNode {
    let mut node = AbstractNode::new_group(inst).with_transform(transform);
    for child in &inst.children {
        if let Some(n) = child.evaluate(ctx, diags) {
            node.children.push(n);
        }
    }
    node
}

fn translation(v: Value) -> Mat4 {
    let (x, y, z) = v.as_vec3();
    let mut m = crate::csg::identity();
    m[0][3] = x;
    m[1][3] = y;
    m[2][3] = z;
    m
}

fn scaling(v: Value) -> Mat4 {
    let (x, y, z) = v.as_vec3();
    let mut m = crate::csg::identity();
    m[0][0] = x;
    m[1][1] = y;
    m[2][2] = z;
    m
}

fn rotation_about_axis(angle_deg: f64, axis: usize) -> Mat4 {
    let (s, c) = angle_deg.to_radians().sin_cos();
    let mut m = crate::csg::identity();
    let (i, j) = match axis {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };
    m[i][i] = c;
    m[i][j] = -s;
    m[j][i] = s;
    m[j][j] = c;
    m
}

fn rotation(v: Value) -> Mat4 {
    if let Some(n) = v.as_number() {
        return rotation_about_axis(n, 2);
    }
    let (x, y, z) = v.as_vec3();
    let rz = rotation_about_axis(z, 2);
    let ry = rotation_about_axis(y, 1);
    let rx = rotation_about_axis(x, 0);
    mat4_mul(mat4_mul(rz, ry), rx)
}

fn eval_translate(ctx: &Rc<Context>, inst: &ModuleInstanciation, diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    Some(group_with_transform(inst, ctx, translation(ctx.lookup("v")), diags))
}

fn eval_rotate(ctx: &Rc<Context>, inst: &ModuleInstanciation, diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    Some(group_with_transform(inst, ctx, rotation(ctx.lookup("a")), diags))
}

fn eval_scale(ctx: &Rc<Context>, inst: &ModuleInstanciation, diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    Some(group_with_transform(inst, ctx, scaling(ctx.lookup("v")), diags))
}

fn eval_mirror(ctx: &Rc<Context>, inst: &ModuleInstanciation, diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    let (x, y, z) = ctx.lookup("v").as_vec3();
    let len_sq = x * x + y * y + z * z;
    let transform = if len_sq == 0.0 {
        crate::csg::identity()
    } else {
        // Householder reflection across the plane through the origin
        // perpendicular to the given normal.
        let mut m = crate::csg::identity();
        let n = [x, y, z];
        for (i, row) in m.iter_mut().take(3).enumerate() {
            for (j, cell) in row.iter_mut().take(3).enumerate() {
                let delta = if i == j { 1.0 } else { 0.0 };
                *cell = delta - 2.0 * n[i] * n[j] / len_sq;
            }
        }
        m
    };
    Some(group_with_transform(inst, ctx, transform, diags))
}

fn eval_multmatrix(ctx: &Rc<Context>, inst: &ModuleInstanciation, diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    let m = ctx.lookup("m");
    let mut transform = crate::csg::identity();
    if let Some(rows) = m.as_vector() {
        for (i, row) in rows.iter().take(4).enumerate() {
            if let Some(cols) = row.as_vector() {
                for (j, cell) in cols.iter().take(4).enumerate() {
                    if let Some(v) = cell.as_number() {
                        transform[i][j] = v;
                    }
                }
            }
        }
    }
    Some(group_with_transform(inst, ctx, transform, diags))
}

fn eval_resize(ctx: &Rc<Context>, inst: &ModuleInstanciation, diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    // `resize` needs the child's bounding box to compute a scale factor,
    // which isn't known until tessellation; the core records the requested
    // target size as the node's transform-free params and leaves the actual
    // rescale to the rendering stage, consistent with `resize` being a
    // geometry-dependent operation rather than a pure matrix transform.
    let (x, y, z) = ctx.lookup("newsize").as_vec3();
    let mut node = AbstractNode::new_group(inst).with_params(vec![x, y, z]);
    for child in &inst.children {
        if let Some(n) = child.evaluate(ctx, diags) {
            node.children.push(n);
        }
    }
    Some(node)
}

fn eval_color(ctx: &Rc<Context>, inst: &ModuleInstanciation, diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
    // Color is cosmetic only for this core (no renderer lives here); it
    // still needs to pass its children through unchanged.
    let _ = ctx.lookup("c");
    let mut node = AbstractNode::new_group(inst);
    for child in &inst.children {
        if let Some(n) = child.evaluate(ctx, diags) {
            node.children.push(n);
        }
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_matrix_places_offset_in_last_column() {
        let m = translation(Value::Vector(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]));
        assert_eq!(m[0][3], 1.0);
        assert_eq!(m[1][3], 2.0);
        assert_eq!(m[2][3], 3.0);
    }

    #[test]
    fn scalar_rotate_spins_about_z() {
        let m = rotation(Value::Number(90.0));
        assert!((m[0][0]).abs() < 1e-9);
        assert!((m[0][1] - (-1.0)).abs() < 1e-9);
    }
}
