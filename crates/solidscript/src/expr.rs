//! Expression tree and its total, single-pass evaluator.

use std::rc::Rc;

use crate::context::Context;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::value::{Range, Value};

/// One argument at a call site: `name` is `None` for a positional argument,
/// matching an "empty string = positional" encoding translated to an
/// `Option`.
#[derive(Debug, Clone)]
pub struct Arg {
    pub name: Option<String>,
    pub expr: Expression,
}

impl Arg {
    #[must_use]
    pub fn positional(expr: Expression) -> Self {
        Self { name: None, expr }
    }

    #[must_use]
    pub fn named(name: impl Into<String>, expr: Expression) -> Self {
        Self {
            name: Some(name.into()),
            expr,
        }
    }
}

/// The expression node. Each operator gets its own variant rather than
/// collapsing them behind a generic `Binary { op }` shape, so each
/// evaluation rule has exactly one arm here.
#[derive(Debug, Clone)]
pub enum Expression {
    Not(Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Add(Box<Expression>, Box<Expression>),
    Sub(Box<Expression>, Box<Expression>),
    Mul(Box<Expression>, Box<Expression>),
    Div(Box<Expression>, Box<Expression>),
    Mod(Box<Expression>, Box<Expression>),
    Lt(Box<Expression>, Box<Expression>),
    Le(Box<Expression>, Box<Expression>),
    Eq(Box<Expression>, Box<Expression>),
    Ne(Box<Expression>, Box<Expression>),
    Ge(Box<Expression>, Box<Expression>),
    Gt(Box<Expression>, Box<Expression>),
    Index(Box<Expression>, Box<Expression>),
    Ternary(Box<Expression>, Box<Expression>, Box<Expression>),
    Negate(Box<Expression>),
    Constant(Value),
    /// `begin : end` (step defaults to 1) or `begin : step : end`.
    Range {
        begin: Box<Expression>,
        step: Option<Box<Expression>>,
        end: Box<Expression>,
    },
    Vector(Vec<Expression>),
    Matrix(Vec<Vec<Expression>>),
    LookupVar(String),
    LookupMember(Box<Expression>, String),
    Call {
        name: String,
        args: Vec<Arg>,
    },
}

impl Expression {
    /// `Expression.evaluate(ctx) -> Value`: total, recursive, single-pass.
    /// Type mismatches yield [`Value::Undefined`] rather than failing.
    pub fn evaluate(&self, ctx: &Rc<Context>, diags: &mut dyn DiagnosticSink) -> Value {
        match self {
            Self::Not(e) => e.evaluate(ctx, diags).not(),
            Self::And(a, b) => {
                let va = a.evaluate(ctx, diags);
                // short-circuit: only evaluate b if a didn't already settle it
                if let Value::Bool(false) = va {
                    return Value::Bool(false);
                }
                va.and(&b.evaluate(ctx, diags))
            }
            Self::Or(a, b) => {
                let va = a.evaluate(ctx, diags);
                if let Value::Bool(true) = va {
                    return Value::Bool(true);
                }
                va.or(&b.evaluate(ctx, diags))
            }
            Self::Add(a, b) => a.evaluate(ctx, diags).add(&b.evaluate(ctx, diags)),
            Self::Sub(a, b) => a.evaluate(ctx, diags).sub(&b.evaluate(ctx, diags)),
            Self::Mul(a, b) => a.evaluate(ctx, diags).mul(&b.evaluate(ctx, diags)),
            Self::Div(a, b) => a.evaluate(ctx, diags).div(&b.evaluate(ctx, diags)),
            Self::Mod(a, b) => a.evaluate(ctx, diags).rem(&b.evaluate(ctx, diags)),
            Self::Lt(a, b) => a.evaluate(ctx, diags).lt(&b.evaluate(ctx, diags)),
            Self::Le(a, b) => a.evaluate(ctx, diags).le(&b.evaluate(ctx, diags)),
            Self::Eq(a, b) => a.evaluate(ctx, diags).eq_value(&b.evaluate(ctx, diags)),
            Self::Ne(a, b) => a.evaluate(ctx, diags).ne_value(&b.evaluate(ctx, diags)),
            Self::Ge(a, b) => a.evaluate(ctx, diags).ge(&b.evaluate(ctx, diags)),
            Self::Gt(a, b) => a.evaluate(ctx, diags).gt(&b.evaluate(ctx, diags)),
            Self::Index(v, i) => v.evaluate(ctx, diags).index(&i.evaluate(ctx, diags)),
            Self::Ternary(cond, then_e, else_e) => {
                if cond.evaluate(ctx, diags).truthy() {
                    then_e.evaluate(ctx, diags)
                } else {
                    else_e.evaluate(ctx, diags)
                }
            }
            Self::Negate(e) => e.evaluate(ctx, diags).negate(),
            Self::Constant(v) => v.clone(),
            Self::Range { begin, step, end } => {
                let b = begin.evaluate(ctx, diags).as_number().unwrap_or(0.0);
                let s = step
                    .as_ref()
                    .map_or(1.0, |s| s.evaluate(ctx, diags).as_number().unwrap_or(1.0));
                let e = end.evaluate(ctx, diags).as_number().unwrap_or(0.0);
                Value::Range(Range::new(b, s, e))
            }
            Self::Vector(items) => Value::Vector(items.iter().map(|e| e.evaluate(ctx, diags)).collect()),
            Self::Matrix(rows) => Value::Vector(
                rows.iter()
                    .map(|row| Value::Vector(row.iter().map(|e| e.evaluate(ctx, diags)).collect()))
                    .collect(),
            ),
            Self::LookupVar(name) => ctx.lookup(name),
            Self::LookupMember(base, name) => base.evaluate(ctx, diags).member(name),
            Self::Call { name, args } => eval_call(name, args, ctx, diags),
        }
    }
}

fn eval_call(name: &str, args: &[Arg], ctx: &Rc<Context>, diags: &mut dyn DiagnosticSink) -> Value {
    let Some(func) = ctx.functions().lookup(name) else {
        diags.report(Diagnostic::warning(format!("ignoring unknown function '{name}'")));
        return Value::Undefined;
    };
    func.call(ctx, args, diags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{FunctionTable, ModuleTable};

    fn root_ctx() -> Rc<Context> {
        Context::root(Rc::new(FunctionTable::new()), Rc::new(ModuleTable::new()))
    }

    #[test]
    fn ternary_picks_branch_by_truthiness() {
        let ctx = root_ctx();
        let mut sink = crate::diagnostics::NullSink;
        let e = Expression::Ternary(
            Box::new(Expression::Constant(Value::Bool(true))),
            Box::new(Expression::Constant(Value::Number(1.0))),
            Box::new(Expression::Constant(Value::Number(2.0))),
        );
        assert_eq!(e.evaluate(&ctx, &mut sink), Value::Number(1.0));
    }

    #[test]
    fn range_with_two_operands_defaults_step_to_one() {
        let ctx = root_ctx();
        let mut sink = crate::diagnostics::NullSink;
        let e = Expression::Range {
            begin: Box::new(Expression::Constant(Value::Number(0.0))),
            step: None,
            end: Box::new(Expression::Constant(Value::Number(2.0))),
        };
        let Value::Range(r) = e.evaluate(&ctx, &mut sink) else {
            panic!("expected range")
        };
        assert_eq!(r.values().collect::<Vec<_>>(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn index_out_of_range_is_undefined() {
        let ctx = root_ctx();
        let mut sink = crate::diagnostics::NullSink;
        let e = Expression::Index(
            Box::new(Expression::Vector(vec![Expression::Constant(Value::Number(1.0))])),
            Box::new(Expression::Constant(Value::Number(5.0))),
        );
        assert_eq!(e.evaluate(&ctx, &mut sink), Value::Undefined);
    }

    #[test]
    fn unknown_function_call_is_undefined_and_warns() {
        let ctx = root_ctx();
        let mut sink = crate::diagnostics::CollectingSink::default();
        let e = Expression::Call {
            name: "nope".into(),
            args: vec![],
        };
        assert_eq!(e.evaluate(&ctx, &mut sink), Value::Undefined);
        assert_eq!(sink.diagnostics.len(), 1);
    }
}
