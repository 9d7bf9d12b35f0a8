//! Builtin math functions (`sin`, `cos`, `min`, `len`, ...), mirroring the
//! reference evaluator's `eval_function_call` dispatch table.

use crate::function::{AbstractFunction, FunctionTable};
use crate::value::Value;

fn arg(args: &[Value], i: usize) -> f64 {
    args.get(i).and_then(Value::as_number).unwrap_or(0.0)
}

fn unary(f: impl Fn(f64) -> f64) -> impl Fn(&[Value]) -> Value {
    move |args| Value::Number(f(arg(args, 0)))
}

pub fn register(functions: &mut FunctionTable) {
    macro_rules! register_unary {
        ($name:literal, $f:expr) => {
            functions.insert($name, AbstractFunction::Builtin(|args: &[Value]| unary($f)(args)));
        };
    }

    register_unary!("sin", |x: f64| x.to_radians().sin());
    register_unary!("cos", |x: f64| x.to_radians().cos());
    register_unary!("tan", |x: f64| x.to_radians().tan());
    register_unary!("asin", |x: f64| x.asin().to_degrees());
    register_unary!("acos", |x: f64| x.acos().to_degrees());
    register_unary!("atan", |x: f64| x.atan().to_degrees());
    register_unary!("abs", f64::abs);
    register_unary!("ceil", f64::ceil);
    register_unary!("floor", f64::floor);
    register_unary!("round", f64::round);
    register_unary!("sqrt", f64::sqrt);
    register_unary!("exp", f64::exp);
    register_unary!("ln", f64::ln);
    register_unary!("log", f64::log10);
    register_unary!("sign", f64::signum);

    functions.insert("atan2", AbstractFunction::Builtin(|args| Value::Number(arg(args, 0).atan2(arg(args, 1)).to_degrees())));
    functions.insert("pow", AbstractFunction::Builtin(|args| Value::Number(arg(args, 0).powf(arg(args, 1)))));

    functions.insert(
        "min",
        AbstractFunction::Builtin(|args| fold_numeric(args, f64::MAX, f64::min)),
    );
    functions.insert(
        "max",
        AbstractFunction::Builtin(|args| fold_numeric(args, f64::MIN, f64::max)),
    );

    functions.insert(
        "len",
        AbstractFunction::Builtin(|args| match args.first() {
            Some(Value::Vector(v)) => Value::Number(v.len() as f64),
            Some(Value::String(s)) => Value::Number(s.chars().count() as f64),
            _ => Value::Undefined,
        }),
    );
}

/// `min`/`max` accept either several scalar arguments or one vector
/// argument, per the reference evaluator.
fn fold_numeric(args: &[Value], identity: f64, combine: impl Fn(f64, f64) -> f64) -> Value {
    let numbers: Vec<f64> = if let [Value::Vector(v)] = args {
        v.iter().filter_map(Value::as_number).collect()
    } else {
        args.iter().filter_map(Value::as_number).collect()
    };
    if numbers.is_empty() {
        return Value::Undefined;
    }
    Value::Number(numbers.into_iter().fold(identity, combine))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sin_of_ninety_degrees_is_one() {
        let mut functions = FunctionTable::new();
        register(&mut functions);
        let f = functions.lookup("sin").unwrap();
        let AbstractFunction::Builtin(f) = &*f else { panic!("expected builtin") };
        let Value::Number(result) = f(&[Value::Number(90.0)]) else { panic!("expected number") };
        assert!((result - 1.0).abs() < 1e-9);
    }

    #[test]
    fn max_accepts_a_single_vector_argument() {
        let mut functions = FunctionTable::new();
        register(&mut functions);
        let f = functions.lookup("max").unwrap();
        let AbstractFunction::Builtin(f) = &*f else { panic!("expected builtin") };
        assert_eq!(f(&[Value::Vector(vec![Value::Number(1.0), Value::Number(9.0), Value::Number(3.0)])]), Value::Number(9.0));
    }
}
