//! `AbstractFunction` / `AbstractModule` registries and the shared
//! argument-binding algorithm used by both.

use std::rc::Rc;

use ahash::AHashMap;

use crate::context::Context;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::expr::{Arg, Expression};
use crate::instantiation::ModuleInstanciation;
use crate::node::AbstractNode;
use crate::value::Value;

/// One positional-or-keyword parameter declaration: a name plus an optional
/// default expression, evaluated in the callee's context.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub default: Option<Expression>,
}

impl Param {
    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    #[must_use]
    pub fn with_default(name: impl Into<String>, default: Expression) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
        }
    }
}

/// Binds call-site arguments to parameters and installs them into
/// `child_ctx`. Evaluation order is exact:
/// 1. call-site argument expressions are evaluated in the *caller's* context;
/// 2. positional arguments fill the next unused parameter in order;
/// 3. named arguments override, by name, regardless of position;
/// 4. any parameter left unbound gets its default, evaluated in the
///    *callee's* context, after step 2/3 — so later defaults can see earlier
///    parameters.
pub fn bind_args(
    params: &[Param],
    call_args: &[Arg],
    caller_ctx: &Rc<Context>,
    child_ctx: &Rc<Context>,
    diags: &mut dyn DiagnosticSink,
) {
    let values: Vec<(Option<&str>, Value)> = call_args
        .iter()
        .map(|a| (a.name.as_deref(), a.expr.evaluate(caller_ctx, diags)))
        .collect();

    let mut bound = vec![false; params.len()];
    let mut next_positional = 0usize;

    // Named arguments bind first so a later positional pass only fills what
    // remains — matches "named arguments override" being independent of
    // position.
    for (name, value) in &values {
        if let Some(name) = name {
            if let Some(idx) = params.iter().position(|p| p.name == *name) {
                child_ctx.set(&params[idx].name, value.clone());
                bound[idx] = true;
            } else {
                diags.report(Diagnostic::warning(format!("ignoring unknown argument '{name}'")));
            }
        }
    }
    for (name, value) in &values {
        if name.is_some() {
            continue;
        }
        while next_positional < bound.len() && bound[next_positional] {
            next_positional += 1;
        }
        if next_positional >= params.len() {
            diags.report(Diagnostic::warning("ignoring extra positional argument"));
            continue;
        }
        child_ctx.set(&params[next_positional].name, value.clone());
        bound[next_positional] = true;
        next_positional += 1;
    }

    for (idx, param) in params.iter().enumerate() {
        if bound[idx] {
            continue;
        }
        let value = param
            .default
            .as_ref()
            .map_or(Value::Undefined, |d| d.evaluate(child_ctx, diags));
        child_ctx.set(&param.name, value);
    }
}

pub type BuiltinFn = fn(&[Value]) -> Value;

/// A callable resolved through a [`FunctionTable`].
pub enum AbstractFunction {
    Builtin(BuiltinFn),
    UserFunction { params: Vec<Param>, body: Expression },
}

impl AbstractFunction {
    pub fn call(&self, caller_ctx: &Rc<Context>, args: &[Arg], diags: &mut dyn DiagnosticSink) -> Value {
        match self {
            Self::Builtin(f) => {
                let values: Vec<Value> = args.iter().map(|a| a.expr.evaluate(caller_ctx, diags)).collect();
                f(&values)
            }
            Self::UserFunction { params, body } => {
                let child = Context::child(caller_ctx);
                bind_args(params, args, caller_ctx, &child, diags);
                let _guard = child.activate();
                body.evaluate(&child, diags)
            }
        }
    }
}

/// A callable resolved through a [`ModuleTable`], producing an
/// [`AbstractNode`] tree.
pub enum AbstractModule {
    /// No-op grouping module — `group() { ... }` and the implicit module
    /// OpenSCAD registers under that name (`module.cc::initialize_builtin_modules`).
    Group,
    Builtin {
        params: Vec<Param>,
        eval: BuiltinModuleFn,
    },
    UserModule {
        params: Vec<Param>,
        assignments: Vec<(String, Expression)>,
        /// `None` means this module declares no functions/modules of its
        /// own and its body should just see whatever table is active at
        /// the call site — the same rule `AbstractFunction::UserFunction`
        /// already follows via `Context::child`. This is what lets a
        /// module call itself: a parser that doesn't track locally-nested
        /// definitions can leave these `None` and recursive lookups resolve
        /// through the caller's (eventually fully-populated) table instead
        /// of a private one that could never contain the module's own name.
        functions: Option<Rc<FunctionTable>>,
        modules: Option<Rc<ModuleTable>>,
        children: Vec<ModuleInstanciation>,
    },
}

/// A builtin module body: given the context with its parameters already
/// bound and the instantiation (for tag bits and inherited children), it
/// either produces a node directly (primitives, transforms, csg ops) or
/// returns `None`.
pub type BuiltinModuleFn = fn(&Rc<Context>, &ModuleInstanciation, &mut dyn DiagnosticSink) -> Option<AbstractNode>;

impl AbstractModule {
    /// `Module.evaluate(parent_ctx, inst) -> AbstractNode`.
    pub fn evaluate(
        &self,
        parent_ctx: &Rc<Context>,
        inst: &ModuleInstanciation,
        diags: &mut dyn DiagnosticSink,
    ) -> Option<AbstractNode> {
        match self {
            Self::Group => Some(Self::evaluate_group_like(parent_ctx, inst, diags)),
            Self::Builtin { params, eval } => {
                let child = Context::child(parent_ctx);
                bind_args(params, &inst.args, parent_ctx, &child, diags);
                let _guard = child.activate();
                eval(&child, inst, diags)
            }
            Self::UserModule {
                params,
                assignments,
                functions,
                modules,
                children,
            } => {
                let resolved_functions = functions.clone().unwrap_or_else(|| Rc::clone(parent_ctx.functions()));
                let resolved_modules = modules.clone().unwrap_or_else(|| Rc::clone(parent_ctx.modules()));
                let child = Context::child_with_tables(parent_ctx, resolved_functions, resolved_modules);
                bind_args(params, &inst.args, parent_ctx, &child, diags);
                let _guard = child.activate();

                for (name, expr) in assignments {
                    let value = expr.evaluate(&child, diags);
                    child.set(name, value);
                }

                let mut node = AbstractNode::new_group(inst);
                for lexical_child in children {
                    if let Some(n) = lexical_child.evaluate(&child, diags) {
                        node.children.push(n);
                    }
                }
                // Inherited children: the call site's own children, evaluated
                // under the *call site's* context —
                // how `module foo() { child(); }` composition works.
                for inherited in &inst.children {
                    if let Some(n) = inherited.evaluate(parent_ctx, diags) {
                        node.children.push(n);
                    }
                }
                Some(node)
            }
        }
    }

    /// `group()`/the implicit top-level grouping behaviour: evaluate lexical
    /// children, then append the call site's own children unmodified.
    fn evaluate_group_like(parent_ctx: &Rc<Context>, inst: &ModuleInstanciation, diags: &mut dyn DiagnosticSink) -> AbstractNode {
        let mut node = AbstractNode::new_group(inst);
        for child in &inst.children {
            if let Some(n) = child.evaluate(parent_ctx, diags) {
                node.children.push(n);
            }
        }
        node
    }
}

/// Chained name table: a local map shadowing an optional enclosing table,
/// mirroring "resolves the function name through the Context's function
/// table by walking parent links", generalized to modules too.
pub struct FunctionTable {
    parent: Option<Rc<FunctionTable>>,
    local: AHashMap<String, Rc<AbstractFunction>>,
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: None,
            local: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn child(parent: &Rc<FunctionTable>) -> Self {
        Self {
            parent: Some(Rc::clone(parent)),
            local: AHashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, f: AbstractFunction) {
        self.local.insert(name.into(), Rc::new(f));
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Rc<AbstractFunction>> {
        if let Some(f) = self.local.get(name) {
            return Some(Rc::clone(f));
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }
}

pub struct ModuleTable {
    parent: Option<Rc<ModuleTable>>,
    local: AHashMap<String, Rc<AbstractModule>>,
}

impl Default for ModuleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: None,
            local: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn child(parent: &Rc<ModuleTable>) -> Self {
        Self {
            parent: Some(Rc::clone(parent)),
            local: AHashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, m: AbstractModule) {
        self.local.insert(name.into(), Rc::new(m));
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Rc<AbstractModule>> {
        if let Some(m) = self.local.get(name) {
            return Some(Rc::clone(m));
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn positional_then_named_then_defaults() {
        let functions = Rc::new(FunctionTable::new());
        let modules = Rc::new(ModuleTable::new());
        let parent = Context::root(Rc::clone(&functions), Rc::clone(&modules));
        let child = Context::child(&parent);
        let mut sink = crate::diagnostics::NullSink;

        let params = vec![
            Param::required("a"),
            Param::with_default("b", Expression::Constant(Value::Number(9.0))),
            Param::required("c"),
        ];
        let args = vec![
            Arg::positional(Expression::Constant(Value::Number(1.0))),
            Arg::named("c", Expression::Constant(Value::Number(3.0))),
        ];
        bind_args(&params, &args, &parent, &child, &mut sink);

        assert_eq!(child.lookup("a"), Value::Number(1.0));
        assert_eq!(child.lookup("b"), Value::Number(9.0));
        assert_eq!(child.lookup("c"), Value::Number(3.0));
    }

    #[test]
    fn unknown_named_argument_warns() {
        let parent = Context::root(Rc::new(FunctionTable::new()), Rc::new(ModuleTable::new()));
        let child = Context::child(&parent);
        let mut sink = crate::diagnostics::CollectingSink::default();
        let params = vec![Param::required("a")];
        let args = vec![Arg::named("nope", Expression::Constant(Value::Number(1.0)))];
        bind_args(&params, &args, &parent, &child, &mut sink);
        assert_eq!(sink.diagnostics.len(), 1);
    }
}
