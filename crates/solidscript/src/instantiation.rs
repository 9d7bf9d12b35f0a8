//! `ModuleInstanciation` (one call site) and `Module` (a parsed, top-level
//! or nested module body).

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::Context;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::expr::{Arg, Expression};
use crate::function::{AbstractModule, FunctionTable, ModuleTable};
use crate::node::AbstractNode;

/// One call site in the parsed script: `label modname(args) { children }`,
/// carrying the three modifier-character tags the core consumes
/// (`%` background, `#` highlight, `!` root — `*` disable is handled by the
/// external parser simply omitting the instantiation entirely).
pub struct ModuleInstanciation {
    pub label: String,
    pub modname: String,
    pub args: Vec<Arg>,
    pub children: Vec<ModuleInstanciation>,
    pub tag_root: bool,
    pub tag_highlight: bool,
    pub tag_background: bool,
    /// Contexts this instantiation is currently being evaluated under, used
    /// as the recursion guard: a recursive call is simply absent from its
    /// parent. A stack rather than a single slot: a
    /// recursive module's body is one static `ModuleInstanciation` shared
    /// across every call depth, so during `r(3)`'s call to `r(2)` this same
    /// node is simultaneously active under two different contexts. Only a
    /// *bare* cycle — the identical context recurring, which can't happen
    /// through a normal module call since each one gets a fresh child
    /// context — should trip the guard.
    active_ctxs: RefCell<Vec<Rc<Context>>>,
}

impl ModuleInstanciation {
    #[must_use]
    pub fn new(modname: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            label: String::new(),
            modname: modname.into(),
            args,
            children: Vec::new(),
            tag_root: false,
            tag_highlight: false,
            tag_background: false,
            active_ctxs: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<ModuleInstanciation>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn tagged(mut self, root: bool, highlight: bool, background: bool) -> Self {
        self.tag_root = root;
        self.tag_highlight = highlight;
        self.tag_background = background;
        self
    }

    /// Resolves `modname` in `ctx`'s module table and evaluates it, guarding
    /// against direct self-recursion: if this instantiation is already being
    /// evaluated somewhere up the call stack, the recursive call is aborted
    /// and reported, and the result is simply absent from the parent.
    pub fn evaluate(&self, ctx: &Rc<Context>, diags: &mut dyn DiagnosticSink) -> Option<AbstractNode> {
        if self.active_ctxs.borrow().iter().any(|active| Rc::ptr_eq(active, ctx)) {
            diags.report(Diagnostic::warning(format!(
                "ignoring recursive instantiation of module '{}'",
                self.modname
            )));
            return None;
        }

        let Some(module) = ctx.modules().lookup(&self.modname) else {
            diags.report(Diagnostic::warning(format!("ignoring unknown module '{}'", self.modname)));
            return None;
        };

        self.active_ctxs.borrow_mut().push(Rc::clone(ctx));
        let result = module.evaluate(ctx, self, diags);
        self.active_ctxs.borrow_mut().pop();
        result
    }
}

/// A parsed module body: the top-level script is modeled as one anonymous
/// `Module` evaluated against the root context.
pub struct Module {
    pub params: Vec<crate::function::Param>,
    pub assignments: Vec<(String, Expression)>,
    pub functions: Rc<FunctionTable>,
    pub modules: Rc<ModuleTable>,
    pub children: Vec<ModuleInstanciation>,
}

impl Module {
    #[must_use]
    pub fn new(functions: Rc<FunctionTable>, modules: Rc<ModuleTable>) -> Self {
        Self {
            params: Vec::new(),
            assignments: Vec::new(),
            functions,
            modules,
            children: Vec::new(),
        }
    }

    /// Wraps this module as an anonymous, argument-less [`AbstractModule`]
    /// so the top level can be evaluated through the same `evaluate` path as
    /// any user module.
    #[must_use]
    pub fn into_abstract_module(self) -> AbstractModule {
        AbstractModule::UserModule {
            params: self.params,
            assignments: self.assignments,
            functions: Some(self.functions),
            modules: Some(self.modules),
            children: self.children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn unknown_module_reports_and_returns_none() {
        let ctx = Context::root(Rc::new(FunctionTable::new()), Rc::new(ModuleTable::new()));
        let inst = ModuleInstanciation::new("does_not_exist", vec![]);
        let mut sink = crate::diagnostics::CollectingSink::default();
        assert!(inst.evaluate(&ctx, &mut sink).is_none());
        assert_eq!(sink.diagnostics.len(), 1);
    }

    #[test]
    fn group_module_evaluates_call_site_children() {
        let mut modules = ModuleTable::new();
        modules.insert("group", AbstractModule::Group);
        let ctx = Context::root(Rc::new(FunctionTable::new()), Rc::new(modules));

        let leaf = ModuleInstanciation::new("cube", vec![Arg::positional(Expression::Constant(Value::Number(1.0)))]);
        // "cube" isn't registered here, so it reports and yields no node —
        // this test only exercises group's call-site-children composition.
        let inst = ModuleInstanciation::new("group", vec![]).with_children(vec![leaf]);
        let mut sink = crate::diagnostics::CollectingSink::default();
        let node = inst.evaluate(&ctx, &mut sink).expect("group always produces a node");
        assert_eq!(node.label, "group");
        assert!(node.children.is_empty());
        assert_eq!(sink.diagnostics.len(), 1);
    }
}
