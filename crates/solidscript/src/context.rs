//! Lexical scope chain plus the dynamic stack used for `$`-prefixed
//! configuration variables.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::function::{FunctionTable, ModuleTable};
use crate::value::Value;

/// One scope frame.
///
/// `parent` links form a tree rooted at the single global context created
/// per compilation — no context outlives its parent — enforced here by
/// `Rc` rather than a raw/borrowed pointer, since
/// Rust has no "the caller promises to outlive this" borrow that would
/// survive being stored across an arbitrary call tree).
pub struct Context {
    parent: Option<Rc<Context>>,
    locals: RefCell<AHashMap<String, Value>>,
    config: RefCell<AHashMap<String, Value>>,
    functions: Rc<FunctionTable>,
    modules: Rc<ModuleTable>,
}

thread_local! {
    /// The dynamic stack of currently-evaluating contexts, walked for
    /// `$`-variable lookups. Strictly LIFO: pushed by
    /// [`Context::activate`], popped when the returned guard drops.
    static DYNAMIC_STACK: RefCell<Vec<Rc<Context>>> = const { RefCell::new(Vec::new()) };
}

/// RAII guard that pops its context off the dynamic stack on drop.
///
/// Holding this across a `.await`-free, single-threaded recursive descent is
/// exactly the right lifecycle: pushed on creation, popped on
/// destruction, strictly LIFO.
pub struct ActiveContext {
    _ctx: Rc<Context>,
}

impl Drop for ActiveContext {
    fn drop(&mut self) {
        DYNAMIC_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

impl Context {
    /// Builds the root context with the four standard configuration
    /// variables installed.
    #[must_use]
    pub fn root(functions: Rc<FunctionTable>, modules: Rc<ModuleTable>) -> Rc<Context> {
        let ctx = Rc::new(Context {
            parent: None,
            locals: RefCell::new(AHashMap::new()),
            config: RefCell::new(AHashMap::new()),
            functions,
            modules,
        });
        ctx.set_config("$fn", Value::Number(0.0));
        ctx.set_config("$fs", Value::Number(1.0));
        ctx.set_config("$fa", Value::Number(12.0));
        ctx.set_config("$t", Value::Number(0.0));
        ctx
    }

    /// Creates a child scope inheriting the parent's function/module tables.
    /// Module evaluation installs its own tables afterward via
    /// [`Context::with_tables`].
    #[must_use]
    pub fn child(parent: &Rc<Context>) -> Rc<Context> {
        Rc::new(Context {
            parent: Some(Rc::clone(parent)),
            locals: RefCell::new(AHashMap::new()),
            config: RefCell::new(AHashMap::new()),
            functions: Rc::clone(&parent.functions),
            modules: Rc::clone(&parent.modules),
        })
    }

    /// Creates a child scope with its own function/module visibility,
    /// for a module body whose locally defined functions/modules shadow
    /// the enclosing scope.
    #[must_use]
    pub fn child_with_tables(parent: &Rc<Context>, functions: Rc<FunctionTable>, modules: Rc<ModuleTable>) -> Rc<Context> {
        Rc::new(Context {
            parent: Some(Rc::clone(parent)),
            locals: RefCell::new(AHashMap::new()),
            config: RefCell::new(AHashMap::new()),
            functions,
            modules,
        })
    }

    /// Pushes `self` onto the dynamic stack; the returned guard pops it.
    #[must_use]
    pub fn activate(self: &Rc<Context>) -> ActiveContext {
        DYNAMIC_STACK.with(|stack| stack.borrow_mut().push(Rc::clone(self)));
        ActiveContext { _ctx: Rc::clone(self) }
    }

    /// `set(name, value)` — defines or replaces in the current scope only.
    pub fn set(&self, name: &str, value: Value) {
        self.locals.borrow_mut().insert(name.to_owned(), value);
    }

    fn set_config(&self, name: &str, value: Value) {
        self.config.borrow_mut().insert(name.to_owned(), value);
    }

    /// `lookup(name)` — walks the lexical parent chain for ordinary names,
    /// or the dynamic context stack (most recent first) for `$`-prefixed
    /// configuration variables. Returns `Undefined` if not found.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Value {
        if let Some(stripped) = name.strip_prefix('$') {
            return Self::lookup_dynamic(stripped);
        }
        let mut ctx = self;
        loop {
            if let Some(v) = ctx.locals.borrow().get(name) {
                return v.clone();
            }
            match &ctx.parent {
                Some(p) => ctx = &*p,
                None => return Value::Undefined,
            }
        }
    }

    fn lookup_dynamic(name: &str) -> Value {
        DYNAMIC_STACK.with(|stack| {
            for ctx in stack.borrow().iter().rev() {
                if let Some(v) = ctx.config.borrow().get(name) {
                    return v.clone();
                }
            }
            Value::Undefined
        })
    }

    /// Sets a `$`-prefixed configuration variable in the current scope,
    /// visible to callees that walk the dynamic stack.
    pub fn set_dollar(&self, name: &str, value: Value) {
        let stripped = name.strip_prefix('$').unwrap_or(name);
        self.set_config(stripped, value);
    }

    #[must_use]
    pub fn functions(&self) -> &Rc<FunctionTable> {
        &self.functions
    }

    #[must_use]
    pub fn modules(&self) -> &Rc<ModuleTable> {
        &self.modules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_lookup_local() {
        let ctx = Context::root(Rc::new(FunctionTable::new()), Rc::new(ModuleTable::new()));
        ctx.set("x", Value::Number(1.0));
        assert_eq!(ctx.lookup("x"), Value::Number(1.0));
        assert_eq!(ctx.lookup("y"), Value::Undefined);
    }

    #[test]
    fn child_sees_parent_locals_but_not_vice_versa() {
        let root = Context::root(Rc::new(FunctionTable::new()), Rc::new(ModuleTable::new()));
        root.set("x", Value::Number(1.0));
        let child = Context::child(&root);
        child.set("y", Value::Number(2.0));
        assert_eq!(child.lookup("x"), Value::Number(1.0));
        assert_eq!(root.lookup("y"), Value::Undefined);
    }

    #[test]
    fn dollar_variables_follow_dynamic_stack_not_lexical_parent() {
        let root = Context::root(Rc::new(FunctionTable::new()), Rc::new(ModuleTable::new()));
        let _root_guard = root.activate();
        assert_eq!(root.lookup("$fn"), Value::Number(0.0));

        let callee = Context::child(&root);
        let _callee_guard = callee.activate();
        callee.set_dollar("$fn", Value::Number(64.0));
        // A third, lexically-unrelated context still sees the dynamically
        // nearest $fn because it walks the *dynamic* stack.
        let unrelated = Context::root(Rc::new(FunctionTable::new()), Rc::new(ModuleTable::new()));
        assert_eq!(unrelated.lookup("$fn"), Value::Number(64.0));
    }
}
