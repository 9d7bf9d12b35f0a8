//! End-to-end `compile()`/`render_polyhedron()` coverage over a handful of
//! worked scenarios: a single primitive, `difference`, `union` with a
//! translated child, normalizer distribution over `intersection`,
//! self-recursive module calls, and the `%` background tag.
//! Trees are built directly through the public constructors rather than
//! through a text grammar — `solidscript` treats parsing as an external
//! collaborator (see `backend::ScriptParser`), so there is no in-crate
//! parser to drive these through text.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use solidscript::chain::ChainOp;
use solidscript::{
    builtins, compile, render_polyhedron, Arg, CompileOptions, Expression, FunctionTable, Mesh, Module, ModuleInstanciation, ModuleTable,
    NeverCancel, NullProgress, Param, PolyhedronBackend, PolyhedronCache, RenderResult, ScriptParser, TessellationMode, Tessellator, Value,
};

/// Hands back a pre-built [`Module`] exactly once, standing in for a real
/// text parser so each test can describe its scenario as a tree instead of
/// as source text.
struct OnceParser(RefCell<Option<Module>>);

impl OnceParser {
    fn new(module: Module) -> Self {
        Self(RefCell::new(Some(module)))
    }
}

impl ScriptParser for OnceParser {
    fn parse(&self, _text: &str) -> Option<Module> {
        self.0.borrow_mut().take()
    }
}

fn cube_inst(size: f64) -> ModuleInstanciation {
    ModuleInstanciation::new("cube", vec![Arg::positional(Expression::Constant(Value::Number(size)))])
}

/// Builtins plus any `modname -> UserModule` entries the scenario needs,
/// wrapped into a [`Module`] whose `children` are the given top-level call
/// sites.
fn module_with(extra_modules: impl FnOnce(&mut ModuleTable), children: Vec<ModuleInstanciation>) -> Module {
    let mut functions = FunctionTable::new();
    let mut modules = ModuleTable::new();
    builtins::register_all(&mut functions, &mut modules);
    extra_modules(&mut modules);
    let mut module = Module::new(Rc::new(functions), Rc::new(modules));
    module.children = children;
    module
}

/// A tessellator/backend pair that only needs to exist so `render_polyhedron`
/// has something to call; these tests check chain shape (labels/operators),
/// not geometry.
struct StubTessellator;
impl Tessellator for StubTessellator {
    fn tessellate(&self, _primitive_label: &str, _params: &[f64], _mode: TessellationMode) -> solidscript::Polyset {
        solidscript::Polyset::default()
    }
}

struct StubBackend;
impl PolyhedronBackend for StubBackend {
    type Polyhedron = ();
    fn from_polyset(&self, _polyset: &solidscript::Polyset) {}
    fn union(&self, _a: &(), _b: &()) {}
    fn intersection(&self, _a: &(), _b: &()) {}
    fn difference(&self, _a: &(), _b: &()) {}
    fn vertex_count(&self, _p: &()) -> usize {
        0
    }
    fn is_simple(&self, _p: &()) -> bool {
        true
    }
    fn is_valid(&self, _p: &()) -> bool {
        true
    }
    fn convert_to_mesh(&self, _p: &()) -> Mesh {
        Mesh::default()
    }
}

fn render(module: Module) -> RenderResult {
    let parser = OnceParser::new(module);
    let compilation = compile("", &parser, &mut NeverCancel).expect("compiles");
    assert!(compilation.diagnostics.is_empty(), "unexpected diagnostics: {:?}", compilation.diagnostics);
    let root = compilation.root_node.expect("root node");
    let mut cache = PolyhedronCache::default();
    render_polyhedron(
        &root,
        &StubTessellator,
        TessellationMode::Preview,
        &StubBackend,
        &mut cache,
        &CompileOptions::default(),
        &mut NeverCancel,
        &mut NullProgress,
    )
}

#[test]
fn single_cube_produces_a_one_entry_chain() {
    let module = module_with(|_| {}, vec![cube_inst(10.0)]);
    let result = render(module);
    assert_eq!(result.chain.labels, vec!["cube".to_string()]);
    assert_eq!(result.chain.operators, vec![ChainOp::Union]);
}

#[test]
fn difference_orders_the_subtrahend_after_the_minuend() {
    let module = module_with(
        |_| {},
        vec![ModuleInstanciation::new("difference", vec![]).with_children(vec![
            cube_inst(10.0),
            ModuleInstanciation::new("sphere", vec![Arg::positional(Expression::Constant(Value::Number(6.0)))]),
        ])],
    );
    let result = render(module);
    assert_eq!(result.chain.labels, vec!["cube".to_string(), "sphere".to_string()]);
    assert_eq!(result.chain.operators, vec![ChainOp::Union, ChainOp::Difference]);
}

#[test]
fn union_keeps_a_translated_child_as_a_separate_entry() {
    let translated = ModuleInstanciation::new(
        "translate",
        vec![Arg::positional(Expression::Vector(vec![
            Expression::Constant(Value::Number(20.0)),
            Expression::Constant(Value::Number(0.0)),
            Expression::Constant(Value::Number(0.0)),
        ]))],
    )
    .with_children(vec![cube_inst(10.0)]);
    let module = module_with(|_| {}, vec![ModuleInstanciation::new("union", vec![]).with_children(vec![cube_inst(10.0), translated])]);
    let result = render(module);
    assert_eq!(result.chain.labels, vec!["cube".to_string(), "cube".to_string()]);
    assert_eq!(result.chain.operators, vec![ChainOp::Union, ChainOp::Union]);
    // the second cube is offset by the translate, the first isn't.
    assert_eq!(result.chain.transforms[0][0][3], 0.0);
    assert_eq!(result.chain.transforms[1][0][3], 20.0);
}

#[test]
fn intersection_distributes_over_a_nested_union_on_the_left() {
    // intersection(){ union(){ a(); b(); } c(); } normalizes to
    // (a ∩ c) ∪ (b ∩ c) — each branch of the union still has to clear c.
    let module = module_with(
        |modules| {
            modules.insert(
                "a",
                solidscript::AbstractModule::UserModule {
                    params: vec![],
                    assignments: vec![],
                    functions: None,
                    modules: None,
                    children: vec![cube_inst(1.0)],
                },
            );
            modules.insert(
                "b",
                solidscript::AbstractModule::UserModule {
                    params: vec![],
                    assignments: vec![],
                    functions: None,
                    modules: None,
                    children: vec![cube_inst(2.0)],
                },
            );
            modules.insert(
                "c",
                solidscript::AbstractModule::UserModule {
                    params: vec![],
                    assignments: vec![],
                    functions: None,
                    modules: None,
                    children: vec![cube_inst(3.0)],
                },
            );
        },
        vec![ModuleInstanciation::new("intersection", vec![]).with_children(vec![
            ModuleInstanciation::new("union", vec![]).with_children(vec![
                ModuleInstanciation::new("a", vec![]),
                ModuleInstanciation::new("b", vec![]),
            ]),
            ModuleInstanciation::new("c", vec![]),
        ])],
    );
    let result = render(module);
    // c is reachable through both intersection branches, so it is visited (and chained) twice:
    // the chain mirrors render visits, not distinct primitives.
    assert_eq!(result.chain.labels, vec!["a".to_string(), "c".to_string(), "b".to_string(), "c".to_string()]);
    assert_eq!(result.chain.operators, vec![ChainOp::Union, ChainOp::Intersection, ChainOp::Union, ChainOp::Intersection]);
}

/// `module r(n) { if (n > 0) { cube(n); r(n - 1); } } r(3);` — each call is
/// a distinct instantiation, so direct recursion through the module's own
/// name produces no recursion warning and one cube per depth.
fn recursive_r_module() -> Module {
    let if_body = ModuleInstanciation::new("if", vec![Arg::named("condition", Expression::Gt(Box::new(Expression::LookupVar("n".to_owned())), Box::new(Expression::Constant(Value::Number(0.0)))))])
        .with_children(vec![
            cube_inst_from_var(),
            ModuleInstanciation::new(
                "r",
                vec![Arg::positional(Expression::Sub(
                    Box::new(Expression::LookupVar("n".to_owned())),
                    Box::new(Expression::Constant(Value::Number(1.0))),
                ))],
            ),
        ]);

    module_with(
        |modules| {
            modules.insert(
                "r",
                solidscript::AbstractModule::UserModule {
                    params: vec![Param::required("n")],
                    assignments: vec![],
                    functions: None,
                    modules: None,
                    children: vec![if_body],
                },
            );
        },
        vec![ModuleInstanciation::new("r", vec![Arg::positional(Expression::Constant(Value::Number(3.0)))])],
    )
}

fn cube_inst_from_var() -> ModuleInstanciation {
    ModuleInstanciation::new("cube", vec![Arg::positional(Expression::LookupVar("n".to_owned()))])
}

#[test]
fn recursive_module_call_produces_one_cube_per_depth_with_no_warning() {
    let compilation_diags = {
        let parser = OnceParser::new(recursive_r_module());
        let compilation = compile("", &parser, &mut NeverCancel).expect("compiles");
        assert!(
            compilation.diagnostics.is_empty(),
            "direct recursion through distinct instantiations should not warn: {:?}",
            compilation.diagnostics
        );
        compilation
    };
    let root = compilation_diags.root_node.expect("root node");
    let mut cache = PolyhedronCache::default();
    let result = render_polyhedron(
        &root,
        &StubTessellator,
        TessellationMode::Preview,
        &StubBackend,
        &mut cache,
        &CompileOptions::default(),
        &mut NeverCancel,
        &mut NullProgress,
    );
    assert_eq!(result.chain.labels, vec!["cube".to_string(); 3], "r(3), r(2), r(1) each produce one cube before r(0) stops");
}

#[test]
fn background_tagged_recursive_call_has_an_empty_main_chain_and_a_populated_background_chain() {
    let mut module = recursive_r_module();
    module.children = vec![ModuleInstanciation::new("r", vec![Arg::positional(Expression::Constant(Value::Number(3.0)))]).tagged(false, false, true)];

    let parser = OnceParser::new(module);
    let compilation = compile("", &parser, &mut NeverCancel).expect("compiles");
    let root = compilation.root_node.expect("root node");
    let mut cache = PolyhedronCache::default();
    let result = render_polyhedron(
        &root,
        &StubTessellator,
        TessellationMode::Preview,
        &StubBackend,
        &mut cache,
        &CompileOptions::default(),
        &mut NeverCancel,
        &mut NullProgress,
    );
    assert!(result.chain.is_empty(), "the %-tagged subtree is hoisted out of the main chain");
    assert_eq!(result.backgrounds_chain.labels, vec!["cube".to_string(); 3]);
}
