//! The top-level `compile()` entry point: parse -> evaluate -> render ->
//! normalize -> linearize.

use std::rc::Rc;

use crate::backend::{NeverCancel, NullProgress, PolyhedronBackend, ProgressSink, ScriptParser, Tessellator, TessellationMode, YieldHook, YieldSignal};
use crate::cache::PolyhedronCache;
use crate::chain::CSGChain;
use crate::context::Context;
use crate::csg::{CSGTerm, RenderedTerms};
use crate::diagnostics::{CollectingSink, Diagnostic, DiagnosticSink};
use crate::error::CompileError;
use crate::instantiation::ModuleInstanciation;
use crate::node::AbstractNode;

/// Tunable safety caps: cache vertex budget, chain length, recursion depth.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    pub cache_vertex_budget: usize,
    pub chain_safety_cap: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            cache_vertex_budget: crate::cache::DEFAULT_VERTEX_BUDGET,
            chain_safety_cap: crate::chain::SAFETY_CAP,
        }
    }
}

/// Everything `compile()` produces: the abstract tree plus whatever
/// diagnostics evaluation reported. Turning this into rendered chains is a
/// separate step ([`render_polyhedron`]) since it needs a [`Tessellator`]
/// and a [`PolyhedronBackend`], both external collaborators.
#[derive(Default)]
pub struct CompilationResult {
    pub root_node: Option<AbstractNode>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Everything [`render_polyhedron`] produces from a compiled root node.
#[derive(Default)]
pub struct RenderResult {
    pub raw_term: Option<Rc<CSGTerm>>,
    pub normalized_term: Option<Rc<CSGTerm>>,
    pub chain: CSGChain,
    pub highlights_chain: CSGChain,
    pub backgrounds_chain: CSGChain,
    pub diagnostics: Vec<Diagnostic>,
    /// Set when a downstream boolean-operation backend reports a failure on
    /// at least one term; the compiled chain is still the best-effort
    /// result.
    pub backend_failed: bool,
}

/// Parses and evaluates `script_text` into an abstract node tree.
/// `yield_hook` is polled at phase boundaries only; the core never spawns
/// threads of its own.
pub fn compile(script_text: &str, parser: &dyn ScriptParser, yield_hook: &mut dyn YieldHook) -> Result<CompilationResult, CompileError> {
    let mut diags = CollectingSink::default();
    crate::node::reset_node_counter();

    let Some(module) = parser.parse(script_text) else {
        return Err(CompileError::ParseFailed("parser returned no module".to_owned()));
    };
    if yield_hook.poll() == YieldSignal::Cancel {
        return Ok(CompilationResult { diagnostics: diags.diagnostics, ..Default::default() });
    }

    let functions = Rc::clone(&module.functions);
    let modules = Rc::clone(&module.modules);
    let root_ctx = Context::root(functions, modules);
    let abstract_module = module.into_abstract_module();
    let top_level_call = ModuleInstanciation::new(String::new(), vec![]);

    let Some(root_node) = abstract_module.evaluate(&root_ctx, &top_level_call, &mut diags) else {
        return Err(CompileError::InvariantViolation("top-level module produced no node".to_owned()));
    };

    Ok(CompilationResult {
        root_node: Some(root_node),
        diagnostics: diags.diagnostics,
    })
}

/// Renders `root`'s CSG term(s) using `tessellator` to turn each primitive
/// node into a polyset, then normalizes and linearizes into chains,
/// checking `cache` first for each primitive.
#[expect(clippy::too_many_arguments, reason = "each external collaborator is a distinct dependency, not a config bag")]
pub fn render_polyhedron<B: PolyhedronBackend>(
    root: &AbstractNode,
    tessellator: &dyn Tessellator,
    mode: TessellationMode,
    backend: &B,
    cache: &mut PolyhedronCache<B::Polyhedron>,
    options: &CompileOptions,
    yield_hook: &mut dyn YieldHook,
    progress: &mut dyn ProgressSink,
) -> RenderResult {
    let leaf = |node: &AbstractNode, transform: crate::csg::Mat4| -> Option<Rc<CSGTerm>> {
        let polyset = if let Some(explicit) = &node.explicit_polyset {
            Rc::clone(explicit)
        } else {
            Rc::new(tessellator.tessellate(&node.label, &node.params, mode))
        };
        Some(CSGTerm::primitive(polyset, transform, node.label.clone()))
    };

    let RenderedTerms { primary, highlights, backgrounds } = root.render_csg_term(&leaf);

    let mut result = RenderResult { raw_term: primary.clone(), ..Default::default() };

    if let Some(primary) = primary {
        if yield_hook.poll() == YieldSignal::Cancel {
            return result;
        }
        let normalized = crate::normalize::normalize(&primary);
        result.normalized_term = Some(Rc::clone(&normalized));
        result.chain = CSGChain::from_term(&normalized);
        if result.chain.len() > options.chain_safety_cap {
            result.diagnostics.push(Diagnostic::warning("CSG chain exceeded the safety cap"));
        }
        warm_cache(&result.chain, backend, cache, &mut result, options);
        progress.report(0, result.chain.len(), result.chain.len());
    }

    for h in highlights {
        result.highlights_chain = CSGChain::from_term(&crate::normalize::normalize(&h));
    }
    for b in backgrounds {
        result.backgrounds_chain = CSGChain::from_term(&crate::normalize::normalize(&b));
    }

    result
}

fn warm_cache<B: PolyhedronBackend>(chain: &CSGChain, backend: &B, cache: &mut PolyhedronCache<B::Polyhedron>, result: &mut RenderResult, options: &CompileOptions) {
    for (polyset, label) in chain.polysets.iter().zip(&chain.labels) {
        let dump_key = format!("{label}_{}", polyset.vertex_count());
        if cache.get(&dump_key).is_some() {
            continue;
        }
        let rendered = backend.from_polyset(polyset);
        if !backend.is_valid(&rendered) {
            result.backend_failed = true;
        }
        cache.insert(&dump_key, rendered, polyset.vertex_count().min(options.cache_vertex_budget + 1));
    }
}

#[allow(unused)]
#[must_use]
pub fn default_yield_hook() -> impl YieldHook {
    NeverCancel
}

#[allow(unused)]
#[must_use]
pub fn default_progress_sink() -> impl ProgressSink {
    NullProgress
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{FunctionTable, ModuleTable};
    use crate::instantiation::Module;

    struct EmptyScriptParser;
    impl ScriptParser for EmptyScriptParser {
        fn parse(&self, _text: &str) -> Option<Module> {
            let mut functions = FunctionTable::new();
            let mut modules = ModuleTable::new();
            crate::builtins::register_all(&mut functions, &mut modules);
            Some(Module::new(Rc::new(functions), Rc::new(modules)))
        }
    }

    struct FailingParser;
    impl ScriptParser for FailingParser {
        fn parse(&self, _text: &str) -> Option<Module> {
            None
        }
    }

    #[test]
    fn parse_failure_is_a_compile_error() {
        let mut hook = NeverCancel;
        let result = compile("garbage", &FailingParser, &mut hook);
        assert!(matches!(result, Err(CompileError::ParseFailed(_))));
    }

    #[test]
    fn empty_module_compiles_to_a_root_node_with_no_children() {
        let mut hook = NeverCancel;
        let result = compile("", &EmptyScriptParser, &mut hook).expect("compiles");
        assert!(result.root_node.is_some());
    }
}
