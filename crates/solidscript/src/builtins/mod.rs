//! The builtin module/function registry: primitives, transforms, CSG
//! operators, control flow, and math functions, generalized from
//! `module.cc::initialize_builtin_modules`'s
//! `register_builtin_{csgops,transform,primitives,control}` split, plus the
//! math dispatch recovered from the reference evaluator.

pub mod control;
pub mod csgops;
pub mod mathfns;
pub mod primitives;
pub mod transform;

use crate::function::{FunctionTable, ModuleTable};

/// Populates `functions`/`modules` with every builtin this crate ships.
pub fn register_all(functions: &mut FunctionTable, modules: &mut ModuleTable) {
    mathfns::register(functions);
    primitives::register(modules);
    transform::register(modules);
    csgops::register(modules);
    control::register(modules);
}
