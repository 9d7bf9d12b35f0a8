//! External-collaborator traits: everything the core pipeline consumes but
//! does not implement — script parsing, exact polyhedron arithmetic,
//! primitive tessellation, progress reporting, and cooperative
//! cancellation.

use crate::instantiation::Module;

/// A single vertex, stored flat for cheap hashing/snapping (see
/// [`crate::grid`]).
pub type Vertex3 = [f64; 3];

/// One tessellated facet set for a primitive, produced by a [`Tessellator`]
/// and consumed by a [`PolyhedronBackend`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Polyset {
    pub vertices: Vec<Vertex3>,
    /// Each facet is a list of indices into `vertices`, wound
    /// counter-clockwise when viewed from outside.
    pub facets: Vec<Vec<usize>>,
}

impl Polyset {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

/// A triangulated mesh ready for export via the ASCII STL writer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<[Vertex3; 3]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TessellationMode {
    /// Fast, coarse tessellation for interactive preview.
    Preview,
    /// Full-resolution tessellation honoring `$fn`/`$fs`/`$fa`.
    Exact,
}

/// Anything that can turn script text into a parsed [`Module`]. Returns
/// `None` on a parse failure — the diagnostic itself is reported by the
/// caller.
pub trait ScriptParser {
    fn parse(&self, text: &str) -> Option<Module>;
}

/// The exact-arithmetic polyhedron engine (e.g. a Nef-polyhedron backend).
/// `Polyhedron` is intentionally opaque to the core: it only needs to be
/// cheap to clone and composable through the three boolean operations.
pub trait PolyhedronBackend {
    type Polyhedron: Clone;

    fn from_polyset(&self, polyset: &Polyset) -> Self::Polyhedron;
    fn union(&self, a: &Self::Polyhedron, b: &Self::Polyhedron) -> Self::Polyhedron;
    fn intersection(&self, a: &Self::Polyhedron, b: &Self::Polyhedron) -> Self::Polyhedron;
    fn difference(&self, a: &Self::Polyhedron, b: &Self::Polyhedron) -> Self::Polyhedron;
    fn vertex_count(&self, p: &Self::Polyhedron) -> usize;
    fn is_simple(&self, p: &Self::Polyhedron) -> bool;
    fn is_valid(&self, p: &Self::Polyhedron) -> bool;
    fn convert_to_mesh(&self, p: &Self::Polyhedron) -> Mesh;
}

/// Converts a primitive (cube/sphere/cylinder/polyhedron) node into facets
/// at a given resolution.
pub trait Tessellator {
    fn tessellate(&self, primitive_label: &str, params: &[f64], mode: TessellationMode) -> Polyset;
}

/// Staged progress reporting, driven at phase boundaries.
pub trait ProgressSink {
    fn report(&mut self, node_index: usize, mark: usize, total: usize);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YieldSignal {
    Continue,
    Cancel,
}

/// Cooperative cancellation hook, polled at phase boundaries. The core never
/// spawns its own threads; it only calls this between phases.
pub trait YieldHook {
    fn poll(&mut self) -> YieldSignal;
}

/// A hook that never cancels, for callers with no cancellation policy.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverCancel;

impl YieldHook for NeverCancel {
    fn poll(&mut self) -> YieldSignal {
        YieldSignal::Continue
    }
}

/// A sink that discards progress reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&mut self, _node_index: usize, _mark: usize, _total: usize) {}
}
