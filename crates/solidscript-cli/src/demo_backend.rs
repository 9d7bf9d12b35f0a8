//! A reference [`Tessellator`]/[`PolyhedronBackend`] pair bundled with the
//! CLI so it has something to render end to end. Neither implements real
//! geometry algorithms — mesh boolean algebra is explicitly out of scope
//! for the core — so `union` concatenates facets and
//! `intersection`/`difference` fall back to the left operand, which is
//! enough to exercise the pipeline and write a (geometrically approximate)
//! STL without pulling in an exact-arithmetic kernel.

use solidscript::{Mesh, PolyhedronBackend, Polyset, TessellationMode, Tessellator};

pub struct DemoTessellator;

impl Tessellator for DemoTessellator {
    fn tessellate(&self, primitive_label: &str, params: &[f64], mode: TessellationMode) -> Polyset {
        match primitive_label {
            "cube" => cube_polyset(params),
            "sphere" => sphere_polyset(params, mode),
            "cylinder" => cylinder_polyset(params, mode),
            _ => Polyset::default(),
        }
    }
}

fn cube_polyset(params: &[f64]) -> Polyset {
    let sx = params.first().copied().unwrap_or(1.0);
    let sy = params.get(1).copied().unwrap_or(1.0);
    let sz = params.get(2).copied().unwrap_or(1.0);
    let center = params.get(3).copied().unwrap_or(0.0) != 0.0;
    let (ox, oy, oz) = if center { (-sx / 2.0, -sy / 2.0, -sz / 2.0) } else { (0.0, 0.0, 0.0) };

    let vertices = vec![
        [ox, oy, oz],
        [ox + sx, oy, oz],
        [ox + sx, oy + sy, oz],
        [ox, oy + sy, oz],
        [ox, oy, oz + sz],
        [ox + sx, oy, oz + sz],
        [ox + sx, oy + sy, oz + sz],
        [ox, oy + sy, oz + sz],
    ];
    let facets = vec![
        vec![0, 1, 2, 3],
        vec![4, 7, 6, 5],
        vec![0, 4, 5, 1],
        vec![1, 5, 6, 2],
        vec![2, 6, 7, 3],
        vec![3, 7, 4, 0],
    ];
    Polyset { vertices, facets }
}

/// Ring count honors `$fn`-like resolution only coarsely: preview mode
/// always uses a cheap 8-segment approximation, exact mode scales with
/// radius up to a modest cap — good enough for a bundled demo, not a
/// faithful `$fn`/`$fs`/`$fa` implementation.
fn segments_for(mode: TessellationMode, radius: f64) -> usize {
    match mode {
        TessellationMode::Preview => 8,
        TessellationMode::Exact => (16.0 + radius * 4.0).min(64.0) as usize,
    }
}

fn sphere_polyset(params: &[f64], mode: TessellationMode) -> Polyset {
    let r = params.first().copied().unwrap_or(1.0);
    let rings = segments_for(mode, r).max(4);
    let segs = rings;

    let mut vertices = Vec::new();
    for i in 0..=rings {
        let theta = std::f64::consts::PI * i as f64 / rings as f64;
        let (st, ct) = theta.sin_cos();
        for j in 0..segs {
            let phi = 2.0 * std::f64::consts::PI * j as f64 / segs as f64;
            let (sp, cp) = phi.sin_cos();
            vertices.push([r * st * cp, r * st * sp, r * ct]);
        }
    }

    let mut facets = Vec::new();
    for i in 0..rings {
        for j in 0..segs {
            let next_j = (j + 1) % segs;
            let a = i * segs + j;
            let b = i * segs + next_j;
            let c = (i + 1) * segs + next_j;
            let d = (i + 1) * segs + j;
            facets.push(vec![a, b, c, d]);
        }
    }
    Polyset { vertices, facets }
}

fn cylinder_polyset(params: &[f64], mode: TessellationMode) -> Polyset {
    let h = params.first().copied().unwrap_or(1.0);
    let r1 = params.get(1).copied().unwrap_or(1.0);
    let r2 = params.get(2).copied().unwrap_or(1.0);
    let center = params.get(3).copied().unwrap_or(0.0) != 0.0;
    let segs = segments_for(mode, r1.max(r2)).max(3);
    let (z0, z1) = if center { (-h / 2.0, h / 2.0) } else { (0.0, h) };

    let mut vertices = Vec::with_capacity(segs * 2 + 2);
    for i in 0..segs {
        let phi = 2.0 * std::f64::consts::PI * i as f64 / segs as f64;
        let (s, c) = phi.sin_cos();
        vertices.push([r1 * c, r1 * s, z0]);
    }
    for i in 0..segs {
        let phi = 2.0 * std::f64::consts::PI * i as f64 / segs as f64;
        let (s, c) = phi.sin_cos();
        vertices.push([r2 * c, r2 * s, z1]);
    }
    let bottom_center = vertices.len();
    vertices.push([0.0, 0.0, z0]);
    let top_center = vertices.len();
    vertices.push([0.0, 0.0, z1]);

    let mut facets = Vec::new();
    for i in 0..segs {
        let next = (i + 1) % segs;
        facets.push(vec![i, next, segs + next, segs + i]);
        facets.push(vec![bottom_center, next, i]);
        facets.push(vec![top_center, segs + i, segs + next]);
    }
    Polyset { vertices, facets }
}

/// A mesh-holding opaque polyhedron handle. Cheap to clone since meshes are
/// reference-counted by the caller-visible [`Polyset`] upstream; this
/// backend keeps its own `Rc` for the same reason `CSGTerm::Primitive`
/// does.
#[derive(Clone)]
pub struct DemoPolyhedron {
    triangles: Vec<[[f64; 3]; 3]>,
}

pub struct DemoBackend;

fn triangulate_fan(polyset: &Polyset) -> Vec<[[f64; 3]; 3]> {
    let mut triangles = Vec::new();
    for facet in &polyset.facets {
        if facet.len() < 3 {
            continue;
        }
        let v0 = polyset.vertices[facet[0]];
        for pair in facet[1..].windows(2) {
            let v1 = polyset.vertices[pair[0]];
            let v2 = polyset.vertices[pair[1]];
            triangles.push([v0, v1, v2]);
        }
    }
    triangles
}

impl PolyhedronBackend for DemoBackend {
    type Polyhedron = DemoPolyhedron;

    fn from_polyset(&self, polyset: &Polyset) -> Self::Polyhedron {
        DemoPolyhedron {
            triangles: triangulate_fan(polyset),
        }
    }

    fn union(&self, a: &Self::Polyhedron, b: &Self::Polyhedron) -> Self::Polyhedron {
        let mut triangles = a.triangles.clone();
        triangles.extend(b.triangles.iter().copied());
        DemoPolyhedron { triangles }
    }

    /// Mesh boolean algebra is out of scope here; this reference backend
    /// approximates `intersection`/`difference` by
    /// returning the left operand unchanged rather than computing the true
    /// cut.
    fn intersection(&self, a: &Self::Polyhedron, _b: &Self::Polyhedron) -> Self::Polyhedron {
        a.clone()
    }

    fn difference(&self, a: &Self::Polyhedron, _b: &Self::Polyhedron) -> Self::Polyhedron {
        a.clone()
    }

    fn vertex_count(&self, p: &Self::Polyhedron) -> usize {
        p.triangles.len() * 3
    }

    fn is_simple(&self, p: &Self::Polyhedron) -> bool {
        !p.triangles.is_empty()
    }

    fn is_valid(&self, p: &Self::Polyhedron) -> bool {
        !p.triangles.is_empty()
    }

    fn convert_to_mesh(&self, p: &Self::Polyhedron) -> Mesh {
        Mesh { triangles: p.triangles.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_tessellates_to_eight_vertices() {
        let polyset = DemoTessellator.tessellate("cube", &[2.0, 2.0, 2.0, 0.0], TessellationMode::Preview);
        assert_eq!(polyset.vertex_count(), 8);
    }

    #[test]
    fn union_concatenates_triangle_lists() {
        let polyset = DemoTessellator.tessellate("cube", &[1.0, 1.0, 1.0, 0.0], TessellationMode::Preview);
        let backend = DemoBackend;
        let p = backend.from_polyset(&polyset);
        let combined = backend.union(&p, &p);
        assert_eq!(combined.triangles.len(), p.triangles.len() * 2);
    }
}
