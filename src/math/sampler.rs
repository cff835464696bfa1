use std::collections::HashSet;
use std::str::FromStr;

use glam::DVec3;

use crate::error::{PlotError, Result};
use crate::math::colormap::{Colormap, SolidColor};
use crate::math::families::SurfaceFamily;

const PARALLEL_MIN_VERTICES: usize = 32_768;
const DEGENERATE_NORMAL: f64 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    X,
    #[default]
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSpec {
    pub family: SurfaceFamily,
    pub nu: usize,
    pub nv: usize,
    pub scale: f32,
    pub t: f32,
    pub colormap: Colormap,
    pub wireframe_color: SolidColor,
    pub color_axis: Axis,
}

impl SurfaceSpec {
    pub fn new(family: SurfaceFamily, nu: usize, nv: usize) -> Self {
        Self {
            family,
            nu,
            nv,
            scale: 1.0,
            t: 0.0,
            colormap: Colormap::Jet,
            wireframe_color: SolidColor::White,
            color_axis: Axis::Y,
        }
    }

    /// Builds a spec from catalog names as the parameter panel stores them.
    pub fn from_names(
        family: &str,
        nu: usize,
        nv: usize,
        scale: f32,
        colormap: &str,
        wireframe_color: &str,
        color_axis: Axis,
    ) -> Result<Self> {
        let spec = Self {
            family: SurfaceFamily::from_str(family)?,
            nu,
            nv,
            scale,
            t: 0.0,
            colormap: Colormap::from_str(colormap)?,
            wireframe_color: SolidColor::from_str(wireframe_color)?,
            color_axis,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_time(mut self, t: f32) -> Self {
        self.t = t;
        self
    }

    pub fn with_colors(mut self, colormap: Colormap, wireframe_color: SolidColor) -> Self {
        self.colormap = colormap;
        self.wireframe_color = wireframe_color;
        self
    }

    pub fn with_color_axis(mut self, axis: Axis) -> Self {
        self.color_axis = axis;
        self
    }

    pub fn vertex_count(&self) -> usize {
        (self.nu + 1) * (self.nv + 1)
    }

    fn validate(&self) -> Result<()> {
        if self.nu < 2 || self.nv < 2 {
            return Err(PlotError::InvalidGridResolution {
                nu: self.nu,
                nv: self.nv,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub colors_surface: Vec<f32>,
    pub colors_wireframe: Vec<f32>,
    pub indices_surface: Vec<u32>,
    pub indices_wireframe: Vec<u32>,
}

impl MeshBuffers {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn surface_index_count(&self) -> usize {
        self.indices_surface.len()
    }

    pub fn wireframe_index_count(&self) -> usize {
        self.indices_wireframe.len()
    }

    pub fn position(&self, k: usize) -> [f32; 3] {
        [
            self.positions[3 * k],
            self.positions[3 * k + 1],
            self.positions[3 * k + 2],
        ]
    }
}

#[derive(Clone, Copy, Default)]
struct Sample {
    position: DVec3,
    normal: DVec3,
}

/// Samples `spec.family` on an `(nu + 1) x (nv + 1)` grid.
///
/// Vertex `(i, j)` lives at index `i * (nv + 1) + j`. The seam ring of a periodic
/// direction is still emitted, but both index buffers reference ring 0 instead, so
/// the mesh closes on shared vertices.
pub fn generate(spec: &SurfaceSpec) -> Result<MeshBuffers> {
    spec.validate()?;

    let mut samples = evaluate_grid(spec);
    normalize_positions(&mut samples, spec.scale as f64);

    let vertex_count = samples.len();
    let mut positions = Vec::with_capacity(vertex_count * 3);
    let mut normals = Vec::with_capacity(vertex_count * 3);
    for s in &samples {
        positions.extend_from_slice(&s.position.as_vec3().to_array());
        normals.extend_from_slice(&s.normal.as_vec3().to_array());
    }

    let colors_surface = surface_colors(&positions, spec.colormap, spec.color_axis);
    let colors_wireframe = spec
        .wireframe_color
        .rgb()
        .repeat(vertex_count);

    let topology = GridTopology::new(spec);

    Ok(MeshBuffers {
        positions,
        normals,
        colors_surface,
        colors_wireframe,
        indices_surface: topology.triangles(),
        indices_wireframe: topology.edges(),
    })
}

fn evaluate_grid(spec: &SurfaceSpec) -> Vec<Sample> {
    let row_len = spec.nv + 1;
    let mut samples = vec![Sample::default(); spec.vertex_count()];

    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    if samples.len() < PARALLEL_MIN_VERTICES || workers < 2 {
        evaluate_rows(spec, 0, &mut samples);
        return samples;
    }

    let rows_per_worker = (spec.nu + 1).div_ceil(workers);
    let result = crossbeam::thread::scope(|scope| {
        for (chunk_index, chunk) in samples.chunks_mut(rows_per_worker * row_len).enumerate() {
            scope.spawn(move |_| evaluate_rows(spec, chunk_index * rows_per_worker, chunk));
        }
    });

    // A panicking worker means a bug in a family formula; surface it as-is.
    if let Err(payload) = result {
        std::panic::resume_unwind(payload);
    }

    samples
}

fn evaluate_rows(spec: &SurfaceSpec, first_row: usize, out: &mut [Sample]) {
    let domain = spec.family.domain();
    let row_len = spec.nv + 1;
    let t = spec.t as f64;

    for (offset, row) in out.chunks_mut(row_len).enumerate() {
        let i = first_row + offset;
        let u = domain.u_at(i, spec.nu);
        for (j, sample) in row.iter_mut().enumerate() {
            let v = domain.v_at(j, spec.nv);
            sample.position = spec.family.position(u, v, t);
            sample.normal = surface_normal(spec.family, u, v, t);
        }
    }
}

fn surface_normal(family: SurfaceFamily, u: f64, v: f64, t: f64) -> DVec3 {
    let n = family.raw_normal(u, v, t);
    if n.length_squared() > DEGENERATE_NORMAL && n.is_finite() {
        return n.normalize();
    }

    // Poles and cusps: borrow the normal from a point just inside the domain.
    let d = family.domain();
    let nudge_u = (d.u.1 - d.u.0) * 1e-3;
    let nudge_v = (d.v.1 - d.v.0) * 1e-3;
    let u = if u + nudge_u <= d.u.1 { u + nudge_u } else { u - nudge_u };
    let v = if v + nudge_v <= d.v.1 { v + nudge_v } else { v - nudge_v };

    family
        .raw_normal(u, v, t)
        .try_normalize()
        .unwrap_or(DVec3::Y)
}

fn normalize_positions(samples: &mut [Sample], scale: f64) {
    let mut min = DVec3::splat(f64::MAX);
    let mut max = DVec3::splat(f64::MIN);
    for s in samples.iter().filter(|s| s.position.is_finite()) {
        min = min.min(s.position);
        max = max.max(s.position);
    }
    if min.x > max.x {
        return;
    }

    let center = (min + max) * 0.5;
    let extent = (max - min).max_element().max(f64::EPSILON);
    // A negative factor negates both tangents, so their cross product and the
    // triangle winding are unchanged.
    let factor = scale / extent;

    for s in samples.iter_mut() {
        s.position = if s.position.is_finite() {
            (s.position - center) * factor
        } else {
            DVec3::ZERO
        };
    }
}

fn surface_colors(positions: &[f32], colormap: Colormap, axis: Axis) -> Vec<f32> {
    let k = axis.index();
    let (lo, hi) = positions
        .chunks_exact(3)
        .map(|p| p[k])
        .fold((f32::MAX, f32::MIN), |(lo, hi), c| (lo.min(c), hi.max(c)));
    let range = hi - lo;

    let stops = colormap.stops();
    positions
        .chunks_exact(3)
        .flat_map(|p| {
            let t = if range > f32::EPSILON {
                (p[k] - lo) / range
            } else {
                0.0
            };
            stops.sample(t)
        })
        .collect()
}

struct GridTopology {
    nu: usize,
    nv: usize,
    periodic_u: bool,
    periodic_v: bool,
}

impl GridTopology {
    fn new(spec: &SurfaceSpec) -> Self {
        let domain = spec.family.domain();
        Self {
            nu: spec.nu,
            nv: spec.nv,
            periodic_u: domain.periodic_u,
            periodic_v: domain.periodic_v,
        }
    }

    fn index(&self, i: usize, j: usize) -> u32 {
        let i = if self.periodic_u && i == self.nu { 0 } else { i };
        let j = if self.periodic_v && j == self.nv { 0 } else { j };
        (i * (self.nv + 1) + j) as u32
    }

    fn triangles(&self) -> Vec<u32> {
        let mut indices = Vec::with_capacity(self.nu * self.nv * 6);
        for i in 0..self.nu {
            for j in 0..self.nv {
                let a = self.index(i, j);
                let b = self.index(i + 1, j);
                let c = self.index(i, j + 1);
                let d = self.index(i + 1, j + 1);

                indices.extend_from_slice(&[a, b, c]);
                indices.extend_from_slice(&[c, b, d]);
            }
        }
        indices
    }

    fn edges(&self) -> Vec<u32> {
        let mut seen = HashSet::with_capacity(2 * (self.nu + 1) * (self.nv + 1));
        let mut indices = Vec::with_capacity(4 * (self.nu + 1) * (self.nv + 1));

        let mut push = |a: u32, b: u32| {
            if a != b && seen.insert((a.min(b), a.max(b))) {
                indices.push(a);
                indices.push(b);
            }
        };

        for i in 0..=self.nu {
            for j in 0..=self.nv {
                if i < self.nu {
                    push(self.index(i, j), self.index(i + 1, j));
                }
                if j < self.nv {
                    push(self.index(i, j), self.index(i, j + 1));
                }
            }
        }
        indices
    }
}
