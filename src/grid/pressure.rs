use rayon::prelude::*;

use super::{should_parallel, FlagGrid, GridDims, MacGrid, RealGrid};

/// Outcome of one pressure solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveStats {
    pub iterations: usize,
    /// Max-norm of the final residual
    pub residual: f32,
    pub converged: bool,
    pub unknowns: usize,
}

/// Scratch buffers reused between frames of one scene
#[derive(Debug, Default)]
struct Workspace {
    /// Cell index of every unknown
    cells: Vec<usize>,
    /// Unknown index per cell, `usize::MAX` for non-fluid cells
    slot: Vec<usize>,
    diag: Vec<f32>,
    rhs: Vec<f32>,
    x: Vec<f32>,
    residual: Vec<f32>,
    auxiliary: Vec<f32>,
    search: Vec<f32>,
}

/// Pressure projection by Jacobi-preconditioned conjugate gradient
///
/// Unknowns are the fluid cells. Obstacle neighbors contribute Neumann
/// conditions (their faces keep the imposed obstacle velocity); empty and
/// outflow neighbors are Dirichlet cells with zero pressure.
#[derive(Debug)]
pub struct PressureSolver {
    accuracy: f32,
    max_iterations: usize,
    workspace: Option<Workspace>,
}

impl PressureSolver {
    pub fn new(accuracy: f32, max_iterations: usize) -> Self {
        Self {
            accuracy,
            max_iterations,
            workspace: None,
        }
    }

    /// Drop the scratch buffers
    pub fn release(&mut self) {
        self.workspace = None;
    }

    pub fn has_workspace(&self) -> bool {
        self.workspace.is_some()
    }

    /// Make `vel` divergence free in all fluid cells, writing the pressure used
    pub fn solve(&mut self, flags: &FlagGrid, vel: &mut MacGrid, pressure: &mut RealGrid) -> SolveStats {
        let dims = vel.dims();
        let ws = self.workspace.get_or_insert_with(Workspace::default);
        build_system(ws, flags, vel, dims);

        let unknowns = ws.cells.len();
        pressure.clear();
        if unknowns == 0 {
            return SolveStats { iterations: 0, residual: 0.0, converged: true, unknowns };
        }

        let (iterations, residual) = conjugate_gradient(ws, dims, self.accuracy, self.max_iterations);

        for (k, &idx) in ws.cells.iter().enumerate() {
            pressure.set(idx, ws.x[k]);
        }
        apply_gradient(flags, vel, pressure, dims);

        SolveStats {
            iterations,
            residual,
            converged: residual < self.accuracy,
            unknowns,
        }
    }
}

fn build_system(ws: &mut Workspace, flags: &FlagGrid, vel: &MacGrid, dims: GridDims) {
    ws.cells.clear();
    ws.slot.clear();
    ws.slot.resize(dims.cells(), usize::MAX);
    for idx in 0..dims.cells() {
        if flags.is_fluid(idx) {
            ws.slot[idx] = ws.cells.len();
            ws.cells.push(idx);
        }
    }

    let n = ws.cells.len();
    ws.diag.clear();
    ws.rhs.clear();
    for &idx in &ws.cells {
        let mut diag = 0.0f32;
        let mut divergence = 0.0f32;
        for axis in 0..dims.dim() {
            let upper_face = dims
                .neighbor(idx, axis, true)
                .map(|n| vel.component(n, axis))
                .unwrap_or(0.0);
            divergence += upper_face - vel.component(idx, axis);

            for positive in [false, true] {
                if let Some(nb) = dims.neighbor(idx, axis, positive) {
                    if !flags.is_obstacle(nb) {
                        diag += 1.0;
                    }
                }
            }
        }
        ws.diag.push(diag);
        ws.rhs.push(-divergence);
    }

    for buffer in [&mut ws.x, &mut ws.residual, &mut ws.auxiliary, &mut ws.search] {
        buffer.clear();
        buffer.resize(n, 0.0);
    }
}

/// `out = A * input` for the fluid-cell Laplacian
fn apply_matrix(out: &mut [f32], input: &[f32], ws_cells: &[usize], slot: &[usize], diag: &[f32], dims: GridDims) {
    let row = |k: usize| -> f32 {
        let idx = ws_cells[k];
        let mut sum = diag[k] * input[k];
        for axis in 0..dims.dim() {
            for positive in [false, true] {
                if let Some(nb) = dims.neighbor(idx, axis, positive) {
                    let s = slot[nb];
                    if s != usize::MAX {
                        sum -= input[s];
                    }
                }
            }
        }
        sum
    };

    if should_parallel(out.len()) {
        out.par_iter_mut().enumerate().for_each(|(k, value)| *value = row(k));
    } else {
        for (k, value) in out.iter_mut().enumerate() {
            *value = row(k);
        }
    }
}

fn precondition(dst: &mut [f32], src: &[f32], diag: &[f32]) {
    for ((d, s), a) in dst.iter_mut().zip(src).zip(diag) {
        *d = if *a > 0.0 { s / a } else { *s };
    }
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum()
}

fn norm_max(a: &[f32]) -> f32 {
    a.iter().fold(0.0f32, |m, v| m.max(v.abs()))
}

fn conjugate_gradient(
    ws: &mut Workspace,
    dims: GridDims,
    threshold: f32,
    max_iterations: usize,
) -> (usize, f32) {
    ws.x.fill(0.0);

    // early out
    let start = norm_max(&ws.rhs);
    if start < threshold {
        return (0, start);
    }

    ws.residual.copy_from_slice(&ws.rhs);
    precondition(&mut ws.auxiliary, &ws.residual, &ws.diag);
    ws.search.copy_from_slice(&ws.auxiliary);

    let mut sigma = dot(&ws.auxiliary, &ws.residual);
    let mut residual_error = start;

    for i in 0..max_iterations {
        apply_matrix(&mut ws.auxiliary, &ws.search, &ws.cells, &ws.slot, &ws.diag, dims);
        let denom = dot(&ws.auxiliary, &ws.search);
        if denom.abs() < f64::EPSILON {
            return (i, residual_error);
        }
        let alpha = (sigma / denom) as f32;

        for (x, s) in ws.x.iter_mut().zip(&ws.search) {
            *x += alpha * s;
        }
        for (r, a) in ws.residual.iter_mut().zip(&ws.auxiliary) {
            *r -= alpha * a;
        }

        residual_error = norm_max(&ws.residual);
        if residual_error < threshold {
            return (i + 1, residual_error);
        }

        precondition(&mut ws.auxiliary, &ws.residual, &ws.diag);
        let sigma_new = dot(&ws.auxiliary, &ws.residual);
        let beta = (sigma_new / sigma) as f32;
        for (s, a) in ws.search.iter_mut().zip(&ws.auxiliary) {
            *s = a + beta * *s;
        }
        sigma = sigma_new;
    }

    (max_iterations, residual_error)
}

/// Subtract the pressure gradient on every face that is not against a solid
fn apply_gradient(flags: &FlagGrid, vel: &mut MacGrid, pressure: &RealGrid, dims: GridDims) {
    for idx in 0..dims.cells() {
        for axis in 0..dims.dim() {
            let Some(lower) = dims.neighbor(idx, axis, false) else {
                continue;
            };
            if flags.is_obstacle(idx) || flags.is_obstacle(lower) {
                continue;
            }
            if !flags.is_fluid(idx) && !flags.is_fluid(lower) {
                continue;
            }
            let gradient = pressure.get(idx) - pressure.get(lower);
            let v = vel.component(idx, axis) - gradient;
            vel.set_component(idx, axis, v);
        }
    }
}

/// Net outflow of every fluid cell, for diagnostics and tests
pub fn divergence(flags: &FlagGrid, vel: &MacGrid) -> RealGrid {
    let dims = vel.dims();
    let mut div = RealGrid::new(dims);
    for idx in 0..dims.cells() {
        if !flags.is_fluid(idx) {
            continue;
        }
        let mut d = 0.0;
        for axis in 0..dims.dim() {
            let upper = dims
                .neighbor(idx, axis, true)
                .map(|n| vel.component(n, axis))
                .unwrap_or(0.0);
            d += upper - vel.component(idx, axis);
        }
        div.set(idx, d);
    }
    div
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenBoundary;
    use crate::grid::cell;
    use glam::Vec3;

    fn open_top_domain(dims: GridDims) -> FlagGrid {
        let mut flags = FlagGrid::new(dims);
        flags.init_domain(1);
        flags.fill_grid();
        let open = OpenBoundary::parse("Y").unwrap();
        flags.set_open_bound(1, &open, cell::OUTFLOW | cell::EMPTY);
        flags
    }

    #[test]
    fn test_projection_removes_divergence() {
        let dims = GridDims::new(16, 16, 1);
        let flags = open_top_domain(dims);
        let mut vel = MacGrid::new(dims);
        // a jet pushing into the middle of the domain
        for j in 6..10 {
            vel.set(dims.index(8, j, 0), Vec3::new(1.0, 0.0, 0.0));
        }
        let mut pressure = RealGrid::new(dims);
        let mut solver = PressureSolver::new(1e-4, 500);
        let stats = solver.solve(&flags, &mut vel, &mut pressure);
        assert!(stats.converged, "{:?}", stats);
        let div = divergence(&flags, &vel);
        assert!(div.max_abs() < 1e-3, "divergence {}", div.max_abs());
        assert!(pressure.max_abs() > 0.0);
        assert!(solver.has_workspace());
        solver.release();
        assert!(!solver.has_workspace());
    }

    #[test]
    fn test_divergence_free_input_is_untouched() {
        let dims = GridDims::new(8, 8, 8);
        let flags = open_top_domain(dims);
        let mut vel = MacGrid::new(dims);
        let before = vel.clone();
        let mut pressure = RealGrid::new(dims);
        let stats = PressureSolver::new(1e-4, 100).solve(&flags, &mut vel, &mut pressure);
        assert_eq!(stats.iterations, 0);
        assert_eq!(vel, before);
    }
}
