use super::{FlagGrid, GridDims, MacGrid};

/// Extrapolate MAC velocity from fluid-adjacent faces into the remaining faces
///
/// Faces touching a fluid cell seed layer 1. Each further layer takes the
/// average of already known neighbors from the previous layer, for
/// `distance` layers. Works per component; the outermost cell layer is
/// never written.
pub fn extrapolate_mac_simple(flags: &FlagGrid, vel: &mut MacGrid, distance: usize) {
    let dims = vel.dims();
    let mut layer = vec![0usize; dims.cells()];

    for axis in 0..dims.dim() {
        layer.fill(0);
        for idx in 0..dims.cells() {
            if !inner(dims, idx) {
                continue;
            }
            let lower_fluid = dims
                .neighbor(idx, axis, false)
                .map(|l| flags.is_fluid(l))
                .unwrap_or(false);
            if flags.is_fluid(idx) || lower_fluid {
                layer[idx] = 1;
            }
        }

        for d in 1..=distance {
            for idx in 0..dims.cells() {
                if layer[idx] != 0 || !inner(dims, idx) {
                    continue;
                }
                let mut sum = 0.0;
                let mut count = 0;
                for nb_axis in 0..dims.dim() {
                    for positive in [false, true] {
                        if let Some(nb) = dims.neighbor(idx, nb_axis, positive) {
                            if layer[nb] == d {
                                sum += vel.component(nb, axis);
                                count += 1;
                            }
                        }
                    }
                }
                if count > 0 {
                    layer[idx] = d + 1;
                    vel.set_component(idx, axis, sum / count as f32);
                }
            }
        }
    }
}

/// Cells at least one away from the domain edge
fn inner(dims: GridDims, idx: usize) -> bool {
    !dims.in_ring(idx, 1)
}
