//! Coordinate assignment.
//!
//! Ranks map straight to the main axis. Across it, each rank starts packed
//! and centred, then alternating up/down sweeps pull every node towards the
//! weighted mean of its neighbours in the reference rank. Nodes are placed
//! in descending priority (weight towards the reference rank); a placed
//! node is never moved again in that sweep, lower priority nodes are pushed
//! aside to keep `node_sep` gaps. The final sweep always runs downward so
//! the backbone ends aligned under its predecessors.

use super::{LayoutConfig, WeightedEdge};

/// Returns `(main, cross)` per node: main-axis start and cross-axis centre.
#[allow(clippy::cast_precision_loss)]
pub(super) fn assign(
    n: usize,
    layers: &[Vec<usize>],
    edges: &[WeightedEdge],
    config: &LayoutConfig,
) -> (Vec<f64>, Vec<f64>) {
    let (main_extent, cross_extent) = config.extents();
    let step = cross_extent + config.node_sep;

    let mut main = vec![0.0; n];
    let mut cross = vec![0.0; n];
    for (r, layer) in layers.iter().enumerate() {
        let span = layer.len().saturating_sub(1) as f64 * step;
        for (i, &v) in layer.iter().enumerate() {
            main[v] = r as f64 * (main_extent + config.rank_sep);
            cross[v] = i as f64 * step - span / 2.0;
        }
    }

    let mut rank_of = vec![0; n];
    for (r, layer) in layers.iter().enumerate() {
        for &v in layer {
            rank_of[v] = r;
        }
    }
    let mut up: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    let mut down: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for e in edges {
        if rank_of[e.to] == rank_of[e.from] + 1 {
            down[e.from].push((e.to, f64::from(e.weight)));
            up[e.to].push((e.from, f64::from(e.weight)));
        }
    }

    for _ in 0..config.refine_passes {
        for layer in layers.iter().rev().skip(1) {
            place_layer(layer, &mut cross, &down, step);
        }
        for layer in layers.iter().skip(1) {
            place_layer(layer, &mut cross, &up, step);
        }
    }

    (main, cross)
}

/// Re-place one rank against its reference neighbours in `adj`.
fn place_layer(layer: &[usize], cross: &mut [f64], adj: &[Vec<(usize, f64)>], step: f64) {
    let wants: Vec<Option<(f64, f64)>> = layer
        .iter()
        .map(|&v| {
            let (sum, weight) = adj[v]
                .iter()
                .fold((0.0, 0.0), |(s, w), &(u, wt)| (s + cross[u] * wt, w + wt));
            (weight > 0.0).then(|| (sum / weight, weight))
        })
        .collect();

    // Heaviest first; among equals, the middle slots go first so siblings
    // fan out on both sides of a shared parent.
    let last = layer.len().saturating_sub(1);
    let mut by_priority: Vec<usize> = (0..layer.len()).collect();
    by_priority.sort_by(|&a, &b| {
        let pa = wants[a].map_or(0.0, |w| w.1);
        let pb = wants[b].map_or(0.0, |w| w.1);
        pb.total_cmp(&pa)
            .then((2 * a).abs_diff(last).cmp(&(2 * b).abs_diff(last)))
            .then(a.cmp(&b))
    });

    let mut fixed = vec![false; layer.len()];
    for k in by_priority {
        if let Some((target, _)) = wants[k] {
            shift_towards(layer, cross, &fixed, k, target, step);
        }
        fixed[k] = true;
    }
}

/// Move slot `k` as close to `target` as fixed neighbours allow, pushing
/// unfixed slots between them out of the way.
#[allow(clippy::cast_precision_loss)]
fn shift_towards(layer: &[usize], cross: &mut [f64], fixed: &[bool], k: usize, target: f64, step: f64) {
    let current = cross[layer[k]];
    if target < current {
        let floor = (0..k)
            .rev()
            .find(|&j| fixed[j])
            .map(|j| cross[layer[j]] + (k - j) as f64 * step);
        cross[layer[k]] = floor.map_or(target, |f| target.max(f));
        for i in (0..k).rev() {
            if fixed[i] {
                break;
            }
            let limit = cross[layer[i + 1]] - step;
            if cross[layer[i]] <= limit {
                break;
            }
            cross[layer[i]] = limit;
        }
    } else if target > current {
        let ceiling = (k + 1..layer.len())
            .find(|&j| fixed[j])
            .map(|j| cross[layer[j]] - (j - k) as f64 * step);
        cross[layer[k]] = ceiling.map_or(target, |c| target.min(c));
        for i in k + 1..layer.len() {
            if fixed[i] {
                break;
            }
            let limit = cross[layer[i - 1]] + step;
            if cross[layer[i]] >= limit {
                break;
            }
            cross[layer[i]] = limit;
        }
    }
}
