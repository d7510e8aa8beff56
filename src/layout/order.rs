//! Ordering inside ranks: weighted barycenter sweeps.

use super::WeightedEdge;

/// Alternating down/up sweeps; the ordering with the fewest crossings wins.
const ORDER_SWEEPS: usize = 8;

/// Group nodes by rank and order each rank to reduce crossings.
///
/// Initial order is insertion order. Nodes with no neighbour in the
/// reference rank keep their slot, and equal barycenters keep their
/// previous relative order.
pub(super) fn order_layers(n: usize, ranks: &[usize], edges: &[WeightedEdge]) -> Vec<Vec<usize>> {
    let depth = ranks.iter().copied().max().map_or(0, |m| m + 1);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); depth];
    for v in 0..n {
        layers[ranks[v]].push(v);
    }

    let mut up: Vec<Vec<(usize, u32)>> = vec![Vec::new(); n];
    let mut down: Vec<Vec<(usize, u32)>> = vec![Vec::new(); n];
    for e in edges {
        if ranks[e.to] == ranks[e.from] + 1 {
            down[e.from].push((e.to, e.weight));
            up[e.to].push((e.from, e.weight));
        }
    }

    let mut best = layers.clone();
    let mut best_crossings = count_crossings(&layers, &down, n);

    for sweep in 0..ORDER_SWEEPS {
        if best_crossings == 0 {
            break;
        }
        if sweep % 2 == 0 {
            for r in 1..depth {
                let (head, tail) = layers.split_at_mut(r);
                reorder(&mut tail[0], &head[r - 1], &up, n);
            }
        } else {
            for r in (0..depth.saturating_sub(1)).rev() {
                let (head, tail) = layers.split_at_mut(r + 1);
                reorder(&mut head[r], &tail[0], &down, n);
            }
        }

        let crossings = count_crossings(&layers, &down, n);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = layers.clone();
        }
    }
    best
}

fn slots(layer: &[usize], n: usize) -> Vec<usize> {
    let mut slot = vec![usize::MAX; n];
    for (i, &v) in layer.iter().enumerate() {
        slot[v] = i;
    }
    slot
}

#[allow(clippy::cast_precision_loss)]
fn reorder(layer: &mut Vec<usize>, reference: &[usize], adj: &[Vec<(usize, u32)>], n: usize) {
    let ref_slot = slots(reference, n);
    let mut keyed: Vec<(f64, usize, usize)> = layer
        .iter()
        .enumerate()
        .map(|(current, &v)| {
            let (sum, weight) = adj[v]
                .iter()
                .filter(|&&(u, _)| ref_slot[u] != usize::MAX)
                .fold((0.0, 0.0), |(s, w), &(u, wt)| {
                    let wt = f64::from(wt);
                    (s + ref_slot[u] as f64 * wt, w + wt)
                });
            let bary = if weight > 0.0 { sum / weight } else { current as f64 };
            (bary, current, v)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    *layer = keyed.into_iter().map(|(_, _, v)| v).collect();
}

/// Crossings between adjacent ranks.
fn count_crossings(layers: &[Vec<usize>], down: &[Vec<(usize, u32)>], n: usize) -> usize {
    let mut crossings = 0;
    for pair in layers.windows(2) {
        let lower = slots(&pair[1], n);
        let mut segments: Vec<(usize, usize)> = Vec::new();
        for (i, &v) in pair[0].iter().enumerate() {
            for &(w, _) in &down[v] {
                segments.push((i, lower[w]));
            }
        }
        for (a, &(a1, b1)) in segments.iter().enumerate() {
            for &(a2, b2) in &segments[a + 1..] {
                if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                    crossings += 1;
                }
            }
        }
    }
    crossings
}
