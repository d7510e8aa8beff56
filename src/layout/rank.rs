//! Cycle breaking and rank assignment.

use std::collections::VecDeque;

use super::WeightedEdge;

/// Upper bound on tightening sweeps; each productive sweep strictly lowers
/// the weighted edge length, so this only caps pathological inputs.
const MAX_TIGHTEN_PASSES: usize = 32;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Reverse every DFS back edge so the graph becomes acyclic.
///
/// Roots and neighbours are visited in insertion order. Returns how many
/// edges were reversed.
pub(super) fn break_cycles(n: usize, edges: &mut [WeightedEdge]) -> usize {
    let mut out: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, e) in edges.iter().enumerate() {
        out[e.from].push(i);
    }

    let mut state = vec![Visit::New; n];
    let mut back = vec![false; edges.len()];
    // (node, index of the next outgoing edge to explore)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..n {
        if state[root] != Visit::New {
            continue;
        }
        state[root] = Visit::Active;
        stack.push((root, 0));

        while let Some(top) = stack.last_mut() {
            let v = top.0;
            if let Some(&ei) = out[v].get(top.1) {
                top.1 += 1;
                let w = edges[ei].to;
                match state[w] {
                    Visit::Active => back[ei] = true,
                    Visit::New => {
                        state[w] = Visit::Active;
                        stack.push((w, 0));
                    }
                    Visit::Done => {}
                }
            } else {
                state[v] = Visit::Done;
                stack.pop();
            }
        }
    }

    let mut reversed = 0;
    for (e, is_back) in edges.iter_mut().zip(back) {
        if is_back {
            std::mem::swap(&mut e.from, &mut e.to);
            reversed += 1;
        }
    }
    reversed
}

/// Rank every node of an acyclic graph.
///
/// Starts from longest-path ranks, then moves single nodes within their
/// feasible interval whenever that strictly lowers the total weighted edge
/// length. Every edge keeps length >= 1. Ranks are normalised to start at 0.
pub(super) fn assign_ranks(n: usize, edges: &[WeightedEdge]) -> Vec<usize> {
    let mut ins: Vec<Vec<(usize, i64)>> = vec![Vec::new(); n];
    let mut outs: Vec<Vec<(usize, i64)>> = vec![Vec::new(); n];
    for e in edges {
        outs[e.from].push((e.to, i64::from(e.weight)));
        ins[e.to].push((e.from, i64::from(e.weight)));
    }

    let mut rank = longest_path(n, &ins, &outs);
    tighten(&mut rank, &ins, &outs);

    let min = rank.iter().copied().min().unwrap_or(0);
    rank.into_iter()
        .map(|r| usize::try_from(r - min).unwrap_or(0))
        .collect()
}

fn longest_path(n: usize, ins: &[Vec<(usize, i64)>], outs: &[Vec<(usize, i64)>]) -> Vec<i64> {
    let mut indegree: Vec<usize> = ins.iter().map(Vec::len).collect();
    let mut queue: VecDeque<usize> = (0..n).filter(|&v| indegree[v] == 0).collect();
    let mut rank = vec![0_i64; n];

    while let Some(v) = queue.pop_front() {
        for &(w, _) in &outs[v] {
            rank[w] = rank[w].max(rank[v] + 1);
            indegree[w] -= 1;
            if indegree[w] == 0 {
                queue.push_back(w);
            }
        }
    }
    rank
}

/// Coordinate descent on `sum(weight * (rank[to] - rank[from]))`.
///
/// For one node the cost is linear in its own rank with slope
/// `in_weight - out_weight`, so the best feasible rank is an interval end.
fn tighten(rank: &mut [i64], ins: &[Vec<(usize, i64)>], outs: &[Vec<(usize, i64)>]) {
    for _ in 0..MAX_TIGHTEN_PASSES {
        let mut moved = false;
        for v in 0..rank.len() {
            let in_weight: i64 = ins[v].iter().map(|&(_, w)| w).sum();
            let out_weight: i64 = outs[v].iter().map(|&(_, w)| w).sum();

            let target = if in_weight > out_weight {
                ins[v].iter().map(|&(u, _)| rank[u] + 1).max()
            } else if out_weight > in_weight {
                outs[v].iter().map(|&(w, _)| rank[w] - 1).min()
            } else {
                None
            };

            if let Some(target) = target {
                if target != rank[v] {
                    rank[v] = target;
                    moved = true;
                }
            }
        }
        if !moved {
            break;
        }
    }
}
