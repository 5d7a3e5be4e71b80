//! Stage ordering.
//!
//! Every registered stage has a [`Placement`]: a canonical slot given by its
//! [`StageKind`], or a position immediately before or after another stage.
//! Ordering is a topological sort over the induced graph:
//!
//! - canonical stages are chained in [`StageKind`] order
//! - a stage placed before `A` gets an edge to `A`, one placed after `A`
//!   gets an edge from `A`
//!
//! Ties between ready stages go to the lowest sort key, then to insertion
//! order. A sort key is the canonical order of the stage an anchor chain
//! ends at, then the signed number of hops along that chain, so an anchored
//! stage never competes with the next canonical slot however long its chain.

use bulwark_core::{BulwarkError, BulwarkResult, StageKind};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Canonical order of the chain's root, then signed hops from it.
type SortKey = (u32, i64);

/// Where a stage belongs in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    /// The canonical slot of a known kind.
    Canonical(StageKind),
    /// Immediately before the stage at this index.
    Before(usize),
    /// Immediately after the stage at this index.
    After(usize),
}

/// Returns the indices of `placements` in pipeline order.
///
/// `names[i]` names the stage at `placements[i]` and is only used for
/// diagnostics. Fails with a configuration error when the placements are
/// contradictory.
pub(crate) fn resolve(names: &[&'static str], placements: &[Placement]) -> BulwarkResult<Vec<usize>> {
    let count = placements.len();
    let mut keys = Vec::with_capacity(count);
    for index in 0..count {
        keys.push(sort_key(index, names, placements)?);
    }

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut in_degree = vec![0_usize; count];
    let mut add_edge = |from: usize, to: usize| {
        successors[from].push(to);
        in_degree[to] += 1;
    };

    let mut canonical: Vec<(StageKind, usize)> = placements
        .iter()
        .enumerate()
        .filter_map(|(index, placement)| match placement {
            Placement::Canonical(kind) => Some((*kind, index)),
            _ => None,
        })
        .collect();
    canonical.sort_unstable();
    for pair in canonical.windows(2) {
        add_edge(pair[0].1, pair[1].1);
    }

    for (index, placement) in placements.iter().enumerate() {
        match *placement {
            Placement::Canonical(_) => {}
            Placement::Before(anchor) => add_edge(index, anchor),
            Placement::After(anchor) => add_edge(anchor, index),
        }
    }

    let mut ready: BinaryHeap<Reverse<(SortKey, usize)>> = (0..count)
        .filter(|&index| in_degree[index] == 0)
        .map(|index| Reverse((keys[index], index)))
        .collect();

    let mut order = Vec::with_capacity(count);
    while let Some(Reverse((_, index))) = ready.pop() {
        order.push(index);
        for &next in &successors[index] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse((keys[next], next)));
            }
        }
    }

    if order.len() < count {
        let stuck: Vec<&str> = (0..count)
            .filter(|&index| in_degree[index] > 0)
            .map(|index| names[index])
            .collect();
        return Err(BulwarkError::configuration(format!(
            "stage ordering is contradictory; cycle among [{}]",
            stuck.join(", ")
        )));
    }

    Ok(order)
}

/// Follows the anchor chain from `index` down to a canonical stage.
fn sort_key(index: usize, names: &[&'static str], placements: &[Placement]) -> BulwarkResult<SortKey> {
    let mut offset = 0_i64;
    let mut path = vec![index];
    let mut current = index;

    loop {
        let placement = placements
            .get(current)
            .copied()
            .ok_or_else(|| BulwarkError::configuration(format!("no stage at position {current}")))?;

        let anchor = match placement {
            Placement::Canonical(kind) => return Ok((kind.order(), offset)),
            Placement::Before(anchor) => {
                offset -= 1;
                anchor
            }
            Placement::After(anchor) => {
                offset += 1;
                anchor
            }
        };
        if let Some(start) = path.iter().position(|&seen| seen == anchor) {
            let cycle: Vec<&str> = path[start..]
                .iter()
                .chain(std::iter::once(&anchor))
                .map(|&seen| names.get(seen).copied().unwrap_or("?"))
                .collect();
            return Err(BulwarkError::configuration(format!(
                "stage ordering is contradictory: {}",
                cycle.join(" -> ")
            )));
        }
        path.push(anchor);
        current = anchor;
    }
}
