use std::collections::{BTreeMap, HashMap};

use crate::types::{ContourId, GridCandidate};

/// A contiguous run of contested grid slots and every candidate mapped into it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictCluster {
    pub id: usize,
    pub members: Vec<GridCandidate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConflictPartition {
    /// Candidates that are alone on their grid slot.
    pub singletons: Vec<GridCandidate>,
    pub clusters: Vec<ConflictCluster>,
}

/// Dense per-cluster matrices: rows are grid slots, columns are contour states.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterMatrices {
    pub grid_indices: Vec<usize>,
    pub states: Vec<ContourId>,
    pub posterior: Vec<Vec<f64>>,
    pub frequencies: Vec<Vec<f64>>,
}

/// Splits snapped candidates into singletons and conflict clusters.
///
/// Candidates sharing a grid index are duplicates. Duplicates are walked in
/// grid order and a new cluster starts whenever the index jumps by more than 1.
pub fn partition(candidates: &[GridCandidate]) -> ConflictPartition {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for c in candidates {
        *counts.entry(c.grid_index).or_default() += 1;
    }

    let mut singletons = Vec::new();
    let mut duplicates = Vec::new();
    for c in candidates {
        if counts[&c.grid_index] > 1 {
            duplicates.push(*c);
        } else {
            singletons.push(*c);
        }
    }
    duplicates.sort_by_key(|c| c.grid_index);

    let mut clusters: Vec<ConflictCluster> = Vec::new();
    let mut cluster_id = 0usize;
    let mut prev_index: Option<usize> = None;
    for c in duplicates {
        if let Some(prev) = prev_index {
            if c.grid_index > prev + 1 {
                cluster_id += 1;
            }
        }
        prev_index = Some(c.grid_index);
        match clusters.last_mut() {
            Some(cluster) if cluster.id == cluster_id => cluster.members.push(c),
            _ => clusters.push(ConflictCluster {
                id: cluster_id,
                members: vec![c],
            }),
        }
    }

    ConflictPartition {
        singletons,
        clusters,
    }
}

impl ConflictCluster {
    /// Pivots the sparse (slot, contour, value) members into dense matrices,
    /// filling absent combinations with 0.0. Repeated (slot, contour) pairs
    /// are averaged.
    pub fn materialize(&self) -> ClusterMatrices {
        let mut grid_indices: Vec<usize> = self.members.iter().map(|c| c.grid_index).collect();
        grid_indices.sort_unstable();
        grid_indices.dedup();
        let mut states: Vec<ContourId> =
            self.members.iter().map(|c| c.sample.contour_id).collect();
        states.sort_unstable();
        states.dedup();

        let row_of: HashMap<usize, usize> =
            grid_indices.iter().enumerate().map(|(r, &g)| (g, r)).collect();
        let col_of: HashMap<ContourId, usize> =
            states.iter().enumerate().map(|(c, &s)| (s, c)).collect();

        // (row, col) -> (probability sum, frequency sum, count)
        let mut cells: BTreeMap<(usize, usize), (f64, f64, usize)> = BTreeMap::new();
        for member in &self.members {
            let key = (row_of[&member.grid_index], col_of[&member.sample.contour_id]);
            let cell = cells.entry(key).or_insert((0.0, 0.0, 0));
            cell.0 += member.sample.probability;
            cell.1 += member.sample.frequency;
            cell.2 += 1;
        }

        let mut posterior = vec![vec![0.0; states.len()]; grid_indices.len()];
        let mut frequencies = vec![vec![0.0; states.len()]; grid_indices.len()];
        for ((r, c), (prob_sum, freq_sum, count)) in cells {
            posterior[r][c] = prob_sum / count as f64;
            frequencies[r][c] = freq_sum / count as f64;
        }

        ClusterMatrices {
            grid_indices,
            states,
            posterior,
            frequencies,
        }
    }
}
