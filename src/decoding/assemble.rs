use std::collections::BTreeMap;

use crate::decoding::conflicts::{self, ConflictCluster};
use crate::decoding::grid::TimeGrid;
use crate::decoding::viterbi::count_switches;
use crate::error::MelodyError;
use crate::pipeline::traits::{PathDecoder, TransitionModel};
use crate::types::{ContourId, GridCandidate, MelodyOutput};

/// Frequencies decoded for one conflict cluster, keyed by grid index.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignment {
    pub grid_indices: Vec<usize>,
    pub frequencies: Vec<f64>,
}

/// Keeps the last candidate per grid slot. With candidates sorted by time
/// then probability this is the most probable one.
pub fn assemble_max(grid: TimeGrid, sorted: &[GridCandidate]) -> MelodyOutput {
    let mut output = MelodyOutput::unvoiced(grid.into_times());
    for c in sorted {
        output.frequencies[c.grid_index] = c.sample.frequency;
    }
    output
}

/// Shared read-only inputs for decoding conflict clusters.
pub struct ClusterDecoding<'a> {
    pub mean_frequencies: &'a BTreeMap<ContourId, f64>,
    pub transition_model: &'a dyn TransitionModel,
    pub path_decoder: &'a dyn PathDecoder,
    pub penalty: f64,
}

/// Writes singletons directly and Viterbi-decodes each conflict cluster.
pub fn assemble_viterbi(
    grid: TimeGrid,
    sorted: &[GridCandidate],
    decoding: &ClusterDecoding<'_>,
) -> Result<MelodyOutput, MelodyError> {
    let parts = conflicts::partition(sorted);
    tracing::debug!(
        singletons = parts.singletons.len(),
        clusters = parts.clusters.len(),
        "assemble: partitioned candidates"
    );

    let mut output = MelodyOutput::unvoiced(grid.into_times());
    for c in &parts.singletons {
        output.frequencies[c.grid_index] = c.sample.frequency;
    }

    for assignment in decode_clusters(&parts.clusters, decoding)? {
        for (&idx, &freq) in assignment.grid_indices.iter().zip(&assignment.frequencies) {
            output.frequencies[idx] = freq;
        }
    }
    Ok(output)
}

#[cfg(not(feature = "parallel"))]
fn decode_clusters(
    clusters: &[ConflictCluster],
    decoding: &ClusterDecoding<'_>,
) -> Result<Vec<ClusterAssignment>, MelodyError> {
    clusters
        .iter()
        .map(|cluster| decode_cluster(cluster, decoding))
        .collect()
}

#[cfg(feature = "parallel")]
fn decode_clusters(
    clusters: &[ConflictCluster],
    decoding: &ClusterDecoding<'_>,
) -> Result<Vec<ClusterAssignment>, MelodyError> {
    use rayon::prelude::*;

    clusters
        .par_iter()
        .map(|cluster| decode_cluster(cluster, decoding))
        .collect()
}

pub fn decode_cluster(
    cluster: &ConflictCluster,
    decoding: &ClusterDecoding<'_>,
) -> Result<ClusterAssignment, MelodyError> {
    let matrices = cluster.materialize();
    let center_freqs = matrices
        .states
        .iter()
        .map(|id| {
            decoding.mean_frequencies.get(id).copied().ok_or_else(|| {
                MelodyError::invalid_input(format!("no mean frequency for contour {id}"))
            })
        })
        .collect::<Result<Vec<f64>, MelodyError>>()?;

    let transition = decoding.transition_model.transition_matrix(&center_freqs)?;
    let path = decoding
        .path_decoder
        .decode_path(&matrices.posterior, &transition, decoding.penalty)?;
    if path.len() != matrices.grid_indices.len() {
        return Err(MelodyError::shape(
            "cluster decode",
            format!(
                "decoder returned {} states for {} slots",
                path.len(),
                matrices.grid_indices.len()
            ),
        ));
    }

    let frequencies = path
        .iter()
        .enumerate()
        .map(|(row, &state)| {
            matrices.frequencies[row].get(state).copied().ok_or_else(|| {
                MelodyError::shape(
                    "cluster decode",
                    format!("state {state} out of range for {} states", matrices.states.len()),
                )
            })
        })
        .collect::<Result<Vec<f64>, MelodyError>>()?;

    tracing::debug!(
        cluster = cluster.id,
        slots = matrices.grid_indices.len(),
        states = matrices.states.len(),
        switches = count_switches(&path),
        "assemble: decoded conflict cluster"
    );

    Ok(ClusterAssignment {
        grid_indices: matrices.grid_indices,
        frequencies,
    })
}
