use crate::decoding::normalize::{normalize_rows, normalize_vector};
use crate::error::MelodyError;

/// Scaled Viterbi decoding over a posteriorgram.
///
/// `posterior[t][i]` is the likelihood of state `i` at observation `t`;
/// `transition[i][j]` relates states `i` and `j`. Both are row-normalised
/// internally. Missing transition/prior default to uniform. Off-diagonal
/// transitions are scaled by `exp(-penalty)` so a larger penalty keeps the
/// path on one state for longer. The sign is negative on purpose: scaling by
/// `exp(penalty)` would reward switching instead of discouraging it.
///
/// `delta` is renormalised at every step to avoid underflow; ties in every
/// arg-max resolve to the lowest state index.
pub fn viterbi(
    posterior: &[Vec<f64>],
    transition: Option<&[Vec<f64>]>,
    prior: Option<&[f64]>,
    penalty: f64,
) -> Result<Vec<usize>, MelodyError> {
    let num_obs = posterior.len();
    if num_obs == 0 {
        return Ok(Vec::new());
    }
    let num_states = posterior[0].len();
    if num_states == 0 {
        return Err(MelodyError::shape("viterbi posterior", "posterior has zero states"));
    }
    if let Some((t, row)) = posterior.iter().enumerate().find(|(_, r)| r.len() != num_states) {
        return Err(MelodyError::shape(
            "viterbi posterior",
            format!("row {t} has {} states, expected {num_states}", row.len()),
        ));
    }
    if !penalty.is_finite() || penalty < 0.0 {
        return Err(MelodyError::invalid_input(format!(
            "penalty must be finite and >= 0, got {penalty}"
        )));
    }

    let posterior = normalize_rows(posterior);
    let transition = penalized_transition(transition, num_states, penalty)?;
    let prior = match prior {
        Some(p) if p.len() != num_states => {
            return Err(MelodyError::shape(
                "viterbi prior",
                format!("prior has {} states, expected {num_states}", p.len()),
            ));
        }
        Some(p) => p.to_vec(),
        None => vec![1.0 / num_states as f64; num_states],
    };

    let mut delta: Vec<f64> = normalize_vector(
        &prior
            .iter()
            .zip(posterior[0].iter())
            .map(|(p, o)| p * o)
            .collect::<Vec<_>>(),
    );
    let mut psi = vec![0usize; num_obs * num_states];
    let mut next = vec![0.0f64; num_states];

    for t in 1..num_obs {
        let row_offset = t * num_states;
        for (i, trans_row) in transition.iter().enumerate() {
            // Row i of delta[t-1] (x) T, maximised over j.
            let (best_j, best) = argmax(
                delta
                    .iter()
                    .zip(trans_row.iter())
                    .map(|(d, tr)| d * tr),
            );
            psi[row_offset + i] = best_j;
            next[i] = best * posterior[t][i];
        }
        delta = normalize_vector(&next);
    }

    let mut path = vec![0usize; num_obs];
    path[num_obs - 1] = argmax(delta.iter().copied()).0;
    for t in (0..num_obs - 1).rev() {
        path[t] = psi[(t + 1) * num_states + path[t + 1]];
    }
    Ok(path)
}

/// Number of state changes along a decoded path.
pub fn count_switches(path: &[usize]) -> usize {
    path.windows(2).filter(|w| w[0] != w[1]).count()
}

fn penalized_transition(
    transition: Option<&[Vec<f64>]>,
    num_states: usize,
    penalty: f64,
) -> Result<Vec<Vec<f64>>, MelodyError> {
    let base = match transition {
        Some(t) => {
            if t.len() != num_states || t.iter().any(|row| row.len() != num_states) {
                return Err(MelodyError::shape(
                    "viterbi transition",
                    format!(
                        "transition matrix must be {num_states}x{num_states}, got {} rows",
                        t.len()
                    ),
                ));
            }
            normalize_rows(t)
        }
        None => normalize_rows(&vec![vec![1.0; num_states]; num_states]),
    };

    let off_diagonal = (-penalty).exp();
    Ok(base
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            row.into_iter()
                .enumerate()
                .map(|(j, p)| if i == j { p } else { p * off_diagonal })
                .collect()
        })
        .collect())
}

/// First-occurrence arg-max. Returns (0, NEG_INFINITY) for an empty iterator.
#[inline]
fn argmax(values: impl Iterator<Item = f64>) -> (usize, f64) {
    let mut best_idx = 0usize;
    let mut best = f64::NEG_INFINITY;
    for (idx, value) in values.enumerate() {
        if value > best {
            best = value;
            best_idx = idx;
        }
    }
    (best_idx, best)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn per_step_argmax(posterior: &[Vec<f64>]) -> Vec<usize> {
        posterior
            .iter()
            .map(|row| argmax(row.iter().copied()).0)
            .collect()
    }

    #[test]
    fn empty_posterior_gives_empty_path() {
        assert!(viterbi(&[], None, None, 0.0).unwrap().is_empty());
    }

    #[test]
    fn single_observation_is_argmax() {
        let path = viterbi(&[vec![0.6, 0.9]], None, None, 0.0).unwrap();
        assert_eq!(path, vec![1]);
    }

    #[test]
    fn uniform_model_degenerates_to_frame_argmax() {
        let posterior = vec![
            vec![0.7, 0.2, 0.1],
            vec![0.1, 0.8, 0.1],
            vec![0.2, 0.3, 0.5],
            vec![0.6, 0.3, 0.1],
        ];
        let path = viterbi(&posterior, None, None, 0.0).unwrap();
        assert_eq!(path, vec![0, 1, 2, 0]);
        assert_eq!(path, per_step_argmax(&posterior));
    }

    #[test]
    fn explicit_uniform_transition_matches_default() {
        let posterior = vec![vec![0.2, 0.8], vec![0.9, 0.1], vec![0.4, 0.6]];
        let uniform = vec![vec![3.0, 3.0], vec![3.0, 3.0]];
        assert_eq!(
            viterbi(&posterior, Some(&uniform), None, 0.0).unwrap(),
            viterbi(&posterior, None, None, 0.0).unwrap()
        );
    }

    #[test]
    fn penalty_increases_state_persistence() {
        let posterior = vec![
            vec![0.8, 0.2],
            vec![0.3, 0.7],
            vec![0.8, 0.2],
            vec![0.3, 0.7],
        ];
        let free = viterbi(&posterior, None, None, 0.0).unwrap();
        let sticky = viterbi(&posterior, None, None, 5.0).unwrap();
        assert_eq!(free, vec![0, 1, 0, 1]);
        assert_eq!(sticky, vec![0, 0, 0, 0]);
        assert!(count_switches(&sticky) < count_switches(&free));
    }

    #[test]
    fn identity_transition_holds_initial_state() {
        let posterior = vec![vec![0.9, 0.1], vec![0.4, 0.6], vec![0.45, 0.55]];
        let identity = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let path = viterbi(&posterior, Some(&identity), None, 0.0).unwrap();
        assert_eq!(path, vec![0, 0, 0]);
    }

    #[test]
    fn prior_steers_first_state() {
        let posterior = vec![vec![0.5, 0.5]];
        assert_eq!(viterbi(&posterior, None, Some(&[0.2, 0.8]), 0.0).unwrap(), vec![1]);
        assert_eq!(viterbi(&posterior, None, None, 0.0).unwrap(), vec![0]);
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        let posterior = vec![vec![0.5, 0.5, 0.5], vec![0.0, 0.0, 0.0]];
        assert_eq!(viterbi(&posterior, None, None, 0.0).unwrap(), vec![0, 0]);
    }

    #[test]
    fn rejects_ragged_posterior() {
        let posterior = vec![vec![0.5, 0.5], vec![1.0]];
        assert!(matches!(
            viterbi(&posterior, None, None, 0.0),
            Err(MelodyError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn rejects_mismatched_transition() {
        let posterior = vec![vec![0.5, 0.5]];
        let t = vec![vec![1.0, 0.0, 0.0]; 3];
        assert!(matches!(
            viterbi(&posterior, Some(&t), None, 0.0),
            Err(MelodyError::ShapeMismatch { .. })
        ));
        let non_square = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        assert!(viterbi(&posterior, Some(&non_square), None, 0.0).is_err());
    }

    #[test]
    fn rejects_mismatched_prior() {
        let posterior = vec![vec![0.5, 0.5]];
        assert!(matches!(
            viterbi(&posterior, None, Some(&[1.0]), 0.0),
            Err(MelodyError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn long_sequences_do_not_underflow() {
        let posterior: Vec<Vec<f64>> = (0..5_000)
            .map(|t| if t % 2 == 0 { vec![1e-3, 2e-3] } else { vec![3e-3, 1e-3] })
            .collect();
        let path = viterbi(&posterior, None, None, 0.0).unwrap();
        // Unscaled products would vanish and every arg-max would collapse to state 0.
        assert_eq!(path, per_step_argmax(&posterior));
    }

    #[test]
    fn random_inputs_yield_valid_paths() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let num_obs = rng.gen_range(1..30);
            let num_states = rng.gen_range(1..6);
            let posterior: Vec<Vec<f64>> = (0..num_obs)
                .map(|_| (0..num_states).map(|_| rng.gen_range(0.0..1.0)).collect())
                .collect();
            let transition: Vec<Vec<f64>> = (0..num_states)
                .map(|_| (0..num_states).map(|_| rng.gen_range(0.0..1.0)).collect())
                .collect();
            let penalty = rng.gen_range(0.0..4.0);
            let path = viterbi(&posterior, Some(&transition), None, penalty).unwrap();
            assert_eq!(path.len(), num_obs);
            assert!(path.iter().all(|&s| s < num_states));
        }
    }
}
