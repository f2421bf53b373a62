/// Direction along which [`normalize`] sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeAxis {
    /// Each row sums to 1.
    Rows,
    /// Each column sums to 1.
    Columns,
}

/// Divides every element by its slice sum (or the grand total when `axis` is
/// `None`). A zero sum is replaced by 1, so all-zero slices stay all-zero.
pub fn normalize(matrix: &[Vec<f64>], axis: Option<NormalizeAxis>) -> Vec<Vec<f64>> {
    match axis {
        Some(NormalizeAxis::Rows) => matrix.iter().map(|row| normalize_vector(row)).collect(),
        Some(NormalizeAxis::Columns) => {
            let width = matrix.iter().map(Vec::len).max().unwrap_or(0);
            let mut sums = vec![0.0f64; width];
            for row in matrix {
                for (sum, &value) in sums.iter_mut().zip(row.iter()) {
                    *sum += value;
                }
            }
            matrix
                .iter()
                .map(|row| {
                    row.iter()
                        .zip(sums.iter())
                        .map(|(&value, &sum)| value / nonzero(sum))
                        .collect()
                })
                .collect()
        }
        None => {
            let total: f64 = matrix.iter().flat_map(|row| row.iter()).sum();
            let scale = nonzero(total);
            matrix
                .iter()
                .map(|row| row.iter().map(|&value| value / scale).collect())
                .collect()
        }
    }
}

pub fn normalize_rows(matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
    normalize(matrix, Some(NormalizeAxis::Rows))
}

pub fn normalize_vector(values: &[f64]) -> Vec<f64> {
    let scale = nonzero(values.iter().sum());
    values.iter().map(|&value| value / scale).collect()
}

#[inline]
fn nonzero(sum: f64) -> f64 {
    if sum == 0.0 { 1.0 } else { sum }
}
