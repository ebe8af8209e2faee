/// Fold one sample into a mean over `count` prior samples.
///
/// Computes `(mean * count + sample) / (count + 1)`; the caller increments
/// its stored count afterwards.
pub fn running_mean(mean: f64, count: u64, sample: f64) -> f64 {
    (mean * count as f64 + sample) / (count as f64 + 1.0)
}
