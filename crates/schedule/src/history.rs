use shared::protocol::Correction;

pub const DEFAULT_SIGNIFICANT_CORRECTIONS: usize = 5;
pub const DEFAULT_APRIORI_DURATION_SECS: i64 = 20 * 60;

/// Expected length of the next correction at a table, in seconds.
///
/// Mean of the recorded durations, padded with `apriori`-long corrections
/// until `num_significant` samples exist.
pub fn expected_duration(corrections: &[Correction], num_significant: usize, apriori: i64) -> i64 {
    let recorded: i64 = corrections.iter().map(Correction::duration).sum();
    let padding = num_significant.saturating_sub(corrections.len()) as i64 * apriori;
    let samples = num_significant.max(corrections.len());
    if samples == 0 {
        return apriori;
    }
    ((recorded + padding) as f64 / samples as f64).round() as i64
}
