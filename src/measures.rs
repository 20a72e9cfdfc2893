//! Association measures: log-likelihood, PMI, naive-Bayes salience
//!
//! Pure functions over frequency counts. A malformed input raises
//! [`CollocateError::StatisticsInput`]; the table builders translate that
//! into dropping the single offending gram, never into a global failure.

use crate::error::{CollocateError, Result};
use crate::ngram::NGRAM_SEPARATOR;

/// Log-likelihood association statistic for a bigram `(a, b)`.
///
/// `freq_a_firstpos` is the total number of retained grams headed by `a`
/// (the by-first-word map of the extraction), not the plain unigram count of
/// `a`; swapping `a` and `b` without recomputing it changes the result.
///
/// The 2x2 contingency table is
/// `O11 = freq_ab`, `O12 = freq_a_firstpos - freq_ab`,
/// `O21 = freq_b - freq_ab`, `O22 = total - freq_a - freq_b + freq_ab`,
/// expected cells from the row/column marginals, and the statistic is
/// `2 * sum O * ln(O / E)` over cells with `O > 0` (a zero cell contributes
/// zero). A negative observed or expected cell is a malformed input.
pub fn log_likelihood(
    freq_ab: u64,
    freq_a_firstpos: u64,
    freq_a: u64,
    freq_b: u64,
    total: u64,
) -> Result<f64> {
    let o11 = freq_ab as i128;
    let o12 = freq_a_firstpos as i128 - freq_ab as i128;
    let o21 = freq_b as i128 - freq_ab as i128;
    let o22 = total as i128 - freq_a as i128 - freq_b as i128 + freq_ab as i128;

    let observed = [o11, o12, o21, o22];
    if observed.iter().any(|&o| o < 0) {
        return Err(CollocateError::StatisticsInput(format!(
            "negative contingency cell: O=[{o11}, {o12}, {o21}, {o22}]"
        )));
    }
    let n: i128 = observed.iter().sum();
    if n == 0 {
        return Err(CollocateError::StatisticsInput(
            "empty contingency table".to_string(),
        ));
    }

    let n = n as f64;
    let rows = [(o11 + o12) as f64, (o21 + o22) as f64];
    let cols = [(o11 + o21) as f64, (o12 + o22) as f64];
    let cells = [
        (o11 as f64, rows[0], cols[0]),
        (o12 as f64, rows[0], cols[1]),
        (o21 as f64, rows[1], cols[0]),
        (o22 as f64, rows[1], cols[1]),
    ];

    let mut sum = 0.0;
    for (o, row, col) in cells {
        if o > 0.0 {
            let expected = row * col / n;
            if expected <= 0.0 {
                return Err(CollocateError::StatisticsInput(format!(
                    "non-positive expected cell {expected} for observed {o}"
                )));
            }
            sum += o * (o / expected).ln();
        }
    }
    Ok(2.0 * sum)
}

/// Pointwise mutual information for a bigram `(a, b)`:
/// `log2((freq_ab/total) / ((freq_a/total) * (freq_b/total)))`.
///
/// Undefined for zero counts.
pub fn pmi(freq_ab: u64, freq_a: u64, freq_b: u64, total: u64) -> Result<f64> {
    if freq_ab == 0 {
        return Err(CollocateError::StatisticsInput(
            "PMI undefined for zero co-occurrence count".to_string(),
        ));
    }
    if freq_a == 0 || freq_b == 0 || total == 0 {
        return Err(CollocateError::StatisticsInput(format!(
            "PMI undefined for zero marginal (freq_a={freq_a}, freq_b={freq_b}, total={total})"
        )));
    }
    let joint = freq_ab as f64 / total as f64;
    let independent = (freq_a as f64 / total as f64) * (freq_b as f64 / total as f64);
    Ok((joint / independent).log2())
}

/// Naive-Bayes salience of a word with `freq` occurrences out of `total`
/// tokens, against success/failure priors.
///
/// Bernoulli log-odds form: `freq * ln(cs/cf) + (total-freq) * ln((1-cs)/(1-cf))`.
/// Monotonically increasing in `freq` for fixed `total` and `0 < cf < cs < 1`.
pub fn naive_bayes_salience(
    total: u64,
    freq: u64,
    coef_success: f64,
    coef_fail: f64,
) -> Result<f64> {
    if !(0.0..1.0).contains(&coef_fail)
        || !(0.0..1.0).contains(&coef_success)
        || coef_fail <= 0.0
        || coef_success <= 0.0
    {
        return Err(CollocateError::StatisticsInput(format!(
            "salience priors must lie in (0, 1): success={coef_success}, fail={coef_fail}"
        )));
    }
    if freq > total {
        return Err(CollocateError::StatisticsInput(format!(
            "frequency {freq} exceeds total {total}"
        )));
    }
    let success = (coef_success / coef_fail).ln();
    let fail = ((1.0 - coef_success) / (1.0 - coef_fail)).ln();
    Ok(freq as f64 * success + (total - freq) as f64 * fail)
}

/// Chain-rule composition of bigram scores for a gram of order n > 2.
///
/// Sums `(LL, PMI)` over the n-1 constituent bigrams, looked up via `get`.
/// Returns `None` when any constituent is missing; such grams are dropped
/// from the caller's output entirely, never zero-filled.
pub fn chain_rule<F>(words: &[&str], get: F) -> Option<(f64, f64)>
where
    F: Fn(&str) -> Option<(f64, f64)>,
{
    if words.len() < 3 {
        return None;
    }
    let mut ll_sum = 0.0;
    let mut pmi_sum = 0.0;
    for pair in words.windows(2) {
        let key = format!("{}{}{}", pair[0], NGRAM_SEPARATOR, pair[1]);
        let (ll, pmi) = get(&key)?;
        ll_sum += ll;
        pmi_sum += pmi;
    }
    Some((ll_sum, pmi_sum))
}
