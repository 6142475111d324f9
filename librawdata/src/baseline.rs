use ndarray::{Array1, ArrayView1, Zip};
use std::collections::BTreeMap;

/// Sign applied to a baseline-subtracted trace when it enters a running sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn sign(&self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }
}

/// The most frequent value in a trace.
///
/// Ties are broken toward the smallest value: the counts are walked in ascending value
/// order and a later value only wins with a strictly larger count.
/// Returns None for an empty trace.
pub fn mode<T: Ord + Copy>(trace: ArrayView1<T>) -> Option<T> {
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for value in trace.iter() {
        *counts.entry(*value).or_insert(0) += 1;
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => (),
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value)
}

/// Subtract the mode baseline from a trace
pub fn subtract_baseline(trace: ArrayView1<i16>) -> Array1<f64> {
    match mode(trace) {
        Some(baseline) => trace.mapv(|v| (v as f64) - (baseline as f64)),
        None => Array1::zeros(0),
    }
}

/// Running polarity-weighted sum of baseline-subtracted traces.
///
/// Starts at zero and is carried across every sensor of one pass.
#[derive(Debug, Clone)]
pub struct SumAccumulator {
    sum: Array1<f64>,
}

impl SumAccumulator {
    pub fn new(n_bins: usize) -> Self {
        Self {
            sum: Array1::zeros(n_bins),
        }
    }

    /// Add sign * trace to the running total
    pub fn accumulate(&mut self, trace: ArrayView1<f64>, polarity: Polarity) {
        if trace.len() != self.sum.len() {
            log::warn!(
                "Skipping trace of length {} in a sum of length {}",
                trace.len(),
                self.sum.len()
            );
            return;
        }
        let sign = polarity.sign();
        Zip::from(&mut self.sum)
            .and(&trace)
            .for_each(|acc, &v| *acc += sign * v);
    }

    /// Baseline-subtract a raw trace and add it
    pub fn accumulate_raw(&mut self, trace: ArrayView1<i16>, polarity: Polarity) {
        let bls = subtract_baseline(trace);
        self.accumulate(bls.view(), polarity);
    }

    pub fn reset(&mut self) {
        self.sum.fill(0.0);
    }

    pub fn values(&self) -> ArrayView1<f64> {
        self.sum.view()
    }
}
