//! Growth metrics — population doubling level and doubling time
//!
//! PDL per passage is approximated as `3.322 * log10(harvested / seeded)`,
//! the log2 of the growth ratio. Non-positive inputs contribute no growth
//! instead of failing.

use log::debug;

/// log2(10), rounded the way culture protocols write it
pub const PDL_FACTOR: f64 = 3.322;

/// Returns `(delta, new_pdl)` for one seed-to-harvest cycle
pub fn pdl_delta(seeded: f64, harvested: f64, previous_pdl: f64) -> (f64, f64) {
    // also rejects NaN
    if !(seeded > 0.0 && harvested > 0.0) {
        debug!(
            "No PDL contribution for seeded={} harvested={}; keeping {}",
            seeded, harvested, previous_pdl
        );
        return (0.0, previous_pdl);
    }
    let delta = PDL_FACTOR * (harvested / seeded).log10();
    (delta, previous_pdl + delta)
}

/// Hours per population doubling, undefined without net growth
pub fn doubling_time(hours: f64, delta_pdl: f64) -> Option<f64> {
    if !(delta_pdl > 0.0) {
        debug!("Doubling time undefined for delta PDL {}", delta_pdl);
        return None;
    }
    // infinite or NaN hours would not survive the JSON document
    Some(hours / delta_pdl).filter(|dt| dt.is_finite())
}

/// Everything a passage derives from a harvest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthMetrics {
    pub delta_pdl: f64,
    pub cumulative_pdl: f64,
    pub doubling_time: Option<f64>,
}

impl GrowthMetrics {
    pub fn derive(seeded: u64, harvested: u64, previous_pdl: f64, hours: f64) -> Self {
        let (delta_pdl, cumulative_pdl) = pdl_delta(seeded as f64, harvested as f64, previous_pdl);
        Self {
            delta_pdl,
            cumulative_pdl,
            doubling_time: doubling_time(hours, delta_pdl),
        }
    }
}
