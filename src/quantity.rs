//! Run-count and input scaling rules

/// Float noise below this is not allowed to add an extra run.
const EPSILON: f64 = 1e-9;

/// Number of recipe runs needed to produce at least `desired` units when one
/// run yields `output_per_run`. Yields below one are treated as one.
pub fn runs_needed(desired: f64, output_per_run: f64) -> u64 {
    if desired <= 0.0 || !desired.is_finite() {
        return 0;
    }
    let per_run = if output_per_run.is_finite() {
        output_per_run.max(1.0)
    } else {
        1.0
    };
    let exact = desired / per_run;
    let rounded = exact.round();
    if (exact - rounded).abs() < EPSILON {
        rounded as u64
    } else {
        exact.ceil() as u64
    }
}

/// Quantity of an input consumed by `runs` runs.
pub fn input_qty_for_runs(input_per_run: f64, runs: u64) -> f64 {
    input_per_run * runs as f64
}

/// Whole units shown for a leaf; never rounds a shortage away.
pub fn display_quantity(quantity: f64) -> u64 {
    if quantity <= 0.0 || !quantity.is_finite() {
        return 0;
    }
    let rounded = quantity.round();
    if (quantity - rounded).abs() < EPSILON {
        rounded as u64
    } else {
        quantity.ceil() as u64
    }
}
