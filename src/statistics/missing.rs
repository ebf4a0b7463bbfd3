//! Missing-data summaries over a `[time, y, x]` cube

use ndarray::{Array2, ArrayView3, Axis};

/// Equal-width histogram of per-pixel missing fractions in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct MissingHistogram {
    /// `bins + 1` edges from 0.0 to 1.0
    pub edges: Vec<f64>,
    /// Pixel count per bin; the last bin includes 1.0
    pub counts: Vec<usize>,
    /// Number of time steps each fraction was taken over
    pub time_steps: usize,
}

impl MissingHistogram {
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Number of missing time steps at every pixel, indexed `[y, x]`
#[must_use]
pub fn missing_count_map(cube: ArrayView3<'_, f32>) -> Array2<u32> {
    cube.fold_axis(Axis(0), 0u32, |&acc, v| if v.is_nan() { acc + 1 } else { acc })
}

/// Fraction of missing pixels in each time step
#[must_use]
pub fn missing_fraction_by_time(cube: ArrayView3<'_, f32>) -> Vec<f32> {
    cube.axis_iter(Axis(0))
        .map(|slice| {
            if slice.is_empty() {
                return 0.0;
            }
            let missing = slice.iter().filter(|v| v.is_nan()).count();
            missing as f32 / slice.len() as f32
        })
        .collect()
}

/// Histogram of the per-pixel missing fraction `count / time_steps`
#[must_use]
pub fn missing_histogram(counts: &Array2<u32>, time_steps: usize, bins: usize) -> MissingHistogram {
    let bins = bins.max(1);
    let edges = (0..=bins).map(|i| i as f64 / bins as f64).collect();
    let mut histogram = vec![0usize; bins];
    if time_steps > 0 {
        for &count in counts {
            let fraction = f64::from(count) / time_steps as f64;
            let bin = ((fraction * bins as f64) as usize).min(bins - 1);
            histogram[bin] += 1;
        }
    }
    MissingHistogram {
        edges,
        counts: histogram,
        time_steps,
    }
}
