//! Histogram binning and kernel density estimate for one numeric column.

use rayon::prelude::*;
use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;

use super::describe::percentile;
use crate::models::Histogram;

const KDE_GRID_POINTS: usize = 200;
const MAX_BINS: usize = 200;

/// Bins the values and overlays a density curve. `None` when there is
/// nothing to plot.
pub fn histogram(values: &[f64]) -> Option<Histogram> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let edges = bin_edges(&sorted);
    let counts = bin_counts(&sorted, &edges);
    let bin_width = (edges[edges.len() - 1] - edges[0]) / counts.len() as f64;
    let density = kde_curve(&sorted, bin_width);

    Some(Histogram {
        edges,
        counts,
        density,
    })
}

/// Edges following NumPy's `auto` estimator: the narrower of the Sturges and
/// Freedman-Diaconis widths, falling back to Sturges when the IQR is zero.
///
/// Widths are worked out on half the spread so values near `f64::MAX` of
/// opposite sign do not overflow.
fn bin_edges(sorted: &[f64]) -> Vec<f64> {
    let n = sorted.len() as f64;
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];

    if max == min {
        return vec![min - 0.5, max + 0.5];
    }

    let half_range = max / 2.0 - min / 2.0;
    let sturges = half_range / (n.log2() + 1.0);
    let half_iqr = percentile(sorted, 75.0) / 2.0 - percentile(sorted, 25.0) / 2.0;
    let fd = 2.0 * half_iqr * n.powf(-1.0 / 3.0);
    let width = if fd > 0.0 { fd.min(sturges) } else { sturges };

    let bins = ((half_range / width).ceil() as usize).clamp(1, MAX_BINS);

    (0..=bins)
        .map(|i| {
            if i == bins {
                max
            } else {
                let t = i as f64 / bins as f64;
                min * (1.0 - t) + max * t
            }
        })
        .collect()
}

/// Where `v` sits between `lo` and `hi`, as a fraction of the span.
pub(crate) fn position(v: f64, lo: f64, hi: f64) -> f64 {
    (v / 2.0 - lo / 2.0) / (hi / 2.0 - lo / 2.0)
}

fn bin_counts(sorted: &[f64], edges: &[f64]) -> Vec<usize> {
    let bins = edges.len() - 1;
    let lo = edges[0];
    let hi = edges[bins];
    let mut counts = vec![0usize; bins];

    for &v in sorted {
        // last bin is closed on the right
        let idx = (position(v, lo, hi) * bins as f64).floor() as usize;
        counts[idx.min(bins - 1)] += 1;
    }
    counts
}

/// Gaussian KDE with Scott's bandwidth, scaled so the curve sits on the
/// histogram's count axis.
fn kde_curve(sorted: &[f64], bin_width: f64) -> Option<Vec<(f64, f64)>> {
    if sorted.len() < 2 {
        return None;
    }

    let n = sorted.len() as f64;
    let std = Statistics::std_dev(sorted.iter());
    if !std.is_finite() || std <= 0.0 {
        return None;
    }

    let bandwidth = std * n.powf(-0.2);
    let kernel = Normal::new(0.0, 1.0).ok()?;
    let lo = sorted[0];
    let hi = sorted[sorted.len() - 1];
    let step = (hi - lo) / (KDE_GRID_POINTS - 1) as f64;
    let scale = bin_width / bandwidth;
    if !step.is_finite() || !scale.is_finite() {
        return None;
    }

    let points = (0..KDE_GRID_POINTS)
        .into_par_iter()
        .map(|i| {
            let x = lo + step * i as f64;
            let sum: f64 = sorted.iter().map(|xi| kernel.pdf((x - xi) / bandwidth)).sum();
            // density * n * bin_width, with density = sum / (n * h)
            (x, sum * scale)
        })
        .collect();

    Some(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_no_histogram() {
        assert!(histogram(&[]).is_none());
    }

    #[test]
    fn counts_cover_every_value() {
        let values: Vec<f64> = (0..100).map(|v| (v % 17) as f64 * 1.3).collect();
        let hist = histogram(&values).unwrap();

        assert_eq!(hist.counts.iter().sum::<usize>(), values.len());
        assert_eq!(hist.edges.len(), hist.counts.len() + 1);
        assert_eq!(hist.edges[0], 0.0);
        assert_eq!(*hist.edges.last().unwrap(), 16.0 * 1.3);
    }

    #[test]
    fn bin_count_follows_auto_rule() {
        // 1..=10: Sturges gives ceil(log2(10) + 1) = 5 bins, FD is wider.
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let hist = histogram(&values).unwrap();
        assert_eq!(hist.counts.len(), 5);
        assert_eq!(hist.counts, vec![2, 2, 2, 2, 2]);
    }

    #[test]
    fn constant_values_use_a_single_unit_bin() {
        let hist = histogram(&[3.0, 3.0, 3.0]).unwrap();
        assert_eq!(hist.edges, vec![2.5, 3.5]);
        assert_eq!(hist.counts, vec![3]);
        assert!(hist.density.is_none());
    }

    #[test]
    fn single_value_has_no_density() {
        let hist = histogram(&[42.0]).unwrap();
        assert_eq!(hist.counts, vec![1]);
        assert!(hist.density.is_none());
    }

    #[test]
    fn density_is_scaled_to_counts() {
        let values: Vec<f64> = (0..500).map(|v| ((v * 37) % 101) as f64).collect();
        let hist = histogram(&values).unwrap();
        let density = hist.density.as_ref().unwrap();

        assert_eq!(density.len(), KDE_GRID_POINTS);
        // area under the scaled curve approximates n * bin_width
        let area: f64 = density
            .windows(2)
            .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
            .sum();
        let expected = values.len() as f64 * hist.bin_width();
        assert!(area > expected * 0.8 && area < expected * 1.05, "area {} vs {}", area, expected);
    }

    #[test]
    fn extreme_spread_keeps_finite_edges() {
        let hist = histogram(&[1e308, -1e308, 0.0]).unwrap();

        assert!(hist.edges.iter().all(|e| e.is_finite()), "edges {:?}", hist.edges);
        assert!(hist.edges.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(hist.edges[0], -1e308);
        assert_eq!(*hist.edges.last().unwrap(), 1e308);
        assert_eq!(hist.counts.iter().sum::<usize>(), 3);
        assert!(hist.density.is_none());
    }
}
