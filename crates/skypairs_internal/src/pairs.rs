use crate::accum::BinnedAccum;
use crate::bins::{MuBins, SeparationBins};
use ndarray::ArrayView2;
use std::ops::Range;

/// Borrowed view of one point set.
///
/// Positions are Cartesian (the caller has already converted from sky
/// coordinates) and stored as a `(3, n_points)` array: axis 0 is the slow
/// axis holding the x/y/z components, axis 1 is the fast axis and must be
/// contiguous.
#[derive(Clone)]
pub struct SkyPoints<'a> {
    positions: ArrayView2<'a, f64>,
    weights: Option<&'a [f64]>,
    n_points: usize,
}

impl<'a> SkyPoints<'a> {
    pub fn new(
        positions: ArrayView2<'a, f64>,
        weights: Option<&'a [f64]>,
    ) -> Result<SkyPoints<'a>, &'static str> {
        let n_points = positions.shape()[1];
        if positions.shape()[0] != 3 {
            Err("positions must have shape (3, n_points)")
        } else if n_points == 0 {
            Err("positions must hold at least one point")
        } else if positions.strides()[1] != 1 {
            Err("positions must be contiguous along the fast axis")
        } else if weights.is_some_and(|w| w.len() != n_points) {
            Err("weights must have the same number of points as positions")
        } else {
            Ok(Self {
                positions,
                weights,
                n_points,
            })
        }
    }

    pub fn n_points(&self) -> usize {
        self.n_points
    }

    pub fn has_weights(&self) -> bool {
        self.weights.is_some()
    }

    /// If no weights are provided, returns 1.0, i.e., weights are just counts.
    fn get_weight(&self, idx: usize) -> f64 {
        if let Some(weights) = self.weights {
            weights[idx]
        } else {
            1.0
        }
    }
}

/// Accumulate pair counts over every pair of points.
///
/// When `points_b` is `None`, all unique pairs within `points_a` are
/// considered (each pair once). Otherwise all pairs between `points_a` and
/// `points_b` are considered.
///
/// For each pair the squared separation selects a separation bin, and the
/// squared cosine of the angle between the separation vector and the pair's
/// line of sight (the direction to the pair midpoint) selects a mu bin.
/// Pairs landing outside either binning range are dropped, as are degenerate
/// pairs (coincident points, or a midpoint at the observer) whose `mu` is
/// undefined.
///
/// `output_savg` controls whether the per-pair separation (one square root
/// per surviving pair) is accumulated; weight totals are accumulated only
/// when at least one side carries weights.
pub fn count_pairs(
    accum: &mut BinnedAccum,
    points_a: &SkyPoints,
    points_b: Option<&SkyPoints>,
    sep_bins: &SeparationBins,
    mu_bins: &MuBins,
    output_savg: bool,
) -> Result<(), &'static str> {
    count_pairs_range(
        accum,
        points_a,
        points_b,
        sep_bins,
        mu_bins,
        output_savg,
        0..points_a.n_points,
    )
}

/// Like [`count_pairs`], restricted to outer-loop indices in `outer_range`.
///
/// Concurrent callers split `0..points_a.n_points()` into disjoint ranges,
/// give each its own accumulator grid, and combine the grids with
/// [`BinnedAccum::merge`] afterwards. The union of the partial results is
/// identical to a single full-range call.
pub fn count_pairs_range(
    accum: &mut BinnedAccum,
    points_a: &SkyPoints,
    points_b: Option<&SkyPoints>,
    sep_bins: &SeparationBins,
    mu_bins: &MuBins,
    output_savg: bool,
    outer_range: Range<usize>,
) -> Result<(), &'static str> {
    if accum.n_sep_bins() != sep_bins.n_bins() || accum.n_mu_bins() != mu_bins.n_bins() {
        return Err("the accumulator grid doesn't match the bin counts");
    } else if outer_range.end > points_a.n_points {
        return Err("the outer index range extends past the end of points_a");
    }

    if let Some(points_b) = points_b {
        if points_a.weights.is_some() != points_b.weights.is_some() {
            return Err(
                "points_a and points_b must both provide weights or neither \
                should provide weights",
            );
        }
        count_pairs_helper::<true>(
            accum,
            points_a,
            points_b,
            sep_bins,
            mu_bins,
            output_savg,
            outer_range,
        );
    } else {
        count_pairs_helper::<false>(
            accum,
            points_a,
            points_a,
            sep_bins,
            mu_bins,
            output_savg,
            outer_range,
        );
    }
    Ok(())
}

fn count_pairs_helper<const CROSS: bool>(
    accum: &mut BinnedAccum,
    points_a: &SkyPoints,
    points_b: &SkyPoints,
    sep_bins: &SeparationBins,
    mu_bins: &MuBins,
    output_savg: bool,
    outer_range: Range<usize>,
) {
    let weighted = points_a.weights.is_some() || points_b.weights.is_some();
    let pos_a = &points_a.positions;
    let pos_b = &points_b.positions;

    for i_a in outer_range {
        let (ax, ay, az) = (pos_a[[0, i_a]], pos_a[[1, i_a]], pos_a[[2, i_a]]);
        let i_b_start = if CROSS { 0 } else { i_a + 1 };
        for i_b in i_b_start..points_b.n_points {
            let dx = ax - pos_b[[0, i_b]];
            let dy = ay - pos_b[[1, i_b]];
            let dz = az - pos_b[[2, i_b]];
            let s_sq = dx * dx + dy * dy + dz * dz;

            let Some(sep_bin) = sep_bins.bin_index_sq(s_sq) else {
                continue;
            };

            // the line of sight points at the pair midpoint; only its
            // direction matters, so skip dividing by 2
            let lx = ax + pos_b[[0, i_b]];
            let ly = ay + pos_b[[1, i_b]];
            let lz = az + pos_b[[2, i_b]];
            let l_sq = lx * lx + ly * ly + lz * lz;
            if s_sq == 0.0 || l_sq == 0.0 {
                continue;
            }

            let dot = dx * lx + dy * ly + dz * lz;
            let mu_sq = (dot * dot) / (l_sq * s_sq);
            let Some(mu_bin) = mu_bins.bin_index_sq(mu_sq) else {
                continue;
            };

            let s_contrib = if output_savg { s_sq.sqrt() } else { 0.0 };
            let weight_contrib = if weighted {
                points_a.get_weight(i_a) * points_b.get_weight(i_b)
            } else {
                0.0
            };
            accum.consume(sep_bin, mu_bin, s_contrib, weight_contrib);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayView2;

    fn points(buf: &[f64]) -> SkyPoints<'_> {
        let n = buf.len() / 3;
        SkyPoints::new(ArrayView2::from_shape((3, n), buf).unwrap(), None).unwrap()
    }

    #[test]
    fn sky_points_validation() {
        let buf = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        // wrong slow-axis length
        assert!(SkyPoints::new(ArrayView2::from_shape((2, 3), &buf).unwrap(), None).is_err());
        // mismatched weights
        let weights = [1.0];
        assert!(
            SkyPoints::new(ArrayView2::from_shape((3, 2), &buf).unwrap(), Some(&weights)).is_err()
        );
        assert!(SkyPoints::new(ArrayView2::from_shape((3, 2), &buf).unwrap(), None).is_ok());
    }

    #[test]
    fn auto_pairs_in_transverse_plane() {
        // three points at the same radius on different axes: every pair's
        // separation vector is perpendicular to its line of sight (mu = 0)
        // and every separation is 10*sqrt(2)
        #[rustfmt::skip]
        let buf = [
            10.0,  0.0, 0.0,
             0.0, 10.0, 0.0,
             0.0,  0.0, 10.0,
        ];
        let pts = points(&buf);
        let sep_bins = SeparationBins::from_edges(&[14.0, 15.0]).unwrap();
        let mu_bins = MuBins::new(4).unwrap();
        let mut accum = BinnedAccum::new(1, 4).unwrap();

        count_pairs(&mut accum, &pts, None, &sep_bins, &mu_bins, true).unwrap();

        let state = accum.state(0, 0);
        assert_eq!(state.npairs, 3);
        let expected_s = 10.0 * 2.0_f64.sqrt();
        assert!((state.s_sum - 3.0 * expected_s).abs() < 1e-12);
        // no weights anywhere -> weight totals untouched
        assert_eq!(state.weight_sum, 0.0);
        for mu_bin in 1..4 {
            assert_eq!(accum.state(0, mu_bin).npairs, 0);
        }
    }

    #[test]
    fn cross_pairs_with_weights() {
        let buf_a = [10.0, 0.0, 0.0];
        let buf_b = [0.0, 0.0, 10.0, 0.0, 0.0, 10.0];
        let weights_a = [2.0];
        let weights_b = [3.0, 5.0];
        let pts_a = SkyPoints::new(
            ArrayView2::from_shape((3, 1), &buf_a).unwrap(),
            Some(&weights_a),
        )
        .unwrap();
        let pts_b = SkyPoints::new(
            ArrayView2::from_shape((3, 2), &buf_b).unwrap(),
            Some(&weights_b),
        )
        .unwrap();

        let sep_bins = SeparationBins::from_edges(&[14.0, 15.0]).unwrap();
        let mu_bins = MuBins::new(2).unwrap();
        let mut accum = BinnedAccum::new(1, 2).unwrap();

        count_pairs(&mut accum, &pts_a, Some(&pts_b), &sep_bins, &mu_bins, false).unwrap();

        let state = accum.state(0, 0);
        assert_eq!(state.npairs, 2);
        assert_eq!(state.weight_sum, 2.0 * 3.0 + 2.0 * 5.0);
        // savg wasn't requested
        assert_eq!(state.s_sum, 0.0);
    }

    #[test]
    fn mismatched_weight_presence() {
        let buf_a = [10.0, 0.0, 0.0];
        let buf_b = [0.0, 10.0, 0.0];
        let weights_a = [2.0];
        let pts_a = SkyPoints::new(
            ArrayView2::from_shape((3, 1), &buf_a).unwrap(),
            Some(&weights_a),
        )
        .unwrap();
        let pts_b = SkyPoints::new(ArrayView2::from_shape((3, 1), &buf_b).unwrap(), None).unwrap();

        let sep_bins = SeparationBins::from_edges(&[14.0, 15.0]).unwrap();
        let mu_bins = MuBins::new(2).unwrap();
        let mut accum = BinnedAccum::new(1, 2).unwrap();
        assert!(
            count_pairs(&mut accum, &pts_a, Some(&pts_b), &sep_bins, &mu_bins, false).is_err()
        );
    }

    #[test]
    fn mu_assignment_for_inclined_pair() {
        // p1 = (100, 0, 0), p2 = (103, 4, 0):
        //   separation vector d = (-3, -4, 0), s = 5
        //   line of sight l = (203, 4, 0), d.l = -625
        //   mu^2 = 625^2 / (|l|^2 * 25) = 390625 / 1030625 ~= 0.379
        //   mu ~= 0.6156 -> third of four mu bins
        let buf = [100.0, 103.0, 0.0, 4.0, 0.0, 0.0];
        let pts = points(&buf);
        let sep_bins = SeparationBins::from_edges(&[4.0, 6.0]).unwrap();
        let mu_bins = MuBins::new(4).unwrap();
        let mut accum = BinnedAccum::new(1, 4).unwrap();

        count_pairs(&mut accum, &pts, None, &sep_bins, &mu_bins, true).unwrap();

        assert_eq!(accum.state(0, 2).npairs, 1);
        assert!((accum.state(0, 2).s_sum - 5.0).abs() < 1e-12);
        for mu_bin in [0, 1, 3] {
            assert_eq!(accum.state(0, mu_bin).npairs, 0);
        }
    }

    #[test]
    fn degenerate_pairs_are_skipped() {
        // every pair here is degenerate: two coincident points (s = 0) and
        // pairs that straddle the observer (midpoint at the origin, so mu
        // is undefined)
        #[rustfmt::skip]
        let buf = [
            5.0, 5.0, -5.0,
            0.0, 0.0,  0.0,
            0.0, 0.0,  0.0,
        ];
        let pts = points(&buf);
        let sep_bins = SeparationBins::from_edges(&[0.0, 20.0]).unwrap();
        let mu_bins = MuBins::new(2).unwrap();
        let mut accum = BinnedAccum::new(1, 2).unwrap();

        count_pairs(&mut accum, &pts, None, &sep_bins, &mu_bins, false).unwrap();

        let total: u64 = (0..2).map(|j| accum.state(0, j).npairs).sum();
        assert_eq!(total, 0);
    }

    #[test]
    fn range_chunks_match_full_loop() {
        // a handful of points scattered off-axis so several bins are hit
        #[rustfmt::skip]
        let buf = [
            100.0, 103.0, 98.0, 101.5, 97.0,
              0.0,   4.0,  6.0,  -3.0,  2.5,
              1.0,  -2.0,  3.0,   0.5, -1.5,
        ];
        let pts = points(&buf);
        let sep_bins = SeparationBins::from_edges(&[0.0, 4.0, 8.0, 16.0]).unwrap();
        let mu_bins = MuBins::new(3).unwrap();

        let mut full = BinnedAccum::new(3, 3).unwrap();
        count_pairs(&mut full, &pts, None, &sep_bins, &mu_bins, true).unwrap();

        let mut merged = BinnedAccum::new(3, 3).unwrap();
        for range in [0..2, 2..3, 3..5] {
            let mut partial = BinnedAccum::new(3, 3).unwrap();
            count_pairs_range(&mut partial, &pts, None, &sep_bins, &mu_bins, true, range)
                .unwrap();
            merged.merge(&partial).unwrap();
        }

        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(full.state(i, j).npairs, merged.state(i, j).npairs);
                assert_eq!(full.state(i, j).s_sum, merged.state(i, j).s_sum);
            }
        }
    }
}
