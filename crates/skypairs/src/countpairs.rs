//! The request layer: validate and normalize caller arguments, hand one
//! [`EngineRequest`] to a [`CountEngine`], and shape the raw rows that come
//! back into the labeled result table.
//!
//! Everything here happens before (or after) the one blocking engine call;
//! the layer keeps no state between invocations.

use crate::binfile::{self, BinSpec};
use crate::coords::fix_ra_dec;
use crate::cosmology::Cosmology;
use crate::engine::{CountEngine, EngineError, EngineRequest, ReferenceEngine, WeightType};
use crate::error::Error;
use crate::isa::InstructionSet;
use log::debug;
use std::time::Duration;

/// Caller-supplied weights for one side of the calculation.
#[derive(Clone, Copy, Debug)]
pub enum Weights<'a> {
    /// one weight shared by every point; broadcast before forwarding
    Scalar(f64),
    /// one weight per point
    PerPoint(&'a [f64]),
}

/// The optional arguments of [`count_pairs_s_mu`], builder style.
///
/// Every field that stays unset is *omitted* from the forwarded request
/// (engines distinguish absent from present-but-empty), with one exception:
/// the second coordinate triple, which auto-correlation mode synthesizes as
/// placeholders the engine never reads.
#[derive(Clone, Default)]
pub struct CountSMuOptions<'a> {
    ra2: Option<&'a [f64]>,
    dec2: Option<&'a [f64]>,
    cz2: Option<&'a [f64]>,
    weights1: Option<Weights<'a>>,
    weights2: Option<Weights<'a>>,
    weight_type: Option<WeightType>,
    is_comoving_dist: bool,
    verbose: bool,
    output_savg: bool,
    fast_divide: bool,
    bin_refine_factors: Option<[u8; 3]>,
    max_cells_per_dim: Option<u16>,
    c_api_timer: bool,
    isa: Option<String>,
}

impl<'a> CountSMuOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ra2(mut self, ra2: &'a [f64]) -> Self {
        self.ra2 = Some(ra2);
        self
    }

    pub fn dec2(mut self, dec2: &'a [f64]) -> Self {
        self.dec2 = Some(dec2);
        self
    }

    pub fn cz2(mut self, cz2: &'a [f64]) -> Self {
        self.cz2 = Some(cz2);
        self
    }

    pub fn weights1(mut self, weights: Weights<'a>) -> Self {
        self.weights1 = Some(weights);
        self
    }

    pub fn weights2(mut self, weights: Weights<'a>) -> Self {
        self.weights2 = Some(weights);
        self
    }

    pub fn weight_type(mut self, weight_type: WeightType) -> Self {
        self.weight_type = Some(weight_type);
        self
    }

    /// mark the radial columns as precomputed comoving distances
    pub fn comoving_dist(mut self, yes: bool) -> Self {
        self.is_comoving_dist = yes;
        self
    }

    pub fn verbose(mut self, yes: bool) -> Self {
        self.verbose = yes;
        self
    }

    /// also accumulate the average separation per bin (one extra square
    /// root per counted pair)
    pub fn output_savg(mut self, yes: bool) -> Self {
        self.output_savg = yes;
        self
    }

    pub fn fast_divide(mut self, yes: bool) -> Self {
        self.fast_divide = yes;
        self
    }

    pub fn bin_refine_factors(mut self, factors: [u8; 3]) -> Self {
        self.bin_refine_factors = Some(factors);
        self
    }

    pub fn max_cells_per_dim(mut self, max_cells: u16) -> Self {
        self.max_cells_per_dim = Some(max_cells);
        self
    }

    /// also report the time the engine spent counting
    pub fn c_api_timer(mut self, yes: bool) -> Self {
        self.c_api_timer = yes;
        self
    }

    /// instruction-set token: `"fastest"` (the default), `"avx"`,
    /// `"sse42"`, or `"fallback"`
    pub fn isa(mut self, token: impl Into<String>) -> Self {
        self.isa = Some(token.into());
        self
    }
}

/// One row of the result table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SMuBin {
    pub s_min: f64,
    pub s_max: f64,
    /// zero unless average separations were requested
    pub s_avg: f64,
    /// upper edge of this row's mu bin
    pub mu_max: f64,
    pub n_pairs: u64,
    /// zero unless weighting was requested
    pub weight_avg: f64,
}

/// The result table, one [`SMuBin`] per (separation, mu) bin in the order
/// the bin specification resolved to.
#[derive(Clone, Debug)]
pub struct SMuPairCounts {
    pub bins: Vec<SMuBin>,
    /// `Some` iff the caller set `c_api_timer`
    pub api_time: Option<Duration>,
}

/// Count pairs between on-sky points in bins of separation and of the
/// cosine of the angle to the line of sight, using the bundled
/// [`ReferenceEngine`].
///
/// `autocorr` selects auto- vs cross-correlation; cross-correlation
/// requires the full second triple in `options`. `cosmology_id` is 1
/// (LasDamas) or 2 (Planck); it only matters when the radial columns hold
/// `c*z` values that still need converting. The bin specification resolves
/// to a two-column file; a temporary file materialized for an explicit edge
/// sequence is deleted before this function returns, whether the engine
/// call succeeded or not.
#[allow(clippy::too_many_arguments)]
pub fn count_pairs_s_mu(
    autocorr: bool,
    cosmology_id: i32,
    nthreads: usize,
    n_mu_bins: usize,
    bin_spec: &BinSpec,
    ra1: &[f64],
    dec1: &[f64],
    cz1: &[f64],
    options: &CountSMuOptions<'_>,
) -> Result<SMuPairCounts, Error> {
    count_pairs_s_mu_with_engine(
        autocorr,
        cosmology_id,
        nthreads,
        n_mu_bins,
        bin_spec,
        ra1,
        dec1,
        cz1,
        options,
        &ReferenceEngine::new(),
    )
}

/// Like [`count_pairs_s_mu`], but against a caller-supplied engine.
#[allow(clippy::too_many_arguments)]
pub fn count_pairs_s_mu_with_engine(
    autocorr: bool,
    cosmology_id: i32,
    nthreads: usize,
    n_mu_bins: usize,
    bin_spec: &BinSpec,
    ra1: &[f64],
    dec1: &[f64],
    cz1: &[f64],
    options: &CountSMuOptions<'_>,
    engine: &dyn CountEngine,
) -> Result<SMuPairCounts, Error> {
    let cosmology = Cosmology::from_id(cosmology_id)?;
    check_integer_range("nthreads", nthreads, 1, 4096)?;
    check_integer_range("the number of mu bins", n_mu_bins, 1, 10_000)?;
    check_triple("the first coordinate triple", ra1, dec1, cz1)?;

    let mut weights1 = normalize_weights(options.weights1, ra1.len(), "weights1")?;
    let mut weights2: Option<Vec<f64>> = None;

    // the second triple: required (and validated) for a cross-correlation,
    // synthesized as never-read placeholders for an auto-correlation
    let (ra2, dec2, cz2) = if autocorr {
        if options.weights2.is_some() {
            debug!("weights2 were supplied for an auto-correlation; ignoring them");
        }
        (vec![0.0], vec![0.0], vec![0.0])
    } else {
        let ra2 = options.ra2.ok_or_else(|| Error::missing_cross_arg("ra2"))?;
        let dec2 = options.dec2.ok_or_else(|| Error::missing_cross_arg("dec2"))?;
        let cz2 = options.cz2.ok_or_else(|| Error::missing_cross_arg("cz2"))?;
        check_triple("the second coordinate triple", ra2, dec2, cz2)?;

        weights2 = normalize_weights(options.weights2, ra2.len(), "weights2")?;
        // if only one side is weighted, the other side gets uniform weights
        if weights1.is_some() && weights2.is_none() {
            weights2 = Some(vec![1.0; ra2.len()]);
        } else if weights2.is_some() && weights1.is_none() {
            weights1 = Some(vec![1.0; ra1.len()]);
        }
        (ra2.to_vec(), dec2.to_vec(), cz2.to_vec())
    };

    // convention repair runs on owned copies; the caller's arrays stay as
    // they were supplied
    let (mut ra1, mut dec1) = (ra1.to_vec(), dec1.to_vec());
    fix_ra_dec(&mut ra1, &mut dec1);
    let (mut ra2, mut dec2) = (ra2, dec2);
    if !autocorr {
        fix_ra_dec(&mut ra2, &mut dec2);
    }

    let isa = InstructionSet::from_token(options.isa.as_deref().unwrap_or("fastest"))?;

    // weighting defaults to the pair-product scheme whenever weights are in
    // play and the caller didn't name a scheme
    let weight_type = match (&weights1, options.weight_type) {
        (Some(_), None) => Some(WeightType::PairProduct),
        (Some(_), explicit) => explicit,
        (None, _) => None,
    };

    // `resolved` owns any temporary bin file; it is dropped (and the file
    // deleted) on every path out of this function
    let resolved = binfile::resolve_bins(bin_spec)?;
    let request = EngineRequest {
        autocorr,
        cosmology,
        nthreads,
        n_mu_bins,
        binfile: resolved.path(),
        ra1: &ra1,
        dec1: &dec1,
        cz1,
        ra2: &ra2,
        dec2: &dec2,
        cz2: &cz2,
        weights1: weights1.as_deref(),
        weights2: weights2.as_deref(),
        weight_type,
        is_comoving_dist: options.is_comoving_dist,
        verbose: options.verbose,
        output_savg: options.output_savg,
        fast_divide: options.fast_divide,
        bin_refine_factors: options.bin_refine_factors.unwrap_or([2, 2, 1]),
        max_cells_per_dim: options.max_cells_per_dim.unwrap_or(100),
        isa,
    };

    let output = engine.count(&request).map_err(|err| match err {
        EngineError::Unavailable(detail) => Error::engine_unavailable(detail),
        EngineError::Failed => Error::runtime_failure(),
    })?;

    let bins = output
        .rows
        .iter()
        .map(|&(s_min, s_max, s_avg, mu_max, n_pairs, weight_avg)| SMuBin {
            s_min,
            s_max,
            s_avg,
            mu_max,
            n_pairs,
            weight_avg,
        })
        .collect();

    Ok(SMuPairCounts {
        bins,
        api_time: options.c_api_timer.then_some(output.elapsed),
    })
}

fn check_integer_range(
    description: &'static str,
    actual: usize,
    min_val: i64,
    max_val: i64,
) -> Result<(), Error> {
    let actual = actual as i64;
    if actual < min_val || actual > max_val {
        Err(Error::integer_range(description, actual, min_val, max_val))
    } else {
        Ok(())
    }
}

fn check_triple(
    who: &'static str,
    ra: &[f64],
    dec: &[f64],
    cz: &[f64],
) -> Result<(), Error> {
    if ra.is_empty() {
        Err(Error::array_shape(who, "it holds no points".to_owned()))
    } else if ra.len() != dec.len() || ra.len() != cz.len() {
        Err(Error::array_shape(
            who,
            format!(
                "ra/dec/cz lengths differ ({}, {}, {})",
                ra.len(),
                dec.len(),
                cz.len()
            ),
        ))
    } else {
        Ok(())
    }
}

/// Broadcast a scalar weight and validate a per-point array against its
/// triple's length.
fn normalize_weights(
    weights: Option<Weights<'_>>,
    n_points: usize,
    who: &'static str,
) -> Result<Option<Vec<f64>>, Error> {
    match weights {
        None => Ok(None),
        Some(Weights::Scalar(w)) => Ok(Some(vec![w; n_points])),
        Some(Weights::PerPoint(values)) => {
            if values.len() != n_points {
                Err(Error::array_shape(
                    who,
                    format!(
                        "expected {} entries to match the coordinate triple, got {}",
                        n_points,
                        values.len()
                    ),
                ))
            } else {
                Ok(Some(values.to_vec()))
            }
        }
    }
}
