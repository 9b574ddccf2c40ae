//! The engine boundary: the request structure handed across it, the raw
//! result rows handed back, and the reference engine implementation.
//!
//! The driver in [`crate::countpairs`] validates and normalizes everything
//! before building an [`EngineRequest`], so engines can trust the request:
//! triples have matching lengths, weights (when present) match their triple,
//! and in cross mode either both sides carry weights or neither does.

use crate::binfile;
use crate::coords::sky_to_cartesian;
use crate::cosmology::Cosmology;
use crate::isa::InstructionSet;
use log::{error, info};
use skypairs_internal::{BinnedAccum, MuBins, SeparationBins, SkyPoints, count_pairs_range};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// How per-point weights combine into a pair weight. `PairProduct` is the
/// only scheme; the enum exists so the request structure names the scheme
/// explicitly instead of implying it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeightType {
    PairProduct,
}

/// Everything an engine gets to see, in one explicit structure.
///
/// Optional arguments that the caller left unset are `None` here, never an
/// empty placeholder: engines are entitled to treat "absent" and
/// "present-but-empty" differently. The second coordinate triple is the one
/// exception; in auto-correlation mode the driver synthesizes length-one
/// placeholder arrays that no engine may read (`autocorr` says so).
pub struct EngineRequest<'a> {
    pub autocorr: bool,
    pub cosmology: Cosmology,
    pub nthreads: usize,
    pub n_mu_bins: usize,
    /// resolved two-column bin file
    pub binfile: &'a Path,
    pub ra1: &'a [f64],
    pub dec1: &'a [f64],
    pub cz1: &'a [f64],
    pub ra2: &'a [f64],
    pub dec2: &'a [f64],
    pub cz2: &'a [f64],
    pub weights1: Option<&'a [f64]>,
    pub weights2: Option<&'a [f64]>,
    pub weight_type: Option<WeightType>,
    /// the radial columns already hold comoving distances
    pub is_comoving_dist: bool,
    pub verbose: bool,
    pub output_savg: bool,
    /// hint: trade division accuracy for speed. Only meaningful to engines
    /// with specialized kernels
    pub fast_divide: bool,
    /// hint: per-axis grid refinement. Only meaningful to engines that build
    /// a spatial grid
    pub bin_refine_factors: [u8; 3],
    /// hint: grid size cap, like `bin_refine_factors`
    pub max_cells_per_dim: u16,
    pub isa: InstructionSet,
}

/// One raw result row per (separation, mu) bin:
/// `(smin, smax, savg, mumax, npairs, weightavg)`.
pub type EngineRow = (f64, f64, f64, f64, u64, f64);

pub struct EngineOutput {
    pub rows: Vec<EngineRow>,
    /// wall-clock time the engine spent counting
    pub elapsed: Duration,
}

/// The two ways an engine call can go wrong. `Unavailable` means the engine
/// can't run at all (wrong build, missing hardware); `Failed` means it ran
/// and produced nothing usable. Engines log their own diagnostics; the
/// caller only learns which of the two happened.
#[derive(Clone, Debug)]
pub enum EngineError {
    Unavailable(String),
    Failed,
}

/// A pair-counting engine.
///
/// Implementations other than [`ReferenceEngine`] exist mostly for tests
/// (recording stubs) but the seam is public: a caller with a specialized
/// counting backend can slot it in through
/// [`crate::count_pairs_s_mu_with_engine`].
pub trait CountEngine {
    fn count(&self, request: &EngineRequest<'_>) -> Result<EngineOutput, EngineError>;
}

/// The bundled engine: direct pair enumeration, thread-chunked.
///
/// It reads the resolved bin file, converts the radial columns per the
/// request's cosmology, splits the outer pair loop into contiguous chunks
/// across `nthreads` OS threads, and merges the per-thread accumulator
/// grids. The grid/SIMD tuning hints in the request are accepted and
/// ignored; the instruction-set hint never changes the arithmetic.
#[derive(Default)]
pub struct ReferenceEngine;

impl ReferenceEngine {
    pub fn new() -> Self {
        Self
    }
}

impl CountEngine for ReferenceEngine {
    fn count(&self, request: &EngineRequest<'_>) -> Result<EngineOutput, EngineError> {
        let start = Instant::now();

        let rows = binfile::read_bins(request.binfile).map_err(|err| {
            error!("{err}");
            EngineError::Failed
        })?;
        let sep_bins = SeparationBins::from_intervals(rows).map_err(|msg| {
            error!("{msg}");
            EngineError::Failed
        })?;
        let mu_bins = MuBins::new(request.n_mu_bins).map_err(|msg| {
            error!("{msg}");
            EngineError::Failed
        })?;

        let dist1 = radial_to_comoving(request, request.cz1);
        let positions1 = sky_to_cartesian(request.ra1, request.dec1, &dist1);
        let points_a = SkyPoints::new(positions1.view(), request.weights1).map_err(|msg| {
            error!("{msg}");
            EngineError::Failed
        })?;

        // only built in cross mode; the placeholder second triple of an
        // auto-correlation is never read
        let positions2;
        let points_b = if request.autocorr {
            None
        } else {
            let dist2 = radial_to_comoving(request, request.cz2);
            positions2 = sky_to_cartesian(request.ra2, request.dec2, &dist2);
            Some(
                SkyPoints::new(positions2.view(), request.weights2).map_err(|msg| {
                    error!("{msg}");
                    EngineError::Failed
                })?,
            )
        };

        if request.verbose {
            info!(
                "counting pairs: {} x {} points, {} separation bins, {} mu \
                 bins, {} thread(s), isa {:?}",
                points_a.n_points(),
                points_b.as_ref().map_or(points_a.n_points(), |p| p.n_points()),
                sep_bins.n_bins(),
                mu_bins.n_bins(),
                request.nthreads,
                request.isa.resolve(),
            );
        }

        let weighted =
            points_a.has_weights() || points_b.as_ref().is_some_and(|p| p.has_weights());

        let accum = run_count(
            &points_a,
            points_b.as_ref(),
            &sep_bins,
            &mu_bins,
            request.output_savg,
            request.nthreads,
        )?;

        let mut out_rows = Vec::with_capacity(sep_bins.n_bins() * mu_bins.n_bins());
        for sep_bin in 0..sep_bins.n_bins() {
            let (s_min, s_max) = sep_bins.interval(sep_bin);
            for mu_bin in 0..mu_bins.n_bins() {
                let state = accum.state(sep_bin, mu_bin);
                let savg = if request.output_savg && state.npairs > 0 {
                    state.s_sum / state.npairs as f64
                } else {
                    0.0
                };
                let weightavg = if weighted && state.npairs > 0 {
                    state.weight_sum / state.npairs as f64
                } else {
                    0.0
                };
                out_rows.push((
                    s_min,
                    s_max,
                    savg,
                    mu_bins.upper_edge(mu_bin),
                    state.npairs,
                    weightavg,
                ));
            }
        }

        let elapsed = start.elapsed();
        if request.verbose {
            info!("pair counting finished in {elapsed:?}");
        }
        Ok(EngineOutput {
            rows: out_rows,
            elapsed,
        })
    }
}

fn radial_to_comoving(request: &EngineRequest<'_>, cz: &[f64]) -> Vec<f64> {
    if request.is_comoving_dist {
        cz.to_vec()
    } else {
        request.cosmology.cz_to_comoving_dist(cz)
    }
}

/// Run the pair loop, chunking the outer index range across `nthreads`.
fn run_count(
    points_a: &SkyPoints<'_>,
    points_b: Option<&SkyPoints<'_>>,
    sep_bins: &SeparationBins,
    mu_bins: &MuBins,
    output_savg: bool,
    nthreads: usize,
) -> Result<BinnedAccum, EngineError> {
    let fail = |msg: &str| {
        error!("{msg}");
        EngineError::Failed
    };

    let n_outer = points_a.n_points();
    let mut total =
        BinnedAccum::new(sep_bins.n_bins(), mu_bins.n_bins()).map_err(|msg| fail(msg))?;

    if nthreads <= 1 {
        count_pairs_range(
            &mut total,
            points_a,
            points_b,
            sep_bins,
            mu_bins,
            output_savg,
            0..n_outer,
        )
        .map_err(|msg| fail(msg))?;
        return Ok(total);
    }

    let chunk = n_outer.div_ceil(nthreads);
    let partials: Vec<Result<BinnedAccum, &'static str>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..nthreads)
            .filter_map(|t| {
                let outer_range = (t * chunk)..((t + 1) * chunk).min(n_outer);
                if outer_range.is_empty() {
                    return None;
                }
                Some(scope.spawn(move || {
                    let mut partial = BinnedAccum::new(sep_bins.n_bins(), mu_bins.n_bins())?;
                    count_pairs_range(
                        &mut partial,
                        points_a,
                        points_b,
                        sep_bins,
                        mu_bins,
                        output_savg,
                        outer_range,
                    )?;
                    Ok(partial)
                }))
            })
            .collect();
        // collect in spawn order so the merge below (and therefore the
        // floating-point sums) don't depend on thread completion order
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(_) => Err("a counting thread panicked"),
            })
            .collect()
    });

    for partial in partials {
        let partial = partial.map_err(|msg| fail(msg))?;
        total.merge(&partial).map_err(|msg| fail(msg))?;
    }
    Ok(total)
}
