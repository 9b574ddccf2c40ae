//! Per-bin accumulator state for the pair-counting reduction.
//!
//! Every (separation, mu) bin owns a [`PairAccumState`]. The pair loop only
//! ever touches one state per pair; combining results from concurrent loops
//! happens through [`BinnedAccum::merge`].

/// Running totals for a single (separation, mu) bin.
///
/// `s_sum` and `weight_sum` hold whatever the pair loop passes in. When the
/// caller didn't ask for average separations (or supplied no weights) the
/// loop passes zeros and the totals stay zero.
#[derive(Clone, Copy, Default)]
pub struct PairAccumState {
    pub npairs: u64,
    pub s_sum: f64,
    pub weight_sum: f64,
}

impl PairAccumState {
    fn consume(&mut self, s_contrib: f64, weight_contrib: f64) {
        self.npairs += 1;
        self.s_sum += s_contrib;
        self.weight_sum += weight_contrib;
    }

    fn merge(&mut self, other: &PairAccumState) {
        self.npairs += other.npairs;
        self.s_sum += other.s_sum;
        self.weight_sum += other.weight_sum;
    }
}

/// The full grid of accumulator states, laid out separation-major: the state
/// for separation bin `i` and mu bin `j` lives at `i * n_mu + j`.
#[derive(Clone)]
pub struct BinnedAccum {
    n_sep: usize,
    n_mu: usize,
    states: Vec<PairAccumState>,
}

impl BinnedAccum {
    pub fn new(n_sep: usize, n_mu: usize) -> Result<Self, &'static str> {
        if n_sep == 0 || n_mu == 0 {
            return Err("the accumulator grid needs at least one bin per axis");
        }
        Ok(Self {
            n_sep,
            n_mu,
            states: vec![PairAccumState::default(); n_sep * n_mu],
        })
    }

    pub fn consume(&mut self, sep_bin: usize, mu_bin: usize, s_contrib: f64, weight_contrib: f64) {
        self.states[sep_bin * self.n_mu + mu_bin].consume(s_contrib, weight_contrib);
    }

    /// Fold `other`'s totals into `self`. The two grids must have identical
    /// shape; this is how per-thread partial results get combined.
    pub fn merge(&mut self, other: &BinnedAccum) -> Result<(), &'static str> {
        if self.n_sep != other.n_sep || self.n_mu != other.n_mu {
            return Err("cannot merge accumulator grids with different shapes");
        }
        for (state, other_state) in self.states.iter_mut().zip(&other.states) {
            state.merge(other_state);
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.states.fill(PairAccumState::default());
    }

    pub fn n_sep_bins(&self) -> usize {
        self.n_sep
    }

    pub fn n_mu_bins(&self) -> usize {
        self.n_mu
    }

    /// The state for separation bin `i`, mu bin `j`.
    pub fn state(&self, sep_bin: usize, mu_bin: usize) -> &PairAccumState {
        &self.states[sep_bin * self.n_mu + mu_bin]
    }
}
