/*!
Pair counting for on-sky mock catalogs, binned in radial separation and in
the cosine of the angle to the line of sight.

Positions come in as parallel arrays of right ascension, declination, and a
radial measure (either `c*z` recession velocities that get converted with
one of the bundled cosmologies, or precomputed comoving distances). The
result is a table with one row per (separation, mu) bin holding the bin
bounds, the pair count, and (when requested) the average separation and
average pair weight.

# Example

```no_run
use skypairs::{BinSpec, CountSMuOptions, count_pairs_s_mu};

let ra = vec![42.0, 205.3, 311.1];
let dec = vec![-10.2, 33.5, 4.8];
let cz = vec![15000.0, 21000.0, 18500.0];

let bins = BinSpec::from_edges(vec![0.1, 1.0, 10.0, 25.0]);
let options = CountSMuOptions::new().output_savg(true);
let counts = count_pairs_s_mu(true, 1, 4, 10, &bins, &ra, &dec, &cz, &options)?;
for bin in &counts.bins {
    println!("{} {} {}", bin.s_min, bin.s_max, bin.n_pairs);
}
# Ok::<(), skypairs::Error>(())
```

# The engine seam

All actual counting happens behind the [`CountEngine`] trait. The bundled
[`ReferenceEngine`] enumerates pairs directly (chunked across threads, no
spatial grid); callers with a specialized backend can pass their own
implementation to [`count_pairs_s_mu_with_engine`]. The request handed to
an engine is fully validated and normalized, and models unset optional
arguments as genuinely absent.
*/

#![deny(rustdoc::broken_intra_doc_links)]

mod binfile;
mod coords;
mod cosmology;
mod countpairs;
mod engine;
mod error;
mod isa;

pub use binfile::{BinSpec, ResolvedBins, read_bins, resolve_bins};
pub use coords::{fix_ra_dec, sky_to_cartesian};
pub use cosmology::{Cosmology, SPEED_OF_LIGHT};
pub use countpairs::{
    CountSMuOptions, SMuBin, SMuPairCounts, Weights, count_pairs_s_mu,
    count_pairs_s_mu_with_engine,
};
pub use engine::{
    CountEngine, EngineError, EngineOutput, EngineRequest, EngineRow, ReferenceEngine, WeightType,
};
pub use error::Error;
pub use isa::InstructionSet;
