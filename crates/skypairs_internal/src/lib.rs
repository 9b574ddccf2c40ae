/*!
Kernel crate for on-sky pair counting.

This crate holds the pieces of the calculation that don't touch the
filesystem or produce user-facing errors: separation/`mu` binning, the
per-bin accumulator state, and the pair-enumeration loops. The public
`skypairs` crate drives everything in here.

Separations are binned without taking square roots: the bin types cache
squared edges and lookups operate on squared values. The only square root
in the hot loop is taken when the caller asks for per-bin average
separations.
*/

mod accum;
mod bins;
mod pairs;

pub use accum::{BinnedAccum, PairAccumState};
pub use bins::{MuBins, SeparationBins};
pub use pairs::{SkyPoints, count_pairs, count_pairs_range};
