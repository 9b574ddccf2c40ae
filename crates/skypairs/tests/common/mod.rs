// the reason this is named mod.rs has to do with some complexities of how
// testing is handled
//
// we are following the advice of the rust book
// https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

use rand::distr::{Distribution, Uniform};
use rand_xoshiro::Xoshiro256PlusPlus;
use rand_xoshiro::rand_core::SeedableRng;

// based on numpy!
// https://numpy.org/doc/stable/reference/generated/numpy.isclose.html
pub fn isclose(actual: f64, ref_val: f64, rtol: f64, atol: f64) -> bool {
    let actual_nan = actual.is_nan();
    let ref_nan = ref_val.is_nan();
    if actual_nan || ref_nan {
        actual_nan && ref_nan
    } else {
        (actual - ref_val).abs() <= (atol + rtol * ref_val.abs())
    }
}

/// a reproducible scatter of points over a patch of sky, with radial values
/// that are already comoving distances
pub fn random_catalog(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let ra_dist = Uniform::try_from(0.0..360.0).unwrap();
    let dec_dist = Uniform::try_from(-60.0..60.0).unwrap();
    let r_dist = Uniform::try_from(90.0..110.0).unwrap();

    let ra = (0..n).map(|_| ra_dist.sample(&mut rng)).collect();
    let dec = (0..n).map(|_| dec_dist.sample(&mut rng)).collect();
    let dist = (0..n).map(|_| r_dist.sample(&mut rng)).collect();
    (ra, dec, dist)
}
