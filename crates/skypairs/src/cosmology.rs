//! The catalog cosmologies and the conversion from recession velocity to
//! line-of-sight comoving distance.
//!
//! Distances are in Mpc/h (`little h = 1`), matching the conventions of the
//! mock catalogs this crate targets. Callers with a different cosmology are
//! expected to precompute comoving distances themselves and flag the radial
//! column accordingly, which bypasses this module entirely.

use crate::error::Error;
use log::warn;

/// speed of light in km/s
pub const SPEED_OF_LIGHT: f64 = 299_792.458;

/// Hubble distance c/H0 in Mpc/h (H0 = 100 h km/s/Mpc)
const HUBBLE_DISTANCE: f64 = SPEED_OF_LIGHT / 100.0;

/// `cz` arrays whose entries all stay below this are plainly redshifts that
/// were never multiplied by the speed of light
const REDSHIFT_DETECT_MAX: f64 = 10.0;

/// The flat-LCDM cosmologies the bundled mock catalogs were built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cosmology {
    /// Omega_m = 0.25, Omega_Lambda = 0.75
    LasDamas,
    /// Omega_m = 0.302, Omega_Lambda = 0.698
    Planck,
}

impl Cosmology {
    /// Translate the integer cosmology selector. Unknown ids are a usage
    /// error.
    pub fn from_id(id: i32) -> Result<Self, Error> {
        match id {
            1 => Ok(Self::LasDamas),
            2 => Ok(Self::Planck),
            _ => Err(Error::cosmology_id(id)),
        }
    }

    fn omega_m(self) -> f64 {
        match self {
            Self::LasDamas => 0.25,
            Self::Planck => 0.302,
        }
    }

    fn omega_lambda(self) -> f64 {
        match self {
            Self::LasDamas => 0.75,
            Self::Planck => 0.698,
        }
    }

    /// dimensionless Hubble rate E(z)
    fn efunc(self, z: f64) -> f64 {
        let one_plus_z = 1.0 + z;
        (self.omega_m() * one_plus_z * one_plus_z * one_plus_z + self.omega_lambda()).sqrt()
    }

    /// Line-of-sight comoving distance to redshift `z`, in Mpc/h.
    ///
    /// Fixed-step Simpson integration of 1/E(z); 128 panels keeps the
    /// truncation error far below the single-precision noise floor of any
    /// realistic catalog.
    pub fn comoving_distance(self, z: f64) -> f64 {
        const N_PANELS: usize = 128;
        let h = z / N_PANELS as f64;
        let integrand = |z: f64| 1.0 / self.efunc(z);

        let mut sum = integrand(0.0) + integrand(z);
        for i in 1..N_PANELS {
            let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += weight * integrand(i as f64 * h);
        }
        HUBBLE_DISTANCE * sum * h / 3.0
    }

    /// Convert an array of `c*z` values (km/s) to comoving distances.
    ///
    /// When every entry is small enough to plainly be a bare redshift, the
    /// whole array is first scaled by the speed of light.
    pub fn cz_to_comoving_dist(self, cz: &[f64]) -> Vec<f64> {
        let looks_like_redshifts = cz.iter().all(|&v| v.abs() < REDSHIFT_DETECT_MAX);
        if looks_like_redshifts {
            warn!(
                "all radial values are below {REDSHIFT_DETECT_MAX}; treating \
                 them as redshifts rather than c*z"
            );
        }
        cz.iter()
            .map(|&v| {
                let z = if looks_like_redshifts {
                    v
                } else {
                    v / SPEED_OF_LIGHT
                };
                self.comoving_distance(z)
            })
            .collect()
    }
}
