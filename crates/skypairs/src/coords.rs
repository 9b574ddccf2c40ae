//! Sky-coordinate convention repair and conversion to Cartesian positions.

use log::warn;
use ndarray::Array2;

/// Repair coordinate-convention mismatches in place.
///
/// RA is canonically in `[0, 360)` and DEC in `[-90, 90]`. Arrays that were
/// produced with the `[-180, 180)` RA convention (betrayed by any negative
/// entry) have their negative values wrapped up by 360; arrays using the
/// `[0, 180]` DEC convention (betrayed by any entry above 90) are shifted
/// down by 90 wholesale. Each repair logs a warning, since silently fixed
/// inputs usually mean the caller's catalog reader needs attention.
pub fn fix_ra_dec(ra: &mut [f64], dec: &mut [f64]) {
    if ra.iter().any(|&v| v < 0.0) {
        warn!("found negative RA values; wrapping into the [0, 360) range");
        for v in ra.iter_mut() {
            if *v < 0.0 {
                *v += 360.0;
            }
        }
    }
    if dec.iter().any(|&v| v > 90.0) {
        warn!("found DEC values above 90; shifting into the [-90, 90] range");
        for v in dec.iter_mut() {
            *v -= 90.0;
        }
    }
}

/// Convert sky coordinates (degrees) plus radial comoving distance into a
/// `(3, n)` Cartesian position array.
pub fn sky_to_cartesian(ra: &[f64], dec: &[f64], dist: &[f64]) -> Array2<f64> {
    let n = ra.len();
    let mut positions = Array2::<f64>::zeros((3, n));
    for i in 0..n {
        let ra_rad = ra[i].to_radians();
        let dec_rad = dec[i].to_radians();
        let cos_dec = dec_rad.cos();
        positions[[0, i]] = dist[i] * cos_dec * ra_rad.cos();
        positions[[1, i]] = dist[i] * cos_dec * ra_rad.sin();
        positions[[2, i]] = dist[i] * dec_rad.sin();
    }
    positions
}
