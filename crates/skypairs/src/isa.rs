//! Instruction-set selection.
//!
//! Callers name the vectorized execution path they'd like with a short
//! token. The token is translated into [`InstructionSet`] before anything
//! else happens, and [`InstructionSet::resolve`] pins `Fastest` down to a
//! concrete choice using runtime feature detection. The resolved value is
//! forwarded to the engine as a hint; an engine without specialized kernels
//! is free to ignore it.

use crate::error::Error;
use log::debug;

/// The execution paths a caller can ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstructionSet {
    /// pick the best instruction set available on this machine
    Fastest,
    Avx,
    Sse42,
    /// the plain scalar path; always available
    Fallback,
}

impl InstructionSet {
    /// Translate a human-readable token (case-insensitive). An unrecognized
    /// token is a usage error, raised before any engine call happens.
    pub fn from_token(token: &str) -> Result<Self, Error> {
        match token.to_ascii_lowercase().as_str() {
            "fastest" => Ok(Self::Fastest),
            "avx" => Ok(Self::Avx),
            "sse42" => Ok(Self::Sse42),
            "fallback" => Ok(Self::Fallback),
            _ => Err(Error::isa_token(token.to_owned())),
        }
    }

    /// Resolve the selection against what the current machine supports.
    ///
    /// `Fastest` becomes the widest detected set. An explicitly requested
    /// set that isn't supported drops straight to `Fallback` rather than
    /// the next-widest set, so benchmarking a named set never silently
    /// measures a different one.
    pub fn resolve(self) -> Self {
        let resolved = match self {
            Self::Fastest => {
                if avx_available() {
                    Self::Avx
                } else if sse42_available() {
                    Self::Sse42
                } else {
                    Self::Fallback
                }
            }
            Self::Avx if !avx_available() => Self::Fallback,
            Self::Sse42 if !sse42_available() => Self::Fallback,
            other => other,
        };
        if resolved != self {
            debug!("instruction set {self:?} resolved to {resolved:?}");
        }
        resolved
    }
}

fn avx_available() -> bool {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        is_x86_feature_detected!("avx")
    }
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    {
        false
    }
}

fn sse42_available() -> bool {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        is_x86_feature_detected!("sse4.2")
    }
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    {
        false
    }
}
