//! The crate's public error type.
//!
//! The split mirrors the failure taxonomy at the engine boundary: usage
//! errors (bad caller-supplied arguments) are always raised before any
//! engine invocation, configuration errors mean the requested engine can't
//! run at all, and runtime failures are the engine reporting that it
//! produced no usable result.

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The underlying internal error type
#[non_exhaustive]
#[derive(Clone, Debug)]
enum ErrorKind {
    /// the requested counting engine is not available in this build or on
    /// this machine
    EngineUnavailable(EngineUnavailableError),
    /// a cross-correlation was requested without a complete second
    /// coordinate triple
    MissingCrossArg(MissingCrossArgError),
    /// an unrecognized instruction-set token was supplied
    IsaToken(IsaTokenError),
    /// a problem with the bin specification (bad file contents, malformed
    /// edge sequence, unresolvable path)
    BinSpec(BinSpecError),
    /// the arrays of a coordinate triple (or a weight array) don't line up
    ArrayShape(ArrayShapeError),
    /// an unknown cosmology id was supplied
    CosmologyId(CosmologyIdError),
    /// an integer argument lies outside of the acceptable range of values
    IntegerRange(IntegerRangeError),
    /// the engine completed without producing a usable result
    RuntimeFailure(RuntimeFailureError),
}

// define constructor methods for Error
impl Error {
    /// produce an error indicating that the requested engine can't run
    pub(crate) fn engine_unavailable(detail: String) -> Self {
        Error {
            kind: ErrorKind::EngineUnavailable(EngineUnavailableError { detail }),
        }
    }

    /// produce an error indicating that a cross-correlation is missing one
    /// of the second triple's arrays
    pub(crate) fn missing_cross_arg(name: &'static str) -> Self {
        Error {
            kind: ErrorKind::MissingCrossArg(MissingCrossArgError { name }),
        }
    }

    /// produce an error indicating that an instruction-set token wasn't
    /// recognized
    pub(crate) fn isa_token(token: String) -> Self {
        Error {
            kind: ErrorKind::IsaToken(IsaTokenError { token }),
        }
    }

    /// produce an error indicating a problem with the bin specification
    pub(crate) fn bin_spec(what: String) -> Self {
        Error {
            kind: ErrorKind::BinSpec(BinSpecError { what }),
        }
    }

    /// produce an error indicating mismatched array lengths
    pub(crate) fn array_shape(who: &'static str, what: String) -> Self {
        Error {
            kind: ErrorKind::ArrayShape(ArrayShapeError { who, what }),
        }
    }

    /// produce an error indicating an unknown cosmology id
    pub(crate) fn cosmology_id(id: i32) -> Self {
        Error {
            kind: ErrorKind::CosmologyId(CosmologyIdError { id }),
        }
    }

    /// produce an error indicating that an integer lies outside the
    /// acceptable range of values
    pub(crate) fn integer_range(
        description: &'static str,
        actual: i64,
        min_val: i64,
        max_val: i64,
    ) -> Self {
        Error {
            kind: ErrorKind::IntegerRange(IntegerRangeError {
                description,
                actual,
                min_val,
                max_val,
            }),
        }
    }

    /// produce an error indicating that the engine didn't produce a result
    pub(crate) fn runtime_failure() -> Self {
        Error {
            kind: ErrorKind::RuntimeFailure(RuntimeFailureError),
        }
    }

    /// `true` when the error is the engine reporting that it ran but
    /// produced no usable result
    pub fn is_runtime_failure(&self) -> bool {
        matches!(self.kind, ErrorKind::RuntimeFailure(_))
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.kind.fmt(f)
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            ErrorKind::EngineUnavailable(ref err) => err.fmt(f),
            ErrorKind::MissingCrossArg(ref err) => err.fmt(f),
            ErrorKind::IsaToken(ref err) => err.fmt(f),
            ErrorKind::BinSpec(ref err) => err.fmt(f),
            ErrorKind::ArrayShape(ref err) => err.fmt(f),
            ErrorKind::CosmologyId(ref err) => err.fmt(f),
            ErrorKind::IntegerRange(ref err) => err.fmt(f),
            ErrorKind::RuntimeFailure(ref err) => err.fmt(f),
        }
    }
}

/// the requested counting engine can't run
#[derive(Clone, Debug)]
struct EngineUnavailableError {
    detail: String,
}

impl core::fmt::Display for EngineUnavailableError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "the pair-counting engine is unavailable: {}", self.detail)
    }
}

/// a cross-correlation is missing part of the second coordinate triple
#[derive(Clone, Debug)]
struct MissingCrossArgError {
    name: &'static str,
}

impl core::fmt::Display for MissingCrossArgError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "computing a cross-correlation requires {}; pass all of \
             ra2/dec2/cz2",
            self.name
        )
    }
}

/// an unrecognized instruction-set token
#[derive(Clone, Debug)]
struct IsaTokenError {
    token: String,
}

impl core::fmt::Display for IsaTokenError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "\"{}\" is not an instruction-set token. Choices include: \
             \"fastest\", \"avx\", \"sse42\", \"fallback\"",
            self.token
        )
    }
}

/// a problem with the bin specification
#[derive(Clone, Debug)]
struct BinSpecError {
    what: String,
}

impl core::fmt::Display for BinSpecError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "problem with the bin specification: {}", self.what)
    }
}

/// mismatched array lengths in a triple or weight array
#[derive(Clone, Debug)]
struct ArrayShapeError {
    who: &'static str,
    what: String,
}

impl core::fmt::Display for ArrayShapeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "problem with {}: {}", self.who, self.what)
    }
}

/// an unknown cosmology id
#[derive(Clone, Debug)]
struct CosmologyIdError {
    id: i32,
}

impl core::fmt::Display for CosmologyIdError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} is not a cosmology id. Choices are 1 (LasDamas) and 2 (Planck)",
            self.id
        )
    }
}

/// An error that occurs when an integer lies outside of the acceptable
/// range of values
#[derive(Clone, Debug)]
struct IntegerRangeError {
    description: &'static str,
    actual: i64,
    min_val: i64,
    max_val: i64,
}

impl core::fmt::Display for IntegerRangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} has a value of {}. The value should be no less than {} and \
             not exceed {}",
            self.description, self.actual, self.min_val, self.max_val
        )
    }
}

/// the engine reported that it produced no usable result
#[derive(Clone, Debug)]
struct RuntimeFailureError;

impl core::fmt::Display for RuntimeFailureError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "the pair-counting engine did not produce a result")
    }
}
