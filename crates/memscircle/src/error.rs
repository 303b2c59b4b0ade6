//! Error type shared by every pipeline stage.

/// Reasons a pipeline stage can refuse to produce a result.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Too few points to estimate a circle.
    InsufficientData {
        /// Required minimum number of points.
        needed: usize,
        /// Provided number of points.
        got: usize,
    },
    /// Points are (near-)collinear or coincident; the fitting system is
    /// ill-conditioned.
    DegenerateFit {
        /// Reciprocal condition number of the normal matrix.
        rcond: f64,
    },
    /// A configuration parameter violates its invariant.
    InvalidConfiguration {
        /// Settings key of the offending field.
        field: &'static str,
        /// Human-readable description of the violated constraint.
        reason: String,
    },
    /// Two images handed between stages disagree on their dimensions.
    DimensionMismatch {
        /// Expected [width, height].
        expected: [u32; 2],
        /// Observed [width, height].
        actual: [u32; 2],
    },
    /// The input image has zero width or height.
    EmptyImage,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientData { needed, got } => {
                write!(f, "insufficient data: need {} points, got {}", needed, got)
            }
            Self::DegenerateFit { rcond } => {
                write!(f, "degenerate fit: points are collinear (rcond {:.3e})", rcond)
            }
            Self::InvalidConfiguration { field, reason } => {
                write!(f, "invalid configuration: {}: {}", field, reason)
            }
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "dimension mismatch: expected {}x{}, got {}x{}",
                expected[0], expected[1], actual[0], actual[1]
            ),
            Self::EmptyImage => write!(f, "image has zero width or height"),
        }
    }
}

impl std::error::Error for Error {}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failure() {
        let e = Error::InsufficientData { needed: 3, got: 2 };
        assert_eq!(e.to_string(), "insufficient data: need 3 points, got 2");

        let e = Error::DimensionMismatch {
            expected: [10, 20],
            actual: [10, 21],
        };
        assert_eq!(e.to_string(), "dimension mismatch: expected 10x20, got 10x21");

        let e = Error::InvalidConfiguration {
            field: "PTileValue",
            reason: "must lie in [0, 1]".to_string(),
        };
        assert!(e.to_string().contains("PTileValue"));
    }
}
