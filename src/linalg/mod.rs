pub(crate) mod cholesky;
pub(crate) mod givens;
pub(crate) mod qr;
pub(crate) mod self_adjoint_eigen;
pub(crate) mod tridiagonal;

pub use cholesky::{back_substitute_lt, cholesky_in_place, forward_substitute, Cholesky};
pub use givens::Givens;
pub use qr::{qr_in_place, Qr};
pub use self_adjoint_eigen::SelfAdjointEigenSolver;
pub use tridiagonal::{tridiagonal_qr_step, tridiagonalize_in_place};

/// Broad category of a [`LinalgError`].
///
/// Lets callers separate mistakes in how an algorithm was called from
/// failures that the numbers themselves produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input violated a documented precondition. Nothing was modified.
    PreconditionViolation,
    /// The factorization hit a zero pivot or a non-positive diagonal.
    NumericDegeneracy,
    /// An iterative algorithm exhausted its iteration budget.
    ConvergenceFailure,
}

/// Errors from linear algebra operations.
///
/// ```
/// use linkern::Matrix;
/// use linkern::linalg::{Cholesky, ErrorKind, LinalgError};
///
/// let not_pd = Matrix::from_rows(2, 2, &[1.0_f64, 5.0, 5.0, 1.0]);
/// let err = Cholesky::new(&not_pd).unwrap_err();
/// assert_eq!(err, LinalgError::NotPositiveDefinite);
/// assert_eq!(err.kind(), ErrorKind::NumericDegeneracy);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LinalgError {
    /// A square matrix was required.
    #[error("expected a square matrix, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
    /// Operand sizes do not agree.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    /// An argument is outside its valid domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// Eigenvectors were requested from a solver that did not compute them.
    #[error("eigenvectors were not computed")]
    EigenvectorsNotComputed,
    /// `solve` was called without a successful factorization.
    #[error("matrix has not been successfully factored")]
    NotFactored,
    /// Matrix is singular (a pivot is exactly zero).
    #[error("matrix is singular")]
    Singular,
    /// Matrix is not positive definite (required for Cholesky).
    #[error("matrix is not positive definite")]
    NotPositiveDefinite,
    /// Iterative algorithm did not converge within the iteration budget.
    #[error("iterative algorithm did not converge")]
    ConvergenceFailure,
}

impl LinalgError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LinalgError::NotSquare { .. }
            | LinalgError::DimensionMismatch { .. }
            | LinalgError::InvalidArgument(_)
            | LinalgError::EigenvectorsNotComputed
            | LinalgError::NotFactored => ErrorKind::PreconditionViolation,
            LinalgError::Singular | LinalgError::NotPositiveDefinite => {
                ErrorKind::NumericDegeneracy
            }
            LinalgError::ConvergenceFailure => ErrorKind::ConvergenceFailure,
        }
    }
}

/// `Err(NotSquare)` unless `rows == cols`.
#[inline]
pub(crate) fn ensure_square(rows: usize, cols: usize) -> Result<(), LinalgError> {
    if rows == cols {
        Ok(())
    } else {
        Err(LinalgError::NotSquare { rows, cols })
    }
}

/// `Err(DimensionMismatch)` unless `got == expected`.
#[inline]
pub(crate) fn ensure_len(expected: usize, got: usize) -> Result<(), LinalgError> {
    if expected == got {
        Ok(())
    } else {
        Err(LinalgError::DimensionMismatch { expected, got })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            LinalgError::NotSquare { rows: 2, cols: 3 }.kind(),
            ErrorKind::PreconditionViolation
        );
        assert_eq!(LinalgError::NotFactored.kind(), ErrorKind::PreconditionViolation);
        assert_eq!(LinalgError::Singular.kind(), ErrorKind::NumericDegeneracy);
        assert_eq!(LinalgError::ConvergenceFailure.kind(), ErrorKind::ConvergenceFailure);
    }

    #[test]
    fn guards() {
        assert!(ensure_square(3, 3).is_ok());
        assert_eq!(ensure_square(2, 3), Err(LinalgError::NotSquare { rows: 2, cols: 3 }));
        assert_eq!(
            ensure_len(4, 2),
            Err(LinalgError::DimensionMismatch { expected: 4, got: 2 })
        );
    }

    #[cfg(feature = "std")]
    #[test]
    fn display() {
        assert_eq!(
            LinalgError::NotSquare { rows: 2, cols: 3 }.to_string(),
            "expected a square matrix, got 2x3"
        );
        assert_eq!(LinalgError::Singular.to_string(), "matrix is singular");
    }
}
