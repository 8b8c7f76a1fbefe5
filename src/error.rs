use crate::case::BusId;
use derive_builder::UninitializedFieldError;
use num_complex::Complex64;
use thiserror::Error;

/// Errors raised while building network matrices or applying a solution.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("branch {branch} has zero series impedance")]
    ZeroImpedance { branch: usize },

    #[error("unknown bus {0}")]
    UnknownBus(BusId),

    #[error("unknown branch {0}")]
    UnknownBranch(usize),

    #[error("unknown generator {0}")]
    UnknownGen(usize),

    #[error("bus {0} is still referenced by a branch or generator")]
    BusInUse(BusId),

    #[error("bus {0} listed more than once")]
    DuplicateBus(BusId),

    #[error("branch {0} listed more than once")]
    DuplicateBranch(usize),

    #[error("generator {0} listed more than once")]
    DuplicateGen(usize),

    #[error("zero voltage magnitude at bus index {0}")]
    ZeroVoltage(usize),

    #[error("{what}: expected length {expected}, found {actual}")]
    Dimension {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("sparse matrix error: {0}")]
    Sparse(String),

    #[error(transparent)]
    Builder(#[from] UninitializedFieldError),
}

pub type Result<T> = std::result::Result<T, CaseError>;

/// Fails with [`CaseError::Dimension`] unless `actual == expected`.
pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(CaseError::Dimension {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Fails with [`CaseError::ZeroVoltage`] at the first bus with `|V| == 0`.
pub(crate) fn check_vm(v: &[Complex64]) -> Result<()> {
    match v.iter().position(|v| v.norm() == 0.0) {
        Some(i) => Err(CaseError::ZeroVoltage(i)),
        None => Ok(()),
    }
}
