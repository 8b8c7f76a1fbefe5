use crate::error::{check_len, check_vm, Result};
use crate::math::{diag, v_norm};
use num_complex::Complex64;
use sparsetools::csr::CSR;

/// Computes partial derivatives of branch currents w.r.t. voltage.
///
/// Returns four matrices containing partial derivatives of the complex
/// branch currents at "from" and "to" ends of each branch w.r.t voltage
/// magnitude and voltage angle respectively (for all buses), followed
/// by the branch currents themselves:
///
/// ```text
/// (dIf/dVa, dIf/dVm, dIt/dVa, dIt/dVm, If, It)
/// ```
#[allow(clippy::type_complexity)]
pub fn d_ibr_d_v(
    y_f: &CSR<usize, Complex64>,
    y_t: &CSR<usize, Complex64>,
    v: &[Complex64],
) -> Result<(
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
    Vec<Complex64>,
    Vec<Complex64>,
)> {
    check_len("V", y_f.cols(), v.len())?;
    check_len("V", y_t.cols(), v.len())?;
    check_len("Yt rows", y_f.rows(), y_t.rows())?;
    check_vm(v)?;

    let diag_v = diag(v);
    let diag_v_norm = diag(&v_norm(v));

    // dIf/dVa = Yf * 1j * diagV
    // dIf/dVm = Yf * diagVnorm
    let d_if_d_va = (y_f * &diag_v) * Complex64::i();
    let d_if_d_vm = y_f * &diag_v_norm;
    let d_it_d_va = (y_t * &diag_v) * Complex64::i();
    let d_it_d_vm = y_t * &diag_v_norm;

    // Compute currents.
    let i_f = y_f * v;
    let i_t = y_t * v;

    Ok((d_if_d_va, d_if_d_vm, d_it_d_va, d_it_d_vm, i_f, i_t))
}
