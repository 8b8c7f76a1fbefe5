use crate::error::{check_len, Result};
use crate::math::diag;
use num_complex::Complex64;
use sparsetools::csr::{CCSR, CSR};

/// Partial derivatives of squared flow magnitudes w.r.t voltage.
///
/// Takes the complex flow derivatives and flows returned by
/// [`d_sbr_d_v`](crate::d_sbr_d_v) (or the current equivalents from
/// [`d_ibr_d_v`](crate::d_ibr_d_v)) and returns
///
/// ```text
/// (dAf/dVa, dAf/dVm, dAt/dVa, dAt/dVm)
/// ```
///
/// where `Af = |Sf|^2` and `At = |St|^2`, using
/// `dA = 2 * (Re(S) * Re(dS) + Im(S) * Im(dS)) = Re(2 * conj(S) * dS)`.
#[allow(clippy::type_complexity)]
pub fn d_abr_d_v(
    d_sf_d_va: &CSR<usize, Complex64>,
    d_sf_d_vm: &CSR<usize, Complex64>,
    d_st_d_va: &CSR<usize, Complex64>,
    d_st_d_vm: &CSR<usize, Complex64>,
    s_f: &[Complex64],
    s_t: &[Complex64],
) -> Result<(
    CSR<usize, f64>,
    CSR<usize, f64>,
    CSR<usize, f64>,
    CSR<usize, f64>,
)> {
    check_len("Sf", d_sf_d_va.rows(), s_f.len())?;
    check_len("Sf", d_sf_d_vm.rows(), s_f.len())?;
    check_len("St", d_st_d_va.rows(), s_t.len())?;
    check_len("St", d_st_d_vm.rows(), s_t.len())?;

    let two_conj = |s: &[Complex64]| -> CSR<usize, Complex64> {
        diag(&s.iter().map(|s| s.conj() * 2.0).collect::<Vec<Complex64>>())
    };
    let d_af = two_conj(s_f);
    let d_at = two_conj(s_t);

    let d_af_d_va = (&d_af * d_sf_d_va).real();
    let d_af_d_vm = (&d_af * d_sf_d_vm).real();
    let d_at_d_va = (&d_at * d_st_d_va).real();
    let d_at_d_vm = (&d_at * d_st_d_vm).real();

    Ok((d_af_d_va, d_af_d_vm, d_at_d_va, d_at_d_vm))
}
