use crate::error::{check_len, check_vm, Result};
use crate::math::{conj_vec, diag, mul_vec};
use num_complex::Complex64;
use sparsetools::csr::{CCSR, CSR};

/// Computes 2nd derivatives of power injection w.r.t. voltage.
///
/// Returns 4 matrices containing the partial derivatives w.r.t. voltage
/// angle and magnitude of the product of a vector `lam` with the 1st
/// partial derivatives of the complex bus power injections:
///
/// ```text
/// Gaa = d/dVa (dSbus/dVa.' * lam)
/// Gav = d/dVm (dSbus/dVa.' * lam)
/// Gva = d/dVa (dSbus/dVm.' * lam)
/// Gvv = d/dVm (dSbus/dVm.' * lam)
/// ```
///
/// returned as `(Gaa, Gav, Gva, Gvv)`.
#[allow(clippy::type_complexity)]
pub fn d2_sbus_d_v2(
    y_bus: &CSR<usize, Complex64>,
    v: &[Complex64],
    lam: &[f64],
) -> Result<(
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
)> {
    let n = v.len();
    check_len("V", y_bus.cols(), n)?;
    check_len("lam", y_bus.rows(), lam.len())?;
    check_vm(v)?;

    let lam = lam
        .iter()
        .map(|&l| Complex64::new(l, 0.0))
        .collect::<Vec<Complex64>>();

    let i_bus = y_bus * v;
    let diag_lam = diag(&lam);
    let diag_v = diag(v);

    let a = diag(&mul_vec(&lam, v));
    let b = y_bus * &diag_v;
    let c = &a * &b.conj();
    let d = &y_bus.t().to_csr().conj() * &diag_v;
    let e = &diag_v.conj() * ((&d * &diag_lam) - diag(&(&d * &lam)));
    let f = &c - &a * &diag(&conj_vec(&i_bus));
    let g = diag(
        &v.iter()
            .map(|v| Complex64::new(1.0 / v.norm(), 0.0))
            .collect::<Vec<Complex64>>(),
    );

    let g_aa = &e + &f;
    let g_va = (&g * (&e - f)) * Complex64::i();
    let g_av = g_va.t().to_csr();
    let g_vv = &g * (&(&c + &c.t().to_csr()) * &g);

    Ok((g_aa, g_av, g_va, g_vv))
}
