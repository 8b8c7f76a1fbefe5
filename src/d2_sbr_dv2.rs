use crate::error::{check_len, check_vm, Result};
use crate::math::{conj_vec, diag, mul_vec};
use num_complex::Complex64;
use sparsetools::csr::{CCSR, CSR};

/// Computes 2nd derivatives of complex branch power flow w.r.t. voltage.
///
/// Returns `(Haa, Hav, Hva, Hvv)`, the partial derivatives w.r.t. voltage
/// angle and magnitude of the product of a vector `lam` with the 1st
/// partial derivatives of the complex branch power flows. `Cbr` is the
/// incidence matrix of the branch end (`Cf` or `Ct`) and `Ybr` the
/// matching branch admittance matrix (`Yf` or `Yt`).
#[allow(clippy::type_complexity)]
pub fn d2_sbr_d_v2(
    c_br: &CSR<usize, Complex64>,
    y_br: &CSR<usize, Complex64>,
    v: &[Complex64],
    lam: &[f64],
) -> Result<(
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
)> {
    let lam = lam
        .iter()
        .map(|&l| Complex64::new(l, 0.0))
        .collect::<Vec<Complex64>>();
    d2_sbr_weighted(c_br, y_br, v, &lam)
}

/// Complex-weighted form of [`d2_sbr_d_v2`].
#[allow(clippy::type_complexity)]
pub(crate) fn d2_sbr_weighted(
    c_br: &CSR<usize, Complex64>,
    y_br: &CSR<usize, Complex64>,
    v: &[Complex64],
    lam: &[Complex64],
) -> Result<(
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
)> {
    check_len("V", y_br.cols(), v.len())?;
    check_len("lam", y_br.rows(), lam.len())?;
    check_len("Cbr rows", y_br.rows(), c_br.rows())?;
    check_len("Cbr cols", y_br.cols(), c_br.cols())?;
    check_vm(v)?;

    let diag_lam = diag(lam);
    let diag_v = diag(v);
    let v_conj = conj_vec(v);

    let a = &(&y_br.t().to_csr().conj() * &diag_lam) * c_br;
    let b = &(&diag_v.conj() * &a) * &diag_v;
    let d = mul_vec(&(&a * v), &v_conj);
    let e = mul_vec(&(&a.t().to_csr() * &v_conj), v);
    let f = &b + &b.t().to_csr();
    let g = diag(
        &v.iter()
            .map(|v| Complex64::new(1.0 / v.norm(), 0.0))
            .collect::<Vec<Complex64>>(),
    );

    let h_aa = (&f - diag(&d)) - diag(&e);
    let h_va = (&g * (((&b - b.t().to_csr()) - diag(&d)) + diag(&e))) * Complex64::i();
    let h_av = h_va.t().to_csr();
    let h_vv = &g * (&f * &g);

    Ok((h_aa, h_av, h_va, h_vv))
}
