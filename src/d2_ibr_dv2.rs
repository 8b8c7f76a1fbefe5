use crate::error::{check_len, check_vm, Result};
use crate::math::diag;
use num_complex::Complex64;
use sparsetools::csr::CSR;

/// Computes 2nd derivatives of complex branch current w.r.t. voltage.
///
/// Returns `(Haa, Hav, Hva, Hvv)`, the partial derivatives w.r.t. voltage
/// angle and magnitude of the product of a vector `lam` with the 1st
/// partial derivatives of the complex branch currents `Ybr * V`. `Ybr`
/// is either `Yf` or `Yt`.
#[allow(clippy::type_complexity)]
pub fn d2_ibr_d_v2(
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
    d2_ibr_weighted(y_br, v, &lam)
}

/// Complex-weighted form of [`d2_ibr_d_v2`].
#[allow(clippy::type_complexity)]
pub(crate) fn d2_ibr_weighted(
    y_br: &CSR<usize, Complex64>,
    v: &[Complex64],
    lam: &[Complex64],
) -> Result<(
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
)> {
    let nb = v.len();
    check_len("V", y_br.cols(), nb)?;
    check_len("lam", y_br.rows(), lam.len())?;
    check_vm(v)?;

    let y_lam = &y_br.t().to_csr() * lam;
    let h_aa = diag(
        &y_lam
            .iter()
            .zip(v)
            .map(|(yl, v)| -yl * v)
            .collect::<Vec<Complex64>>(),
    );
    let diag_inv_vm = diag(
        &v.iter()
            .map(|v| Complex64::new(1.0 / v.norm(), 0.0))
            .collect::<Vec<Complex64>>(),
    );
    let h_va = (&h_aa * &diag_inv_vm) * -Complex64::i();
    let h_av = h_va.t().to_csr();
    let h_vv = CSR::with_size(nb, nb);

    Ok((h_aa, h_av, h_va, h_vv))
}
