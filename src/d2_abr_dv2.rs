use crate::d2_ibr_dv2::d2_ibr_weighted;
use crate::d2_sbr_dv2::d2_sbr_weighted;
use crate::error::{check_len, Result};
use crate::math::diag;
use num_complex::Complex64;
use sparsetools::csr::{CCSR, CSR};

/// `2 * real(m)`
fn two_re(m: CSR<usize, Complex64>) -> CSR<usize, f64> {
    (m * Complex64::new(2.0, 0.0)).real()
}

/// Second-order terms shared by the squared flow Hessians.
///
/// Given the complex-weighted second derivatives of the flow and its
/// first derivatives, returns
///
/// ```text
/// Haa = 2 * real(Xaa + dX/dVa.' * diaglam * conj(dX/dVa))
/// Hva = 2 * real(Xva + dX/dVm.' * diaglam * conj(dX/dVa))
/// Hvv = 2 * real(Xvv + dX/dVm.' * diaglam * conj(dX/dVm))
/// ```
///
/// with `Hav = Hva.'`.
#[allow(clippy::type_complexity)]
fn squared_terms(
    x_aa: CSR<usize, Complex64>,
    x_va: CSR<usize, Complex64>,
    x_vv: CSR<usize, Complex64>,
    d_va: &CSR<usize, Complex64>,
    d_vm: &CSR<usize, Complex64>,
    lam: &[f64],
) -> (
    CSR<usize, f64>,
    CSR<usize, f64>,
    CSR<usize, f64>,
    CSR<usize, f64>,
) {
    let diag_lam = diag(
        &lam.iter()
            .map(|&l| Complex64::new(l, 0.0))
            .collect::<Vec<Complex64>>(),
    );
    let d_va_t_lam = &d_va.t().to_csr() * &diag_lam;
    let d_vm_t_lam = &d_vm.t().to_csr() * &diag_lam;

    let h_aa = two_re(x_aa + &d_va_t_lam * &d_va.conj());
    let h_va = two_re(x_va + &d_vm_t_lam * &d_va.conj());
    let h_vv = two_re(x_vv + &d_vm_t_lam * &d_vm.conj());
    let h_av = h_va.t().to_csr();

    (h_aa, h_av, h_va, h_vv)
}

/// Computes 2nd derivatives of |complex power flow|^2 w.r.t. voltage.
///
/// Returns `(Haa, Hav, Hva, Hvv)`, the partial derivatives w.r.t. voltage
/// angle and magnitude of the product of a vector `lam` with the 1st
/// partial derivatives of the square of the magnitude of the branch
/// complex power flows. Takes the sparse first derivative matrices and
/// flows from [`d_sbr_d_v`](crate::d_sbr_d_v) for one branch end, with
/// the matching incidence and branch admittance matrices.
#[allow(clippy::type_complexity, clippy::too_many_arguments)]
pub fn d2_asbr_d_v2(
    d_sbr_d_va: &CSR<usize, Complex64>,
    d_sbr_d_vm: &CSR<usize, Complex64>,
    s_br: &[Complex64],
    c_br: &CSR<usize, Complex64>,
    y_br: &CSR<usize, Complex64>,
    v: &[Complex64],
    lam: &[f64],
) -> Result<(
    CSR<usize, f64>,
    CSR<usize, f64>,
    CSR<usize, f64>,
    CSR<usize, f64>,
)> {
    check_len("Sbr", y_br.rows(), s_br.len())?;
    check_len("lam", y_br.rows(), lam.len())?;
    check_len("dSbr/dVa rows", y_br.rows(), d_sbr_d_va.rows())?;
    check_len("dSbr/dVm rows", y_br.rows(), d_sbr_d_vm.rows())?;

    let lam_s = s_br
        .iter()
        .zip(lam)
        .map(|(s, &l)| s.conj() * l)
        .collect::<Vec<Complex64>>();
    let (s_aa, _, s_va, s_vv) = d2_sbr_weighted(c_br, y_br, v, &lam_s)?;

    Ok(squared_terms(s_aa, s_va, s_vv, d_sbr_d_va, d_sbr_d_vm, lam))
}

/// Computes 2nd derivatives of |complex current|^2 w.r.t. voltage.
///
/// Returns `(Haa, Hav, Hva, Hvv)`, the partial derivatives w.r.t. voltage
/// angle and magnitude of the product of a vector `lam` with the 1st
/// partial derivatives of the square of the magnitude of the branch
/// currents. Takes the sparse first derivative matrices and currents
/// from [`d_ibr_d_v`](crate::d_ibr_d_v) for one branch end.
#[allow(clippy::type_complexity)]
pub fn d2_aibr_d_v2(
    d_ibr_d_va: &CSR<usize, Complex64>,
    d_ibr_d_vm: &CSR<usize, Complex64>,
    i_br: &[Complex64],
    y_br: &CSR<usize, Complex64>,
    v: &[Complex64],
    lam: &[f64],
) -> Result<(
    CSR<usize, f64>,
    CSR<usize, f64>,
    CSR<usize, f64>,
    CSR<usize, f64>,
)> {
    check_len("Ibr", y_br.rows(), i_br.len())?;
    check_len("lam", y_br.rows(), lam.len())?;
    check_len("dIbr/dVa rows", y_br.rows(), d_ibr_d_va.rows())?;
    check_len("dIbr/dVm rows", y_br.rows(), d_ibr_d_vm.rows())?;

    let lam_i = i_br
        .iter()
        .zip(lam)
        .map(|(i, &l)| i.conj() * l)
        .collect::<Vec<Complex64>>();
    let (i_aa, _, i_va, i_vv) = d2_ibr_weighted(y_br, v, &lam_i)?;

    Ok(squared_terms(i_aa, i_va, i_vv, d_ibr_d_va, d_ibr_d_vm, lam))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::case6ww;
    use crate::d_abr_dv::d_abr_d_v;
    use crate::d_ibr_dv::d_ibr_d_v;
    use crate::d_sbr_dv::d_sbr_d_v;
    use crate::math::dense::{sample_v6, to_dense_f64, transpose};
    use crate::order::Order;
    use crate::ybus::{make_cf_ct, make_ybus};
    use anyhow::Result;
    use approx::assert_abs_diff_eq;

    /// Checks `(aa, av)` and `(va, vv)` against central differences of the
    /// weighted first derivatives returned by `first`.
    fn check_real(
        first: impl Fn(&[Complex64]) -> (CSR<usize, f64>, CSR<usize, f64>),
        v: &[Complex64],
        lam: &[f64],
        hess: [&CSR<usize, f64>; 4],
    ) {
        let weighted = |v: &[Complex64]| {
            let (d_va, d_vm) = first(v);
            (&d_va.t().to_csr() * lam, &d_vm.t().to_csr() * lam)
        };
        let [h_aa, h_av, h_va, h_vv] = hess.map(to_dense_f64);
        let h = 1e-6;
        for k in 0..v.len() {
            let (vm, va) = (v[k].norm(), v[k].arg());
            let at = |vk: Complex64| {
                let mut vp = v.to_vec();
                vp[k] = vk;
                weighted(&vp)
            };
            let (a_up, m_up) = at(Complex64::from_polar(vm, va + h));
            let (a_dn, m_dn) = at(Complex64::from_polar(vm, va - h));
            for i in 0..v.len() {
                assert_abs_diff_eq!((a_up[i] - a_dn[i]) / (2.0 * h), h_aa[i][k], epsilon = 1e-5);
                assert_abs_diff_eq!((m_up[i] - m_dn[i]) / (2.0 * h), h_va[i][k], epsilon = 1e-5);
            }
            let (a_up, m_up) = at(Complex64::from_polar(vm + h, va));
            let (a_dn, m_dn) = at(Complex64::from_polar(vm - h, va));
            for i in 0..v.len() {
                assert_abs_diff_eq!((a_up[i] - a_dn[i]) / (2.0 * h), h_av[i][k], epsilon = 1e-5);
                assert_abs_diff_eq!((m_up[i] - m_dn[i]) / (2.0 * h), h_vv[i][k], epsilon = 1e-5);
            }
        }
        for (ra, rb) in h_av.iter().zip(transpose(&h_va)) {
            for (a, b) in ra.iter().zip(rb) {
                assert_abs_diff_eq!(*a, b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_d2_asbr() -> Result<()> {
        let case = case6ww()?;
        let order = Order::new(&case)?;
        let (_, y_f, y_t) = make_ybus(&case, &order)?;
        let (c_f, _) = make_cf_ct(&order);
        let (f, t) = (&order.branch.f, &order.branch.t);
        let v = sample_v6();
        let lam = (0..11).map(|l| 0.2 * l as f64 - 1.0).collect::<Vec<f64>>();

        let (d_sf_d_va, d_sf_d_vm, _, _, s_f, _) = d_sbr_d_v(f, t, &y_f, &y_t, &v)?;
        let (h_aa, h_av, h_va, h_vv) =
            d2_asbr_d_v2(&d_sf_d_va, &d_sf_d_vm, &s_f, &c_f, &y_f, &v, &lam)?;

        let first = |v: &[Complex64]| {
            let (d_sf_d_va, d_sf_d_vm, d_st_d_va, d_st_d_vm, s_f, s_t) =
                d_sbr_d_v(f, t, &y_f, &y_t, v).unwrap();
            let (d_af_d_va, d_af_d_vm, _, _) =
                d_abr_d_v(&d_sf_d_va, &d_sf_d_vm, &d_st_d_va, &d_st_d_vm, &s_f, &s_t).unwrap();
            (d_af_d_va, d_af_d_vm)
        };
        check_real(first, &v, &lam, [&h_aa, &h_av, &h_va, &h_vv]);
        Ok(())
    }

    #[test]
    fn test_d2_aibr() -> Result<()> {
        let case = case6ww()?;
        let order = Order::new(&case)?;
        let (_, y_f, y_t) = make_ybus(&case, &order)?;
        let v = sample_v6();
        let lam = (0..11).map(|l| 1.0 - 0.15 * l as f64).collect::<Vec<f64>>();

        let (_, _, d_it_d_va, d_it_d_vm, _, i_t) = d_ibr_d_v(&y_f, &y_t, &v)?;
        let (h_aa, h_av, h_va, h_vv) =
            d2_aibr_d_v2(&d_it_d_va, &d_it_d_vm, &i_t, &y_t, &v, &lam)?;

        let first = |v: &[Complex64]| {
            let (d_if_d_va, d_if_d_vm, d_it_d_va, d_it_d_vm, i_f, i_t) =
                d_ibr_d_v(&y_f, &y_t, v).unwrap();
            let (_, _, d_at_d_va, d_at_d_vm) =
                d_abr_d_v(&d_if_d_va, &d_if_d_vm, &d_it_d_va, &d_it_d_vm, &i_f, &i_t).unwrap();
            (d_at_d_va, d_at_d_vm)
        };
        check_real(first, &v, &lam, [&h_aa, &h_av, &h_va, &h_vv]);
        Ok(())
    }
}
