use crate::error::{check_len, check_vm, Result};
use crate::math::{conj_vec, diag, mul_vec, v_norm};
use num_complex::Complex64;
use sparsetools::coo::Coo;
use sparsetools::csr::{CCSR, CSR};

/// Sparse `nl x nb` matrix with `values[l]` at `(l, bus[l])`.
pub(crate) fn branch_bus(bus: &[usize], values: &[Complex64], nb: usize) -> CSR<usize, Complex64> {
    let mut m = Coo::with_capacity(bus.len(), nb, bus.len());
    for (l, (&i, &v)) in bus.iter().zip(values).enumerate() {
        m.push(l, i, v);
    }
    m.to_csr()
}

/// Computes partial derivatives of branch power flows w.r.t. voltage.
///
/// `f` and `t` are the dense "from" and "to" bus indices of each branch.
/// Returns the derivatives of the complex power flows at the "from" and
/// "to" ends of each branch w.r.t. voltage angle and magnitude, followed
/// by the flows themselves:
///
/// ```text
/// (dSf/dVa, dSf/dVm, dSt/dVa, dSt/dVm, Sf, St)
/// ```
#[allow(clippy::type_complexity)]
pub fn d_sbr_d_v(
    f: &[usize],
    t: &[usize],
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
    let (nl, nb) = (y_f.rows(), v.len());
    check_len("V", y_f.cols(), nb)?;
    check_len("V", y_t.cols(), nb)?;
    check_len("Yt rows", nl, y_t.rows())?;
    check_len("from bus indexes", nl, f.len())?;
    check_len("to bus indexes", nl, t.len())?;
    check_vm(v)?;

    // Compute currents.
    let i_f = y_f * v;
    let i_t = y_t * v;

    let v_f = f.iter().map(|&i| v[i]).collect::<Vec<Complex64>>();
    let v_t = t.iter().map(|&i| v[i]).collect::<Vec<Complex64>>();
    let vn = v_norm(v);
    let vn_f = f.iter().map(|&i| vn[i]).collect::<Vec<Complex64>>();
    let vn_t = t.iter().map(|&i| vn[i]).collect::<Vec<Complex64>>();

    let diag_v = diag(v);
    let diag_v_norm = diag(&vn);
    let diag_vf = diag(&v_f);
    let diag_vt = diag(&v_t);
    let diag_if = diag(&i_f);
    let diag_it = diag(&i_t);

    // dSf/dVa = 1j * (conj(diagIf) * sparse(1:nl, f, V(f)) - diagVf * conj(Yf * diagV))
    // dSf/dVm = diagVf * conj(Yf * diagVnorm) + conj(diagIf) * sparse(1:nl, f, Vnorm(f))
    let mut d_sf_d_va = (diag_if.conj() * &branch_bus(f, &v_f, nb)
        - &diag_vf * (y_f * &diag_v).conj())
        * Complex64::i();
    let mut d_sf_d_vm =
        &diag_vf * (y_f * &diag_v_norm).conj() + diag_if.conj() * &branch_bus(f, &vn_f, nb);

    let mut d_st_d_va = (diag_it.conj() * &branch_bus(t, &v_t, nb)
        - &diag_vt * (y_t * &diag_v).conj())
        * Complex64::i();
    let mut d_st_d_vm =
        &diag_vt * (y_t * &diag_v_norm).conj() + diag_it.conj() * &branch_bus(t, &vn_t, nb);

    d_sf_d_va.sort_indexes();
    d_st_d_va.sort_indexes();
    d_sf_d_vm.sort_indexes();
    d_st_d_vm.sort_indexes();

    // Compute power flow vectors.
    let s_f = mul_vec(&v_f, &conj_vec(&i_f));
    let s_t = mul_vec(&v_t, &conj_vec(&i_t));

    Ok((d_sf_d_va, d_sf_d_vm, d_st_d_va, d_st_d_vm, s_f, s_t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::case6ww;
    use crate::error::CaseError;
    use crate::math::dense::{check_polar, sample_v6};
    use crate::order::Order;
    use crate::ybus::make_ybus;
    use anyhow::Result;

    #[test]
    fn test_finite_difference() -> Result<()> {
        let case = case6ww()?;
        let order = Order::new(&case)?;
        let (_, y_f, y_t) = make_ybus(&case, &order)?;
        let (f, t) = (&order.branch.f, &order.branch.t);
        let v = sample_v6();

        let (d_sf_d_va, d_sf_d_vm, d_st_d_va, d_st_d_vm, s_f, s_t) =
            d_sbr_d_v(f, t, &y_f, &y_t, &v)?;
        assert_eq!(s_f.len(), 11);
        assert_eq!(s_t.len(), 11);

        let flow = |bus: &[usize], y: &CSR<usize, Complex64>, v: &[Complex64]| {
            let i = y * v;
            bus.iter()
                .zip(i)
                .map(|(&b, i)| v[b] * i.conj())
                .collect::<Vec<Complex64>>()
        };
        check_polar(|v| flow(f, &y_f, v), &v, &d_sf_d_va, &d_sf_d_vm, 1e-6);
        check_polar(|v| flow(t, &y_t, v), &v, &d_st_d_va, &d_st_d_vm, 1e-6);
        Ok(())
    }

    #[test]
    fn test_index_length() -> Result<()> {
        let case = case6ww()?;
        let order = Order::new(&case)?;
        let (_, y_f, y_t) = make_ybus(&case, &order)?;
        let v = sample_v6();

        let res = d_sbr_d_v(&order.branch.f[1..], &order.branch.t, &y_f, &y_t, &v);
        assert!(matches!(res, Err(CaseError::Dimension { .. })));
        Ok(())
    }
}
