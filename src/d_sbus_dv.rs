use crate::error::{check_len, check_vm, Result};
use crate::math::{diag, v_norm};
use num_complex::Complex64;
use sparsetools::csr::{CCSR, CSR};

/// Computes partial derivatives of power injection w.r.t. voltage.
///
/// The derivatives can be taken with respect to polar or cartesian
/// coordinates of voltage, depending on the `cartesian` argument.
/// Polar returns `(dSbus/dVa, dSbus/dVm)`, cartesian returns
/// `(dSbus/dVr, dSbus/dVi)`.
pub fn d_sbus_d_v(
    y_bus: &CSR<usize, Complex64>,
    v: &[Complex64],
    cartesian: bool,
) -> Result<(CSR<usize, Complex64>, CSR<usize, Complex64>)> {
    check_len("V", y_bus.cols(), v.len())?;

    let i_bus = y_bus * v;

    let diag_v = diag(v);
    let diag_i_bus = CSR::<usize, Complex64>::with_diagonal(i_bus);

    if cartesian {
        // dSbus/dVr = conj(diagIbus) + diagV * conj(Ybus)
        // dSbus/dVi = 1j * (conj(diagIbus) - diagV * conj(Ybus))

        let mut d_sbus_d_vr = diag_i_bus.conj() + &diag_v * y_bus.conj();
        let mut d_sbus_d_vi = (diag_i_bus.conj() - &diag_v * y_bus.conj()) * Complex64::i();

        d_sbus_d_vr.sort_indexes();
        d_sbus_d_vi.sort_indexes();

        Ok((d_sbus_d_vr, d_sbus_d_vi))
    } else {
        check_vm(v)?;
        let diag_v_norm = diag(&v_norm(v));

        // dSbus/dVa = 1j * diagV * conj(diagIbus - Ybus * diagV)
        // dSbus/dVm = diagV * conj(Ybus * diagVnorm) + conj(diagIbus) * diagVnorm

        let mut d_sbus_d_va = &diag_v * (&diag_i_bus - y_bus * &diag_v).conj() * Complex64::i();
        let mut d_sbus_d_vm =
            &diag_v * (y_bus * &diag_v_norm).conj() + diag_i_bus.conj() * &diag_v_norm;

        d_sbus_d_va.sort_indexes();
        d_sbus_d_vm.sort_indexes();

        Ok((d_sbus_d_va, d_sbus_d_vm))
    }
}
