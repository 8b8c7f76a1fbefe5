use crate::case::Case;
use crate::d_sbus_dv::d_sbus_d_v;
use crate::debug::format_polar_vec;
use crate::error::{check_len, CaseError, Result};
use crate::math::deg_to_rad;
use crate::order::Order;
use num_complex::Complex64;
use sparsetools::coo::Coo;
use sparsetools::csr::{CCSR, CSR};

/// Initial complex bus voltages from the case.
///
/// Uses the bus voltage magnitudes and angles, with the generator set
/// point voltage magnitude for PV and slack buses.
pub fn make_v0(case: &Case, order: &Order) -> Result<Vec<Complex64>> {
    let mut v = order
        .bus
        .i2e
        .iter()
        .map(|&id| {
            case.bus(id)
                .map(|b| Complex64::from_polar(b.vm, deg_to_rad(b.va)))
        })
        .collect::<Result<Vec<Complex64>>>()?;

    // make sure we use generator setpoint voltage for PV and slack buses
    for (&g, &i) in order.gen.status.on.iter().zip(&order.gen.bus) {
        let gen = &case.gen[g];
        let bus = case.bus(order.bus.i2e[i])?;
        if gen.is_on() && (bus.is_pv() || bus.is_ref()) {
            v[i] = Complex64::from_polar(gen.vg, v[i].arg());
        }
    }
    log::debug!("V0: {}", format_polar_vec(&v));

    Ok(v)
}

/// Forms the power flow Jacobian.
///
/// If `full_jac` is true, it returns the full Jacobian (sensitivities of
/// all bus injections w.r.t all voltage angles/magnitudes) as opposed to
/// the reduced version used in the Newton power flow updates, which has
/// pv+pq rows for real power and angles and pq rows for reactive power
/// and magnitudes:
///
/// ```text
/// | dP/dVa  dP/dVm |
/// | dQ/dVa  dQ/dVm |
/// ```
///
/// The units for all quantities are in per unit with radians for voltage
/// angles.
#[allow(non_snake_case)]
pub fn make_jac(
    Ybus: &CSR<usize, Complex64>,
    V: &[Complex64],
    refbus: &[usize],
    pv: &[usize],
    pq: &[usize],
    full_jac: bool,
) -> Result<CSR<usize, f64>> {
    check_len("bus types", V.len(), refbus.len() + pv.len() + pq.len())?;

    // build Jacobian
    let (dSbus_dVa, dSbus_dVm) = d_sbus_d_v(Ybus, V, false)?;

    let (j11, j12, j21, j22) = if full_jac {
        let j11 = dSbus_dVa.real();
        let j12 = dSbus_dVm.real();
        let j21 = dSbus_dVa.imag();
        let j22 = dSbus_dVm.imag();

        (j11, j12, j21, j22)
    } else {
        let pv_pq = [pv, pq].concat();
        let select = |m: &CSR<usize, Complex64>, rows: &[usize], cols: &[usize]| {
            m.select(Some(rows), Some(cols))
                .map_err(|e| CaseError::Sparse(e.to_string()))
        };

        let j11 = select(&dSbus_dVa, &pv_pq, &pv_pq)?.real();
        let j12 = select(&dSbus_dVm, &pv_pq, pq)?.real();
        let j21 = select(&dSbus_dVa, pq, &pv_pq)?.imag();
        let j22 = select(&dSbus_dVm, pq, pq)?.imag();

        (j11, j12, j21, j22)
    };

    let J = Coo::compose([
        [&j11.to_coo(), &j12.to_coo()],
        [&j21.to_coo(), &j22.to_coo()],
    ])
    .map_err(|e| CaseError::Sparse(e.to_string()))?
    .to_csr();
    log::trace!("J:\n{}", J.to_table());

    Ok(J)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus_types::bus_types;
    use crate::cases::case6ww;
    use crate::math::dense::{sample_v6, to_dense, to_dense_f64};
    use crate::ybus::make_ybus;
    use anyhow::Result;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_v0() -> Result<()> {
        let mut case = case6ww()?;
        case.gen_mut(2)?.vg = 1.02;
        let order = Order::new(&case)?;
        let v = make_v0(&case, &order)?;
        assert_abs_diff_eq!(v[0].norm(), 1.05, epsilon = 1e-12);
        assert_abs_diff_eq!(v[2].norm(), 1.02, epsilon = 1e-12);
        assert_abs_diff_eq!(v[3].norm(), 1.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_jacobian_sizes() -> Result<()> {
        let case = case6ww()?;
        let order = Order::new(&case)?;
        let (y_bus, _, _) = make_ybus(&case, &order)?;
        let (refbus, pv, pq) = bus_types(&case, &order)?;
        let v = sample_v6();

        let j = make_jac(&y_bus, &v, &refbus, &pv, &pq, false)?;
        let n = pv.len() + 2 * pq.len();
        assert_eq!((j.rows(), j.cols()), (n, n));

        let j_full = make_jac(&y_bus, &v, &refbus, &pv, &pq, true)?;
        assert_eq!((j_full.rows(), j_full.cols()), (12, 12));

        // dQ/dVm block of a PQ bus against the polar derivative.
        let (_, d_vm) = d_sbus_d_v(&y_bus, &v, false)?;
        let (j, d_vm) = (to_dense_f64(&j), to_dense(&d_vm));
        let npvpq = pv.len() + pq.len();
        assert_abs_diff_eq!(j[npvpq][npvpq], d_vm[pq[0]][pq[0]].im, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_reduced_blocks() -> Result<()> {
        let case = case6ww()?;
        let order = Order::new(&case)?;
        let (y_bus, _, _) = make_ybus(&case, &order)?;
        let (refbus, pv, pq) = bus_types(&case, &order)?;

        for v in [make_v0(&case, &order)?, sample_v6()] {
            let j = to_dense_f64(&make_jac(&y_bus, &v, &refbus, &pv, &pq, false)?);
            let (d_va, d_vm) = d_sbus_d_v(&y_bus, &v, false)?;
            let (d_va, d_vm) = (to_dense(&d_va), to_dense(&d_vm));

            let pv_pq = [pv.as_slice(), pq.as_slice()].concat();
            let n = pv_pq.len();
            for (r, &i) in pv_pq.iter().enumerate() {
                for (c, &k) in pv_pq.iter().enumerate() {
                    assert_abs_diff_eq!(j[r][c], d_va[i][k].re, epsilon = 1e-12);
                }
                for (c, &k) in pq.iter().enumerate() {
                    assert_abs_diff_eq!(j[r][n + c], d_vm[i][k].re, epsilon = 1e-12);
                }
            }
            for (r, &i) in pq.iter().enumerate() {
                for (c, &k) in pv_pq.iter().enumerate() {
                    assert_abs_diff_eq!(j[n + r][c], d_va[i][k].im, epsilon = 1e-12);
                }
                for (c, &k) in pq.iter().enumerate() {
                    assert_abs_diff_eq!(j[n + r][n + c], d_vm[i][k].im, epsilon = 1e-12);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_bus_type_count() -> Result<()> {
        let case = case6ww()?;
        let order = Order::new(&case)?;
        let (y_bus, _, _) = make_ybus(&case, &order)?;
        let v = sample_v6();
        let res = make_jac(&y_bus, &v, &[0], &[1, 2], &[3, 4], false);
        assert!(matches!(res, Err(CaseError::Dimension { .. })));
        Ok(())
    }
}
