use crate::case::{Branch, Case};
use crate::error::{CaseError, Result};
use crate::math::deg_to_rad;
use crate::order::Order;
use derive_builder::Builder;
use num_complex::Complex64;
use sparsetools::coo::Coo;
use sparsetools::csr::CSR;

/// Series impedance magnitude (p.u.) below which a branch is rejected.
pub const ZERO_IMPEDANCE_TOL: f64 = 1e-12;

/// Parameter changes applied while building admittance matrices. The
/// case itself is never modified.
#[derive(Debug, Clone, Default, PartialEq, Builder)]
#[builder(default, build_fn(error = "crate::error::CaseError"))]
pub struct YbusOverrides {
    /// Zero out shunt susceptance at buses.
    pub zero_bus_shunt_b: bool,
    /// Zero out line charging.
    pub zero_line_charging: bool,
    /// Cancel out taps (phase shift is kept).
    pub unit_tap: bool,
    /// Zero out line resistance.
    pub zero_resistance: bool,
    /// Zero out phase shifters.
    pub zero_shift: bool,
}

/// Per-branch pi-section parameters after overrides.
pub(crate) struct BranchParams {
    pub y_ff: Complex64,
    pub y_ft: Complex64,
    pub y_tf: Complex64,
    pub y_tt: Complex64,
}

pub(crate) fn branch_params(l: usize, br: &Branch, ovr: &YbusOverrides) -> Result<BranchParams> {
    let r = if ovr.zero_resistance { 0.0 } else { br.r };
    let y_s = if br.is_on() {
        let z = Complex64::new(r, br.x);
        if z.norm() < ZERO_IMPEDANCE_TOL {
            return Err(CaseError::ZeroImpedance { branch: l });
        }
        Complex64::new(1.0, 0.0) / z
    } else {
        Complex64::default()
    }; // series admittance
    let b_c = if br.is_on() && !ovr.zero_line_charging {
        br.b
    } else {
        0.0
    }; // line charging susceptance
    let t = if ovr.unit_tap { 1.0 } else { br.ratio() };
    let shift = if ovr.zero_shift { 0.0 } else { br.shift };
    let tap = Complex64::from_polar(t, deg_to_rad(shift)); // add phase shifters

    let y_tt = y_s + Complex64::new(0.0, b_c / 2.0);
    Ok(BranchParams {
        y_ff: y_tt / (tap * tap.conj()),
        y_ft: -y_s / tap.conj(),
        y_tf: -y_s / tap,
        y_tt,
    })
}

/// Builds the bus admittance matrix and branch admittance matrices.
///
/// Returns `(Ybus, Yf, Yt)` such that `Ybus * V` is the vector of complex
/// bus current injections and `Yf * V`, `Yt * V` are the branch currents
/// injected at the "from" and "to" ends of each branch.
pub fn make_ybus(
    case: &Case,
    order: &Order,
) -> Result<(
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
)> {
    make_ybus_with(case, order, &YbusOverrides::default())
}

/// Builds admittance matrices with parameter overrides applied.
pub fn make_ybus_with(
    case: &Case,
    order: &Order,
    ovr: &YbusOverrides,
) -> Result<(
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
    CSR<usize, Complex64>,
)> {
    let nb = order.nb();
    let nl = order.nl();

    // For each branch, compute the elements of the branch admittance matrix where:
    //
    //      | If |   | Yff  Yft |   | Vf |
    //      |    | = |          | * |    |
    //      | It |   | Ytf  Ytt |   | Vt |
    let mut y_f = Coo::with_size(nl, nb);
    let mut y_t = Coo::with_size(nl, nb);

    for (i, &l) in order.branch.status.on.iter().enumerate() {
        let p = branch_params(l, &case.branch[l], ovr)?;
        let (f, t) = (order.branch.f[i], order.branch.t[i]);

        y_f.push(i, f, p.y_ff);
        y_f.push(i, t, p.y_ft);

        y_t.push(i, f, p.y_tf);
        y_t.push(i, t, p.y_tt);
    }
    let y_f = y_f.to_csr();
    let y_t = y_t.to_csr();

    // If Psh is the real power consumed by the shunt at V = 1.0 p.u.
    // and Qsh is the reactive power injected by the shunt at V = 1.0 p.u.
    // then Psh - j Qsh = V * conj(Ysh * V) = conj(Ysh) = Gs - j Bs,
    // i.e. Ysh = Psh + j Qsh.
    let mut y_sh = Vec::with_capacity(nb);
    for &id in &order.bus.i2e {
        let bus = case.bus(id)?;
        let y = bus.y_sh(case.base_mva);
        y_sh.push(if ovr.zero_bus_shunt_b {
            Complex64::new(y.re, 0.0)
        } else {
            y
        });
    }

    let (c_f, c_t) = make_cf_ct(order);
    let y_bus_f = &c_f.t().to_csr() * &y_f;
    let y_bus_t = &c_t.t().to_csr() * &y_t;
    let y_bus = &(&y_bus_f + &y_bus_t) + &CSR::with_diagonal(y_sh);

    assert_eq!(y_bus.rows(), nb);
    assert_eq!(y_bus.cols(), nb);

    log::trace!("Ybus:\n{}", y_bus.to_table());

    Ok((y_bus, y_f, y_t))
}

/// Builds the branch-bus incidence matrices for the "from" and "to"
/// ends of each branch (`nl x nb`).
pub fn make_cf_ct(order: &Order) -> (CSR<usize, Complex64>, CSR<usize, Complex64>) {
    let (nl, nb) = (order.nl(), order.nb());
    let mut c_f = Coo::with_size(nl, nb);
    let mut c_t = Coo::with_size(nl, nb);
    for i in 0..nl {
        c_f.push(i, order.branch.f[i], Complex64::new(1.0, 0.0));
        c_t.push(i, order.branch.t[i], Complex64::new(1.0, 0.0));
    }
    (c_f.to_csr(), c_t.to_csr())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{BranchBuilder, BusBuilder, BusId};
    use crate::cmplx;
    use crate::math::dense::{assert_close, assert_dense_close, to_dense};
    use anyhow::Result;

    fn two_bus(r: f64, x: f64, b: f64) -> Result<(Case, BusId, BusId)> {
        let mut case = Case::default();
        let b1 = case.add_bus(BusBuilder::default().build()?);
        let b2 = case.add_bus(BusBuilder::default().build()?);
        case.add_branch(
            BranchBuilder::default()
                .from_bus(b1)
                .to_bus(b2)
                .r(r)
                .x(x)
                .b(b)
                .build()?,
        )?;
        Ok((case, b1, b2))
    }

    #[test]
    fn test_two_bus() -> Result<()> {
        let (case, _, _) = two_bus(0.01, 0.1, 0.0)?;
        let order = Order::new(&case)?;
        let (y_bus, y_f, y_t) = make_ybus(&case, &order)?;

        let y = cmplx!(1.0) / cmplx!(0.01, 0.1);
        let expect = vec![vec![y, -y], vec![-y, y]];
        assert_dense_close(&to_dense(&y_bus), &expect, 1e-9);
        assert_dense_close(&to_dense(&y_f), &[vec![y, -y]], 1e-9);
        assert_dense_close(&to_dense(&y_t), &[vec![-y, y]], 1e-9);
        Ok(())
    }

    #[test]
    fn test_row_sums_without_shunts() -> Result<()> {
        let case = crate::cases::case6ww()?;
        let order = Order::new(&case)?;
        let ovr = YbusOverridesBuilder::default()
            .zero_line_charging(true)
            .build()?;
        let (y_bus, _, _) = make_ybus_with(&case, &order, &ovr)?;

        for row in to_dense(&y_bus) {
            let sum: Complex64 = row.iter().sum();
            assert_close(sum, Complex64::default(), 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_lossless_line() -> Result<()> {
        let (case, _, _) = two_bus(0.0, 0.2, 0.1)?;
        let order = Order::new(&case)?;
        let (_, y_f, y_t) = make_ybus(&case, &order)?;

        let (y_f, y_t) = (to_dense(&y_f), to_dense(&y_t));
        assert_close(y_f[0][0], y_t[0][1], 1e-12);
        assert_close(y_f[0][1], y_t[0][0], 1e-12);
        assert_close(y_f[0][0], cmplx!(0.0, -5.0 + 0.05), 1e-12);
        Ok(())
    }

    #[test]
    fn test_phase_shifter() -> Result<()> {
        let (mut case, _, _) = two_bus(0.0, 0.1, 0.0)?;
        {
            let br = case.branch_mut(0)?;
            br.tap = 1.1;
            br.shift = 30.0;
        }
        let order = Order::new(&case)?;
        let (y_bus, _, _) = make_ybus(&case, &order)?;
        let y = to_dense(&y_bus);

        let y_s = cmplx!(1.0) / cmplx!(0.0, 0.1);
        let tap = Complex64::from_polar(1.1, deg_to_rad(30.0));
        assert_close(y[0][0], y_s / (1.1 * 1.1), 1e-9);
        assert_close(y[0][1], -y_s / tap.conj(), 1e-9);
        assert_close(y[1][0], -y_s / tap, 1e-9);
        assert_close(y[1][1], y_s, 1e-9);

        let ovr = YbusOverridesBuilder::default()
            .unit_tap(true)
            .zero_shift(true)
            .build()?;
        let (y_bus, _, _) = make_ybus_with(&case, &order, &ovr)?;
        let y = to_dense(&y_bus);
        assert_close(y[0][1], y[1][0], 1e-12);
        Ok(())
    }

    #[test]
    fn test_bus_shunt() -> Result<()> {
        let (mut case, b1, _) = two_bus(0.0, 0.1, 0.0)?;
        {
            let bus = case.bus_mut(b1)?;
            bus.gs = 5.0;
            bus.bs = 10.0;
        }
        let order = Order::new(&case)?;
        let (y_bus, _, _) = make_ybus(&case, &order)?;
        assert_close(to_dense(&y_bus)[0][0], cmplx!(0.05, -10.0 + 0.1), 1e-9);

        let ovr = YbusOverridesBuilder::default()
            .zero_bus_shunt_b(true)
            .build()?;
        let (y_bus, _, _) = make_ybus_with(&case, &order, &ovr)?;
        assert_close(to_dense(&y_bus)[0][0], cmplx!(0.05, -10.0), 1e-9);
        Ok(())
    }

    #[test]
    fn test_zero_impedance() -> Result<()> {
        let (mut case, _, _) = two_bus(0.0, 0.0, 0.0)?;
        let order = Order::new(&case)?;
        assert!(matches!(
            make_ybus(&case, &order),
            Err(CaseError::ZeroImpedance { branch: 0 })
        ));

        // Out-of-service branches never divide.
        case.branch_mut(0)?.online = false;
        let order = Order::with_parts(&case, &order.bus.i2e, &[0], &[])?;
        let (y_bus, _, _) = make_ybus(&case, &order)?;
        assert_dense_close(
            &to_dense(&y_bus),
            &vec![vec![Complex64::default(); 2]; 2],
            0.0,
        );
        Ok(())
    }

    #[test]
    fn test_incidence() -> Result<()> {
        let case = crate::cases::case6ww()?;
        let order = Order::new(&case)?;
        let (c_f, c_t) = make_cf_ct(&order);
        assert_eq!((c_f.rows(), c_f.cols()), (11, 6));
        let (c_f, c_t) = (to_dense(&c_f), to_dense(&c_t));
        assert_eq!(c_f[6][1], cmplx!(1.0));
        assert_eq!(c_t[6][5], cmplx!(1.0));
        Ok(())
    }

    #[test]
    fn test_incidence_assembly() -> Result<()> {
        let mut case = crate::cases::case6ww()?;
        case.branch_mut(2)?.shift = -3.0;
        let order = Order::new(&case)?;
        let (y_bus, y_f, y_t) = make_ybus(&case, &order)?;
        let (c_f, c_t) = make_cf_ct(&order);

        // Ybus = Cf' * Yf + Ct' * Yt for a case without bus shunts.
        let (c_f, c_t) = (to_dense(&c_f), to_dense(&c_t));
        let (y_f, y_t) = (to_dense(&y_f), to_dense(&y_t));
        let mut expect = vec![vec![Complex64::default(); 6]; 6];
        for l in 0..11 {
            for i in 0..6 {
                for j in 0..6 {
                    expect[i][j] += c_f[l][i] * y_f[l][j] + c_t[l][i] * y_t[l][j];
                }
            }
        }
        assert_dense_close(&to_dense(&y_bus), &expect, 1e-9);
        Ok(())
    }
}
