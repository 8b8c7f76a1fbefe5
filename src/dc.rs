use crate::case::{Branch, Case};
use crate::error::{CaseError, Result};
use crate::math::deg_to_rad;
use crate::order::Order;
use crate::ybus::ZERO_IMPEDANCE_TOL;
use sparsetools::coo::Coo;
use sparsetools::csr::CSR;

/// Builds the B matrices and phase shift injections for DC power flow.
///
/// Returns `(Bbus, Bf, Pbusinj, Pfinj)`. The bus real power injections
/// are related to bus voltage angles by
///     P = BBUS * Va + PBUSINJ
/// The real power flows at the from end the lines are related to the bus
/// voltage angles by
///     Pf = BF * Va + PFINJ
/// All quantities are in p.u. and angles in radians.
pub fn make_b_dc(
    case: &Case,
    order: &Order,
) -> Result<(CSR<usize, f64>, CSR<usize, f64>, Vec<f64>, Vec<f64>)> {
    let (rows, cols) = (order.nl(), order.nb());
    let nnz = 2 * rows;

    // Build Bf such that Bf * Va is the vector of real branch powers injected
    // at each branch's "from" bus.
    let mut b_f = Coo::with_capacity(rows, cols, nnz);
    // Build connection matrix Cft = Cf - Ct for line and from - to buses.
    let mut c_ft = Coo::with_capacity(rows, cols, nnz);
    let mut pfinj = Vec::with_capacity(rows);

    for (i, &l) in order.branch.status.on.iter().enumerate() {
        let br = &case.branch[l];
        let b = br_b(l, br)?;

        let (f, t) = (order.branch.f[i], order.branch.t[i]);

        b_f.push(i, f, b);
        b_f.push(i, t, -b);

        c_ft.push(i, f, 1.0);
        c_ft.push(i, t, -1.0);

        // Phase shift injection at the from bus ...
        pfinj.push(b * -deg_to_rad(br.shift));
    }
    let b_f = b_f.to_csr();
    let c_ft = c_ft.to_csr();

    let b_bus = &c_ft.t().to_csr() * &b_f;

    let pbusinj = &c_ft.t().to_csr() * &pfinj; // ... and extracted at the to bus

    log::trace!("Bbus:\n{}", b_bus.to_table());

    Ok((b_bus, b_f, pbusinj, pfinj))
}

/// Series susceptance scaled by the tap ratio.
fn br_b(l: usize, br: &Branch) -> Result<f64> {
    if !br.is_on() {
        return Ok(0.0);
    }
    if br.x.abs() < ZERO_IMPEDANCE_TOL {
        return Err(CaseError::ZeroImpedance { branch: l });
    }
    Ok(1.0 / br.x / br.ratio())
}
