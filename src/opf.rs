use crate::bus_types::bus_types;
use crate::case::Case;
use crate::error::{check_len, CaseError, Result};
use crate::math::deg_to_rad;
use crate::order::Order;
use sparsetools::coo::Coo;
use sparsetools::csr::CSR;

/// Ratings at or above this value (MVA) are treated as unlimited.
pub const UNLIMITED_RATING: f64 = 1e10;

/// Builds the DC power balance constraint `Amis * [Va; Pg] = bmis`.
///
/// `Amis = [Bbus, -Cg]` is `nb x (nb + ng)` where `Cg` is the bus to
/// generator incidence matrix of the generators in the order, and
///
/// ```text
/// bmis = -(Pd + Gs) / baseMVA - Pbusinj
/// ```
///
/// Takes `Bbus` and `Pbusinj` from [`make_b_dc`](crate::make_b_dc).
/// Generator output is in p.u. and angles in radians.
pub fn power_mismatch(
    case: &Case,
    order: &Order,
    b_bus: &CSR<usize, f64>,
    pbusinj: &[f64],
) -> Result<(CSR<usize, f64>, Vec<f64>)> {
    let (nb, ng) = (order.nb(), order.ng());
    check_len("Bbus rows", nb, b_bus.rows())?;
    check_len("Bbus cols", nb, b_bus.cols())?;
    check_len("Pbusinj", nb, pbusinj.len())?;

    let mut neg_cg = Coo::with_capacity(nb, ng, ng);
    for (j, &i) in order.gen.bus.iter().enumerate() {
        neg_cg.push(i, j, -1.0);
    }
    let a_mis = Coo::h_stack(&b_bus.to_coo(), &neg_cg)
        .map_err(|e| CaseError::Sparse(e.to_string()))?
        .to_csr();

    let b_mis = order
        .bus
        .i2e
        .iter()
        .zip(pbusinj)
        .map(|(&id, &p)| {
            case.bus(id)
                .map(|bus| -(bus.pd + bus.gs) / case.base_mva - p)
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok((a_mis, b_mis))
}

/// Builds the DC branch flow limits.
///
/// Branches with `0 < rate_a < UNLIMITED_RATING` are constrained. Returns
/// `(il, Af, upf, upt)` where `il` are their dense branch indexes and
/// `Af` the matching rows of `Bf`, such that
///
/// ```text
///  Af * Va <= upf      (flow at the "from" end)
/// -Af * Va <= upt      (flow at the "to" end)
/// ```
///
/// with `upf = rate_a/baseMVA - Pfinj` and `upt = rate_a/baseMVA + Pfinj`.
#[allow(clippy::type_complexity)]
pub fn branch_flow_limits(
    case: &Case,
    order: &Order,
    b_f: &CSR<usize, f64>,
    pfinj: &[f64],
) -> Result<(Vec<usize>, CSR<usize, f64>, Vec<f64>, Vec<f64>)> {
    let nl = order.nl();
    check_len("Bf rows", nl, b_f.rows())?;
    check_len("Pfinj", nl, pfinj.len())?;

    let mut il = Vec::new();
    let mut upf = Vec::new();
    let mut upt = Vec::new();
    for (i, &l) in order.branch.status.on.iter().enumerate() {
        let rate_a = case.branch[l].rate_a;
        if rate_a > 0.0 && rate_a < UNLIMITED_RATING {
            let rate = rate_a / case.base_mva;
            il.push(i);
            upf.push(rate - pfinj[i]);
            upt.push(rate + pfinj[i]);
        }
    }

    let a_f = b_f
        .select(Some(il.as_slice()), None)
        .map_err(|e| CaseError::Sparse(e.to_string()))?;

    Ok((il, a_f, upf, upt))
}

/// Builds the branch voltage angle difference limits.
///
/// A branch is constrained when its `ang_min` is non-zero and above -360
/// degrees, or its `ang_max` is non-zero and below 360 degrees. Returns
/// `(iang, Aang, lang, uang)` where `iang` are the dense branch indexes
/// and
///
/// ```text
/// lang <= Aang * Va <= uang
/// ```
///
/// with `Aang` holding `1` at the "from" and `-1` at the "to" bus of each
/// constrained branch. Unset limits are infinite. Bounds are in radians.
#[allow(clippy::type_complexity)]
pub fn angle_difference_limits(
    case: &Case,
    order: &Order,
) -> (Vec<usize>, CSR<usize, f64>, Vec<f64>, Vec<f64>) {
    let lower = |deg: f64| deg != 0.0 && deg > -360.0;
    let upper = |deg: f64| deg != 0.0 && deg < 360.0;

    let mut iang = Vec::new();
    let mut lang = Vec::new();
    let mut uang = Vec::new();
    for (i, &l) in order.branch.status.on.iter().enumerate() {
        let br = &case.branch[l];
        if !lower(br.ang_min) && !upper(br.ang_max) {
            continue;
        }
        iang.push(i);
        lang.push(if lower(br.ang_min) {
            deg_to_rad(br.ang_min)
        } else {
            f64::NEG_INFINITY
        });
        uang.push(if upper(br.ang_max) {
            deg_to_rad(br.ang_max)
        } else {
            f64::INFINITY
        });
    }

    let mut a_ang = Coo::with_capacity(iang.len(), order.nb(), 2 * iang.len());
    for (k, &i) in iang.iter().enumerate() {
        a_ang.push(k, order.branch.f[i], 1.0);
        a_ang.push(k, order.branch.t[i], -1.0);
    }

    (iang, a_ang.to_csr(), lang, uang)
}

/// Voltage angle bounds `(Val, Vau)` that pin each reference bus to its
/// case angle (radians). All other angles are free.
pub fn angle_reference_bounds(case: &Case, order: &Order) -> Result<(Vec<f64>, Vec<f64>)> {
    let nb = order.nb();
    let mut va_l = vec![f64::NEG_INFINITY; nb];
    let mut va_u = vec![f64::INFINITY; nb];

    let (refbus, _, _) = bus_types(case, order)?;
    for i in refbus {
        let va = deg_to_rad(case.bus(order.bus.i2e[i])?.va);
        va_l[i] = va;
        va_u[i] = va;
    }
    Ok((va_l, va_u))
}
