use crate::bus_types::bus_types;
use crate::case::Case;
use crate::debug::format_f64_vec;
use crate::error::{check_len, Result};
use crate::math::rad_to_deg;
use crate::order::Order;
use num_complex::Complex64;
use sparsetools::csr::CSR;
use std::collections::BTreeMap;

/// How the reactive power of a bus is shared between several online
/// generators at that bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum QgSplit {
    /// Each generator is assigned the bus total.
    #[default]
    Total,
    /// The bus total is divided equally.
    Equal,
    /// The bus total is divided in proportion to the reactive range of
    /// each generator. Infinite limits are replaced by a finite proxy.
    ReactiveRange,
}

/// Options for [`pfsoln`].
#[derive(Debug, Clone, Default)]
pub struct PfSolnOpt {
    pub qg_split: QgSplit,
}

/// Updates bus, gen and branch data to match a power flow solution.
///
/// All solver-derived state is cleared first. Bus voltages are then set
/// from `v`, generator reactive output (and active output at reference
/// buses) from the bus injections and branch flows from `Yf` and `Yt`.
/// Quantities are in MW, MVAr and degrees.
pub fn pfsoln(
    case: &mut Case,
    order: &Order,
    y_bus: &CSR<usize, Complex64>,
    y_f: &CSR<usize, Complex64>,
    y_t: &CSR<usize, Complex64>,
    v: &[Complex64],
    opt: &PfSolnOpt,
) -> Result<()> {
    let (nb, nl) = (order.nb(), order.nl());
    check_len("V", nb, v.len())?;
    check_len("Ybus rows", nb, y_bus.rows())?;
    check_len("Ybus cols", nb, y_bus.cols())?;
    check_len("Yf rows", nl, y_f.rows())?;
    check_len("Yt rows", nl, y_t.rows())?;
    check_len("Yf cols", nb, y_f.cols())?;
    check_len("Yt cols", nb, y_t.cols())?;

    let (refbus, _, _) = bus_types(case, order)?;
    let base_mva = case.base_mva;

    case.reset();

    for (i, &id) in order.bus.i2e.iter().enumerate() {
        let b = case.bus_mut(id)?;
        b.vm = v[i].norm();
        b.va = rad_to_deg(v[i].arg());
    }

    // compute total injected bus powers
    let i_bus = y_bus * v;
    let s_bus = v
        .iter()
        .zip(&i_bus)
        .map(|(v, i)| v * i.conj())
        .collect::<Vec<Complex64>>();

    // Update Qg for all gens.
    for g in case.gen.iter_mut().filter(|g| g.is_off()) {
        g.qg = 0.0;
    }
    let mut gbus: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (&g, &i) in order.gen.status.on.iter().zip(&order.gen.bus) {
        if case.gen[g].is_off() {
            continue;
        }
        let qd = case.bus(order.bus.i2e[i])?.qd;
        case.gen[g].qg = s_bus[i].im * base_mva + qd; // inj Q + local Qd
        gbus.entry(i).or_default().push(g);
    }

    // ...at this point any buses with more than one generator will have
    // the total Q dispatch for the bus assigned to each generator.
    if opt.qg_split != QgSplit::Total {
        for gens in gbus.values().filter(|gens| gens.len() > 1) {
            split_qg(case, gens, opt.qg_split);
        }
    }

    // Update Pg for slack gen(s).
    for r in refbus {
        let Some(gens) = gbus.get(&r) else {
            continue;
        };
        let pd = case.bus(order.bus.i2e[r])?.pd;
        // subtract off what is generated by other gens at this bus
        let others: f64 = gens[1..].iter().map(|&g| case.gen[g].pg).sum();
        case.gen[gens[0]].pg = s_bus[r].re * base_mva + pd - others; // inj P + local Pd
    }

    // Update/compute branch power flows.
    let i_f = y_f * v;
    let i_t = y_t * v;
    for (i, &l) in order.branch.status.on.iter().enumerate() {
        let (f, t) = (order.branch.f[i], order.branch.t[i]);
        let s_f = v[f] * i_f[i].conj() * base_mva; // complex power at "from" bus
        let s_t = v[t] * i_t[i].conj() * base_mva; // complex power injected at "to" bus

        let br = &mut case.branch[l];
        br.pf = s_f.re;
        br.qf = s_f.im;
        br.pt = s_t.re;
        br.qt = s_t.im;
    }

    log::debug!(
        "Qg: {}",
        format_f64_vec(&case.gen.iter().map(|g| g.qg).collect::<Vec<f64>>())
    );

    Ok(())
}

/// Shares the bus total (currently assigned to every generator in `gens`).
fn split_qg(case: &mut Case, gens: &[usize], split: QgSplit) {
    let n = gens.len() as f64;
    let qg_tot = case.gen[gens[0]].qg;

    if split == QgSplit::Equal {
        for &g in gens {
            case.gen[g].qg = qg_tot / n;
        }
        return;
    }

    // Proxy for infinite limits: sum of |Qg|, |Qmax| and |Qmin| over the
    // generators at the bus, using only finite limits.
    let m: f64 = gens
        .iter()
        .map(|&g| {
            let g = &case.gen[g];
            let mut m = (qg_tot / n).abs();
            if g.qmax.is_finite() {
                m += g.qmax.abs();
            }
            if g.qmin.is_finite() {
                m += g.qmin.abs();
            }
            m
        })
        .sum();
    let proxy = |q: f64| {
        if q.is_infinite() {
            m.copysign(q)
        } else {
            q
        }
    };
    let qmin = gens
        .iter()
        .map(|&g| proxy(case.gen[g].qmin))
        .collect::<Vec<f64>>();
    let qmax = gens
        .iter()
        .map(|&g| proxy(case.gen[g].qmax))
        .collect::<Vec<f64>>();
    let qg_min: f64 = qmin.iter().sum(); // minimum total Qg at the bus
    let qg_max: f64 = qmax.iter().sum(); // maximum total Qg at the bus

    if (qg_max - qg_min).abs() > 1e-13 {
        let q = (qg_tot - qg_min) / (qg_max - qg_min);
        for (k, &g) in gens.iter().enumerate() {
            case.gen[g].qg = qmin[k] + q * (qmax[k] - qmin[k]);
        }
    } else {
        // Zero Qg range at bus. All generators at the bus violate
        // their limits by the same amount.
        let mis = (qg_tot - qg_min) / n;
        for (k, &g) in gens.iter().enumerate() {
            case.gen[g].qg = qmin[k] + mis;
        }
    }
}
