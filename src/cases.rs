use crate::case::{BranchBuilder, BusBuilder, BusType, Case, GenBuilder};
use crate::error::Result;

/// Power flow data for 6 bus, 3 gen case from Wood & Wollenberg.
///
/// Data from example 4.1 in "Power Generation, Operation, and Control"
/// by Allen J. Wood and Bruce F. Wollenberg.
pub fn case6ww() -> Result<Case> {
    let mut case = Case::new(100.0).with_name("case6ww");

    let bus_data = [
        (BusType::REF, 0.0, 0.0, 1.05),
        (BusType::PV, 0.0, 0.0, 1.05),
        (BusType::PV, 0.0, 0.0, 1.07),
        (BusType::PQ, 70.0, 70.0, 1.0),
        (BusType::PQ, 70.0, 70.0, 1.0),
        (BusType::PQ, 70.0, 70.0, 1.0),
    ];
    let mut bus = Vec::with_capacity(bus_data.len());
    for (i, (bus_type, pd, qd, vm)) in bus_data.into_iter().enumerate() {
        bus.push(
            case.add_bus(
                BusBuilder::default()
                    .name(format!("{}", i + 1))
                    .bus_type(bus_type)
                    .pd(pd)
                    .qd(qd)
                    .vm(vm)
                    .base_kv(230.0)
                    .vmax(1.05)
                    .vmin(if i < 3 { 1.05 } else { 0.95 })
                    .build()?,
            ),
        );
    }

    // (bus, Pg, Vg, Pmax, Pmin)
    let gen_data = [
        (0, 0.0, 1.05, 200.0, 50.0),
        (1, 50.0, 1.05, 150.0, 37.5),
        (2, 60.0, 1.07, 180.0, 45.0),
    ];
    for (i, pg, vg, pmax, pmin) in gen_data {
        case.add_gen(
            GenBuilder::default()
                .bus(bus[i])
                .pg(pg)
                .qmax(100.0)
                .qmin(-100.0)
                .vg(vg)
                .pmax(pmax)
                .pmin(pmin)
                .build()?,
        )?;
    }

    // (from, to, r, x, b, rateA)
    let branch_data = [
        (0, 1, 0.1, 0.2, 0.04, 40.0),
        (0, 3, 0.05, 0.2, 0.04, 60.0),
        (0, 4, 0.08, 0.3, 0.06, 40.0),
        (1, 2, 0.05, 0.25, 0.06, 40.0),
        (1, 3, 0.05, 0.1, 0.02, 60.0),
        (1, 4, 0.1, 0.3, 0.04, 30.0),
        (1, 5, 0.07, 0.2, 0.05, 90.0),
        (2, 4, 0.12, 0.26, 0.05, 70.0),
        (2, 5, 0.02, 0.1, 0.02, 80.0),
        (3, 4, 0.2, 0.4, 0.08, 20.0),
        (4, 5, 0.1, 0.3, 0.06, 40.0),
    ];
    for (f, t, r, x, b, rate_a) in branch_data {
        case.add_branch(
            BranchBuilder::default()
                .from_bus(bus[f])
                .to_bus(bus[t])
                .r(r)
                .x(x)
                .b(b)
                .rate_a(rate_a)
                .rate_b(rate_a)
                .rate_c(rate_a)
                .build()?,
        )?;
    }

    Ok(case)
}
