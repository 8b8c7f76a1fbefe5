use crate::case::Case;
use crate::debug::format_rect_vec;
use crate::error::Result;
use crate::order::Order;
use num_complex::Complex64;

/// Builds the vector of complex bus power injections.
///
/// Returns the vector of complex bus power injections, that is, generation
/// minus load, indexed by the bus order. Power is expressed in per unit.
/// Dispatchable loads enter as generators with negative output.
pub fn make_sbus(case: &Case, order: &Order) -> Result<Vec<Complex64>> {
    let base_mva = Complex64::new(case.base_mva, 0.0);

    // Form net complex bus power injection vector
    // (power injected by generators + power injected by loads).
    let mut s_bus = vec![Complex64::default(); order.nb()];

    order
        .gen
        .status
        .on
        .iter()
        .zip(&order.gen.bus)
        .map(|(&g, &i)| (&case.gen[g], i))
        .filter(|(g, _)| g.is_on())
        .for_each(|(g, i)| {
            s_bus[i] += Complex64::new(g.pg, g.qg) / base_mva;
        });

    for (i, &id) in order.bus.i2e.iter().enumerate() {
        let b = case.bus(id)?;
        s_bus[i] -= Complex64::new(b.pd, b.qd) / base_mva;
    }

    log::debug!("Sbus: {}", format_rect_vec(&s_bus));

    Ok(s_bus)
}
