use crate::case::Case;
use crate::error::Result;
use crate::order::Order;
use std::collections::HashSet;

/// Builds dense index lists for each type of bus (REF, PV, PQ).
///
/// Generators with "out-of-service" status are treated as PQ buses with
/// zero generation (regardless of Pg/Qg values). A REF or PV bus without
/// an online generator is returned as PQ.
pub fn bus_types(case: &Case, order: &Order) -> Result<(Vec<usize>, Vec<usize>, Vec<usize>)> {
    // Buses with generators that are ON.
    let bus_gen_status = order
        .gen
        .status
        .on
        .iter()
        .zip(&order.gen.bus)
        .filter(|(&g, _)| case.gen[g].is_on())
        .map(|(_, &i)| i)
        .collect::<HashSet<usize>>();

    let mut refbus = Vec::new();
    let mut pv = Vec::new();
    let mut pq = Vec::new();
    for (i, &id) in order.bus.i2e.iter().enumerate() {
        let bus = case.bus(id)?;
        let has_gen = bus_gen_status.contains(&i);
        if bus.is_ref() && has_gen {
            refbus.push(i);
        } else if bus.is_pv() && has_gen {
            pv.push(i);
        } else {
            pq.push(i);
        }
    }

    Ok((refbus, pv, pq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::case6ww;
    use anyhow::Result;

    #[test]
    fn test_case6ww_types() -> Result<()> {
        let case = case6ww()?;
        let order = Order::new(&case)?;
        let (refbus, pv, pq) = bus_types(&case, &order)?;
        assert_eq!(refbus, vec![0]);
        assert_eq!(pv, vec![1, 2]);
        assert_eq!(pq, vec![3, 4, 5]);
        Ok(())
    }

    #[test]
    fn test_pv_without_gen_is_pq() -> Result<()> {
        let mut case = case6ww()?;
        case.gen_mut(2)?.online = false;
        let order = Order::new(&case)?;
        let (_, pv, pq) = bus_types(&case, &order)?;
        assert_eq!(pv, vec![1]);
        assert_eq!(pq, vec![2, 3, 4, 5]);
        Ok(())
    }
}
