use crate::case::{BusId, Case};
use crate::error::{CaseError, Result};
use std::collections::{HashMap, HashSet};

/// Dense indexing of the active part of a [`Case`].
///
/// An `Order` is a snapshot: it must be taken again after any topology
/// edit. Matrices built from one `Order` are indexed by its bus and
/// branch positions.
#[derive(Clone, Debug)]
pub struct Order {
    pub bus: BusOrder,
    pub gen: GenOrder,
    pub branch: BranchOrder,
}

/// Case positions that are in (`on`) or out of (`off`) the view.
#[derive(Clone, Debug, Default)]
pub struct Status {
    pub on: Vec<usize>,
    pub off: Vec<usize>,
}

impl Status {
    fn split(n: usize, on: &[usize]) -> Self {
        let set = on.iter().collect::<HashSet<&usize>>();
        Self {
            on: on.to_vec(),
            off: (0..n).filter(|i| !set.contains(i)).collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BusOrder {
    pub e2i: HashMap<BusId, usize>,
    pub i2e: Vec<BusId>,
    /// Live buses left out of the view.
    pub off: Vec<BusId>,
}

#[derive(Clone, Debug)]
pub struct BranchOrder {
    /// Dense "from" bus index of each branch.
    pub f: Vec<usize>,
    /// Dense "to" bus index of each branch.
    pub t: Vec<usize>,
    pub status: Status,
}

#[derive(Clone, Debug)]
pub struct GenOrder {
    /// Dense bus index of each generator.
    pub bus: Vec<usize>,
    pub status: Status,
}

impl Order {
    /// Indexes all connected buses, the in-service branches between them
    /// and the online generators attached to them.
    ///
    /// An in-service branch with an isolated end is left out of the view
    /// with a warning rather than an error. Use [`Order::with_parts`] to
    /// have it rejected.
    pub fn new(case: &Case) -> Result<Self> {
        let buses = case
            .connected_buses()
            .map(|(id, _)| id)
            .collect::<Vec<BusId>>();
        let connected = buses.iter().collect::<HashSet<&BusId>>();

        let branches = case
            .online_branches()
            .filter(|(l, br)| {
                let ok = connected.contains(&br.from_bus) && connected.contains(&br.to_bus);
                if !ok {
                    log::warn!(
                        "branch {} ({} -> {}) is in service but touches an isolated bus",
                        l,
                        br.from_bus,
                        br.to_bus
                    );
                }
                ok
            })
            .map(|(l, _)| l)
            .collect::<Vec<usize>>();

        let gens = case
            .online_generators()
            .filter(|(_, g)| connected.contains(&g.bus))
            .map(|(i, _)| i)
            .collect::<Vec<usize>>();

        Self::with_parts(case, &buses, &branches, &gens)
    }

    /// Builds a custom view over the given buses, branches and generators
    /// (in the given order).
    ///
    /// Every part must exist in the case and appear once. Branches and
    /// generators must attach to listed buses.
    pub fn with_parts(
        case: &Case,
        buses: &[BusId],
        branches: &[usize],
        gens: &[usize],
    ) -> Result<Self> {
        let mut e2i = HashMap::with_capacity(buses.len());
        for (i, &id) in buses.iter().enumerate() {
            case.bus(id)?;
            if e2i.insert(id, i).is_some() {
                return Err(CaseError::DuplicateBus(id));
            }
        }
        let off = case
            .buses()
            .map(|(id, _)| id)
            .filter(|id| !e2i.contains_key(id))
            .collect();

        let index = |id: BusId| e2i.get(&id).copied().ok_or(CaseError::UnknownBus(id));

        let mut f = Vec::with_capacity(branches.len());
        let mut t = Vec::with_capacity(branches.len());
        let mut seen = HashSet::with_capacity(branches.len());
        for &l in branches {
            let br = case.branch.get(l).ok_or(CaseError::UnknownBranch(l))?;
            if !seen.insert(l) {
                return Err(CaseError::DuplicateBranch(l));
            }
            f.push(index(br.from_bus)?);
            t.push(index(br.to_bus)?);
        }

        let mut gen_bus = Vec::with_capacity(gens.len());
        let mut seen = HashSet::with_capacity(gens.len());
        for &i in gens {
            let g = case.gen.get(i).ok_or(CaseError::UnknownGen(i))?;
            if !seen.insert(i) {
                return Err(CaseError::DuplicateGen(i));
            }
            gen_bus.push(index(g.bus)?);
        }

        Ok(Self {
            bus: BusOrder {
                e2i,
                i2e: buses.to_vec(),
                off,
            },
            branch: BranchOrder {
                f,
                t,
                status: Status::split(case.branch.len(), branches),
            },
            gen: GenOrder {
                bus: gen_bus,
                status: Status::split(case.gen.len(), gens),
            },
        })
    }

    /// Number of buses in the view.
    pub fn nb(&self) -> usize {
        self.bus.i2e.len()
    }

    /// Number of branches in the view.
    pub fn nl(&self) -> usize {
        self.branch.status.on.len()
    }

    /// Number of generators in the view.
    pub fn ng(&self) -> usize {
        self.gen.status.on.len()
    }

    /// Dense index of a bus.
    pub fn bus_index(&self, id: BusId) -> Result<usize> {
        self.bus
            .e2i
            .get(&id)
            .copied()
            .ok_or(CaseError::UnknownBus(id))
    }
}
