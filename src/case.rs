use crate::error::{CaseError, Result};
use derive_builder::Builder;
use num_complex::Complex64;
use std::fmt;

/// Stable handle of a bus in the [`Case`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BusId(pub(crate) usize);

impl BusId {
    /// Position of the bus in the arena. Not a matrix index.
    pub fn slot(&self) -> usize {
        self.0
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum BusType {
    /// Fixed active and reactive power.
    #[default]
    PQ,
    /// Fixed voltage magnitude and active power.
    PV,
    /// Reference voltage angle. Slack active and reactive power.
    REF,
    /// Isolated bus, excluded from all matrices.
    ISOLATED,
}

/// Bus is a node in the power system graph structure.
/// Static loads and shunts are included in the Bus definition.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(build_fn(error = "crate::error::CaseError"))]
pub struct Bus {
    #[builder(setter(into), default)]
    pub name: String,

    #[builder(default)]
    pub bus_type: BusType,

    /// Base voltage (kV).
    #[builder(default = "100.0")]
    pub base_kv: f64,

    /// Voltage magnitude (p.u.).
    #[builder(default = "1.0")]
    pub vm: f64,

    /// Voltage angle (degrees).
    #[builder(default)]
    pub va: f64,

    /// Maximum voltage magnitude (p.u.).
    #[builder(default = "1.1")]
    pub vmax: f64,

    /// Minimum voltage magnitude (p.u.).
    #[builder(default = "0.9")]
    pub vmin: f64,

    /// Real power demand (MW).
    #[builder(default)]
    pub pd: f64,

    /// Reactive power demand (MVAr).
    #[builder(default)]
    pub qd: f64,

    /// Shunt conductance (MW demanded at V = 1.0 p.u.).
    #[builder(default)]
    pub gs: f64,

    /// Shunt susceptance (MVAr injected at V = 1.0 p.u.).
    #[builder(default)]
    pub bs: f64,

    #[builder(default = "1")]
    pub area: usize,

    #[builder(default = "1")]
    pub zone: usize,

    /// Lagrange multiplier on real power mismatch (u/MW).
    #[builder(setter(skip))]
    pub lam_p: f64,

    /// Lagrange multiplier on reactive power mismatch (u/MVAr).
    #[builder(setter(skip))]
    pub lam_q: f64,

    /// Kuhn-Tucker multiplier on upper voltage limit (u/p.u.).
    #[builder(setter(skip))]
    pub mu_vmax: f64,

    /// Kuhn-Tucker multiplier on lower voltage limit (u/p.u.).
    #[builder(setter(skip))]
    pub mu_vmin: f64,
}

impl Bus {
    pub fn is_pq(&self) -> bool {
        self.bus_type == BusType::PQ
    }
    pub fn is_pv(&self) -> bool {
        self.bus_type == BusType::PV
    }
    pub fn is_ref(&self) -> bool {
        self.bus_type == BusType::REF
    }
    pub fn is_isolated(&self) -> bool {
        self.bus_type == BusType::ISOLATED
    }

    /// Shunt admittance in per-unit.
    pub(crate) fn y_sh(&self, base_mva: f64) -> Complex64 {
        Complex64::new(self.gs, self.bs) / Complex64::new(base_mva, 0.0)
    }

    fn reset(&mut self) {
        self.vm = 0.0;
        self.va = 0.0;
        self.lam_p = 0.0;
        self.lam_q = 0.0;
        self.mu_vmax = 0.0;
        self.mu_vmin = 0.0;
    }
}

/// Branch represents either a transmission line/cable or a two winding
/// transformer. It is modelled as a pi-section line in series with an
/// ideal transformer at the "from" end.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(build_fn(error = "crate::error::CaseError"))]
pub struct Branch {
    #[builder(setter(into), default)]
    pub name: String,

    pub from_bus: BusId,
    pub to_bus: BusId,

    /// Resistance (p.u.).
    #[builder(default)]
    pub r: f64,

    /// Reactance (p.u.).
    #[builder(default)]
    pub x: f64,

    /// Total line charging susceptance (p.u.).
    #[builder(default)]
    pub b: f64,

    /// MVA rating A (long term rating).
    #[builder(default = "999.0")]
    pub rate_a: f64,

    /// MVA rating B (short term rating).
    #[builder(default = "999.0")]
    pub rate_b: f64,

    /// MVA rating C (emergency rating).
    #[builder(default = "999.0")]
    pub rate_c: f64,

    /// Transformer off nominal tap ratio, zero for lines.
    #[builder(default)]
    pub tap: f64,

    /// Transformer phase shift angle (degrees).
    #[builder(default)]
    pub shift: f64,

    #[builder(default = "true")]
    pub online: bool,

    /// Minimum angle difference, angle(Vf) - angle(Vt) (degrees).
    #[builder(default = "-360.0")]
    pub ang_min: f64,

    /// Maximum angle difference, angle(Vf) - angle(Vt) (degrees).
    #[builder(default = "360.0")]
    pub ang_max: f64,

    /// Real power injected at "from" bus end (MW).
    #[builder(setter(skip))]
    pub pf: f64,

    /// Reactive power injected at "from" bus end (MVAr).
    #[builder(setter(skip))]
    pub qf: f64,

    /// Real power injected at "to" bus end (MW).
    #[builder(setter(skip))]
    pub pt: f64,

    /// Reactive power injected at "to" bus end (MVAr).
    #[builder(setter(skip))]
    pub qt: f64,

    /// Kuhn-Tucker multiplier on MVA limit at "from" bus (u/MVA).
    #[builder(setter(skip))]
    pub mu_sf: f64,

    /// Kuhn-Tucker multiplier on MVA limit at "to" bus (u/MVA).
    #[builder(setter(skip))]
    pub mu_st: f64,

    /// Kuhn-Tucker multiplier lower angle difference limit (u/degree).
    #[builder(setter(skip))]
    pub mu_angmin: f64,

    /// Kuhn-Tucker multiplier upper angle difference limit (u/degree).
    #[builder(setter(skip))]
    pub mu_angmax: f64,
}

impl Branch {
    pub fn is_on(&self) -> bool {
        self.online
    }

    /// Tap ratio with the zero-means-line convention resolved.
    pub fn ratio(&self) -> f64 {
        if self.tap == 0.0 {
            1.0
        } else {
            self.tap
        }
    }

    fn reset(&mut self) {
        self.pf = 0.0;
        self.qf = 0.0;
        self.pt = 0.0;
        self.qt = 0.0;
        self.mu_sf = 0.0;
        self.mu_st = 0.0;
        self.mu_angmin = 0.0;
        self.mu_angmax = 0.0;
    }
}

/// Gen is a generator or dispatchable load.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(build_fn(error = "crate::error::CaseError"))]
pub struct Gen {
    #[builder(setter(into), default)]
    pub name: String,

    pub bus: BusId,

    /// Real power output (MW).
    #[builder(default)]
    pub pg: f64,

    /// Reactive power output (MVAr).
    #[builder(default)]
    pub qg: f64,

    /// Maximum reactive power output (MVAr).
    #[builder(default = "f64::INFINITY")]
    pub qmax: f64,

    /// Minimum reactive power output (MVAr).
    #[builder(default = "f64::NEG_INFINITY")]
    pub qmin: f64,

    /// Voltage magnitude setpoint (p.u.).
    #[builder(default = "1.0")]
    pub vg: f64,

    /// Maximum real power output (MW).
    #[builder(default = "100.0")]
    pub pmax: f64,

    /// Minimum real power output (MW).
    #[builder(default)]
    pub pmin: f64,

    #[builder(default = "true")]
    pub online: bool,

    /// Kuhn-Tucker multiplier on upper Pg limit (u/MW).
    #[builder(setter(skip))]
    pub mu_pmax: f64,

    /// Kuhn-Tucker multiplier on lower Pg limit (u/MW).
    #[builder(setter(skip))]
    pub mu_pmin: f64,

    /// Kuhn-Tucker multiplier on upper Qg limit (u/MVAr).
    #[builder(setter(skip))]
    pub mu_qmax: f64,

    /// Kuhn-Tucker multiplier on lower Qg limit (u/MVAr).
    #[builder(setter(skip))]
    pub mu_qmin: f64,
}

impl Gen {
    pub fn is_on(&self) -> bool {
        self.online
    }
    pub fn is_off(&self) -> bool {
        !self.online
    }

    /// Checks for dispatchable loads.
    pub fn is_load(&self) -> bool {
        self.pmin < 0.0 && self.pmax == 0.0
    }

    fn reset(&mut self) {
        self.mu_pmax = 0.0;
        self.mu_pmin = 0.0;
        self.mu_qmax = 0.0;
        self.mu_qmin = 0.0;
    }
}

/// Case models a power system as a directed graph of buses connected
/// by branches. Buses are held in an arena and addressed by [`BusId`];
/// branches and generators refer to buses by handle only.
#[derive(Debug, Clone)]
pub struct Case {
    pub name: String,

    /// System MVA base used for converting power into per-unit quantities.
    pub base_mva: f64,

    pub(crate) bus: Vec<Option<Bus>>,
    pub(crate) branch: Vec<Branch>,
    pub(crate) gen: Vec<Gen>,
}

impl Default for Case {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Case {
    pub fn new(base_mva: f64) -> Self {
        Self {
            name: String::default(),
            base_mva,
            bus: Vec::new(),
            branch: Vec::new(),
            gen: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn add_bus(&mut self, bus: Bus) -> BusId {
        self.bus.push(Some(bus));
        BusId(self.bus.len() - 1)
    }

    /// Adds a branch and returns its position in the case.
    pub fn add_branch(&mut self, branch: Branch) -> Result<usize> {
        self.bus(branch.from_bus)?;
        self.bus(branch.to_bus)?;
        self.branch.push(branch);
        Ok(self.branch.len() - 1)
    }

    /// Adds a generator and returns its position in the case.
    pub fn add_gen(&mut self, gen: Gen) -> Result<usize> {
        self.bus(gen.bus)?;
        self.gen.push(gen);
        Ok(self.gen.len() - 1)
    }

    /// Removes a bus from the arena. Handles of the remaining buses
    /// stay valid.
    pub fn remove_bus(&mut self, id: BusId) -> Result<Bus> {
        self.bus(id)?;
        let in_use = self
            .branch
            .iter()
            .any(|br| br.from_bus == id || br.to_bus == id)
            || self.gen.iter().any(|g| g.bus == id);
        if in_use {
            return Err(CaseError::BusInUse(id));
        }
        self.bus[id.0].take().ok_or(CaseError::UnknownBus(id))
    }

    pub fn bus(&self, id: BusId) -> Result<&Bus> {
        self.bus
            .get(id.0)
            .and_then(|b| b.as_ref())
            .ok_or(CaseError::UnknownBus(id))
    }

    pub fn bus_mut(&mut self, id: BusId) -> Result<&mut Bus> {
        self.bus
            .get_mut(id.0)
            .and_then(|b| b.as_mut())
            .ok_or(CaseError::UnknownBus(id))
    }

    /// All buses in the arena, in insertion order.
    pub fn buses(&self) -> impl Iterator<Item = (BusId, &Bus)> {
        self.bus
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.as_ref().map(|b| (BusId(i), b)))
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branch
    }

    pub fn branch_mut(&mut self, l: usize) -> Result<&mut Branch> {
        self.branch.get_mut(l).ok_or(CaseError::UnknownBranch(l))
    }

    pub fn gens(&self) -> &[Gen] {
        &self.gen
    }

    pub fn gen_mut(&mut self, i: usize) -> Result<&mut Gen> {
        self.gen.get_mut(i).ok_or(CaseError::UnknownGen(i))
    }

    /// Buses that are not isolated.
    pub fn connected_buses(&self) -> impl Iterator<Item = (BusId, &Bus)> {
        self.buses().filter(|(_, b)| !b.is_isolated())
    }

    /// In-service branches with their case positions.
    pub fn online_branches(&self) -> impl Iterator<Item = (usize, &Branch)> {
        self.branch.iter().enumerate().filter(|(_, br)| br.is_on())
    }

    /// In-service generators with their case positions.
    pub fn online_generators(&self) -> impl Iterator<Item = (usize, &Gen)> {
        self.gen.iter().enumerate().filter(|(_, g)| g.is_on())
    }

    /// Clears all solver-derived state (voltages, flows and multipliers)
    /// keeping topology and dispatch.
    pub fn reset(&mut self) {
        self.bus.iter_mut().flatten().for_each(|b| b.reset());
        self.branch.iter_mut().for_each(|br| br.reset());
        self.gen.iter_mut().for_each(|g| g.reset());
    }
}
