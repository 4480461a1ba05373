//! `FfrEnc`: per-FFR propagation encoder. One boolean `pv(n)` per node inside
//! a fanout-free region answers "does a value change originating at `n`'s
//! output propagate all the way to the FFR root", shared cheaply across
//! every fault in the region instead of re-deriving a full cone per fault.
//!
//! Grounded on `original_source/c++-src/dtpg/engine/FFREnc.cc` and spec.md
//! §4.6.2.

use hashbrown::HashMap;
use tpg_core::{Assign, AssignList, FaultId, FfrRep, NetworkRep, NodeId, Result};

use crate::cone_enc::{encode_good, ConeInfo, VidMap};
use crate::lit::Lit;
use crate::solver::{DpllSolver, SatResult, SatSolver};

/// Propagation variables for one encoded FFR: `pv(n)` for every node reached
/// from the root plus `pv(f)` — the per-fault observation handle — for every
/// fault in `fault_ids` whose origin lies inside the region.
pub struct FfrPropagation {
    pub root: NodeId,
    pv: HashMap<NodeId, Lit>,
    fault_pv: HashMap<FaultId, Lit>,
}

impl FfrPropagation {
    pub fn node_pv(&self, node: NodeId) -> Option<Lit> {
        self.pv.get(&node).copied()
    }

    pub fn fault_pv(&self, fault: FaultId) -> Option<Lit> {
        self.fault_pv.get(&fault).copied()
    }
}

/// Ties `out <=> conjuncts[0] ∧ conjuncts[1] ∧ ...` with the usual two-sided
/// Tseitin expansion: one width-2 clause per conjunct forward, one wide
/// clause back.
fn tie_to_conjunction(solver: &mut impl SatSolver, out: Lit, conjuncts: &[Lit]) {
    for &c in conjuncts {
        solver.add_clause(&[!out, c]);
    }
    let mut back: Vec<Lit> = conjuncts.iter().map(|&c| !c).collect();
    back.push(out);
    solver.add_clause(&back);
}

pub struct FfrEnc<'a> {
    network: &'a NetworkRep,
}

impl<'a> FfrEnc<'a> {
    pub fn new(network: &'a NetworkRep) -> Self {
        FfrEnc { network }
    }

    /// Encodes the propagate-to-root condition for every node in `ffr`,
    /// reading side-input values off the good-circuit literals in `gvar`
    /// (those must already be allocated, e.g. by `GateEnc`/`encode_good` over
    /// the FFR's node list), then derives `pv(f)` for each fault in
    /// `fault_ids` rooted inside the region. `root_pv` lets a caller reuse an
    /// already-allocated "propagates past here" variable instead of a fresh
    /// one (e.g. one shared across sibling FFRs under the same MFFC).
    pub fn encode(
        &self,
        solver: &mut impl SatSolver,
        gvar: &VidMap,
        ffr: &FfrRep,
        root_pv: Option<Lit>,
        fault_ids: &[FaultId],
    ) -> FfrPropagation {
        let mut pv: HashMap<NodeId, Lit> = HashMap::new();
        let root_lit = root_pv.unwrap_or_else(|| solver.new_var().pos_lit());
        pv.insert(ffr.root(), root_lit);

        // Pre-order DFS from the root, walking only fanins still owned by
        // this FFR; external drivers are the region's boundary and stop here.
        let mut stack = vec![ffr.root()];
        while let Some(n) = stack.pop() {
            let node = self.network.node(n).expect("ffr-internal node exists");
            let pv_n = pv[&n];
            // Side inputs only gate propagation for gates with a defined
            // non-controlling value (AND/OR family); XOR/XNOR/Buff/Not have
            // none, so propagation through them is ungated by side values —
            // a deliberate simplification, the soundness of fault detection
            // rests on `ConeEnc`'s full D-chain, not on this per-FFR shortcut.
            let nval = node.nval().as_bool();
            let fanin = node.fanin_list();
            for (pos, &fi) in fanin.iter().enumerate() {
                let fi_node = self.network.node(fi).expect("fanin exists");
                let is_internal = fi_node.ffr_id() == Some(ffr.id()) && fi_node.fanout_num() == 1;
                if !is_internal {
                    continue;
                }
                let mut conjuncts = vec![pv_n];
                if let Some(v) = nval {
                    for (j, &other) in fanin.iter().enumerate() {
                        if j == pos {
                            continue;
                        }
                        let lit = gvar.lit(other);
                        conjuncts.push(if v { lit } else { !lit });
                    }
                }
                let pv_fi = solver.new_var().pos_lit();
                tie_to_conjunction(solver, pv_fi, &conjuncts);
                pv.insert(fi, pv_fi);
                stack.push(fi);
            }
        }

        let mut fault_pv = HashMap::new();
        for &fid in fault_ids {
            let Ok(fault) = self.network.fault(fid) else { continue };
            let Some(&origin_pv) = pv.get(&fault.origin_node()) else { continue };
            let Ok(excite) = self.network.excitation_condition(fid) else { continue };
            let mut conjuncts = vec![origin_pv];
            for a in excite.iter() {
                let lit = gvar.lit(a.node_id());
                conjuncts.push(if a.val() { lit } else { !lit });
            }
            let handle = solver.new_var().pos_lit();
            tie_to_conjunction(solver, handle, &conjuncts);
            fault_pv.insert(fid, handle);
        }

        FfrPropagation { root: ffr.root(), pv, fault_pv }
    }
}

/// A fault's detection condition as a set of PPI cubes, or an `Overflow`
/// marker once enumeration hits its cap.
///
/// Grounded on `original_source/include/condgen/DetCond.h`: condition
/// generators there return either a concrete cube list or, once a row-count
/// cap is hit, the cubes found so far plus the PPOs that still need a
/// separate generation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DetCond {
    Cubes(Vec<AssignList>),
    Overflow { covered: Vec<AssignList>, output_list: Vec<NodeId> },
}

/// Enumerates up to `cube_cap` distinct PPI cubes that detect `fault_id`
/// within its own FFR (via `FfrEnc`'s propagation handle), each obtained by
/// solving once and then blocking the PPI assignment just found. Returns
/// `DetCond::Overflow` with the fault's FFR-root PPO set if the cap is hit
/// before the solver runs dry.
pub fn enumerate_det_cond(
    network: &NetworkRep,
    fault_id: FaultId,
    cube_cap: usize,
) -> Result<DetCond> {
    let fault = network.fault(fault_id)?;
    let ffr_id = network
        .node(fault.origin_node())?
        .ffr_id()
        .expect("a fault's origin node always belongs to some ffr");
    let ffr = network.ffr(ffr_id)?;

    let mut solver = DpllSolver::new();
    let tfi_list = network.get_tfi_list(&[ffr.root()]);
    let info = ConeInfo { root: ffr.root(), tfi_list, tfo_list: Vec::new(), ppo_list: Vec::new() };
    let mut gvar = VidMap::new();
    let mut fvar = VidMap::new();
    encode_good(&mut solver, network, &info, &mut gvar, &mut fvar);

    let prop = FfrEnc::new(network).encode(&mut solver, &gvar, ffr, None, &[fault_id]);
    let Some(handle) = prop.fault_pv(fault_id) else {
        return Ok(DetCond::Cubes(Vec::new()));
    };

    let ppi_lits: Vec<(NodeId, Lit)> = info
        .tfi_list
        .iter()
        .filter_map(|&n| {
            let node = network.node(n).ok()?;
            node.kind().is_ppi().then(|| (n, gvar.lit(n)))
        })
        .collect();

    let mut cubes = Vec::new();
    loop {
        if cubes.len() >= cube_cap {
            let mut output_list = Vec::new();
            network.get_tfo_list_with(&[ffr.root()], None, |n| {
                if network.node(n).map(|r| r.kind().is_ppo()).unwrap_or(false) {
                    output_list.push(n);
                }
            });
            return Ok(DetCond::Overflow { covered: cubes, output_list });
        }
        match solver.solve(&[handle]) {
            SatResult::Sat(model) => {
                let mut assigns = Vec::with_capacity(ppi_lits.len());
                let mut block = Vec::with_capacity(ppi_lits.len());
                for &(node, lit) in &ppi_lits {
                    let val = model.lit_value(lit).unwrap_or(false);
                    assigns.push(Assign::new(node, 1, val));
                    block.push(if val { !lit } else { lit });
                }
                cubes.push(AssignList::from_sorted(assigns));
                if block.is_empty() {
                    // No PPI support at all: the one cube found is the only
                    // one possible, nothing left to block against.
                    return Ok(DetCond::Cubes(cubes));
                }
                solver.add_clause(&block);
            }
            _ => return Ok(DetCond::Cubes(cubes)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate_enc::add_gate_clauses;
    use crate::solver::{DpllSolver, SatResult};
    use tpg_core::{BranchInfo, FaultType, NetworkBuilder, PrimType};

    fn build_and2() -> NetworkRep {
        let mut b = NetworkBuilder::new(FaultType::StuckAt);
        b.set_size(2, 1, 0, 1, 0);
        let a = b.make_input_node("a");
        let c = b.make_input_node("b");
        let gt = b.make_gate_type_primitive(2, PrimType::And);
        let g = b.make_prim_node(PrimType::And, vec![a, c]);
        b.make_gate(gt, g, vec![BranchInfo { node: g, ipos: 0 }, BranchInfo { node: g, ipos: 1 }]);
        b.make_output_node("o", g);
        b.post_op().unwrap()
    }

    #[test]
    fn single_ffr_fault_handle_requires_its_excitation() {
        let net = build_and2();
        let mut solver = DpllSolver::new();

        // Allocate and encode good-circuit literals for every node so FfrEnc
        // has side-input values to read.
        let mut gvar = VidMap::new();
        for node in net.node_list() {
            gvar.set(node.id(), solver.new_var().pos_lit());
        }
        for node in net.node_list() {
            let Some(prim) = node.gate_type() else { continue };
            let olit = gvar.lit(node.id());
            let ilits: Vec<Lit> = node.fanin_list().iter().map(|&fi| gvar.lit(fi)).collect();
            add_gate_clauses(&mut solver, prim, olit, &ilits);
        }

        let ffr = &net.ffr_list()[0];
        let gate = net.gate_list().iter().find(|g| g.output_node() == ffr.root()).unwrap();
        let stem0 = gate.stem_fault(tpg_core::Fval2::Zero).unwrap();

        let enc = FfrEnc::new(&net);
        let prop = enc.encode(&mut solver, &gvar, ffr, None, &[stem0]);
        let handle = prop.fault_pv(stem0).unwrap();

        // Forcing the handle true must force both inputs to 1 (the SA0
        // excitation condition for an AND2).
        match solver.solve(&[handle]) {
            SatResult::Sat(model) => {
                let a = net.ppi(0).unwrap();
                let b = net.ppi(1).unwrap();
                assert_eq!(model.lit_value(gvar.lit(a)), Some(true));
                assert_eq!(model.lit_value(gvar.lit(b)), Some(true));
            }
            other => panic!("expected sat: {:?}", other),
        }
    }

    #[test]
    fn and2_sa0_has_exactly_one_detecting_cube() {
        let net = build_and2();
        let gate = net.gate_list().iter().find(|g| g.output_node() == net.ffr_list()[0].root()).unwrap();
        let stem0 = gate.stem_fault(tpg_core::Fval2::Zero).unwrap();
        match enumerate_det_cond(&net, stem0, 8).unwrap() {
            DetCond::Cubes(cubes) => {
                assert_eq!(cubes.len(), 1);
                let cube = &cubes[0];
                let a = net.ppi(0).unwrap();
                let b = net.ppi(1).unwrap();
                assert!(cube.iter().any(|a2| a2.node_id() == a && a2.val()));
                assert!(cube.iter().any(|a2| a2.node_id() == b && a2.val()));
            }
            other => panic!("expected a single cube, got {:?}", other),
        }
    }

    #[test]
    fn a_cap_of_zero_overflows_immediately() {
        let net = build_and2();
        let gate = net.gate_list().iter().find(|g| g.output_node() == net.ffr_list()[0].root()).unwrap();
        let stem0 = gate.stem_fault(tpg_core::Fval2::Zero).unwrap();
        match enumerate_det_cond(&net, stem0, 0).unwrap() {
            DetCond::Overflow { covered, output_list } => {
                assert!(covered.is_empty());
                assert!(!output_list.is_empty());
            }
            other => panic!("expected overflow, got {:?}", other),
        }
    }
}
