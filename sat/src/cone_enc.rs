//! `ConeEnc`: the good/faulty twin-circuit plus D-chain propagation encoding
//! that `BoolDiffEngine` drives per fault. Three variable maps meet here —
//! `gvar` (fault-free value), `fvar` (faulty value, shared with `gvar` inside
//! the fault's TFI), and `dvar` (their XOR, "this node differs") — exactly the
//! three the reference engine builds before asking the solver for a test.
//!
//! Grounded on `original_source/c++-src/dtpg/engine/ConeEnc.cc`: `gen_good_cnf`,
//! `gen_faulty_cnf` and `make_dchain_cnf` are carried over as
//! `encode_good`/`encode_faulty`/`encode_dchain`, built atop `GateEnc`'s clause
//! dispatch instead of a one-off `make_cnf`.

use hashbrown::HashMap;
use tpg_core::{FaultId, NetworkRep, NodeId};

use crate::gate_enc::add_gate_clauses;
use crate::lit::Lit;
use crate::solver::SatSolver;

/// A fault's cone of influence: its TFI (for the good-circuit variables it
/// shares with the faulty circuit) and its TFO (where good and faulty values
/// may diverge), rooted at the node where the fault is injected.
pub struct ConeInfo {
    pub root: NodeId,
    pub tfi_list: Vec<NodeId>,
    pub tfo_list: Vec<NodeId>,
    pub ppo_list: Vec<NodeId>,
}

impl ConeInfo {
    /// `tfi_list` is the TFI of the *entire* TFO cone (not just `root`) so
    /// every node `encode_faulty`/`encode_dchain` walks over `tfo_list` also
    /// has a good-circuit variable to read — matching how the reference
    /// engine computes its TFI from the already-collected TFO list rather
    /// than from `root` alone.
    pub fn compute(network: &NetworkRep, root: NodeId) -> Self {
        let mut tfo_list = Vec::new();
        let mut ppo_list = Vec::new();
        network.get_tfo_list_with(&[root], None, |n| {
            tfo_list.push(n);
            if network.node(n).map(|r| r.kind().is_ppo()).unwrap_or(false) {
                ppo_list.push(n);
            }
        });
        let tfi_list = network.get_tfi_list(&tfo_list);
        ConeInfo { root, tfi_list, tfo_list, ppo_list }
    }
}

/// Three independent per-node variable tables, one per encode pass.
#[derive(Default)]
pub struct VidMap {
    vars: HashMap<NodeId, Lit>,
}

impl VidMap {
    pub fn new() -> Self {
        VidMap::default()
    }

    pub fn set(&mut self, node: NodeId, lit: Lit) {
        self.vars.insert(node, lit);
    }

    pub fn get(&self, node: NodeId) -> Option<Lit> {
        self.vars.get(&node).copied()
    }

    pub fn lit(&self, node: NodeId) -> Lit {
        self.get(node).expect("node variable allocated before being referenced")
    }
}

/// Good-circuit variables and faulty-circuit variables coincide inside the
/// fault's TFI (nothing has diverged yet); `gvar_map`/`fvar_map` share those
/// entries and only disagree from `info.root` outward.
pub fn encode_good(
    solver: &mut impl SatSolver,
    network: &NetworkRep,
    info: &ConeInfo,
    gvar_map: &mut VidMap,
    fvar_map: &mut VidMap,
) {
    for &n in &info.tfi_list {
        let lit = solver.new_var().pos_lit();
        gvar_map.set(n, lit);
        fvar_map.set(n, lit);
    }
    for &n in &info.tfi_list {
        let node = network.node(n).expect("tfi node exists");
        let Some(prim) = node.gate_type() else { continue };
        let olit = gvar_map.lit(n);
        let ilits: Vec<Lit> = node.fanin_list().iter().map(|&fi| gvar_map.lit(fi)).collect();
        add_gate_clauses(solver, prim, olit, &ilits);
    }
}

/// How a fault's divergence enters the faulty circuit at `ConeInfo::root`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootInjection {
    /// Gate-exhaustive fault: the faulty output is unspecified, so it's left
    /// a free variable rather than pinned to a known stuck constant.
    Free,
    /// Stem fault: the whole root node's faulty output is pinned to the
    /// stuck/post-transition value.
    Forced(bool),
    /// Branch fault: the root node still computes its function, but the
    /// fanin at `pos` is overridden to the stuck constant instead of reading
    /// the good circuit's value there.
    Pin { pos: usize, val: bool },
}

/// Faulty-circuit variables for the TFO. Every node gets a *fresh* variable
/// here, deliberately overwriting whatever `encode_good` shared between
/// `gvar_map`/`fvar_map` at the root (the root sits in both the TFI and the
/// TFO): the whole point of the faulty pass is that the root's faulty value
/// can disagree with its good value, which isn't possible if the two maps
/// still point at the same literal there.
pub fn encode_faulty(
    solver: &mut impl SatSolver,
    network: &NetworkRep,
    info: &ConeInfo,
    gvar_map: &VidMap,
    fvar_map: &mut VidMap,
    injection: RootInjection,
) {
    for &n in &info.tfo_list {
        fvar_map.set(n, solver.new_var().pos_lit());
    }
    for &n in &info.tfo_list {
        if n == info.root {
            match injection {
                RootInjection::Free => {}
                RootInjection::Forced(v) => {
                    let lit = fvar_map.lit(n);
                    solver.add_clause(&[if v { lit } else { !lit }]);
                }
                RootInjection::Pin { pos, val } => {
                    let node = network.node(n).expect("root node exists");
                    let Some(prim) = node.gate_type() else { continue };
                    let olit = fvar_map.lit(n);
                    let pin_lit = solver.new_var().pos_lit();
                    solver.add_clause(&[if val { pin_lit } else { !pin_lit }]);
                    let ilits: Vec<Lit> = node
                        .fanin_list()
                        .iter()
                        .enumerate()
                        .map(|(i, &fi)| if i == pos { pin_lit } else { gvar_map.lit(fi) })
                        .collect();
                    add_gate_clauses(solver, prim, olit, &ilits);
                }
            }
            continue;
        }
        let node = network.node(n).expect("tfo node exists");
        let Some(prim) = node.gate_type() else { continue };
        let olit = fvar_map.lit(n);
        let ilits: Vec<Lit> = node.fanin_list().iter().map(|&fi| fvar_map.lit(fi)).collect();
        add_gate_clauses(solver, prim, olit, &ilits);
    }
}

/// D-chain clauses: `dvar(n)` iff `gvar(n) != fvar(n)`, propagated toward the
/// primary outputs either directly (single fanout) or through the immediate
/// post-dominator (multiple fanout, short-circuiting the OR-of-successors
/// clause once dominance guarantees convergence).
pub fn encode_dchain(
    solver: &mut impl SatSolver,
    network: &NetworkRep,
    info: &ConeInfo,
    gvar_map: &VidMap,
    fvar_map: &VidMap,
) {
    let mut dvar_map = VidMap::new();
    for &n in &info.tfo_list {
        dvar_map.set(n, solver.new_var().pos_lit());
    }

    for &n in &info.tfo_list {
        let node = network.node(n).expect("tfo node exists");
        let glit = gvar_map.lit(n);
        let flit = fvar_map.lit(n);
        let dlit = dvar_map.lit(n);

        solver.add_clause(&[!glit, !flit, !dlit]);
        solver.add_clause(&[glit, flit, !dlit]);

        if node.kind().is_ppo() {
            solver.add_clause(&[!glit, flit, dlit]);
            solver.add_clause(&[glit, !flit, dlit]);
            continue;
        }

        let fanout = node.fanout_list();
        if fanout.len() == 1 {
            let odlit = dvar_map.lit(fanout[0]);
            solver.add_clause(&[!dlit, odlit]);
        } else {
            let mut tmp: Vec<Lit> = fanout.iter().map(|&fo| dvar_map.lit(fo)).collect();
            tmp.push(!dlit);
            solver.add_clause(&tmp);

            if let Some(dom) = node.imm_dom() {
                let odlit = dvar_map.lit(dom);
                solver.add_clause(&[!dlit, odlit]);
            }
        }
    }

    let odiff: Vec<Lit> = info.ppo_list.iter().map(|&n| dvar_map.lit(n)).collect();
    solver.add_clause(&odiff);

    let root_node = network.node(info.root).expect("root exists");
    if !root_node.kind().is_ppo() {
        solver.add_clause(&[dvar_map.lit(info.root)]);
    }
}

/// Builds the complete good + faulty + D-chain CNF for one fault's cone and
/// hands back the variable maps a caller needs to read off a test vector.
pub fn encode(
    solver: &mut impl SatSolver,
    network: &NetworkRep,
    root: NodeId,
    injection: RootInjection,
) -> (ConeInfo, VidMap, VidMap) {
    let info = ConeInfo::compute(network, root);
    let mut gvar_map = VidMap::new();
    let mut fvar_map = VidMap::new();
    encode_good(solver, network, &info, &mut gvar_map, &mut fvar_map);
    encode_faulty(solver, network, &info, &gvar_map, &mut fvar_map, injection);
    encode_dchain(solver, network, &info, &gvar_map, &fvar_map);
    (info, gvar_map, fvar_map)
}

/// Resolves a fault to how its divergence enters the faulty circuit at its
/// origin node: a stem fault forces the whole output, a branch fault pins
/// only the fanin it names (resolving the gate-logical input index to the
/// node's physical fanin position via `GateRep::branch_info`, since complex
/// gate decomposition can make the two differ), and a gate-exhaustive fault
/// leaves the faulty output free.
pub fn root_injection_for(
    network: &NetworkRep,
    fault: &tpg_core::FaultRep,
) -> tpg_core::Result<RootInjection> {
    use tpg_core::FaultKind;
    let injection = match fault.kind() {
        FaultKind::Exhaustive { .. } => RootInjection::Free,
        FaultKind::StemSa { fval } | FaultKind::StemTd { fval } => RootInjection::Forced(fval.as_bool()),
        FaultKind::BranchSa { ipos, fval } | FaultKind::BranchTd { ipos, fval } => {
            let gate = network.gate(fault.gate_id())?;
            let branch = gate.branch_info(*ipos);
            RootInjection::Pin { pos: branch.ipos, val: fval.as_bool() }
        }
    };
    Ok(injection)
}

/// Drives `encode` for a specific fault id and asks the solver for a test.
pub struct BoolDiffEngine<'a> {
    network: &'a NetworkRep,
}

impl<'a> BoolDiffEngine<'a> {
    pub fn new(network: &'a NetworkRep) -> Self {
        BoolDiffEngine { network }
    }

    pub fn encode_fault(
        &self,
        solver: &mut impl SatSolver,
        fault_id: FaultId,
    ) -> tpg_core::Result<(ConeInfo, VidMap, VidMap)> {
        let fault = self.network.fault(fault_id)?;
        let injection = root_injection_for(self.network, fault)?;
        Ok(encode(solver, self.network, fault.origin_node(), injection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn dchain_forces_divergence_to_reach_output() {
        let net = build_and2();
        let mut solver = DpllSolver::new();
        let root = net.node_list().iter().find(|n| n.gate_id().is_some()).unwrap().id();
        let (_info, gvar, fvar) = encode(&mut solver, &net, root, RootInjection::Free);
        match solver.solve(&[]) {
            SatResult::Sat(model) => {
                let g = model.lit_value(gvar.lit(root));
                let f = model.lit_value(fvar.lit(root));
                assert_ne!(g, f, "a satisfying assignment must diverge at the fault site");
            }
            other => panic!("expected a satisfiable propagation: {:?}", other),
        }
    }

    #[test]
    fn forced_root_value_pins_faulty_output_to_the_stuck_constant() {
        let net = build_and2();
        let mut solver = DpllSolver::new();
        let root = net.node_list().iter().find(|n| n.gate_id().is_some()).unwrap().id();
        let (_info, _gvar, fvar) = encode(&mut solver, &net, root, RootInjection::Forced(false));
        match solver.solve(&[]) {
            SatResult::Sat(model) => {
                assert_eq!(model.lit_value(fvar.lit(root)), Some(false));
            }
            other => panic!("expected a satisfiable propagation: {:?}", other),
        }
    }

    /// A branch fault only stucks the one input pin it names; `OR(a, b)` with
    /// `a` pinned to its non-controlling value (0) still computes over `b`,
    /// so forcing `b=1` must still satisfy `fvar(root)=1` — the whole-output
    /// forcing a stem fault gets would wrongly pin it to 0 regardless of `b`.
    #[test]
    fn pin_injection_only_overrides_the_named_fanin() {
        let mut b = NetworkBuilder::new(FaultType::StuckAt);
        b.set_size(2, 1, 0, 1, 0);
        let a = b.make_input_node("a");
        let c = b.make_input_node("b");
        let gt = b.make_gate_type_primitive(2, PrimType::Or);
        let g = b.make_prim_node(PrimType::Or, vec![a, c]);
        b.make_gate(gt, g, vec![BranchInfo { node: g, ipos: 0 }, BranchInfo { node: g, ipos: 1 }]);
        b.make_output_node("o", g);
        let net = b.post_op().unwrap();

        let mut solver = DpllSolver::new();
        let root = g;
        let (_info, gvar, fvar) =
            encode(&mut solver, &net, root, RootInjection::Pin { pos: 0, val: false });
        let b_glit = gvar.lit(c);
        match solver.solve(&[b_glit]) {
            SatResult::Sat(model) => {
                assert_eq!(model.lit_value(fvar.lit(root)), Some(true));
            }
            other => panic!("expected a satisfiable propagation: {:?}", other),
        }
    }
}
