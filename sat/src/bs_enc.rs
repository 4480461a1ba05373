//! `BsEnc`: the previous-frame (broadside) encoder transition-delay faults
//! need on top of the single-frame D-chain `ConeEnc` already builds. Allocates
//! a second ("h") variable per node reachable backward from the cone's root
//! and from every DFF input feeding a DFF output the cone depends on, then
//! ties each such DFF output's current-frame ("g") variable to its DFF
//! input's previous-frame ("h") variable — "this frame's launch value is
//! last frame's captured value".
//!
//! Grounded on `original_source/c++-src/dtpg/old_files/BSEnc.cc` and
//! spec.md §4.6.3.

use tpg_core::{NetworkRep, NodeId};

use crate::cone_enc::{ConeInfo, VidMap};
use crate::gate_enc::add_gate_clauses;
use crate::lit::Lit;
use crate::solver::SatSolver;

/// Structural scope of the previous frame: the TFI of the fault cone's root
/// together with the TFI of every DFF input paired with a DFF output the
/// cone's TFI depends on.
pub struct BsInfo {
    tfi_list: Vec<NodeId>,
}

impl BsInfo {
    pub fn compute(network: &NetworkRep, cone_info: &ConeInfo) -> Self {
        let mut roots: Vec<NodeId> = cone_info
            .tfi_list
            .iter()
            .filter_map(|&n| {
                let node = network.node(n).ok()?;
                if node.kind().is_dff_output() {
                    node.alt_node()
                } else {
                    None
                }
            })
            .collect();
        roots.push(cone_info.root);
        let tfi_list = network.get_tfi_list(&roots);
        BsInfo { tfi_list }
    }

    pub fn tfi_list(&self) -> &[NodeId] {
        &self.tfi_list
    }
}

pub struct BsEnc;

impl BsEnc {
    /// Allocates `hvar_map` over `bs_info.tfi_list()`, ties each DFF output in
    /// `cone_info`'s TFI to its DFF input's `hvar`, and encodes the previous
    /// frame's fault-free gate behavior over that TFI (transition-delay faults
    /// are always fault-free one frame back, by definition).
    pub fn encode(
        solver: &mut impl SatSolver,
        network: &NetworkRep,
        cone_info: &ConeInfo,
        bs_info: &BsInfo,
        gvar_map: &VidMap,
        hvar_map: &mut VidMap,
    ) {
        for &n in bs_info.tfi_list() {
            hvar_map.set(n, solver.new_var().pos_lit());
        }

        for &n in &cone_info.tfi_list {
            let node = network.node(n).expect("tfi node exists");
            if !node.kind().is_dff_output() {
                continue;
            }
            let alt = node.alt_node().expect("dff output has a paired dff input");
            let hlit = hvar_map.lit(alt);
            let glit = gvar_map.lit(n);
            solver.add_clause(&[!glit, hlit]);
            solver.add_clause(&[glit, !hlit]);
        }

        for &n in bs_info.tfi_list() {
            let node = network.node(n).expect("tfi node exists");
            let Some(prim) = node.gate_type() else { continue };
            let olit = hvar_map.lit(n);
            let ilits: Vec<Lit> = node.fanin_list().iter().map(|&fi| hvar_map.lit(fi)).collect();
            add_gate_clauses(solver, prim, olit, &ilits);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{DpllSolver, SatResult};
    use tpg_core::{BranchInfo, DffId, FaultType, NetworkBuilder, PrimType};

    struct Seq {
        net: NetworkRep,
        pi: NodeId,
        q: NodeId,
        g: NodeId,
        d: NodeId,
    }

    /// `pi`, `q` (DFF output) feed `g = AND(pi, q)`; `g` both drives a primary
    /// output and the DFF input `d`, closing a one-bit shift register.
    fn build_seq() -> Seq {
        let mut b = NetworkBuilder::new(FaultType::TransitionDelay);
        b.set_size(1, 1, 1, 1, 0);
        let dff_id = DffId::new(0);
        let q = b.make_dff_output_node("q", dff_id);
        let pi = b.make_input_node("pi");
        let gt = b.make_gate_type_primitive(2, PrimType::And);
        let g = b.make_prim_node(PrimType::And, vec![pi, q]);
        b.make_gate(gt, g, vec![BranchInfo { node: g, ipos: 0 }, BranchInfo { node: g, ipos: 1 }]);
        b.make_output_node("y", g);
        let d = b.make_dff_input_node(dff_id, "d", g);
        let net = b.post_op().unwrap();
        Seq { net, pi, q, g, d }
    }

    #[test]
    fn dff_output_is_tied_to_previous_frame_dff_input() {
        let seq = build_seq();
        let mut solver = DpllSolver::new();

        let mut gvar_map = VidMap::new();
        for node in seq.net.node_list() {
            gvar_map.set(node.id(), solver.new_var().pos_lit());
        }
        for node in seq.net.node_list() {
            let Some(prim) = node.gate_type() else { continue };
            let olit = gvar_map.lit(node.id());
            let ilits: Vec<Lit> = node.fanin_list().iter().map(|&fi| gvar_map.lit(fi)).collect();
            add_gate_clauses(&mut solver, prim, olit, &ilits);
        }

        let cone_info = ConeInfo::compute(&seq.net, seq.g);
        let bs_info = BsInfo::compute(&seq.net, &cone_info);
        assert!(bs_info.tfi_list().contains(&seq.d));
        assert!(bs_info.tfi_list().contains(&seq.pi));

        let mut hvar_map = VidMap::new();
        BsEnc::encode(&mut solver, &seq.net, &cone_info, &bs_info, &gvar_map, &mut hvar_map);

        let q_glit = gvar_map.lit(seq.q);
        match solver.solve(&[q_glit]) {
            SatResult::Sat(model) => {
                let d_hlit = hvar_map.lit(seq.d);
                assert_eq!(model.lit_value(q_glit), Some(true));
                assert_eq!(model.lit_value(d_hlit), Some(true));
            }
            other => panic!("expected sat: {:?}", other),
        }
    }
}
