//! Reference three-valued fault simulator: the oracle and regression ground
//! truth for the SAT-based test generator in `tpg_sat`. Every pattern
//! `tpg_sat::DtpgEngine` produces can be handed back here to confirm it
//! actually detects the fault it was generated for.
//!
//! Grounded on `original_source/c++-src/fsim/gtest/RefSim.h`: a single
//! topological evaluation pass that, for a faulty run, overrides one node's
//! value (or its inputs, for a gate-exhaustive fault) instead of building a
//! parallel fault-model graph. `tpg_core::NodeRep::gate_type()` already
//! collapses `PrimaryOutput`/`DffInput` wires to `Buff`, so the same loop
//! handles every node kind: only `PrimaryInput` and `DffOutput` need a value
//! from outside the gate list.

use hashbrown::HashMap;
use tpg_core::{
    DffId, FaultId, FaultKind, FaultRep, FaultType, NetworkRep, NodeId, NodeKind, PrimType, Result,
    TestVector, Val3,
};

/// The set of PPOs (primary outputs and DFF inputs) where a faulty run
/// disagreed with the good run, for one applied pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiffBits {
    nodes: Vec<NodeId>,
}

impl DiffBits {
    pub fn new() -> Self {
        DiffBits::default()
    }

    pub fn push(&mut self, node: NodeId) {
        self.nodes.push(node);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Normalizes iteration order so two `DiffBits` built from different
    /// traversal orders compare equal.
    pub fn sort(&mut self) {
        self.nodes.sort_by_key(|n| n.index());
        self.nodes.dedup();
    }
}

/// What a faulty run overrides relative to the good run, read off a
/// `FaultKind` once per call instead of matching on it in the inner loop.
#[derive(Clone, Debug)]
enum Injection {
    None,
    /// Stem fault: the whole node's output is pinned to the stuck value.
    Forced(NodeId, Val3),
    /// Branch fault: only fanin position `pos` of the node is overridden; the
    /// node's function is still evaluated over its (otherwise good) other
    /// inputs, so a non-controlling stuck value on that pin can fail to
    /// diverge the output at all.
    ForcedPin(NodeId, usize, Val3),
    ForcedInputs(NodeId, Vec<bool>),
}

fn injection_for(network: &NetworkRep, fault: &FaultRep) -> Injection {
    let origin = fault.origin_node();
    match fault.kind() {
        FaultKind::StemSa { fval } | FaultKind::StemTd { fval } => {
            Injection::Forced(origin, fval.as_val3())
        }
        FaultKind::BranchSa { ipos, fval } | FaultKind::BranchTd { ipos, fval } => {
            let gate = network.gate(fault.gate_id()).expect("fault's gate exists");
            let branch = gate.branch_info(*ipos);
            Injection::ForcedPin(branch.node, branch.ipos, fval.as_val3())
        }
        FaultKind::Exhaustive { ivals } => Injection::ForcedInputs(origin, ivals.clone()),
    }
}

/// One topological pass: `pi_val`/`dff_val` supply the two kinds of leaf,
/// `injection` overrides a single node (or its inputs) partway through.
fn eval_frame(
    network: &NetworkRep,
    pi_val: impl Fn(usize) -> Val3,
    dff_val: impl Fn(DffId) -> Val3,
    injection: &Injection,
    values: &mut HashMap<NodeId, Val3>,
) {
    for node in network.node_list() {
        let val = match node.kind() {
            NodeKind::PrimaryInput { input_id } => pi_val(input_id),
            NodeKind::DffOutput { dff_id, .. } => dff_val(dff_id),
            _ => {
                let mut inputs: Vec<Val3> =
                    node.fanin_list().iter().map(|&fi| values[&fi]).collect();
                match injection {
                    Injection::Forced(n, v) if *n == node.id() => *v,
                    Injection::ForcedPin(n, pos, v) if *n == node.id() => {
                        inputs[*pos] = *v;
                        node.gate_type()
                            .expect("non-ppi node always carries a gate function")
                            .eval(&inputs)
                    }
                    Injection::ForcedInputs(n, ivals) if *n == node.id() => {
                        let forced: Vec<Val3> = ivals.iter().map(|&b| Val3::from_bool(b)).collect();
                        node.gate_type()
                            .expect("non-ppi node always carries a gate function")
                            .eval(&forced)
                    }
                    _ => node
                        .gate_type()
                        .expect("non-ppi node always carries a gate function")
                        .eval(&inputs),
                }
            }
        };
        values.insert(node.id(), val);
    }
}

/// Runs the good or faulty machine over a pattern and returns the capture
/// frame's node values. For a transition-delay run, frame 0 (launch, read
/// from `aux_input_val`/`dff_val`) is always fault-free: the fault only
/// manifests on the transition into frame 1, matching the excitation
/// convention `tpg_sat::DtpgEngine`'s `BsEnc` encoding already commits to.
fn simulate(
    network: &NetworkRep,
    tv: &TestVector,
    is_td: bool,
    injection: &Injection,
) -> HashMap<NodeId, Val3> {
    if !is_td {
        let mut values = HashMap::new();
        eval_frame(
            network,
            |id| tv.input_val(id),
            |dff_id| tv.dff_val(dff_id.index()),
            injection,
            &mut values,
        );
        return values;
    }

    let mut frame0 = HashMap::new();
    eval_frame(
        network,
        |id| tv.aux_input_val(id),
        |dff_id| tv.dff_val(dff_id.index()),
        &Injection::None,
        &mut frame0,
    );

    let mut next_state: HashMap<DffId, Val3> = HashMap::new();
    for node in network.node_list() {
        if let NodeKind::DffInput { dff_id, .. } = node.kind() {
            next_state.insert(dff_id, frame0[&node.id()]);
        }
    }

    let mut frame1 = HashMap::new();
    eval_frame(
        network,
        |id| tv.input_val(id),
        |dff_id| next_state.get(&dff_id).copied().unwrap_or(Val3::X),
        injection,
        &mut frame1,
    );
    frame1
}

fn diff_ppos(network: &NetworkRep, good: &HashMap<NodeId, Val3>, faulty: &HashMap<NodeId, Val3>) -> DiffBits {
    let mut diff = DiffBits::new();
    for &node in network.ppo_list() {
        if good[&node] != faulty[&node] {
            diff.push(node);
        }
    }
    diff
}

/// A reference simulator bound to one frozen netlist. Deliberately simple:
/// every query re-simulates from scratch rather than reusing partial results
/// across patterns or faults, trading speed for an implementation simple
/// enough to trust as ground truth.
pub struct RefSim<'a> {
    network: &'a NetworkRep,
}

impl<'a> RefSim<'a> {
    pub fn new(network: &'a NetworkRep) -> Self {
        RefSim { network }
    }

    fn is_td(&self) -> bool {
        self.network.fault_type() == FaultType::TransitionDelay
    }

    /// Single-pattern, single-fault: the PPOs where the faulty machine
    /// diverges from the good machine under `tv`.
    pub fn spsfp(&self, tv: &TestVector, fault_id: FaultId) -> Result<DiffBits> {
        let network = self.network;
        let fault = network.fault(fault_id)?;
        let is_td = self.is_td();
        let good = simulate(network, tv, is_td, &Injection::None);
        let injection = injection_for(network, fault);
        let faulty = simulate(network, tv, is_td, &injection);
        Ok(diff_ppos(network, &good, &faulty))
    }

    /// Single-pattern, parallel-fault: every representative fault's
    /// `DiffBits` under the one pattern `tv`, reusing a single good-machine
    /// run.
    pub fn sppfp(&self, tv: &TestVector) -> Result<HashMap<FaultId, DiffBits>> {
        let network = self.network;
        let is_td = self.is_td();
        let good = simulate(network, tv, is_td, &Injection::None);
        let mut out = HashMap::new();
        for &fault_id in network.rep_fid_list() {
            let fault = network.fault(fault_id)?;
            let injection = injection_for(network, fault);
            let faulty = simulate(network, tv, is_td, &injection);
            out.insert(fault_id, diff_ppos(network, &good, &faulty));
        }
        Ok(out)
    }

    /// Packed-pattern, parallel-fault: every representative fault's
    /// `DiffBits` for every pattern in `tv_list`, one entry per pattern in
    /// the returned `Vec` (same order as `tv_list`).
    ///
    /// Patterns are batched into `PV_BITLEN`-wide words and faults are
    /// evaluated one word at a time, same as `sppfp` run repeatedly but with
    /// the per-node gate evaluation amortized across up to `PV_BITLEN`
    /// patterns per word. This packed path assumes fully-specified (no `X`)
    /// patterns, true of anything that went through `fix_x_from_random` —
    /// an `X` surviving into `ppsfp` is treated as `0`, same simplification
    /// `BitVector::hex_str` already makes.
    pub fn ppsfp(&self, tv_list: &[TestVector]) -> Result<HashMap<FaultId, Vec<DiffBits>>> {
        let network = self.network;
        let mut out: HashMap<FaultId, Vec<DiffBits>> = HashMap::new();
        for fault_id in network.rep_fid_list() {
            out.insert(*fault_id, Vec::with_capacity(tv_list.len()));
        }

        for chunk in tv_list.chunks(PV_BITLEN) {
            let good = eval_chunk_packed(network, chunk, self.is_td(), &Injection::None);
            for &fault_id in network.rep_fid_list() {
                let fault = network.fault(fault_id)?;
                let injection = injection_for(network, fault);
                let faulty = eval_chunk_packed(network, chunk, self.is_td(), &injection);
                let diffs = out.get_mut(&fault_id).expect("every rep fault pre-seeded above");
                for lane in 0..chunk.len() {
                    let mut diff = DiffBits::new();
                    for &node in network.ppo_list() {
                        if bit(good[&node], lane) != bit(faulty[&node], lane) {
                            diff.push(node);
                        }
                    }
                    diffs.push(diff);
                }
            }
        }
        Ok(out)
    }
}

/// Lanes packed per machine word. A real word-parallel fault simulator packs
/// one bit per pattern per machine into the host's native word width;
/// `u64` gives 64 patterns per pass without any unsafe SIMD plumbing.
const PV_BITLEN: usize = 64;

fn bit(word: u64, lane: usize) -> bool {
    (word >> lane) & 1 != 0
}

fn pack(tv_list: &[TestVector], mut read: impl FnMut(&TestVector) -> Val3) -> u64 {
    let mut word = 0u64;
    for (lane, tv) in tv_list.iter().enumerate() {
        if read(tv).as_bool().unwrap_or(false) {
            word |= 1 << lane;
        }
    }
    word
}

fn eval_frame_packed(
    network: &NetworkRep,
    pi_val: impl Fn(usize) -> u64,
    dff_val: impl Fn(DffId) -> u64,
    injection: &Injection,
    values: &mut HashMap<NodeId, u64>,
) {
    for node in network.node_list() {
        let val = match node.kind() {
            NodeKind::PrimaryInput { input_id } => pi_val(input_id),
            NodeKind::DffOutput { dff_id, .. } => dff_val(dff_id),
            _ => {
                let mut inputs: Vec<u64> =
                    node.fanin_list().iter().map(|&fi| values[&fi]).collect();
                let prim = node.gate_type().expect("non-ppi node always carries a gate function");
                match injection {
                    Injection::Forced(n, v) if *n == node.id() => {
                        v.as_bool().map(|b| if b { u64::MAX } else { 0 }).unwrap_or(0)
                    }
                    Injection::ForcedPin(n, pos, v) if *n == node.id() => {
                        inputs[*pos] = v.as_bool().map(|b| if b { u64::MAX } else { 0 }).unwrap_or(0);
                        eval_prim_packed(prim, &inputs)
                    }
                    Injection::ForcedInputs(n, ivals) if *n == node.id() => {
                        let forced: Vec<u64> =
                            ivals.iter().map(|&b| if b { u64::MAX } else { 0 }).collect();
                        eval_prim_packed(prim, &forced)
                    }
                    _ => eval_prim_packed(prim, &inputs),
                }
            }
        };
        values.insert(node.id(), val);
    }
}

fn eval_prim_packed(prim: PrimType, inputs: &[u64]) -> u64 {
    match prim {
        PrimType::C0 => 0,
        PrimType::C1 => u64::MAX,
        PrimType::Buff => inputs[0],
        PrimType::Not => !inputs[0],
        PrimType::And => inputs.iter().copied().fold(u64::MAX, |a, b| a & b),
        PrimType::Nand => !inputs.iter().copied().fold(u64::MAX, |a, b| a & b),
        PrimType::Or => inputs.iter().copied().fold(0, |a, b| a | b),
        PrimType::Nor => !inputs.iter().copied().fold(0, |a, b| a | b),
        PrimType::Xor => inputs.iter().copied().fold(0, |a, b| a ^ b),
        PrimType::Xnor => !inputs.iter().copied().fold(0, |a, b| a ^ b),
    }
}

fn eval_chunk_packed(
    network: &NetworkRep,
    chunk: &[TestVector],
    is_td: bool,
    injection: &Injection,
) -> HashMap<NodeId, u64> {
    if !is_td {
        let mut values = HashMap::new();
        eval_frame_packed(
            network,
            |id| pack(chunk, |tv| tv.input_val(id)),
            |dff_id| pack(chunk, |tv| tv.dff_val(dff_id.index())),
            injection,
            &mut values,
        );
        return values;
    }

    let mut frame0 = HashMap::new();
    eval_frame_packed(
        network,
        |id| pack(chunk, |tv| tv.aux_input_val(id)),
        |dff_id| pack(chunk, |tv| tv.dff_val(dff_id.index())),
        &Injection::None,
        &mut frame0,
    );

    let mut next_state: HashMap<DffId, u64> = HashMap::new();
    for node in network.node_list() {
        if let NodeKind::DffInput { dff_id, .. } = node.kind() {
            next_state.insert(dff_id, frame0[&node.id()]);
        }
    }

    let mut frame1 = HashMap::new();
    eval_frame_packed(
        network,
        |id| pack(chunk, |tv| tv.input_val(id)),
        |dff_id| next_state.get(&dff_id).copied().unwrap_or(0),
        injection,
        &mut frame1,
    );
    frame1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpg_core::{BranchInfo, NetworkBuilder};

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

    fn pattern(a: Val3, b: Val3) -> TestVector {
        let mut tv = TestVector::new(2, 0, false);
        tv.set_input_val(0, a);
        tv.set_input_val(1, b);
        tv
    }

    #[test]
    fn spsfp_detects_output_stuck_at_zero_with_both_inputs_one() {
        let net = build_and2();
        let fid = net.fault_list().iter().find(|f| f.name() == "GateId#0:SA0").unwrap().id();
        let sim = RefSim::new(&net);
        let diff = sim.spsfp(&pattern(Val3::One, Val3::One), fid).unwrap();
        assert!(!diff.is_empty());
    }

    #[test]
    fn spsfp_does_not_detect_sa0_with_a_zero_input() {
        let net = build_and2();
        let fid = net.fault_list().iter().find(|f| f.name() == "GateId#0:SA0").unwrap().id();
        let sim = RefSim::new(&net);
        let diff = sim.spsfp(&pattern(Val3::Zero, Val3::One), fid).unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn sppfp_covers_every_representative_fault() {
        let net = build_and2();
        let sim = RefSim::new(&net);
        let diffs = sim.sppfp(&pattern(Val3::One, Val3::One)).unwrap();
        assert_eq!(diffs.len(), net.rep_fid_list().len());
    }

    #[test]
    fn ppsfp_agrees_with_spsfp_per_pattern() {
        let net = build_and2();
        let sim = RefSim::new(&net);
        let fid = net.fault_list().iter().find(|f| f.name() == "GateId#0:SA0").unwrap().id();
        let patterns = vec![
            pattern(Val3::One, Val3::One),
            pattern(Val3::Zero, Val3::One),
            pattern(Val3::One, Val3::Zero),
        ];
        let packed = sim.ppsfp(&patterns).unwrap();
        let packed_for_fault = &packed[&fid];
        for (i, tv) in patterns.iter().enumerate() {
            let scalar = sim.spsfp(tv, fid).unwrap();
            assert_eq!(scalar.is_empty(), packed_for_fault[i].is_empty());
        }
    }

    #[test]
    fn ppsfp_handles_more_than_one_word_of_patterns() {
        let net = build_and2();
        let sim = RefSim::new(&net);
        let patterns: Vec<TestVector> = (0..(PV_BITLEN + 5))
            .map(|i| pattern(Val3::from_bool(i % 2 == 0), Val3::One))
            .collect();
        let packed = sim.ppsfp(&patterns).unwrap();
        for diffs in packed.values() {
            assert_eq!(diffs.len(), patterns.len());
        }
    }
}
