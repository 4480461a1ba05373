//! `NetworkRep`/`NetworkBuilder`: the frozen netlist and the mutable arena used
//! to build it. Mirrors the builder-then-freeze split the reference
//! implementation uses (`set_size`/`make_*`/`post_op` on a live `NetworkRep`,
//! read-only accessors afterward) as a separate `NetworkBuilder` type that
//! consumes itself into an immutable `NetworkRep` in `freeze`.
//!
//! Grounded on `original_source/c++-src/types/include/NetworkRep.h`.

use hashbrown::HashMap;

use crate::assign::{Assign, AssignList};
use crate::error::{NetworkError, Result};
use crate::fault::{FaultKind, FaultRep};
use crate::ffr::FfrRep;
use crate::gate::{BranchInfo, GateRep};
use crate::gate_type::{Expr, GateType, PrimType};
use crate::ids::{DffId, FaultId, FfrId, GateId, GateTypeId, MffcId, NodeId};
use crate::mffc::MffcRep;
use crate::node::{NodeKind, NodeRep};
use crate::value::{FaultType, Fval2};
use tpg_util::bitset::VisitedSet;

/// Mutable construction-time state. Consumed by `freeze` into a `NetworkRep`.
pub struct NetworkBuilder {
    fault_type: FaultType,
    nodes: Vec<NodeRep>,
    ppi: Vec<NodeId>,
    ppi_names: Vec<String>,
    ppo: Vec<NodeId>,
    ppo_names: Vec<String>,
    dff_inputs: Vec<Option<NodeId>>,
    dff_outputs: Vec<Option<NodeId>>,
    gate_types: Vec<GateType>,
    gates: Vec<GateRep>,
}

impl NetworkBuilder {
    pub fn new(fault_type: FaultType) -> Self {
        NetworkBuilder {
            fault_type,
            nodes: Vec::new(),
            ppi: Vec::new(),
            ppi_names: Vec::new(),
            ppo: Vec::new(),
            ppo_names: Vec::new(),
            dff_inputs: Vec::new(),
            dff_outputs: Vec::new(),
            gate_types: Vec::new(),
            gates: Vec::new(),
        }
    }

    /// Sizing hint; the builder grows its vectors on demand regardless, so
    /// this only preallocates.
    pub fn set_size(
        &mut self,
        input_num: usize,
        output_num: usize,
        dff_num: usize,
        gate_num: usize,
        extra_node_num: usize,
    ) {
        let node_hint = input_num + output_num + dff_num * 2 + gate_num + extra_node_num;
        self.nodes.reserve(node_hint);
        self.gates.reserve(gate_num);
        self.dff_inputs.resize(dff_num, None);
        self.dff_outputs.resize(dff_num, None);
    }

    fn push_node(&mut self, kind: NodeKind, fanin: Vec<NodeId>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeRep::new(id, kind, fanin));
        id
    }

    pub fn make_input_node(&mut self, name: impl Into<String>) -> NodeId {
        let input_id = self.ppi.len() - self.count_dff_outputs();
        let node = self.push_node(NodeKind::PrimaryInput { input_id }, Vec::new());
        self.ppi.push(node);
        self.ppi_names.push(name.into());
        node
    }

    fn count_dff_outputs(&self) -> usize {
        self.ppi
            .iter()
            .filter(|&&n| self.nodes[n.index()].kind().is_dff_output())
            .count()
    }

    pub fn make_dff_output_node(&mut self, name: impl Into<String>, dff_id: DffId) -> NodeId {
        let input_id = self.ppi.len();
        let node = self.push_node(NodeKind::DffOutput { input_id, dff_id }, Vec::new());
        self.ppi.push(node);
        self.ppi_names.push(name.into());
        if dff_id.index() >= self.dff_outputs.len() {
            self.dff_outputs.resize(dff_id.index() + 1, None);
        }
        self.dff_outputs[dff_id.index()] = Some(node);
        node
    }

    pub fn make_output_node(&mut self, name: impl Into<String>, inode: NodeId) -> NodeId {
        let output_id = self.ppo.len();
        let node = self.push_node(NodeKind::PrimaryOutput { output_id }, vec![inode]);
        self.ppo.push(node);
        self.ppo_names.push(name.into());
        node
    }

    pub fn make_dff_input_node(
        &mut self,
        dff_id: DffId,
        name: impl Into<String>,
        inode: NodeId,
    ) -> NodeId {
        let output_id = self.ppo.len();
        let node = self.push_node(NodeKind::DffInput { output_id, dff_id }, vec![inode]);
        self.ppo.push(node);
        self.ppo_names.push(name.into());
        if dff_id.index() >= self.dff_inputs.len() {
            self.dff_inputs.resize(dff_id.index() + 1, None);
        }
        self.dff_inputs[dff_id.index()] = Some(node);
        node
    }

    pub fn make_prim_node(&mut self, prim: PrimType, fanin: Vec<NodeId>) -> NodeId {
        self.push_node(NodeKind::Logic { prim }, fanin)
    }

    pub fn make_gate_type_primitive(&mut self, input_num: usize, prim: PrimType) -> GateTypeId {
        let id = GateTypeId::new(self.gate_types.len());
        self.gate_types.push(GateType::Primitive { input_num, prim });
        id
    }

    pub fn make_gate_type_complex(&mut self, input_num: usize, expr: Expr) -> GateTypeId {
        let id = GateTypeId::new(self.gate_types.len());
        self.gate_types.push(GateType::Complex { input_num, expr });
        id
    }

    pub fn make_gate(
        &mut self,
        gate_type_id: GateTypeId,
        output_node: NodeId,
        branches: Vec<BranchInfo>,
    ) -> GateId {
        let id = GateId::new(self.gates.len());
        let gate_type = &self.gate_types[gate_type_id.index()];
        let gate = GateRep::new(id, gate_type_id, gate_type, output_node, branches);
        self.gates.push(gate);
        self.nodes[output_node.index()].set_gate_id(id);
        id
    }

    /// The node a just-built gate drives, for front ends (parsers) that need
    /// to wire that output into another gate's fanin or a primary output
    /// before the network is frozen.
    pub fn gate_output_node(&self, id: GateId) -> NodeId {
        self.gates[id.index()].output_node()
    }

    /// Builds a gate of `gate_type_id` over `fanin` (one node per logical
    /// input, in order), performing the complex-gate decomposition of
    /// spec.md §4.2 when the type isn't a primitive. Grounded on
    /// `original_source/c++-src/types/network/NetBuilder.cc`'s
    /// `make_gate`/`make_cplx_node`: every logical input gets a plain wire, a
    /// buffer, or an inverter(+buffer) depending on how many times it
    /// appears positively/negatively in the factored expression, so each
    /// input keeps exactly one physical branch point for fault identity.
    pub fn make_complex_gate(&mut self, gate_type_id: GateTypeId, fanin: Vec<NodeId>) -> GateId {
        let gate_type = self.gate_types[gate_type_id.index()].clone();
        match &gate_type {
            GateType::Primitive { prim, .. } => {
                let node = self.make_prim_node(*prim, fanin.clone());
                let branches: Vec<BranchInfo> =
                    (0..fanin.len()).map(|ipos| BranchInfo { node, ipos }).collect();
                self.make_gate(gate_type_id, node, branches)
            }
            GateType::Complex { expr, .. } => {
                let ni = fanin.len();
                let counts = expr.literal_polarity_counts();
                let mut leaf_nodes: Vec<Option<NodeId>> = vec![None; ni * 2];
                let mut branch_info: Vec<Option<BranchInfo>> = vec![None; ni];
                for i in 0..ni {
                    let (p_num, n_num) = counts[i];
                    let inode = fanin[i];
                    if n_num == 0 {
                        if p_num == 1 {
                            // Single positive occurrence: wire the driver straight
                            // in; `make_cplx_node` fills in the branch position
                            // when it reaches this literal.
                            leaf_nodes[i * 2] = Some(inode);
                        } else {
                            let buff = self.make_prim_node(PrimType::Buff, vec![inode]);
                            leaf_nodes[i * 2] = Some(buff);
                            branch_info[i] = Some(BranchInfo { node: buff, ipos: 0 });
                        }
                    } else {
                        let mut cur = inode;
                        if p_num > 0 {
                            let buff = self.make_prim_node(PrimType::Buff, vec![inode]);
                            cur = buff;
                            leaf_nodes[i * 2] = Some(buff);
                        }
                        let not_gate = self.make_prim_node(PrimType::Not, vec![cur]);
                        leaf_nodes[i * 2 + 1] = Some(not_gate);
                        if p_num == 0 {
                            cur = not_gate;
                        }
                        branch_info[i] = Some(BranchInfo { node: cur, ipos: 0 });
                    }
                }
                let node = self.make_cplx_node(expr, &leaf_nodes, &mut branch_info);
                let branches: Vec<BranchInfo> = branch_info
                    .into_iter()
                    .map(|b| b.expect("every input gets a branch position"))
                    .collect();
                self.make_gate(gate_type_id, node, branches)
            }
        }
    }

    /// Recursively lowers a non-literal `Expr` into a tree of primitive
    /// nodes, filling in `branch_info[i]` the first time input `i` is found
    /// as an unbuffered positive literal operand (mirrors the C++ `if
    /// (branch_info[iid].node == nullptr)` guard).
    fn make_cplx_node(
        &mut self,
        expr: &Expr,
        leaf_nodes: &[Option<NodeId>],
        branch_info: &mut [Option<BranchInfo>],
    ) -> NodeId {
        let (operands, prim) = match expr {
            Expr::And(es) => (es, PrimType::And),
            Expr::Or(es) => (es, PrimType::Or),
            Expr::Xor(es) => (es, PrimType::Xor),
            Expr::Lit { .. } | Expr::Const(_) => {
                unreachable!("make_cplx_node called on a literal/const expr")
            }
        };
        let mut fanins = Vec::with_capacity(operands.len());
        for op in operands {
            let inode = match op {
                Expr::Lit { input, inverted: false } => {
                    leaf_nodes[input * 2].expect("positive literal leaf must be wired")
                }
                Expr::Lit { input, inverted: true } => {
                    leaf_nodes[input * 2 + 1].expect("negative literal leaf must be wired")
                }
                _ => self.make_cplx_node(op, leaf_nodes, branch_info),
            };
            fanins.push(inode);
        }
        let node = self.make_prim_node(prim, fanins);
        for (ipos, op) in operands.iter().enumerate() {
            if let Expr::Lit { input, inverted: false } = op {
                if branch_info[*input].is_none() {
                    branch_info[*input] = Some(BranchInfo { node, ipos });
                }
            }
        }
        node
    }

    /// Freezes the builder: wires up fanouts, computes post-dominators, FFRs
    /// and MFFCs, generates the fault catalogue for `fault_type`, and collapses
    /// it down to representative faults.
    pub fn post_op(self) -> Result<NetworkRep> {
        let NetworkBuilder {
            fault_type,
            mut nodes,
            ppi,
            ppi_names,
            ppo,
            ppo_names,
            dff_inputs,
            dff_outputs,
            gate_types,
            mut gates,
        } = self;

        wire_fanouts(&mut nodes);
        let post_dom = compute_post_dominators(&nodes);
        for (i, dom) in post_dom.iter().enumerate() {
            nodes[i].set_imm_dom(*dom);
        }

        let (ffrs, ffr_map) = build_ffrs(&nodes);
        for (root, id) in &ffr_map {
            for &n in ffrs[id.index()].node_list() {
                nodes[n.index()].set_ffr_id(*id);
            }
            let _ = root;
        }
        let (mffcs, mffc_map) = build_mffcs(&nodes, &ffrs, &ffr_map);

        let dff_pairs: Vec<(NodeId, NodeId)> = dff_inputs
            .iter()
            .zip(dff_outputs.iter())
            .map(|(i, o)| {
                let i = i.ok_or_else(|| {
                    NetworkError::BuilderInvariant("dff missing input node".to_string())
                })?;
                let o = o.ok_or_else(|| {
                    NetworkError::BuilderInvariant("dff missing output node".to_string())
                })?;
                Ok((i, o))
            })
            .collect::<Result<Vec<_>>>()?;
        for &(i, o) in &dff_pairs {
            nodes[i.index()].set_alt_node(o);
            nodes[o.index()].set_alt_node(i);
        }

        let faults = generate_faults(&nodes, &gate_types, fault_type, &mut gates);
        let (faults, rep_fid_list) = collapse_representatives(faults, &gate_types, &gates, &nodes);

        let mut ppo2: Vec<NodeId> = ppo.clone();
        ppo2.sort_by_key(|&n| tfi_size(&nodes, n));
        let mut output_id2 = vec![0usize; ppo.len()];
        for (rank, &n) in ppo2.iter().enumerate() {
            let oid = nodes[n.index()].kind().output_id().unwrap();
            output_id2[oid] = rank;
        }
        for (oid, &n) in ppo.iter().enumerate() {
            nodes[n.index()].set_output_id2(output_id2[oid]);
        }

        Ok(NetworkRep {
            fault_type,
            nodes,
            ppi,
            ppi_names,
            ppo,
            ppo_names,
            ppo2,
            dff_pairs,
            gate_types,
            gates,
            ffrs,
            ffr_map,
            mffcs,
            mffc_map,
            faults,
            rep_fid_list,
        })
    }
}

fn wire_fanouts(nodes: &mut [NodeRep]) {
    let mut fanouts: Vec<Vec<NodeId>> = vec![Vec::new(); nodes.len()];
    for n in nodes.iter() {
        for &fi in n.fanin_list() {
            fanouts[fi.index()].push(n.id());
        }
    }
    for (n, fo) in nodes.iter_mut().zip(fanouts.into_iter()) {
        n.set_fanouts(fo);
    }
}

fn topological_order(nodes: &[NodeRep]) -> Vec<NodeId> {
    let mut indeg: Vec<usize> = nodes.iter().map(|n| n.fanin_num()).collect();
    let mut queue: Vec<NodeId> =
        (0..nodes.len()).filter(|&i| indeg[i] == 0).map(NodeId::new).collect();
    let mut order = Vec::with_capacity(nodes.len());
    let mut head = 0;
    while head < queue.len() {
        let n = queue[head];
        head += 1;
        order.push(n);
        for &fo in nodes[n.index()].fanout_list() {
            indeg[fo.index()] -= 1;
            if indeg[fo.index()] == 0 {
                queue.push(fo);
            }
        }
    }
    order
}

/// Post-dominators over the fanout DAG, with a virtual sink for nodes with no
/// fanout. Returns `None` for a node whose nearest true post-dominator is the
/// sink (i.e. it's on an unmerged path straight to an output).
fn compute_post_dominators(nodes: &[NodeRep]) -> Vec<Option<NodeId>> {
    let order = topological_order(nodes);
    let rev_order: Vec<NodeId> = order.into_iter().rev().collect();

    let mut rank: HashMap<Option<NodeId>, usize> = HashMap::new();
    rank.insert(None, 0);
    for (i, &n) in rev_order.iter().enumerate() {
        rank.insert(Some(n), i + 1);
    }

    let mut idom: HashMap<Option<NodeId>, Option<NodeId>> = HashMap::new();
    idom.insert(None, None);

    fn intersect(
        mut a: Option<NodeId>,
        mut b: Option<NodeId>,
        idom: &HashMap<Option<NodeId>, Option<NodeId>>,
        rank: &HashMap<Option<NodeId>, usize>,
    ) -> Option<NodeId> {
        while a != b {
            while rank[&a] < rank[&b] {
                a = idom[&a];
            }
            while rank[&b] < rank[&a] {
                b = idom[&b];
            }
        }
        a
    }

    for &n in &rev_order {
        let fanout = nodes[n.index()].fanout_list();
        let succs: Vec<Option<NodeId>> =
            if fanout.is_empty() { vec![None] } else { fanout.iter().map(|&f| Some(f)).collect() };
        let mut new_idom = succs[0];
        for &s in &succs[1..] {
            new_idom = intersect(new_idom, s, &idom, &rank);
        }
        idom.insert(Some(n), new_idom);
    }

    (0..nodes.len()).map(|i| idom[&Some(NodeId::new(i))]).collect()
}

fn build_ffrs(nodes: &[NodeRep]) -> (Vec<FfrRep>, HashMap<NodeId, FfrId>) {
    let mut ffrs = Vec::new();
    let mut ffr_map = HashMap::new();
    for n in nodes {
        if !n.is_ffr_root() {
            continue;
        }
        let root = n.id();
        let id = FfrId::new(ffrs.len());
        let mut node_list = vec![root];
        let mut inputs = Vec::new();
        let mut stack = vec![root];
        while let Some(cur) = stack.pop() {
            for &fi in nodes[cur.index()].fanin_list() {
                if nodes[fi.index()].fanout_num() == 1 {
                    node_list.push(fi);
                    stack.push(fi);
                } else {
                    inputs.push(fi);
                }
            }
        }
        inputs.sort_by_key(|n| n.index());
        inputs.dedup();
        node_list.sort_by_key(|n| n.index());
        ffr_map.insert(root, id);
        ffrs.push(FfrRep::new(id, root, inputs, node_list));
    }
    (ffrs, ffr_map)
}

fn mffc_root_of(nodes: &[NodeRep], mut n: NodeId) -> NodeId {
    while let Some(d) = nodes[n.index()].imm_dom() {
        n = d;
    }
    n
}

fn build_mffcs(
    nodes: &[NodeRep],
    ffrs: &[FfrRep],
    ffr_map: &HashMap<NodeId, FfrId>,
) -> (Vec<MffcRep>, HashMap<NodeId, MffcId>) {
    let mut groups: HashMap<NodeId, Vec<FfrId>> = HashMap::new();
    let mut group_order: Vec<NodeId> = Vec::new();
    for ffr in ffrs {
        let root = mffc_root_of(nodes, ffr.root());
        if !groups.contains_key(&root) {
            group_order.push(root);
        }
        groups.entry(root).or_default().push(ffr.id());
    }
    let _ = ffr_map;
    let mut mffcs = Vec::with_capacity(group_order.len());
    let mut mffc_map = HashMap::new();
    for root in group_order {
        let id = MffcId::new(mffcs.len());
        mffc_map.insert(root, id);
        mffcs.push(MffcRep::new(id, root, groups.remove(&root).unwrap()));
    }
    (mffcs, mffc_map)
}

fn tfi_size(nodes: &[NodeRep], root: NodeId) -> usize {
    let mut visited = VisitedSet::new(nodes.len());
    let mut stack = vec![root];
    visited.mark(root.index());
    let mut count = 0;
    while let Some(n) = stack.pop() {
        count += 1;
        for &fi in nodes[n.index()].fanin_list() {
            if visited.mark(fi.index()) {
                stack.push(fi);
            }
        }
    }
    count
}

fn generate_faults(
    nodes: &[NodeRep],
    gate_types: &[GateType],
    fault_type: FaultType,
    gates: &mut [GateRep],
) -> Vec<FaultRep> {
    let mut faults = Vec::new();
    for gi in 0..gates.len() {
        let gate_id = GateId::new(gi);
        let input_num = gates[gi].input_num();
        let output_node = gates[gi].output_node();
        match fault_type {
            FaultType::StuckAt => {
                for fv in [Fval2::Zero, Fval2::One] {
                    let id = FaultId::new(faults.len());
                    faults.push(FaultRep::new(id, gate_id, FaultKind::StemSa { fval: fv }, output_node));
                    gates[gi].set_stem_fault(fv, id);
                }
                for ipos in 0..input_num {
                    let origin = gates[gi].branch_info(ipos).node;
                    for fv in [Fval2::Zero, Fval2::One] {
                        let id = FaultId::new(faults.len());
                        faults.push(FaultRep::new(
                            id,
                            gate_id,
                            FaultKind::BranchSa { ipos, fval: fv },
                            origin,
                        ));
                        gates[gi].set_branch_fault(ipos, fv, id);
                    }
                }
            }
            FaultType::TransitionDelay => {
                for fv in [Fval2::Zero, Fval2::One] {
                    let id = FaultId::new(faults.len());
                    faults.push(FaultRep::new(id, gate_id, FaultKind::StemTd { fval: fv }, output_node));
                    gates[gi].set_stem_fault(fv, id);
                }
                for ipos in 0..input_num {
                    let origin = gates[gi].branch_info(ipos).node;
                    for fv in [Fval2::Zero, Fval2::One] {
                        let id = FaultId::new(faults.len());
                        faults.push(FaultRep::new(
                            id,
                            gate_id,
                            FaultKind::BranchTd { ipos, fval: fv },
                            origin,
                        ));
                        gates[gi].set_branch_fault(ipos, fv, id);
                    }
                }
            }
            FaultType::GateExhaustive => {
                if input_num > 0 {
                    for combo in 0..(1usize << input_num) {
                        let ivals: Vec<bool> =
                            (0..input_num).map(|b| (combo >> b) & 1 != 0).collect();
                        let id = FaultId::new(faults.len());
                        faults.push(FaultRep::new(
                            id,
                            gate_id,
                            FaultKind::Exhaustive { ivals: ivals.clone() },
                            output_node,
                        ));
                        gates[gi].set_ex_fault(&ivals, id);
                    }
                }
            }
        }
    }
    let _ = (nodes, gate_types);
    faults
}

/// Union-find collapse: controlling-value branch faults merge into their
/// gate's stem fault; the stem fault of a single-fanout node merges into the
/// corresponding branch fault of its sole successor.
fn collapse_representatives(
    mut faults: Vec<FaultRep>,
    gate_types: &[GateType],
    gates: &[GateRep],
    nodes: &[NodeRep],
) -> (Vec<FaultRep>, Vec<FaultId>) {
    let n = faults.len();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }
    fn union(parent: &mut [usize], a: usize, b: usize) {
        let (ra, rb) = (find(parent, a), find(parent, b));
        if ra != rb {
            // Lower id wins as representative, keeping the choice deterministic.
            let (rep, other) = if ra < rb { (ra, rb) } else { (rb, ra) };
            parent[other] = rep;
        }
    }

    for gate in gates {
        let gt = &gate_types[gate.gate_type_id().index()];
        if let Some(prim) = gt.primitive_type() {
            if let (Some(cval), Some(coval)) = (prim.cval(), prim.coval()) {
                let cval = Fval2::from_bool(cval);
                let coval = Fval2::from_bool(coval);
                if let Some(stem_id) = gate.stem_fault(coval) {
                    for ipos in 0..gate.input_num() {
                        if let Some(branch_id) = gate.branch_fault(ipos, cval) {
                            union(&mut parent, stem_id.index(), branch_id.index());
                        }
                    }
                }
            }
        }
    }

    for node in nodes {
        if node.fanout_num() != 1 {
            continue;
        }
        let gate_id = match node.gate_id() {
            Some(g) => g,
            None => continue,
        };
        let gate = &gates[gate_id.index()];
        let succ = node.fanout(0);
        let succ_gate_id = match nodes[succ.index()].gate_id() {
            Some(g) => g,
            None => continue,
        };
        let succ_gate = &gates[succ_gate_id.index()];
        let ipos = match (0..succ_gate.input_num()).find(|&p| succ_gate.input_node(p) == node.id())
        {
            Some(p) => p,
            None => continue,
        };
        let _ = succ;
        for fv in [Fval2::Zero, Fval2::One] {
            if let (Some(stem_id), Some(branch_id)) =
                (gate.stem_fault(fv), succ_gate.branch_fault(ipos, fv))
            {
                union(&mut parent, stem_id.index(), branch_id.index());
            }
        }
    }

    for i in 0..n {
        let rep = find(&mut parent, i);
        faults[i].set_rep_fault(FaultId::new(rep));
    }

    let mut rep_fid_list: Vec<FaultId> =
        (0..n).filter(|&i| faults[i].is_representative()).map(FaultId::new).collect();
    rep_fid_list.sort_by_key(|f| f.index());
    (faults, rep_fid_list)
}

/// The frozen, read-only netlist: nodes, gates, FFRs, MFFCs, and the fault
/// catalogue, plus traversal helpers used by the propagation encoders.
#[derive(Debug)]
pub struct NetworkRep {
    fault_type: FaultType,
    nodes: Vec<NodeRep>,
    ppi: Vec<NodeId>,
    ppi_names: Vec<String>,
    ppo: Vec<NodeId>,
    ppo_names: Vec<String>,
    ppo2: Vec<NodeId>,
    dff_pairs: Vec<(NodeId, NodeId)>,
    gate_types: Vec<GateType>,
    gates: Vec<GateRep>,
    ffrs: Vec<FfrRep>,
    ffr_map: HashMap<NodeId, FfrId>,
    mffcs: Vec<MffcRep>,
    mffc_map: HashMap<NodeId, MffcId>,
    faults: Vec<FaultRep>,
    rep_fid_list: Vec<FaultId>,
}

impl NetworkRep {
    pub fn node_num(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Result<&NodeRep> {
        self.nodes
            .get(id.index())
            .ok_or(NetworkError::NodeIdOutOfRange(id, self.nodes.len()))
    }

    pub fn node_list(&self) -> &[NodeRep] {
        &self.nodes
    }

    pub fn input_num(&self) -> usize {
        self.ppi.len() - self.dff_pairs.len()
    }

    pub fn ppi_num(&self) -> usize {
        self.ppi.len()
    }

    pub fn ppi(&self, id: usize) -> Result<NodeId> {
        self.ppi.get(id).copied().ok_or(NetworkError::PpiIdOutOfRange(id, self.ppi.len()))
    }

    pub fn ppi_name(&self, id: usize) -> Result<&str> {
        self.ppi_names
            .get(id)
            .map(String::as_str)
            .ok_or(NetworkError::PpiIdOutOfRange(id, self.ppi_names.len()))
    }

    pub fn ppi_list(&self) -> &[NodeId] {
        &self.ppi
    }

    pub fn output_num(&self) -> usize {
        self.ppo.len() - self.dff_pairs.len()
    }

    pub fn ppo_num(&self) -> usize {
        self.ppo.len()
    }

    pub fn ppo(&self, id: usize) -> Result<NodeId> {
        self.ppo.get(id).copied().ok_or(NetworkError::PpoIdOutOfRange(id, self.ppo.len()))
    }

    pub fn ppo_name(&self, id: usize) -> Result<&str> {
        self.ppo_names
            .get(id)
            .map(String::as_str)
            .ok_or(NetworkError::PpoIdOutOfRange(id, self.ppo_names.len()))
    }

    pub fn ppo_list(&self) -> &[NodeId] {
        &self.ppo
    }

    /// PPOs ordered by ascending TFI size; `output_id2` on each PPO node is the
    /// rank within this ordering.
    pub fn ppo2_list(&self) -> &[NodeId] {
        &self.ppo2
    }

    pub fn dff_num(&self) -> usize {
        self.dff_pairs.len()
    }

    pub fn dff_input(&self, id: DffId) -> Result<NodeId> {
        self.dff_pairs
            .get(id.index())
            .map(|p| p.0)
            .ok_or(NetworkError::DffIdOutOfRange(id.index(), self.dff_pairs.len()))
    }

    pub fn dff_output(&self, id: DffId) -> Result<NodeId> {
        self.dff_pairs
            .get(id.index())
            .map(|p| p.1)
            .ok_or(NetworkError::DffIdOutOfRange(id.index(), self.dff_pairs.len()))
    }

    pub fn gate_type(&self, id: GateTypeId) -> Result<&GateType> {
        self.gate_types
            .get(id.index())
            .ok_or(NetworkError::GateTypeIdOutOfRange(id, self.gate_types.len()))
    }

    pub fn gate_num(&self) -> usize {
        self.gates.len()
    }

    pub fn gate(&self, id: GateId) -> Result<&GateRep> {
        self.gates.get(id.index()).ok_or(NetworkError::GateIdOutOfRange(id, self.gates.len()))
    }

    pub fn gate_list(&self) -> &[GateRep] {
        &self.gates
    }

    pub fn fault_type(&self) -> FaultType {
        self.fault_type
    }

    pub fn fault(&self, id: FaultId) -> Result<&FaultRep> {
        self.faults.get(id.index()).ok_or(NetworkError::FaultIdOutOfRange(id, self.faults.len()))
    }

    pub fn fault_list(&self) -> &[FaultRep] {
        &self.faults
    }

    pub fn rep_fid_list(&self) -> &[FaultId] {
        &self.rep_fid_list
    }

    pub fn max_fault_id(&self) -> usize {
        self.faults.len()
    }

    pub fn ffr_num(&self) -> usize {
        self.ffrs.len()
    }

    pub fn ffr(&self, id: FfrId) -> Result<&FfrRep> {
        self.ffrs.get(id.index()).ok_or(NetworkError::FfrIdOutOfRange(id, self.ffrs.len()))
    }

    pub fn ffr_of(&self, node: NodeId) -> Option<&FfrRep> {
        let root = self.ffr_root(node);
        self.ffr_map.get(&root).and_then(|id| self.ffrs.get(id.index()))
    }

    pub fn ffr_list(&self) -> &[FfrRep] {
        &self.ffrs
    }

    pub fn mffc_num(&self) -> usize {
        self.mffcs.len()
    }

    pub fn mffc(&self, id: MffcId) -> Result<&MffcRep> {
        self.mffcs.get(id.index()).ok_or(NetworkError::MffcIdOutOfRange(id, self.mffcs.len()))
    }

    pub fn mffc_of(&self, node: NodeId) -> Option<&MffcRep> {
        let root = mffc_root_of(&self.nodes, node);
        self.mffc_map.get(&root).and_then(|id| self.mffcs.get(id.index()))
    }

    pub fn mffc_list(&self) -> &[MffcRep] {
        &self.mffcs
    }

    fn ffr_root(&self, mut n: NodeId) -> NodeId {
        while !self.nodes[n.index()].is_ffr_root() {
            n = self.nodes[n.index()].fanout(0);
        }
        n
    }

    /// Nodes transitively fed by `roots`, optionally stopping at `block`.
    pub fn get_tfo_list(&self, roots: &[NodeId], block: Option<NodeId>) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.get_tfo_list_with(roots, block, |n| out.push(n));
        out
    }

    pub fn get_tfo_list_with(
        &self,
        roots: &[NodeId],
        block: Option<NodeId>,
        mut op: impl FnMut(NodeId),
    ) {
        let mut visited = VisitedSet::new(self.nodes.len());
        let mut stack: Vec<NodeId> = Vec::new();
        for &r in roots {
            if visited.mark(r.index()) {
                stack.push(r);
            }
        }
        while let Some(n) = stack.pop() {
            op(n);
            if Some(n) == block {
                continue;
            }
            for &fo in self.nodes[n.index()].fanout_list() {
                if visited.mark(fo.index()) {
                    stack.push(fo);
                }
            }
        }
    }

    /// Nodes transitively feeding `roots`, inclusive.
    pub fn get_tfi_list(&self, roots: &[NodeId]) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.get_tfi_list_with(roots, |n| out.push(n));
        out
    }

    pub fn get_tfi_list_with(&self, roots: &[NodeId], mut op: impl FnMut(NodeId)) {
        let mut visited = VisitedSet::new(self.nodes.len());
        let mut stack: Vec<NodeId> = Vec::new();
        for &r in roots {
            if visited.mark(r.index()) {
                stack.push(r);
            }
        }
        while let Some(n) = stack.pop() {
            op(n);
            for &fi in self.nodes[n.index()].fanin_list() {
                if visited.mark(fi.index()) {
                    stack.push(fi);
                }
            }
        }
    }

    /// Depth-first traversal from `roots` along fanin edges, invoking
    /// `pre_func` on first visit and `post_func` once all of a node's fanins
    /// have been fully visited.
    pub fn dfs(
        &self,
        roots: &[NodeId],
        mut pre_func: impl FnMut(NodeId),
        mut post_func: impl FnMut(NodeId),
    ) {
        let mut visited = VisitedSet::new(self.nodes.len());
        let mut stack: Vec<(NodeId, usize)> = Vec::new();
        for &r in roots {
            if visited.mark(r.index()) {
                pre_func(r);
                stack.push((r, 0));
            }
            while let Some(&(n, idx)) = stack.last() {
                let fanin = self.nodes[n.index()].fanin_list();
                if idx < fanin.len() {
                    stack.last_mut().unwrap().1 += 1;
                    let fi = fanin[idx];
                    if visited.mark(fi.index()) {
                        pre_func(fi);
                        stack.push((fi, 0));
                    }
                } else {
                    post_func(n);
                    stack.pop();
                }
            }
        }
    }

    /// The side-input pins of `node` (every fanin but `excited_pos`) held to
    /// the node's non-controlling value, if it has one. Used by branch-fault
    /// excitation: the faulty value is injected at one input pin, but the
    /// other pins of the same physical node must still let it through.
    fn push_side_inputs(&self, node: &NodeRep, excited_pos: usize, time: u8, assigns: &mut Vec<Assign>) {
        if let Some(v) = node.nval().as_bool() {
            for (j, &fi) in node.fanin_list().iter().enumerate() {
                if j != excited_pos {
                    assigns.push(Assign::new(fi, time, v));
                }
            }
        }
    }

    /// The assignment(s) that excite a fault to a visible difference at its
    /// origin node. For a branch fault the excited pin is the *driver*
    /// feeding the branch position, not the branch node itself (that node is
    /// `origin_node`, where the resulting divergence is first observable).
    pub fn excitation_condition(&self, fault_id: FaultId) -> Result<AssignList> {
        let fault = self.fault(fault_id)?;
        let origin = fault.origin_node();
        let list = match fault.kind() {
            FaultKind::StemSa { fval } => {
                AssignList::from_sorted(vec![Assign::new(origin, 1, !fval.as_bool())])
            }
            FaultKind::BranchSa { ipos, fval } => {
                let gate = self.gate(fault.gate_id())?;
                let branch = gate.branch_info(*ipos);
                let node = self.node(branch.node)?;
                let driver = node.fanin(branch.ipos);
                let mut assigns = vec![Assign::new(driver, 1, !fval.as_bool())];
                self.push_side_inputs(node, branch.ipos, 1, &mut assigns);
                AssignList::from_sorted(assigns)
            }
            FaultKind::StemTd { fval } => AssignList::from_sorted(vec![
                Assign::new(origin, 0, fval.as_bool()),
                Assign::new(origin, 1, !fval.as_bool()),
            ]),
            FaultKind::BranchTd { ipos, fval } => {
                let gate = self.gate(fault.gate_id())?;
                let branch = gate.branch_info(*ipos);
                let node = self.node(branch.node)?;
                let driver = node.fanin(branch.ipos);
                let mut assigns = vec![
                    Assign::new(driver, 0, fval.as_bool()),
                    Assign::new(driver, 1, !fval.as_bool()),
                ];
                self.push_side_inputs(node, branch.ipos, 1, &mut assigns);
                AssignList::from_sorted(assigns)
            }
            FaultKind::Exhaustive { ivals } => {
                let gate = self.gate(fault.gate_id())?;
                let assigns: Vec<Assign> = ivals
                    .iter()
                    .enumerate()
                    .map(|(pos, &v)| Assign::new(gate.input_node(pos), 1, v))
                    .collect();
                AssignList::from_sorted(assigns)
            }
        };
        Ok(list)
    }

    /// The side-input assignments needed to carry the excited difference from
    /// `fault`'s origin node up to the root of its enclosing FFR.
    pub fn ffr_propagate_condition(&self, fault_id: FaultId) -> Result<AssignList> {
        let fault = self.fault(fault_id)?;
        let mut cur = fault.origin_node();
        let root = self.ffr_root(cur);
        let mut assigns = Vec::new();
        while cur != root {
            let succ = self.nodes[cur.index()].fanout(0);
            if let Some(gate_id) = self.nodes[succ.index()].gate_id() {
                let gate = self.gate(gate_id)?;
                let gt = self.gate_type(gate.gate_type_id())?;
                if let Some(prim) = gt.primitive_type() {
                    if let Some(nval) = prim.nval() {
                        for pos in 0..gate.input_num() {
                            if gate.input_node(pos) != cur {
                                assigns.push(Assign::new(gate.input_node(pos), 0, nval));
                            }
                        }
                    }
                }
            }
            cur = succ;
        }
        Ok(AssignList::from_sorted(assigns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_and2() -> NetworkRep {
        let mut b = NetworkBuilder::new(FaultType::StuckAt);
        b.set_size(2, 1, 0, 1, 0);
        let a = b.make_input_node("a");
        let c = b.make_input_node("b");
        let gt = b.make_gate_type_primitive(2, PrimType::And);
        let o = b.make_prim_node(PrimType::And, vec![a, c]);
        b.make_gate(gt, o, vec![BranchInfo { node: o, ipos: 0 }, BranchInfo { node: o, ipos: 1 }]);
        b.make_output_node("y", o);
        b.post_op().unwrap()
    }

    #[test]
    fn and2_network_has_expected_shape() {
        let net = build_and2();
        assert_eq!(net.input_num(), 2);
        assert_eq!(net.output_num(), 1);
        assert_eq!(net.gate_num(), 1);
        assert_eq!(net.ffr_num(), 1);
        assert_eq!(net.mffc_num(), 1);
    }

    #[test]
    fn stuck_at_fault_catalogue_has_stem_and_branch_faults() {
        let net = build_and2();
        // 2 stem + 2*2 branch = 6 raw faults before collapsing.
        assert_eq!(net.max_fault_id(), 6);
        assert!(!net.rep_fid_list().is_empty());
    }

    #[test]
    fn controlling_value_collapse_merges_branch_sa0_into_stem_sa0() {
        let net = build_and2();
        let gate = net.gate(GateId::new(0)).unwrap();
        let stem0 = gate.stem_fault(Fval2::Zero).unwrap();
        let branch0_0 = gate.branch_fault(0, Fval2::Zero).unwrap();
        assert_eq!(net.fault(stem0).unwrap().rep_fault(), net.fault(branch0_0).unwrap().rep_fault());
    }

    #[test]
    fn tfo_and_tfi_are_consistent_with_fanin_fanout() {
        let net = build_and2();
        let a = net.ppi(0).unwrap();
        let tfo = net.get_tfo_list(&[a], None);
        assert!(tfo.len() >= 2); // the AND gate and the output node
        let y = net.ppo(0).unwrap();
        let tfi = net.get_tfi_list(&[y]);
        assert!(tfi.contains(&a));
    }

    #[test]
    fn excitation_condition_for_stuck_at_zero_requires_one() {
        let net = build_and2();
        let gate = net.gate(GateId::new(0)).unwrap();
        let stem0 = gate.stem_fault(Fval2::Zero).unwrap();
        let cond = net.excitation_condition(stem0).unwrap();
        assert_eq!(cond.len(), 1);
        assert!(cond.iter().next().unwrap().val());
    }

    /// spec.md §8 scenario 3: `o = !(a·b + c)`, branch-sa0 on input `c`.
    /// After decomposition `c` is wired straight into the OR's second input
    /// (a single positive occurrence, no buffer needed), so its branch
    /// position resolves onto the OR node.
    #[test]
    fn aoi21_complex_gate_decomposition_resolves_branch_position_onto_or_node() {
        let mut b = NetworkBuilder::new(FaultType::StuckAt);
        b.set_size(3, 1, 0, 1, 2);
        let a = b.make_input_node("a");
        let bi = b.make_input_node("b");
        let c = b.make_input_node("c");
        let expr = Expr::Or(vec![
            Expr::And(vec![
                Expr::Lit { input: 0, inverted: false },
                Expr::Lit { input: 1, inverted: false },
            ]),
            Expr::Lit { input: 2, inverted: false },
        ]);
        let gt = b.make_gate_type_complex(3, expr);
        let gid = b.make_complex_gate(gt, vec![a, bi, c]);
        b.make_output_node("o", b.gate_output_node(gid));
        let net = b.post_op().unwrap();

        let gate = net.gate(gid).unwrap();
        assert_eq!(gate.input_num(), 3);
        // a and b each feed the AND node directly (single positive occurrence);
        // c feeds the OR node directly for the same reason.
        let or_node = gate.output_node();
        let branch_c = gate.branch_info(2);
        assert_eq!(branch_c.node, or_node);
        assert_eq!(net.node(or_node).unwrap().fanin_num(), 2);

        let branch0 = net.fault(gate.branch_fault(2, Fval2::Zero).unwrap()).unwrap();
        let cond = net.excitation_condition(branch0.id()).unwrap();
        // sa0 on input c excited by driving c=1, and (since OR's nval is X
        // for the other input) no side-input pin is forced.
        assert!(cond.iter().any(|a| a.node_id() == c && a.val()));
    }
}
