//! `NodeRep`: the per-node entity of the frozen netlist. Every `GateRep`
//! decomposes into one or more `NodeRep`s (a single one for a primitive gate, a
//! small tree for a complex gate); every `NodeRep` has an id in the dense
//! `NodeId` range and a fanin/fanout edge list.
//!
//! Grounded on `original_source/c++-src/types/include/NodeRep.h`.

use crate::gate_type::PrimType;
use crate::ids::{DffId, FfrId, GateId, NodeId};
use crate::value::Val3;

/// What role a node plays in the network beyond being a logic function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    PrimaryInput { input_id: usize },
    PrimaryOutput { output_id: usize },
    DffOutput { input_id: usize, dff_id: DffId },
    DffInput { output_id: usize, dff_id: DffId },
    Logic { prim: PrimType },
}

impl NodeKind {
    pub fn is_primary_input(&self) -> bool {
        matches!(self, NodeKind::PrimaryInput { .. })
    }

    pub fn is_primary_output(&self) -> bool {
        matches!(self, NodeKind::PrimaryOutput { .. })
    }

    pub fn is_dff_output(&self) -> bool {
        matches!(self, NodeKind::DffOutput { .. })
    }

    pub fn is_dff_input(&self) -> bool {
        matches!(self, NodeKind::DffInput { .. })
    }

    /// PPI: scan-visible input, either a true primary input or a DFF output.
    pub fn is_ppi(&self) -> bool {
        self.is_primary_input() || self.is_dff_output()
    }

    /// PPO: scan-visible output, either a true primary output or a DFF input.
    pub fn is_ppo(&self) -> bool {
        self.is_primary_output() || self.is_dff_input()
    }

    pub fn is_logic(&self) -> bool {
        matches!(self, NodeKind::Logic { .. })
    }

    pub fn input_id(&self) -> Option<usize> {
        match self {
            NodeKind::PrimaryInput { input_id } => Some(*input_id),
            NodeKind::DffOutput { input_id, .. } => Some(*input_id),
            _ => None,
        }
    }

    pub fn output_id(&self) -> Option<usize> {
        match self {
            NodeKind::PrimaryOutput { output_id } => Some(*output_id),
            NodeKind::DffInput { output_id, .. } => Some(*output_id),
            _ => None,
        }
    }

    pub fn dff_id(&self) -> Option<DffId> {
        match self {
            NodeKind::DffOutput { dff_id, .. } | NodeKind::DffInput { dff_id, .. } => {
                Some(*dff_id)
            }
            _ => None,
        }
    }
}

/// One node of the frozen netlist. Fanin/fanout are stored as node id edges;
/// dominance and FFR membership are filled in by `NetworkBuilder::freeze`.
#[derive(Clone, Debug)]
pub struct NodeRep {
    id: NodeId,
    kind: NodeKind,
    /// The gate this node belongs to, for nodes produced by a complex-gate
    /// decomposition as well as for plain primitive gates.
    gate_id: Option<GateId>,
    fanin: Vec<NodeId>,
    fanout: Vec<NodeId>,
    imm_dom: Option<NodeId>,
    ffr_id: Option<FfrId>,
    /// Output-id sorted by ascending TFI size; set once during freeze for PPO
    /// nodes only. See DESIGN.md Open Question decision on `output_id2`.
    output_id2: Option<usize>,
    alt_node: Option<NodeId>,
}

impl NodeRep {
    pub fn new(id: NodeId, kind: NodeKind, fanin: Vec<NodeId>) -> Self {
        NodeRep {
            id,
            kind,
            gate_id: None,
            fanin,
            fanout: Vec::new(),
            imm_dom: None,
            ffr_id: None,
            output_id2: None,
            alt_node: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn gate_id(&self) -> Option<GateId> {
        self.gate_id
    }

    pub fn set_gate_id(&mut self, gate_id: GateId) {
        self.gate_id = Some(gate_id);
    }

    pub fn fanin_num(&self) -> usize {
        self.fanin.len()
    }

    pub fn fanin(&self, index: usize) -> NodeId {
        self.fanin[index]
    }

    pub fn fanin_list(&self) -> &[NodeId] {
        &self.fanin
    }

    pub fn fanout_num(&self) -> usize {
        self.fanout.len()
    }

    pub fn fanout(&self, index: usize) -> NodeId {
        self.fanout[index]
    }

    pub fn fanout_list(&self) -> &[NodeId] {
        &self.fanout
    }

    pub fn set_fanouts(&mut self, fanout: Vec<NodeId>) {
        self.fanout = fanout;
    }

    /// An FFR root is a node with zero or more-than-one fanout; a single-fanout
    /// node always belongs to its sole successor's FFR.
    pub fn is_ffr_root(&self) -> bool {
        self.fanout.len() != 1
    }

    pub fn imm_dom(&self) -> Option<NodeId> {
        self.imm_dom
    }

    pub fn set_imm_dom(&mut self, dom: Option<NodeId>) {
        self.imm_dom = dom;
    }

    pub fn ffr_id(&self) -> Option<FfrId> {
        self.ffr_id
    }

    pub fn set_ffr_id(&mut self, ffr_id: FfrId) {
        self.ffr_id = Some(ffr_id);
    }

    pub fn output_id2(&self) -> Option<usize> {
        self.output_id2
    }

    pub fn set_output_id2(&mut self, id: usize) {
        self.output_id2 = Some(id);
    }

    pub fn alt_node(&self) -> Option<NodeId> {
        self.alt_node
    }

    pub fn set_alt_node(&mut self, node: NodeId) {
        self.alt_node = Some(node);
    }

    /// The gate function: `Buff` for a plain PPO/DFF-input wire, `None` for a
    /// PPI, or the actual primitive for a logic node.
    pub fn gate_type(&self) -> Option<PrimType> {
        match self.kind {
            NodeKind::Logic { prim } => Some(prim),
            NodeKind::PrimaryOutput { .. } | NodeKind::DffInput { .. } => Some(PrimType::Buff),
            _ => None,
        }
    }

    pub fn cval(&self) -> Val3 {
        self.gate_type()
            .and_then(PrimType::cval)
            .map(Val3::from_bool)
            .unwrap_or(Val3::X)
    }

    pub fn nval(&self) -> Val3 {
        self.gate_type()
            .and_then(PrimType::nval)
            .map(Val3::from_bool)
            .unwrap_or(Val3::X)
    }

    pub fn coval(&self) -> Val3 {
        self.gate_type()
            .and_then(PrimType::coval)
            .map(Val3::from_bool)
            .unwrap_or(Val3::X)
    }

    pub fn noval(&self) -> Val3 {
        self.gate_type()
            .and_then(PrimType::noval)
            .map(Val3::from_bool)
            .unwrap_or(Val3::X)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ppi_ppo_classification() {
        let n = NodeRep::new(NodeId::new(0), NodeKind::PrimaryInput { input_id: 0 }, vec![]);
        assert!(n.kind().is_ppi());
        assert!(!n.kind().is_ppo());

        let n = NodeRep::new(
            NodeId::new(1),
            NodeKind::DffInput { output_id: 0, dff_id: DffId::new(0) },
            vec![NodeId::new(0)],
        );
        assert!(n.kind().is_ppo());
        assert!(n.kind().is_dff_input());
    }

    #[test]
    fn and_node_cval_is_zero() {
        let n = NodeRep::new(
            NodeId::new(2),
            NodeKind::Logic { prim: PrimType::And },
            vec![NodeId::new(0), NodeId::new(1)],
        );
        assert_eq!(n.cval(), Val3::Zero);
        assert_eq!(n.coval(), Val3::Zero);
    }

    #[test]
    fn ffr_root_detection_depends_on_fanout_count() {
        let mut n = NodeRep::new(NodeId::new(0), NodeKind::PrimaryInput { input_id: 0 }, vec![]);
        assert!(n.is_ffr_root());
        n.set_fanouts(vec![NodeId::new(1)]);
        assert!(!n.is_ffr_root());
        n.set_fanouts(vec![NodeId::new(1), NodeId::new(2)]);
        assert!(n.is_ffr_root());
    }
}
