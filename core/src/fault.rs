//! `FaultRep`: one testable fault. Carries just enough to describe itself
//! (which gate, which pin, which stuck/transition value) — the node-structure
//! questions such as "what is the excitation condition" are answered by
//! `NetworkRep` since they need the surrounding fanin/dominance graph.
//!
//! Grounded on `original_source/c++-src/types/include/FaultRep.h`. The five
//! concrete subclasses there (`StemFault`/`BranchFault` crossed with
//! stuck-at/transition-delay, plus `ExFault`) become one `FaultKind` enum here.

use crate::ids::{FaultId, GateId, NodeId};
use crate::value::Fval2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FaultKind {
    StemSa { fval: Fval2 },
    BranchSa { ipos: usize, fval: Fval2 },
    StemTd { fval: Fval2 },
    BranchTd { ipos: usize, fval: Fval2 },
    Exhaustive { ivals: Vec<bool> },
}

impl FaultKind {
    pub fn is_stem(&self) -> bool {
        matches!(self, FaultKind::StemSa { .. } | FaultKind::StemTd { .. })
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, FaultKind::BranchSa { .. } | FaultKind::BranchTd { .. })
    }

    pub fn is_exhaustive(&self) -> bool {
        matches!(self, FaultKind::Exhaustive { .. })
    }

    pub fn branch_pos(&self) -> Option<usize> {
        match self {
            FaultKind::BranchSa { ipos, .. } | FaultKind::BranchTd { ipos, .. } => Some(*ipos),
            _ => None,
        }
    }

    pub fn fval(&self) -> Option<Fval2> {
        match self {
            FaultKind::StemSa { fval } | FaultKind::BranchSa { fval, .. } => Some(*fval),
            FaultKind::StemTd { fval } | FaultKind::BranchTd { fval, .. } => Some(*fval),
            FaultKind::Exhaustive { .. } => None,
        }
    }

    pub fn input_vals(&self) -> Option<&[bool]> {
        match self {
            FaultKind::Exhaustive { ivals } => Some(ivals),
            _ => None,
        }
    }

    pub fn is_transition_delay(&self) -> bool {
        matches!(self, FaultKind::StemTd { .. } | FaultKind::BranchTd { .. })
    }
}

/// A fault, attached to a gate and (through it) to the node that carries its
/// origin point of divergence.
#[derive(Clone, Debug)]
pub struct FaultRep {
    id: FaultId,
    gate_id: GateId,
    kind: FaultKind,
    origin_node: NodeId,
    /// `None` until representative-fault reduction runs; afterward every fault
    /// has a representative, `self.id` for faults that survive reduction.
    rep_fault: Option<FaultId>,
}

impl FaultRep {
    pub fn new(id: FaultId, gate_id: GateId, kind: FaultKind, origin_node: NodeId) -> Self {
        FaultRep { id, gate_id, kind, origin_node, rep_fault: None }
    }

    pub fn id(&self) -> FaultId {
        self.id
    }

    pub fn gate_id(&self) -> GateId {
        self.gate_id
    }

    pub fn kind(&self) -> &FaultKind {
        &self.kind
    }

    pub fn origin_node(&self) -> NodeId {
        self.origin_node
    }

    pub fn rep_fault(&self) -> FaultId {
        self.rep_fault.unwrap_or(self.id)
    }

    pub fn set_rep_fault(&mut self, rep: FaultId) {
        self.rep_fault = Some(rep);
    }

    pub fn is_representative(&self) -> bool {
        self.rep_fault.map(|r| r == self.id).unwrap_or(true)
    }

    pub fn name(&self) -> String {
        match &self.kind {
            FaultKind::StemSa { fval } => format!("{}:SA{}", self.gate_id, *fval as u8),
            FaultKind::BranchSa { ipos, fval } => {
                format!("{}:I{}/SA{}", self.gate_id, ipos, *fval as u8)
            }
            FaultKind::StemTd { fval } => format!("{}:TD{}", self.gate_id, *fval as u8),
            FaultKind::BranchTd { ipos, fval } => {
                format!("{}:I{}/TD{}", self.gate_id, ipos, *fval as u8)
            }
            FaultKind::Exhaustive { ivals } => {
                let bits: String = ivals.iter().map(|b| if *b { '1' } else { '0' }).collect();
                format!("{}:EX{}", self.gate_id, bits)
            }
        }
    }
}
