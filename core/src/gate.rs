//! `GateRep`: the user-visible gate, as opposed to the `NodeRep`s it may
//! decompose into. A primitive gate is exactly one node; a complex gate is an
//! output node plus a tree of branch nodes, one per literal occurrence in its
//! `Expr`.
//!
//! Grounded on `original_source/c++-src/types/include/GateRep.h`.

use crate::gate_type::{GateType, PrimType};
use crate::ids::{FaultId, GateId, GateTypeId, NodeId};
use crate::value::{Fval2, Val3};

/// Where one logical input of a gate physically lives: the node that carries
/// it, and which of that node's own inputs it occupies. For a primitive gate
/// `ipos` is the position directly on the output node; for a complex gate it
/// may be several levels down the decomposition tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BranchInfo {
    pub node: NodeId,
    pub ipos: usize,
}

/// Per-gate storage for the faults collapsed onto it, indexed the way the
/// reference implementation lays its flat `mFaultArray` out: branch stuck-at
/// faults at `2*ipos + fval`, the stem pair at `2*input_num`, and (for
/// gate-exhaustive faults) one slot per input-value combination.
#[derive(Clone, Debug)]
struct FaultSlots {
    input_num: usize,
    branch_and_stem: Vec<Option<FaultId>>,
    exhaustive: Vec<Option<FaultId>>,
}

impl FaultSlots {
    fn new(input_num: usize, exhaustive_size: usize) -> Self {
        FaultSlots {
            input_num,
            branch_and_stem: vec![None; input_num * 2 + 2],
            exhaustive: vec![None; exhaustive_size],
        }
    }

    fn stem_index(&self, fval: Fval2) -> usize {
        self.input_num * 2 + if fval == Fval2::One { 1 } else { 0 }
    }

    fn branch_index(&self, ipos: usize, fval: Fval2) -> usize {
        ipos * 2 + if fval == Fval2::One { 1 } else { 0 }
    }

    fn ex_index(ivals: &[bool]) -> usize {
        ivals
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(i, _)| 1usize << i)
            .sum()
    }
}

/// A user-visible gate: a catalogue reference plus the set of branch nodes
/// realizing each of its logical inputs, and the fault slots collapsed onto it.
#[derive(Clone, Debug)]
pub struct GateRep {
    id: GateId,
    gate_type_id: GateTypeId,
    output_node: NodeId,
    branches: Vec<BranchInfo>,
    faults: FaultSlots,
}

impl GateRep {
    pub fn new(
        id: GateId,
        gate_type_id: GateTypeId,
        gate_type: &GateType,
        output_node: NodeId,
        branches: Vec<BranchInfo>,
    ) -> Self {
        let input_num = gate_type.input_num();
        let exhaustive_size = if input_num == 0 { 0 } else { 1usize << input_num };
        GateRep {
            id,
            gate_type_id,
            output_node,
            branches,
            faults: FaultSlots::new(input_num, exhaustive_size),
        }
    }

    pub fn id(&self) -> GateId {
        self.id
    }

    pub fn gate_type_id(&self) -> GateTypeId {
        self.gate_type_id
    }

    pub fn output_node(&self) -> NodeId {
        self.output_node
    }

    pub fn input_num(&self) -> usize {
        self.branches.len()
    }

    pub fn input_node(&self, pos: usize) -> NodeId {
        self.branches[pos].node
    }

    pub fn branch_info(&self, pos: usize) -> BranchInfo {
        self.branches[pos]
    }

    pub fn branch_infos(&self) -> &[BranchInfo] {
        &self.branches
    }

    /// The output value produced when input `pos` is driven to `val`, ignoring
    /// other inputs; `Val3::X` when the gate's function doesn't pin the output
    /// from a single input alone (XOR/XNOR) or `val` isn't the controlling value.
    pub fn cval(&self, prim: PrimType, pos: usize, val: Val3) -> Val3 {
        let _ = pos;
        match (prim.cval(), prim.coval(), val.as_bool()) {
            (Some(c), Some(co), Some(v)) if v == c => Val3::from_bool(co),
            _ => Val3::X,
        }
    }

    pub fn set_stem_fault(&mut self, fval: Fval2, fault: FaultId) {
        let idx = self.faults.stem_index(fval);
        self.faults.branch_and_stem[idx] = Some(fault);
    }

    pub fn set_branch_fault(&mut self, ipos: usize, fval: Fval2, fault: FaultId) {
        let idx = self.faults.branch_index(ipos, fval);
        self.faults.branch_and_stem[idx] = Some(fault);
    }

    pub fn set_ex_fault(&mut self, ivals: &[bool], fault: FaultId) {
        let idx = FaultSlots::ex_index(ivals);
        self.faults.exhaustive[idx] = Some(fault);
    }

    pub fn stem_fault(&self, fval: Fval2) -> Option<FaultId> {
        self.faults.branch_and_stem[self.faults.stem_index(fval)]
    }

    pub fn branch_fault(&self, ipos: usize, fval: Fval2) -> Option<FaultId> {
        self.faults.branch_and_stem[self.faults.branch_index(ipos, fval)]
    }

    pub fn ex_fault(&self, ivals: &[bool]) -> Option<FaultId> {
        self.faults.exhaustive[FaultSlots::ex_index(ivals)]
    }
}
