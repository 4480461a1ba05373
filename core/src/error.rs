use crate::ids::{FaultId, FfrId, GateId, GateTypeId, MffcId, NodeId};
use thiserror::Error;

/// Errors raised while populating a `NetworkBuilder` or querying a frozen
/// `NetworkRep`. Range checks mirror the `_check_*_id` helpers on the C++
/// side, which throw `std::out_of_range`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("node id {0} out of range (node_num = {1})")]
    NodeIdOutOfRange(NodeId, usize),
    #[error("gate id {0} out of range (gate_num = {1})")]
    GateIdOutOfRange(GateId, usize),
    #[error("gate type id {0} out of range (gate_type_num = {1})")]
    GateTypeIdOutOfRange(GateTypeId, usize),
    #[error("ffr id {0} out of range (ffr_num = {1})")]
    FfrIdOutOfRange(FfrId, usize),
    #[error("mffc id {0} out of range (mffc_num = {1})")]
    MffcIdOutOfRange(MffcId, usize),
    #[error("fault id {0} out of range (max_fault_id = {1})")]
    FaultIdOutOfRange(FaultId, usize),
    #[error("ppi id {0} out of range (ppi_num = {1})")]
    PpiIdOutOfRange(usize, usize),
    #[error("ppo id {0} out of range (ppo_num = {1})")]
    PpoIdOutOfRange(usize, usize),
    #[error("dff id {0} out of range (dff_num = {1})")]
    DffIdOutOfRange(usize, usize),
    #[error("network builder invariant violated: {0}")]
    BuilderInvariant(String),
    #[error("gate {0} references an input position {1} beyond its declared arity {2}")]
    BranchPositionOutOfRange(GateId, usize, usize),
}

pub type Result<T> = std::result::Result<T, NetworkError>;
