pub mod assign;
pub mod error;
pub mod fault;
pub mod ffr;
pub mod gate;
pub mod gate_type;
pub mod ids;
pub mod mffc;
pub mod network;
pub mod node;
pub mod testvector;
pub mod value;

pub use assign::{Assign, AssignList};
pub use error::{NetworkError, Result};
pub use fault::{FaultKind, FaultRep};
pub use ffr::FfrRep;
pub use gate::{BranchInfo, GateRep};
pub use gate_type::{Expr, GateType, PrimType};
pub use ids::{DffId, FaultId, FfrId, GateId, GateTypeId, MffcId, NodeId};
pub use mffc::MffcRep;
pub use network::{NetworkBuilder, NetworkRep};
pub use node::{NodeKind, NodeRep};
pub use testvector::{merge_all, BitVector, TestVector};
pub use value::{FaultType, Fval2, Val3};
