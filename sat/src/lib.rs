//! CNF encoders and SAT-based test generation for gate-level faults: the
//! `tpg_core` netlist feeds in, a `SatSolver` implementation feeds out test
//! patterns through `DtpgEngine`.

pub mod bs_enc;
pub mod cone_enc;
pub mod dominance;
pub mod dtpg;
pub mod ffr_enc;
pub mod gate_enc;
pub mod lit;
pub mod solver;

pub use bs_enc::BsEnc;
pub use cone_enc::{root_injection_for, BoolDiffEngine, ConeInfo, RootInjection, VidMap};
pub use dominance::{
    NaiveDomChecker, StructDomChecker, TrivialChecker1, TrivialChecker2, TrivialChecker3, XChecker,
};
pub use dtpg::{DtpgEngine, DtpgStatus};
pub use ffr_enc::{enumerate_det_cond, DetCond, FfrEnc};
pub use gate_enc::{calc_cnf_size, FaultInjection, FaultyGateEnc, GateEnc, VarMap};
pub use lit::{Lit, Var};
pub use solver::{ClauseDedup, DpllSolver, Model, SatResult, SatSolver};
