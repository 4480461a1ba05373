//! BLIF and ISCAS-89 (`.bench`) netlist readers. Each produces a frozen
//! `tpg_core::NetworkRep` built entirely through `tpg_core`'s public
//! `NetworkBuilder` API; neither format has its own notion of fault model,
//! so callers pick the `FaultType` the resulting network is catalogued
//! under.

pub mod blif;
pub mod error;
pub mod iscas89;
mod netlist;

pub use blif::read_blif;
pub use error::{ParseError, Result};
pub use iscas89::read_iscas89;
