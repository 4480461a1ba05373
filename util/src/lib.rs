pub mod timing;
pub mod bitset;

pub use timing::TimingTree;
pub use bitset::VisitedSet;
