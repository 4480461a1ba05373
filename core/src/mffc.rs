//! `MffcRep`: a maximum fanout-free cone — the set of FFRs dominated by a
//! single root, all of which disappear together if the root is removed.
//!
//! Grounded on `original_source/c++-src/types/include/MFFCRep.h`.

use crate::ids::{FfrId, MffcId, NodeId};

#[derive(Clone, Debug)]
pub struct MffcRep {
    id: MffcId,
    root: NodeId,
    ffrs: Vec<FfrId>,
}

impl MffcRep {
    pub fn new(id: MffcId, root: NodeId, ffrs: Vec<FfrId>) -> Self {
        MffcRep { id, root, ffrs }
    }

    pub fn id(&self) -> MffcId {
        self.id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn ffr_num(&self) -> usize {
        self.ffrs.len()
    }

    pub fn ffr(&self, index: usize) -> FfrId {
        self.ffrs[index]
    }

    pub fn ffr_list(&self) -> &[FfrId] {
        &self.ffrs
    }
}
