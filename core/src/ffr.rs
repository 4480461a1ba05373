//! `FfrRep`: a fanout-free region — a maximal connected subgraph with a single
//! exit edge, used as the propagation unit for `FFREnc`.
//!
//! Grounded on `original_source/c++-src/types/include/FFRRep.h`.

use crate::ids::{FfrId, NodeId};

#[derive(Clone, Debug)]
pub struct FfrRep {
    id: FfrId,
    root: NodeId,
    inputs: Vec<NodeId>,
    nodes: Vec<NodeId>,
}

impl FfrRep {
    pub fn new(id: FfrId, root: NodeId, inputs: Vec<NodeId>, nodes: Vec<NodeId>) -> Self {
        FfrRep { id, root, inputs, nodes }
    }

    pub fn id(&self) -> FfrId {
        self.id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn input_num(&self) -> usize {
        self.inputs.len()
    }

    pub fn input(&self, index: usize) -> NodeId {
        self.inputs[index]
    }

    pub fn input_list(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn node_num(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, index: usize) -> NodeId {
        self.nodes[index]
    }

    pub fn node_list(&self) -> &[NodeId] {
        &self.nodes
    }
}
