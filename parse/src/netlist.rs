//! Shared front-end plumbing for the BLIF and ISCAS-89 readers: both produce
//! a flat, named intermediate form first, then this module topologically
//! orders it by signal dependency and replays it through
//! `tpg_core::NetworkBuilder` — the one place either format actually drives
//! the builder, so the two readers only differ in how they tokenize text.

use hashbrown::HashMap;

use tpg_core::{DffId, Expr, FaultType, GateTypeId, NetworkBuilder, NetworkRep, NodeId, PrimType};

use crate::error::{ParseError, Result};

/// What a `RawGate` realizes: a built-in primitive, or a factored expression
/// to be lowered via `NetworkBuilder::make_complex_gate`'s decomposition
/// rule (spec.md §4.2).
#[derive(Clone, Debug)]
pub(crate) enum GateSpec {
    Primitive(PrimType),
    Complex(Expr),
}

/// One named gate, still referring to its fanin by signal name rather than
/// `NodeId` — names are resolved once the dependency order is known.
#[derive(Clone, Debug)]
pub(crate) struct RawGate {
    pub line: usize,
    pub output: String,
    pub inputs: Vec<String>,
    pub spec: GateSpec,
}

/// The whole parsed netlist before any `NodeId` exists. `latches` pairs a
/// DFF's data-input signal name with its Q output signal name, matching
/// spec.md §6's "DFF name + (data-in ref, data-out ref) pairs".
#[derive(Clone, Debug, Default)]
pub(crate) struct RawNetlist {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub latches: Vec<(String, String)>,
    pub gates: Vec<RawGate>,
}

impl RawNetlist {
    pub fn new() -> Self {
        RawNetlist::default()
    }
}

/// Kahn's-algorithm topological sort of `net.gates` by signal dependency: a
/// gate depends on every other gate whose output name it reads as an input.
/// Primary inputs and DFF outputs are sources and never appear on the
/// right-hand side of a dependency edge, so feedback through a DFF (the
/// common sequential case) never looks like a combinational cycle.
fn topo_sort_gates(net: &RawNetlist) -> Result<Vec<usize>> {
    let mut producer: HashMap<&str, usize> = HashMap::new();
    for (i, g) in net.gates.iter().enumerate() {
        if producer.insert(g.output.as_str(), i).is_some() {
            return Err(ParseError::DuplicateSignal { line: g.line, name: g.output.clone() });
        }
    }

    let n = net.gates.len();
    let mut indeg = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, g) in net.gates.iter().enumerate() {
        for input in &g.inputs {
            if let Some(&producer_idx) = producer.get(input.as_str()) {
                indeg[i] += 1;
                dependents[producer_idx].push(i);
            }
        }
    }

    let mut queue: Vec<usize> = (0..n).filter(|&i| indeg[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    let mut head = 0;
    while head < queue.len() {
        let i = queue[head];
        head += 1;
        order.push(i);
        for &dep in &dependents[i] {
            indeg[dep] -= 1;
            if indeg[dep] == 0 {
                queue.push(dep);
            }
        }
    }

    if order.len() != n {
        let stuck = (0..n).find(|&i| indeg[i] != 0).expect("order short of n implies a stuck gate");
        return Err(ParseError::Syntax {
            line: net.gates[stuck].line,
            message: format!(
                "combinational cycle reaching signal `{}` (sequential feedback must go through a DFF)",
                net.gates[stuck].output
            ),
        });
    }
    Ok(order)
}

/// Replays a parsed `RawNetlist` through `NetworkBuilder` in dependency
/// order, producing a frozen `NetworkRep`.
pub(crate) fn build(net: RawNetlist, fault_type: FaultType) -> Result<NetworkRep> {
    let order = topo_sort_gates(&net)?;

    let mut builder = NetworkBuilder::new(fault_type);
    builder.set_size(net.inputs.len(), net.outputs.len(), net.latches.len(), net.gates.len(), 0);

    let mut signals: HashMap<String, NodeId> = HashMap::new();

    for name in &net.inputs {
        let node = builder.make_input_node(name.clone());
        if signals.insert(name.clone(), node).is_some() {
            return Err(ParseError::DuplicateSignal { line: 0, name: name.clone() });
        }
    }
    for (dff_idx, (_, q_name)) in net.latches.iter().enumerate() {
        let node = builder.make_dff_output_node(q_name.clone(), DffId::new(dff_idx));
        if signals.insert(q_name.clone(), node).is_some() {
            return Err(ParseError::DuplicateSignal { line: 0, name: q_name.clone() });
        }
    }

    for &gi in &order {
        let gate = &net.gates[gi];
        let fanin: Vec<NodeId> = gate
            .inputs
            .iter()
            .map(|name| {
                signals.get(name).copied().ok_or_else(|| ParseError::UndeclaredSignal {
                    line: gate.line,
                    name: name.clone(),
                })
            })
            .collect::<Result<_>>()?;
        let gate_type_id: GateTypeId = match &gate.spec {
            GateSpec::Primitive(prim) => builder.make_gate_type_primitive(fanin.len(), *prim),
            GateSpec::Complex(expr) => builder.make_gate_type_complex(fanin.len(), expr.clone()),
        };
        let gid = builder.make_complex_gate(gate_type_id, fanin);
        signals.insert(gate.output.clone(), builder.gate_output_node(gid));
    }

    for name in &net.outputs {
        let node = *signals
            .get(name)
            .ok_or_else(|| ParseError::UndeclaredSignal { line: 0, name: name.clone() })?;
        builder.make_output_node(name.clone(), node);
    }
    for (dff_idx, (d_name, q_name)) in net.latches.iter().enumerate() {
        let node = *signals
            .get(d_name)
            .ok_or_else(|| ParseError::UndeclaredSignal { line: 0, name: d_name.clone() })?;
        builder.make_dff_input_node(DffId::new(dff_idx), format!("{q_name}.d"), node);
    }

    Ok(builder.post_op()?)
}
