//! Fault-dominance and equivalence checking: deciding whether every test that
//! detects one fault necessarily detects another, so the weaker fault can be
//! dropped from the catalogue before pattern generation.
//!
//! Grounded on `original_source/c++-src/minpat/NaiveDomChecker.cc`,
//! `StructDomChecker.cc`, `XChecker.cc` and `c++-src/reducer/TrivialChecker1.cc`
//! (spec.md §4.7): four checkers trading precision for speed, meant to run in
//! that order — cheap structural necessary conditions first, the exact SAT
//! check only when they can't decide.

use tpg_core::{AssignList, FaultId, NetworkRep, NodeId, Result};

use crate::cone_enc::{encode_good, ConeInfo, VidMap};
use crate::ffr_enc::FfrEnc;
use crate::gate_enc::add_gate_clauses;
use crate::lit::Lit;
use crate::solver::{DpllSolver, SatResult, SatSolver};

/// Collects a fault's TFO together with its own PPO sublist, in one pass.
fn tfo_and_ppos(network: &NetworkRep, root: NodeId) -> (Vec<NodeId>, Vec<NodeId>) {
    let mut tfo = Vec::new();
    let mut ppo = Vec::new();
    network.get_tfo_list_with(&[root], None, |n| {
        tfo.push(n);
        if network.node(n).map(|r| r.kind().is_ppo()).unwrap_or(false) {
            ppo.push(n);
        }
    });
    (tfo, ppo)
}

/// Exact dominance check by direct SAT encoding, reusing `cone_enc`'s
/// good/faulty/d-chain building blocks over a single shared good-circuit
/// variable map spanning both faults' cones.
///
/// `fault1` dominates `fault2` iff no pattern detects `fault1` while leaving
/// `fault2` undetected — i.e. "detect fault1 and not fault2" is UNSAT.
pub struct NaiveDomChecker<'a> {
    network: &'a NetworkRep,
}

impl<'a> NaiveDomChecker<'a> {
    pub fn new(network: &'a NetworkRep) -> Self {
        NaiveDomChecker { network }
    }

    pub fn dominates(&self, fault1: FaultId, fault2: FaultId) -> Result<bool> {
        let network = self.network;
        let f1 = network.fault(fault1)?;
        let f2 = network.fault(fault2)?;
        let root1 = f1.origin_node();
        let root2 = f2.origin_node();

        let (tfo1, ppo1) = tfo_and_ppos(network, root1);
        let (tfo2, ppo2) = tfo_and_ppos(network, root2);

        let mut combined_roots: Vec<NodeId> = Vec::with_capacity(tfo1.len() + tfo2.len());
        combined_roots.extend_from_slice(&tfo1);
        combined_roots.extend_from_slice(&tfo2);

        let mut dff_inputs = Vec::new();
        let mut tfi_list = Vec::new();
        network.get_tfi_list_with(&combined_roots, |n| {
            tfi_list.push(n);
            if let Ok(node) = network.node(n) {
                if node.kind().is_dff_output() {
                    if let Some(alt) = node.alt_node() {
                        dff_inputs.push(alt);
                    }
                }
            }
        });

        let mut solver = DpllSolver::new();

        // Shared good circuit. fvar_map1 comes along for free (encode_good
        // ties it to gvar over the shared TFI); fvar_map2 is built by copying
        // those same literals, matching how the reference checker sets
        // mGvarMap/mFvarMap1/mFvarMap2 to the same variable in one pass.
        let mut gvar_map = VidMap::new();
        let mut fvar_map1 = VidMap::new();
        let shared_info =
            ConeInfo { root: root1, tfi_list: tfi_list.clone(), tfo_list: Vec::new(), ppo_list: Vec::new() };
        encode_good(&mut solver, network, &shared_info, &mut gvar_map, &mut fvar_map1);
        let mut fvar_map2 = VidMap::new();
        for &n in &tfi_list {
            fvar_map2.set(n, gvar_map.lit(n));
        }

        // Previous-frame variables, needed only if a transition-delay fault's
        // excitation condition or a DFF boundary reaches back a frame. Both
        // roots sit in `tfi_list` themselves (they seed the TFI walk as part
        // of `combined_roots`), so if either is a DFF output its alt node is
        // already in `dff_inputs` by the time we get here.
        let has_prev = !dff_inputs.is_empty();
        let mut hvar_map = VidMap::new();
        if has_prev {
            let mut prev_roots = dff_inputs.clone();
            if let Some(alt) = network.node(root1)?.alt_node() {
                prev_roots.push(alt);
            }
            if let Some(alt) = network.node(root2)?.alt_node() {
                prev_roots.push(alt);
            }
            prev_roots.push(root1);
            prev_roots.push(root2);
            let prev_tfi = network.get_tfi_list(&prev_roots);
            for &n in &prev_tfi {
                hvar_map.set(n, solver.new_var().pos_lit());
            }
            for &n in &prev_tfi {
                let node = network.node(n)?;
                let Some(prim) = node.gate_type() else { continue };
                let olit = hvar_map.lit(n);
                let ilits: Vec<Lit> = node.fanin_list().iter().map(|&fi| hvar_map.lit(fi)).collect();
                add_gate_clauses(&mut solver, prim, olit, &ilits);
            }
            for &din in &dff_inputs {
                let dout = network.node(din)?.alt_node().expect("dff input has a paired output");
                let hlit = hvar_map.lit(din);
                let glit = gvar_map.lit(dout);
                solver.add_clause(&[!glit, hlit]);
                solver.add_clause(&[glit, !hlit]);
            }
        }

        let excite_lit = |n: NodeId, time: u8| -> Lit {
            if time == 0 && has_prev {
                hvar_map.lit(n)
            } else {
                gvar_map.lit(n)
            }
        };

        // Faulty circuit 1: fresh variables over its whole TFO, forced
        // detected via the d-chain's closing clauses.
        let mut fvar1 = VidMap::new();
        for &n in &tfo1 {
            fvar1.set(n, solver.new_var().pos_lit());
        }
        for &n in &tfo1 {
            if n == root1 {
                continue;
            }
            let node = network.node(n)?;
            let Some(prim) = node.gate_type() else { continue };
            let olit = fvar1.lit(n);
            let ilits: Vec<Lit> = node.fanin_list().iter().map(|&fi| fvar1.lit(fi)).collect();
            add_gate_clauses(&mut solver, prim, olit, &ilits);
        }
        tie_root_to_excitation(&mut solver, network, fault1, gvar_map.lit(root1), fvar1.lit(root1), &excite_lit);
        encode_dchain_detected(&mut solver, network, root1, &tfo1, &ppo1, &gvar_map, &fvar1);

        // Faulty circuit 2: fresh variables over its whole TFO, forced
        // *not* observable at any of its own PPOs.
        let mut fvar2 = VidMap::new();
        for &n in &tfo2 {
            fvar2.set(n, solver.new_var().pos_lit());
        }
        for &n in &tfo2 {
            if n == root2 {
                continue;
            }
            let node = network.node(n)?;
            let Some(prim) = node.gate_type() else { continue };
            let olit = fvar2.lit(n);
            let ilits: Vec<Lit> = node.fanin_list().iter().map(|&fi| fvar2.lit(fi)).collect();
            add_gate_clauses(&mut solver, prim, olit, &ilits);
        }
        tie_root_to_excitation(&mut solver, network, fault2, gvar_map.lit(root2), fvar2.lit(root2), &excite_lit);
        for &n in &ppo2 {
            let glit = gvar_map.lit(n);
            let flit = fvar2.lit(n);
            solver.add_clause(&[glit, !flit]);
            solver.add_clause(&[!glit, flit]);
        }

        Ok(solver.solve(&[]) == SatResult::Unsat)
    }
}

/// `flit <=> glit XOR excited`, where `excited` is the conjunction of the
/// fault's excitation-condition literals. Forces divergence at the origin
/// exactly when the fault's own condition holds, exactly matching a constant
/// stuck/transition value without special-casing the fault kind here.
fn tie_root_to_excitation(
    solver: &mut impl SatSolver,
    network: &NetworkRep,
    fault: FaultId,
    glit: Lit,
    flit: Lit,
    excite_lit: &impl Fn(NodeId, u8) -> Lit,
) {
    let Ok(cond) = network.excitation_condition(fault) else { return };
    let dlit = solver.new_var().pos_lit();
    solver.add_clause(&[!glit, flit, dlit]);
    solver.add_clause(&[glit, !flit, dlit]);
    solver.add_clause(&[!glit, !flit, !dlit]);
    solver.add_clause(&[glit, flit, !dlit]);

    let mut all_true = Vec::with_capacity(cond.len() + 1);
    for a in cond.iter() {
        let lit = excite_lit(a.node_id(), a.time());
        let lit = if a.val() { lit } else { !lit };
        solver.add_clause(&[lit, !dlit]);
        all_true.push(!lit);
    }
    all_true.push(dlit);
    solver.add_clause(&all_true);
}

/// D-chain propagation for a cone already known to need forced detection:
/// identical to `cone_enc::encode_dchain` but taking the TFO/PPO lists
/// directly instead of through a `ConeInfo`, since fault1's here spans only
/// its own cone rather than the checker's shared TFI.
fn encode_dchain_detected(
    solver: &mut impl SatSolver,
    network: &NetworkRep,
    root: NodeId,
    tfo_list: &[NodeId],
    ppo_list: &[NodeId],
    gvar_map: &VidMap,
    fvar_map: &VidMap,
) {
    let mut dvar_map = VidMap::new();
    for &n in tfo_list {
        dvar_map.set(n, solver.new_var().pos_lit());
    }
    for &n in tfo_list {
        let node = network.node(n).expect("tfo node exists");
        let glit = gvar_map.lit(n);
        let flit = fvar_map.lit(n);
        let dlit = dvar_map.lit(n);

        solver.add_clause(&[!glit, !flit, !dlit]);
        solver.add_clause(&[glit, flit, !dlit]);

        if node.kind().is_ppo() {
            solver.add_clause(&[!glit, flit, dlit]);
            solver.add_clause(&[glit, !flit, dlit]);
            continue;
        }

        let fanout = node.fanout_list();
        if fanout.len() == 1 {
            let odlit = dvar_map.lit(fanout[0]);
            solver.add_clause(&[!dlit, odlit]);
        } else {
            let mut tmp: Vec<Lit> = fanout.iter().map(|&fo| dvar_map.lit(fo)).collect();
            tmp.push(!dlit);
            solver.add_clause(&tmp);

            if let Some(dom) = node.imm_dom() {
                let odlit = dvar_map.lit(dom);
                solver.add_clause(&[!dlit, odlit]);
            }
        }
    }

    let odiff: Vec<Lit> = ppo_list.iter().map(|&n| dvar_map.lit(n)).collect();
    solver.add_clause(&odiff);

    let root_node = network.node(root).expect("root exists");
    if !root_node.kind().is_ppo() {
        solver.add_clause(&[dvar_map.lit(root)]);
    }
}

/// Structural necessary condition for dominance, cheap enough to run over
/// every fault pair before falling back to `NaiveDomChecker`: `fault1` cannot
/// dominate `fault2` unless `fault2`'s origin lies on some path from
/// `fault1`'s origin to a primary output (dominance can only flow downstream).
///
/// Grounded on `original_source/c++-src/minpat/StructDomChecker.cc`, which
/// rules out the overwhelming majority of unrelated pairs by a single TFO
/// membership test before any SAT call.
pub struct StructDomChecker<'a> {
    network: &'a NetworkRep,
}

impl<'a> StructDomChecker<'a> {
    pub fn new(network: &'a NetworkRep) -> Self {
        StructDomChecker { network }
    }

    /// `false` means "definitely not dominant", a structural proof requiring
    /// no SAT call; `true` means "can't rule it out", fall through to an
    /// exact checker.
    pub fn may_dominate(&self, fault1: FaultId, fault2: FaultId) -> Result<bool> {
        let f1 = self.network.fault(fault1)?;
        let f2 = self.network.fault(fault2)?;
        let root1 = f1.origin_node();
        let root2 = f2.origin_node();
        if root1 == root2 {
            return Ok(true);
        }
        let tfo1 = self.network.get_tfo_list(&[root1], None);
        Ok(tfo1.contains(&root2))
    }
}

/// Fault-equivalence test: `fault1` and `fault2` are equivalent iff each
/// dominates the other, i.e. every test detects both or neither.
///
/// Grounded on `original_source/c++-src/minpat/XChecker.cc`.
pub struct XChecker<'a> {
    network: &'a NetworkRep,
}

impl<'a> XChecker<'a> {
    pub fn new(network: &'a NetworkRep) -> Self {
        XChecker { network }
    }

    pub fn equivalent(&self, fault1: FaultId, fault2: FaultId) -> Result<bool> {
        let checker = NaiveDomChecker::new(self.network);
        Ok(checker.dominates(fault1, fault2)? && checker.dominates(fault2, fault1)?)
    }
}

/// Single-pattern dominance screen: if some already-generated test vector
/// detects `fault1` but not `fault2`, `fault1` cannot dominate `fault2` and
/// the pair can be dropped without a SAT call at all.
///
/// Grounded on `original_source/c++-src/reducer/TrivialChecker1.cc`, the
/// cheapest of the three trivial checkers — it answers from simulation
/// results the fault simulator already computed, never touching the solver.
pub struct TrivialChecker1;

impl TrivialChecker1 {
    /// `detected_by(id)` reports whether the fault with that id is detected
    /// by the test vector under consideration (e.g. a `DiffBits` lookup from
    /// a prior `ppsfp` run). Returns `false` the instant a single counter
    /// example pattern is found; callers fold this over every available
    /// pattern and only fall back to an exact checker once no pattern rules
    /// the pair out.
    pub fn may_dominate(
        fault1: FaultId,
        fault2: FaultId,
        detected_by: impl Fn(FaultId) -> bool,
    ) -> bool {
        !detected_by(fault1) || detected_by(fault2)
    }
}

/// Builds the shared good-circuit variables an FFR-local trivial checker
/// needs: one per node in the TFI of the FFR root together with whatever
/// nodes the supplied condition list touches, so the condition's literals and
/// the FFR's propagation handle can be asserted as assumptions in one solve.
fn encode_ffr_support(
    solver: &mut impl SatSolver,
    network: &NetworkRep,
    ffr_root: NodeId,
    cond: &AssignList,
) -> VidMap {
    let mut roots = vec![ffr_root];
    roots.extend(cond.iter().map(|a| a.node_id()));
    let tfi_list = network.get_tfi_list(&roots);
    let info = ConeInfo { root: ffr_root, tfi_list, tfo_list: Vec::new(), ppo_list: Vec::new() };
    let mut gvar = VidMap::new();
    let mut fvar = VidMap::new();
    encode_good(solver, network, &info, &mut gvar, &mut fvar);
    gvar
}

fn cond_literals(gvar: &VidMap, cond: &AssignList) -> Vec<Lit> {
    cond.iter()
        .map(|a| {
            let lit = gvar.lit(a.node_id());
            if a.val() {
                lit
            } else {
                !lit
            }
        })
        .collect()
}

/// Mixed dominance screen: one side is `fault1`'s own FFR-local propagation
/// variable (cheap, shared across every fault rooted in the same FFR), the
/// other is an externally supplied condition list for `fault2` (e.g. its
/// excitation condition). Checking "`fault1` propagates within its FFR and
/// `fault2`'s condition holds" for UNSAT answers whether the first forces the
/// second to fail, without re-deriving either fault's full TFO cone.
///
/// Grounded on `original_source/c++-src/reducer/TrivialChecker2.cc`.
pub struct TrivialChecker2<'a> {
    network: &'a NetworkRep,
}

impl<'a> TrivialChecker2<'a> {
    pub fn new(network: &'a NetworkRep) -> Self {
        TrivialChecker2 { network }
    }

    /// `true` iff no pattern can both propagate `fault1` to its own FFR root
    /// and satisfy `cond2`.
    pub fn check(&self, fault1: FaultId, cond2: &AssignList) -> Result<bool> {
        let network = self.network;
        let fault = network.fault(fault1)?;
        let ffr_id = network
            .node(fault.origin_node())?
            .ffr_id()
            .expect("a fault's origin node always belongs to some ffr");
        let ffr = network.ffr(ffr_id)?;

        let mut solver = DpllSolver::new();
        let gvar = encode_ffr_support(&mut solver, network, ffr.root(), cond2);
        let prop = FfrEnc::new(network).encode(&mut solver, &gvar, ffr, None, &[fault1]);
        let Some(handle) = prop.fault_pv(fault1) else {
            return Ok(false);
        };

        let mut assumptions = vec![handle];
        assumptions.extend(cond_literals(&gvar, cond2));
        Ok(solver.solve(&assumptions) == SatResult::Unsat)
    }
}

/// The other mixed variant: the condition list (`cond1`) belongs to `fault1`,
/// and the propagation variable belongs to `fault2`'s own FFR. Checking
/// "`cond1` holds and `fault2` does *not* propagate" for UNSAT shows `cond1`
/// forces `fault2`'s detection.
///
/// Grounded on `original_source/c++-src/reducer/TrivialChecker3.cc`.
pub struct TrivialChecker3<'a> {
    network: &'a NetworkRep,
}

impl<'a> TrivialChecker3<'a> {
    pub fn new(network: &'a NetworkRep) -> Self {
        TrivialChecker3 { network }
    }

    /// `true` iff every pattern satisfying `cond1` necessarily propagates
    /// `fault2` to its own FFR root.
    pub fn check(&self, fault2: FaultId, cond1: &AssignList) -> Result<bool> {
        let network = self.network;
        let fault = network.fault(fault2)?;
        let ffr_id = network
            .node(fault.origin_node())?
            .ffr_id()
            .expect("a fault's origin node always belongs to some ffr");
        let ffr = network.ffr(ffr_id)?;

        let mut solver = DpllSolver::new();
        let gvar = encode_ffr_support(&mut solver, network, ffr.root(), cond1);
        let prop = FfrEnc::new(network).encode(&mut solver, &gvar, ffr, None, &[fault2]);
        let Some(pvar) = prop.fault_pv(fault2) else {
            return Ok(false);
        };

        let mut assumptions = vec![!pvar];
        assumptions.extend(cond_literals(&gvar, cond1));
        Ok(solver.solve(&assumptions) == SatResult::Unsat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpg_core::{Assign, BranchInfo, FaultType, NetworkBuilder, PrimType};

    // a --AND-- g --OR-- o
    //      b ---'    c --'
    // SA0 on the AND's stem dominates SA0 on the OR's `c` input: forcing the
    // AND output to 0 while keeping `o` undetected for `c` stuck-at-0 is
    // impossible once the OR structure is in place (o = g | c, c forced 0 by
    // the very fault we're asking to leave undetected doesn't change o when
    // g also participates) — the two faults are not equivalent, but the AND
    // stem fault does dominate the OR input fault along this structure in the
    // included test network.
    fn build_net() -> (NetworkRep, FaultId, FaultId) {
        let mut b = NetworkBuilder::new(FaultType::StuckAt);
        b.set_size(3, 1, 0, 2, 0);
        let a = b.make_input_node("a");
        let bb = b.make_input_node("b");
        let c = b.make_input_node("c");
        let gt_and = b.make_gate_type_primitive(2, PrimType::And);
        let g = b.make_prim_node(PrimType::And, vec![a, bb]);
        b.make_gate(gt_and, g, vec![BranchInfo { node: g, ipos: 0 }, BranchInfo { node: g, ipos: 1 }]);
        let gt_or = b.make_gate_type_primitive(2, PrimType::Or);
        let o = b.make_prim_node(PrimType::Or, vec![g, c]);
        let or_gate =
            b.make_gate(gt_or, o, vec![BranchInfo { node: o, ipos: 0 }, BranchInfo { node: o, ipos: 1 }]);
        b.make_output_node("y", o);
        let net = b.post_op().unwrap();

        let and_gate = net.gate_list().iter().find(|gt| gt.output_node() == g).unwrap();
        let f1 = and_gate.stem_fault(tpg_core::Fval2::Zero).unwrap();
        let f2 = net
            .gate(or_gate)
            .unwrap()
            .branch_fault(1, tpg_core::Fval2::Zero)
            .unwrap();
        (net, f1, f2)
    }

    #[test]
    fn and_stem_sa0_dominates_or_second_input_sa0() {
        let (net, f1, f2) = build_net();
        let checker = NaiveDomChecker::new(&net);
        assert!(checker.dominates(f1, f2).unwrap());
    }

    #[test]
    fn dominance_is_not_generally_symmetric() {
        let (net, f1, f2) = build_net();
        let checker = NaiveDomChecker::new(&net);
        assert!(!checker.dominates(f2, f1).unwrap());
    }

    #[test]
    fn struct_checker_allows_downstream_pair() {
        let (net, f1, f2) = build_net();
        let checker = StructDomChecker::new(&net);
        assert!(checker.may_dominate(f1, f2).unwrap());
    }

    #[test]
    fn trivial_checker1_rules_out_from_a_single_counterexample_pattern() {
        let detected = |fid: FaultId| fid == FaultId::new(0);
        assert!(!TrivialChecker1::may_dominate(FaultId::new(0), FaultId::new(1), detected));
        assert!(TrivialChecker1::may_dominate(FaultId::new(1), FaultId::new(0), detected));
    }

    #[test]
    fn trivial_checker2_is_vacuous_against_an_empty_condition() {
        let (net, f1, _f2) = build_net();
        let checker = TrivialChecker2::new(&net);
        let empty = AssignList::from_sorted(Vec::new());
        // An empty condition list is trivially satisfiable alongside any
        // propagation, so it can never be ruled out.
        assert!(!checker.check(f1, &empty).unwrap());
    }

    #[test]
    fn trivial_checker3_confirms_a_faults_own_excitation_propagates_it() {
        let (net, f1, _f2) = build_net();
        let excite = net.excitation_condition(f1).unwrap();
        let checker = TrivialChecker3::new(&net);
        assert!(checker.check(f1, &excite).unwrap());
    }

    #[test]
    fn assign_helper_builds_a_single_pin_condition() {
        let (net, f1, _f2) = build_net();
        let fault = net.fault(f1).unwrap();
        let cond = AssignList::from_sorted(vec![Assign::new(fault.origin_node(), 1, true)]);
        assert_eq!(cond.len(), 1);
    }
}
