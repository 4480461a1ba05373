//! End-to-end scenarios spanning netlist construction, SAT-based test
//! generation, and the reference simulator together, as opposed to each
//! crate's own unit tests which exercise one layer in isolation.

use env_logger::{try_init_from_env, Env, DEFAULT_FILTER_ENV};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use tpg::core::{BranchInfo, DffId, Fval2, NetworkBuilder, PrimType, TestVector, Val3};
use tpg::parse::read_iscas89;
use tpg::sat::enumerate_det_cond;
use tpg::{read_blif, DetCond, DtpgEngine, DtpgStatus, FaultType, RefSim};

fn init_logger() {
    let _ = try_init_from_env(Env::default().filter_or(DEFAULT_FILTER_ENV, "info"));
}

fn build_and2() -> (NetworkBuilder, tpg::core::NodeId, tpg::core::NodeId, tpg::core::GateId) {
    let mut b = NetworkBuilder::new(FaultType::StuckAt);
    b.set_size(2, 1, 0, 1, 0);
    let a = b.make_input_node("a");
    let c = b.make_input_node("b");
    let gt = b.make_gate_type_primitive(2, PrimType::And);
    let g = b.make_prim_node(PrimType::And, vec![a, c]);
    let gid = b.make_gate(gt, g, vec![BranchInfo { node: g, ipos: 0 }, BranchInfo { node: g, ipos: 1 }]);
    b.make_output_node("o", g);
    (b, a, c, gid)
}

#[test]
fn and2_branch_sa0_on_input0_needs_both_inputs_high() -> anyhow::Result<()> {
    init_logger();
    let (mut b, a, _c, gid) = build_and2();
    let net = b.post_op()?;

    let fid = net.gate(gid)?.branch_fault(0, Fval2::Zero).expect("branch sa0 fault exists");
    let cond = net.excitation_condition(fid)?;
    assert!(cond.iter().any(|asg| asg.node_id() == a && asg.val()));

    let engine = DtpgEngine::new(&net);
    assert_eq!(engine.solve(fid)?, DtpgStatus::Detected);
    let tv = engine.gen_pattern(fid)?.expect("detected fault yields a pattern");
    assert_eq!(tv.input_val(0), Val3::One);
    assert_eq!(tv.input_val(1), Val3::One);

    let diff = RefSim::new(&net).spsfp(&tv, fid)?;
    assert!(!diff.is_empty());
    Ok(())
}

#[test]
fn transition_fall_at_and2_output_requires_a_zero_to_one_to_zero_launch() -> anyhow::Result<()> {
    init_logger();
    let mut b = NetworkBuilder::new(FaultType::TransitionDelay);
    b.set_size(2, 1, 1, 1, 0);
    let dff_id = DffId::new(0);
    let q = b.make_dff_output_node("q", dff_id);
    let pi = b.make_input_node("pi");
    let gt = b.make_gate_type_primitive(2, PrimType::And);
    let g = b.make_prim_node(PrimType::And, vec![pi, q]);
    b.make_gate(gt, g, vec![BranchInfo { node: g, ipos: 0 }, BranchInfo { node: g, ipos: 1 }]);
    b.make_output_node("o", g);
    b.make_dff_input_node(dff_id, "d", g);
    let net = b.post_op()?;

    let fault = net
        .fault_list()
        .iter()
        .find(|f| f.kind().is_stem() && f.kind().is_transition_delay())
        .expect("a stem transition-delay fault exists on the AND2 output");
    let engine = DtpgEngine::new(&net);
    if let Some(tv) = engine.gen_pattern(fault.id())? {
        assert!(tv.has_aux_input());
        let diff = RefSim::new(&net).spsfp(&tv, fault.id())?;
        assert!(!diff.is_empty(), "a generated transition-delay pattern must detect its own fault");
    }
    Ok(())
}

#[test]
fn aoi21_branch_sa0_on_c_resolves_onto_the_or_node_via_blif() -> anyhow::Result<()> {
    init_logger();
    let path = std::env::temp_dir().join(format!("tpg_test_aoi21_{}.blif", std::process::id()));
    std::fs::write(
        &path,
        "\
.model aoi21
.inputs a b c
.outputs o
.names a b c o
0-0 1
-00 1
.end
",
    )?;
    let net = read_blif(&path, FaultType::StuckAt)?;
    std::fs::remove_file(&path).ok();

    let gate = &net.gate_list()[0];
    let c = net.ppi(2)?;
    let branch_c = gate.branch_info(2);
    assert_ne!(branch_c.node, c);

    let fid = gate.branch_fault(2, Fval2::Zero).expect("branch sa0 on input c exists");
    let cond = net.excitation_condition(fid)?;
    assert!(cond.iter().any(|asg| asg.node_id() == c && asg.val()));

    let engine = DtpgEngine::new(&net);
    assert_eq!(engine.solve(fid)?, DtpgStatus::Detected);
    Ok(())
}

#[test]
fn stem_sa_on_a_single_fanout_buffer_chain_collapses_to_the_and_branch() -> anyhow::Result<()> {
    init_logger();
    let mut b = NetworkBuilder::new(FaultType::StuckAt);
    b.set_size(2, 1, 0, 3, 0);
    let a = b.make_input_node("a");
    let side = b.make_input_node("side");

    let buf1_gt = b.make_gate_type_primitive(1, PrimType::Buff);
    let buf1 = b.make_prim_node(PrimType::Buff, vec![a]);
    b.make_gate(buf1_gt, buf1, vec![BranchInfo { node: buf1, ipos: 0 }]);

    let buf2_gt = b.make_gate_type_primitive(1, PrimType::Buff);
    let buf2 = b.make_prim_node(PrimType::Buff, vec![buf1]);
    b.make_gate(buf2_gt, buf2, vec![BranchInfo { node: buf2, ipos: 0 }]);

    let and_gt = b.make_gate_type_primitive(2, PrimType::And);
    let and_node = b.make_prim_node(PrimType::And, vec![buf2, side]);
    let and_gid = b.make_gate(
        and_gt,
        and_node,
        vec![BranchInfo { node: and_node, ipos: 0 }, BranchInfo { node: and_node, ipos: 1 }],
    );
    b.make_output_node("o", and_node);
    let net = b.post_op()?;

    let buf1_gid = net.node(buf1)?.gate_id().expect("buf1 drives a gate");
    let stem_fault = net.gate(buf1_gid)?.stem_fault(Fval2::Zero).expect("buf1 stem sa0 exists");
    let rep = net.fault(stem_fault)?.rep_fault();

    let branch_fault = net.gate(and_gid)?.branch_fault(0, Fval2::Zero).expect("and-input0 sa0 exists");
    assert_eq!(rep, net.fault(branch_fault)?.rep_fault());
    Ok(())
}

/// spec.md §8 scenario 4, adapted: a small sequential benchmark (the pack
/// doesn't carry an actual `s27.blif`/`.bench` fixture) parsed from ISCAS-89
/// text, with 100 random full-scan patterns. `ppsfp`'s packed-parallel path
/// must report exactly the same per-fault coverage as replaying `sppfp`
/// (equivalently `spsfp`) one pattern at a time.
#[test]
fn packed_and_scalar_simulation_agree_on_fault_coverage_over_100_random_patterns() -> anyhow::Result<()> {
    init_logger();
    let text = "\
INPUT(a)
INPUT(b)
OUTPUT(y)
q = DFF(d)
g = AND(a, q)
d = OR(g, b)
y = NOT(g)
";
    let net = read_iscas89(text, FaultType::StuckAt)?;
    let sim = RefSim::new(&net);

    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    let mut patterns = Vec::with_capacity(100);
    for _ in 0..100 {
        let mut tv = TestVector::new(net.input_num(), net.dff_num(), false);
        tv.set_from_random(&mut rng);
        patterns.push(tv);
    }

    let packed = sim.ppsfp(&patterns)?;

    let mut scalar_covered: std::collections::HashSet<_> = std::collections::HashSet::new();
    for tv in &patterns {
        for &fid in net.rep_fid_list() {
            if !sim.spsfp(tv, fid)?.is_empty() {
                scalar_covered.insert(fid);
            }
        }
    }

    let mut packed_covered: std::collections::HashSet<_> = std::collections::HashSet::new();
    for (&fid, diffs) in &packed {
        if diffs.iter().any(|d| !d.is_empty()) {
            packed_covered.insert(fid);
        }
    }

    assert_eq!(scalar_covered, packed_covered);
    assert!(!scalar_covered.is_empty(), "random patterns over this network should detect something");
    Ok(())
}

#[test]
fn cube_cap_of_zero_overflows_immediately_with_the_ffr_roots_ppos() -> anyhow::Result<()> {
    init_logger();
    let (mut b, _a, _c, gid) = build_and2();
    let net = b.post_op()?;

    let fid = net.gate(gid)?.branch_fault(0, Fval2::Zero).expect("branch sa0 fault exists");
    match enumerate_det_cond(&net, fid, 0)? {
        DetCond::Overflow { covered, output_list } => {
            assert!(covered.is_empty());
            assert!(!output_list.is_empty());
        }
        DetCond::Cubes(_) => panic!("cube_cap = 0 must overflow on the first check"),
    }
    Ok(())
}
