//! ISCAS-89 `.bench` reader: `INPUT(name)`, `OUTPUT(name)`,
//! `name = GATETYPE(arg, arg, ...)`, and `name = DFF(arg)`. Every gate here
//! is a built-in primitive; the format has no equivalent of BLIF's factored
//! cover, so `tpg_parse::netlist::GateSpec::Complex` is never produced here.

use tpg_core::{FaultType, NetworkRep, PrimType};

use crate::error::{ParseError, Result};
use crate::netlist::{self, GateSpec, RawGate, RawNetlist};

/// Parses ISCAS-89 `.bench` source text into a frozen `NetworkRep`.
pub fn read_iscas89(text: &str, fault_type: FaultType) -> Result<NetworkRep> {
    let mut net = RawNetlist::new();
    for (idx, raw_line) in text.lines().enumerate() {
        let lineno = idx + 1;
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        if let Some(name) = strip_wrapped(line, "INPUT") {
            net.inputs.push(name.to_string());
        } else if let Some(name) = strip_wrapped(line, "OUTPUT") {
            net.outputs.push(name.to_string());
        } else if let Some((output, rhs)) = line.split_once('=') {
            let output = output.trim().to_string();
            let rhs = rhs.trim();
            let paren = rhs.find('(').ok_or_else(|| ParseError::Syntax {
                line: lineno,
                message: format!("expected `TYPE(args)` after `=`, found `{rhs}`"),
            })?;
            if !rhs.ends_with(')') {
                return Err(ParseError::Syntax { line: lineno, message: "unterminated argument list".into() });
            }
            let keyword = rhs[..paren].trim().to_uppercase();
            let args: Vec<String> = rhs[paren + 1..rhs.len() - 1]
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if keyword == "DFF" {
                if args.len() != 1 {
                    return Err(ParseError::Syntax {
                        line: lineno,
                        message: "DFF takes exactly one data-input argument".into(),
                    });
                }
                net.latches.push((args[0].clone(), output));
                continue;
            }
            let prim = keyword_to_prim(&keyword)
                .ok_or_else(|| ParseError::UnsupportedGate { line: lineno, keyword: keyword.clone() })?;
            net.gates.push(RawGate { line: lineno, output, inputs: args, spec: GateSpec::Primitive(prim) });
        } else {
            return Err(ParseError::Syntax { line: lineno, message: format!("unrecognized statement `{line}`") });
        }
    }
    netlist::build(net, fault_type)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn strip_wrapped<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    if line.len() < keyword.len() || !line[..keyword.len()].eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = line[keyword.len()..].trim_start().strip_prefix('(')?;
    rest.strip_suffix(')').map(str::trim)
}

fn keyword_to_prim(keyword: &str) -> Option<PrimType> {
    Some(match keyword {
        "AND" => PrimType::And,
        "NAND" => PrimType::Nand,
        "OR" => PrimType::Or,
        "NOR" => PrimType::Nor,
        "XOR" => PrimType::Xor,
        "XNOR" => PrimType::Xnor,
        "NOT" | "INV" => PrimType::Not,
        "BUFF" | "BUF" => PrimType::Buff,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpg_core::PrimType;

    #[test]
    fn and_gate_between_two_inputs() {
        let text = "\
INPUT(a)
INPUT(b)
OUTPUT(y)
y = AND(a, b)
";
        let net = read_iscas89(text, FaultType::StuckAt).unwrap();
        assert_eq!(net.input_num(), 2);
        assert_eq!(net.output_num(), 1);
        assert_eq!(net.gate_num(), 1);
        let gt_id = net.gate_list()[0].gate_type_id();
        assert_eq!(net.gate_type(gt_id).unwrap().primitive_type(), Some(PrimType::And));
    }

    #[test]
    fn dff_feeds_a_downstream_buffer_and_is_fed_by_a_primary_input() {
        let text = "\
INPUT(d)
OUTPUT(y)
q = DFF(d)
y = BUFF(q)
";
        let net = read_iscas89(text, FaultType::StuckAt).unwrap();
        assert_eq!(net.dff_num(), 1);
        assert_eq!(net.input_num(), 1);
        assert_eq!(net.gate_num(), 1);
    }

    #[test]
    fn unsupported_gate_keyword_is_reported() {
        let text = "\
INPUT(a)
OUTPUT(y)
y = MUX(a)
";
        assert!(matches!(
            read_iscas89(text, FaultType::StuckAt),
            Err(ParseError::UnsupportedGate { .. })
        ));
    }

    #[test]
    fn combinational_feedback_without_a_dff_is_a_cycle_error() {
        let text = "\
INPUT(a)
OUTPUT(y)
y = AND(a, z)
z = NOT(y)
";
        assert!(matches!(read_iscas89(text, FaultType::StuckAt), Err(ParseError::Syntax { .. })));
    }
}
