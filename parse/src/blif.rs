//! A restricted BLIF reader: `.model`, `.inputs`, `.outputs`, `.names`,
//! `.latch`, `.end`. Cover rows are restricted to the onset convention (the
//! output-value column is always `1`) since that is what every fixture in
//! practice emits; an off-set cover is reported as a syntax error rather
//! than silently inverted.

use tpg_core::{Expr, FaultType, NetworkRep, PrimType};

use crate::error::{ParseError, Result};
use crate::netlist::{self, GateSpec, RawGate, RawNetlist};

/// Parses BLIF source text into a frozen `NetworkRep`.
pub fn read_blif(text: &str, fault_type: FaultType) -> Result<NetworkRep> {
    let mut net = RawNetlist::new();
    let mut has_model = false;
    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;
    while i < lines.len() {
        let lineno = i + 1;
        let raw = lines[i].trim();
        i += 1;
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }
        let mut tokens: Vec<&str> = raw.split_whitespace().collect();
        let directive = tokens.remove(0);
        match directive {
            ".model" => has_model = true,
            ".inputs" => net.inputs.extend(tokens.into_iter().map(str::to_string)),
            ".outputs" => net.outputs.extend(tokens.into_iter().map(str::to_string)),
            ".latch" => {
                if tokens.len() < 2 {
                    return Err(ParseError::Syntax {
                        line: lineno,
                        message: ".latch needs a data-input and a Q signal".into(),
                    });
                }
                net.latches.push((tokens[0].to_string(), tokens[1].to_string()));
            }
            ".names" => {
                if tokens.is_empty() {
                    return Err(ParseError::Syntax {
                        line: lineno,
                        message: ".names needs at least an output signal".into(),
                    });
                }
                let output = tokens.pop().expect("checked non-empty above").to_string();
                let inputs: Vec<String> = tokens.into_iter().map(str::to_string).collect();
                let ni = inputs.len();
                let mut rows: Vec<String> = Vec::new();
                while i < lines.len() {
                    let cover_line = lines[i].trim();
                    if cover_line.is_empty() || cover_line.starts_with('.') || cover_line.starts_with('#') {
                        break;
                    }
                    i += 1;
                    rows.push(cover_line.to_string());
                }
                let spec = cover_to_spec(ni, &rows, lineno)?;
                net.gates.push(RawGate { line: lineno, output, inputs, spec });
            }
            ".end" => break,
            other if other.starts_with('.') => {
                return Err(ParseError::UnsupportedGate { line: lineno, keyword: other.to_string() })
            }
            _ => {
                return Err(ParseError::Syntax {
                    line: lineno,
                    message: format!("unexpected token `{directive}` outside any `.names` block"),
                })
            }
        }
    }
    if !has_model {
        return Err(ParseError::MissingModel);
    }
    netlist::build(net, fault_type)
}

/// Converts a `.names` cover into a `GateSpec`, recognizing the handful of
/// single-product/single-literal shapes that correspond to a built-in
/// primitive and otherwise building a sum-of-products `Expr`.
fn cover_to_spec(ni: usize, rows: &[String], line: usize) -> Result<GateSpec> {
    if ni == 0 {
        let cols: Vec<&str> = rows.first().map(|r| r.split_whitespace().collect()).unwrap_or_default();
        let on = cols.first().map(|v| *v == "1").unwrap_or(false);
        return Ok(GateSpec::Primitive(if on { PrimType::C1 } else { PrimType::C0 }));
    }

    let mut patterns: Vec<String> = Vec::with_capacity(rows.len());
    for row in rows {
        let cols: Vec<&str> = row.split_whitespace().collect();
        if cols.len() != 2 || cols[0].len() != ni {
            return Err(ParseError::CoverShape { line, got: cols.len(), expected: 2 });
        }
        if cols[1] != "1" {
            return Err(ParseError::Syntax {
                line,
                message: "only onset (output value `1`) .names covers are supported".into(),
            });
        }
        patterns.push(cols[0].to_string());
    }

    if let Some(prim) = recognize_primitive(ni, &patterns) {
        return Ok(GateSpec::Primitive(prim));
    }

    let mut terms = Vec::with_capacity(patterns.len());
    for pattern in &patterns {
        let mut lits = Vec::new();
        for (idx, c) in pattern.chars().enumerate() {
            match c {
                '1' => lits.push(Expr::Lit { input: idx, inverted: false }),
                '0' => lits.push(Expr::Lit { input: idx, inverted: true }),
                '-' => {}
                _ => {
                    return Err(ParseError::Syntax {
                        line,
                        message: format!("invalid cover symbol `{c}`"),
                    })
                }
            }
        }
        terms.push(if lits.len() == 1 { lits.into_iter().next().expect("len 1") } else { Expr::And(lits) });
    }
    // `Or` even for a single term: `NetworkBuilder::make_complex_gate` requires
    // a non-literal top-level expression to resolve branch positions from.
    Ok(GateSpec::Complex(Expr::Or(terms)))
}

fn recognize_primitive(ni: usize, patterns: &[String]) -> Option<PrimType> {
    if ni == 1 && patterns.len() == 1 {
        return match patterns[0].as_str() {
            "1" => Some(PrimType::Buff),
            "0" => Some(PrimType::Not),
            _ => None,
        };
    }
    if patterns.len() == 1 && patterns[0].chars().all(|c| c == '1') {
        return Some(PrimType::And);
    }
    if patterns.len() == ni {
        let mut seen = vec![false; ni];
        for p in patterns {
            if p.chars().filter(|&c| c == '1').count() != 1 || p.contains('0') {
                return None;
            }
            let pos = p.find('1').expect("checked exactly one `1` above");
            if seen[pos] {
                return None;
            }
            seen[pos] = true;
        }
        if seen.iter().all(|&b| b) {
            return Some(PrimType::Or);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpg_core::PrimType;

    #[test]
    fn and2_cover_recognized_as_builtin_and_gate() {
        let text = "\
.model and2
.inputs a b
.outputs y
.names a b y
11 1
.end
";
        let net = read_blif(text, FaultType::StuckAt).unwrap();
        assert_eq!(net.input_num(), 2);
        assert_eq!(net.output_num(), 1);
        assert_eq!(net.gate_num(), 1);
        let gt_id = net.gate_list()[0].gate_type_id();
        assert_eq!(net.gate_type(gt_id).unwrap().primitive_type(), Some(PrimType::And));
    }

    #[test]
    fn aoi21_cover_builds_via_sop_expression_and_resolves_branch_on_c() {
        let text = "\
.model aoi21
.inputs a b c
.outputs y
.names a b c y
0-0 1
-00 1
.end
";
        let net = read_blif(text, FaultType::StuckAt).unwrap();
        assert_eq!(net.input_num(), 3);
        let gate = &net.gate_list()[0];
        assert_eq!(gate.input_num(), 3);
        let c = net.ppi(2).unwrap();
        let branch_c = gate.branch_info(2);
        assert_ne!(branch_c.node, c);
    }

    #[test]
    fn latch_pairs_data_input_with_q_output() {
        let text = "\
.model shiftreg
.inputs d
.outputs q
.latch d q
.end
";
        let net = read_blif(text, FaultType::StuckAt).unwrap();
        assert_eq!(net.dff_num(), 1);
        assert_eq!(net.input_num(), 1);
    }

    #[test]
    fn missing_model_directive_is_an_error() {
        let text = ".inputs a\n.outputs a\n.end\n";
        assert!(matches!(read_blif(text, FaultType::StuckAt), Err(ParseError::MissingModel)));
    }

    #[test]
    fn undeclared_fanin_signal_is_an_error() {
        let text = "\
.model bad
.inputs a
.outputs y
.names a ghost y
11 1
.end
";
        assert!(matches!(
            read_blif(text, FaultType::StuckAt),
            Err(ParseError::UndeclaredSignal { .. })
        ));
    }
}
