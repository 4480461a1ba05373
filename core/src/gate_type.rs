//! Built-in primitive types and the factored-expression representation used by
//! complex gates, plus the `GateType` catalogue entry a `GateRep` points at.
//!
//! Grounded on `original_source/c++-src/types/include/GateType.h` (the `PrimType`
//! enum and the primitive/complex split) and spec.md §4.2.

use crate::value::Val3;

/// A built-in primitive gate function. `And`/`Nand`/`Or`/`Nor`/`Xor`/`Xnor` have
/// arity >= 2; `Buff`/`Not` arity 1; `C0`/`C1` arity 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimType {
    C0,
    C1,
    Buff,
    Not,
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Xnor,
}

impl PrimType {
    /// The controlling value for this gate's function: the input value that, on
    /// its own, determines the output regardless of the other inputs. `None` for
    /// gates with no controlling value (XOR/XNOR/Buff/Not/C0/C1).
    pub fn cval(self) -> Option<bool> {
        match self {
            PrimType::And | PrimType::Nand => Some(false),
            PrimType::Or | PrimType::Nor => Some(true),
            _ => None,
        }
    }

    /// The output value produced when an input takes the controlling value.
    pub fn coval(self) -> Option<bool> {
        match self {
            PrimType::And | PrimType::Nor => Some(false),
            PrimType::Or | PrimType::Nand => Some(true),
            _ => None,
        }
    }

    /// The non-controlling value: every input must be at this value for the
    /// controlling/non-controlling framework to pin the output to `noval()`.
    pub fn nval(self) -> Option<bool> {
        self.cval().map(|c| !c)
    }

    /// The output value produced when every input is at the non-controlling value.
    pub fn noval(self) -> Option<bool> {
        self.coval().map(|c| !c)
    }

    /// True for gates whose output polarity is inverted relative to its
    /// "positive" sibling (Nand vs And, Nor vs Or, Xnor vs Xor).
    pub fn is_inverting_output(self) -> bool {
        matches!(self, PrimType::Nand | PrimType::Nor | PrimType::Not | PrimType::Xnor)
    }

    pub fn min_arity(self) -> usize {
        match self {
            PrimType::C0 | PrimType::C1 => 0,
            PrimType::Buff | PrimType::Not => 1,
            _ => 2,
        }
    }

    pub fn eval(self, inputs: &[Val3]) -> Val3 {
        match self {
            PrimType::C0 => Val3::Zero,
            PrimType::C1 => Val3::One,
            PrimType::Buff => inputs[0],
            PrimType::Not => !inputs[0],
            PrimType::And => inputs.iter().copied().fold(Val3::One, |a, b| a & b),
            PrimType::Nand => !inputs.iter().copied().fold(Val3::One, |a, b| a & b),
            PrimType::Or => inputs.iter().copied().fold(Val3::Zero, |a, b| a | b),
            PrimType::Nor => !inputs.iter().copied().fold(Val3::Zero, |a, b| a | b),
            PrimType::Xor => inputs.iter().copied().fold(Val3::Zero, |a, b| a ^ b),
            PrimType::Xnor => !inputs.iter().copied().fold(Val3::Zero, |a, b| a ^ b),
        }
    }
}

/// A factored boolean expression over positional literals, used for complex
/// (non-primitive) gates. Built by the decomposition rule in spec.md §4.2: every
/// original logical input maps to exactly one physical branch position once the
/// expression is lowered to a tree of `PrimType` nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Lit { input: usize, inverted: bool },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Xor(Vec<Expr>),
    Const(bool),
}

impl Expr {
    pub fn eval(&self, inputs: &[bool]) -> bool {
        match self {
            Expr::Lit { input, inverted } => inputs[*input] != *inverted,
            Expr::And(es) => es.iter().all(|e| e.eval(inputs)),
            Expr::Or(es) => es.iter().any(|e| e.eval(inputs)),
            Expr::Xor(es) => es.iter().fold(false, |a, e| a != e.eval(inputs)),
            Expr::Const(b) => *b,
        }
    }

    /// Number of distinct original input indices referenced.
    pub fn input_num(&self) -> usize {
        fn visit(e: &Expr, max: &mut usize) {
            match e {
                Expr::Lit { input, .. } => *max = (*max).max(*input + 1),
                Expr::And(es) | Expr::Or(es) | Expr::Xor(es) => {
                    es.iter().for_each(|e| visit(e, max))
                }
                Expr::Const(_) => {}
            }
        }
        let mut max = 0;
        visit(self, &mut max);
        max
    }

    /// For each original input index, counts (positive literal occurrences,
    /// negative literal occurrences) across the whole expression. Used by the
    /// complex-gate decomposition rule (spec.md §4.2) to decide whether an input
    /// needs a plain wire, a buffer, or an inverter+buffer pair.
    pub fn literal_polarity_counts(&self) -> Vec<(usize, usize)> {
        let n = self.input_num();
        let mut counts = vec![(0usize, 0usize); n];
        fn visit(e: &Expr, counts: &mut [(usize, usize)]) {
            match e {
                Expr::Lit { input, inverted } => {
                    if *inverted {
                        counts[*input].1 += 1;
                    } else {
                        counts[*input].0 += 1;
                    }
                }
                Expr::And(es) | Expr::Or(es) | Expr::Xor(es) => {
                    es.iter().for_each(|e| visit(e, counts))
                }
                Expr::Const(_) => {}
            }
        }
        visit(self, &mut counts);
        counts
    }
}

/// A catalogue entry describing the function realized by one or more `GateRep`s.
/// Primitive entries map 1-to-1 onto a `NodeRep`; complex entries describe a
/// small tree of primitive nodes built during network construction.
#[derive(Clone, Debug)]
pub enum GateType {
    Primitive { input_num: usize, prim: PrimType },
    Complex { input_num: usize, expr: Expr },
}

impl GateType {
    pub fn input_num(&self) -> usize {
        match self {
            GateType::Primitive { input_num, .. } => *input_num,
            GateType::Complex { input_num, .. } => *input_num,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, GateType::Primitive { .. })
    }

    pub fn primitive_type(&self) -> Option<PrimType> {
        match self {
            GateType::Primitive { prim, .. } => Some(*prim),
            GateType::Complex { .. } => None,
        }
    }

    pub fn expr(&self) -> Option<&Expr> {
        match self {
            GateType::Complex { expr, .. } => Some(expr),
            GateType::Primitive { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_cval_is_zero() {
        assert_eq!(PrimType::And.cval(), Some(false));
        assert_eq!(PrimType::And.coval(), Some(false));
        assert_eq!(PrimType::And.nval(), Some(true));
        assert_eq!(PrimType::And.noval(), Some(true));
    }

    #[test]
    fn or_cval_is_one() {
        assert_eq!(PrimType::Or.cval(), Some(true));
        assert_eq!(PrimType::Or.coval(), Some(true));
    }

    #[test]
    fn xor_has_no_controlling_value() {
        assert_eq!(PrimType::Xor.cval(), None);
        assert_eq!(PrimType::Buff.cval(), None);
    }

    #[test]
    fn aoi21_expr_decomposition_counts() {
        // o = !(a & b | c): a,b appear once positive; c appears once positive too
        // (inversion is on the output, not the literal).
        let expr = Expr::Or(vec![
            Expr::And(vec![
                Expr::Lit { input: 0, inverted: false },
                Expr::Lit { input: 1, inverted: false },
            ]),
            Expr::Lit { input: 2, inverted: false },
        ]);
        assert_eq!(expr.input_num(), 3);
        let counts = expr.literal_polarity_counts();
        assert_eq!(counts, vec![(1, 0), (1, 0), (1, 0)]);
        assert!(!expr.eval(&[false, false, true]));
        assert!(expr.eval(&[true, true, false]));
    }
}
