//! Three-valued logic, the two-valued fault value domain, and the fault-model tag.
//!
//! Grounded on `original_source/include/types/{Val3.h,Fval2.h,FaultType.h}`: same
//! three truth tables, re-expressed as plain `match`es rather than the bit-packed
//! lookup tricks the C++ uses (those existed to dodge a branch misprediction in a
//! hot inner loop; `rustc` already turns a three-armed match on a `#[repr(u8)]`
//! enum into a jump table).

use std::fmt;

/// A three-valued logic value: unknown, or a concrete 0/1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum Val3 {
    X,
    Zero,
    One,
}

impl Val3 {
    #[inline]
    pub fn from_bool(b: bool) -> Self {
        if b {
            Val3::One
        } else {
            Val3::Zero
        }
    }

    #[inline]
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Val3::X => None,
            Val3::Zero => Some(false),
            Val3::One => Some(true),
        }
    }

    #[inline]
    pub fn is_x(self) -> bool {
        matches!(self, Val3::X)
    }
}

impl std::ops::Not for Val3 {
    type Output = Val3;
    #[inline]
    fn not(self) -> Val3 {
        match self {
            Val3::X => Val3::X,
            Val3::Zero => Val3::One,
            Val3::One => Val3::Zero,
        }
    }
}

impl std::ops::BitAnd for Val3 {
    type Output = Val3;
    #[inline]
    fn bitand(self, rhs: Val3) -> Val3 {
        match (self, rhs) {
            (Val3::Zero, _) | (_, Val3::Zero) => Val3::Zero,
            (Val3::One, Val3::One) => Val3::One,
            _ => Val3::X,
        }
    }
}

impl std::ops::BitOr for Val3 {
    type Output = Val3;
    #[inline]
    fn bitor(self, rhs: Val3) -> Val3 {
        match (self, rhs) {
            (Val3::One, _) | (_, Val3::One) => Val3::One,
            (Val3::Zero, Val3::Zero) => Val3::Zero,
            _ => Val3::X,
        }
    }
}

impl std::ops::BitXor for Val3 {
    type Output = Val3;
    #[inline]
    fn bitxor(self, rhs: Val3) -> Val3 {
        match (self, rhs) {
            (Val3::X, _) | (_, Val3::X) => Val3::X,
            (a, b) => Val3::from_bool(a != b),
        }
    }
}

impl fmt::Display for Val3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Val3::X => "X",
            Val3::Zero => "0",
            Val3::One => "1",
        })
    }
}

/// The (always-known) stuck value or post-transition value carried by a fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum Fval2 {
    Zero,
    One,
}

impl Fval2 {
    #[inline]
    pub fn as_bool(self) -> bool {
        matches!(self, Fval2::One)
    }

    #[inline]
    pub fn from_bool(b: bool) -> Self {
        if b {
            Fval2::One
        } else {
            Fval2::Zero
        }
    }

    #[inline]
    pub fn as_val3(self) -> Val3 {
        Val3::from_bool(self.as_bool())
    }
}

impl std::ops::Not for Fval2 {
    type Output = Fval2;
    #[inline]
    fn not(self) -> Fval2 {
        Fval2::from_bool(!self.as_bool())
    }
}

impl fmt::Display for Fval2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Fval2::Zero => "0",
            Fval2::One => "1",
        })
    }
}

/// Which fault model a `NetworkRep`'s fault catalogue was generated under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum FaultType {
    StuckAt,
    TransitionDelay,
    GateExhaustive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_truth_table() {
        use Val3::*;
        assert_eq!(Zero & X, Zero);
        assert_eq!(X & Zero, Zero);
        assert_eq!(One & One, One);
        assert_eq!(One & X, X);
        assert_eq!(X & X, X);
    }

    #[test]
    fn or_truth_table() {
        use Val3::*;
        assert_eq!(One & Zero, Zero);
        assert_eq!(One | X, One);
        assert_eq!(X | One, One);
        assert_eq!(Zero | Zero, Zero);
        assert_eq!(X | X, X);
    }

    #[test]
    fn xor_is_x_if_either_operand_is_x() {
        use Val3::*;
        assert_eq!(X ^ Zero, X);
        assert_eq!(One ^ X, X);
        assert_eq!(One ^ One, Zero);
        assert_eq!(One ^ Zero, One);
    }

    #[test]
    fn not_is_involutive_on_concrete_values() {
        assert_eq!(!!Val3::Zero, Val3::Zero);
        assert_eq!(!!Val3::One, Val3::One);
        assert_eq!(!Val3::X, Val3::X);
    }
}
