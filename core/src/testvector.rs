//! `BitVector`/`TestVector`: ternary (0/1/X) vectors with copy-on-write
//! sharing, used to represent stimulus patterns for both stuck-at (one input
//! frame) and transition-delay (launch + capture frame) testing.
//!
//! Grounded on `original_source/include/types/{BitVector.h,TestVector.h}`. The
//! C++ side shares a `BitVectorRep` through a `shared_ptr` and calls
//! `uniquefy()` before any mutation; `Rc::make_mut` gives the same effect
//! without a hand-rolled refcount check.

use crate::value::Val3;
use rand::Rng;
use std::rc::Rc;

/// A flat ternary vector, shared cheaply until mutated.
#[derive(Clone, Debug)]
pub struct BitVector {
    bits: Rc<Vec<Val3>>,
}

impl BitVector {
    pub fn new(len: usize) -> Self {
        BitVector { bits: Rc::new(vec![Val3::X; len]) }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn val(&self, pos: usize) -> Val3 {
        self.bits[pos]
    }

    pub fn set_val(&mut self, pos: usize, val: Val3) {
        Rc::make_mut(&mut self.bits)[pos] = val;
    }

    pub fn init(&mut self) {
        self.bits = Rc::new(vec![Val3::X; self.len()]);
    }

    pub fn x_count(&self) -> usize {
        self.bits.iter().filter(|v| v.is_x()).count()
    }

    pub fn from_bin(bin_str: &str) -> Self {
        let mut bits = Vec::with_capacity(bin_str.len());
        for c in bin_str.chars() {
            match c {
                '0' => bits.push(Val3::Zero),
                '1' => bits.push(Val3::One),
                'x' | 'X' => bits.push(Val3::X),
                _ => return BitVector::new(0),
            }
        }
        BitVector { bits: Rc::new(bits) }
    }

    pub fn from_hex(len: usize, hex_str: &str) -> Self {
        let mut bits = vec![Val3::Zero; len];
        let mut pos = 0;
        for c in hex_str.chars() {
            let nibble = match c.to_digit(16) {
                Some(d) => d,
                None => return BitVector::new(0),
            };
            for bit in (0..4).rev() {
                if pos >= len {
                    break;
                }
                bits[pos] = Val3::from_bool((nibble >> bit) & 1 != 0);
                pos += 1;
            }
        }
        BitVector { bits: Rc::new(bits) }
    }

    pub fn bin_str(&self) -> String {
        self.bits.iter().map(|v| v.to_string()).collect()
    }

    /// Hex rendering; undefined digit meaning for positions that are `X`, same
    /// as the source this is grounded on — treats `X` as `0`.
    pub fn hex_str(&self) -> String {
        let mut out = String::new();
        for chunk in self.bits.chunks(4) {
            let mut nibble = 0u32;
            for (i, v) in chunk.iter().enumerate() {
                if v.as_bool().unwrap_or(false) {
                    nibble |= 1 << (chunk.len() - 1 - i);
                }
            }
            out.push(std::char::from_digit(nibble, 16).unwrap());
        }
        out
    }

    pub fn set_from_random<R: Rng>(&mut self, rng: &mut R) {
        let len = self.len();
        let bits = Rc::make_mut(&mut self.bits);
        for b in bits.iter_mut().take(len) {
            *b = Val3::from_bool(rng.gen());
        }
    }

    pub fn fix_x_from_random<R: Rng>(&mut self, rng: &mut R) {
        let bits = Rc::make_mut(&mut self.bits);
        for b in bits.iter_mut() {
            if b.is_x() {
                *b = Val3::from_bool(rng.gen());
            }
        }
    }

    /// Two vectors are compatible if no position has a 0/1 conflict.
    pub fn is_compatible(&self, other: &BitVector) -> bool {
        self.bits
            .iter()
            .zip(other.bits.iter())
            .all(|(a, b)| a.is_x() || b.is_x() || a == b)
    }

    /// Merges X positions from `self` with concrete bits from `other`.
    pub fn merged(&self, other: &BitVector) -> BitVector {
        let bits: Vec<Val3> = self
            .bits
            .iter()
            .zip(other.bits.iter())
            .map(|(a, b)| if a.is_x() { *b } else { *a })
            .collect();
        BitVector { bits: Rc::new(bits) }
    }

    /// `true` if, as a minterm set, `self` is contained in `other` (`other`
    /// is at least as general, i.e. has X wherever `self` does and agrees
    /// elsewhere).
    pub fn is_contained_in(&self, other: &BitVector) -> bool {
        self.bits
            .iter()
            .zip(other.bits.iter())
            .all(|(a, b)| b.is_x() || *a == *b)
    }
}

impl PartialEq for BitVector {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}
impl Eq for BitVector {}

/// A ternary test pattern: external-input values, optionally DFF state and a
/// second input frame for transition-delay testing. Layout within the packed
/// `BitVector` is `[inputs][dff][aux_inputs?]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestVector {
    input_num: usize,
    dff_num: usize,
    has_aux_input: bool,
    vector: BitVector,
}

impl TestVector {
    fn vect_len(input_num: usize, dff_num: usize, has_aux_input: bool) -> usize {
        input_num * if has_aux_input { 2 } else { 1 } + dff_num
    }

    pub fn new(input_num: usize, dff_num: usize, has_aux_input: bool) -> Self {
        let len = Self::vect_len(input_num, dff_num, has_aux_input);
        TestVector { input_num, dff_num, has_aux_input, vector: BitVector::new(len) }
    }

    pub fn from_bitvector(
        input_num: usize,
        dff_num: usize,
        has_aux_input: bool,
        vector: BitVector,
    ) -> Self {
        TestVector { input_num, dff_num, has_aux_input, vector }
    }

    pub fn vector_size(&self) -> usize {
        self.vector.len()
    }

    pub fn val(&self, pos: usize) -> Val3 {
        self.vector.val(pos)
    }

    pub fn input_num(&self) -> usize {
        self.input_num
    }

    pub fn dff_num(&self) -> usize {
        self.dff_num
    }

    pub fn ppi_num(&self) -> usize {
        self.input_num + self.dff_num
    }

    pub fn has_aux_input(&self) -> bool {
        self.has_aux_input
    }

    pub fn ppi_val(&self, pos: usize) -> Val3 {
        self.vector.val(pos)
    }

    pub fn set_ppi_val(&mut self, pos: usize, val: Val3) {
        self.vector.set_val(pos, val);
    }

    pub fn input_val(&self, pos: usize) -> Val3 {
        self.vector.val(pos)
    }

    pub fn set_input_val(&mut self, pos: usize, val: Val3) {
        self.vector.set_val(pos, val);
    }

    pub fn dff_val(&self, pos: usize) -> Val3 {
        self.vector.val(pos + self.input_num)
    }

    pub fn set_dff_val(&mut self, pos: usize, val: Val3) {
        self.vector.set_val(pos + self.input_num, val);
    }

    pub fn aux_input_val(&self, pos: usize) -> Val3 {
        self.vector.val(pos + self.ppi_num())
    }

    pub fn set_aux_input_val(&mut self, pos: usize, val: Val3) {
        let ppi_num = self.ppi_num();
        self.vector.set_val(pos + ppi_num, val);
    }

    pub fn x_count(&self) -> usize {
        self.vector.x_count()
    }

    pub fn bin_str(&self) -> String {
        self.vector.bin_str()
    }

    pub fn hex_str(&self) -> String {
        self.vector.hex_str()
    }

    pub fn init(&mut self) {
        self.vector.init();
    }

    pub fn is_compatible(&self, other: &TestVector) -> bool {
        self.vector.is_compatible(&other.vector)
    }

    pub fn merge(&self, other: &TestVector) -> TestVector {
        TestVector { vector: self.vector.merged(&other.vector), ..*self }
    }

    pub fn is_contained_in(&self, other: &TestVector) -> bool {
        self.vector.is_contained_in(&other.vector)
    }

    pub fn set_from_random<R: Rng>(&mut self, rng: &mut R) {
        self.vector.set_from_random(rng);
    }

    pub fn fix_x_from_random<R: Rng>(&mut self, rng: &mut R) {
        self.vector.fix_x_from_random(rng);
    }
}

/// Merges a batch of vectors; the result is unspecified if they conflict,
/// matching the source this is grounded on.
pub fn merge_all(vectors: &[TestVector]) -> Option<TestVector> {
    let mut iter = vectors.iter();
    let first = iter.next()?.clone();
    Some(iter.fold(first, |acc, v| acc.merge(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn bin_round_trip() {
        let bv = BitVector::from_bin("01X1");
        assert_eq!(bv.bin_str(), "01X1");
        assert_eq!(bv.x_count(), 1);
    }

    #[test]
    fn hex_round_trip_without_x() {
        let bv = BitVector::from_hex(8, "a5");
        assert_eq!(bv.hex_str(), "a5");
    }

    #[test]
    fn merge_fills_in_x_from_other() {
        let a = BitVector::from_bin("X0X1");
        let b = BitVector::from_bin("1011");
        let merged = a.merged(&b);
        assert_eq!(merged.bin_str(), "1011");
    }

    #[test]
    fn compatible_detects_bit_conflict() {
        let a = BitVector::from_bin("01");
        let b = BitVector::from_bin("00");
        assert!(!a.is_compatible(&b));
        let c = BitVector::from_bin("0X");
        assert!(a.is_compatible(&c));
    }

    #[test]
    fn transition_delay_vector_layout_has_two_input_frames() {
        let mut tv = TestVector::new(2, 1, true);
        assert_eq!(tv.vector_size(), 2 * 2 + 1);
        tv.set_input_val(0, Val3::One);
        tv.set_dff_val(0, Val3::Zero);
        tv.set_aux_input_val(0, Val3::X);
        assert_eq!(tv.input_val(0), Val3::One);
        assert_eq!(tv.dff_val(0), Val3::Zero);
        assert_eq!(tv.aux_input_val(0), Val3::X);
    }

    #[test]
    fn set_from_random_never_leaves_x() {
        let mut tv = TestVector::new(8, 0, false);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        tv.set_from_random(&mut rng);
        assert_eq!(tv.x_count(), 0);
    }

    #[test]
    fn copy_on_write_does_not_mutate_the_source() {
        let a = BitVector::from_bin("00");
        let mut b = a.clone();
        b.set_val(0, Val3::One);
        assert_eq!(a.val(0), Val3::Zero);
        assert_eq!(b.val(0), Val3::One);
    }
}
