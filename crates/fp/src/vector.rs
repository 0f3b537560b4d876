//! A dense vector over $\mathbb{F}_p$ whose entries are packed into 64 bit limbs.

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::prime::ValidPrime;

type Limb = u64;

const BITS_PER_LIMB: usize = Limb::BITS as usize;

/// The number of bits an element of $\mathbb{F}_p$ occupies in a limb.
const fn bit_length(p: ValidPrime) -> usize {
    (u32::BITS - (p.as_u32() - 1).leading_zeros()) as usize
}

/// The number of elements of $\mathbb{F}_p$ that fit in a single limb.
const fn entries_per_limb(p: ValidPrime) -> usize {
    BITS_PER_LIMB / bit_length(p)
}

/// A struct containing the information required to access a specific entry in an array of `Limb`s.
#[derive(Copy, Clone)]
struct LimbBitIndexPair {
    limb: usize,
    bit_index: usize,
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FpVector {
    p: ValidPrime,
    len: usize,
    limbs: Vec<Limb>,
}

impl FpVector {
    pub fn new(p: ValidPrime, len: usize) -> Self {
        Self {
            p,
            len,
            limbs: vec![0; Self::number_of_limbs(p, len)],
        }
    }

    /// Entries of `slice` are reduced mod p.
    pub fn from_slice(p: ValidPrime, slice: &[u32]) -> Self {
        let mut result = Self::new(p, slice.len());
        for (i, &v) in slice.iter().enumerate() {
            result.set_entry(i, v);
        }
        result
    }

    fn number_of_limbs(p: ValidPrime, len: usize) -> usize {
        len.div_ceil(entries_per_limb(p))
    }

    fn limb_bit_index_pair(&self, idx: usize) -> LimbBitIndexPair {
        let entries = entries_per_limb(self.p);
        LimbBitIndexPair {
            limb: idx / entries,
            bit_index: (idx % entries) * bit_length(self.p),
        }
    }

    fn bitmask(&self) -> Limb {
        (1 << bit_length(self.p)) - 1
    }

    pub fn prime(&self) -> ValidPrime {
        self.p
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn entry(&self, index: usize) -> u32 {
        assert!(
            index < self.len,
            "Index {index} too large, length of vector is only {}.",
            self.len
        );
        let pair = self.limb_bit_index_pair(index);
        ((self.limbs[pair.limb] >> pair.bit_index) & self.bitmask()) as u32
    }

    pub fn set_entry(&mut self, index: usize, value: u32) {
        assert!(
            index < self.len,
            "Index {index} too large, length of vector is only {}.",
            self.len
        );
        let value = value % self.p.as_u32();
        let pair = self.limb_bit_index_pair(index);
        let mask = self.bitmask() << pair.bit_index;
        let limb = &mut self.limbs[pair.limb];
        *limb &= !mask;
        *limb |= (value as Limb) << pair.bit_index;
    }

    /// Adds `value` times the `index`th standard basis vector.
    pub fn add_basis_element(&mut self, index: usize, value: u32) {
        let new = self.p.sum(self.entry(index), value);
        self.set_entry(index, new);
    }

    /// Adds `c * other` to `self`. The two vectors must have the same prime and length.
    pub fn add(&mut self, other: &Self, c: u32) {
        assert_eq!(self.p, other.p);
        assert_eq!(self.len, other.len);
        let c = c % self.p.as_u32();
        if c == 0 {
            return;
        }
        if self.p == 2 {
            for (x, y) in self.limbs.iter_mut().zip(&other.limbs) {
                *x ^= *y;
            }
        } else {
            for (i, v) in other.iter_nonzero() {
                self.add_basis_element(i, self.p.product(c, v));
            }
        }
    }

    pub fn scale(&mut self, c: u32) {
        let c = c % self.p.as_u32();
        if c == 0 {
            self.set_to_zero();
        } else if c != 1 {
            for i in 0..self.len {
                let v = self.entry(i);
                self.set_entry(i, self.p.product(v, c));
            }
        }
    }

    pub fn set_to_zero(&mut self) {
        for limb in &mut self.limbs {
            *limb = 0;
        }
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&x| x == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len).map(move |i| self.entry(i))
    }

    /// Iterates through the nonzero entries as `(index, value)` pairs.
    pub fn iter_nonzero(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.iter().enumerate().filter(|&(_, v)| v != 0)
    }

    pub fn first_nonzero(&self) -> Option<(usize, u32)> {
        self.iter_nonzero().next()
    }

    /// The number of nonzero entries.
    pub fn weight(&self) -> usize {
        self.iter_nonzero().count()
    }
}

impl std::fmt::Display for FpVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.iter().format(", "))
    }
}

impl std::fmt::Debug for FpVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

#[derive(Serialize, Deserialize)]
struct SerializedVector {
    p: ValidPrime,
    entries: Vec<u32>,
}

impl Serialize for FpVector {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        SerializedVector {
            p: self.p,
            entries: self.iter().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FpVector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = SerializedVector::deserialize(deserializer)?;
        Ok(Self::from_slice(v.p, &v.entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use expect_test::expect;
    use proptest::prelude::*;

    fn arb_prime() -> impl Strategy<Value = ValidPrime> {
        let primes: Vec<ValidPrime> = [2, 3, 5, 7, 11, 31, 8191]
            .into_iter()
            .filter_map(ValidPrime::try_new)
            .collect();
        proptest::sample::select(primes)
    }

    /// A prime together with two vectors of entries of the same length.
    fn arb_vector_pair() -> impl Strategy<Value = (ValidPrime, Vec<u32>, Vec<u32>)> {
        (arb_prime(), 0usize..300).prop_flat_map(|(p, len)| {
            (
                Just(p),
                proptest::collection::vec(0..p.as_u32(), len),
                proptest::collection::vec(0..p.as_u32(), len),
            )
        })
    }

    proptest! {
        #[test]
        fn entries_round_trip((p, v, _w) in arb_vector_pair()) {
            let vector = FpVector::from_slice(p, &v);
            prop_assert_eq!(vector.iter().collect::<Vec<_>>(), v.clone());
            prop_assert_eq!(vector.is_zero(), v.iter().all(|&x| x == 0));
        }

        #[test]
        fn add_is_entrywise((p, v, w) in arb_vector_pair(), c in 0u32..100) {
            let mut vector = FpVector::from_slice(p, &v);
            vector.add(&FpVector::from_slice(p, &w), c);
            let expected: Vec<u32> = v
                .iter()
                .zip(&w)
                .map(|(&x, &y)| p.sum(x, p.product(c, y)))
                .collect();
            prop_assert_eq!(vector.iter().collect::<Vec<_>>(), expected);
        }

        #[test]
        fn scale_is_entrywise((p, v, _w) in arb_vector_pair(), c in 0u32..100) {
            let mut vector = FpVector::from_slice(p, &v);
            vector.scale(c);
            let expected: Vec<u32> = v.iter().map(|&x| p.product(c, x)).collect();
            prop_assert_eq!(vector.iter().collect::<Vec<_>>(), expected);
        }
    }

    #[test]
    fn set_entry_leaves_neighbours() {
        let p = ValidPrime::new(2);
        let mut v = FpVector::new(p, 130);
        v.set_entry(64, 1);
        v.set_entry(129, 1);
        v.add_basis_element(64, 1);
        assert_eq!(v.iter_nonzero().collect::<Vec<_>>(), vec![(129, 1)]);
        assert_eq!(v.first_nonzero(), Some((129, 1)));
    }

    #[test]
    fn display() {
        let v = FpVector::from_slice(ValidPrime::new(2), &[1, 0, 1, 1]);
        expect![[r#"[1, 0, 1, 1]"#]].assert_eq(&v.to_string());
        assert_eq!(v.weight(), 3);
    }

    #[test]
    fn serde_round_trip() {
        let v = FpVector::from_slice(ValidPrime::new(2), &[0, 1, 1]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"p":2,"entries":[0,1,1]}"#);
        let w: FpVector = serde_json::from_str(&json).unwrap();
        assert_eq!(v, w);
    }
}
