use std::fmt::{Debug, Display};

use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

use crate::MAX_PRIME;

/// A prime number that has been checked to be usable as the characteristic of our fields.
///
/// With the `odd-primes` feature disabled, 2 is the only valid prime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValidPrime {
    p: u32,
}

pub const TWO: ValidPrime = ValidPrime { p: 2 };

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimeError {
    NotAnInteger(std::num::ParseIntError),
    InvalidPrime(u32),
}

impl std::fmt::Display for PrimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnInteger(s) => write!(f, "Not an integer: {s}"),
            Self::InvalidPrime(p) => write!(f, "{p} is not a valid prime"),
        }
    }
}

impl std::error::Error for PrimeError {}

const fn is_prime(p: u32) -> bool {
    if p < 2 {
        return false;
    }
    let mut i = 2;
    while i * i <= p {
        if p % i == 0 {
            return false;
        }
        i += 1;
    }
    true
}

impl ValidPrime {
    /// # Panics
    ///
    /// Panics if `p` is not a valid prime.
    pub const fn new(p: u32) -> Self {
        match Self::try_new(p) {
            Some(p) => p,
            None => panic!("Invalid prime"),
        }
    }

    pub const fn try_new(p: u32) -> Option<Self> {
        if cfg!(feature = "odd-primes") {
            if p <= MAX_PRIME && is_prime(p) {
                Some(Self { p })
            } else {
                None
            }
        } else if p == 2 {
            Some(Self { p })
        } else {
            None
        }
    }

    pub const fn as_u32(self) -> u32 {
        self.p
    }

    pub const fn as_i32(self) -> i32 {
        self.p as i32
    }

    pub const fn as_usize(self) -> usize {
        self.p as usize
    }

    /// Computes the sum mod p. This takes care of overflow.
    pub fn sum(self, n1: u32, n2: u32) -> u32 {
        ((n1 as u64 + n2 as u64) % self.p as u64) as u32
    }

    /// Computes the product mod p. This takes care of overflow.
    pub fn product(self, n1: u32, n2: u32) -> u32 {
        ((n1 as u64 * n2 as u64) % self.p as u64) as u32
    }

    /// The additive inverse of `k` mod p.
    pub fn negate(self, k: u32) -> u32 {
        let k = k % self.p;
        if k == 0 {
            0
        } else {
            self.p - k
        }
    }

    pub fn pow_mod(self, mut b: u32, mut e: u32) -> u32 {
        let mut result: u32 = 1 % self.p;
        b %= self.p;
        while e > 0 {
            if (e & 1) == 1 {
                result = self.product(result, b);
            }
            b = self.product(b, b);
            e >>= 1;
        }
        result
    }

    /// The multiplicative inverse of `k` mod p. `k` must not be divisible by p.
    pub fn inverse(self, k: u32) -> u32 {
        assert!(k % self.p != 0, "{k} is not invertible mod {}", self.p);
        self.pow_mod(k, self.p - 2)
    }

    /// Returns $p^e$ if it fits in a `u32`.
    pub fn checked_pow(self, e: u32) -> Option<u32> {
        self.p.checked_pow(e)
    }
}

impl std::ops::Deref for ValidPrime {
    type Target = u32;

    fn deref(&self) -> &u32 {
        &self.p
    }
}

impl PartialEq<u32> for ValidPrime {
    fn eq(&self, other: &u32) -> bool {
        self.p == *other
    }
}

impl Debug for ValidPrime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.p, f)
    }
}

impl Display for ValidPrime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.p, f)
    }
}

impl TryFrom<u32> for ValidPrime {
    type Error = PrimeError;

    fn try_from(p: u32) -> Result<Self, PrimeError> {
        Self::try_new(p).ok_or(PrimeError::InvalidPrime(p))
    }
}

impl std::str::FromStr for ValidPrime {
    type Err = PrimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let p: u32 = s.parse().map_err(PrimeError::NotAnInteger)?;
        Self::try_from(p)
    }
}

impl Serialize for ValidPrime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.p.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ValidPrime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let p: u32 = u32::deserialize(deserializer)?;
        Self::try_from(p).map_err(D::Error::custom)
    }
}

/// Computes $(-1)^n$ mod p.
pub fn minus_one_to_the_n(p: ValidPrime, n: u32) -> u32 {
    if n % 2 == 0 {
        1
    } else {
        p.as_u32() - 1
    }
}

/// `n!` mod p for `n < p`.
fn small_factorial(p: ValidPrime, n: u32) -> u32 {
    (2..=n).fold(1 % p.as_u32(), |acc, k| p.product(acc, k))
}

/// Computes the multinomial coefficient of the list `l` mod p using Lucas' theorem.
///
/// The coefficient is nonzero only if adding up the entries of `l` in base p involves no carries,
/// in which case it is the product of the multinomial coefficients of the digits.
pub fn multinomial(p: ValidPrime, l: &[u32]) -> u32 {
    if p == 2 {
        return multinomial2(l);
    }
    let pu = p.as_u32();
    let mut digits = l.to_vec();
    let mut answer = 1;
    while digits.iter().any(|&x| x != 0) {
        let mut digit_sum = 0;
        let mut denominator = 1;
        for x in &mut digits {
            let digit = *x % pu;
            *x /= pu;
            digit_sum += digit;
            if digit_sum >= pu {
                return 0;
            }
            denominator = p.product(denominator, small_factorial(p, digit));
        }
        answer = p.product(answer, small_factorial(p, digit_sum));
        answer = p.product(answer, p.inverse(denominator));
    }
    answer
}

/// mod 2 multinomial coefficient. This is 1 exactly when the binary expansions of the entries are
/// disjoint.
pub fn multinomial2(l: &[u32]) -> u32 {
    let mut bit_or = 0;
    let mut sum = 0;
    for &e in l {
        if bit_or & e != 0 {
            return 0;
        }
        bit_or |= e;
        sum += e;
    }
    debug_assert_eq!(bit_or, sum);
    1
}

/// Binomial coefficient n choose k mod p.
pub fn binomial(p: ValidPrime, n: i32, k: i32) -> u32 {
    if n < 0 || k < 0 || k > n {
        return 0;
    }
    multinomial(p, &[k as u32, (n - k) as u32])
}

/// Iterates through the indices of the bits that are set in a `u64`, in increasing order.
pub struct BitflagIterator {
    flag: u64,
}

impl BitflagIterator {
    pub fn set_bit_iterator(flag: u64) -> Self {
        Self { flag }
    }
}

impl Iterator for BitflagIterator {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.flag == 0 {
            return None;
        }
        let tz = self.flag.trailing_zeros();
        self.flag ^= 1 << tz;
        Some(tz as usize)
    }
}
