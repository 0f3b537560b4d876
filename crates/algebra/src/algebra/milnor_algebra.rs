use itertools::Itertools;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::algebra::combinatorics::{tau_degree, xi_degree, xi_degrees_up_to};
use crate::algebra::Algebra;
use fp::prime::{multinomial, BitflagIterator, ValidPrime};
use fp::vector::FpVector;
use once::OnceVec;

pub type PPart = Vec<u32>;

/// A profile function, describing a sub-Hopf algebra of the Steenrod algebra.
///
/// The P part of a basis element `Q(E) P(R)` must satisfy `r_i < p^{p_part[i - 1]}`. Entries past
/// the end of `p_part` are 0 if `truncated` and unbounded otherwise. `Q_k` is allowed iff bit `k`
/// of `q_part` is set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilnorProfile {
    pub truncated: bool,
    pub q_part: u32,
    pub p_part: PPart,
}

impl Default for MilnorProfile {
    fn default() -> Self {
        Self {
            truncated: false,
            q_part: !0,
            p_part: Vec::new(),
        }
    }
}

impl MilnorProfile {
    pub fn is_trivial(&self) -> bool {
        !self.truncated && self.q_part == !0 && self.p_part.is_empty()
    }

    /// The largest value `r_{i + 1}` may take, or `None` if it is unbounded.
    fn ppart_bound(&self, p: ValidPrime, i: usize) -> Option<u32> {
        match self.p_part.get(i) {
            Some(&e) => p.checked_pow(e).map(|x| x - 1),
            None if self.truncated => Some(0),
            None => None,
        }
    }

    fn allows(&self, p: ValidPrime, q_part: u32, p_part: &[u32]) -> bool {
        q_part & !self.q_part == 0
            && p_part
                .iter()
                .enumerate()
                .all(|(i, &r)| self.ppart_bound(p, i).map_or(true, |bound| r <= bound))
    }

    /// Whether the profile defines a sub-Hopf algebra of the Steenrod algebra at the prime `p`.
    ///
    /// The P part must satisfy `h(r) >= min(h(r - i) - i, h(i))` for all `0 < i < r`. At odd
    /// primes the Q part must be closed under commutation with the P part. Since `P(R) Q_k`
    /// involves `Q_{k + i}` whenever `r_i >= p^k`, if `Q_k` is allowed and `h(i) > k` then
    /// `Q_{k + i}` must be allowed.
    pub fn is_valid(&self, p: ValidPrime) -> bool {
        const INFINITY: i64 = i64::MAX / 4;
        let h = |r: usize| -> i64 {
            match self.p_part.get(r - 1) {
                Some(&e) => e as i64,
                None if self.truncated => 0,
                None => INFINITY,
            }
        };
        // Past 2 * len the condition holds trivially.
        let p_part_valid = (2..=2 * self.p_part.len() + 1)
            .all(|r| (1..r).all(|i| h(r) >= std::cmp::min(h(r - i) - i as i64, h(i))));
        if !p_part_valid {
            return false;
        }
        if p == 2 {
            return true;
        }
        BitflagIterator::set_bit_iterator(self.q_part as u64).all(|k| {
            (1..32 - k).all(|i| h(i) <= k as i64 || self.q_part & (1 << (k + i)) != 0)
        })
    }
}

/// A Milnor basis element `Q(E) P(R)`. The set `E` is stored as a bit mask.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MilnorBasisElement {
    pub q_part: u32,
    pub p_part: PPart,
    pub degree: i32,
}

/// The Steenrod algebra in the Milnor basis, possibly restricted to the sub-Hopf algebra
/// described by a [`MilnorProfile`].
///
/// The basis in degree `d` is listed as follows. Each `Q(E)` of appropriate degree is visited in
/// increasing order of the bit mask `E`, and for each of them we list the `P(R)` of the
/// complementary degree. These are built degree by degree from `P(R - e_i)`, where `i` is the
/// last nonzero index of `R`, so they are grouped by the length of `R`.
pub struct MilnorAlgebra {
    p: ValidPrime,
    generic: bool,
    profile: MilnorProfile,
    next_degree: Mutex<i32>,
    /// degree / q -> list of P parts of that degree
    ppart_table: OnceVec<Vec<PPart>>,
    basis_table: OnceVec<Vec<MilnorBasisElement>>,
    basis_element_to_index_map: OnceVec<FxHashMap<MilnorBasisElement, usize>>,
}

impl std::fmt::Display for MilnorAlgebra {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "MilnorAlgebra(p={}", self.p)?;
        let profile = &self.profile;
        if !profile.is_trivial() {
            write!(f, ", profile=[{}]", profile.p_part.iter().join(", "))?;
            if profile.truncated {
                write!(f, ", truncated")?;
            }
            if profile.q_part != !0 {
                write!(f, ", q_part={:#b}", profile.q_part)?;
            }
        }
        write!(f, ")")
    }
}

impl MilnorAlgebra {
    pub fn new(p: ValidPrime) -> Self {
        Self::new_with_profile(p, MilnorProfile::default())
    }

    pub fn new_with_profile(p: ValidPrime, profile: MilnorProfile) -> Self {
        Self {
            p,
            generic: p != 2,
            profile,
            next_degree: Mutex::new(0),
            ppart_table: OnceVec::new(),
            basis_table: OnceVec::new(),
            basis_element_to_index_map: OnceVec::new(),
        }
    }

    pub fn generic(&self) -> bool {
        self.generic
    }

    pub fn profile(&self) -> &MilnorProfile {
        &self.profile
    }

    pub fn q(&self) -> i32 {
        if self.generic {
            2 * (self.p.as_i32() - 1)
        } else {
            1
        }
    }

    pub fn basis_element_from_index(&self, degree: i32, idx: usize) -> &MilnorBasisElement {
        &self.basis_table[degree as usize][idx]
    }

    pub fn try_basis_element_to_index(&self, elt: &MilnorBasisElement) -> Option<usize> {
        self.basis_element_to_index_map
            .get(elt.degree as usize)?
            .get(elt)
            .copied()
    }

    pub fn basis_element_to_index(&self, elt: &MilnorBasisElement) -> usize {
        self.try_basis_element_to_index(elt)
            .unwrap_or_else(|| panic!("Didn't find element {elt:?} in {self}"))
    }

    /// The degree of `Q(E) P(R)`, or `None` if it overflows or `E` is nonempty at the prime 2.
    pub fn degree_of(&self, q_part: u32, p_part: &[u32]) -> Option<i32> {
        let mut degree: i64 = 0;
        for (i, &r) in p_part.iter().enumerate() {
            degree += r as i64 * xi_degree(self.p, i)? as i64;
        }
        degree *= self.q() as i64;
        for k in BitflagIterator::set_bit_iterator(q_part as u64) {
            if !self.generic {
                return None;
            }
            degree += tau_degree(self.p, k)? as i64;
        }
        i32::try_from(degree).ok()
    }

    /// Looks up `Q(E) P(R)` and returns its `(degree, index)`, computing the basis as needed.
    /// Returns `None` if the element is not in the algebra.
    pub fn basis_element_from_parts(&self, q_part: u32, p_part: &[u32]) -> Option<(i32, usize)> {
        let mut p_part = p_part.to_vec();
        while p_part.last() == Some(&0) {
            p_part.pop();
        }
        if !self.profile.allows(self.p, q_part, &p_part) {
            return None;
        }
        let degree = self.degree_of(q_part, &p_part)?;
        self.compute_basis(degree);
        let idx = self.try_basis_element_to_index(&MilnorBasisElement {
            q_part,
            p_part,
            degree,
        })?;
        Some((degree, idx))
    }
}

impl Algebra for MilnorAlgebra {
    fn prime(&self) -> ValidPrime {
        self.p
    }

    fn compute_basis(&self, max_degree: i32) {
        let mut next_degree = self.next_degree.lock();
        if max_degree < *next_degree {
            return;
        }

        self.compute_ppart(max_degree / self.q());

        for degree in *next_degree..=max_degree {
            let basis = if self.generic {
                self.generate_basis_generic(degree)
            } else {
                self.generate_basis_2(degree)
            };
            tracing::trace!(degree, dimension = basis.len(), "Milnor basis");
            let map = basis
                .iter()
                .enumerate()
                .map(|(i, b)| (b.clone(), i))
                .collect();
            self.basis_table.push(basis);
            self.basis_element_to_index_map.push(map);
        }
        tracing::debug!(algebra = %self, from = *next_degree, to = max_degree, "extended basis");

        *next_degree = max_degree + 1;
    }

    fn dimension(&self, degree: i32) -> usize {
        if degree < 0 {
            return 0;
        }
        self.basis_table
            .get(degree as usize)
            .unwrap_or_else(|| panic!("{self} not computed through degree {degree}"))
            .len()
    }

    fn multiply_basis_elements(
        &self,
        result: &mut FpVector,
        coeff: u32,
        r_degree: i32,
        r_idx: usize,
        s_degree: i32,
        s_idx: usize,
    ) {
        self.multiply(
            result,
            coeff,
            &self.basis_table[r_degree as usize][r_idx],
            &self.basis_table[s_degree as usize][s_idx],
        );
    }

    fn basis_element_to_string(&self, degree: i32, idx: usize) -> String {
        let b = self.basis_element_from_index(degree, idx);
        if b.degree == 0 {
            return "1".to_string();
        }
        if !self.generic {
            return format!("Sq({})", b.p_part.iter().join(","));
        }
        let mut parts = Vec::new();
        if b.q_part != 0 {
            parts.push(
                BitflagIterator::set_bit_iterator(b.q_part as u64)
                    .map(|k| format!("Q_{k}"))
                    .join(" "),
            );
        }
        if !b.p_part.is_empty() {
            parts.push(format!("P({})", b.p_part.iter().join(",")));
        }
        parts.join(" ")
    }
}

// Compute basis functions
impl MilnorAlgebra {
    /// Extends `ppart_table` through index `max`. Must be called with `next_degree` locked.
    fn compute_ppart(&self, max: i32) {
        for n in self.ppart_table.len() as i32..=max {
            if n == 0 {
                self.ppart_table.push(vec![Vec::new()]);
                continue;
            }
            let mut new_row = Vec::new();
            for (i, xi) in xi_degrees_up_to(self.p, n) {
                let bound = self.profile.ppart_bound(self.p, i);
                if bound == Some(0) {
                    continue;
                }
                // Increment the last nonzero entry, which is entry i.
                for old in &self.ppart_table[(n - xi) as usize] {
                    if old.len() > i + 1 {
                        continue;
                    }
                    if old.len() == i + 1 && Some(old[i]) == bound {
                        continue;
                    }
                    let mut new = old.clone();
                    new.resize(i + 1, 0);
                    new[i] += 1;
                    new_row.push(new);
                }
            }
            self.ppart_table.push(new_row);
        }
    }

    fn generate_basis_2(&self, degree: i32) -> Vec<MilnorBasisElement> {
        self.ppart_table[degree as usize]
            .iter()
            .map(|p_part| MilnorBasisElement {
                q_part: 0,
                p_part: p_part.clone(),
                degree,
            })
            .collect()
    }

    fn generate_basis_generic(&self, degree: i32) -> Vec<MilnorBasisElement> {
        let q = self.q();
        let tau_degrees: Vec<i32> = (0..)
            .map_while(|k| tau_degree(self.p, k).filter(|&t| t <= degree))
            .collect();

        let mut result = Vec::new();
        for q_part in 0..1u32 << tau_degrees.len() {
            if q_part & !self.profile.q_part != 0 {
                continue;
            }
            let q_degree: i32 = BitflagIterator::set_bit_iterator(q_part as u64)
                .map(|k| tau_degrees[k])
                .sum();
            if q_degree > degree || (degree - q_degree) % q != 0 {
                continue;
            }
            for p_part in &self.ppart_table[((degree - q_degree) / q) as usize] {
                result.push(MilnorBasisElement {
                    q_part,
                    p_part: p_part.clone(),
                    degree,
                });
            }
        }
        result
    }
}

// Multiplication logic
impl MilnorAlgebra {
    fn multiply(
        &self,
        result: &mut FpVector,
        coeff: u32,
        m1: &MilnorBasisElement,
        m2: &MilnorBasisElement,
    ) {
        let p = self.p;
        let target_degree = m1.degree + m2.degree;
        for (c, q_part, p_part) in self.multiply_qpart(m1, m2.q_part) {
            for (d, new_p) in PPartMultiplier::new(p, &p_part, &m2.p_part).products() {
                let idx = self.basis_element_to_index(&MilnorBasisElement {
                    q_part,
                    p_part: new_p,
                    degree: target_degree,
                });
                result.add_basis_element(idx, p.product(coeff, p.product(c, d)));
            }
        }
    }

    /// Computes `Q(E) P(R) Q(F)` as a list of terms `(coefficient, E', R')` representing
    /// `Q(E') P(R')`, using
    ///
    /// P(R) Q_k = Q_k P(R) + Q_{k+1} P(R - p^k e_1) + Q_{k+2} P(R - p^k e_2) + ...
    ///
    /// where a term vanishes if `R - p^k e_i` has a negative entry, together with the fact that
    /// the `Q_k` anticommute.
    fn multiply_qpart(&self, m1: &MilnorBasisElement, f: u32) -> Vec<(u32, u32, PPart)> {
        let p = self.p;
        let mut terms = vec![(1, m1.q_part, m1.p_part.clone())];

        for k in BitflagIterator::set_bit_iterator(f as u64) {
            let pk = p.checked_pow(k as u32);
            let mut new_terms = Vec::new();
            for (coef, q_part, p_part) in &terms {
                for i in 0..=p_part.len() {
                    let target = k + i;
                    if target >= u32::BITS as usize {
                        break;
                    }
                    // Q_{k+i} squares to zero
                    if q_part & (1 << target) != 0 {
                        continue;
                    }
                    let mut new_p = p_part.clone();
                    if i > 0 {
                        match pk {
                            Some(pk) if new_p[i - 1] >= pk => new_p[i - 1] -= pk,
                            _ => continue,
                        }
                    }
                    while new_p.last() == Some(&0) {
                        new_p.pop();
                    }
                    // Move Q_{k+i} past the larger Q's in E
                    let larger_q = q_part.checked_shr(target as u32 + 1).unwrap_or(0).count_ones();
                    let c = if larger_q % 2 == 0 {
                        *coef
                    } else {
                        p.negate(*coef)
                    };
                    new_terms.push((c, q_part | 1 << target, new_p));
                }
            }
            terms = new_terms;
        }
        terms
    }
}

/// Enumerates the Milnor matrices for the product `P(R) P(S)`.
///
/// A Milnor matrix `x` has rows indexed by `0..=len(R)` and columns by `0..=len(S)`, with
/// `sum_j p^j x_{ij} = r_i` and `sum_i x_{ij} = s_j`. It contributes `P(T)` with
/// `t_n = sum_{i + j = n} x_{ij}` and coefficient the product over `n` of the multinomial
/// coefficients of the diagonals.
struct PPartMultiplier<'a> {
    p: ValidPrime,
    s: &'a [u32],
    rows: usize,
    cols: usize,
    /// Entries with `i, j >= 1`, row major.
    matrix: Vec<u32>,
    /// `r_i - sum_{j >= 1} p^j x_{ij}`, which becomes `x_{i0}`.
    row_remaining: Vec<u32>,
    /// `s_j - sum_{i >= 1} x_{ij}`, which becomes `x_{0j}`.
    col_remaining: Vec<u32>,
}

impl<'a> PPartMultiplier<'a> {
    fn new(p: ValidPrime, r: &'a [u32], s: &'a [u32]) -> Self {
        let rows = r.len() + 1;
        let cols = s.len() + 1;
        let mut row_remaining = vec![0; rows];
        row_remaining[1..].copy_from_slice(r);
        let mut col_remaining = vec![0; cols];
        col_remaining[1..].copy_from_slice(s);
        Self {
            p,
            s,
            rows,
            cols,
            matrix: vec![0; rows * cols],
            row_remaining,
            col_remaining,
        }
    }

    fn products(mut self) -> Vec<(u32, PPart)> {
        let mut result = Vec::new();
        self.fill(0, &mut result);
        result
    }

    fn entry(&self, i: usize, j: usize) -> u32 {
        match (i, j) {
            (0, 0) => 0,
            (0, j) => self.col_remaining[j],
            (i, 0) => self.row_remaining[i],
            (i, j) => self.matrix[i * self.cols + j],
        }
    }

    fn fill(&mut self, cell: usize, result: &mut Vec<(u32, PPart)>) {
        let inner_cols = self.cols - 1;
        if cell == (self.rows - 1) * inner_cols {
            self.record(result);
            return;
        }
        let i = cell / inner_cols + 1;
        let j = cell % inner_cols + 1;
        let p_to_the_j = (self.p.as_u32() as u64).saturating_pow(j as u32);
        let max = std::cmp::min(
            self.row_remaining[i] as u64 / p_to_the_j,
            self.col_remaining[j] as u64,
        ) as u32;
        for x in 0..=max {
            let weight = (x as u64 * p_to_the_j) as u32;
            self.matrix[i * self.cols + j] = x;
            self.row_remaining[i] -= weight;
            self.col_remaining[j] -= x;
            self.fill(cell + 1, result);
            self.row_remaining[i] += weight;
            self.col_remaining[j] += x;
        }
        self.matrix[i * self.cols + j] = 0;
    }

    fn record(&self, result: &mut Vec<(u32, PPart)>) {
        let mut coef = 1;
        let mut t = Vec::with_capacity(self.rows + self.s.len());
        let mut diagonal = Vec::new();
        for n in 1..self.rows + self.cols - 1 {
            diagonal.clear();
            let i_min = n.saturating_sub(self.cols - 1);
            let i_max = std::cmp::min(n, self.rows - 1);
            for i in i_min..=i_max {
                diagonal.push(self.entry(i, n - i));
            }
            t.push(diagonal.iter().sum());
            coef = self.p.product(coef, multinomial(self.p, &diagonal));
            if coef == 0 {
                return;
            }
        }
        while t.last() == Some(&0) {
            t.pop();
        }
        result.push((coef, t));
    }
}
