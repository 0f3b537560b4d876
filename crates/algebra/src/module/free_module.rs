use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use rustc_hash::FxHashMap;
use serde_json::{json, Value};

use crate::algebra::{Algebra, AlgebraElement};
use crate::module::{FreeModuleElement, Module};
use fp::space::VectorSpace;
use fp::vector::FpVector;
use once::OnceBiVec;

/// The module basis element `operation * generator`, where the operation is the algebra basis
/// element `(operation_degree, operation_index)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OperationGeneratorPair {
    pub operation_degree: i32,
    pub operation_index: usize,
    pub generator_index: usize,
}

struct FreeModuleTableEntry {
    basis_element_to_opgen: Vec<OperationGeneratorPair>,
    opgen_to_index: FxHashMap<OperationGeneratorPair, usize>,
    /// generator index => start of the block of basis elements on that generator
    generator_to_index: Vec<usize>,
}

/// A free module on finitely many generators of fixed degrees.
///
/// The basis in degree `n` consists of the `op * g` where `g` runs through the generators in
/// order and `op` runs through the basis of the algebra in degree `n - |g|`. It is computed the
/// first time it is needed.
pub struct FreeModule<A: Algebra> {
    algebra: Arc<A>,
    name: String,
    gen_names: Vec<String>,
    gen_degrees: Vec<i32>,
    min_degree: i32,
    table: OnceBiVec<FreeModuleTableEntry>,
}

impl<A: Algebra> std::fmt::Display for FreeModule<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl<A: Algebra> std::fmt::Debug for FreeModule<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FreeModule")
            .field("name", &self.name)
            .field("algebra", &format_args!("{}", self.algebra))
            .field("gen_degrees", &self.gen_degrees)
            .finish()
    }
}

impl<A: Algebra> Module for FreeModule<A> {
    type Algebra = A;

    fn algebra(&self) -> Arc<A> {
        Arc::clone(&self.algebra)
    }

    fn min_degree(&self) -> i32 {
        self.min_degree
    }

    fn compute_basis(&self, degree: i32) {
        if degree < self.table.len() {
            return;
        }
        self.algebra.compute_basis(degree - self.min_degree);
        let from = self.table.len();
        self.table.extend(degree, |n| self.build_table_entry(n));
        tracing::debug!(module = %self, from, to = degree, "extended free module basis");
    }

    fn dimension(&self, degree: i32) -> usize {
        self.basis(degree).len()
    }

    fn act_on_basis(
        &self,
        result: &mut FpVector,
        coeff: u32,
        op_degree: i32,
        op_index: usize,
        mod_degree: i32,
        mod_index: usize,
    ) {
        let opgen = self.basis(mod_degree)[mod_index];
        let output_degree = op_degree + mod_degree;
        let product_degree = op_degree + opgen.operation_degree;
        assert_eq!(result.len(), self.dimension(output_degree));

        let mut product = FpVector::new(self.prime(), self.algebra.dimension(product_degree));
        self.algebra.multiply_basis_elements(
            &mut product,
            coeff,
            op_degree,
            op_index,
            opgen.operation_degree,
            opgen.operation_index,
        );

        let offset = self.table[output_degree].generator_to_index[opgen.generator_index];
        for (i, v) in product.iter_nonzero() {
            result.add_basis_element(offset + i, v);
        }
    }

    fn basis_element_to_string(&self, degree: i32, idx: usize) -> String {
        self.opgen_to_string(&self.basis(degree)[idx])
    }
}

impl<A: Algebra> FreeModule<A> {
    /// A free module with generators `x0, x1, ...` in the given degrees.
    pub fn new(algebra: Arc<A>, name: impl Into<String>, gen_degrees: Vec<i32>) -> Self {
        let gens = gen_degrees
            .into_iter()
            .enumerate()
            .map(|(i, d)| (format!("x{i}"), d))
            .collect();
        Self::with_names(algebra, name, gens)
    }

    /// A free module with the given `(name, degree)` generators, in the order listed.
    pub fn with_names(algebra: Arc<A>, name: impl Into<String>, gens: Vec<(String, i32)>) -> Self {
        let (gen_names, gen_degrees): (Vec<_>, Vec<_>) = gens.into_iter().unzip();
        let min_degree = gen_degrees.iter().copied().min().unwrap_or(0);
        Self {
            algebra,
            name: name.into(),
            gen_names,
            gen_degrees,
            min_degree,
            table: OnceBiVec::new(min_degree),
        }
    }

    /// Reads a module of the form `{"name": "M", "gens": {"x0": 0, "x1": 1}}`. The generators are
    /// ordered by degree and then by name.
    pub fn from_json(algebra: Arc<A>, json: &Value) -> anyhow::Result<Self> {
        let name = json["name"].as_str().unwrap_or("").to_string();
        let gens: BTreeMap<String, i32> = serde_json::from_value(json["gens"].clone())
            .context("gens must be a map from generator names to degrees")?;
        let mut gens: Vec<(String, i32)> = gens.into_iter().collect();
        gens.sort_by(|(n1, d1), (n2, d2)| d1.cmp(d2).then_with(|| n1.cmp(n2)));
        Ok(Self::with_names(algebra, name, gens))
    }

    pub fn to_json(&self, json: &mut Value) {
        if !self.name.is_empty() {
            json["name"] = Value::String(self.name.clone());
        }
        json["gens"] = json!({});
        for (g, &d) in self.gen_names.iter().zip(&self.gen_degrees) {
            json["gens"][g] = Value::from(d);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generator_degrees(&self) -> &[i32] {
        &self.gen_degrees
    }

    pub fn generator_names(&self) -> &[String] {
        &self.gen_names
    }

    pub fn num_gens(&self) -> usize {
        self.gen_degrees.len()
    }

    /// The basis in degree `degree`, computing it if necessary.
    pub fn basis(&self, degree: i32) -> &[OperationGeneratorPair] {
        if degree < self.min_degree {
            return &[];
        }
        self.compute_basis(degree);
        &self.table[degree].basis_element_to_opgen
    }

    pub fn basis_index(&self, degree: i32, opgen: &OperationGeneratorPair) -> Option<usize> {
        if degree < self.min_degree {
            return None;
        }
        self.compute_basis(degree);
        self.table[degree].opgen_to_index.get(opgen).copied()
    }

    /// The product of the algebra basis element `(op_degree, op_index)` with the generator
    /// `gen_index`, as a basis element of degree `op_degree + |g|`.
    pub fn act_on_generator(
        &self,
        op_degree: i32,
        op_index: usize,
        gen_index: usize,
    ) -> OperationGeneratorPair {
        assert!(gen_index < self.num_gens(), "{self} has no generator {gen_index}");
        self.algebra.compute_basis(op_degree);
        assert!(
            op_index < self.algebra.dimension(op_degree),
            "{} has no basis element ({op_degree}, {op_index})",
            self.algebra
        );
        OperationGeneratorPair {
            operation_degree: op_degree,
            operation_index: op_index,
            generator_index: gen_index,
        }
    }

    /// The coordinate space of the module in degree `degree`. Its `k`th standard basis vector
    /// corresponds to `self.basis(degree)[k]`.
    pub fn vector_presentation(&self, degree: i32) -> VectorSpace {
        VectorSpace::new(self.prime(), self.dimension(degree))
    }

    pub fn opgen_to_string(&self, opgen: &OperationGeneratorPair) -> String {
        let name = &self.gen_names[opgen.generator_index];
        if opgen.operation_degree == 0 {
            return name.clone();
        }
        let op = self
            .algebra
            .basis_element_to_string(opgen.operation_degree, opgen.operation_index);
        format!("{op} {name}")
    }

    fn build_table_entry(&self, degree: i32) -> FreeModuleTableEntry {
        let mut basis_element_to_opgen = Vec::new();
        let mut generator_to_index = Vec::with_capacity(self.num_gens());
        for (gen_index, &gen_degree) in self.gen_degrees.iter().enumerate() {
            generator_to_index.push(basis_element_to_opgen.len());
            let op_degree = degree - gen_degree;
            for op_index in 0..self.algebra.dimension(op_degree) {
                basis_element_to_opgen.push(OperationGeneratorPair {
                    operation_degree: op_degree,
                    operation_index: op_index,
                    generator_index: gen_index,
                });
            }
        }
        tracing::trace!(
            module = %self,
            degree,
            dimension = basis_element_to_opgen.len(),
            "free module basis"
        );
        let opgen_to_index = basis_element_to_opgen
            .iter()
            .enumerate()
            .map(|(i, &opgen)| (opgen, i))
            .collect();
        FreeModuleTableEntry {
            basis_element_to_opgen,
            opgen_to_index,
            generator_to_index,
        }
    }
}

// Constructing elements
impl<A: Algebra> FreeModule<A> {
    fn algebra_zero(&self) -> AlgebraElement<A> {
        AlgebraElement::zero(Arc::clone(&self.algebra))
    }

    pub fn zero(self: &Arc<Self>) -> FreeModuleElement<A> {
        self.element(Vec::new())
    }

    /// The element with the given coefficients on the generators. Missing trailing coefficients
    /// are zero.
    ///
    /// # Panics
    /// If there are more coefficients than generators, or a coefficient lies in a different
    /// algebra.
    pub fn element(
        self: &Arc<Self>,
        mut coefficients: Vec<AlgebraElement<A>>,
    ) -> FreeModuleElement<A> {
        assert!(
            coefficients.len() <= self.num_gens(),
            "{self} has {} generators but {} coefficients were given",
            self.num_gens(),
            coefficients.len()
        );
        for c in &coefficients {
            assert!(Arc::ptr_eq(c.algebra(), &self.algebra));
        }
        coefficients.resize_with(self.num_gens(), || self.algebra_zero());
        FreeModuleElement::new(Arc::clone(self), coefficients)
    }

    pub fn generator(self: &Arc<Self>, gen_index: usize) -> FreeModuleElement<A> {
        self.opgen_element(&self.act_on_generator(0, 0, gen_index))
    }

    pub fn opgen_element(self: &Arc<Self>, opgen: &OperationGeneratorPair) -> FreeModuleElement<A> {
        let mut coefficients = vec![self.algebra_zero(); self.num_gens()];
        coefficients[opgen.generator_index] = AlgebraElement::basis_element(
            Arc::clone(&self.algebra),
            opgen.operation_degree,
            opgen.operation_index,
        );
        FreeModuleElement::new(Arc::clone(self), coefficients)
    }

    /// The basis of degree `degree` as module elements.
    pub fn basis_elements(self: &Arc<Self>, degree: i32) -> Vec<FreeModuleElement<A>> {
        self.basis(degree)
            .iter()
            .map(|opgen| self.opgen_element(opgen))
            .collect()
    }

    /// The element `sum_k v_k * self.basis(degree)[k]`.
    pub fn element_from_coordinates(
        self: &Arc<Self>,
        v: &FpVector,
        degree: i32,
    ) -> FreeModuleElement<A> {
        let space = self.vector_presentation(degree);
        assert!(space.contains(v), "{v} does not lie in {space}");
        let basis = self.basis(degree);
        let mut blocks: Vec<Option<(i32, FpVector)>> = vec![None; self.num_gens()];
        for (k, c) in v.iter_nonzero() {
            let opgen = basis[k];
            let (_, block) = blocks[opgen.generator_index].get_or_insert_with(|| {
                (
                    opgen.operation_degree,
                    FpVector::new(self.prime(), self.algebra.dimension(opgen.operation_degree)),
                )
            });
            block.set_entry(opgen.operation_index, c);
        }
        let coefficients = blocks
            .into_iter()
            .map(|block| match block {
                Some((op_degree, w)) => {
                    AlgebraElement::from_vector(Arc::clone(&self.algebra), op_degree, w)
                }
                None => self.algebra_zero(),
            })
            .collect();
        FreeModuleElement::new(Arc::clone(self), coefficients)
    }

    /// A sample element of degree `degree`: the last algebra basis element of the right degree
    /// on each generator that admits one. This is zero if the module vanishes in this degree.
    pub fn an_element(self: &Arc<Self>, degree: i32) -> FreeModuleElement<A> {
        self.compute_basis(degree);
        let coefficients = self
            .gen_degrees
            .iter()
            .map(|&gen_degree| {
                let op_degree = degree - gen_degree;
                match self.algebra.dimension(op_degree) {
                    0 => self.algebra_zero(),
                    dim => {
                        AlgebraElement::basis_element(Arc::clone(&self.algebra), op_degree, dim - 1)
                    }
                }
            })
            .collect();
        FreeModuleElement::new(Arc::clone(self), coefficients)
    }
}
