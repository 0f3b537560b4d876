use crate::algebra::milnor_algebra::MilnorProfile;
use crate::algebra::{Algebra, Field, MilnorAlgebra};
use fp::prime::ValidPrime;
use fp::vector::FpVector;

use enum_dispatch::enum_dispatch;
use serde::Deserialize;
use serde_json::Value;

/// The algebras a module description may ask for.
#[enum_dispatch(Algebra)]
pub enum SteenrodAlgebra {
    MilnorAlgebra,
    Field,
}

impl std::fmt::Display for SteenrodAlgebra {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::MilnorAlgebra(a) => a.fmt(f),
            Self::Field(a) => a.fmt(f),
        }
    }
}

impl std::fmt::Debug for SteenrodAlgebra {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

#[derive(Deserialize, Debug)]
struct AlgebraSpec {
    p: u32,
    algebra: Option<Vec<String>>,
    profile: Option<MilnorProfile>,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AlgebraSpecError {
    #[error("Invalid prime: {0}")]
    InvalidPrime(u32),
    #[error("Invalid algebra: {0}")]
    InvalidAlgebra(String),
    #[error("Profile {0:?} does not define a sub-Hopf algebra")]
    InvalidProfile(MilnorProfile),
}

impl SteenrodAlgebra {
    /// Constructs the algebra named `algebra_name` from a JSON description of the form
    /// `{"p": 2, "algebra": ["milnor"], "profile": {"truncated": true, "p_part": [2, 1]}}`.
    /// If the description lists the algebras it supports and `algebra_name` is not one of them, the
    /// first listed algebra is used instead.
    pub fn from_json(json: &Value, algebra_name: &str) -> anyhow::Result<Self> {
        let mut algebra_name = algebra_name;
        let spec: AlgebraSpec = serde_json::from_value(json.clone())?;

        let p = ValidPrime::try_new(spec.p).ok_or(AlgebraSpecError::InvalidPrime(spec.p))?;

        if let Some(list) = spec.algebra.as_ref() {
            if let Some(first) = list.first() {
                if !list.iter().any(|x| x == algebra_name) {
                    tracing::warn!(
                        requested = algebra_name,
                        using = %first,
                        "module does not support requested algebra"
                    );
                    algebra_name = first;
                }
            }
        }

        Ok(match algebra_name {
            "milnor" => {
                let profile = spec.profile.unwrap_or_default();
                if !profile.is_valid(p) {
                    return Err(AlgebraSpecError::InvalidProfile(profile).into());
                }
                Self::MilnorAlgebra(MilnorAlgebra::new_with_profile(p, profile))
            }
            "field" => Self::Field(Field::new(p)),
            _ => return Err(AlgebraSpecError::InvalidAlgebra(algebra_name.to_string()).into()),
        })
    }

    pub fn to_json(&self, json: &mut Value) {
        json["p"] = Value::from(self.prime().as_u32());
        match self {
            Self::MilnorAlgebra(a) => {
                json["algebra"] = Value::from(vec!["milnor"]);
                if !a.profile().is_trivial() {
                    json["profile"] = serde_json::to_value(a.profile()).unwrap_or(Value::Null);
                }
            }
            Self::Field(_) => {
                json["algebra"] = Value::from(vec!["field"]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn milnor_with_profile() {
        let json = json!({"p": 2, "profile": {"truncated": true, "p_part": [2, 1]}});
        let algebra = SteenrodAlgebra::from_json(&json, "milnor").unwrap();
        algebra.compute_basis(10);
        assert_eq!((0..=10).map(|d| algebra.dimension(d)).sum::<usize>(), 8);
        assert_eq!(algebra.to_string(), "MilnorAlgebra(p=2, profile=[2, 1], truncated)");
        assert_eq!(format!("{algebra:?}"), algebra.to_string());

        let mut out = json!({});
        algebra.to_json(&mut out);
        assert_eq!(out["profile"]["p_part"], json!([2, 1]));
        assert_eq!(out["profile"]["truncated"], json!(true));
    }

    #[test]
    fn falls_back_to_listed_algebra() {
        let json = json!({"p": 3, "algebra": ["field"]});
        let Ok(algebra) = SteenrodAlgebra::from_json(&json, "milnor") else {
            // p = 3 is rejected without odd primes
            return;
        };
        assert!(matches!(algebra, SteenrodAlgebra::Field(_)));
        assert_eq!(algebra.to_string(), "F_3");
    }

    #[test]
    fn rejects_bad_input() {
        let err = SteenrodAlgebra::from_json(&json!({"p": 4}), "milnor").unwrap_err();
        assert_eq!(err.to_string(), "Invalid prime: 4");

        let err = SteenrodAlgebra::from_json(&json!({"p": 2}), "adem").unwrap_err();
        assert_eq!(err.to_string(), "Invalid algebra: adem");

        let json = json!({"p": 2, "profile": {"truncated": true, "p_part": [1, 2]}});
        assert!(SteenrodAlgebra::from_json(&json, "milnor").is_err());

        assert!(SteenrodAlgebra::from_json(&json!({"algebra": ["milnor"]}), "milnor").is_err());
    }

    #[test]
    fn rejects_q_part_not_closed_under_products() {
        if ValidPrime::try_new(3).is_none() {
            return;
        }
        let json = json!({"p": 3, "profile": {"q_part": 1}});
        let Err(err) = SteenrodAlgebra::from_json(&json, "milnor") else {
            panic!("Q_0 without Q_1 is not a subalgebra");
        };
        assert_eq!(
            err.downcast_ref::<AlgebraSpecError>(),
            Some(&AlgebraSpecError::InvalidProfile(MilnorProfile {
                truncated: false,
                q_part: 1,
                p_part: vec![],
            }))
        );

        let json = json!({"p": 3, "profile": {"truncated": true, "q_part": 3, "p_part": [1]}});
        let algebra = SteenrodAlgebra::from_json(&json, "milnor").unwrap();
        algebra.compute_basis(20);
        assert_eq!((0..=20).map(|d| algebra.dimension(d)).sum::<usize>(), 12);
    }
}
