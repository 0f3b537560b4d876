use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use serde_json::Value;

use algebra::module::FreeModule;
use algebra::SteenrodAlgebra;

const STATIC_MODULES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/modules");

/// A config object specifies how a free module should be constructed.
#[derive(Clone, Debug)]
pub struct Config {
    /// The json specification of the module
    pub module: Value,
    /// The name of the algebra, `"milnor"` or `"field"`
    pub algebra: String,
}

/// Loads the module named `module_name`, optionally followed by a shift, e.g. `S_2[2]`.
pub fn parse_module_name(module_name: &str) -> anyhow::Result<Value> {
    let mut args = module_name.split('[');
    let name = args.next().unwrap_or_default();
    let mut module = load_module_json(name)?;
    if let Some(shift) = args.next() {
        let shift: i64 = shift
            .strip_suffix(']')
            .ok_or_else(|| anyhow!("Invalid module name: {module_name}"))?
            .parse()
            .with_context(|| format!("Invalid shift in {module_name}"))?;
        let gens = module["gens"]
            .as_object_mut()
            .ok_or_else(|| anyhow!("Module {name} has no generators"))?;
        for degree in gens.values_mut() {
            let d = degree
                .as_i64()
                .ok_or_else(|| anyhow!("Invalid generator degree {degree}"))?;
            *degree = (d + shift).into();
        }
    }
    Ok(module)
}

impl TryFrom<&str> for Config {
    type Error = anyhow::Error;

    /// Parses `module_name@algebra`, where the algebra defaults to `milnor`.
    fn try_from(spec: &str) -> Result<Self, Self::Error> {
        let mut args = spec.split('@');
        let module_name = args.next().unwrap_or_default();
        let algebra = args.next().unwrap_or("milnor").to_string();
        Ok(Self {
            module: parse_module_name(module_name)?,
            algebra,
        })
    }
}

impl TryFrom<(&str, &str)> for Config {
    type Error = anyhow::Error;

    fn try_from((module_name, algebra): (&str, &str)) -> Result<Self, Self::Error> {
        Ok(Self {
            module: parse_module_name(module_name)?,
            algebra: algebra.to_string(),
        })
    }
}

impl From<(Value, &str)> for Config {
    fn from((module, algebra): (Value, &str)) -> Self {
        Self {
            module,
            algebra: algebra.to_string(),
        }
    }
}

/// Constructs a free module according to the specification.
///
/// # Arguments
///  - `module_spec`: anything that converts into a [`Config`]. In practice this is
///     - A [`Config`] object itself
///     - `(json, algebra)`: a [`serde_json::Value`] specifying the module and the name of the
///       algebra.
///     - `(module_name, algebra)`: the name of a module, searched for in the current directory,
///       `$CWD/modules` and the bundled `modules` directory. The module can be shifted by
///       appending e.g. `[2]`.
///     - a single `&str` of the form `module_name@algebra`.
pub fn construct<T, E>(module_spec: T) -> anyhow::Result<Arc<FreeModule<SteenrodAlgebra>>>
where
    anyhow::Error: From<E>,
    T: TryInto<Config, Error = E>,
{
    let Config {
        module: json,
        algebra,
    } = module_spec.try_into()?;
    construct_from_json(&json, &algebra)
}

pub fn construct_from_json(
    json: &Value,
    algebra_name: &str,
) -> anyhow::Result<Arc<FreeModule<SteenrodAlgebra>>> {
    let algebra = Arc::new(
        SteenrodAlgebra::from_json(json, algebra_name).context("Failed to construct algebra")?,
    );
    let module =
        FreeModule::from_json(algebra, json).context("Failed to construct free module")?;
    tracing::info!(module = %module, gens = module.num_gens(), "constructed free module");
    Ok(Arc::new(module))
}

pub fn load_module_json(name: &str) -> anyhow::Result<Value> {
    let current_dir = std::env::current_dir().context("Failed to read current directory")?;
    let relative_dir = current_dir.join("modules");

    for path in [current_dir, relative_dir, PathBuf::from(STATIC_MODULES_PATH)] {
        let mut path = path.join(name);
        path.set_extension("json");
        if let Ok(s) = std::fs::read_to_string(&path) {
            return serde_json::from_str(&s)
                .with_context(|| format!("Failed to parse {}", path.display()));
        }
    }
    Err(anyhow!("Module file '{name}' not found on path"))
}

/// Installs a `tracing` subscriber printing to stderr, filtered by `RUST_LOG`. Later calls have no
/// effect.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
