use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::errors::EngineError;

/// Key path into the rate catalog, e.g. `carcass > BWP > WHITE`.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RatePath(pub Vec<String>);

impl RatePath {
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for RatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" > "))
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog root must be a json object")]
    RootNotObject,
    #[error("catalog leaf at `{path}` is invalid: {reason}")]
    InvalidLeaf { path: RatePath, reason: String },
}

/// Read-only rate tree flattened into a path-keyed map.
///
/// Paths sharing a prefix are contiguous in the map ordering, so subtree
/// membership and child enumeration are range scans.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RateCatalog {
    rates: BTreeMap<Vec<String>, Decimal>,
}

impl RateCatalog {
    pub fn from_rates<I, P>(rates: I) -> Self
    where
        I: IntoIterator<Item = (P, Decimal)>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let rates = rates
            .into_iter()
            .map(|(path, rate)| (path.into_iter().map(Into::into).collect(), rate))
            .collect();
        Self { rates }
    }

    pub fn from_json_value(value: &Value) -> Result<Self, CatalogError> {
        let Value::Object(root) = value else {
            return Err(CatalogError::RootNotObject);
        };

        let mut rates = BTreeMap::new();
        let mut prefix = Vec::new();
        for (key, child) in root {
            prefix.push(key.clone());
            flatten_into(child, &mut prefix, &mut rates)?;
            prefix.pop();
        }

        debug!(event_name = "catalog.loaded", rate_count = rates.len(), "rate catalog flattened");
        Ok(Self { rates })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_json_value(&value)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_json_str(&raw)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn get(&self, path: &[&str]) -> Option<Decimal> {
        let key: Vec<String> = path.iter().map(|segment| (*segment).to_owned()).collect();
        self.rates.get(&key).copied()
    }

    /// Rate at `path`, or `PricingNotFound` naming the attempted path.
    pub fn lookup(&self, path: &[&str]) -> Result<Decimal, EngineError> {
        self.get(path).ok_or_else(|| EngineError::PricingNotFound {
            path: RatePath::from_segments(path.iter().copied()),
        })
    }

    /// True when `path` is a leaf or the prefix of at least one leaf.
    pub fn contains(&self, path: &[&str]) -> bool {
        self.subtree(path).next().is_some()
    }

    pub fn is_leaf(&self, path: &[&str]) -> bool {
        self.get(path).is_some()
    }

    /// Distinct next segments below `path`, in catalog order.
    pub fn children(&self, path: &[&str]) -> Vec<String> {
        let depth = path.len();
        let names: BTreeSet<&String> =
            self.subtree(path).filter_map(|(key, _)| key.get(depth)).collect();
        names.into_iter().cloned().collect()
    }

    fn subtree<'a>(
        &'a self,
        path: &[&str],
    ) -> impl Iterator<Item = (&'a Vec<String>, &'a Decimal)> + 'a {
        let start: Vec<String> = path.iter().map(|segment| (*segment).to_owned()).collect();
        let prefix = start.clone();
        self.rates.range(start..).take_while(move |(key, _)| key.starts_with(&prefix))
    }
}

fn flatten_into(
    value: &Value,
    prefix: &mut Vec<String>,
    rates: &mut BTreeMap<Vec<String>, Decimal>,
) -> Result<(), CatalogError> {
    match value {
        Value::Object(children) => {
            for (key, child) in children {
                prefix.push(key.clone());
                flatten_into(child, prefix, rates)?;
                prefix.pop();
            }
            Ok(())
        }
        Value::Number(number) => {
            let rate = Decimal::from_str(&number.to_string())
                .or_else(|_| Decimal::from_scientific(&number.to_string()))
                .map_err(|error| invalid_leaf(prefix, format!("not a decimal: {error}")))?;
            if rate.is_sign_negative() && !rate.is_zero() {
                return Err(invalid_leaf(prefix, format!("negative rate {rate}")));
            }
            rates.insert(prefix.clone(), rate);
            Ok(())
        }
        Value::Null => Err(invalid_leaf(prefix, "null leaf".to_owned())),
        Value::Bool(_) => Err(invalid_leaf(prefix, "boolean leaf".to_owned())),
        Value::String(_) => Err(invalid_leaf(prefix, "string leaf".to_owned())),
        Value::Array(_) => Err(invalid_leaf(prefix, "array leaf".to_owned())),
    }
}

fn invalid_leaf(prefix: &[String], reason: String) -> CatalogError {
    CatalogError::InvalidLeaf { path: RatePath(prefix.to_vec()), reason }
}
