use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Variable bindings visible to expressions.
///
/// Ordered by name so snapshots compare and serialize deterministically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment {
    vars: BTreeMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.vars.get(name).copied()
    }

    /// Binds `name`, returning the previous value if there was one.
    pub fn bind<S: Into<String>>(&mut self, name: S, value: Value) -> Option<Value> {
        self.vars.insert(name.into(), value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for Environment {
    fn from_iter<T: IntoIterator<Item = (S, Value)>>(iter: T) -> Self {
        Environment {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
