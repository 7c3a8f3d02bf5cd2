use anyhow::Result;
use crate::data::X;

/// Ordered, optionally named collection of tensors passed between the
/// pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct Xs {
    names: Vec<String>,
    values: Vec<X>,
}

impl From<X> for Xs {
    fn from(x: X) -> Self {
        Self::from(vec![x])
    }
}

impl From<Vec<X>> for Xs {
    fn from(values: Vec<X>) -> Self {
        let names = (0..values.len()).map(|i| i.to_string()).collect();
        Self { names, values }
    }
}

impl std::ops::Index<usize> for Xs {
    type Output = X;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl Xs {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push_kv(&mut self, key: &str, value: X) -> Result<()> {
        if self.names.iter().any(|name| name == key) {
            anyhow::bail!("Tensor named '{}' already present", key);
        }
        self.names.push(key.to_string());
        self.values.push(value);
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, X> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
