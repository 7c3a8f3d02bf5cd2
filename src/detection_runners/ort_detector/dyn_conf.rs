/// Per-class confidence thresholds.
///
/// Built from zero or more values: missing trailing classes reuse the last
/// given threshold (or `0.25` when none was given).
#[derive(Debug, Clone, PartialEq)]
pub struct DynConf(Vec<f32>);

impl std::ops::Index<usize> for DynConf {
    type Output = f32;

    fn index(&self, i: usize) -> &Self::Output {
        &self.0[i]
    }
}

impl DynConf {
    pub fn new(confs: &[f32], nc: usize) -> Self {
        let fill = confs.last().copied().unwrap_or(0.25);
        let mut values: Vec<f32> = confs.iter().take(nc).copied().collect();
        values.resize(nc, fill);
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
