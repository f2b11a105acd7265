use super::{Desc, SampleValue};

/// Point-in-time copy of a registry, in registration order.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySnapshot {
    families: Vec<FamilySnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FamilySnapshot {
    pub desc: Desc,
    /// Sorted by label values.
    pub series: Vec<SeriesSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSnapshot {
    /// `(label_name, label_value)` in declaration order.
    pub labels: Vec<(String, String)>,
    pub value: SampleValue,
}

impl FamilySnapshot {
    pub(crate) fn new(desc: Desc, rows: Vec<(Vec<String>, SampleValue)>) -> Self {
        let series = rows
            .into_iter()
            .map(|(values, value)| SeriesSnapshot {
                labels: desc
                    .label_names
                    .iter()
                    .cloned()
                    .zip(values)
                    .collect(),
                value,
            })
            .collect();
        Self { desc, series }
    }

    fn find(&self, labels: &[(&str, &str)]) -> Option<&SeriesSnapshot> {
        self.series.iter().find(|s| {
            s.labels.len() == labels.len()
                && labels
                    .iter()
                    .all(|(k, v)| s.labels.iter().any(|(sk, sv)| sk.as_str() == *k && sv.as_str() == *v))
        })
    }
}

impl RegistrySnapshot {
    pub(crate) fn new(families: Vec<FamilySnapshot>) -> Self {
        Self { families }
    }

    pub fn families(&self) -> &[FamilySnapshot] {
        &self.families
    }

    pub fn family(&self, name: &str) -> Option<&FamilySnapshot> {
        self.families.iter().find(|f| f.desc.name == name)
    }

    /// Sample for one label combination (label order does not matter).
    pub fn sample(&self, name: &str, labels: &[(&str, &str)]) -> Option<&SampleValue> {
        self.family(name)?.find(labels).map(|s| &s.value)
    }

    /// Scalar value of a counter or gauge series.
    pub fn value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.sample(name, labels)?.as_f64()
    }
}
