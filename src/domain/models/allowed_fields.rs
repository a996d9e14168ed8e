use std::collections::BTreeSet;

/// Columns of the motor-vehicle dataset the chat front end ships with.
pub const DEFAULT_FIELDS: &[&str] = &[
    "Model",
    "MPG",
    "Cylinders",
    "Displacement",
    "Horsepower",
    "Weight",
    "Acceleration",
    "Year",
    "Origin",
];

/// Column names a chart specification may reference.
///
/// Built once and never mutated; shared across requests behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedFieldSet {
    fields: BTreeSet<String>,
}

impl AllowedFieldSet {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(Into::into)
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}

impl Default for AllowedFieldSet {
    fn default() -> Self {
        Self::new(DEFAULT_FIELDS.iter().copied())
    }
}
