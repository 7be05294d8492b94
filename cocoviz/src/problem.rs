use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Description of a specific (benchmark) problem instance.
///
/// Ordering and equality are structural over `name`, `instance`,
/// `number_of_variables` and `number_of_objectives`, in that order, so a
/// `ProblemDescription` can be used directly as a `BTreeMap` or `HashMap` key.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProblemDescription {
    pub name: String,
    pub instance: String,
    #[serde(default)]
    pub number_of_variables: u64,
    #[serde(default)]
    pub number_of_objectives: u64,
}

impl ProblemDescription {
    pub fn new(
        name: impl Into<String>,
        instance: impl Into<String>,
        number_of_variables: u64,
        number_of_objectives: u64,
    ) -> Self {
        Self {
            name: name.into(),
            instance: instance.into(),
            number_of_variables,
            number_of_objectives,
        }
    }

    /// Convert the problem description into a JSON document.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// Create a `ProblemDescription` from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}

impl std::fmt::Display for ProblemDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Instance {} of problem {} with {} variables and {} objectives",
            self.instance, self.name, self.number_of_variables, self.number_of_objectives
        )
    }
}
