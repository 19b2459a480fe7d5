use serde::{Deserialize, Serialize};

pub const FALLBACK_CENTRE_NAME: &str = "Centre";

/// Selected centre, injected into every service that scopes queries or labels exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CentreScope {
    pub id: Option<i64>,
    #[serde(default = "fallback_centre_name")]
    pub name: String,
}

fn fallback_centre_name() -> String {
    FALLBACK_CENTRE_NAME.to_string()
}

impl Default for CentreScope {
    fn default() -> Self {
        Self {
            id: None,
            name: fallback_centre_name(),
        }
    }
}

impl CentreScope {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            id: self.id,
            name: name.into(),
        }
    }
}
