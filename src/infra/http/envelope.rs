use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::usecase::ports::transport::ApiError;

/// Paginated list body: `{results, count, next, previous}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope<R> {
    pub results: Vec<R>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Listing<R> {
    Envelope(Envelope<R>),
    /// Small fixed collections come back as a plain array.
    Bare(Vec<R>),
}

impl<R> Listing<R> {
    pub fn into_items(self) -> Vec<R> {
        match self {
            Listing::Envelope(envelope) => envelope.results,
            Listing::Bare(items) => items,
        }
    }
}

pub fn parse_listing<R: DeserializeOwned>(body: &str) -> Result<Listing<R>, ApiError> {
    let value: Value = serde_json::from_str(body).map_err(ApiError::decode)?;
    match value {
        Value::Array(_) => serde_json::from_value::<Vec<R>>(value)
            .map(Listing::Bare)
            .map_err(ApiError::decode),
        Value::Object(ref map) if map.contains_key("results") => {
            serde_json::from_value::<Envelope<R>>(value)
                .map(Listing::Envelope)
                .map_err(ApiError::decode)
        }
        _ => Err(ApiError::Decode(
            "expected a list or a paginated envelope".to_string(),
        )),
    }
}

pub fn parse_record<R: DeserializeOwned>(body: &str) -> Result<R, ApiError> {
    serde_json::from_str(body).map_err(ApiError::decode)
}
