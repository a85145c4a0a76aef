//! Response types for the model listing endpoint.

use serde::{Deserialize, Serialize};

/// `created` timestamp used when a backend omits one
pub const DEFAULT_MODEL_CREATED: i64 = 1_680_000_000;

/// One entry of the aggregated model catalog (OpenAI `model` object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCatalogEntry {
    /// Backend-prefixed model id
    pub id: String,
    /// Always `"model"`
    pub object: String,
    /// Unix timestamp in seconds
    pub created: i64,
    /// Backend name
    pub owned_by: String,
}

impl ModelCatalogEntry {
    /// Create a catalog entry
    pub fn new(id: impl Into<String>, owned_by: impl Into<String>, created: Option<i64>) -> Self {
        Self {
            id: id.into(),
            object: "model".to_string(),
            created: created.unwrap_or(DEFAULT_MODEL_CREATED),
            owned_by: owned_by.into(),
        }
    }
}

/// `GET /v1/models` response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsResponse {
    /// Always `"list"`
    pub object: String,
    /// Catalog entries
    pub data: Vec<ModelCatalogEntry>,
}

impl ModelsResponse {
    /// Wrap catalog entries in a list object
    #[must_use]
    pub fn new(data: Vec<ModelCatalogEntry>) -> Self {
        Self {
            object: "list".to_string(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_defaults_created() {
        let entry = ModelCatalogEntry::new("openai:gpt-4", "openai", None);
        assert_eq!(entry.created, DEFAULT_MODEL_CREATED);
        assert_eq!(entry.object, "model");
    }

    #[test]
    fn test_models_response_shape() {
        let response =
            ModelsResponse::new(vec![ModelCatalogEntry::new("openai:gpt-4", "openai", Some(42))]);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["object"], "list");
        assert_eq!(json["data"][0]["id"], "openai:gpt-4");
        assert_eq!(json["data"][0]["created"], 42);
        assert_eq!(json["data"][0]["owned_by"], "openai");
    }
}
