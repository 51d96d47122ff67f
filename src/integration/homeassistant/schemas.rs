//! Home Assistant API Schemas
//! The schemas module defines the data structures used to interact with the Home Assistant API.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /api/states/<entity_id>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateCreateOrUpdate {
    pub state: String,
    pub attributes: Map<String, Value>,
}

/// Response of `GET /api/`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiStatus {
    pub message: String,
}
