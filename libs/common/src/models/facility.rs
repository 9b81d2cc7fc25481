//! Facility model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Facility entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
}

/// Facility create/update payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityInput {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
}
