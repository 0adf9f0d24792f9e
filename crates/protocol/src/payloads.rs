//! Request bodies for the bulk submission endpoints.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entities::LocalizedText;
use crate::types::Coordinate;

/// A new lane. All style fields are resolved; nothing is left to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneCreate {
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub path: Vec<Coordinate>,
    pub color: String,
    pub weight: u8,
    pub opacity: f64,
    pub service_id: Option<String>,
    pub route_ids: BTreeSet<String>,
    pub is_active: bool,
}

/// A full replacement of an existing lane's editable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneUpdate {
    pub id: String,
    #[serde(flatten)]
    pub fields: LaneCreate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopCreate {
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}
