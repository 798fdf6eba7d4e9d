use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Well-known resource type discriminators. The storage layer treats the
/// resource type as an open string; these are the values the platform
/// currently emits.
#[allow(dead_code)]
pub const RESOURCE_TYPE_CATALOG_CATEGORY: &str = "catalog_category";
#[allow(dead_code)]
pub const RESOURCE_TYPE_CATALOG_DATASET: &str = "catalog_dataset";
#[allow(dead_code)]
pub const RESOURCE_TYPE_DATA_VIEW: &str = "data_view";
#[allow(dead_code)]
pub const RESOURCE_TYPE_DATA_UNDERSTANDING: &str = "data_understanding";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResourceTag {
    pub id: i64,
    pub resource_id: i64,
    pub resource_type: String,
    pub tag_id: i64,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct AssignTagsForm {
    pub resource_id: i64,
    pub resource_type: String,
    pub tag_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UnassignTagsForm {
    pub resource_id: i64,
    pub resource_type: String,
    pub tag_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceTagsForm {
    pub resource_id: i64,
    pub resource_type: String,
    pub tag_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceTagsQuery {
    pub resource_id: i64,
    pub resource_type: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchByTagsForm {
    pub tag_ids: Vec<i64>,
    pub resource_type: String,
}

#[derive(Debug, Serialize)]
pub struct AssignTagsResponse {
    pub success: bool,
    pub assigned_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// A resource referencing a tag, as reported by the where-used listing.
#[derive(Debug, Serialize)]
pub struct TaggedResource {
    pub resource_id: i64,
    pub resource_type: String,
}

/// Search result entry. Resource detail hydration is owned by the resource
/// subsystems; this service returns identifiers with a placeholder name.
#[derive(Debug, Serialize)]
pub struct ResourceInfo {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

#[derive(Debug, Serialize)]
pub struct SearchByTagsResponse {
    pub total: i64,
    pub resources: Vec<ResourceInfo>,
}
