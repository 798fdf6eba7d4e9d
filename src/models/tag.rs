use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::time::format_timestamp;

/// Default display color applied when a tag is created without one.
pub const DEFAULT_COLOR: &str = "#1890ff";

pub const STATUS_DISABLED: i32 = 0;
pub const STATUS_ENABLED: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub color: String,
    pub status: i32,
    pub created_by: i64,
    pub updated_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Insert shape: everything the store does not assign itself.
#[derive(Debug, Clone)]
pub struct NewTag {
    pub name: String,
    pub description: String,
    pub color: String,
    pub status: i32,
    pub created_by: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTagForm {
    #[validate(length(min = 2, max = 50, message = "tag name must be 2-50 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 200, message = "tag description must be at most 200 characters"))]
    pub description: String,

    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTagForm {
    #[validate(length(min = 2, max = 50, message = "tag name must be 2-50 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 200, message = "tag description must be at most 200 characters"))]
    pub description: String,

    pub color: String,

    pub status: i32,
}

#[derive(Debug, Deserialize)]
pub struct TagStatusForm {
    pub status: i32,
}

#[derive(Debug, Deserialize)]
pub struct ListTagsQuery {
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub page_size: i64,
    #[serde(default)]
    pub keyword: String,
}

/// Read shape for a tag: the stored record plus its live usage count and a
/// display-formatted creation time.
#[derive(Debug, Serialize)]
pub struct TagInfo {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub color: String,
    pub status: i32,
    pub usage_count: i64,
    pub created_at: String,
}

impl TagInfo {
    pub fn from_tag(tag: Tag, usage_count: i64) -> Self {
        TagInfo {
            id: tag.id,
            name: tag.name,
            description: tag.description,
            color: tag.color,
            status: tag.status,
            usage_count,
            created_at: format_timestamp(tag.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateTagResponse {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct TagListResponse {
    pub total: i64,
    pub list: Vec<TagInfo>,
}
