pub mod pg;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::resource_tag::ResourceTag;
use crate::models::tag::{NewTag, Tag};

/// Canonical tag records. One Postgres implementation (`pg::PgTagStore`) and
/// one in-memory test double (`memory::MemoryTagStore`).
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Inserts a new tag and returns the stored record with its assigned id.
    async fn insert(&self, data: NewTag) -> AppResult<Tag>;

    /// Fetches a tag by id. Absent ids are a `NotFound` error, distinct from
    /// other storage failures.
    async fn find_one(&self, id: i64) -> AppResult<Tag>;

    /// Uniqueness probe: `None` when no tag carries the name. Exact,
    /// case-sensitive match.
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Tag>>;

    /// Overwrites name/description/color/status and the updating principal.
    async fn update(&self, data: &Tag) -> AppResult<()>;

    async fn delete(&self, id: i64) -> AppResult<()>;

    async fn find_all(&self) -> AppResult<Vec<Tag>>;

    /// Offset-paged listing, newest first. Returns `(items, total_count)`.
    async fn list(&self, page: i64, page_size: i64) -> AppResult<(Vec<Tag>, i64)>;

    /// Case-insensitive substring search over name OR description. An empty
    /// keyword behaves exactly like `list`.
    async fn search(&self, keyword: &str, page: i64, page_size: i64)
        -> AppResult<(Vec<Tag>, i64)>;

    /// Narrow single-column status update.
    async fn update_status(&self, id: i64, status: i32) -> AppResult<()>;
}

/// The (resource, tag) many-to-many mapping.
#[async_trait]
pub trait ResourceTagStore: Send + Sync {
    /// Idempotent insert-if-absent of one (resource, type, tag) triple. Safe
    /// under concurrent duplicate calls.
    async fn assign(&self, resource_id: i64, resource_type: &str, tag_id: i64) -> AppResult<()>;

    /// Deletes the triple if present; deleting an absent triple succeeds.
    async fn unassign(&self, resource_id: i64, resource_type: &str, tag_id: i64) -> AppResult<()>;

    /// Tag ids currently attached to the resource.
    async fn get_resource_tags(
        &self,
        resource_id: i64,
        resource_type: &str,
    ) -> AppResult<Vec<i64>>;

    /// Per-row insert-if-absent for each id in `tag_ids`; empty input skips
    /// work entirely.
    async fn batch_assign(
        &self,
        resource_id: i64,
        resource_type: &str,
        tag_ids: &[i64],
    ) -> AppResult<()>;

    /// Deletes all matching triples; empty input is a no-op.
    async fn batch_unassign(
        &self,
        resource_id: i64,
        resource_type: &str,
        tag_ids: &[i64],
    ) -> AppResult<()>;

    /// Atomically replaces the resource's association set with `tag_ids`.
    /// Runs as one transaction: readers never observe a partially applied
    /// state, and a failure rolls everything back.
    async fn replace_tags(
        &self,
        resource_id: i64,
        resource_type: &str,
        tag_ids: &[i64],
    ) -> AppResult<()>;

    async fn find_by_resource(
        &self,
        resource_id: i64,
        resource_type: &str,
    ) -> AppResult<Vec<ResourceTag>>;

    async fn find_by_tag(&self, tag_id: i64) -> AppResult<Vec<ResourceTag>>;

    /// AND-intersection: resource ids whose association set contains every id
    /// in `tag_ids` within the given resource type. Empty input returns an
    /// empty result. Duplicate ids in the input are not deduplicated.
    async fn find_by_tags(&self, tag_ids: &[i64], resource_type: &str) -> AppResult<Vec<i64>>;

    /// Association rows referencing the tag, across all resource types.
    async fn count_by_tag(&self, tag_id: i64) -> AppResult<i64>;
}
