use std::sync::Arc;

use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::resource_tag::{ResourceInfo, TaggedResource};
use crate::models::tag::{
    CreateTagForm, NewTag, Tag, TagInfo, UpdateTagForm, DEFAULT_COLOR, STATUS_DISABLED,
    STATUS_ENABLED,
};
use crate::stores::{ResourceTagStore, TagStore};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PAGE_SIZE: i64 = 20;

/// Orchestrates tag CRUD and resource associations over the two stores.
/// Stores are injected at construction so tests can substitute the in-memory
/// doubles.
pub struct TagService {
    tags: Arc<dyn TagStore>,
    resource_tags: Arc<dyn ResourceTagStore>,
}

impl TagService {
    pub fn new(tags: Arc<dyn TagStore>, resource_tags: Arc<dyn ResourceTagStore>) -> Self {
        TagService {
            tags,
            resource_tags,
        }
    }

    pub async fn create_tag(&self, principal_id: i64, form: &CreateTagForm) -> AppResult<i64> {
        form.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.tags.find_by_name(&form.name).await?.is_some() {
            return Err(AppError::Conflict("Tag name already exists".to_string()));
        }

        let color = form
            .color
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COLOR.to_string());

        let tag = self
            .tags
            .insert(NewTag {
                name: form.name.clone(),
                description: form.description.clone(),
                color,
                status: STATUS_ENABLED,
                created_by: principal_id,
            })
            .await?;

        tracing::info!("tag created: id={}, name={}", tag.id, tag.name);
        Ok(tag.id)
    }

    pub async fn update_tag(
        &self,
        principal_id: i64,
        id: i64,
        form: &UpdateTagForm,
    ) -> AppResult<()> {
        form.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let mut existing = self.tags.find_one(id).await?;

        // Re-check uniqueness only when the name actually changes.
        if form.name != existing.name
            && self.tags.find_by_name(&form.name).await?.is_some()
        {
            return Err(AppError::Conflict("Tag name already exists".to_string()));
        }

        existing.name = form.name.clone();
        existing.description = form.description.clone();
        existing.color = form.color.clone();
        existing.status = form.status;
        existing.updated_by = Some(principal_id);

        self.tags.update(&existing).await
    }

    pub async fn delete_tag(&self, id: i64) -> AppResult<()> {
        self.tags.find_one(id).await?;

        let count = self.resource_tags.count_by_tag(id).await?;
        if count > 0 {
            return Err(AppError::TagInUse(
                "Tag is in use and cannot be deleted".to_string(),
            ));
        }

        self.tags.delete(id).await
    }

    pub async fn get_tag(&self, id: i64) -> AppResult<TagInfo> {
        let tag = self.tags.find_one(id).await?;
        // Best-effort usage count on read paths: a count failure degrades to
        // zero instead of failing the lookup.
        let usage_count = self.resource_tags.count_by_tag(tag.id).await.unwrap_or(0);
        Ok(TagInfo::from_tag(tag, usage_count))
    }

    pub async fn list_tags(
        &self,
        page: i64,
        page_size: i64,
        keyword: &str,
    ) -> AppResult<(Vec<TagInfo>, i64)> {
        let page = if page <= 0 { DEFAULT_PAGE } else { page };
        let page_size = if page_size <= 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };

        let (tags, total) = if keyword.is_empty() {
            self.tags.list(page, page_size).await?
        } else {
            self.tags.search(keyword, page, page_size).await?
        };

        let mut list = Vec::with_capacity(tags.len());
        for tag in tags {
            let usage_count = self.resource_tags.count_by_tag(tag.id).await.unwrap_or(0);
            list.push(TagInfo::from_tag(tag, usage_count));
        }

        Ok((list, total))
    }

    pub async fn all_tags(&self) -> AppResult<Vec<Tag>> {
        self.tags.find_all().await
    }

    pub async fn update_tag_status(&self, id: i64, status: i32) -> AppResult<()> {
        if status != STATUS_ENABLED && status != STATUS_DISABLED {
            return Err(AppError::Validation("Invalid tag status".to_string()));
        }

        self.tags.find_one(id).await?;
        self.tags.update_status(id, status).await
    }

    pub async fn assign_tags(
        &self,
        resource_id: i64,
        resource_type: &str,
        tag_ids: &[i64],
    ) -> AppResult<usize> {
        self.ensure_tags_exist(tag_ids).await?;

        self.resource_tags
            .batch_assign(resource_id, resource_type, tag_ids)
            .await?;

        Ok(tag_ids.len())
    }

    /// No existence prechecks on removal: unassigning a nonexistent
    /// association is harmless.
    pub async fn unassign_tags(
        &self,
        resource_id: i64,
        resource_type: &str,
        tag_ids: &[i64],
    ) -> AppResult<()> {
        self.resource_tags
            .batch_unassign(resource_id, resource_type, tag_ids)
            .await
    }

    pub async fn replace_tags(
        &self,
        resource_id: i64,
        resource_type: &str,
        tag_ids: &[i64],
    ) -> AppResult<()> {
        self.ensure_tags_exist(tag_ids).await?;

        self.resource_tags
            .replace_tags(resource_id, resource_type, tag_ids)
            .await
    }

    pub async fn get_resource_tags(
        &self,
        resource_id: i64,
        resource_type: &str,
    ) -> AppResult<Vec<TagInfo>> {
        let tag_ids = self
            .resource_tags
            .get_resource_tags(resource_id, resource_type)
            .await?;

        let mut list = Vec::with_capacity(tag_ids.len());
        for tag_id in tag_ids {
            // A tag deleted between the id listing and the lookup is skipped.
            match self.tags.find_one(tag_id).await {
                Ok(tag) => {
                    let usage_count =
                        self.resource_tags.count_by_tag(tag.id).await.unwrap_or(0);
                    list.push(TagInfo::from_tag(tag, usage_count));
                }
                Err(AppError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(list)
    }

    pub async fn get_tag_resources(&self, tag_id: i64) -> AppResult<Vec<TaggedResource>> {
        self.tags.find_one(tag_id).await?;

        let rows = self.resource_tags.find_by_tag(tag_id).await?;
        Ok(rows
            .into_iter()
            .map(|r| TaggedResource {
                resource_id: r.resource_id,
                resource_type: r.resource_type,
            })
            .collect())
    }

    pub async fn search_by_tags(
        &self,
        tag_ids: &[i64],
        resource_type: &str,
    ) -> AppResult<Vec<ResourceInfo>> {
        let resource_ids = self
            .resource_tags
            .find_by_tags(tag_ids, resource_type)
            .await?;

        // Resource detail hydration belongs to the owning subsystems; only
        // identifiers and a placeholder name are returned here.
        Ok(resource_ids
            .into_iter()
            .map(|id| ResourceInfo {
                id,
                name: format!("Resource-{}", id),
                resource_type: resource_type.to_string(),
            })
            .collect())
    }

    async fn ensure_tags_exist(&self, tag_ids: &[i64]) -> AppResult<()> {
        for tag_id in tag_ids {
            match self.tags.find_one(*tag_id).await {
                Ok(_) => {}
                Err(AppError::NotFound(_)) => {
                    return Err(AppError::Validation(format!(
                        "Tag {} does not exist",
                        tag_id
                    )));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
