//! In-memory store doubles for tests. Same contracts as the Postgres
//! implementations, backed by mutex-held vectors, with an injectable insert
//! failure so transactional rollback behavior can be exercised without a
//! database.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::models::resource_tag::ResourceTag;
use crate::models::tag::{NewTag, Tag};
use crate::stores::{ResourceTagStore, TagStore};
use crate::utils::time::current_timestamp_seconds;

#[derive(Default)]
pub struct MemoryTagStore {
    tags: Mutex<Vec<Tag>>,
    next_id: AtomicI64,
}

impl MemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn page_slice(items: Vec<Tag>, page: i64, page_size: i64) -> Vec<Tag> {
        let offset = ((page - 1) * page_size).max(0) as usize;
        items
            .into_iter()
            .skip(offset)
            .take(page_size.max(0) as usize)
            .collect()
    }
}

#[async_trait]
impl TagStore for MemoryTagStore {
    async fn insert(&self, data: NewTag) -> AppResult<Tag> {
        let now = current_timestamp_seconds();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;

        let tag = Tag {
            id,
            name: data.name,
            description: data.description,
            color: data.color,
            status: data.status,
            created_by: data.created_by,
            updated_by: None,
            created_at: now,
            updated_at: now,
        };

        self.tags.lock().unwrap().push(tag.clone());
        Ok(tag)
    }

    async fn find_one(&self, id: i64) -> AppResult<Tag> {
        self.tags
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Tag>> {
        Ok(self
            .tags
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn update(&self, data: &Tag) -> AppResult<()> {
        let mut tags = self.tags.lock().unwrap();
        if let Some(tag) = tags.iter_mut().find(|t| t.id == data.id) {
            tag.name = data.name.clone();
            tag.description = data.description.clone();
            tag.color = data.color.clone();
            tag.status = data.status;
            tag.updated_by = data.updated_by;
            tag.updated_at = current_timestamp_seconds();
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        self.tags.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }

    async fn find_all(&self) -> AppResult<Vec<Tag>> {
        let mut tags = self.tags.lock().unwrap().clone();
        tags.sort_by_key(|t| std::cmp::Reverse(t.created_at));
        Ok(tags)
    }

    async fn list(&self, page: i64, page_size: i64) -> AppResult<(Vec<Tag>, i64)> {
        let all = self.find_all().await?;
        let total = all.len() as i64;
        Ok((Self::page_slice(all, page, page_size), total))
    }

    async fn search(
        &self,
        keyword: &str,
        page: i64,
        page_size: i64,
    ) -> AppResult<(Vec<Tag>, i64)> {
        if keyword.is_empty() {
            return self.list(page, page_size).await;
        }

        let needle = keyword.to_lowercase();
        let matches: Vec<Tag> = self
            .find_all()
            .await?
            .into_iter()
            .filter(|t| {
                t.name.to_lowercase().contains(&needle)
                    || t.description.to_lowercase().contains(&needle)
            })
            .collect();
        let total = matches.len() as i64;
        Ok((Self::page_slice(matches, page, page_size), total))
    }

    async fn update_status(&self, id: i64, status: i32) -> AppResult<()> {
        let mut tags = self.tags.lock().unwrap();
        if let Some(tag) = tags.iter_mut().find(|t| t.id == id) {
            tag.status = status;
            tag.updated_at = current_timestamp_seconds();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryResourceTagStore {
    rows: Mutex<Vec<ResourceTag>>,
    next_id: AtomicI64,
    fail_next_insert: AtomicBool,
}

impl MemoryResourceTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next row insert fail, for exercising rollback paths.
    pub fn inject_insert_failure(&self) {
        self.fail_next_insert.store(true, Ordering::SeqCst);
    }

    fn try_insert(
        &self,
        rows: &mut Vec<ResourceTag>,
        resource_id: i64,
        resource_type: &str,
        tag_id: i64,
    ) -> AppResult<()> {
        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(AppError::Internal("injected insert failure".to_string()));
        }

        let exists = rows.iter().any(|r| {
            r.resource_id == resource_id && r.resource_type == resource_type && r.tag_id == tag_id
        });
        if exists {
            return Ok(());
        }

        rows.push(ResourceTag {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            resource_id,
            resource_type: resource_type.to_string(),
            tag_id,
            created_at: current_timestamp_seconds(),
        });
        Ok(())
    }
}

#[async_trait]
impl ResourceTagStore for MemoryResourceTagStore {
    async fn assign(&self, resource_id: i64, resource_type: &str, tag_id: i64) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        self.try_insert(&mut rows, resource_id, resource_type, tag_id)
    }

    async fn unassign(&self, resource_id: i64, resource_type: &str, tag_id: i64) -> AppResult<()> {
        self.rows.lock().unwrap().retain(|r| {
            !(r.resource_id == resource_id
                && r.resource_type == resource_type
                && r.tag_id == tag_id)
        });
        Ok(())
    }

    async fn get_resource_tags(
        &self,
        resource_id: i64,
        resource_type: &str,
    ) -> AppResult<Vec<i64>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.resource_id == resource_id && r.resource_type == resource_type)
            .map(|r| r.tag_id)
            .collect())
    }

    async fn batch_assign(
        &self,
        resource_id: i64,
        resource_type: &str,
        tag_ids: &[i64],
    ) -> AppResult<()> {
        if tag_ids.is_empty() {
            return Ok(());
        }

        let mut rows = self.rows.lock().unwrap();
        let snapshot = rows.clone();
        for tag_id in tag_ids {
            if let Err(e) = self.try_insert(&mut rows, resource_id, resource_type, *tag_id) {
                *rows = snapshot;
                return Err(e);
            }
        }
        Ok(())
    }

    async fn batch_unassign(
        &self,
        resource_id: i64,
        resource_type: &str,
        tag_ids: &[i64],
    ) -> AppResult<()> {
        if tag_ids.is_empty() {
            return Ok(());
        }

        self.rows.lock().unwrap().retain(|r| {
            !(r.resource_id == resource_id
                && r.resource_type == resource_type
                && tag_ids.contains(&r.tag_id))
        });
        Ok(())
    }

    async fn replace_tags(
        &self,
        resource_id: i64,
        resource_type: &str,
        tag_ids: &[i64],
    ) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let snapshot = rows.clone();

        rows.retain(|r| !(r.resource_id == resource_id && r.resource_type == resource_type));
        for tag_id in tag_ids {
            if let Err(e) = self.try_insert(&mut rows, resource_id, resource_type, *tag_id) {
                *rows = snapshot;
                return Err(e);
            }
        }
        Ok(())
    }

    async fn find_by_resource(
        &self,
        resource_id: i64,
        resource_type: &str,
    ) -> AppResult<Vec<ResourceTag>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.resource_id == resource_id && r.resource_type == resource_type)
            .cloned()
            .collect())
    }

    async fn find_by_tag(&self, tag_id: i64) -> AppResult<Vec<ResourceTag>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.tag_id == tag_id)
            .cloned()
            .collect())
    }

    async fn find_by_tags(&self, tag_ids: &[i64], resource_type: &str) -> AppResult<Vec<i64>> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.rows.lock().unwrap();
        let mut counts: std::collections::HashMap<i64, i64> = std::collections::HashMap::new();
        for row in rows
            .iter()
            .filter(|r| r.resource_type == resource_type && tag_ids.contains(&r.tag_id))
        {
            *counts.entry(row.resource_id).or_insert(0) += 1;
        }

        let mut resource_ids: Vec<i64> = counts
            .into_iter()
            .filter(|(_, count)| *count == tag_ids.len() as i64)
            .map(|(resource_id, _)| resource_id)
            .collect();
        resource_ids.sort_unstable();
        Ok(resource_ids)
    }

    async fn count_by_tag(&self, tag_id: i64) -> AppResult<i64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.tag_id == tag_id)
            .count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resource_tag::{
        RESOURCE_TYPE_CATALOG_CATEGORY, RESOURCE_TYPE_CATALOG_DATASET, RESOURCE_TYPE_DATA_VIEW,
    };

    #[tokio::test]
    async fn assign_is_idempotent() {
        let store = MemoryResourceTagStore::new();

        store
            .assign(100, RESOURCE_TYPE_CATALOG_CATEGORY, 1)
            .await
            .unwrap();
        store
            .assign(100, RESOURCE_TYPE_CATALOG_CATEGORY, 1)
            .await
            .unwrap();

        let rows = store
            .find_by_resource(100, RESOURCE_TYPE_CATALOG_CATEGORY)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(store.count_by_tag(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unassign_absent_triple_succeeds() {
        let store = MemoryResourceTagStore::new();

        store
            .unassign(100, RESOURCE_TYPE_CATALOG_CATEGORY, 99)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn batch_assign_and_unassign() {
        let store = MemoryResourceTagStore::new();

        store
            .batch_assign(100, RESOURCE_TYPE_CATALOG_CATEGORY, &[1, 2, 3])
            .await
            .unwrap();
        let rows = store
            .find_by_resource(100, RESOURCE_TYPE_CATALOG_CATEGORY)
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);

        store
            .batch_unassign(100, RESOURCE_TYPE_CATALOG_CATEGORY, &[1, 2])
            .await
            .unwrap();
        let rows = store
            .find_by_resource(100, RESOURCE_TYPE_CATALOG_CATEGORY)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tag_id, 3);
    }

    #[tokio::test]
    async fn batch_assign_skips_existing_rows() {
        let store = MemoryResourceTagStore::new();

        store
            .assign(100, RESOURCE_TYPE_CATALOG_CATEGORY, 1)
            .await
            .unwrap();
        store
            .batch_assign(100, RESOURCE_TYPE_CATALOG_CATEGORY, &[1, 2])
            .await
            .unwrap();

        let rows = store
            .find_by_resource(100, RESOURCE_TYPE_CATALOG_CATEGORY)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn replace_tags_swaps_the_association_set() {
        let store = MemoryResourceTagStore::new();

        store
            .batch_assign(100, RESOURCE_TYPE_CATALOG_CATEGORY, &[1, 2, 3])
            .await
            .unwrap();
        store
            .replace_tags(100, RESOURCE_TYPE_CATALOG_CATEGORY, &[3, 4])
            .await
            .unwrap();

        let mut tag_ids = store
            .get_resource_tags(100, RESOURCE_TYPE_CATALOG_CATEGORY)
            .await
            .unwrap();
        tag_ids.sort_unstable();
        assert_eq!(tag_ids, vec![3, 4]);
    }

    #[tokio::test]
    async fn replace_tags_with_empty_set_clears_all() {
        let store = MemoryResourceTagStore::new();

        store
            .batch_assign(100, RESOURCE_TYPE_CATALOG_CATEGORY, &[1, 2])
            .await
            .unwrap();
        store
            .replace_tags(100, RESOURCE_TYPE_CATALOG_CATEGORY, &[])
            .await
            .unwrap();

        let rows = store
            .find_by_resource(100, RESOURCE_TYPE_CATALOG_CATEGORY)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn replace_tags_rolls_back_on_mid_operation_failure() {
        let store = MemoryResourceTagStore::new();

        store
            .batch_assign(100, RESOURCE_TYPE_CATALOG_CATEGORY, &[1, 2])
            .await
            .unwrap();

        store.inject_insert_failure();
        let result = store
            .replace_tags(100, RESOURCE_TYPE_CATALOG_CATEGORY, &[3, 4])
            .await;
        assert!(result.is_err());

        // The pre-call association set is fully intact.
        let mut tag_ids = store
            .get_resource_tags(100, RESOURCE_TYPE_CATALOG_CATEGORY)
            .await
            .unwrap();
        tag_ids.sort_unstable();
        assert_eq!(tag_ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn find_by_tags_requires_every_tag() {
        let store = MemoryResourceTagStore::new();

        store
            .batch_assign(100, RESOURCE_TYPE_CATALOG_CATEGORY, &[1, 2])
            .await
            .unwrap();
        store
            .assign(200, RESOURCE_TYPE_CATALOG_CATEGORY, 1)
            .await
            .unwrap();

        let resource_ids = store
            .find_by_tags(&[1, 2], RESOURCE_TYPE_CATALOG_CATEGORY)
            .await
            .unwrap();
        assert_eq!(resource_ids, vec![100]);

        let resource_ids = store
            .find_by_tags(&[1], RESOURCE_TYPE_CATALOG_CATEGORY)
            .await
            .unwrap();
        assert_eq!(resource_ids, vec![100, 200]);
    }

    #[tokio::test]
    async fn find_by_tags_empty_input_returns_empty() {
        let store = MemoryResourceTagStore::new();

        store
            .assign(100, RESOURCE_TYPE_CATALOG_CATEGORY, 1)
            .await
            .unwrap();

        let resource_ids = store
            .find_by_tags(&[], RESOURCE_TYPE_CATALOG_CATEGORY)
            .await
            .unwrap();
        assert!(resource_ids.is_empty());
    }

    #[tokio::test]
    async fn find_by_tags_respects_resource_type() {
        let store = MemoryResourceTagStore::new();

        store
            .assign(100, RESOURCE_TYPE_CATALOG_CATEGORY, 1)
            .await
            .unwrap();
        store
            .assign(100, RESOURCE_TYPE_CATALOG_DATASET, 1)
            .await
            .unwrap();

        let resource_ids = store
            .find_by_tags(&[1], RESOURCE_TYPE_CATALOG_CATEGORY)
            .await
            .unwrap();
        assert_eq!(resource_ids, vec![100]);
    }

    #[tokio::test]
    async fn count_by_tag_spans_resource_types() {
        let store = MemoryResourceTagStore::new();

        store
            .assign(100, RESOURCE_TYPE_CATALOG_CATEGORY, 1)
            .await
            .unwrap();
        store
            .assign(200, RESOURCE_TYPE_DATA_VIEW, 1)
            .await
            .unwrap();

        assert_eq!(store.count_by_tag(1).await.unwrap(), 2);
        assert_eq!(store.count_by_tag(2).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn tag_store_crud_round_trip() {
        let store = MemoryTagStore::new();

        let tag = store
            .insert(crate::models::tag::NewTag {
                name: "Python".to_string(),
                description: "language".to_string(),
                color: "#1890ff".to_string(),
                status: crate::models::tag::STATUS_ENABLED,
                created_by: 7,
            })
            .await
            .unwrap();
        assert_eq!(tag.id, 1);

        let found = store.find_one(tag.id).await.unwrap();
        assert_eq!(found.name, "Python");

        let by_name = store.find_by_name("Python").await.unwrap();
        assert_eq!(by_name.unwrap().id, tag.id);
        assert!(store.find_by_name("python").await.unwrap().is_none());

        store.delete(tag.id).await.unwrap();
        assert!(matches!(
            store.find_one(tag.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn tag_store_search_matches_name_or_description() {
        let store = MemoryTagStore::new();

        for (name, description) in [
            ("Python", "scripting language"),
            ("Tutorial", "python tutorials"),
            ("Finance", "quarterly reports"),
        ] {
            store
                .insert(crate::models::tag::NewTag {
                    name: name.to_string(),
                    description: description.to_string(),
                    color: "#1890ff".to_string(),
                    status: crate::models::tag::STATUS_ENABLED,
                    created_by: 1,
                })
                .await
                .unwrap();
        }

        let (matches, total) = store.search("PYTHON", 1, 20).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(matches.len(), 2);

        let (all, total) = store.search("", 1, 20).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(all.len(), 3);
    }
}
