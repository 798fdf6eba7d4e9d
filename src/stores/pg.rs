use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::resource_tag::ResourceTag;
use crate::models::tag::{NewTag, Tag};
use crate::stores::{ResourceTagStore, TagStore};
use crate::utils::time::current_timestamp_seconds;

fn storage_err(op: &str, e: sqlx::Error) -> AppError {
    tracing::error!("{} failed: {}", op, e);
    AppError::Database(e)
}

#[derive(Clone)]
pub struct PgTagStore {
    db: Database,
}

impl PgTagStore {
    pub fn new(db: Database) -> Self {
        PgTagStore { db }
    }
}

#[async_trait]
impl TagStore for PgTagStore {
    async fn insert(&self, data: NewTag) -> AppResult<Tag> {
        let now = current_timestamp_seconds();

        let tag = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (name, description, color, status, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id, name, description, color, status, created_by, updated_by, created_at, updated_at
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.color)
        .bind(data.status)
        .bind(data.created_by)
        .bind(now)
        .fetch_one(&self.db.pool)
        .await
        .map_err(|e| storage_err("insert tag", e))?;

        Ok(tag)
    }

    async fn find_one(&self, id: i64) -> AppResult<Tag> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, description, color, status, created_by, updated_by, created_at, updated_at
            FROM tags
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await
        .map_err(|e| storage_err("find tag", e))?;

        tag.ok_or_else(|| AppError::NotFound("Tag not found".to_string()))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, description, color, status, created_by, updated_by, created_at, updated_at
            FROM tags
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.db.pool)
        .await
        .map_err(|e| storage_err("find tag by name", e))?;

        Ok(tag)
    }

    async fn update(&self, data: &Tag) -> AppResult<()> {
        let now = current_timestamp_seconds();

        sqlx::query(
            r#"
            UPDATE tags
            SET name = $1, description = $2, color = $3, status = $4, updated_by = $5, updated_at = $6
            WHERE id = $7
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.color)
        .bind(data.status)
        .bind(data.updated_by)
        .bind(now)
        .bind(data.id)
        .execute(&self.db.pool)
        .await
        .map_err(|e| storage_err("update tag", e))?;

        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.db.pool)
            .await
            .map_err(|e| storage_err("delete tag", e))?;

        Ok(())
    }

    async fn find_all(&self) -> AppResult<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, description, color, status, created_by, updated_by, created_at, updated_at
            FROM tags
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db.pool)
        .await
        .map_err(|e| storage_err("find all tags", e))?;

        Ok(tags)
    }

    async fn list(&self, page: i64, page_size: i64) -> AppResult<(Vec<Tag>, i64)> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags")
            .fetch_one(&self.db.pool)
            .await
            .map_err(|e| storage_err("count tags", e))?;

        let offset = (page - 1) * page_size;

        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, description, color, status, created_by, updated_by, created_at, updated_at
            FROM tags
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page_size)
        .bind(offset)
        .fetch_all(&self.db.pool)
        .await
        .map_err(|e| storage_err("list tags", e))?;

        Ok((tags, total))
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

        let pattern = format!("%{}%", keyword);

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tags WHERE name ILIKE $1 OR description ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.db.pool)
        .await
        .map_err(|e| storage_err("count matching tags", e))?;

        let offset = (page - 1) * page_size;

        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, description, color, status, created_by, updated_by, created_at, updated_at
            FROM tags
            WHERE name ILIKE $1 OR description ILIKE $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(page_size)
        .bind(offset)
        .fetch_all(&self.db.pool)
        .await
        .map_err(|e| storage_err("search tags", e))?;

        Ok((tags, total))
    }

    async fn update_status(&self, id: i64, status: i32) -> AppResult<()> {
        let now = current_timestamp_seconds();

        sqlx::query("UPDATE tags SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(status)
            .bind(now)
            .bind(id)
            .execute(&self.db.pool)
            .await
            .map_err(|e| storage_err("update tag status", e))?;

        Ok(())
    }
}

#[derive(Clone)]
pub struct PgResourceTagStore {
    db: Database,
}

impl PgResourceTagStore {
    pub fn new(db: Database) -> Self {
        PgResourceTagStore { db }
    }

    /// Opens a transaction for composing several association operations into
    /// one atomic unit. Commit on success, drop to roll back.
    pub async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.db
            .pool
            .begin()
            .await
            .map_err(|e| storage_err("begin transaction", e))
    }

    /// `assign` against an external transaction.
    pub async fn assign_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        resource_id: i64,
        resource_type: &str,
        tag_id: i64,
    ) -> AppResult<()> {
        let now = current_timestamp_seconds();

        sqlx::query(
            r#"
            INSERT INTO resource_tags (resource_id, resource_type, tag_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (resource_id, resource_type, tag_id) DO NOTHING
            "#,
        )
        .bind(resource_id)
        .bind(resource_type)
        .bind(tag_id)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(|e| storage_err("assign tag", e))?;

        Ok(())
    }

    /// Deletes every association of the resource, against an external
    /// transaction.
    pub async fn delete_by_resource_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        resource_id: i64,
        resource_type: &str,
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM resource_tags WHERE resource_id = $1 AND resource_type = $2")
            .bind(resource_id)
            .bind(resource_type)
            .execute(&mut **tx)
            .await
            .map_err(|e| storage_err("clear resource tags", e))?;

        Ok(())
    }
}

#[async_trait]
impl ResourceTagStore for PgResourceTagStore {
    async fn assign(&self, resource_id: i64, resource_type: &str, tag_id: i64) -> AppResult<()> {
        let now = current_timestamp_seconds();

        sqlx::query(
            r#"
            INSERT INTO resource_tags (resource_id, resource_type, tag_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (resource_id, resource_type, tag_id) DO NOTHING
            "#,
        )
        .bind(resource_id)
        .bind(resource_type)
        .bind(tag_id)
        .bind(now)
        .execute(&self.db.pool)
        .await
        .map_err(|e| storage_err("assign tag", e))?;

        Ok(())
    }

    async fn unassign(&self, resource_id: i64, resource_type: &str, tag_id: i64) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM resource_tags
            WHERE resource_id = $1 AND resource_type = $2 AND tag_id = $3
            "#,
        )
        .bind(resource_id)
        .bind(resource_type)
        .bind(tag_id)
        .execute(&self.db.pool)
        .await
        .map_err(|e| storage_err("unassign tag", e))?;

        Ok(())
    }

    async fn get_resource_tags(
        &self,
        resource_id: i64,
        resource_type: &str,
    ) -> AppResult<Vec<i64>> {
        let tag_ids: Vec<i64> = sqlx::query_scalar(
            "SELECT tag_id FROM resource_tags WHERE resource_id = $1 AND resource_type = $2",
        )
        .bind(resource_id)
        .bind(resource_type)
        .fetch_all(&self.db.pool)
        .await
        .map_err(|e| storage_err("get resource tags", e))?;

        Ok(tag_ids)
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

        // Per-row insert-if-absent keeps batch assignment as idempotent as
        // the single-row path, pre-existing associations included.
        let mut tx = self.begin().await?;
        for tag_id in tag_ids {
            self.assign_tx(&mut tx, resource_id, resource_type, *tag_id)
                .await?;
        }
        tx.commit()
            .await
            .map_err(|e| storage_err("commit batch assign", e))?;

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

        sqlx::query(
            r#"
            DELETE FROM resource_tags
            WHERE resource_id = $1 AND resource_type = $2 AND tag_id = ANY($3)
            "#,
        )
        .bind(resource_id)
        .bind(resource_type)
        .bind(tag_ids)
        .execute(&self.db.pool)
        .await
        .map_err(|e| storage_err("batch unassign tags", e))?;

        Ok(())
    }

    async fn replace_tags(
        &self,
        resource_id: i64,
        resource_type: &str,
        tag_ids: &[i64],
    ) -> AppResult<()> {
        let mut tx = self.begin().await?;

        self.delete_by_resource_tx(&mut tx, resource_id, resource_type)
            .await?;

        for tag_id in tag_ids {
            self.assign_tx(&mut tx, resource_id, resource_type, *tag_id)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| storage_err("commit replace tags", e))?;

        Ok(())
    }

    async fn find_by_resource(
        &self,
        resource_id: i64,
        resource_type: &str,
    ) -> AppResult<Vec<ResourceTag>> {
        let rows = sqlx::query_as::<_, ResourceTag>(
            r#"
            SELECT id, resource_id, resource_type, tag_id, created_at
            FROM resource_tags
            WHERE resource_id = $1 AND resource_type = $2
            "#,
        )
        .bind(resource_id)
        .bind(resource_type)
        .fetch_all(&self.db.pool)
        .await
        .map_err(|e| storage_err("find associations by resource", e))?;

        Ok(rows)
    }

    async fn find_by_tag(&self, tag_id: i64) -> AppResult<Vec<ResourceTag>> {
        let rows = sqlx::query_as::<_, ResourceTag>(
            r#"
            SELECT id, resource_id, resource_type, tag_id, created_at
            FROM resource_tags
            WHERE tag_id = $1
            "#,
        )
        .bind(tag_id)
        .fetch_all(&self.db.pool)
        .await
        .map_err(|e| storage_err("find associations by tag", e))?;

        Ok(rows)
    }

    async fn find_by_tags(&self, tag_ids: &[i64], resource_type: &str) -> AppResult<Vec<i64>> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        // Exact intersection: a resource qualifies only when it carries every
        // requested tag, i.e. its matching-row count equals the request size.
        let resource_ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT resource_id
            FROM resource_tags
            WHERE tag_id = ANY($1) AND resource_type = $2
            GROUP BY resource_id
            HAVING COUNT(*) = $3
            "#,
        )
        .bind(tag_ids)
        .bind(resource_type)
        .bind(tag_ids.len() as i64)
        .fetch_all(&self.db.pool)
        .await
        .map_err(|e| storage_err("find resources by tags", e))?;

        Ok(resource_ids)
    }

    async fn count_by_tag(&self, tag_id: i64) -> AppResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM resource_tags WHERE tag_id = $1")
                .bind(tag_id)
                .fetch_one(&self.db.pool)
                .await
                .map_err(|e| storage_err("count tag usage", e))?;

        Ok(count)
    }
}
