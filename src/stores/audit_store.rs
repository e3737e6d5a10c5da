use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::errors::InternalError;
use crate::types::db::audit_log::{self, Entity as AuditLog};
use crate::types::internal::audit::AuditEvent;

/// AuditStore is the only writer to the audit database. Rows are append-only.
pub struct AuditStore {
    db: DatabaseConnection,
}

impl AuditStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn write_event(&self, event: AuditEvent) -> Result<(), InternalError> {
        let additional_data = if event.data.is_empty() {
            None
        } else {
            Some(
                serde_json::to_string(&event.data)
                    .map_err(|e| InternalError::AuditWrite(e.to_string()))?,
            )
        };

        let row = audit_log::ActiveModel {
            user_id: Set(event.user_id),
            event_type: Set(event.event_type.as_str().to_string()),
            event_description: Set(event.description),
            resource_type: Set(event.resource_type),
            resource_id: Set(event.resource_id),
            ip_address: Set(event.ip_address),
            user_agent: Set(event.user_agent),
            browser: Set(event.browser),
            operating_system: Set(event.operating_system),
            additional_data: Set(additional_data),
            success: Set(event.success),
            created_at: Set(Utc::now().timestamp()),
            ..Default::default()
        };
        row.insert(&self.db)
            .await
            .map_err(|e| InternalError::AuditWrite(e.to_string()))?;
        Ok(())
    }

    /// Most recent events for one user, newest first.
    pub async fn recent_for_user(
        &self,
        user_id: i32,
        limit: u64,
    ) -> Result<Vec<audit_log::Model>, InternalError> {
        AuditLog::find()
            .filter(audit_log::Column::UserId.eq(user_id))
            .order_by_desc(audit_log::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("recent_for_user", e))
    }

    pub async fn count_events(&self) -> Result<u64, InternalError> {
        AuditLog::find()
            .count(&self.db)
            .await
            .map_err(|e| InternalError::database("count_events", e))
    }

    /// Delete events older than the retention window. Returns the number of
    /// rows removed. A negative window is treated as zero days; the cutoff
    /// never lies in the future.
    pub async fn prune_older_than(&self, retain_days: i64) -> Result<u64, InternalError> {
        let cutoff = Utc::now().timestamp() - retain_days.max(0) * 86_400;
        let result = AuditLog::delete_many()
            .filter(audit_log::Column::CreatedAt.lte(cutoff))
            .exec(&self.db)
            .await
            .map_err(|e| InternalError::database("prune_older_than", e))?;
        Ok(result.rows_affected)
    }
}
