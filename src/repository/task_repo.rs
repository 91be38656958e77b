// ==========================================
// 快件生命周期引擎 - 任务仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 说明: required_fields_json 为任务创建时的策略字段集快照
// ==========================================

use crate::domain::task::Task;
use crate::domain::types::{PolicyField, PriorityLevel, TaskKind, TaskStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// TaskRepository - 任务仓储
// ==========================================
pub struct TaskRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TaskRepository {
    /// 创建新的任务仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入任务
    pub fn insert(&self, task: &Task) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO task (
                task_id, shipment_id, kind, title, status, priority,
                required_fields_json, due_at, created_at, updated_at,
                completed_at, completed_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                task.task_id,
                task.shipment_id,
                task.kind.to_db_str(),
                task.title,
                task.status.to_db_str(),
                task.priority.to_db_str(),
                serde_json::to_string(&task.required_fields)?,
                task.due_at,
                task.created_at,
                task.updated_at,
                task.completed_at,
                task.completed_by,
            ],
        )?;
        Ok(task.task_id.clone())
    }

    /// 更新任务状态(带终态保护)
    ///
    /// # 返回
    /// - Ok(true): 更新成功
    /// - Ok(false): 任务不存在或已处于终态
    pub fn update_status(
        &self,
        task_id: &str,
        new_status: TaskStatus,
        updated_at: DateTime<Utc>,
        completed_by: Option<&str>,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let completed_at = if new_status == TaskStatus::Completed {
            Some(updated_at)
        } else {
            None
        };
        let rows = conn.execute(
            r#"
            UPDATE task SET
                status = ?1,
                updated_at = ?2,
                completed_at = COALESCE(completed_at, ?3),
                completed_by = COALESCE(?4, completed_by)
            WHERE task_id = ?5
              AND status NOT IN ('COMPLETED', 'CANCELLED')
            "#,
            params![
                new_status.to_db_str(),
                updated_at,
                completed_at,
                completed_by,
                task_id,
            ],
        )?;
        Ok(rows > 0)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 ID 查询任务
    pub fn find_by_id(&self, task_id: &str) -> RepositoryResult<Option<Task>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            &format!("{} WHERE task_id = ?1", Self::SELECT_BASE),
            params![task_id],
            Self::map_row,
        );
        match result {
            Ok(task) => Ok(Some(task?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询运单的全部任务
    pub fn list_for_shipment(&self, shipment_id: &str) -> RepositoryResult<Vec<Task>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE shipment_id = ?1 ORDER BY created_at",
            Self::SELECT_BASE
        ))?;
        let rows = stmt.query_map(params![shipment_id], Self::map_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row??);
        }
        Ok(tasks)
    }

    // ==========================================
    // 行映射
    // ==========================================

    const SELECT_BASE: &'static str = r#"
        SELECT task_id, shipment_id, kind, title, status, priority,
               required_fields_json, due_at, created_at, updated_at,
               completed_at, completed_by
        FROM task
    "#;

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RepositoryResult<Task>> {
        let task_id: String = row.get(0)?;
        let shipment_id: String = row.get(1)?;
        let kind_raw: String = row.get(2)?;
        let title: String = row.get(3)?;
        let status_raw: String = row.get(4)?;
        let priority_raw: String = row.get(5)?;
        let required_fields_json: String = row.get(6)?;
        let due_at: Option<DateTime<Utc>> = row.get(7)?;
        let created_at: DateTime<Utc> = row.get(8)?;
        let updated_at: DateTime<Utc> = row.get(9)?;
        let completed_at: Option<DateTime<Utc>> = row.get(10)?;
        let completed_by: Option<String> = row.get(11)?;

        Ok((|| {
            let kind = TaskKind::from_db_str(&kind_raw).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "kind".to_string(),
                    message: kind_raw.clone(),
                }
            })?;
            let status = TaskStatus::from_db_str(&status_raw).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "status".to_string(),
                    message: status_raw.clone(),
                }
            })?;
            let required_fields: BTreeSet<PolicyField> =
                serde_json::from_str(&required_fields_json)?;

            Ok(Task {
                task_id,
                shipment_id,
                kind,
                title,
                status,
                priority: PriorityLevel::from_db_str(&priority_raw),
                required_fields,
                due_at,
                created_at,
                updated_at,
                completed_at,
                completed_by,
            })
        })())
    }
}
