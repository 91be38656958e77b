// ==========================================
// 快件生命周期引擎 - 状态历史仓储
// ==========================================
// 红线: 历史表仅追加。写入走 ShipmentRepository 的提交事务,
//       本仓储只提供读取,不暴露 UPDATE/DELETE
// ==========================================

use crate::domain::shipment::{StatusHistoryEntry, StatusMetadata};
use crate::domain::types::ShipmentStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// StatusHistoryRepository - 状态历史仓储(只读)
// ==========================================
pub struct StatusHistoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StatusHistoryRepository {
    /// 创建新的状态历史仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询运单全部历史,按提交序号升序
    ///
    /// # 说明
    /// - 软删除运单的历史同样可读(墓碑不影响审计轨迹)
    pub fn list_for_shipment(
        &self,
        shipment_id: &str,
    ) -> RepositoryResult<Vec<StatusHistoryEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT history_id, shipment_id, status, seq, recorded_at,
                   location, notes, metadata_json, recorded_by
            FROM status_history
            WHERE shipment_id = ?1
            ORDER BY seq ASC
            "#,
        )?;
        let rows = stmt.query_map(params![shipment_id], Self::map_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row??);
        }
        Ok(entries)
    }

    /// 查询运单最近一条历史
    pub fn latest_for_shipment(
        &self,
        shipment_id: &str,
    ) -> RepositoryResult<Option<StatusHistoryEntry>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            r#"
            SELECT history_id, shipment_id, status, seq, recorded_at,
                   location, notes, metadata_json, recorded_by
            FROM status_history
            WHERE shipment_id = ?1
            ORDER BY seq DESC
            LIMIT 1
            "#,
            params![shipment_id],
            Self::map_row,
        );
        match result {
            Ok(entry) => Ok(Some(entry?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 统计运单历史条数
    pub fn count_for_shipment(&self, shipment_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM status_history WHERE shipment_id = ?1",
            params![shipment_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 行 -> 实体映射
    fn map_row(row: &Row<'_>) -> rusqlite::Result<RepositoryResult<StatusHistoryEntry>> {
        let history_id: String = row.get(0)?;
        let shipment_id: String = row.get(1)?;
        let status_raw: String = row.get(2)?;
        let seq: i64 = row.get(3)?;
        let recorded_at: DateTime<Utc> = row.get(4)?;
        let location: Option<String> = row.get(5)?;
        let notes: Option<String> = row.get(6)?;
        let metadata_json: Option<String> = row.get(7)?;
        let recorded_by: String = row.get(8)?;

        Ok((|| {
            let status = ShipmentStatus::from_db_str(&status_raw).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "status".to_string(),
                    message: status_raw.clone(),
                }
            })?;
            let metadata: Option<StatusMetadata> = match metadata_json {
                Some(json) => Some(serde_json::from_str(&json)?),
                None => None,
            };
            Ok(StatusHistoryEntry {
                history_id,
                shipment_id,
                status,
                seq,
                recorded_at,
                location,
                notes,
                metadata,
                recorded_by,
            })
        })())
    }
}
