// ==========================================
// 快件生命周期引擎 - 运单仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射与原子提交
// 红线: 状态 CAS 与历史追加必须在同一事务内完成
// ==========================================

use crate::domain::shipment::{Address, Dimensions, Shipment, SlaRecord, StatusMetadata};
use crate::domain::types::{
    DimensionUnit, PriorityLevel, ServiceType, ShipmentStatus, WeightUnit,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// StatusHistoryDraft - 待提交的历史条目
// ==========================================
// seq 在提交事务内按 MAX(seq)+1 分配,保证反映提交顺序
#[derive(Debug, Clone)]
pub struct StatusHistoryDraft {
    pub history_id: String,
    pub status: ShipmentStatus,
    pub recorded_at: DateTime<Utc>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub metadata: Option<StatusMetadata>,
    pub recorded_by: String,
}

// ==========================================
// TransitionCommit - 原子流转提交参数
// ==========================================
// 由 Coordinator 填好全部派生值;仓储只负责写入
#[derive(Debug, Clone)]
pub struct TransitionCommit {
    pub expected_status: ShipmentStatus, // CAS 前置条件(加载时读到的状态)
    pub new_status: ShipmentStatus,
    pub updated_at: DateTime<Utc>,
    pub dimensions: Option<Dimensions>,          // 尺寸补录
    pub chargeable_weight_kg: Option<f64>,       // 重算后的计费重量
    pub picked_up_at: Option<DateTime<Utc>>,     // 进入 PICKUP 时落
    pub delivered_at: Option<DateTime<Utc>>,     // 进入 DELIVERED 时落
    pub completed_at: Option<DateTime<Utc>>,     // 进入终态时落
    pub history: StatusHistoryDraft,
}

// ==========================================
// ShipmentRepository - 运单仓储
// ==========================================
pub struct ShipmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ShipmentRepository {
    /// 创建新的运单仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入运单及其首条历史(同一事务)
    ///
    /// # 说明
    /// - 新运单以 QUOTED 状态落库,首条历史 seq=1
    pub fn insert_with_initial_history(
        &self,
        shipment: &Shipment,
        history: &StatusHistoryDraft,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            r#"
            INSERT INTO shipment (
                shipment_id, shipment_no, service_type, current_status, priority,
                length, width, height, dim_unit, weight, weight_unit,
                chargeable_weight_kg, origin_json, destination_json,
                sla_deadline, sla_warning_threshold_minutes,
                courier_id, employee_id, partner_id,
                created_at, picked_up_at, delivered_at, completed_at,
                updated_at, deleted_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14,
                ?15, ?16,
                ?17, ?18, ?19,
                ?20, ?21, ?22, ?23,
                ?24, ?25
            )
            "#,
            params![
                shipment.shipment_id,
                shipment.shipment_no,
                shipment.service_type.to_db_str(),
                shipment.current_status.to_db_str(),
                shipment.priority.to_db_str(),
                shipment.dimensions.as_ref().map(|d| d.length),
                shipment.dimensions.as_ref().map(|d| d.width),
                shipment.dimensions.as_ref().map(|d| d.height),
                shipment.dimensions.as_ref().map(|d| d.dim_unit.to_db_str()),
                shipment.dimensions.as_ref().map(|d| d.weight),
                shipment.dimensions.as_ref().map(|d| d.weight_unit.to_db_str()),
                shipment.chargeable_weight_kg,
                serde_json::to_string(&shipment.origin)?,
                serde_json::to_string(&shipment.destination)?,
                shipment.sla.deadline,
                shipment.sla.warning_threshold_minutes,
                shipment.courier_id,
                shipment.employee_id,
                shipment.partner_id,
                shipment.created_at,
                shipment.picked_up_at,
                shipment.delivered_at,
                shipment.completed_at,
                shipment.updated_at,
                shipment.deleted_at,
            ],
        )?;

        Self::insert_history_in_tx(&tx, &shipment.shipment_id, 1, history)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 原子提交状态流转: CAS + 历史追加,同一事务
    ///
    /// # 返回
    /// - Ok(seq): 本次历史条目的提交序号
    /// - Err(StatusCasConflict): 存储状态与 CAS 前置条件不符
    pub fn commit_transition(
        &self,
        shipment_id: &str,
        commit: &TransitionCommit,
    ) -> RepositoryResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // CAS: 当前存储状态必须等于加载时读到的状态,且未被软删除
        let rows = tx.execute(
            r#"
            UPDATE shipment SET
                current_status = ?1,
                updated_at = ?2,
                length = COALESCE(?3, length),
                width = COALESCE(?4, width),
                height = COALESCE(?5, height),
                dim_unit = COALESCE(?6, dim_unit),
                weight = COALESCE(?7, weight),
                weight_unit = COALESCE(?8, weight_unit),
                chargeable_weight_kg = COALESCE(?9, chargeable_weight_kg),
                picked_up_at = COALESCE(picked_up_at, ?10),
                delivered_at = COALESCE(delivered_at, ?11),
                completed_at = COALESCE(completed_at, ?12)
            WHERE shipment_id = ?13
              AND current_status = ?14
              AND deleted_at IS NULL
            "#,
            params![
                commit.new_status.to_db_str(),
                commit.updated_at,
                commit.dimensions.as_ref().map(|d| d.length),
                commit.dimensions.as_ref().map(|d| d.width),
                commit.dimensions.as_ref().map(|d| d.height),
                commit.dimensions.as_ref().map(|d| d.dim_unit.to_db_str()),
                commit.dimensions.as_ref().map(|d| d.weight),
                commit.dimensions.as_ref().map(|d| d.weight_unit.to_db_str()),
                commit.chargeable_weight_kg,
                commit.picked_up_at,
                commit.delivered_at,
                commit.completed_at,
                shipment_id,
                commit.expected_status.to_db_str(),
            ],
        )?;

        if rows == 0 {
            // 显式回滚后报冲突,由上层决定是否重读重试
            tx.rollback()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
            return Err(RepositoryError::StatusCasConflict {
                shipment_id: shipment_id.to_string(),
                expected_status: commit.expected_status.to_db_str().to_string(),
            });
        }

        // 提交序号在事务内分配,保证历史顺序反映提交顺序
        let seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM status_history WHERE shipment_id = ?1",
            params![shipment_id],
            |row| row.get(0),
        )?;
        Self::insert_history_in_tx(&tx, shipment_id, seq, &commit.history)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(seq)
    }

    /// 软删除运单(设置墓碑,历史保持可读)
    ///
    /// # 返回
    /// - Ok(true): 成功打上墓碑
    /// - Ok(false): 运单不存在或已删除
    pub fn soft_delete(&self, shipment_id: &str, deleted_at: DateTime<Utc>) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE shipment SET deleted_at = ?1, updated_at = ?1 WHERE shipment_id = ?2 AND deleted_at IS NULL",
            params![deleted_at, shipment_id],
        )?;
        Ok(rows > 0)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 ID 查询运单(含软删除,由调用方判定墓碑)
    pub fn find_by_id(&self, shipment_id: &str) -> RepositoryResult<Option<Shipment>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            &format!("{} WHERE shipment_id = ?1", Self::SELECT_BASE),
            params![shipment_id],
            Self::map_row,
        );
        match result {
            Ok(shipment) => Ok(Some(shipment?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按业务运单号查询
    pub fn find_by_shipment_no(&self, shipment_no: &str) -> RepositoryResult<Option<Shipment>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            &format!("{} WHERE shipment_no = ?1", Self::SELECT_BASE),
            params![shipment_no],
            Self::map_row,
        );
        match result {
            Ok(shipment) => Ok(Some(shipment?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询 SLA 监控范围内的运单(未删除且非终态)
    pub fn list_sla_active(&self) -> RepositoryResult<Vec<Shipment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE deleted_at IS NULL AND current_status NOT IN ('INVOICED', 'CANCELLED') ORDER BY created_at",
            Self::SELECT_BASE
        ))?;
        let rows = stmt.query_map([], Self::map_row)?;

        let mut shipments = Vec::new();
        for row in rows {
            shipments.push(row??);
        }
        Ok(shipments)
    }

    // ==========================================
    // 行映射
    // ==========================================

    const SELECT_BASE: &'static str = r#"
        SELECT shipment_id, shipment_no, service_type, current_status, priority,
               length, width, height, dim_unit, weight, weight_unit,
               chargeable_weight_kg, origin_json, destination_json,
               sla_deadline, sla_warning_threshold_minutes,
               courier_id, employee_id, partner_id,
               created_at, picked_up_at, delivered_at, completed_at,
               updated_at, deleted_at
        FROM shipment
    "#;

    /// 行 -> 实体映射(枚举解析失败归为 FieldValueError)
    fn map_row(row: &Row<'_>) -> rusqlite::Result<RepositoryResult<Shipment>> {
        let service_type_raw: String = row.get(2)?;
        let status_raw: String = row.get(3)?;
        let priority_raw: String = row.get(4)?;
        let length: Option<f64> = row.get(5)?;
        let width: Option<f64> = row.get(6)?;
        let height: Option<f64> = row.get(7)?;
        let dim_unit_raw: Option<String> = row.get(8)?;
        let weight: Option<f64> = row.get(9)?;
        let weight_unit_raw: Option<String> = row.get(10)?;
        let origin_json: String = row.get(12)?;
        let destination_json: String = row.get(13)?;

        let shipment_id: String = row.get(0)?;
        let shipment_no: String = row.get(1)?;
        let chargeable_weight_kg: Option<f64> = row.get(11)?;
        let sla_deadline: Option<DateTime<Utc>> = row.get(14)?;
        let warning_threshold_minutes: i64 = row.get(15)?;
        let courier_id: Option<String> = row.get(16)?;
        let employee_id: Option<String> = row.get(17)?;
        let partner_id: Option<String> = row.get(18)?;
        let created_at: DateTime<Utc> = row.get(19)?;
        let picked_up_at: Option<DateTime<Utc>> = row.get(20)?;
        let delivered_at: Option<DateTime<Utc>> = row.get(21)?;
        let completed_at: Option<DateTime<Utc>> = row.get(22)?;
        let updated_at: DateTime<Utc> = row.get(23)?;
        let deleted_at: Option<DateTime<Utc>> = row.get(24)?;

        Ok((|| {
            let service_type = ServiceType::from_db_str(&service_type_raw).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "service_type".to_string(),
                    message: service_type_raw.clone(),
                }
            })?;
            let current_status = ShipmentStatus::from_db_str(&status_raw).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "current_status".to_string(),
                    message: status_raw.clone(),
                }
            })?;

            // 尺寸五元组齐备才构造 Dimensions
            let dimensions = match (length, width, height, weight) {
                (Some(l), Some(w), Some(h), Some(kg)) => Some(Dimensions {
                    length: l,
                    width: w,
                    height: h,
                    dim_unit: DimensionUnit::from_db_str(dim_unit_raw.as_deref().unwrap_or("CM")),
                    weight: kg,
                    weight_unit: WeightUnit::from_db_str(weight_unit_raw.as_deref().unwrap_or("KG")),
                }),
                _ => None,
            };

            let origin: Address = serde_json::from_str(&origin_json)?;
            let destination: Address = serde_json::from_str(&destination_json)?;

            Ok(Shipment {
                shipment_id,
                shipment_no,
                service_type,
                current_status,
                priority: PriorityLevel::from_db_str(&priority_raw),
                dimensions,
                chargeable_weight_kg,
                origin,
                destination,
                sla: SlaRecord {
                    deadline: sla_deadline,
                    warning_threshold_minutes,
                },
                courier_id,
                employee_id,
                partner_id,
                created_at,
                picked_up_at,
                delivered_at,
                completed_at,
                updated_at,
                deleted_at,
            })
        })())
    }

    /// 事务内写入历史条目
    fn insert_history_in_tx(
        tx: &Transaction<'_>,
        shipment_id: &str,
        seq: i64,
        draft: &StatusHistoryDraft,
    ) -> RepositoryResult<()> {
        let metadata_json = match &draft.metadata {
            Some(m) if !m.is_empty() => Some(serde_json::to_string(m)?),
            _ => None,
        };
        tx.execute(
            r#"
            INSERT INTO status_history (
                history_id, shipment_id, status, seq, recorded_at,
                location, notes, metadata_json, recorded_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                draft.history_id,
                shipment_id,
                draft.status.to_db_str(),
                seq,
                draft.recorded_at,
                draft.location,
                draft.notes,
                metadata_json,
                draft.recorded_by,
            ],
        )?;
        Ok(())
    }
}
