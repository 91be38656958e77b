// ==========================================
// 快件生命周期引擎 - 任务领域模型
// ==========================================
// 用途: 运单关联的操作任务(取件/报关/签收确认等)
// 红线: required_fields 在任务创建时由 TaskPolicyEngine 派生并快照
// ==========================================

use crate::domain::types::{PolicyField, PriorityLevel, TaskKind, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// Task - 操作任务
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    // ===== 主键与关联 =====
    pub task_id: String,     // 任务 ID(UUID)
    pub shipment_id: String, // 关联运单

    // ===== 任务属性 =====
    pub kind: TaskKind,         // 人工/系统
    pub title: String,          // 任务标题
    pub status: TaskStatus,     // 任务状态
    pub priority: PriorityLevel, // 优先级

    // ===== 完成策略快照 =====
    // 创建时由 TaskPolicyEngine::required_fields 派生,供展示层提示;
    // 完成校验按运单当下状态重新派生,不读旧快照
    pub required_fields: BTreeSet<PolicyField>,

    // ===== 时限(由运单 SLA 派生) =====
    pub due_at: Option<DateTime<Utc>>,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
}

impl Task {
    /// 是否仍可流转(终态任务不再变更)
    pub fn is_open(&self) -> bool {
        !self.status.is_final()
    }
}
