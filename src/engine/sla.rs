// ==========================================
// 快件生命周期引擎 - SLA 时钟
// ==========================================
// 职责: (时限, 预警阈值, 当前时间) -> 剩余时间/临期/超期 的纯函数
// 红线: 无状态、无锁、无内部定时器,任意并发调用安全
// ==========================================
// 重算模型: 拉取式。本模块不跑后台任务,由消费方(展示层/轮询)
// 自带新的 now 调用 compute。推荐轮询间隔 ≤60 秒(调用方策略,
// 配置键 sla_refresh_interval_secs 仅作提示,非核心保证)。
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 分钟 -> 毫秒换算系数
pub const MS_PER_MINUTE: i64 = 60_000;

// ==========================================
// SlaSnapshot - SLA 计算结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlaSnapshot {
    /// 未约定时限(哨兵值,不视为错误)
    NoDeadline,
    /// 约定了时限的运单/任务
    Tracked {
        remaining_ms: i64, // deadline - now,可为负
        is_overdue: bool,  // 剩余为负且条目未完结
        is_due_soon: bool, // 0 ≤ 剩余 ≤ 预警阈值
    },
}

impl SlaSnapshot {
    /// 是否超期(NoDeadline 恒为 false)
    pub fn is_overdue(&self) -> bool {
        matches!(self, SlaSnapshot::Tracked { is_overdue: true, .. })
    }

    /// 是否临期(NoDeadline 恒为 false)
    pub fn is_due_soon(&self) -> bool {
        matches!(self, SlaSnapshot::Tracked { is_due_soon: true, .. })
    }
}

// ==========================================
// SlaClock - 纯函数工具类
// ==========================================
pub struct SlaClock;

impl SlaClock {
    /// 计算 SLA 快照
    ///
    /// # 参数
    /// - deadline: 约定时限,None 返回 NoDeadline 哨兵
    /// - warning_threshold_minutes: 预警提前量(分钟)
    /// - now: 调用方提供的当前时间(本模块不自取时钟)
    /// - closed: 条目是否已完结/终态(由调用方判定,SLA 时钟
    ///   不感知任务状态;完结条目不再标超期)
    ///
    /// # 规则
    /// - remaining_ms = deadline - now
    /// - is_overdue  = remaining_ms < 0 且 !closed
    /// - is_due_soon = 0 ≤ remaining_ms ≤ warning_threshold_minutes × 60000
    pub fn compute(
        deadline: Option<DateTime<Utc>>,
        warning_threshold_minutes: i64,
        now: DateTime<Utc>,
        closed: bool,
    ) -> SlaSnapshot {
        let deadline = match deadline {
            Some(d) => d,
            None => return SlaSnapshot::NoDeadline,
        };

        let remaining_ms = deadline.signed_duration_since(now).num_milliseconds();
        let warning_window_ms = warning_threshold_minutes * MS_PER_MINUTE;

        SlaSnapshot::Tracked {
            remaining_ms,
            is_overdue: remaining_ms < 0 && !closed,
            is_due_soon: remaining_ms >= 0 && remaining_ms <= warning_window_ms,
        }
    }
}
