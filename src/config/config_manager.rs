// ==========================================
// 快件生命周期引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::policy_config_trait::PolicyConfigReader;
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    /// 任务完成是否强制客户参考号(bool, 默认 false)
    pub const REQUIRE_CUSTOMER_REFERENCE: &str = "require_customer_reference";
    /// 默认 SLA 预警提前量,分钟(i64, 默认 60)
    pub const DEFAULT_WARNING_THRESHOLD_MINUTES: &str = "default_warning_threshold_minutes";
    /// 展示层 SLA 轮询建议间隔,秒(i64, 默认 60)
    pub const SLA_REFRESH_INTERVAL_SECS: &str = "sla_refresh_interval_secs";
}

// ==========================================
// 默认值
// ==========================================
const DEFAULT_REQUIRE_CUSTOMER_REFERENCE: bool = false;
const DEFAULT_WARNING_THRESHOLD_MINUTES: i64 = 60;
const DEFAULT_SLA_REFRESH_INTERVAL_SECS: i64 = 60;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 为保证连接行为一致,会对传入连接再次应用统一 PRAGMA(幂等)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            configure_sqlite_connection(&conn_guard)?;
        }
        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值(scope_id='global')
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入配置值(scope_id='global',UPSERT)
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT (scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取布尔配置(兼容 true/1)
    fn get_bool_or(&self, key: &str, default: bool) -> Result<bool, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(v) => Ok(matches!(v.trim().to_lowercase().as_str(), "true" | "1")),
            None => Ok(default),
        }
    }

    /// 读取整型配置
    fn get_i64_or(&self, key: &str, default: i64) -> Result<i64, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(v) => Ok(v.trim().parse::<i64>()?),
            None => Ok(default),
        }
    }
}

// ==========================================
// PolicyConfigReader 实现
// ==========================================
#[async_trait]
impl PolicyConfigReader for ConfigManager {
    async fn get_require_customer_reference(&self) -> Result<bool, Box<dyn Error>> {
        self.get_bool_or(
            config_keys::REQUIRE_CUSTOMER_REFERENCE,
            DEFAULT_REQUIRE_CUSTOMER_REFERENCE,
        )
    }

    async fn get_default_warning_threshold_minutes(&self) -> Result<i64, Box<dyn Error>> {
        self.get_i64_or(
            config_keys::DEFAULT_WARNING_THRESHOLD_MINUTES,
            DEFAULT_WARNING_THRESHOLD_MINUTES,
        )
    }

    async fn get_sla_refresh_interval_secs(&self) -> Result<i64, Box<dyn Error>> {
        self.get_i64_or(
            config_keys::SLA_REFRESH_INTERVAL_SECS,
            DEFAULT_SLA_REFRESH_INTERVAL_SECS,
        )
    }
}
