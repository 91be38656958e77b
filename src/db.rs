// ==========================================
// 快件生命周期引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为,避免外键开关不一致
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 集中建表语句,库内仅此一处 DDL
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout(毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明: 版本号用于提示/告警(不做自动迁移),避免静默在旧库上
/// 运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要每个连接单独开启
/// - busy_timeout 需要每个连接单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 默认数据库路径(应用数据目录下 courier-lifecycle/courier.db)
pub fn default_db_path() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("courier-lifecycle").join("courier.db")
}

/// 读取 schema_version(若表不存在则返回 None)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema(幂等)
///
/// 表清单:
/// - shipment: 运单主数据(含软删除墓碑 deleted_at)
/// - status_history: 状态历史(仅追加,seq 反映提交顺序)
/// - task: 操作任务(required_fields_json 为策略字段集快照)
/// - config_kv: 键值配置(scope_id + key)
/// - schema_version: 版本提示
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS shipment (
            shipment_id TEXT PRIMARY KEY,
            shipment_no TEXT NOT NULL UNIQUE,
            service_type TEXT NOT NULL,
            current_status TEXT NOT NULL,
            priority TEXT NOT NULL,
            length REAL,
            width REAL,
            height REAL,
            dim_unit TEXT,
            weight REAL,
            weight_unit TEXT,
            chargeable_weight_kg REAL,
            origin_json TEXT NOT NULL,
            destination_json TEXT NOT NULL,
            sla_deadline TEXT,
            sla_warning_threshold_minutes INTEGER NOT NULL DEFAULT 60,
            courier_id TEXT,
            employee_id TEXT,
            partner_id TEXT,
            created_at TEXT NOT NULL,
            picked_up_at TEXT,
            delivered_at TEXT,
            completed_at TEXT,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        );

        CREATE TABLE IF NOT EXISTS status_history (
            history_id TEXT PRIMARY KEY,
            shipment_id TEXT NOT NULL REFERENCES shipment(shipment_id),
            status TEXT NOT NULL,
            seq INTEGER NOT NULL,
            recorded_at TEXT NOT NULL,
            location TEXT,
            notes TEXT,
            metadata_json TEXT,
            recorded_by TEXT NOT NULL,
            UNIQUE (shipment_id, seq)
        );
        CREATE INDEX IF NOT EXISTS idx_status_history_shipment
            ON status_history (shipment_id, seq);

        CREATE TABLE IF NOT EXISTS task (
            task_id TEXT PRIMARY KEY,
            shipment_id TEXT NOT NULL REFERENCES shipment(shipment_id),
            kind TEXT NOT NULL,
            title TEXT NOT NULL,
            status TEXT NOT NULL,
            priority TEXT NOT NULL,
            required_fields_json TEXT NOT NULL DEFAULT '[]',
            due_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            completed_at TEXT,
            completed_by TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_task_shipment ON task (shipment_id);

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;
    Ok(())
}
