// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

use chrono::{DateTime, Duration, Utc};
use courier_lifecycle::api::{MonitorApi, ShipmentApi, TaskApi};
use courier_lifecycle::config::ConfigManager;
use courier_lifecycle::db;
use courier_lifecycle::domain::{
    Address, Dimensions, NewShipment, NewSlaInput, TransitionPayload,
};
use courier_lifecycle::domain::types::{
    DimensionUnit, PriorityLevel, ServiceType, WeightUnit,
};
use courier_lifecycle::engine::ShipmentLifecycleCoordinator;
use courier_lifecycle::logging;
use courier_lifecycle::repository::{
    ShipmentRepository, StatusHistoryRepository, TaskRepository,
};
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 插入测试配置数据
pub fn insert_test_config(conn: &Connection) -> Result<(), Box<dyn Error>> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO config_kv (scope_id, key, value, updated_at) VALUES
        ('global', 'require_customer_reference', 'false', datetime('now')),
        ('global', 'default_warning_threshold_minutes', '60', datetime('now')),
        ('global', 'sla_refresh_interval_secs', '60', datetime('now'))
        "#,
        [],
    )?;
    Ok(())
}

/// 测试环境(API 全家桶)
pub struct TestEnv {
    // 临时文件需要持有,否则数据库随析构消失
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub config: Arc<ConfigManager>,
    pub shipment_repo: Arc<ShipmentRepository>,
    pub history_repo: Arc<StatusHistoryRepository>,
    pub task_repo: Arc<TaskRepository>,
    pub shipment_api: Arc<ShipmentApi<ConfigManager>>,
    pub task_api: Arc<TaskApi<ConfigManager>>,
    pub monitor_api: Arc<MonitorApi<ConfigManager>>,
}

/// 创建测试环境(共享同一连接)
pub fn setup_test_env() -> TestEnv {
    logging::init_test();

    let (temp_file, db_path) = create_test_db().unwrap();

    let conn = Arc::new(Mutex::new(db::open_sqlite_connection(&db_path).unwrap()));
    {
        let guard = conn.lock().unwrap();
        insert_test_config(&guard).unwrap();
    }

    let config = Arc::new(ConfigManager::from_connection(conn.clone()).unwrap());
    let shipment_repo = Arc::new(ShipmentRepository::new(conn.clone()));
    let history_repo = Arc::new(StatusHistoryRepository::new(conn.clone()));
    let task_repo = Arc::new(TaskRepository::new(conn.clone()));

    let coordinator = Arc::new(
        ShipmentLifecycleCoordinator::new(config.clone(), shipment_repo.clone()).unwrap(),
    );

    let shipment_api = Arc::new(ShipmentApi::new(
        config.clone(),
        shipment_repo.clone(),
        history_repo.clone(),
        coordinator,
    ));
    let task_api = Arc::new(TaskApi::new(
        config.clone(),
        task_repo.clone(),
        shipment_repo.clone(),
    ));
    let monitor_api = Arc::new(MonitorApi::new(config.clone(), shipment_repo.clone()));

    TestEnv {
        _temp_file: temp_file,
        db_path,
        config,
        shipment_repo,
        history_repo,
        task_repo,
        shipment_api,
        task_api,
        monitor_api,
    }
}

/// 构造测试运单输入
pub fn sample_new_shipment(shipment_no: &str, service_type: ServiceType) -> NewShipment {
    NewShipment {
        shipment_no: shipment_no.to_string(),
        service_type,
        priority: PriorityLevel::Normal,
        dimensions: Some(Dimensions {
            length: 60.0,
            width: 40.0,
            height: 30.0,
            dim_unit: DimensionUnit::Cm,
            weight: 5.0,
            weight_unit: WeightUnit::Kg,
        }),
        origin: Address {
            city: "上海".to_string(),
            country: "CN".to_string(),
            detail: None,
            contact_name: None,
        },
        destination: Address {
            city: "Frankfurt".to_string(),
            country: "DE".to_string(),
            detail: None,
            contact_name: None,
        },
        sla: NewSlaInput {
            deadline: Some(Utc::now() + Duration::hours(48)),
            warning_threshold_minutes: Some(60),
        },
        courier_id: None,
        employee_id: Some("OPS001".to_string()),
        partner_id: None,
        created_by: "test".to_string(),
    }
}

/// 构造指定时限的测试运单输入
pub fn sample_new_shipment_with_deadline(
    shipment_no: &str,
    service_type: ServiceType,
    deadline: Option<DateTime<Utc>>,
) -> NewShipment {
    let mut input = sample_new_shipment(shipment_no, service_type);
    input.sla.deadline = deadline;
    input
}

/// 构造空载荷(只带操作人)
pub fn payload_by(recorded_by: &str) -> TransitionPayload {
    TransitionPayload {
        recorded_by: recorded_by.to_string(),
        ..Default::default()
    }
}

/// 构造带 AWB 单号的载荷(满足 NFO 策略字段)
pub fn payload_with_awb(recorded_by: &str) -> TransitionPayload {
    TransitionPayload {
        hawb: Some("176-12345675".to_string()),
        mawb: Some("176-88888883".to_string()),
        recorded_by: recorded_by.to_string(),
        ..Default::default()
    }
}
