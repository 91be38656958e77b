// ==========================================
// 任务接口测试
// ==========================================
// 职责: 验证任务创建的字段快照、完成校验与取消
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod task_api_test {
    use courier_lifecycle::api::{ApiError, NewTask};
    use courier_lifecycle::domain::types::{
        PolicyField, PriorityLevel, ServiceType, ShipmentStatus, TaskKind, TaskStatus,
    };

    use crate::test_helpers::{
        payload_by, payload_with_awb, sample_new_shipment, setup_test_env,
    };

    fn new_task(shipment_id: &str, title: &str) -> NewTask {
        NewTask {
            shipment_id: shipment_id.to_string(),
            kind: TaskKind::Manual,
            title: title.to_string(),
            priority: PriorityLevel::Normal,
        }
    }

    #[tokio::test]
    async fn test_create_task_snapshots_required_fields() {
        let env = setup_test_env();
        let shipment = env
            .shipment_api
            .create_shipment(sample_new_shipment("TASK-001", ServiceType::Nfo)).await
            .unwrap();
        let id = shipment.shipment_id.clone();

        // 报价中创建: 无策略字段要求
        let task = env
            .task_api
            .create_task(new_task(&id, "确认报价"))
            .await
            .unwrap();
        assert!(task.required_fields.is_empty());
        assert_eq!(task.status, TaskStatus::Pending);
        // due_at 取运单 SLA 时限
        assert_eq!(task.due_at, shipment.sla.deadline);

        // 推进到已提货后创建: NFO 要求分单号/主单号
        env.shipment_api
            .request_transition(&id, ShipmentStatus::Booked, payload_by("ops"))
            .await
            .unwrap();
        env.shipment_api
            .request_transition(&id, ShipmentStatus::Pickup, payload_with_awb("ops"))
            .await
            .unwrap();
        let task = env
            .task_api
            .create_task(new_task(&id, "上传随航单据"))
            .await
            .unwrap();
        assert!(task.required_fields.contains(&PolicyField::Hawb));
        assert!(task.required_fields.contains(&PolicyField::Mawb));
    }

    #[tokio::test]
    async fn test_complete_task_validates_at_current_status() {
        let env = setup_test_env();
        let shipment = env
            .shipment_api
            .create_shipment(sample_new_shipment("TASK-002", ServiceType::Nfo)).await
            .unwrap();
        let id = shipment.shipment_id.clone();

        env.shipment_api
            .request_transition(&id, ShipmentStatus::Booked, payload_by("ops"))
            .await
            .unwrap();
        env.shipment_api
            .request_transition(&id, ShipmentStatus::Pickup, payload_with_awb("ops"))
            .await
            .unwrap();

        let task = env
            .task_api
            .create_task(new_task(&id, "补录单号"))
            .await
            .unwrap();

        // 空载荷完成被拒,缺失字段列出
        let err = env
            .task_api
            .complete_task(&task.task_id, payload_by("ops"))
            .await
            .unwrap_err();
        match err {
            ApiError::ValidationFailed { missing } => {
                assert_eq!(missing, vec![PolicyField::Hawb, PolicyField::Mawb]);
            }
            other => panic!("期望 ValidationFailed,实际 {:?}", other),
        }
        // 拒绝不改变任务状态
        let t = env.task_api.list_tasks(&id).unwrap().pop().unwrap();
        assert_eq!(t.status, TaskStatus::Pending);

        // 带单号完成
        let done = env
            .task_api
            .complete_task(&task.task_id, payload_with_awb("ops"))
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.completed_by.as_deref(), Some("ops"));
        assert!(done.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_cancel_task() {
        let env = setup_test_env();
        let shipment = env
            .shipment_api
            .create_shipment(sample_new_shipment("TASK-003", ServiceType::Obc)).await
            .unwrap();

        let task = env
            .task_api
            .create_task(new_task(&shipment.shipment_id, "联系收件人"))
            .await
            .unwrap();
        env.task_api.cancel_task(&task.task_id).unwrap();

        let t = env.task_api.list_tasks(&shipment.shipment_id).unwrap().pop().unwrap();
        assert_eq!(t.status, TaskStatus::Cancelled);

        // 已取消任务不可再完成
        let err = env
            .task_api
            .complete_task(&task.task_id, payload_by("ops"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_create_task_for_missing_shipment() {
        let env = setup_test_env();
        let err = env
            .task_api
            .create_task(new_task("no-such-shipment", "无主任务"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
