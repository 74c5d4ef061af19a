//! Async Actuator - 백그라운드 제출 실행 전략
//!
//! 격리 플래그 규칙만으로는 도달하지 않는다 - 향후 선택 기준을 위한
//! 명시적 확장 지점으로 레지스트리에 등록되어 있다.

use super::{ActuatorKind, CubeActuator, ExecuteContext};
use crate::cube::PointResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tessera_foundation::{Guid, Result};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Async Actuator - 호출을 tokio 태스크로 제출하고 즉시 반환
///
/// 호출 태스크는 제출 시간만 점유한다. 같은 포인트에 대한 호출들의
/// 완료 순서는 보장하지 않는다 (포인트 자체가 강제하지 않는 한).
/// Slot별로 제출된 태스크를 추적해 `stop`에서 abort할 수 있다.
pub struct AsyncActuator {
    /// Slot id -> 진행 중인 태스크 핸들
    tasks: RwLock<HashMap<Guid, Vec<JoinHandle<()>>>>,
}

impl AsyncActuator {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// 해당 Slot의 진행 중(미완료) 태스크 수
    pub async fn pending_count(&self, slot_id: &Guid) -> usize {
        let tasks = self.tasks.read().await;
        tasks
            .get(slot_id)
            .map(|handles| handles.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }
}

impl Default for AsyncActuator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CubeActuator for AsyncActuator {
    fn kind(&self) -> ActuatorKind {
        ActuatorKind::Async
    }

    async fn execute(&self, ctx: Arc<ExecuteContext>) -> Result<PointResult> {
        let slot_id = ctx.slot().id.clone();
        debug!("Async submit | slot: {} | point: {}", slot_id, ctx.point().id);

        let task_ctx = Arc::clone(&ctx);
        let handle = tokio::spawn(async move {
            let point = Arc::clone(task_ctx.point());
            match point
                .invoke(Arc::clone(task_ctx.cube_api()), task_ctx.args())
                .await
            {
                Ok(result) => {
                    debug!(
                        "Async invocation complete | slot: {} | items: {}",
                        task_ctx.slot().id,
                        result.len()
                    );
                }
                Err(e) => {
                    error!(
                        "Async invocation failed | slot: {} | error: {}",
                        task_ctx.slot().id,
                        e
                    );
                }
            }
        });

        {
            let mut tasks = self.tasks.write().await;
            let handles = tasks.entry(slot_id).or_default();
            handles.retain(|h| !h.is_finished());
            handles.push(handle);
        }

        // 제출 즉시 수령 확인만 반환
        Ok(PointResult::new().with_item("submitted", serde_json::json!(true)))
    }

    async fn stop(&self, ctx: Arc<ExecuteContext>) -> Result<bool> {
        let slot_id = &ctx.slot().id;
        let mut tasks = self.tasks.write().await;

        if let Some(handles) = tasks.remove(slot_id) {
            let count = handles.len();
            for handle in handles {
                handle.abort();
            }
            debug!("Async stop | slot: {} | aborted {} task(s)", slot_id, count);
        }

        Ok(true)
    }
}
