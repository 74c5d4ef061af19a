//! Angel Actuator - 샌드박스(비신뢰) 실행 전략
//!
//! 격리 플래그가 Angel인 큐브는 항상 이 전략으로 라우팅된다.

use super::{ActuatorKind, CubeActuator, ExecuteContext};
use crate::cube::PointResult;
use async_trait::async_trait;
use std::sync::Arc;
use tessera_foundation::Result;
use tracing::{debug, info};

/// Angel Actuator - 큐브를 비신뢰 대상으로 취급하는 실행 전략
///
/// 큐브에는 ExecuteContext 너머의 어떤 능력도 노출되지 않는다.
/// 자원/권한 강제 같은 실제 경계는 이 선택 지점 위에 얹는 향후 확장
/// 표면이다.
pub struct AngelActuator;

impl AngelActuator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AngelActuator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CubeActuator for AngelActuator {
    fn kind(&self) -> ActuatorKind {
        ActuatorKind::Angel
    }

    async fn execute(&self, ctx: Arc<ExecuteContext>) -> Result<PointResult> {
        info!(
            "Angel execute (untrusted) | slot: {} | cube instance: {} | point: {}",
            ctx.slot().id,
            ctx.cube_instance_id(),
            ctx.point().id
        );

        // 컨텍스트에 담긴 것 외에는 아무것도 전달하지 않는다
        ctx.point()
            .invoke(Arc::clone(ctx.cube_api()), ctx.args())
            .await
    }

    async fn stop(&self, ctx: Arc<ExecuteContext>) -> Result<bool> {
        debug!("Angel stop | slot: {}", ctx.slot().id);
        ctx.cube_api().stop().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::definition::ExPackageDefinition;
    use crate::cube::{
        CubeApi, ExtensionPackage, ExtensionPoint, FnExtension, Isolation, ResultDescriptor,
    };
    use crate::slot::Slot;
    use std::any::Any;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tessera_foundation::Guid;

    struct AngelCube {
        stopped: AtomicBool,
    }

    #[async_trait]
    impl CubeApi for AngelCube {
        async fn stop(&self) -> Result<bool> {
            self.stopped.store(true, Ordering::SeqCst);
            Ok(true)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    async fn angel_context(cube: Arc<AngelCube>) -> Arc<ExecuteContext> {
        let point = Arc::new(ExtensionPoint::new(
            "guard",
            "guard point",
            ResultDescriptor::new().with_item("ok"),
        ));
        point
            .register_extension(Arc::new(FnExtension::new("guard", 1, |_cube, _args| {
                Ok(PointResult::new().with_item("ok", serde_json::json!(true)))
            })))
            .await;

        let package = Arc::new(
            ExtensionPackage::from_definition(
                Guid::of("angel.cube"),
                &ExPackageDefinition::new("pkg", "angel package"),
            )
            .await,
        );

        Arc::new(ExecuteContext::new(
            Slot::new("s1", "slot"),
            Guid::new(),
            cube,
            Isolation::Angel,
            package,
            point,
            vec![],
        ))
    }

    #[tokio::test]
    async fn test_angel_executes_with_context_only() {
        let actuator = AngelActuator::new();
        let cube = Arc::new(AngelCube {
            stopped: AtomicBool::new(false),
        });

        let result = actuator.execute(angel_context(cube).await).await.unwrap();
        assert_eq!(result.get("ok"), Some(&serde_json::json!(true)));
    }

    #[tokio::test]
    async fn test_angel_stop_signals_cube() {
        let actuator = AngelActuator::new();
        let cube = Arc::new(AngelCube {
            stopped: AtomicBool::new(false),
        });

        assert!(actuator
            .stop(angel_context(Arc::clone(&cube)).await)
            .await
            .unwrap());
        assert!(cube.stopped.load(Ordering::SeqCst));
    }
}
