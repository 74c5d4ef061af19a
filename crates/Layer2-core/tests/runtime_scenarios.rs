//! 런타임 종단 시나리오 테스트
//!
//! 정의 등록 -> Slot 바인딩 -> 실행 -> 핫 리로드 -> Angel 제어까지
//! 공개 API만으로 수행한다.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tessera_core::{
    CubeApi, CubeConstructor, CubeDefinition, CubeModel, CubeRuntime, ExPackageDefinition,
    ExPointDefinition, FnExtension, Isolation, PointResult, SlotSetup,
};
use tessera_foundation::{EventType, Guid, Result};

// ============================================================================
// 픽스처: 로거 큐브
// ============================================================================

/// 받은 메시지를 보관하는 로거 큐브
struct LoggerCube {
    prefix: std::sync::RwLock<String>,
    received: AtomicUsize,
}

#[async_trait]
impl CubeApi for LoggerCube {
    async fn configure(&self, properties: &HashMap<String, Value>) -> Result<()> {
        if let Some(prefix) = properties.get("prefix").and_then(|v| v.as_str()) {
            *self.prefix.write().unwrap() = prefix.to_string();
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn logger_definition() -> CubeDefinition {
    let constructor: CubeConstructor = Arc::new(|| {
        Arc::new(LoggerCube {
            prefix: std::sync::RwLock::new(String::new()),
            received: AtomicUsize::new(0),
        })
    });

    CubeDefinition::new("system.log", "logger", constructor)
        .with_model(CubeModel::Singleton)
        .with_property("prefix", json!("[sys]"))
        .with_package(
            ExPackageDefinition::new("sys.log", "log package").with_point(
                ExPointDefinition::new("error", "error output")
                    .with_result_item("ack")
                    .with_result_item("count")
                    .with_extension(Arc::new(FnExtension::new("record", 1, |cube, args| {
                        let logger = cube
                            .as_any()
                            .downcast_ref::<LoggerCube>()
                            .expect("logger cube");
                        let count = logger.received.fetch_add(1, Ordering::SeqCst) + 1;
                        let prefix = logger.prefix.read().unwrap().clone();
                        let message = args
                            .first()
                            .and_then(|v| v.as_str())
                            .unwrap_or_default();
                        Ok(PointResult::new()
                            .with_item("ack", json!(format!("{} {}", prefix, message)))
                            .with_item("count", json!(count)))
                    }))),
            ),
        )
}

fn error_setup() -> SlotSetup {
    SlotSetup::new("system.log", "sys.log", "error", "ack")
}

// ============================================================================
// 시나리오
// ============================================================================

#[tokio::test]
async fn scenario_register_bind_execute_roundtrip() {
    let runtime = CubeRuntime::new().await;
    runtime.register_definition(logger_definition()).await.unwrap();

    runtime.create_slot("ui.on-error", "error reporting hook").await;
    runtime
        .bind_slot(&Guid::of("ui.on-error"), error_setup())
        .await
        .unwrap();

    let result = runtime
        .execute(&Guid::of("ui.on-error"), vec![json!("boom")])
        .await
        .expect("bound slot should execute");

    // configure 단계에서 주입된 prefix가 결과에 반영된다
    assert_eq!(result.get("ack"), Some(&json!("[sys] boom")));
    assert_eq!(result.get("count"), Some(&json!(1)));

    // 바인딩과 큐브 생성이 이벤트로 관측된다
    let types: Vec<EventType> = runtime
        .event_bus()
        .history()
        .await
        .iter()
        .map(|e| e.event_type)
        .collect();
    assert!(types.contains(&EventType::SlotBound));
    assert!(types.contains(&EventType::CubeCreated));
}

#[tokio::test]
async fn scenario_undeclared_result_name_is_swallowed() {
    let runtime = CubeRuntime::new().await;
    runtime.register_definition(logger_definition()).await.unwrap();

    runtime.create_slot("s2", "bad result name").await;
    runtime
        .bind_slot(
            &Guid::of("s2"),
            SlotSetup::new("system.log", "sys.log", "error", "missing"),
        )
        .await
        .unwrap();

    assert!(runtime.execute(&Guid::of("s2"), vec![]).await.is_none());
    assert!(runtime.stop(&Guid::of("s2")).await);
}

#[tokio::test]
async fn scenario_hot_reload_resets_singleton_state() {
    let runtime = CubeRuntime::new().await;
    runtime.register_definition(logger_definition()).await.unwrap();

    runtime.create_slot("s1", "slot").await;
    runtime.bind_slot(&Guid::of("s1"), error_setup()).await.unwrap();

    runtime.execute(&Guid::of("s1"), vec![json!("a")]).await.unwrap();
    runtime.execute(&Guid::of("s1"), vec![json!("b")]).await.unwrap();

    // 무효화 후 다음 실행은 새 인스턴스의 카운터에서 시작한다
    assert_eq!(runtime.invalidate(&Guid::of("system.log")).await, 1);
    let result = runtime.execute(&Guid::of("s1"), vec![json!("c")]).await.unwrap();
    assert_eq!(result.get("count"), Some(&json!(1)));

    let history = runtime.event_bus().history().await;
    assert!(history
        .iter()
        .any(|e| e.event_type == EventType::CubeInvalidated));
}

#[tokio::test]
async fn scenario_angel_cube_lifecycle() {
    struct GuardCube;

    #[async_trait]
    impl CubeApi for GuardCube {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    let constructor: CubeConstructor = Arc::new(|| Arc::new(GuardCube));

    let runtime = CubeRuntime::new().await;
    runtime
        .register_definition(
            CubeDefinition::new("sys.guard", "guard", constructor)
                .with_model(CubeModel::Singleton)
                .with_isolation(Isolation::Angel)
                .with_package(
                    ExPackageDefinition::new("guard.pkg", "guard package").with_point(
                        ExPointDefinition::new("check", "access check")
                            .with_result_item("allowed")
                            .with_extension(Arc::new(FnExtension::new("allow", 1, |_c, _a| {
                                Ok(PointResult::new().with_item("allowed", json!(true)))
                            }))),
                    ),
                ),
        )
        .await
        .unwrap();

    assert!(runtime.start_angel(&Guid::of("sys.guard"), None).await.unwrap());

    // Angel 큐브의 Slot 실행은 샌드박스 전략으로 라우팅된다
    runtime.create_slot("s1", "guard slot").await;
    runtime
        .bind_slot(
            &Guid::of("s1"),
            SlotSetup::new("sys.guard", "guard.pkg", "check", "allowed"),
        )
        .await
        .unwrap();
    let result = runtime.execute(&Guid::of("s1"), vec![]).await.unwrap();
    assert_eq!(result.get("allowed"), Some(&json!(true)));

    assert!(runtime.stop_angel(&Guid::of("sys.guard"), None).await.unwrap());

    let history = runtime.event_bus().history().await;
    let types: Vec<EventType> = history.iter().map(|e| e.event_type).collect();
    assert!(types.contains(&EventType::AngelStarted));
    assert!(types.contains(&EventType::AngelStopped));
}

#[tokio::test]
async fn scenario_two_runtimes_are_independent() {
    let a = CubeRuntime::new().await;
    let b = CubeRuntime::new().await;

    a.register_definition(logger_definition()).await.unwrap();

    assert!(a.has_cube(&Guid::of("system.log")).await);
    assert!(!b.has_cube(&Guid::of("system.log")).await);

    // 같은 정의를 b에도 독립적으로 등록할 수 있다
    b.register_definition(logger_definition()).await.unwrap();
    assert_eq!(b.summary().await.definitions, 1);
}

#[tokio::test]
async fn scenario_rebind_redirects_next_call() {
    let runtime = CubeRuntime::new().await;
    runtime.register_definition(logger_definition()).await.unwrap();

    runtime.create_slot("s1", "slot").await;
    runtime.bind_slot(&Guid::of("s1"), error_setup()).await.unwrap();
    runtime.execute(&Guid::of("s1"), vec![json!("x")]).await.unwrap();

    // 존재하지 않는 타깃으로 재바인딩하면 다음 호출은 None으로 수렴
    runtime
        .bind_slot(
            &Guid::of("s1"),
            SlotSetup::new("no.such.cube", "sys.log", "error", "ack"),
        )
        .await
        .unwrap();
    assert!(runtime.execute(&Guid::of("s1"), vec![json!("y")]).await.is_none());

    // 원래 타깃으로 되돌리면 같은 싱글턴 인스턴스가 이어서 응답한다
    runtime.bind_slot(&Guid::of("s1"), error_setup()).await.unwrap();
    let result = runtime.execute(&Guid::of("s1"), vec![json!("z")]).await.unwrap();
    assert_eq!(result.get("count"), Some(&json!(2)));
}
