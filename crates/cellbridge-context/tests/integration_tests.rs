//! End-to-end tests: broker, contexts, sinks and the function table.

use cellbridge_context::{
    invoke, BindingTable, BridgeConfig, BridgeError, CellFunctions, ChannelSink,
    ContextBindingBroker, ContextScope, EmissionKind, MemorySink, SimpleBindings, UnitId,
    UnitPhase,
};
use cellbridge_convert::{StructuredConverter, TextFormat};
use cellbridge_core::{ObjectRef, TypeInfo, Value};
use cellbridge_render::bundle::{APPLICATION_JSON, TEXT_HTML};
use cellbridge_render::{FnRenderer, Payload, RenderRegistry, RenderedOutput};
use serde_json::json;
use std::sync::Arc;
use std::thread;

fn setup() -> (ContextBindingBroker, Arc<MemorySink>, SimpleBindings) {
    let sink = Arc::new(MemorySink::new());
    let broker = ContextBindingBroker::new(&BridgeConfig::default(), sink.clone());
    (broker, sink, SimpleBindings::new())
}

#[test]
fn test_notebook_cell_lifecycle() {
    let (mut broker, sink, mut bindings) = setup();

    for cell in 1..=3u64 {
        let unit = UnitId::from(cell);
        broker.bind(unit.clone(), &mut bindings).unwrap();
        let ctx = bindings.get("$$").unwrap();
        ctx.print(&Value::Int(cell as i64 * 10)).unwrap();
        broker.retire(&unit, &mut bindings).unwrap();
        assert_eq!(broker.state(&unit), UnitPhase::Retired);
    }

    let emissions = sink.emissions();
    let units: Vec<&str> = emissions.iter().map(|e| e.unit.as_str()).collect();
    assert_eq!(units, vec!["1", "2", "3"]);
    assert_eq!(sink.texts(), vec!["10", "20", "30"]);
    assert!(bindings.is_empty());
}

#[test]
fn test_display_and_structured_scenarios() {
    let (mut broker, sink, mut bindings) = setup();
    let ctx = broker.bind(UnitId::from("s"), &mut bindings).unwrap();

    ctx.display(&Value::from("hello")).unwrap();
    let value = Value::map([
        ("a", Value::Int(1)),
        ("b", Value::List(vec![Value::Bool(true), Value::Null])),
    ]);
    assert_eq!(ctx.as_structured(&value).unwrap(), json!({"a": 1, "b": [true, null]}));
    assert_eq!(ctx.as_text(&value, TextFormat::Compact).unwrap(), r#"{"a":1,"b":[true,null]}"#);

    let emissions = sink.emissions();
    assert_eq!(emissions.len(), 1);
    assert_eq!(emissions[0].kind, EmissionKind::Display);
    assert_eq!(emissions[0].output.plain_text(), Some("hello"));
}

#[test]
fn test_self_referential_object_through_context() {
    let (mut broker, sink, mut bindings) = setup();
    let ctx = broker.bind(UnitId::from("c"), &mut bindings).unwrap();

    let node = ObjectRef::new(Arc::new(TypeInfo::object("Node")));
    node.set("name", Value::from("root"));
    node.set("me", Value::Object(node.clone()));

    assert_eq!(
        ctx.as_text(&Value::Object(node.clone()), TextFormat::Compact).unwrap(),
        r#"{"name":"root","me":"<circular-reference>"}"#
    );

    ctx.display(&Value::Object(node)).unwrap();
    let output = &sink.emissions()[0].output;
    assert_eq!(
        output.get(APPLICATION_JSON),
        Some(&Payload::Json(json!({"name": "root", "me": "<circular-reference>"})))
    );
}

#[test]
fn test_failed_display_emits_error_artifact() {
    let (mut broker, sink, mut bindings) = setup();
    broker.renderers().write().unwrap().register(
        "Widget",
        Arc::new(FnRenderer::new("widget", |_: &mut RenderedOutput, _: &Value| {
            Err(cellbridge_render::RenderError::Failed("cannot draw".into()))
        })),
    );
    let ctx = broker.bind(UnitId::from("w"), &mut bindings).unwrap();
    let widget = ObjectRef::new(Arc::new(TypeInfo::object("Widget")));

    assert!(ctx.display(&Value::Object(widget)).is_ok());
    let output = &sink.emissions()[0].output;
    assert!(output.is_error());
    assert!(output.plain_text().unwrap().contains("cannot draw"));
}

#[test]
fn test_invoke_through_binding_table() {
    let (mut broker, sink, mut bindings) = setup();
    broker.bind(UnitId::from("dyn"), &mut bindings).unwrap();
    let ctx = bindings.get(broker.reserved_name()).unwrap();

    let yaml = invoke(
        ctx.as_ref(),
        "asYaml",
        &[Value::map([("k", Value::from("v"))])],
        broker.default_format(),
    )
    .unwrap();
    assert_eq!(yaml.as_str(), Some("k: v\n"));

    invoke(ctx.as_ref(), "display", &[Value::Int(5)], broker.default_format()).unwrap();
    assert_eq!(sink.texts(), vec!["5"]);
}

#[test]
fn test_retired_handle_rejects_every_operation() {
    let (mut broker, _, mut bindings) = setup();
    let unit = UnitId::from("r");
    let ctx = broker.bind(unit.clone(), &mut bindings).unwrap();
    broker.retire(&unit, &mut bindings).unwrap();

    let detached = BridgeError::ContextDetached { unit: unit.clone() };
    assert_eq!(ctx.display(&Value::Null), Err(detached.clone()));
    assert_eq!(ctx.print(&Value::Null), Err(detached.clone()));
    assert_eq!(ctx.as_structured(&Value::Null), Err(detached.clone()));
    assert_eq!(ctx.as_text(&Value::Null, TextFormat::Indented), Err(detached));
    assert_eq!(
        broker.bind(unit.clone(), &mut bindings).unwrap_err(),
        BridgeError::UnitRetired { unit }
    );
}

#[test]
fn test_cancellation_races_in_flight_display() {
    let (mut broker, sink, mut bindings) = setup();
    let unit = UnitId::from("cancel");
    let ctx = broker.bind(unit.clone(), &mut bindings).unwrap();

    let worker = {
        let ctx = ctx.clone();
        thread::spawn(move || {
            let mut completed = 0usize;
            for i in 0..200 {
                match ctx.display(&Value::Int(i)) {
                    Ok(()) => completed += 1,
                    Err(BridgeError::ContextDetached { .. }) => break,
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
            completed
        })
    };

    broker.retire(&unit, &mut bindings).unwrap();
    // Cancellation and normal completion may both retire.
    broker.retire(&unit, &mut bindings).unwrap();

    let completed = worker.join().unwrap();
    assert_eq!(sink.emissions().len(), completed);
    assert!(ctx.print(&Value::Null).is_err());
}

#[test]
fn test_shared_registry_across_sessions() {
    let converter = Arc::new(StructuredConverter::new());
    let renderers = RenderRegistry::with_defaults(converter.clone()).shared();
    let config = BridgeConfig::default();

    let sink_a = Arc::new(MemorySink::new());
    let sink_b = Arc::new(MemorySink::new());
    let mut a = ContextBindingBroker::with_registries(&config, sink_a.clone(), renderers.clone(), converter.clone());
    let mut b = ContextBindingBroker::with_registries(&config, sink_b.clone(), renderers.clone(), converter);
    let (mut bindings_a, mut bindings_b) = (SimpleBindings::new(), SimpleBindings::new());

    renderers.write().unwrap().register(
        "Badge",
        Arc::new(FnRenderer::new("badge", |bundle: &mut RenderedOutput, _: &Value| {
            bundle.insert_if_absent(TEXT_HTML, Payload::Text("<b>badge</b>".into()));
            Ok(())
        })),
    );

    let badge = Value::Object(ObjectRef::new(Arc::new(TypeInfo::object("Badge"))));
    let handles: Vec<_> = [
        a.bind(UnitId::from(1u64), &mut bindings_a).unwrap(),
        b.bind(UnitId::from(1u64), &mut bindings_b).unwrap(),
    ]
    .into_iter()
    .map(|ctx| {
        let badge = badge.clone();
        thread::spawn(move || ctx.display(&badge))
    })
    .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    for sink in [&sink_a, &sink_b] {
        let emissions = sink.emissions();
        assert_eq!(emissions.len(), 1);
        assert!(emissions[0].output.has(TEXT_HTML));
    }
}

#[test]
fn test_session_scope_attributes_to_current_unit() {
    let config = BridgeConfig {
        scope: ContextScope::Session,
        ..BridgeConfig::default()
    };
    let sink = Arc::new(MemorySink::new());
    let mut broker = ContextBindingBroker::new(&config, sink.clone());
    let mut bindings = SimpleBindings::new();

    let first = broker.bind(UnitId::from(1u64), &mut bindings).unwrap();
    first.print(&Value::from("one")).unwrap();
    broker.retire(&UnitId::from(1u64), &mut bindings).unwrap();

    broker.bind(UnitId::from(2u64), &mut bindings).unwrap();
    first.print(&Value::from("two")).unwrap();
    broker.close(&mut bindings);

    let units: Vec<String> = sink.emissions().iter().map(|e| e.unit.to_string()).collect();
    assert_eq!(units, vec!["1", "2"]);
    assert!(first.print(&Value::Null).is_err());
}

#[tokio::test]
async fn test_channel_sink_streams_to_host_task() {
    let (sink, mut rx) = ChannelSink::unbounded();
    let mut broker = ContextBindingBroker::new(&BridgeConfig::default(), Arc::new(sink));
    let mut bindings = SimpleBindings::new();

    let collector = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(emission) = rx.recv().await {
            seen.push((emission.unit.to_string(), emission.kind));
        }
        seen
    });

    let ctx = broker.bind(UnitId::from("t"), &mut bindings).unwrap();
    ctx.display(&Value::from("a")).unwrap();
    ctx.print(&Value::from("b")).unwrap();
    broker.close(&mut bindings);
    drop(ctx);
    drop(broker);

    let seen = collector.await.unwrap();
    assert_eq!(
        seen,
        vec![
            ("t".to_string(), EmissionKind::Display),
            ("t".to_string(), EmissionKind::Print),
        ]
    );
}
