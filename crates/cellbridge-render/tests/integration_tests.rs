//! Integration tests for the render registry with custom host types.

use cellbridge_convert::StructuredConverter;
use cellbridge_core::{
    ConversionError, Document, DocumentMap, HostValue, ObjectRef, Structurable, TypeInfo, Value,
    ValueEncoder,
};
use cellbridge_render::bundle::{APPLICATION_JSON, TEXT_HTML, TEXT_PLAIN};
use cellbridge_render::{FnRenderer, Payload, RenderRegistry, RenderedOutput, Renderer};
use serde_json::json;
use std::sync::{Arc, RwLock};
use std::thread;

fn table_renderer() -> Arc<dyn Renderer> {
    Arc::new(FnRenderer::new("table", |bundle: &mut RenderedOutput, value: &Value| {
        if let Value::Object(obj) = value {
            let rows: Vec<String> = obj
                .fields()
                .into_iter()
                .map(|(name, v)| format!("<tr><td>{}</td><td>{}</td></tr>", name, v))
                .collect();
            bundle.insert_if_absent(TEXT_HTML, Payload::Text(format!("<table>{}</table>", rows.join(""))));
        }
        Ok(())
    }))
}

#[test]
fn test_custom_html_renderer_for_object_type() {
    let converter = Arc::new(StructuredConverter::new());
    let mut registry = RenderRegistry::with_defaults(converter);
    registry.register("Row", table_renderer());

    let row = ObjectRef::with_fields(
        Arc::new(TypeInfo::object("Row")),
        [("id", Value::Int(1)), ("name", Value::from("ada"))],
    );
    let out = registry.render(&row.into());
    assert_eq!(
        out.get(TEXT_HTML),
        Some(&Payload::Text(
            "<table><tr><td>id</td><td>1</td></tr><tr><td>name</td><td>ada</td></tr></table>".into()
        ))
    );
    assert!(!out.has(APPLICATION_JSON));
}

#[test]
fn test_object_without_renderer_uses_json() {
    let registry = RenderRegistry::with_defaults(Arc::new(StructuredConverter::new()));
    let point = ObjectRef::with_fields(
        Arc::new(TypeInfo::object("Point")),
        [("x", Value::Int(1)), ("y", Value::Int(2))],
    );
    let out = registry.render(&point.into());
    assert_eq!(out.to_json()["data"][APPLICATION_JSON], json!({"x": 1, "y": 2}));
}

struct Matrix;

impl HostValue for Matrix {
    fn type_info(&self) -> Arc<TypeInfo> {
        Arc::new(TypeInfo::new("Matrix"))
    }

    fn describe(&self) -> String {
        "Matrix(2x2)".to_string()
    }
}

#[test]
fn test_host_value_without_capabilities_uses_default() {
    let registry = RenderRegistry::with_defaults(Arc::new(StructuredConverter::new()));
    let out = registry.render(&Value::Native(Arc::new(Matrix)));
    assert_eq!(out.plain_text(), Some("Matrix(2x2)"));
    assert_eq!(out.mime_types().collect::<Vec<_>>(), vec![TEXT_PLAIN]);
}

struct Celsius(f64);

impl Structurable for Celsius {
    fn to_structured(&self, encoder: &mut dyn ValueEncoder) -> Result<Document, ConversionError> {
        let mut map = DocumentMap::new();
        map.insert("celsius", encoder.encode(&Value::Float(self.0))?);
        Ok(Document::Map(map))
    }
}

impl HostValue for Celsius {
    fn type_info(&self) -> Arc<TypeInfo> {
        Arc::new(TypeInfo::new("Celsius"))
    }

    fn as_structurable(&self) -> Option<&dyn Structurable> {
        Some(self)
    }
}

#[test]
fn test_structurable_host_value_renders_as_json() {
    let registry = RenderRegistry::with_defaults(Arc::new(StructuredConverter::new()));
    let value = Value::Native(Arc::new(Celsius(21.5)));

    let (key, renderer) = registry.resolve_keyed(&value);
    assert_eq!(key.as_str(), "object");
    assert_eq!(renderer.name(), "json");

    let out = registry.render(&value);
    assert_eq!(out.get(APPLICATION_JSON), Some(&Payload::Json(json!({"celsius": 21.5}))));
    assert!(out.has(TEXT_PLAIN));
}

#[test]
fn test_registered_renderer_beats_structurable_routing() {
    let mut registry = RenderRegistry::with_defaults(Arc::new(StructuredConverter::new()));
    registry.register(
        "Celsius",
        Arc::new(FnRenderer::new("thermo", |bundle: &mut RenderedOutput, _: &Value| {
            bundle.insert_if_absent(TEXT_PLAIN, Payload::Text("21.5 C".into()));
            Ok(())
        })),
    );
    let out = registry.render(&Value::Native(Arc::new(Celsius(21.5))));
    assert_eq!(out.plain_text(), Some("21.5 C"));
    assert!(!out.has(APPLICATION_JSON));
}

#[test]
fn test_shared_registry_concurrent_reads_and_register() {
    let shared = RenderRegistry::with_defaults(Arc::new(StructuredConverter::new())).shared();

    let readers: Vec<_> = (0..4)
        .map(|i| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for _ in 0..50 {
                    let out = read(&shared).render(&Value::Int(i));
                    assert!(out.plain_text().is_some());
                }
            })
        })
        .collect();

    shared
        .write()
        .unwrap()
        .register("int", table_renderer());

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(read(&shared).resolve(&Value::Int(0)).name(), "table");
}

fn read(shared: &Arc<RwLock<RenderRegistry>>) -> std::sync::RwLockReadGuard<'_, RenderRegistry> {
    shared.read().unwrap()
}
