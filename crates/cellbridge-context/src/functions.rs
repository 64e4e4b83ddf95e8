//! Cell function table and name-based dispatch.
//!
//! Hosts with a static interpreter generate one wrapper per entry of
//! [`cell_functions`] that forwards to the injected context. Dynamic
//! interpreters call [`invoke`] with the function name and arguments.

use crate::context::CellFunctions;
use crate::error::BridgeError;
use cellbridge_convert::TextFormat;
use cellbridge_core::Value;
use serde::Serialize;

/// Descriptor of a function exposed to user code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellFunction {
    pub name: &'static str,
    pub params: &'static [&'static str],
    /// Whether the call produces a value for user code.
    pub returns_value: bool,
}

const FUNCTIONS: &[CellFunction] = &[
    CellFunction {
        name: "display",
        params: &["value"],
        returns_value: false,
    },
    CellFunction {
        name: "print",
        params: &["value"],
        returns_value: false,
    },
    CellFunction {
        name: "asStructured",
        params: &["value"],
        returns_value: true,
    },
    CellFunction {
        name: "asText",
        params: &["value", "format?"],
        returns_value: true,
    },
    CellFunction {
        name: "asJson",
        params: &["value"],
        returns_value: true,
    },
    CellFunction {
        name: "asYaml",
        params: &["value"],
        returns_value: true,
    },
];

pub fn cell_functions() -> &'static [CellFunction] {
    FUNCTIONS
}

/// Call a cell function by name.
///
/// `display` and `print` return [`Value::Null`]. `asText` takes an
/// optional format name (`compact`/`json` or `indented`/`yaml`) and
/// defaults to `default_format`.
pub fn invoke(
    functions: &dyn CellFunctions,
    name: &str,
    args: &[Value],
    default_format: TextFormat,
) -> Result<Value, BridgeError> {
    match name {
        "display" => {
            functions.display(single(name, args)?)?;
            Ok(Value::Null)
        }
        "print" => {
            functions.print(single(name, args)?)?;
            Ok(Value::Null)
        }
        "asStructured" | "asJson" => {
            let tree = functions.as_structured(single(name, args)?)?;
            Ok(Value::from(tree))
        }
        "asYaml" => {
            let text = functions.as_text(single(name, args)?, TextFormat::Indented)?;
            Ok(Value::Str(text))
        }
        "asText" => {
            let (value, format) = match args {
                [value] => (value, default_format),
                [value, Value::Str(format)] => (value, parse_format(name, format)?),
                [_, other] => {
                    return Err(bad_args(
                        name,
                        format!("format must be a string, got {}", other.type_info().key()),
                    ))
                }
                _ => return Err(arity(name, "1 or 2", args.len())),
            };
            Ok(Value::Str(functions.as_text(value, format)?))
        }
        other => Err(BridgeError::UnknownFunction(other.to_string())),
    }
}

fn single<'a>(name: &str, args: &'a [Value]) -> Result<&'a Value, BridgeError> {
    match args {
        [value] => Ok(value),
        _ => Err(arity(name, "1", args.len())),
    }
}

fn parse_format(name: &str, format: &str) -> Result<TextFormat, BridgeError> {
    format
        .parse::<TextFormat>()
        .map_err(|message| bad_args(name, message))
}

fn arity(name: &str, expected: &str, got: usize) -> BridgeError {
    bad_args(name, format!("expected {} argument(s), got {}", expected, got))
}

fn bad_args(name: &str, message: String) -> BridgeError {
    BridgeError::BadArguments {
        function: name.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;
    use crate::sink::MemorySink;
    use crate::unit::UnitId;
    use cellbridge_convert::StructuredConverter;
    use cellbridge_render::RenderRegistry;
    use std::sync::Arc;

    fn context() -> (ExecutionContext, Arc<MemorySink>) {
        let converter = Arc::new(StructuredConverter::new());
        let renderers = RenderRegistry::with_defaults(converter.clone()).shared();
        let sink = Arc::new(MemorySink::new());
        (
            ExecutionContext::new(UnitId::from("1"), sink.clone(), renderers, converter),
            sink,
        )
    }

    #[test]
    fn test_function_table() {
        let names: Vec<&str> = cell_functions().iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec!["display", "print", "asStructured", "asText", "asJson", "asYaml"]
        );
        assert!(cell_functions().iter().all(|f| !f.params.is_empty()));
    }

    #[test]
    fn test_invoke_print_and_display() {
        let (ctx, sink) = context();
        let result = invoke(&ctx, "print", &[Value::Int(42)], TextFormat::Compact).unwrap();
        assert!(result.is_null());
        invoke(&ctx, "display", &[Value::from("hello")], TextFormat::Compact).unwrap();
        assert_eq!(sink.texts(), vec!["42", "hello"]);
    }

    #[test]
    fn test_invoke_as_text_formats() {
        let (ctx, _) = context();
        let value = Value::List(vec![Value::Int(1), Value::Int(2)]);

        let compact = invoke(&ctx, "asText", &[value.clone()], TextFormat::Compact).unwrap();
        assert_eq!(compact.as_str(), Some("[1,2]"));

        let yaml = invoke(&ctx, "asText", &[value, Value::from("yaml")], TextFormat::Compact)
            .unwrap();
        assert_eq!(yaml.as_str(), Some("- 1\n- 2\n"));
    }

    #[test]
    fn test_invoke_as_structured_returns_value() {
        let (ctx, _) = context();
        let result = invoke(
            &ctx,
            "asJson",
            &[Value::map([("a", Value::Int(1))])],
            TextFormat::Compact,
        )
        .unwrap();
        assert_eq!(result.to_string(), r#"{"a": 1}"#);
    }

    #[test]
    fn test_invoke_errors() {
        let (ctx, _) = context();
        assert!(matches!(
            invoke(&ctx, "plot", &[], TextFormat::Compact),
            Err(BridgeError::UnknownFunction(name)) if name == "plot"
        ));
        assert!(matches!(
            invoke(&ctx, "print", &[], TextFormat::Compact),
            Err(BridgeError::BadArguments { .. })
        ));
        assert!(matches!(
            invoke(&ctx, "asText", &[Value::Null, Value::from("xml")], TextFormat::Compact),
            Err(BridgeError::BadArguments { .. })
        ));
        assert!(matches!(
            invoke(&ctx, "asText", &[Value::Null, Value::Int(3)], TextFormat::Compact),
            Err(BridgeError::BadArguments { .. })
        ));
    }
}
