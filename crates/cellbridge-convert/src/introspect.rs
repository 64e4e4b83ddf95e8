//! Field enumeration fallback.
//!
//! The only place the converter looks inside objects it was not told how to
//! convert. Everything else goes through registered converters or
//! [`cellbridge_core::Structurable`].

use cellbridge_core::Value;

/// What the fallback found inside a value.
pub(crate) enum Introspected {
    Fields(Vec<(String, Value)>),
    /// Nothing to enumerate; carries the plain-text form.
    Opaque(String),
}

pub(crate) fn introspect(value: &Value) -> Introspected {
    match value {
        Value::Object(obj) => Introspected::Fields(obj.fields()),
        Value::Native(host) => match host.fields() {
            Some(fields) => Introspected::Fields(fields),
            None => Introspected::Opaque(host.describe()),
        },
        other => Introspected::Opaque(other.to_string()),
    }
}
