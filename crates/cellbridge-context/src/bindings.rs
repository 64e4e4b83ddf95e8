//! Interpreter binding table.
//!
//! The broker writes one typed handle per bound unit under the reserved
//! name. Hosts wire their interpreter's global table through
//! [`BindingTable`]; [`SimpleBindings`] is a plain map for embedding and
//! tests.
use crate::context::CellFunctions;
use std::collections::BTreeMap;
use std::sync::Arc;

pub trait BindingTable {
    /// Bind `name`, returning whatever it was bound to before.
    fn insert(
        &mut self,
        name: &str,
        functions: Arc<dyn CellFunctions>,
    ) -> Option<Arc<dyn CellFunctions>>;

    fn remove(&mut self, name: &str) -> Option<Arc<dyn CellFunctions>>;

    fn get(&self, name: &str) -> Option<Arc<dyn CellFunctions>>;
}

#[derive(Default)]
pub struct SimpleBindings {
    entries: BTreeMap<String, Arc<dyn CellFunctions>>,
}

impl SimpleBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}

impl BindingTable for SimpleBindings {
    fn insert(
        &mut self,
        name: &str,
        functions: Arc<dyn CellFunctions>,
    ) -> Option<Arc<dyn CellFunctions>> {
        self.entries.insert(name.to_string(), functions)
    }

    fn remove(&mut self, name: &str) -> Option<Arc<dyn CellFunctions>> {
        self.entries.remove(name)
    }

    fn get(&self, name: &str) -> Option<Arc<dyn CellFunctions>> {
        self.entries.get(name).cloned()
    }
}

impl std::fmt::Debug for SimpleBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleBindings")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;
    use crate::sink::MemorySink;
    use crate::unit::UnitId;
    use cellbridge_convert::StructuredConverter;
    use cellbridge_core::Value;
    use cellbridge_render::RenderRegistry;

    fn context(unit: &str, sink: Arc<MemorySink>) -> Arc<dyn CellFunctions> {
        let converter = Arc::new(StructuredConverter::new());
        let renderers = RenderRegistry::with_defaults(converter.clone()).shared();
        Arc::new(ExecutionContext::new(UnitId::from(unit), sink, renderers, converter))
    }

    #[test]
    fn test_insert_replaces_and_returns_previous() {
        let sink = Arc::new(MemorySink::new());
        let mut bindings = SimpleBindings::new();
        assert!(bindings.insert("$$", context("1", sink.clone())).is_none());
        assert!(bindings.insert("$$", context("2", sink.clone())).is_some());
        assert_eq!(bindings.len(), 1);

        bindings.get("$$").unwrap().print(&Value::Int(3)).unwrap();
        assert_eq!(sink.emissions()[0].unit, UnitId::from("2"));
    }

    #[test]
    fn test_remove() {
        let mut bindings = SimpleBindings::new();
        bindings.insert("$$", context("1", Arc::new(MemorySink::new())));
        assert!(bindings.remove("$$").is_some());
        assert!(bindings.remove("$$").is_none());
        assert!(bindings.get("$$").is_none());
        assert!(bindings.is_empty());
    }
}
