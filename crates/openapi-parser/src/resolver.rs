//! `$ref` resolution against the whole OpenAPI document

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

/// Resolves local `$ref` pointers (`#/components/...`) in an OpenAPI document.
///
/// References are inlined recursively. A reference that points back into one
/// of its own ancestors is left as a `$ref` node, so self-referential schemas
/// (trees, linked lists) terminate.
pub struct RefResolver<'a> {
    document: &'a Value,
}

impl<'a> RefResolver<'a> {
    pub fn new(document: &'a Value) -> Self {
        Self { document }
    }

    /// Look up the raw target of a local reference like `#/components/schemas/Battle`
    pub fn lookup(&self, reference: &str) -> Option<&'a Value> {
        let pointer = reference.strip_prefix('#')?;
        self.document.pointer(pointer)
    }

    /// Resolve a reference and deserialize its (fully inlined) target
    pub fn lookup_as<T: DeserializeOwned>(&self, reference: &str) -> Option<T> {
        let target = self.lookup(reference)?;
        let resolved = self.resolve_with_stack(target, &mut vec![reference.to_string()]);
        match serde_json::from_value(resolved) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Ignoring unusable reference {}: {}", reference, e);
                None
            }
        }
    }

    /// Resolve every `$ref` inside `schema`
    pub fn resolve(&self, schema: &Value) -> Value {
        self.resolve_with_stack(schema, &mut Vec::new())
    }

    fn resolve_with_stack(&self, value: &Value, stack: &mut Vec<String>) -> Value {
        match value {
            Value::Object(obj) => {
                if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
                    return self.resolve_reference(reference, obj, stack);
                }
                let resolved = obj
                    .iter()
                    .map(|(key, child)| (key.clone(), self.resolve_with_stack(child, stack)))
                    .collect();
                Value::Object(resolved)
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve_with_stack(item, stack))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn resolve_reference(
        &self,
        reference: &str,
        node: &Map<String, Value>,
        stack: &mut Vec<String>,
    ) -> Value {
        if stack.iter().any(|seen| seen == reference) {
            return Value::Object(node.clone());
        }
        let Some(target) = self.lookup(reference) else {
            debug!("Unresolvable reference: {}", reference);
            return Value::Object(node.clone());
        };

        stack.push(reference.to_string());
        let mut resolved = self.resolve_with_stack(target, stack);
        stack.pop();

        // OpenAPI 3.1 allows siblings next to $ref; they override the target.
        if let Value::Object(resolved_obj) = &mut resolved {
            for (key, sibling) in node.iter().filter(|(key, _)| key.as_str() != "$ref") {
                resolved_obj.insert(key.clone(), self.resolve_with_stack(sibling, stack));
            }
        }
        resolved
    }
}
