//! Expression evaluation against tree variables.

use std::collections::HashMap;

use serde_json::Value;

/// Variable store shared by a tree pass.
pub type VarMap = HashMap<String, Value>;

/// Evaluates condition and loop-guard expressions.
///
/// Implementations decide the expression language; the interpreter only
/// needs a JSON value back, which it folds to a boolean with
/// [`value_truthy`].
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(&self, expression: &str, vars: &VarMap, node_key: &str) -> anyhow::Result<Value>;
}

/// JavaScript-style truthiness for evaluated expressions.
pub fn value_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_follows_json_values() {
        assert!(!value_truthy(&Value::Null));
        assert!(!value_truthy(&json!(false)));
        assert!(!value_truthy(&json!(0)));
        assert!(!value_truthy(&json!("")));
        assert!(value_truthy(&json!(true)));
        assert!(value_truthy(&json!(1)));
        assert!(value_truthy(&json!(-0.5)));
        assert!(value_truthy(&json!("no")));
        assert!(value_truthy(&json!([])));
        assert!(value_truthy(&json!({})));
    }
}
