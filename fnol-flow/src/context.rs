use serde_json::Value;
use std::collections::HashMap;

/// Answers known so far for one request, keyed by question id
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnswerContext {
    data: HashMap<String, Value>,
}

impl AnswerContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer. `null` values are ignored so that an unanswered
    /// question stays absent.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        if !value.is_null() {
            self.data.insert(key.into(), value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// String view of an answer; a single-element list counts as its element.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.data.get(key)? {
            Value::String(s) => Some(s.as_str()),
            Value::Array(items) if items.len() == 1 => items[0].as_str(),
            _ => None,
        }
    }

    /// Boolean view of an answer, accepting the `"true"`/`"false"` literals.
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.data.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl FromIterator<(String, Value)> for AnswerContext {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut context = AnswerContext::new();
        for (key, value) in iter {
            context.set(key, value);
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_answers_stay_absent() {
        let mut context = AnswerContext::new();
        context.set("wereInjuries", Value::Null);
        assert!(!context.contains("wereInjuries"));
        assert!(context.is_empty());
    }

    #[test]
    fn typed_views() {
        let context: AnswerContext = [
            ("whoWasDriving".to_string(), json!("other")),
            ("wereInjuries".to_string(), json!("TRUE")),
            ("wasVehicleTowed".to_string(), json!(false)),
        ]
        .into_iter()
        .collect();

        assert_eq!(context.text("whoWasDriving"), Some("other"));
        assert_eq!(context.flag("wereInjuries"), Some(true));
        assert_eq!(context.flag("wasVehicleTowed"), Some(false));
        assert_eq!(context.flag("whoWasDriving"), None);
        assert_eq!(context.text("missing"), None);
    }
}
