use serde_json::{Map, Value};

/// Identifying data for one training run. Fixed for the lifetime of the
/// forwarder that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    run_name: String,
    index_name: String,
    extra_data: Map<String, Value>,
}

impl RunContext {
    pub fn new(
        run_name: impl Into<String>,
        index_name: impl Into<String>,
        extra_data: Map<String, Value>,
    ) -> Self {
        RunContext {
            run_name: run_name.into(),
            index_name: index_name.into(),
            extra_data,
        }
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    /// Destination collection. Must be lowercase and free of special
    /// characters; the store rejects anything else.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn extra_data(&self) -> &Map<String, Value> {
        &self.extra_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_keeps_fields() {
        let mut extra_data = Map::new();
        extra_data.insert("team".to_string(), json!("vision"));

        let context = RunContext::new("run-1", "keras", extra_data);
        assert_eq!(context.run_name(), "run-1");
        assert_eq!(context.index_name(), "keras");
        assert_eq!(context.extra_data().get("team"), Some(&json!("vision")));
    }
}
