//! Introspection rules API.
//!
//! Rules are kept as opaque JSON: the server owns their schema, the client
//! only checks the overall shape before sending.

use http::Method;
use serde_json::{json, Value};

use super::{check_id, Client};
use crate::error::{InspectorError, Result};

/// Rules sub-API, borrowed from a [`Client`].
#[derive(Debug, Clone, Copy)]
pub struct RulesApi<'a> {
    client: &'a Client,
}

impl<'a> RulesApi<'a> {
    pub(super) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create a new introspection rule.
    ///
    /// `conditions` and `actions` must be arrays of objects. The server
    /// generates a UUID when `uuid` is `None`.
    pub fn create(
        &self,
        conditions: Value,
        actions: Value,
        uuid: Option<&str>,
        description: Option<&str>,
    ) -> Result<Value> {
        if let Some(uuid) = uuid {
            check_id("rule", uuid)?;
        }
        check_object_list("conditions", &conditions)?;
        check_object_list("actions", &actions)?;

        self.from_json(json!({
            "uuid": uuid,
            "conditions": conditions,
            "actions": actions,
            "description": description,
        }))
    }

    /// Import a rule given as a JSON object, sent unchanged.
    pub fn from_json(&self, rule: Value) -> Result<Value> {
        if !rule.is_object() {
            return Err(InspectorError::invalid_input(format!(
                "Expected a JSON object for a rule, got {rule}"
            )));
        }
        self.client
            .request(Method::POST, "rules", &[], Some(rule))?
            .json()
    }

    /// List all rules (short representations: uuid, description, links).
    pub fn get_all(&self) -> Result<Vec<Value>> {
        let mut body: Value = self.client.request(Method::GET, "rules", &[], None)?.json()?;
        match body.get_mut("rules").map(Value::take) {
            Some(Value::Array(rules)) => Ok(rules),
            _ => Err(InspectorError::InvalidResponse(
                "Rule listing has no \"rules\" array".to_string(),
            )),
        }
    }

    /// Get a single rule.
    pub fn get(&self, uuid: &str) -> Result<Value> {
        let uuid = check_id("rule", uuid)?;
        self.client
            .request(Method::GET, &format!("rules/{uuid}"), &[], None)?
            .json()
    }

    /// Delete a rule.
    pub fn delete(&self, uuid: &str) -> Result<()> {
        let uuid = check_id("rule", uuid)?;
        self.client
            .request(Method::DELETE, &format!("rules/{uuid}"), &[], None)?;
        Ok(())
    }

    /// Delete all rules.
    pub fn delete_all(&self) -> Result<()> {
        self.client.request(Method::DELETE, "rules", &[], None)?;
        Ok(())
    }
}

fn check_object_list(name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Array(items) if items.iter().all(Value::is_object) => Ok(()),
        other => Err(InspectorError::invalid_input(format!(
            "Expected list of objects for {name} argument, got {other}"
        ))),
    }
}

/// Split a rule document into rules: an array yields its elements, anything
/// else is a single rule.
pub fn rule_documents(document: Value) -> Vec<Value> {
    match document {
        Value::Array(rules) => rules,
        rule => vec![rule],
    }
}
