// src/db/remote_sync.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::error::{AppError, SyncError};

/// A change mirrored to the remote school API. Bodies are camelCase here and
/// converted to snake_case on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteChange {
    Create { resource: &'static str, body: Value },
    Update { resource: &'static str, id: String, body: Value },
    Delete { resource: &'static str, id: String },
    PasswordChange { identifier: String, new_password: String },
}

impl RemoteChange {
    pub fn describe(&self) -> String {
        match self {
            RemoteChange::Create { resource, .. } => format!("create {resource}"),
            RemoteChange::Update { resource, id, .. } => format!("update {resource}/{id}"),
            RemoteChange::Delete { resource, id } => format!("delete {resource}/{id}"),
            RemoteChange::PasswordChange { identifier, .. } => format!("password change for {identifier}"),
        }
    }
}

/// Port to the remote service. Every call may fail; callers decide what a failure
/// means through a [`SyncPolicy`].
#[async_trait]
pub trait RemoteSync: Send + Sync {
    /// Returns the whole collection for `resource`, already normalized to camelCase.
    async fn fetch(&self, resource: &str) -> Result<Value, SyncError>;

    async fn push(&self, change: RemoteChange) -> Result<(), SyncError>;
}

// =========================================================================
//  POLICY
// =========================================================================

/// How remote failures are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// The local cache is authoritative: fetch failures fall back to the cache and
    /// push failures are logged while the local mutation proceeds.
    #[default]
    LocalWins,
    /// Remote failures abort loads and mutations.
    Strict,
}

impl SyncPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local_wins" | "local-wins" => Some(SyncPolicy::LocalWins),
            "strict" => Some(SyncPolicy::Strict),
            _ => None,
        }
    }
}

/// Pairs the remote port with the policy applied to its failures.
#[derive(Clone)]
pub struct SyncGateway {
    remote: Arc<dyn RemoteSync>,
    policy: SyncPolicy,
}

impl SyncGateway {
    pub fn new(remote: Arc<dyn RemoteSync>, policy: SyncPolicy) -> Self {
        Self { remote, policy }
    }

    pub fn offline() -> Self {
        Self::new(Arc::new(OfflineRemote), SyncPolicy::LocalWins)
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    pub async fn fetch(&self, resource: &str) -> Result<Value, SyncError> {
        self.remote.fetch(resource).await
    }

    /// Mirrors a change. Under `LocalWins` a failure is logged and swallowed.
    pub async fn mirror(&self, change: RemoteChange) -> Result<(), AppError> {
        let description = change.describe();
        match self.remote.push(change).await {
            Ok(()) => Ok(()),
            Err(SyncError::Disabled) => Ok(()),
            Err(e) => match self.policy {
                SyncPolicy::LocalWins => {
                    tracing::warn!("remote {} failed, keeping local change: {}", description, e);
                    Ok(())
                }
                SyncPolicy::Strict => Err(AppError::RemoteSync(e)),
            },
        }
    }
}

// =========================================================================
//  IMPLEMENTATIONS
// =========================================================================

/// Used when no remote API is configured.
pub struct OfflineRemote;

#[async_trait]
impl RemoteSync for OfflineRemote {
    async fn fetch(&self, _resource: &str) -> Result<Value, SyncError> {
        Err(SyncError::Disabled)
    }

    async fn push(&self, _change: RemoteChange) -> Result<(), SyncError> {
        Err(SyncError::Disabled)
    }
}

pub struct HttpRemoteSync {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemoteSync {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }
}

#[async_trait]
impl RemoteSync for HttpRemoteSync {
    async fn fetch(&self, resource: &str) -> Result<Value, SyncError> {
        let response = self.client.get(self.url(resource)).send().await?;
        if !response.status().is_success() {
            return Err(SyncError::Status(response.status().as_u16()));
        }

        let body: Value = response.json().await?;

        // Some endpoints wrap the list as { "data": [...] }.
        let list = match body {
            Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
            other => other,
        };
        if !list.is_array() {
            return Err(SyncError::Decode(format!("expected a list for {resource}")));
        }

        Ok(to_camel_case_keys(list))
    }

    async fn push(&self, change: RemoteChange) -> Result<(), SyncError> {
        let request = match change {
            RemoteChange::Create { resource, body } => {
                self.client.post(self.url(resource)).json(&to_snake_case_keys(body))
            }
            RemoteChange::Update { resource, id, body } => self
                .client
                .put(self.url(&format!("{resource}/{id}")))
                .json(&to_snake_case_keys(body)),
            RemoteChange::Delete { resource, id } => {
                self.client.delete(self.url(&format!("{resource}/{id}")))
            }
            RemoteChange::PasswordChange { identifier, new_password } => self
                .client
                .post(self.url("auth/change-password"))
                .json(&serde_json::json!({ "identifier": identifier, "new_password": new_password })),
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SyncError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

// =========================================================================
//  WIRE <-> MEMORY KEY TRANSLATION
// =========================================================================

pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

pub fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn rename_keys(value: Value, rename: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (rename(&k), rename_keys(v, rename)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| rename_keys(v, rename)).collect()),
        other => other,
    }
}

pub fn to_camel_case_keys(value: Value) -> Value {
    rename_keys(value, &snake_to_camel)
}

pub fn to_snake_case_keys(value: Value) -> Value {
    rename_keys(value, &camel_to_snake)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_keys_both_ways() {
        assert_eq!(snake_to_camel("grade_level_id"), "gradeLevelId");
        assert_eq!(snake_to_camel("lrn"), "lrn");
        assert_eq!(camel_to_snake("assignedTeacherId"), "assigned_teacher_id");
        assert_eq!(camel_to_snake("id"), "id");
    }

    #[test]
    fn nested_objects_and_arrays_are_renamed_but_values_are_not() {
        let wire = json!([{
            "full_name": "Ana Cruz",
            "violation_history": [{ "violation_type": "late_arrival" }],
            "section_id": "s_1"
        }]);
        let memory = to_camel_case_keys(wire);
        assert_eq!(
            memory,
            json!([{
                "fullName": "Ana Cruz",
                "violationHistory": [{ "violationType": "late_arrival" }],
                "sectionId": "s_1"
            }])
        );
    }

    #[test]
    fn policy_parses_from_settings() {
        assert_eq!(SyncPolicy::parse("local_wins"), Some(SyncPolicy::LocalWins));
        assert_eq!(SyncPolicy::parse(" STRICT "), Some(SyncPolicy::Strict));
        assert_eq!(SyncPolicy::parse("eventual"), None);
    }
}
