use serde::{Deserialize, Serialize};
use tenure_core::types::LeaseSnapshot;

// ─── Registry Holder ────────────────────────────────────────────────────────

/// The entity a lease protects in the HTTP registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub app: String,
    pub instance_id: String,
    pub host: String,
    pub port: u16,
}

impl ServiceInstance {
    pub fn key(&self) -> String {
        instance_key(&self.app, &self.instance_id)
    }
}

/// Canonical registry key. App names are case-insensitive.
pub fn instance_key(app: &str, instance_id: &str) -> String {
    format!("{}:{}", app.to_uppercase(), instance_id)
}

// ─── Request Types ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterInstanceRequest {
    pub app: String,
    pub instance_id: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub lease_duration_secs: Option<u32>,
}

impl RegisterInstanceRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.app.trim().is_empty() {
            return Err("app is required".to_string());
        }
        if self.instance_id.trim().is_empty() {
            return Err("instance_id is required".to_string());
        }
        if self.app.contains(':') || self.instance_id.contains(':') {
            return Err("app and instance_id must not contain ':'".to_string());
        }
        if self.host.trim().is_empty() {
            return Err("host is required".to_string());
        }
        if self.port == 0 {
            return Err("port must be greater than 0".to_string());
        }
        if self.lease_duration_secs == Some(0) {
            return Err("lease_duration_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    pub fn into_instance(self) -> ServiceInstance {
        ServiceInstance {
            app: self.app,
            instance_id: self.instance_id,
            host: self.host,
            port: self.port,
        }
    }
}

// ─── Response Types ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub key: String,
    pub duration_ms: u64,
    pub registration_timestamp: u64,
}

#[derive(Serialize)]
pub struct InstanceInfo {
    pub key: String,
    pub instance: ServiceInstance,
    pub lease: LeaseSnapshot,
}

#[derive(Serialize)]
pub struct HeartbeatResponse {
    pub renewed: bool,
    pub key: String,
    pub last_renewal_timestamp: u64,
}

#[derive(Serialize)]
pub struct EvictResponse {
    pub evicted: usize,
    pub keys: Vec<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub registered_instances: usize,
    pub version: String,
}
