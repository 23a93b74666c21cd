//! HTTP API Data Transfer Objects
//!
//! Defines request/response types for admin endpoints and WebSocket metadata.

use serde::Serialize;

/// JSON response: { success, data?, error? }
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorDto>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Error details in API response
#[derive(Debug, Serialize)]
pub struct ApiErrorDto {
    pub code: String,
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Server statistics response
#[derive(Debug, Serialize)]
pub struct StatsDto {
    pub knowledge_graphs: usize,
    pub relations: usize,
    pub views: usize,
    pub memory_usage_bytes: u64,
    pub query_count: u64,
    pub uptime_secs: u64,
    /// Session statistics
    pub sessions: SessionStatsDto,
}

/// Session statistics within server stats
#[derive(Debug, Serialize)]
pub struct SessionStatsDto {
    pub total: usize,
    pub clean: usize,
    pub dirty: usize,
    pub total_ephemeral_facts: usize,
    pub total_ephemeral_rules: usize,
}

/// Provenance metadata in session query response (used by WS handler)
#[derive(Debug, Serialize)]
pub struct SessionQueryMetadataDto {
    pub has_ephemeral: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ephemeral_sources: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
