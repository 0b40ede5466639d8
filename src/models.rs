// Core data models for authprobe

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Security test category dispatched to an analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    Bola,
    AuthBypass,
    JwtManipulation,
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestType::Bola => write!(f, "bola"),
            TestType::AuthBypass => write!(f, "auth_bypass"),
            TestType::JwtManipulation => write!(f, "jwt_manipulation"),
        }
    }
}

/// Classification outcome of one executed test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Vulnerable,
    Secure,
    Inconclusive,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
    Info,
}

/// Where a parameter lives in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationType {
    Replace,
    Increment,
}

/// A parameter described by the external discovery stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointParameter {
    pub name: String,
    #[serde(rename = "in", alias = "location")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub schema_type: Option<String>,
}

/// An id-like parameter flagged as a BOLA candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdParameter {
    pub name: String,
    #[serde(rename = "in", alias = "location")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub id_confidence: f64,
    #[serde(default)]
    pub bola_testable: bool,
}

/// Endpoint record produced by the external discovery/normalization stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedEndpoint {
    pub id: String,
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub path_template: Option<String>,
    #[serde(default)]
    pub parameters: Vec<EndpointParameter>,
    #[serde(default)]
    pub id_parameters: Vec<IdParameter>,
    #[serde(default)]
    pub auth_detected: bool,
    #[serde(default)]
    pub security_hints: Vec<String>,
}

/// One deterministic request transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterMutation {
    pub name: String,
    pub location: ParameterLocation,
    pub mutation_type: MutationType,
    #[serde(default)]
    pub test_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JwtMutationType {
    AlgorithmNone,
    ClaimManipulation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtMutation {
    #[serde(rename = "type")]
    pub mutation_type: JwtMutationType,
    #[serde(default)]
    pub claims: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Safety metadata attached to every test case.
///
/// `mutating` is true iff the method can change server state; `unsafe_required`
/// marks cases the gate holds back unless the global unsafe flag is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Safety {
    pub mutating: bool,
    pub unsafe_required: bool,
}

impl Safety {
    pub fn for_method(method: &str) -> Self {
        let mutating = matches!(
            method.to_ascii_uppercase().as_str(),
            "POST" | "PUT" | "PATCH" | "DELETE"
        );
        Self {
            mutating,
            unsafe_required: mutating,
        }
    }
}

/// One planned probe against one endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub endpoint_id: String,
    pub test_type: TestType,
    pub test_name: String,
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub parameter_mutations: Vec<ParameterMutation>,
    #[serde(default)]
    pub jwt_mutations: Vec<JwtMutation>,
    pub safety: Safety,
    pub expected_outcome: String,
}

/// Bounded snapshot of one HTTP response.
///
/// `status_code == 0` is the transport-failure sentinel; the probe never
/// surfaces connection or timeout errors any other way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status_code: u16,
    pub content: String,
    pub content_length: usize,
    pub headers: HashMap<String, String>,
    pub elapsed_ms: u64,
}

impl ResponseSnapshot {
    /// Snapshot standing in for a request that never produced a response.
    pub fn transport_failure(elapsed_ms: u64) -> Self {
        Self {
            status_code: 0,
            content: String::new(),
            content_length: 0,
            headers: HashMap::new(),
            elapsed_ms,
        }
    }
}

/// Request shape recorded alongside a result, with sensitive headers masked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRecord {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub mutations: Vec<ParameterMutation>,
    #[serde(default)]
    pub jwt_mutations: Vec<JwtMutation>,
}

/// Response summary recorded alongside a result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub status_code: u16,
    pub content_length: usize,
    pub response_time_ms: u64,
}

impl From<&ResponseSnapshot> for ResponseRecord {
    fn from(snapshot: &ResponseSnapshot) -> Self {
        Self {
            status_code: snapshot.status_code,
            content_length: snapshot.content_length,
            response_time_ms: snapshot.elapsed_ms,
        }
    }
}

/// Immutable outcome of one executed test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub id: String,
    pub endpoint_id: String,
    pub test_type: TestType,
    pub test_name: String,
    pub status: TestStatus,
    pub severity: Severity,
    pub evidence: serde_json::Map<String, serde_json::Value>,
    pub request_data: RequestRecord,
    pub response_data: ResponseRecord,
    pub timing_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
