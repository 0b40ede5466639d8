// Test plan generation for authprobe
//
// Turns normalized endpoint records plus an auth context into an ordered,
// reproducible list of test cases. Planning is independent of execution:
// nothing here touches the network.

use crate::auth::AuthContext;
use crate::config::ScanConfig;
use crate::models::{
    IdParameter, JwtMutation, JwtMutationType, MutationType, NormalizedEndpoint,
    ParameterMutation, Safety, TestCase, TestType,
};
use serde_json::{json, Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

/// Every generated case expects the target to refuse the probe.
pub const EXPECTED_OUTCOME: &str = "access_denied";

/// Literal object ids probed for BOLA, in fixed order.
const BOLA_PROBE_VALUES: &[&str] = &["1", "999999", "admin", "0", "-1"];

/// Replacement Authorization values probed for auth bypass, in fixed order.
const INVALID_AUTH_VALUES: &[&str] = &[
    "Bearer invalid_token",
    "Bearer ",
    "Basic invalid",
    "Invalid format",
    "",
];

pub struct TestPlanGenerator<'a> {
    config: &'a ScanConfig,
    auth: &'a AuthContext,
}

impl<'a> TestPlanGenerator<'a> {
    pub fn new(config: &'a ScanConfig, auth: &'a AuthContext) -> Self {
        Self { config, auth }
    }

    /// Build the full plan. Endpoints are visited in input order and each
    /// contributes its cases in a fixed order (BOLA, then auth bypass, then
    /// JWT), so identical inputs always yield the same plan shape.
    pub fn create_plan(&self, endpoints: &[NormalizedEndpoint]) -> Vec<TestCase> {
        let mut plan = Vec::new();
        for endpoint in endpoints {
            plan.extend(self.endpoint_cases(endpoint));
        }
        debug!(cases = plan.len(), endpoints = endpoints.len(), "plan generated");
        plan
    }

    /// Deserialize raw endpoint records, skipping malformed ones so a single
    /// bad record never aborts planning.
    pub fn parse_endpoints(records: &[Value]) -> Vec<NormalizedEndpoint> {
        let mut endpoints = Vec::new();
        for record in records {
            match serde_json::from_value::<NormalizedEndpoint>(record.clone()) {
                Ok(endpoint) => endpoints.push(endpoint),
                Err(e) => warn!(error = %e, "skipping malformed endpoint record"),
            }
        }
        endpoints
    }

    fn endpoint_cases(&self, endpoint: &NormalizedEndpoint) -> Vec<TestCase> {
        let mut cases = Vec::new();
        let url = self.config.full_url(&endpoint.path);

        let bola_params: Vec<&IdParameter> = endpoint
            .id_parameters
            .iter()
            .filter(|p| p.bola_testable)
            .collect();
        if !bola_params.is_empty() {
            cases.extend(self.bola_cases(endpoint, &url, &bola_params));
        }

        if endpoint.auth_detected || !self.auth.is_empty() {
            cases.extend(self.auth_bypass_cases(endpoint, &url));
        }

        if endpoint.security_hints.iter().any(|h| h == "jwt_testable") || self.auth.has_jwt_auth() {
            cases.extend(self.jwt_cases(endpoint, &url));
        }

        cases
    }

    /// Per BOLA-testable id parameter: one increment case whose value is
    /// resolved at execution time, then one replace case per literal probe.
    fn bola_cases(
        &self,
        endpoint: &NormalizedEndpoint,
        url: &str,
        params: &[&IdParameter],
    ) -> Vec<TestCase> {
        let mut cases = Vec::new();

        for param in params {
            cases.push(TestCase {
                id: Uuid::new_v4().to_string(),
                endpoint_id: endpoint.id.clone(),
                test_type: TestType::Bola,
                test_name: format!("BOLA ID increment - {}", param.name),
                method: endpoint.method.clone(),
                url: url.to_string(),
                headers: self.auth.headers.clone(),
                parameter_mutations: vec![ParameterMutation {
                    name: param.name.clone(),
                    location: param.location,
                    mutation_type: MutationType::Increment,
                    test_value: None,
                }],
                jwt_mutations: Vec::new(),
                safety: Safety::for_method(&endpoint.method),
                expected_outcome: EXPECTED_OUTCOME.to_string(),
            });

            for value in BOLA_PROBE_VALUES {
                cases.push(TestCase {
                    id: Uuid::new_v4().to_string(),
                    endpoint_id: endpoint.id.clone(),
                    test_type: TestType::Bola,
                    test_name: format!("BOLA common ID - {}={}", param.name, value),
                    method: endpoint.method.clone(),
                    url: url.to_string(),
                    headers: self.auth.headers.clone(),
                    parameter_mutations: vec![ParameterMutation {
                        name: param.name.clone(),
                        location: param.location,
                        mutation_type: MutationType::Replace,
                        test_value: Some(value.to_string()),
                    }],
                    jwt_mutations: Vec::new(),
                    safety: Safety::for_method(&endpoint.method),
                    expected_outcome: EXPECTED_OUTCOME.to_string(),
                });
            }
        }

        cases
    }

    /// One case with the Authorization header stripped, then, if the caller
    /// supplied an Authorization value, one case per invalid replacement.
    fn auth_bypass_cases(&self, endpoint: &NormalizedEndpoint, url: &str) -> Vec<TestCase> {
        let mut cases = Vec::new();

        cases.push(TestCase {
            id: Uuid::new_v4().to_string(),
            endpoint_id: endpoint.id.clone(),
            test_type: TestType::AuthBypass,
            test_name: "Missing Authorization header".to_string(),
            method: endpoint.method.clone(),
            url: url.to_string(),
            headers: self.auth.headers_without_authorization(),
            parameter_mutations: Vec::new(),
            jwt_mutations: Vec::new(),
            safety: Safety::for_method(&endpoint.method),
            expected_outcome: EXPECTED_OUTCOME.to_string(),
        });

        if self.auth.authorization().is_some() {
            for invalid in INVALID_AUTH_VALUES {
                let mut headers = self.auth.headers.clone();
                headers.insert("Authorization".to_string(), invalid.to_string());

                let label: String = invalid.chars().take(20).collect();
                cases.push(TestCase {
                    id: Uuid::new_v4().to_string(),
                    endpoint_id: endpoint.id.clone(),
                    test_type: TestType::AuthBypass,
                    test_name: format!("Invalid Authorization - {}...", label),
                    method: endpoint.method.clone(),
                    url: url.to_string(),
                    headers,
                    parameter_mutations: Vec::new(),
                    jwt_mutations: Vec::new(),
                    safety: Safety::for_method(&endpoint.method),
                    expected_outcome: EXPECTED_OUTCOME.to_string(),
                });
            }
        }

        cases
    }

    /// One unsigned-token case and one claim-escalation case.
    fn jwt_cases(&self, endpoint: &NormalizedEndpoint, url: &str) -> Vec<TestCase> {
        if !self.auth.has_jwt_auth() {
            return Vec::new();
        }

        let mut claims = Map::new();
        claims.insert("role".to_string(), json!("admin"));
        claims.insert("admin".to_string(), json!(true));
        claims.insert("is_admin".to_string(), json!(true));

        vec![
            TestCase {
                id: Uuid::new_v4().to_string(),
                endpoint_id: endpoint.id.clone(),
                test_type: TestType::JwtManipulation,
                test_name: "JWT algorithm none bypass".to_string(),
                method: endpoint.method.clone(),
                url: url.to_string(),
                headers: self.auth.headers.clone(),
                parameter_mutations: Vec::new(),
                jwt_mutations: vec![JwtMutation {
                    mutation_type: JwtMutationType::AlgorithmNone,
                    claims: None,
                }],
                safety: Safety::for_method(&endpoint.method),
                expected_outcome: EXPECTED_OUTCOME.to_string(),
            },
            TestCase {
                id: Uuid::new_v4().to_string(),
                endpoint_id: endpoint.id.clone(),
                test_type: TestType::JwtManipulation,
                test_name: "JWT privilege escalation".to_string(),
                method: endpoint.method.clone(),
                url: url.to_string(),
                headers: self.auth.headers.clone(),
                parameter_mutations: Vec::new(),
                jwt_mutations: vec![JwtMutation {
                    mutation_type: JwtMutationType::ClaimManipulation,
                    claims: Some(claims),
                }],
                safety: Safety::for_method(&endpoint.method),
                expected_outcome: EXPECTED_OUTCOME.to_string(),
            },
        ]
    }
}

/// Persist a plan as newline-delimited JSON, one TestCase per line, for
/// audit and replay before execution starts.
pub fn save_plan(plan: &[TestCase], path: &Path) -> Result<(), crate::errors::PlanError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for case in plan {
        serde_json::to_writer(&mut writer, case)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
