// Execution scheduler for authprobe
//
// Single sequential pass over an already-filtered plan: baseline probe,
// mutation, mutated probe, analyzer dispatch. Requests against a live target
// stay strictly ordered and throttled, and one failing case never aborts the
// batch; the run always yields one result per case.

use crate::analyzers::{AnalyzerSet, Verdict};
use crate::auth::mask_sensitive_headers;
use crate::config::ScanConfig;
use crate::errors::ProbeError;
use crate::models::{
    RequestRecord, ResponseRecord, Severity, TestCase, TestResult, TestStatus, TestType,
};
use crate::mutator;
use crate::probe::HttpProbe;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub struct ExecutionScheduler {
    probe: HttpProbe,
    analyzers: AnalyzerSet,
    delay: Duration,
}

impl ExecutionScheduler {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            probe: HttpProbe::new(config.timeout_ms),
            analyzers: AnalyzerSet::default(),
            delay: Duration::from_millis(config.delay_ms),
        }
    }

    /// Execute the plan in order. Preparation failures become error results;
    /// the inter-request delay is applied once per completed case, not
    /// between the baseline/mutated pair.
    pub async fn execute(&self, plan: &[TestCase]) -> Vec<TestResult> {
        let mut results = Vec::with_capacity(plan.len());
        info!(cases = plan.len(), "executing test plan");

        for case in plan {
            let start = Instant::now();
            let result = match self.run_case(case).await {
                Ok(result) => result,
                Err(e) => error_result(case, &e.to_string(), start.elapsed()),
            };
            debug!(test_name = %case.test_name, status = ?result.status, "case finished");
            results.push(result);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        results
    }

    async fn run_case(&self, case: &TestCase) -> Result<TestResult, ProbeError> {
        let start = Instant::now();
        let body: Map<String, Value> = Map::new();

        // JWT cases need a token to rewrite; without one there is nothing
        // to probe.
        if case.test_type == TestType::JwtManipulation
            && mutator::extract_jwt(&case.headers).is_none()
        {
            return Ok(no_jwt_result(case, start.elapsed()));
        }

        // Baseline: the case's own request shape, mutation layer not applied.
        let baseline = self
            .probe
            .execute(&case.method, &case.url, &case.headers, &body)
            .await?;

        let (url, mut headers, mutated_body) =
            mutator::apply(&case.url, &case.headers, &body, &case.parameter_mutations);

        if !case.jwt_mutations.is_empty() {
            if let Some(token) = mutator::extract_jwt(&headers) {
                let mut mutated_token = token;
                for mutation in &case.jwt_mutations {
                    mutated_token = mutator::apply_jwt(&mutated_token, mutation);
                }
                headers = mutator::replace_jwt_in_headers(&headers, &mutated_token);
            }
        }

        let mutated = self
            .probe
            .execute(&case.method, &url, &headers, &mutated_body)
            .await?;

        let verdict = self.analyzers.analyze(&baseline, &mutated, case);
        Ok(build_result(
            case,
            verdict,
            url,
            &headers,
            ResponseRecord::from(&mutated),
            start.elapsed(),
        ))
    }
}

fn build_result(
    case: &TestCase,
    verdict: Verdict,
    url: String,
    headers: &HashMap<String, String>,
    response: ResponseRecord,
    elapsed: Duration,
) -> TestResult {
    TestResult {
        id: case.id.clone(),
        endpoint_id: case.endpoint_id.clone(),
        test_type: case.test_type,
        test_name: case.test_name.clone(),
        status: verdict.status,
        severity: verdict.severity,
        evidence: verdict.evidence,
        request_data: RequestRecord {
            method: case.method.clone(),
            url,
            headers: mask_sensitive_headers(headers),
            mutations: case.parameter_mutations.clone(),
            jwt_mutations: case.jwt_mutations.clone(),
        },
        response_data: response,
        timing_ms: elapsed.as_millis() as u64,
        error: None,
    }
}

fn error_result(case: &TestCase, message: &str, elapsed: Duration) -> TestResult {
    TestResult {
        id: case.id.clone(),
        endpoint_id: case.endpoint_id.clone(),
        test_type: case.test_type,
        test_name: case.test_name.clone(),
        status: TestStatus::Error,
        severity: Severity::Info,
        evidence: Map::new(),
        request_data: RequestRecord {
            method: case.method.clone(),
            url: case.url.clone(),
            headers: mask_sensitive_headers(&case.headers),
            mutations: case.parameter_mutations.clone(),
            jwt_mutations: case.jwt_mutations.clone(),
        },
        response_data: ResponseRecord::default(),
        timing_ms: elapsed.as_millis() as u64,
        error: Some(message.to_string()),
    }
}

fn no_jwt_result(case: &TestCase, elapsed: Duration) -> TestResult {
    let mut evidence = Map::new();
    evidence.insert(
        "error".to_string(),
        Value::from("no JWT found in request headers"),
    );
    TestResult {
        id: case.id.clone(),
        endpoint_id: case.endpoint_id.clone(),
        test_type: case.test_type,
        test_name: case.test_name.clone(),
        status: TestStatus::Inconclusive,
        severity: Severity::Info,
        evidence,
        request_data: RequestRecord {
            method: case.method.clone(),
            url: case.url.clone(),
            headers: mask_sensitive_headers(&case.headers),
            mutations: Vec::new(),
            jwt_mutations: case.jwt_mutations.clone(),
        },
        response_data: ResponseRecord::default(),
        timing_ms: elapsed.as_millis() as u64,
        error: None,
    }
}
