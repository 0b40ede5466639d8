// Authentication bypass response analysis
//
// Decision table:
//   mutated == 0                            -> error / info
//   mutated == 200, content_length > 100    -> vulnerable (high if the body
//                                              matches a sensitive-data
//                                              pattern, else medium)
//   mutated in {201, 202, 204}              -> vulnerable / medium
//   mutated in {401, 403}                   -> secure / info
//   mutated in {301, 302, 307, 308}         -> secure / info when Location
//                                              points at a login page, else
//                                              inconclusive / low
//   mutated == 404                          -> inconclusive / low
//   mutated >= 500                          -> inconclusive / low
//   anything else                           -> inconclusive / low

use super::{base_evidence, ResponseAnalyzer, Verdict};
use crate::models::{ResponseSnapshot, Severity, TestCase, TestStatus};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref SENSITIVE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r#"(?i)"(?:id|user_id|email|username)"\s*:\s*"[^"]+"#).unwrap(),
        Regex::new(r#"(?i)"(?:token|key|secret)"\s*:\s*"[^"]+"#).unwrap(),
        Regex::new(r#"(?i)"(?:role|permissions|admin)"\s*:\s*"[^"]+"#).unwrap(),
        Regex::new(r"(?i)\b(?:admin|user|customer)\b.*\b(?:data|info|details)\b").unwrap(),
    ];
}

/// Body size below which a 200 is not treated as meaningful access.
const MEANINGFUL_CONTENT_LENGTH: usize = 100;

pub struct AuthBypassAnalyzer;

impl ResponseAnalyzer for AuthBypassAnalyzer {
    fn analyze(
        &self,
        baseline: &ResponseSnapshot,
        mutated: &ResponseSnapshot,
        case: &TestCase,
    ) -> Verdict {
        let mut evidence = base_evidence(baseline, mutated);
        evidence.insert(
            "test_description".to_string(),
            Value::from(case.test_name.clone()),
        );

        if mutated.status_code == 0 {
            return Verdict::new(TestStatus::Error, Severity::Info, evidence);
        }

        if mutated.status_code == 200 && mutated.content_length > MEANINGFUL_CONTENT_LENGTH {
            evidence.insert(
                "vulnerability_type".to_string(),
                Value::from("authentication_bypass"),
            );
            evidence.insert("access_granted".to_string(), Value::from(true));

            let sensitive = SENSITIVE_PATTERNS
                .iter()
                .any(|pattern| pattern.is_match(&mutated.content));
            if sensitive {
                evidence.insert("sensitive_data_exposed".to_string(), Value::from(true));
                return Verdict::new(TestStatus::Vulnerable, Severity::High, evidence);
            }
            return Verdict::new(TestStatus::Vulnerable, Severity::Medium, evidence);
        }

        if matches!(mutated.status_code, 201 | 202 | 204) {
            evidence.insert("partial_access".to_string(), Value::from(true));
            return Verdict::new(TestStatus::Vulnerable, Severity::Medium, evidence);
        }

        if matches!(mutated.status_code, 401 | 403) {
            evidence.insert("access_properly_denied".to_string(), Value::from(true));
            return Verdict::new(TestStatus::Secure, Severity::Info, evidence);
        }

        if matches!(mutated.status_code, 301 | 302 | 307 | 308) {
            let location = mutated
                .headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case("location"))
                .map(|(_, value)| value.to_lowercase())
                .unwrap_or_default();
            evidence.insert("redirect_response".to_string(), Value::from(true));
            evidence.insert("location".to_string(), Value::from(location.clone()));

            if ["login", "auth", "signin"].iter().any(|k| location.contains(k)) {
                return Verdict::new(TestStatus::Secure, Severity::Info, evidence);
            }
            return Verdict::new(TestStatus::Inconclusive, Severity::Low, evidence);
        }

        if mutated.status_code == 404 {
            evidence.insert("endpoint_not_found".to_string(), Value::from(true));
            return Verdict::new(TestStatus::Inconclusive, Severity::Low, evidence);
        }

        if mutated.status_code >= 500 {
            evidence.insert("server_error".to_string(), Value::from(true));
            return Verdict::new(TestStatus::Inconclusive, Severity::Low, evidence);
        }

        evidence.insert("unexpected_status".to_string(), Value::from(true));
        Verdict::new(TestStatus::Inconclusive, Severity::Low, evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Safety, TestType};
    use std::collections::HashMap;

    fn snapshot(status_code: u16, content: &str) -> ResponseSnapshot {
        ResponseSnapshot {
            status_code,
            content: content.to_string(),
            content_length: content.chars().count(),
            headers: HashMap::new(),
            elapsed_ms: 10,
        }
    }

    fn case() -> TestCase {
        TestCase {
            id: "t-1".to_string(),
            endpoint_id: "ep-1".to_string(),
            test_type: TestType::AuthBypass,
            test_name: "Missing Authorization header".to_string(),
            method: "GET".to_string(),
            url: "http://api/users".to_string(),
            headers: HashMap::new(),
            parameter_mutations: Vec::new(),
            jwt_mutations: Vec::new(),
            safety: Safety::for_method("GET"),
            expected_outcome: "access_denied".to_string(),
        }
    }

    #[test]
    fn large_200_with_sensitive_fields_is_high() {
        let body = format!(
            r#"{{"users": [{{"id": "u-1", "email": "a@example.com"}}], "padding": "{}"}}"#,
            "x".repeat(100)
        );
        let verdict =
            AuthBypassAnalyzer.analyze(&snapshot(200, "baseline"), &snapshot(200, &body), &case());
        assert_eq!(verdict.status, TestStatus::Vulnerable);
        assert_eq!(verdict.severity, Severity::High);
        assert_eq!(
            verdict.evidence.get("sensitive_data_exposed").unwrap(),
            &serde_json::json!(true)
        );
    }

    #[test]
    fn large_200_without_sensitive_fields_is_medium() {
        let body = format!(r#"{{"items": [], "padding": "{}"}}"#, "x".repeat(120));
        let verdict =
            AuthBypassAnalyzer.analyze(&snapshot(200, "baseline"), &snapshot(200, &body), &case());
        assert_eq!(verdict.status, TestStatus::Vulnerable);
        assert_eq!(verdict.severity, Severity::Medium);
    }

    #[test]
    fn small_200_is_inconclusive() {
        let verdict =
            AuthBypassAnalyzer.analyze(&snapshot(200, "baseline"), &snapshot(200, "ok"), &case());
        assert_eq!(verdict.status, TestStatus::Inconclusive);
        assert_eq!(verdict.severity, Severity::Low);
    }

    #[test]
    fn denied_without_credentials_is_secure() {
        for status in [401, 403] {
            let verdict =
                AuthBypassAnalyzer.analyze(&snapshot(200, "baseline"), &snapshot(status, ""), &case());
            assert_eq!(verdict.status, TestStatus::Secure);
            assert_eq!(verdict.severity, Severity::Info);
        }
    }

    #[test]
    fn partial_success_codes_are_medium() {
        for status in [201, 202, 204] {
            let verdict =
                AuthBypassAnalyzer.analyze(&snapshot(200, "baseline"), &snapshot(status, ""), &case());
            assert_eq!(verdict.status, TestStatus::Vulnerable);
            assert_eq!(verdict.severity, Severity::Medium);
        }
    }

    #[test]
    fn redirect_to_login_is_secure() {
        let mut response = snapshot(302, "");
        response
            .headers
            .insert("location".to_string(), "https://api/Login?next=/admin".to_string());
        let verdict = AuthBypassAnalyzer.analyze(&snapshot(200, "b"), &response, &case());
        assert_eq!(verdict.status, TestStatus::Secure);
    }

    #[test]
    fn redirect_elsewhere_is_inconclusive() {
        let mut response = snapshot(307, "");
        response
            .headers
            .insert("Location".to_string(), "https://api/dashboard".to_string());
        let verdict = AuthBypassAnalyzer.analyze(&snapshot(200, "b"), &response, &case());
        assert_eq!(verdict.status, TestStatus::Inconclusive);
        assert_eq!(verdict.severity, Severity::Low);
    }

    #[test]
    fn not_found_and_server_errors_are_inconclusive() {
        for status in [404, 500, 502] {
            let verdict =
                AuthBypassAnalyzer.analyze(&snapshot(200, "b"), &snapshot(status, ""), &case());
            assert_eq!(verdict.status, TestStatus::Inconclusive);
            assert_eq!(verdict.severity, Severity::Low);
        }
    }

    #[test]
    fn transport_sentinel_is_error() {
        let verdict = AuthBypassAnalyzer.analyze(
            &snapshot(200, "b"),
            &ResponseSnapshot::transport_failure(1),
            &case(),
        );
        assert_eq!(verdict.status, TestStatus::Error);
        assert_eq!(verdict.severity, Severity::Info);
    }
}
