// JWT manipulation response analysis
//
// Decision table:
//   mutated == 0                  -> error / info
//   mutated == 200:
//     algorithm_none mutation     -> vulnerable / high (unsigned token accepted)
//     claim_manipulation mutation -> vulnerable / high when the body shows
//                                    elevated privileges, else vulnerable /
//                                    medium (modified claims accepted despite
//                                    an invalid signature)
//   mutated in {401, 403}         -> secure / info
//   mutated >= 500                -> inconclusive / low (possible parser
//                                    fragility, not proof of safety)
//   anything else                 -> inconclusive / low

use super::{base_evidence, ResponseAnalyzer, Verdict};
use crate::models::{JwtMutationType, ResponseSnapshot, Severity, TestCase, TestStatus};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref PRIVILEGE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r#"(?i)"role"\s*:\s*"admin""#).unwrap(),
        Regex::new(r#"(?i)"admin"\s*:\s*true"#).unwrap(),
        Regex::new(r#"(?i)"is_admin"\s*:\s*true"#).unwrap(),
        Regex::new(r#"(?i)"permissions"\s*:\s*\[[^\]]*"admin""#).unwrap(),
        Regex::new(r"(?i)admin.*dashboard").unwrap(),
        Regex::new(r"(?i)administrative.*access").unwrap(),
    ];
}

pub struct JwtAnalyzer;

impl ResponseAnalyzer for JwtAnalyzer {
    fn analyze(
        &self,
        baseline: &ResponseSnapshot,
        mutated: &ResponseSnapshot,
        case: &TestCase,
    ) -> Verdict {
        let mut evidence = base_evidence(baseline, mutated);
        if let Ok(mutations) = serde_json::to_value(&case.jwt_mutations) {
            evidence.insert("mutations_applied".to_string(), mutations);
        }

        if mutated.status_code == 0 {
            return Verdict::new(TestStatus::Error, Severity::Info, evidence);
        }

        if mutated.status_code == 200 {
            let mutation_type = case
                .jwt_mutations
                .first()
                .map(|mutation| mutation.mutation_type);

            match mutation_type {
                Some(JwtMutationType::AlgorithmNone) => {
                    evidence.insert(
                        "vulnerability_type".to_string(),
                        Value::from("jwt_algorithm_confusion"),
                    );
                    evidence.insert("accepts_unsigned_jwt".to_string(), Value::from(true));
                    return Verdict::new(TestStatus::Vulnerable, Severity::High, evidence);
                }
                Some(JwtMutationType::ClaimManipulation) => {
                    let elevated = PRIVILEGE_PATTERNS
                        .iter()
                        .any(|pattern| pattern.is_match(&mutated.content));
                    if elevated {
                        evidence.insert(
                            "vulnerability_type".to_string(),
                            Value::from("jwt_privilege_escalation"),
                        );
                        evidence
                            .insert("elevated_privileges_detected".to_string(), Value::from(true));
                        return Verdict::new(TestStatus::Vulnerable, Severity::High, evidence);
                    }
                    evidence.insert(
                        "vulnerability_type".to_string(),
                        Value::from("jwt_claim_manipulation"),
                    );
                    evidence.insert("accepts_modified_claims".to_string(), Value::from(true));
                    return Verdict::new(TestStatus::Vulnerable, Severity::Medium, evidence);
                }
                None => {}
            }
        }

        if matches!(mutated.status_code, 401 | 403) {
            evidence.insert("jwt_properly_validated".to_string(), Value::from(true));
            return Verdict::new(TestStatus::Secure, Severity::Info, evidence);
        }

        if mutated.status_code >= 500 {
            evidence.insert("server_error".to_string(), Value::from(true));
            evidence.insert(
                "potential_jwt_parsing_error".to_string(),
                Value::from(true),
            );
            return Verdict::new(TestStatus::Inconclusive, Severity::Low, evidence);
        }

        evidence.insert("unexpected_response".to_string(), Value::from(true));
        Verdict::new(TestStatus::Inconclusive, Severity::Low, evidence)
    }
}
