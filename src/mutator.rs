// Request mutation engine for authprobe
//
// Pure transformations of (url, headers, body) and of JWT strings. Inputs
// are never modified in place; every entry point returns fresh copies so a
// mutation applied for one test case can never leak into another case's
// baseline.

use crate::models::{JwtMutation, JwtMutationType, MutationType, ParameterLocation, ParameterMutation};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

lazy_static! {
    static ref COOKIE_TOKEN: Regex = Regex::new(r"(?i)(?:jwt|token|auth)=([^;]+)").unwrap();
}

/// Header names other than Authorization that commonly carry a JWT.
const JWT_HEADERS: &[&str] = &["X-Auth-Token", "X-JWT-Token", "Access-Token"];

/// Apply a list of parameter mutations to a request shape, returning the
/// mutated copies. Unrecognized combinations leave the request unchanged.
pub fn apply(
    url: &str,
    headers: &HashMap<String, String>,
    body: &Map<String, Value>,
    mutations: &[ParameterMutation],
) -> (String, HashMap<String, String>, Map<String, Value>) {
    let mut url = url.to_string();
    let mut headers = headers.clone();
    let mut body = body.clone();

    for mutation in mutations {
        match mutation.location {
            ParameterLocation::Path => url = mutate_path_param(&url, mutation),
            ParameterLocation::Query => url = mutate_query_param(&url, mutation),
            ParameterLocation::Header => mutate_header_param(&mut headers, mutation),
            ParameterLocation::Body => mutate_body_param(&mut body, mutation),
        }
    }

    (url, headers, body)
}

/// Path mutation: a literal value replaces the first matching placeholder
/// (`{name}`, `<name>`, `:name`) or, when the URL carries no template, the
/// first purely numeric path segment. An increment without a literal bumps
/// the first numeric segment, falling back to "2".
fn mutate_path_param(url: &str, mutation: &ParameterMutation) -> String {
    if let Some(value) = &mutation.test_value {
        return replace_path_segment(url, &mutation.name, value);
    }
    if mutation.mutation_type == MutationType::Increment {
        return increment_path_id(url);
    }
    url.to_string()
}

fn replace_path_segment(url: &str, name: &str, value: &str) -> String {
    let templates = [
        format!("{{{}}}", name),
        format!("<{}>", name),
        format!(":{}", name),
    ];
    for template in &templates {
        if url.contains(template.as_str()) {
            return url.replacen(template.as_str(), value, 1);
        }
    }
    // No template present; target the first numeric segment instead.
    rewrite_first_numeric_segment(url, |_| value.to_string())
}

fn increment_path_id(url: &str) -> String {
    rewrite_first_numeric_segment(url, |segment| {
        segment
            .parse::<i64>()
            .map(|n| (n + 1).to_string())
            .unwrap_or_else(|_| "2".to_string())
    })
}

/// Rewrite the first all-digit path segment with `f`. Operates on the part
/// of the URL before any query string; the host never parses as a bare
/// number, so scheme://host prefixes are safe to scan through.
fn rewrite_first_numeric_segment<F>(url: &str, f: F) -> String
where
    F: Fn(&str) -> String,
{
    let (base, suffix) = match url.split_once('?') {
        Some((base, rest)) => (base, Some(rest)),
        None => (url, None),
    };

    let mut segments: Vec<String> = base.split('/').map(str::to_string).collect();
    for segment in segments.iter_mut() {
        if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
            *segment = f(segment);
            break;
        }
    }

    let rebuilt = segments.join("/");
    match suffix {
        Some(rest) => format!("{}?{}", rebuilt, rest),
        None => rebuilt,
    }
}

/// Query mutation: replace sets the literal value (inserting the key when
/// absent); increment parses the current value as an integer and adds one,
/// defaulting to "2" when missing or non-numeric.
fn mutate_query_param(url: &str, mutation: &ParameterMutation) -> String {
    let (base, rest) = match url.split_once('?') {
        Some((base, rest)) => (base, rest),
        None => (url, ""),
    };
    let (query, fragment) = match rest.split_once('#') {
        Some((query, fragment)) => (query, Some(fragment)),
        None => (rest, None),
    };

    let mut pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    let new_value = match (&mutation.test_value, mutation.mutation_type) {
        (Some(value), _) => value.clone(),
        (None, MutationType::Increment) => pairs
            .iter()
            .find(|(name, _)| name == &mutation.name)
            .and_then(|(_, value)| value.parse::<i64>().ok())
            .map(|n| (n + 1).to_string())
            .unwrap_or_else(|| "2".to_string()),
        (None, MutationType::Replace) => return url.to_string(),
    };

    match pairs.iter_mut().find(|(name, _)| name == &mutation.name) {
        Some(pair) => pair.1 = new_value,
        None => pairs.push((mutation.name.clone(), new_value)),
    }

    let new_query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish();

    match fragment {
        Some(fragment) => format!("{}?{}#{}", base, new_query, fragment),
        None => format!("{}?{}", base, new_query),
    }
}

/// Header mutation: the literal value is written directly.
fn mutate_header_param(headers: &mut HashMap<String, String>, mutation: &ParameterMutation) {
    if let Some(value) = &mutation.test_value {
        headers.insert(mutation.name.clone(), value.clone());
    }
}

/// Body mutation: the literal value is written directly; increment parses
/// the existing field as an integer and adds one, defaulting to 2.
fn mutate_body_param(body: &mut Map<String, Value>, mutation: &ParameterMutation) {
    match (&mutation.test_value, mutation.mutation_type) {
        (Some(value), _) => {
            body.insert(mutation.name.clone(), Value::String(value.clone()));
        }
        (None, MutationType::Increment) => {
            let next = body
                .get(&mutation.name)
                .and_then(field_as_i64)
                .map(|n| n + 1)
                .unwrap_or(2);
            body.insert(mutation.name.clone(), Value::from(next));
        }
        (None, MutationType::Replace) => {}
    }
}

fn field_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }
}

/// Apply one JWT mutation to a token. Decode failures are tolerated: the
/// original token is returned unchanged.
pub fn apply_jwt(token: &str, mutation: &JwtMutation) -> String {
    match mutation.mutation_type {
        JwtMutationType::AlgorithmNone => algorithm_none_jwt(token),
        JwtMutationType::ClaimManipulation => {
            let empty = Map::new();
            manipulate_jwt_claims(token, mutation.claims.as_ref().unwrap_or(&empty))
        }
    }
}

/// Rewrite the token's header with `alg: "none"` and drop the signature.
/// The payload segment is passed through untouched, so the result is always
/// `header'.payload.` with an empty third segment.
fn algorithm_none_jwt(token: &str) -> String {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() < 2 {
        return token.to_string();
    }

    let mut header = match decode_jwt_segment(parts[0]) {
        Some(header) => header,
        None => return token.to_string(),
    };
    header.insert("alg".to_string(), Value::String("none".to_string()));

    format!("{}.{}.", encode_jwt_segment(&header), parts[1])
}

/// Merge claims into the token's payload, keeping the original header and
/// the original (now cryptographically invalid) signature byte-for-byte.
fn manipulate_jwt_claims(token: &str, claims: &Map<String, Value>) -> String {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() < 2 {
        return token.to_string();
    }

    let mut payload = match decode_jwt_segment(parts[1]) {
        Some(payload) => payload,
        None => return token.to_string(),
    };
    for (claim, value) in claims {
        payload.insert(claim.clone(), value.clone());
    }

    let signature = parts.get(2).copied().unwrap_or("");
    format!("{}.{}.{}", parts[0], encode_jwt_segment(&payload), signature)
}

/// Decode one base64url JWT segment into a JSON object, tolerating missing
/// padding. Returns None on any malformed input.
pub fn decode_jwt_segment(segment: &str) -> Option<Map<String, Value>> {
    let bytes = URL_SAFE_NO_PAD.decode(segment.trim_end_matches('=')).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    serde_json::from_str::<Map<String, Value>>(&text).ok()
}

/// Encode a JSON object as an unpadded base64url JWT segment.
pub fn encode_jwt_segment(object: &Map<String, Value>) -> String {
    let json = serde_json::to_string(object).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json.as_bytes())
}

fn looks_like_jwt(token: &str) -> bool {
    !token.is_empty() && token.split('.').count() >= 2
}

/// Find a JWT in a header map: `Authorization: Bearer …` first, then the
/// common token headers, then a cookie value.
pub fn extract_jwt(headers: &HashMap<String, String>) -> Option<String> {
    if let Some(auth) = headers.get("Authorization") {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            let token = token.trim();
            if looks_like_jwt(token) {
                return Some(token.to_string());
            }
        }
    }

    for name in JWT_HEADERS {
        if let Some(token) = headers.get(*name) {
            if looks_like_jwt(token) {
                return Some(token.clone());
            }
        }
    }

    if let Some(cookie) = headers.get("Cookie") {
        if let Some(captures) = COOKIE_TOKEN.captures(cookie) {
            let token = captures.get(1).map(|m| m.as_str()).unwrap_or("");
            if looks_like_jwt(token) {
                return Some(token.to_string());
            }
        }
    }

    None
}

/// Write a mutated token back to whichever header slot carried the original,
/// returning a new header map.
pub fn replace_jwt_in_headers(
    headers: &HashMap<String, String>,
    new_jwt: &str,
) -> HashMap<String, String> {
    let mut mutated = headers.clone();

    if let Some(auth) = mutated.get("Authorization") {
        if auth.starts_with("Bearer ") {
            mutated.insert("Authorization".to_string(), format!("Bearer {}", new_jwt));
            return mutated;
        }
    }

    for name in JWT_HEADERS {
        if let Some(token) = mutated.get(*name) {
            if looks_like_jwt(token) {
                mutated.insert(name.to_string(), new_jwt.to_string());
                return mutated;
            }
        }
    }

    mutated
}
