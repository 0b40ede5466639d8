// Authentication context for authprobe
//
// The caller supplies at most one raw header string ("Name: value" or a bare
// Authorization value). The context turns it into a header map the planner
// copies into every case, and answers the bearer-JWT heuristic the JWT test
// branch keys on.

use std::collections::HashMap;

/// Header names whose values are masked before a request shape is recorded
/// into a result.
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "x-api-key", "x-auth-token", "x-jwt-token"];

#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub headers: HashMap<String, String>,
}

impl AuthContext {
    /// Parse a raw header string. `"X-Api-Key: abc"` becomes that header;
    /// a string without a colon is treated as an Authorization value.
    pub fn from_header(raw: Option<&str>) -> Self {
        let mut headers = HashMap::new();
        if let Some(raw) = raw {
            if let Some((name, value)) = raw.split_once(':') {
                headers.insert(name.trim().to_string(), value.trim().to_string());
            } else if !raw.trim().is_empty() {
                headers.insert("Authorization".to_string(), raw.trim().to_string());
            }
        }
        Self { headers }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn authorization(&self) -> Option<&String> {
        self.headers.get("Authorization")
    }

    /// Bearer-JWT heuristic: the Authorization value mentions "Bearer" and
    /// carries at least two dot-separated segments.
    pub fn has_jwt_auth(&self) -> bool {
        let auth = self.authorization().map(String::as_str).unwrap_or("");
        auth.contains("Bearer") && auth.split('.').count() >= 2
    }

    /// Clone of the header map without any Authorization header,
    /// case-insensitive on the name.
    pub fn headers_without_authorization(&self) -> HashMap<String, String> {
        self.headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("authorization"))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Mask credential-bearing header values, keeping enough of the edges to
/// correlate a result with the token that produced it.
pub fn mask_sensitive_headers(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            if SENSITIVE_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                let chars: Vec<char> = value.chars().collect();
                let masked = if chars.len() > 20 {
                    let head: String = chars[..8].iter().collect();
                    let tail: String = chars[chars.len() - 8..].iter().collect();
                    format!("{}...{}", head, tail)
                } else {
                    "***".to_string()
                };
                (name.clone(), masked)
            } else {
                (name.clone(), value.clone())
            }
        })
        .collect()
}
