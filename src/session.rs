use serde::Serialize;

/// Credentials for calls to the school API. Passed explicitly to whatever
/// builds a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl Session {
    pub fn new(token: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            token: token.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn headers(&self) -> Vec<(String, String)> {
        let mut out = vec![(
            "Authorization".to_string(),
            format!("Bearer {}", self.token),
        )];
        if let Some(key) = &self.api_key {
            out.push(("x-api-key".to_string(), key.clone()));
        }
        out
    }

    /// The attachment endpoint answers with a redirect to a signed storage
    /// URL, so the shell only needs the authenticated GET. `file_id` is the
    /// decoded id and is encoded again as one path segment.
    pub fn attachment_request(&self, base_url: &str, file_id: &str) -> AuthenticatedRequest {
        AuthenticatedRequest {
            method: "GET",
            url: format!(
                "{}/attachments/{}/file",
                base_url.trim_end_matches('/'),
                urlencoding::encode(file_id)
            ),
            headers: self.headers(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_and_api_key_headers() {
        let s = Session::new("tok", Some("k1".to_string()));
        assert_eq!(
            s.headers(),
            vec![
                ("Authorization".to_string(), "Bearer tok".to_string()),
                ("x-api-key".to_string(), "k1".to_string()),
            ]
        );
    }

    #[test]
    fn blank_api_key_is_dropped() {
        let s = Session::new("tok", Some("  ".to_string()));
        assert_eq!(s.headers().len(), 1);
    }

    #[test]
    fn attachment_url_joins_cleanly() {
        let s = Session::new("tok", None);
        let req = s.attachment_request("http://api.test/v1/", "f-9");
        assert_eq!(req.url, "http://api.test/v1/attachments/f-9/file");
        assert_eq!(req.method, "GET");
    }

    #[test]
    fn attachment_id_stays_inside_its_segment() {
        let s = Session::new("tok", None);
        let req = s.attachment_request("http://api.test/v1", "../../users/me?x=1#");
        assert_eq!(
            req.url,
            "http://api.test/v1/attachments/..%2F..%2Fusers%2Fme%3Fx%3D1%23/file"
        );
        let req = s.attachment_request("http://api.test/v1", "report card.pdf");
        assert_eq!(req.url, "http://api.test/v1/attachments/report%20card.pdf/file");
    }
}
