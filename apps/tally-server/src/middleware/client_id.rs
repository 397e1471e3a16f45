//! Client identifier extractor used as the rate-limit key.

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload};

/// Identifier of the calling client, derived from its network origin.
///
/// Resolution order: first `X-Forwarded-For` entry, `X-Real-IP`, then the
/// peer IP without its port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn from_http_request(req: &HttpRequest) -> Self {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        if let Some(forwarded) = header("X-Forwarded-For") {
            if let Some(first) = forwarded.split(',').next().map(str::trim) {
                if !first.is_empty() {
                    return Self(first.to_string());
                }
            }
        }

        if let Some(real_ip) = header("X-Real-IP") {
            return Self(real_ip.to_string());
        }

        match req.peer_addr() {
            Some(addr) => Self(addr.ip().to_string()),
            None => Self("unknown".to_string()),
        }
    }
}

impl FromRequest for ClientId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self::from_http_request(req)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_forwarded_for_wins() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.7, 10.0.0.1"))
            .insert_header(("X-Real-IP", "198.51.100.2"))
            .to_http_request();

        assert_eq!(ClientId::from_http_request(&req).as_str(), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_fallback() {
        let req = TestRequest::default()
            .insert_header(("X-Real-IP", "198.51.100.2"))
            .to_http_request();

        assert_eq!(ClientId::from_http_request(&req).as_str(), "198.51.100.2");
    }

    #[test]
    fn test_peer_ip_without_port() {
        let req = TestRequest::default()
            .peer_addr("192.0.2.10:51234".parse().unwrap())
            .to_http_request();

        assert_eq!(ClientId::from_http_request(&req).as_str(), "192.0.2.10");
    }

    #[test]
    fn test_unknown_without_origin() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(ClientId::from_http_request(&req).as_str(), "unknown");
    }
}
