use actix_web::{dev::Payload, FromRequest, HttpRequest};
use std::future::{ready, Ready};

/// Principal id stamped by the platform gateway. Authentication itself is
/// enforced upstream; this extractor only sources the acting principal for
/// the audit columns.
pub const PRINCIPAL_HEADER: &str = "X-Principal-Id";

/// Anonymous principal used when the gateway header is absent.
pub const ANONYMOUS_PRINCIPAL: i64 = 0;

#[derive(Debug, Clone, Copy)]
pub struct Principal {
    pub id: i64,
}

impl FromRequest for Principal {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let id = req
            .headers()
            .get(PRINCIPAL_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(ANONYMOUS_PRINCIPAL);

        ready(Ok(Principal { id }))
    }
}
