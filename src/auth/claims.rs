use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload of the signed session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sid: Uuid,   // server-side session id
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
}
