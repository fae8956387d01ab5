//! Server-side sessions.
//!
//! The client only ever holds a signed cookie naming a session id; the
//! record itself (bound user, pending flash messages, expiry) lives here.
//! Expired records are dropped when they are next looked up, and swept
//! whenever a new session is created.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use parking_lot::RwLock;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::SessionClaims;
use crate::config::{SessionConfig, MAX_SESSION_TTL_MINUTES};

/// Pending one-shot notices, grouped by kind (`error`, `info`, ...).
pub type FlashMessages = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone)]
struct SessionRecord {
    user_id: Option<Uuid>,
    flash: FlashMessages,
    expires_at: OffsetDateTime,
}

/// What a request knows about its session once the cookie has been checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionView {
    pub id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
}

#[derive(Clone)]
pub struct SessionManager {
    records: Arc<RwLock<HashMap<Uuid, SessionRecord>>>,
    keys: Arc<SessionKeys>,
    ttl: Duration,
    cookie_name: Arc<str>,
    secure: bool,
}

impl SessionManager {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            keys: Arc::new(SessionKeys {
                encoding: EncodingKey::from_secret(config.secret.as_bytes()),
                decoding: DecodingKey::from_secret(config.secret.as_bytes()),
                issuer: config.issuer.clone(),
            }),
            ttl: Duration::minutes(config.ttl_minutes.clamp(0, MAX_SESSION_TTL_MINUTES)),
            cookie_name: Arc::from(config.cookie_name.as_str()),
            secure: config.secure_cookie,
        }
    }

    /// Reads the session cookie and returns the live session it names, if any.
    pub fn resolve(&self, headers: &HeaderMap) -> SessionView {
        let Some(token) = self.cookie_value(headers) else {
            return SessionView::default();
        };
        match self.verify(&token) {
            Ok(claims) => self.lookup(claims.sid),
            Err(e) => {
                debug!(error = %e, "session cookie rejected");
                SessionView::default()
            }
        }
    }

    fn lookup(&self, sid: Uuid) -> SessionView {
        let now = OffsetDateTime::now_utc();
        {
            let records = self.records.read();
            match records.get(&sid) {
                None => return SessionView::default(),
                Some(record) if record.expires_at > now => {
                    return SessionView {
                        id: Some(sid),
                        user_id: record.user_id,
                    }
                }
                Some(_) => {}
            }
        }
        self.records.write().remove(&sid);
        debug!(%sid, "session expired");
        SessionView::default()
    }

    /// Binds a fresh session to `user_id` and returns its `Set-Cookie` value.
    /// The previous session, if any, is discarded so the id always rotates on login.
    pub fn establish(&self, user_id: Uuid, previous: Option<Uuid>) -> anyhow::Result<String> {
        if let Some(prev) = previous {
            self.records.write().remove(&prev);
        }
        let (sid, cookie) = self.create(Some(user_id), FlashMessages::new())?;
        debug!(%sid, %user_id, "session established");
        Ok(cookie)
    }

    /// Queues a flash message. Clients without a live session get an anonymous
    /// one, in which case the new `Set-Cookie` value is returned.
    pub fn flash(
        &self,
        session: Option<Uuid>,
        kind: &str,
        message: &str,
    ) -> anyhow::Result<Option<String>> {
        if let Some(sid) = session {
            let mut records = self.records.write();
            if let Some(record) = records.get_mut(&sid) {
                record
                    .flash
                    .entry(kind.to_string())
                    .or_default()
                    .push(message.to_string());
                return Ok(None);
            }
        }

        let mut flash = FlashMessages::new();
        flash.insert(kind.to_string(), vec![message.to_string()]);
        let (sid, cookie) = self.create(None, flash)?;
        debug!(%sid, "anonymous session created for flash");
        Ok(Some(cookie))
    }

    /// Returns and clears every pending flash message of the session.
    pub fn take_flash(&self, session: Option<Uuid>) -> FlashMessages {
        let Some(sid) = session else {
            return FlashMessages::new();
        };
        self.records
            .write()
            .get_mut(&sid)
            .map(|record| std::mem::take(&mut record.flash))
            .unwrap_or_default()
    }

    /// Ends the session and returns a cookie that clears it client-side.
    /// Ending an unknown or already-ended session is not an error.
    pub fn end(&self, session: Option<Uuid>) -> String {
        if let Some(sid) = session {
            let existed = self.records.write().remove(&sid).is_some();
            debug!(%sid, existed, "session ended");
        }
        self.cookie("", 0)
    }

    fn create(
        &self,
        user_id: Option<Uuid>,
        flash: FlashMessages,
    ) -> anyhow::Result<(Uuid, String)> {
        let now = OffsetDateTime::now_utc();
        let expires_at = now + self.ttl;
        let sid = Uuid::new_v4();
        let token = self.sign(sid, now, expires_at)?;
        let mut records = self.records.write();
        records.retain(|_, record| record.expires_at > now);
        records.insert(
            sid,
            SessionRecord {
                user_id,
                flash,
                expires_at,
            },
        );
        drop(records);
        Ok((sid, self.cookie(&token, self.ttl.whole_seconds())))
    }

    fn sign(
        &self,
        sid: Uuid,
        issued_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let claims = SessionClaims {
            sid,
            iat: issued_at.unix_timestamp() as usize,
            exp: expires_at.unix_timestamp() as usize,
            iss: self.keys.issuer.clone(),
        };
        Ok(encode(&Header::default(), &claims, &self.keys.encoding)?)
    }

    fn verify(&self, token: &str) -> anyhow::Result<SessionClaims> {
        let mut validation = Validation::default();
        validation.set_issuer(std::slice::from_ref(&self.keys.issuer));
        let data = decode::<SessionClaims>(token, &self.keys.decoding, &validation)?;
        Ok(data.claims)
    }

    fn cookie(&self, value: &str, max_age: i64) -> String {
        let secure = if self.secure { "; Secure" } else { "" };
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
            self.cookie_name, value, max_age, secure
        )
    }

    fn cookie_value(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == &*self.cookie_name && !value.is_empty())
            .map(|(_, value)| value.to_string())
    }

    #[cfg(test)]
    pub(crate) fn live_sessions(&self) -> usize {
        self.records.read().len()
    }
}
