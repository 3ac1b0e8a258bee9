//! Per-browser vote and report markers, carried in a signed cookie.
//!
//! The cookie holds an HS256 token whose claims list marker strings of the
//! form `upvoted_{id}`, `downvoted_{id}` and `reported_{id}`. A missing,
//! expired or tampered cookie simply yields an empty session.

use std::collections::BTreeSet;
use std::future::{ready, Ready};

use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::{dev::Payload, web, Error, FromRequest, HttpRequest};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Id;
use crate::routes::AppState;

pub const SESSION_COOKIE: &str = "ideaboard_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoteMarker {
    #[default]
    None,
    Up,
    Down,
}

/// Typed access to the markers a session holds.
pub trait MarkerStore {
    fn vote_marker(&self, idea: Id) -> VoteMarker;
    fn set_vote_marker(&mut self, idea: Id, marker: VoteMarker);
    fn is_reported(&self, idea: Id) -> bool;
    fn mark_reported(&mut self, idea: Id);
}

#[derive(Clone)]
pub struct SessionConfig {
    secret: String,
    ttl_hours: i64,
    secure: bool,
}

impl SessionConfig {
    pub fn new(secret: impl Into<String>, ttl_hours: i64, secure: bool) -> Self {
        Self { secret: secret.into(), ttl_hours, secure }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    exp: usize,
    #[serde(default)]
    markers: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    markers: BTreeSet<String>,
    dirty: bool,
}

fn upvoted_key(id: Id) -> String { format!("upvoted_{id}") }
fn downvoted_key(id: Id) -> String { format!("downvoted_{id}") }
fn reported_key(id: Id) -> String { format!("reported_{id}") }

impl Session {
    /// Decodes a cookie value; anything invalid is an empty session.
    pub fn decode(token: &str, cfg: &SessionConfig) -> Self {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<Claims>(token, &DecodingKey::from_secret(cfg.secret.as_bytes()), &validation) {
            Ok(data) => Session { markers: data.claims.markers, dirty: false },
            Err(e) => {
                debug!("discarding session cookie: {e}");
                Session::default()
            }
        }
    }

    pub fn encode(&self, cfg: &SessionConfig) -> Result<String, jsonwebtoken::errors::Error> {
        let exp = (chrono::Utc::now() + chrono::Duration::hours(cfg.ttl_hours)).timestamp().max(0) as usize;
        let claims = Claims { exp, markers: self.markers.clone() };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(cfg.secret.as_bytes()))
    }

    pub fn to_cookie(&self, cfg: &SessionConfig) -> Result<Cookie<'static>, jsonwebtoken::errors::Error> {
        Ok(Cookie::build(SESSION_COOKIE, self.encode(cfg)?)
            .path("/")
            .http_only(true)
            .secure(cfg.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::hours(cfg.ttl_hours))
            .finish())
    }

    /// True once any marker changed since the session was read.
    pub fn is_dirty(&self) -> bool { self.dirty }

    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.markers.iter().map(String::as_str)
    }

    fn insert(&mut self, key: String) {
        if self.markers.insert(key) { self.dirty = true; }
    }

    fn remove(&mut self, key: &str) {
        if self.markers.remove(key) { self.dirty = true; }
    }
}

impl MarkerStore for Session {
    fn vote_marker(&self, idea: Id) -> VoteMarker {
        if self.markers.contains(&upvoted_key(idea)) {
            VoteMarker::Up
        } else if self.markers.contains(&downvoted_key(idea)) {
            VoteMarker::Down
        } else {
            VoteMarker::None
        }
    }

    fn set_vote_marker(&mut self, idea: Id, marker: VoteMarker) {
        self.remove(&upvoted_key(idea));
        self.remove(&downvoted_key(idea));
        match marker {
            VoteMarker::Up => self.insert(upvoted_key(idea)),
            VoteMarker::Down => self.insert(downvoted_key(idea)),
            VoteMarker::None => {}
        }
    }

    fn is_reported(&self, idea: Id) -> bool {
        self.markers.contains(&reported_key(idea))
    }

    fn mark_reported(&mut self, idea: Id) {
        self.insert(reported_key(idea));
    }
}

/// Extractor reading the session cookie with the app's `SessionConfig`.
impl FromRequest for Session {
    type Error = Error;
    type Future = Ready<Result<Self, Error>>;

    fn from_request(req: &HttpRequest, _pl: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            return ready(Err(actix_web::error::ErrorInternalServerError("session not configured")));
        };
        let session = req
            .cookie(SESSION_COOKIE)
            .map(|c| Session::decode(c.value(), &state.session))
            .unwrap_or_default();
        ready(Ok(session))
    }
}
