//! Operator authentication for the admin routes.
//!
//! Operators present HTTP Basic credentials, checked against one configured
//! username and an argon2 PHC hash. The hash is parsed when
//! [`OperatorAuth`] is built, so a malformed `auth_password_hash` stops the
//! server at startup instead of turning every admin call into a 401.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::{self, SaltString},
};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use promo_api::ApiError;
use rand_core::OsRng;

/// The single operator account this server accepts.
#[derive(Clone)]
pub struct OperatorAuth {
  username:      String,
  password_hash: String,
}

impl OperatorAuth {
  /// Fails if `password_hash` is not a PHC string.
  pub fn new(
    username: impl Into<String>,
    password_hash: impl Into<String>,
  ) -> Result<Self, password_hash::Error> {
    let password_hash = password_hash.into();
    PasswordHash::new(&password_hash)?;
    Ok(Self { username: username.into(), password_hash })
  }

  /// Hash `password` with a fresh salt, producing a value for
  /// `auth_password_hash`.
  pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
  }

  pub fn username(&self) -> &str { &self.username }

  /// Check the `Authorization` header of a request.
  pub fn check(&self, headers: &HeaderMap) -> Result<(), ApiError> {
    let creds = BasicCredentials::from_headers(headers).ok_or(ApiError::Unauthorized)?;
    if self.accepts(&creds) { Ok(()) } else { Err(ApiError::Unauthorized) }
  }

  fn accepts(&self, creds: &BasicCredentials) -> bool {
    let Ok(hash) = PasswordHash::new(&self.password_hash) else {
      return false;
    };
    // The hash is verified even for an unknown username.
    let password_ok = Argon2::default()
      .verify_password(creds.password.as_bytes(), &hash)
      .is_ok();
    password_ok && creds.username == self.username
  }
}

/// A decoded `Authorization: Basic …` header.
struct BasicCredentials {
  username: String,
  password: String,
}

impl BasicCredentials {
  fn from_headers(headers: &HeaderMap) -> Option<Self> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
      return None;
    }
    let decoded = String::from_utf8(B64.decode(encoded.trim()).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Self { username: username.to_owned(), password: password.to_owned() })
  }
}

/// Middleware rejecting requests without valid operator credentials.
pub async fn require_operator(
  State(auth): State<Arc<OperatorAuth>>,
  req: Request,
  next: Next,
) -> Result<Response, ApiError> {
  if let Err(e) = auth.check(req.headers()) {
    tracing::warn!(method = %req.method(), uri = %req.uri(), "operator authentication failed");
    return Err(e);
  }
  tracing::debug!(operator = auth.username(), uri = %req.uri(), "operator request");
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn operator() -> OperatorAuth {
    OperatorAuth::new("operator", OperatorAuth::hash_password("secret").unwrap()).unwrap()
  }

  fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, value.parse().unwrap());
    headers
  }

  fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  #[test]
  fn correct_credentials() {
    assert!(operator().check(&headers(&basic("operator", "secret"))).is_ok());
  }

  #[test]
  fn scheme_is_case_insensitive() {
    let value = basic("operator", "secret").replacen("Basic", "basic", 1);
    assert!(operator().check(&headers(&value)).is_ok());
  }

  #[test]
  fn password_may_contain_colons() {
    let auth = OperatorAuth::new("operator", OperatorAuth::hash_password("a:b").unwrap()).unwrap();
    assert!(auth.check(&headers(&basic("operator", "a:b"))).is_ok());
  }

  #[test]
  fn wrong_password_or_username() {
    let auth = operator();
    for value in [basic("operator", "wrong"), basic("admin", "secret")] {
      assert!(matches!(auth.check(&headers(&value)), Err(ApiError::Unauthorized)));
    }
  }

  #[test]
  fn malformed_headers_are_rejected() {
    let auth = operator();
    assert!(matches!(auth.check(&HeaderMap::new()), Err(ApiError::Unauthorized)));
    for value in ["Basic !!!not-base64!!!", "Bearer abc", "Basic"] {
      assert!(matches!(auth.check(&headers(value)), Err(ApiError::Unauthorized)));
    }
  }

  #[test]
  fn malformed_hash_is_refused_up_front() {
    assert!(OperatorAuth::new("operator", "not-a-phc-string").is_err());
  }
}
