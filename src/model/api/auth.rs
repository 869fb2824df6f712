use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{
    errors::{Error as JwtError, ErrorKind as JwtErrorKind},
    DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{self, FromRequest},
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::model::{db::admin::Admin, mongodb::Id};
use crate::Config;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// An authentication token proving the bearer logged in as an admin.
///
/// Admin-only routes take this as a request guard: a missing, expired, or
/// tampered cookie fails the request with 401 before the handler runs.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminToken {
    #[serde(rename = "sub")]
    id: Id,
}

impl AdminToken {
    /// Create a token for the given admin.
    pub fn for_admin(admin: &Admin) -> Self {
        Self { id: admin.id }
    }

    /// The authenticated admin's ID.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Serialize this token into a signed cookie.
    pub fn into_cookie(self, config: &Config) -> Cookie<'static> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .unwrap(); // Infallible for HMAC keys.

        Cookie::build(AUTH_TOKEN_COOKIE, token)
            .max_age(time::Duration::seconds(config.auth_ttl().num_seconds()))
            .same_site(SameSite::Strict)
            .finish()
    }

    /// Deserialize and verify a token from a cookie.
    pub fn from_cookie(cookie: &Cookie<'_>, config: &Config) -> Result<Self, JwtError> {
        jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AdminToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminToken {
    type Error = JwtError;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let config = req.guard::<&State<Config>>().await.unwrap(); // Valid as `Config` is always managed

        let cookie = match req.cookies().get(AUTH_TOKEN_COOKIE) {
            Some(cookie) => cookie,
            None => {
                return request::Outcome::Failure((
                    Status::Unauthorized,
                    JwtErrorKind::InvalidToken.into(),
                ))
            }
        };

        match Self::from_cookie(cookie, config) {
            Ok(token) => request::Outcome::Success(token),
            Err(err) => request::Outcome::Failure((Status::Unauthorized, err)),
        }
    }
}
