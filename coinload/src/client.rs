//! HTTP seam to the merch-shop API.

use crate::config::RunConfig;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Outcome of an `/api/auth` request. A missing token is not an error; the
/// caller carries an empty credential from then on.
#[derive(Debug, Clone)]
pub struct AuthReply {
    pub status: u16,
    pub token: Option<String>,
}

/// The four shop operations the scenario drives.
///
/// [`ApiClient`] is the wire implementation; scenario unit tests substitute
/// an in-memory stub so the workload logic runs without a network.
pub trait ShopApi {
    fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthReply, Error>> + Send;

    /// Returns the HTTP status of `GET /api/info`.
    fn info(&self, token: &str) -> impl Future<Output = Result<u16, Error>> + Send;

    /// Returns the HTTP status of `POST /api/sendCoin`.
    fn send_coin(
        &self,
        token: &str,
        to_user: &str,
        amount: i64,
    ) -> impl Future<Output = Result<u16, Error>> + Send;

    /// Returns the HTTP status of `GET /api/buy/{item}`.
    fn buy(&self, token: &str, item: &str) -> impl Future<Output = Result<u16, Error>> + Send;
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    token: Option<String>,
}

#[derive(Serialize)]
struct SendCoinRequest<'a> {
    #[serde(rename = "toUser")]
    to_user: &'a str,
    amount: i64,
}

/// reqwest-backed client for the target service.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &RunConfig) -> Result<Self, Error> {
        url::Url::parse(&config.base_url).map_err(|source| Error::InvalidBaseUrl {
            url: config.base_url.clone(),
            source,
        })?;
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl ShopApi for ApiClient {
    fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthReply, Error>> + Send {
        let req = self
            .http
            .post(self.endpoint("/api/auth"))
            .json(&AuthRequest { username, password });
        async move {
            let res = req.send().await?;
            let status = res.status().as_u16();
            // A malformed body or one without a token field is tolerated.
            let token = res
                .json::<AuthResponse>()
                .await
                .ok()
                .and_then(|body| body.token);
            Ok(AuthReply { status, token })
        }
    }

    fn info(&self, token: &str) -> impl Future<Output = Result<u16, Error>> + Send {
        let req = self.http.get(self.endpoint("/api/info")).bearer_auth(token);
        async move { Ok(req.send().await?.status().as_u16()) }
    }

    fn send_coin(
        &self,
        token: &str,
        to_user: &str,
        amount: i64,
    ) -> impl Future<Output = Result<u16, Error>> + Send {
        let req = self
            .http
            .post(self.endpoint("/api/sendCoin"))
            .bearer_auth(token)
            .json(&SendCoinRequest { to_user, amount });
        async move { Ok(req.send().await?.status().as_u16()) }
    }

    fn buy(&self, token: &str, item: &str) -> impl Future<Output = Result<u16, Error>> + Send {
        let req = self
            .http
            .get(self.endpoint(&format!("/api/buy/{item}")))
            .bearer_auth(token);
        async move { Ok(req.send().await?.status().as_u16()) }
    }
}
