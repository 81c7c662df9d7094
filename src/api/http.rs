//! See [`HttpApi`]

use super::{MonthQuery, ShiftApi, Token};
use crate::{
    config::Config,
    data::{
        AvailabilityRequest, ConfirmedShift, ShiftDraft, ShiftId, User, WeekdayPolicy, YearMonth,
    },
    error::{ApiError, Detail},
};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};

/// [`ShiftApi`] over the service's REST interface.
///
/// Every request carries the configured bearer token. A `401` from any
/// endpoint becomes [`ApiError::SessionInvalid`].
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base: String,
    token: Option<String>,
}

impl HttpApi {
    /// Client for the service at `config.api_url`.
    ///
    /// # Errors
    ///
    /// [`ApiError::Transport`] if the HTTP client cannot be set up.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ApiError::Transport)?;
        Ok(Self {
            client,
            base: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Replace the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Exchange a username and password for a bearer token.
    ///
    /// # Errors
    ///
    /// Wrong credentials come back as [`ApiError::Rejected`] with status 401,
    /// not as [`ApiError::SessionInvalid`].
    pub async fn login(&self, username: &str, password: &str) -> Result<Token, ApiError> {
        let builder = self
            .client
            .post(self.endpoint("/auth/login"))
            .form(&[("username", username), ("password", password)]);
        self.call(builder).await.map_err(bad_credentials)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.endpoint(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn listing(&self, path: &str, month: Option<YearMonth>) -> RequestBuilder {
        let builder = self.request(Method::GET, path);
        match month {
            Some(month) => builder.query(&MonthQuery::from(month)),
            None => builder,
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = builder.send().await.map_err(ApiError::Transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(ApiError::Transport)?;
        classify(status, &body)
    }

    async fn call<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let body = self.execute(builder).await?;
        serde_json::from_slice(&body).map_err(ApiError::Decode)
    }
}

/// The body of a successful response, or the error its status stands for.
///
/// A `401` from any endpoint means the session is gone.
fn classify(status: StatusCode, body: &[u8]) -> Result<Vec<u8>, ApiError> {
    if status == StatusCode::UNAUTHORIZED {
        Err(ApiError::SessionInvalid)
    } else if !status.is_success() {
        Err(rejection(status, body))
    } else {
        Ok(body.to_vec())
    }
}

/// At login a `401` means the credentials were wrong, not that a session expired.
fn bad_credentials(error: ApiError) -> ApiError {
    match error {
        ApiError::SessionInvalid => ApiError::rejected(401, "incorrect username or password"),
        other => other,
    }
}

/// Turn an error response into [`ApiError::Rejected`].
///
/// Bodies of the form `{"detail": ...}` keep their detail; anything else is
/// kept as plain text, or the status reason when empty.
fn rejection(status: StatusCode, body: &[u8]) -> ApiError {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Detail,
    }

    let detail = serde_json::from_slice::<ErrorBody>(body)
        .map(|ErrorBody { detail }| detail)
        .unwrap_or_else(|_| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            if text.is_empty() {
                Detail::from(status.canonical_reason().unwrap_or("error"))
            } else {
                Detail::Message(text)
            }
        });
    ApiError::Rejected {
        status: status.as_u16(),
        detail,
    }
}

impl ShiftApi for HttpApi {
    async fn users(&self) -> Result<Vec<User>, ApiError> {
        self.call(self.request(Method::GET, "/admin/users")).await
    }

    async fn shift_requests(
        &self,
        month: Option<YearMonth>,
    ) -> Result<Vec<AvailabilityRequest>, ApiError> {
        self.call(self.listing("/shift-requests/", month)).await
    }

    async fn confirmed_shifts(
        &self,
        month: Option<YearMonth>,
    ) -> Result<Vec<ConfirmedShift>, ApiError> {
        self.call(self.listing("/confirmed-shifts/", month)).await
    }

    async fn weekday_policy(&self) -> Result<WeekdayPolicy, ApiError> {
        self.call(self.request(Method::GET, "/admin/settings/dow")).await
    }

    async fn create_shift(&self, draft: &ShiftDraft) -> Result<ConfirmedShift, ApiError> {
        self.call(self.request(Method::POST, "/admin/confirmed-shifts").json(draft))
            .await
    }

    async fn update_shift(
        &self,
        id: ShiftId,
        draft: &ShiftDraft,
    ) -> Result<ConfirmedShift, ApiError> {
        let path = format!("/admin/confirmed-shifts/{}", id.0);
        self.call(self.request(Method::PUT, &path).json(draft)).await
    }

    async fn delete_shift(&self, id: ShiftId) -> Result<(), ApiError> {
        let path = format!("/admin/confirmed-shifts/{}", id.0);
        self.execute(self.request(Method::DELETE, &path)).await.map(drop)
    }

    async fn set_weekday_policy(&self, policy: WeekdayPolicy) -> Result<WeekdayPolicy, ApiError> {
        self.call(self.request(Method::PUT, "/admin/settings/dow").json(&policy))
            .await
    }
}
