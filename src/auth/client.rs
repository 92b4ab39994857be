use anyhow::Result;
use reqwest::{Client, Response, StatusCode};

use super::models::*;

/// What the login endpoint decided. 206 is a partial success: the
/// credentials were fine but the account wants an emailed code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Accepted,
    Challenged { login_attempt_id: String },
    Rejected { error: Option<String> },
}

/// Outcome of every other form submission: any 2xx counts as accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    Rejected { error: Option<String> },
}

#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.post("/auth/login", &body).await?;

        match response.status() {
            StatusCode::OK => Ok(LoginOutcome::Accepted),
            StatusCode::PARTIAL_CONTENT => {
                let challenge: TwoFactorChallenge = response.json().await?;
                Ok(LoginOutcome::Challenged {
                    login_attempt_id: challenge.login_attempt_id,
                })
            }
            _ => Ok(LoginOutcome::Rejected {
                error: read_error(response).await?,
            }),
        }
    }

    pub async fn signup(&self, email: &str, password: &str, requires_2fa: bool) -> Result<SubmitOutcome> {
        let body = SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            requires_2fa,
        };
        self.submit("/auth/signup", &body).await
    }

    pub async fn verify_2fa(&self, email: &str, login_attempt_id: &str, code: &str) -> Result<SubmitOutcome> {
        let body = Verify2faRequest {
            email: email.to_string(),
            login_attempt_id: login_attempt_id.to_string(),
            code: code.to_string(),
        };
        self.submit("/auth/verify-2fa", &body).await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<SubmitOutcome> {
        let body = PasswordResetRequest {
            email: email.to_string(),
        };
        self.submit("/auth/initiate-password-reset", &body).await
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<SubmitOutcome> {
        let body = ResetPasswordRequest {
            token: token.to_string(),
            new_password: new_password.to_string(),
        };
        self.submit("/auth/reset-password", &body).await
    }

    async fn submit<B: serde::Serialize>(&self, endpoint: &str, body: &B) -> Result<SubmitOutcome> {
        let response = self.post(endpoint, body).await?;

        if response.status().is_success() {
            Ok(SubmitOutcome::Accepted)
        } else {
            Ok(SubmitOutcome::Rejected {
                error: read_error(response).await?,
            })
        }
    }

    async fn post<B: serde::Serialize>(&self, endpoint: &str, body: &B) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self.client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        Ok(response)
    }
}

// A rejection body without a usable `error` field yields None; a body
// that is not JSON at all is a failed round-trip and propagates.
async fn read_error(response: Response) -> Result<Option<String>> {
    let body: ErrorResponse = response.json().await?;
    Ok(body.error)
}
