use anyhow::Result;

use super::client::{AuthClient, LoginOutcome, SubmitOutcome};

pub const PASSWORD_MISMATCH: &str = "Passwords do not match";

/// The five mutually exclusive screens of the flow. A single `panel`
/// field on `AuthFlow` is what guarantees exactly one is ever shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Login,
    TwoFactor,
    Signup,
    PasswordResetRequest,
    NewPassword,
}

impl Panel {
    pub const ALL: [Panel; 5] = [
        Panel::Login,
        Panel::TwoFactor,
        Panel::Signup,
        Panel::PasswordResetRequest,
        Panel::NewPassword,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Login => "Log In",
            Self::TwoFactor => "Two-Factor Verification",
            Self::Signup => "Create Account",
            Self::PasswordResetRequest => "Forgot Password",
            Self::NewPassword => "Choose a New Password",
        }
    }
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn clear(&mut self) {
        self.email.clear();
        self.password.clear();
    }
}

#[derive(Debug, Default)]
pub struct TwoFactorForm {
    pub email: String,
    pub login_attempt_id: String,
    pub code: String,
}

impl TwoFactorForm {
    pub fn clear(&mut self) {
        self.email.clear();
        self.login_attempt_id.clear();
        self.code.clear();
    }
}

#[derive(Debug, Default)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub requires_2fa: bool,
}

impl SignupForm {
    pub fn clear(&mut self) {
        self.email.clear();
        self.password.clear();
        self.requires_2fa = false;
    }
}

#[derive(Debug, Default)]
pub struct ResetRequestForm {
    pub email: String,
}

impl ResetRequestForm {
    pub fn clear(&mut self) {
        self.email.clear();
    }
}

#[derive(Debug, Default)]
pub struct NewPasswordForm {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl NewPasswordForm {
    pub fn clear(&mut self) {
        self.token.clear();
        self.new_password.clear();
        self.confirm_password.clear();
    }
}

/// Per-form inline error line. Absent or empty server messages hide
/// the banner instead of showing a generic one.
#[derive(Debug, Default)]
pub struct ErrorBanner {
    message: Option<String>,
}

impl ErrorBanner {
    pub fn set(&mut self, message: Option<String>) {
        self.message = message.filter(|m| !m.is_empty());
    }

    pub fn hide(&mut self) {
        self.message = None;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.message.is_some()
    }
}

/// The controller proper: current panel, per-form field state, per-form
/// error banners and the notice line. Submissions go through the owned
/// `AuthClient`; outcome application is kept in separate methods so the
/// transition logic can be driven without a server.
pub struct AuthFlow {
    client: AuthClient,
    panel: Panel,
    pub login: LoginForm,
    pub two_factor: TwoFactorForm,
    pub signup: SignupForm,
    pub reset_request: ResetRequestForm,
    pub new_password: NewPasswordForm,
    pub login_banner: ErrorBanner,
    pub two_factor_banner: ErrorBanner,
    pub signup_banner: ErrorBanner,
    pub reset_request_banner: ErrorBanner,
    pub new_password_banner: ErrorBanner,
    notice: Option<String>,
}

impl AuthFlow {
    pub fn new(client: AuthClient) -> Self {
        Self {
            client,
            panel: Panel::Login,
            login: LoginForm::default(),
            two_factor: TwoFactorForm::default(),
            signup: SignupForm::default(),
            reset_request: ResetRequestForm::default(),
            new_password: NewPasswordForm::default(),
            login_banner: ErrorBanner::default(),
            two_factor_banner: ErrorBanner::default(),
            signup_banner: ErrorBanner::default(),
            reset_request_banner: ErrorBanner::default(),
            new_password_banner: ErrorBanner::default(),
            notice: None,
        }
    }

    /// A reset token handed over at startup (the emailed link) lands in
    /// the new-password form and makes that panel the initial one.
    pub fn with_reset_token(mut self, token: &str) -> Self {
        self.new_password.token = token.to_string();
        self.panel = Panel::NewPassword;
        self
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn is_visible(&self, panel: Panel) -> bool {
        self.panel == panel
    }

    /// The single transition point. Idempotent.
    pub fn show_panel(&mut self, panel: Panel) {
        self.panel = panel;
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn active_banner(&self) -> &ErrorBanner {
        match self.panel {
            Panel::Login => &self.login_banner,
            Panel::TwoFactor => &self.two_factor_banner,
            Panel::Signup => &self.signup_banner,
            Panel::PasswordResetRequest => &self.reset_request_banner,
            Panel::NewPassword => &self.new_password_banner,
        }
    }

    pub async fn submit_login(&mut self) -> Result<()> {
        let email = self.login.email.clone();
        let outcome = self.client.login(&email, &self.login.password).await?;
        self.apply_login_outcome(&email, outcome);
        Ok(())
    }

    pub fn apply_login_outcome(&mut self, email: &str, outcome: LoginOutcome) {
        match outcome {
            LoginOutcome::Accepted => {
                self.login.clear();
                self.login_banner.hide();
                self.notice = Some("You have successfully logged in.".to_string());
            }
            LoginOutcome::Challenged { login_attempt_id } => {
                self.two_factor.email = email.to_string();
                self.two_factor.login_attempt_id = login_attempt_id;
                self.two_factor.code.clear();
                self.login.clear();
                self.login_banner.hide();
                self.show_panel(Panel::TwoFactor);
            }
            LoginOutcome::Rejected { error } => {
                // Fields stay as typed so the user can correct them.
                self.login_banner.set(error);
            }
        }
    }

    pub async fn submit_signup(&mut self) -> Result<()> {
        let outcome = self
            .client
            .signup(&self.signup.email, &self.signup.password, self.signup.requires_2fa)
            .await?;
        self.apply_signup_outcome(outcome);
        Ok(())
    }

    pub fn apply_signup_outcome(&mut self, outcome: SubmitOutcome) {
        match outcome {
            SubmitOutcome::Accepted => {
                self.signup.clear();
                self.signup_banner.hide();
                self.notice = Some("You have successfully created a user.".to_string());
                self.show_panel(Panel::Login);
            }
            SubmitOutcome::Rejected { error } => {
                self.signup_banner.set(error);
            }
        }
    }

    pub async fn submit_two_factor(&mut self) -> Result<()> {
        let outcome = self
            .client
            .verify_2fa(
                &self.two_factor.email,
                &self.two_factor.login_attempt_id,
                &self.two_factor.code,
            )
            .await?;
        self.apply_two_factor_outcome(outcome);
        Ok(())
    }

    pub fn apply_two_factor_outcome(&mut self, outcome: SubmitOutcome) {
        match outcome {
            SubmitOutcome::Accepted => {
                self.two_factor.clear();
                self.two_factor_banner.hide();
                self.notice = Some("You have successfully logged in.".to_string());
                self.show_panel(Panel::Login);
            }
            SubmitOutcome::Rejected { error } => {
                self.two_factor_banner.set(error);
            }
        }
    }

    pub async fn submit_reset_request(&mut self) -> Result<()> {
        let outcome = self
            .client
            .request_password_reset(&self.reset_request.email)
            .await?;
        self.apply_reset_request_outcome(outcome);
        Ok(())
    }

    pub fn apply_reset_request_outcome(&mut self, outcome: SubmitOutcome) {
        match outcome {
            SubmitOutcome::Accepted => {
                self.reset_request.clear();
                self.reset_request_banner.hide();
                // Worded so it never confirms whether the account exists.
                self.notice = Some(
                    "If an account exists for that email, a password reset link has been sent."
                        .to_string(),
                );
                self.show_panel(Panel::Login);
            }
            SubmitOutcome::Rejected { error } => {
                self.reset_request_banner.set(error);
            }
        }
    }

    pub async fn submit_new_password(&mut self) -> Result<()> {
        if !self.new_password_preflight() {
            return Ok(());
        }
        let outcome = self
            .client
            .reset_password(&self.new_password.token, &self.new_password.new_password)
            .await?;
        self.apply_new_password_outcome(outcome);
        Ok(())
    }

    /// The one client-side check in the whole flow: nothing goes on the
    /// wire unless both password entries agree.
    pub fn new_password_preflight(&mut self) -> bool {
        if self.new_password.new_password != self.new_password.confirm_password {
            self.new_password_banner.set(Some(PASSWORD_MISMATCH.to_string()));
            return false;
        }
        true
    }

    pub fn apply_new_password_outcome(&mut self, outcome: SubmitOutcome) {
        match outcome {
            SubmitOutcome::Accepted => {
                self.new_password.clear();
                self.new_password_banner.hide();
                self.notice = Some("Your password has been reset. Please log in.".to_string());
                self.show_panel(Panel::Login);
            }
            SubmitOutcome::Rejected { error } => {
                self.new_password_banner.set(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow() -> AuthFlow {
        // Never contacted: these tests drive apply_* directly.
        AuthFlow::new(AuthClient::new("http://127.0.0.1:9"))
    }

    #[test]
    fn starts_on_login_panel() {
        let f = flow();
        assert_eq!(f.panel(), Panel::Login);
    }

    #[test]
    fn show_panel_makes_exactly_one_visible() {
        for target in Panel::ALL {
            let mut f = flow();
            f.show_panel(target);
            for panel in Panel::ALL {
                assert_eq!(f.is_visible(panel), panel == target);
            }
        }
    }

    #[test]
    fn show_panel_is_idempotent() {
        let mut f = flow();
        f.show_panel(Panel::Signup);
        f.show_panel(Panel::Signup);
        assert_eq!(f.panel(), Panel::Signup);
    }

    #[test]
    fn reset_token_selects_new_password_panel() {
        let f = flow().with_reset_token("xyz");
        assert_eq!(f.panel(), Panel::NewPassword);
        assert_eq!(f.new_password.token, "xyz");
    }

    #[test]
    fn challenged_login_prefills_two_factor_form() {
        let mut f = flow();
        f.login.email = "a@b.com".to_string();
        f.login.password = "hunter2".to_string();

        f.apply_login_outcome(
            "a@b.com",
            LoginOutcome::Challenged {
                login_attempt_id: "abc123".to_string(),
            },
        );

        assert_eq!(f.two_factor.email, "a@b.com");
        assert_eq!(f.two_factor.login_attempt_id, "abc123");
        assert!(f.login.email.is_empty());
        assert!(f.login.password.is_empty());
        assert!(!f.login_banner.is_visible());
        assert_eq!(f.panel(), Panel::TwoFactor);
    }

    #[test]
    fn accepted_login_clears_fields_and_stays_put() {
        let mut f = flow();
        f.login.email = "a@b.com".to_string();
        f.login.password = "hunter2".to_string();

        f.apply_login_outcome("a@b.com", LoginOutcome::Accepted);

        assert!(f.login.email.is_empty());
        assert!(f.login.password.is_empty());
        assert_eq!(f.panel(), Panel::Login);
        assert!(f.notice().is_some());
    }

    #[test]
    fn rejected_login_shows_banner_and_keeps_fields() {
        let mut f = flow();
        f.login.email = "a@b.com".to_string();
        f.login.password = "hunter2".to_string();

        f.apply_login_outcome(
            "a@b.com",
            LoginOutcome::Rejected {
                error: Some("Invalid credentials".to_string()),
            },
        );

        assert_eq!(f.login_banner.message(), Some("Invalid credentials"));
        assert_eq!(f.login.email, "a@b.com");
        assert_eq!(f.login.password, "hunter2");
        assert_eq!(f.panel(), Panel::Login);
    }

    #[test]
    fn rejection_without_message_hides_banner() {
        let mut f = flow();
        f.login_banner.set(Some("stale".to_string()));

        f.apply_login_outcome("a@b.com", LoginOutcome::Rejected { error: None });

        assert!(!f.login_banner.is_visible());
    }

    #[test]
    fn rejection_with_empty_message_hides_banner() {
        let mut f = flow();
        f.login_banner.set(Some("stale".to_string()));

        f.apply_login_outcome(
            "a@b.com",
            LoginOutcome::Rejected {
                error: Some(String::new()),
            },
        );

        assert!(!f.login_banner.is_visible());
    }

    #[test]
    fn successful_signup_returns_to_login_and_clears_form() {
        let mut f = flow();
        f.show_panel(Panel::Signup);
        f.signup.email = "new@b.com".to_string();
        f.signup.password = "hunter2".to_string();
        f.signup.requires_2fa = true;

        f.apply_signup_outcome(SubmitOutcome::Accepted);

        assert_eq!(f.panel(), Panel::Login);
        assert!(f.signup.email.is_empty());
        assert!(f.signup.password.is_empty());
        assert!(!f.signup.requires_2fa);
        assert!(!f.signup_banner.is_visible());
        assert!(f.notice().is_some());
    }

    #[test]
    fn successful_two_factor_returns_to_login_and_clears_form() {
        let mut f = flow();
        f.show_panel(Panel::TwoFactor);
        f.two_factor.email = "a@b.com".to_string();
        f.two_factor.login_attempt_id = "abc123".to_string();
        f.two_factor.code = "654321".to_string();

        f.apply_two_factor_outcome(SubmitOutcome::Accepted);

        assert_eq!(f.panel(), Panel::Login);
        assert!(f.two_factor.email.is_empty());
        assert!(f.two_factor.login_attempt_id.is_empty());
        assert!(f.two_factor.code.is_empty());
    }

    #[test]
    fn successful_reset_request_returns_to_login() {
        let mut f = flow();
        f.show_panel(Panel::PasswordResetRequest);
        f.reset_request.email = "a@b.com".to_string();

        f.apply_reset_request_outcome(SubmitOutcome::Accepted);

        assert_eq!(f.panel(), Panel::Login);
        assert!(f.reset_request.email.is_empty());
        let notice = f.notice().unwrap();
        assert!(notice.contains("If an account exists"));
    }

    #[test]
    fn successful_new_password_returns_to_login_and_clears_form() {
        let mut f = flow().with_reset_token("xyz");
        f.new_password.new_password = "secret12".to_string();
        f.new_password.confirm_password = "secret12".to_string();

        f.apply_new_password_outcome(SubmitOutcome::Accepted);

        assert_eq!(f.panel(), Panel::Login);
        assert!(f.new_password.token.is_empty());
        assert!(f.new_password.new_password.is_empty());
        assert!(f.new_password.confirm_password.is_empty());
    }

    #[test]
    fn mismatched_passwords_fail_preflight_with_fixed_message() {
        let mut f = flow().with_reset_token("xyz");
        f.new_password.new_password = "x".to_string();
        f.new_password.confirm_password = "y".to_string();

        assert!(!f.new_password_preflight());
        assert_eq!(f.new_password_banner.message(), Some(PASSWORD_MISMATCH));
        // Fields are untouched so the user can fix the typo.
        assert_eq!(f.new_password.new_password, "x");
        assert_eq!(f.new_password.confirm_password, "y");
    }

    #[test]
    fn matching_passwords_pass_preflight() {
        let mut f = flow().with_reset_token("xyz");
        f.new_password.new_password = "secret12".to_string();
        f.new_password.confirm_password = "secret12".to_string();

        assert!(f.new_password_preflight());
        assert!(!f.new_password_banner.is_visible());
    }

    #[test]
    fn errors_stay_local_to_their_form() {
        let mut f = flow();
        f.login_banner.set(Some("Invalid credentials".to_string()));

        f.apply_signup_outcome(SubmitOutcome::Rejected {
            error: Some("User already exists".to_string()),
        });

        assert_eq!(f.login_banner.message(), Some("Invalid credentials"));
        assert_eq!(f.signup_banner.message(), Some("User already exists"));
    }

    #[test]
    fn active_banner_follows_the_panel() {
        let mut f = flow();
        f.signup_banner.set(Some("User already exists".to_string()));
        assert!(!f.active_banner().is_visible());

        f.show_panel(Panel::Signup);
        assert_eq!(f.active_banner().message(), Some("User already exists"));
    }
}
