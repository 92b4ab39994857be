use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::flow::{AuthFlow, Panel};

/// Terminal front end for the flow: field focus, text entry and the
/// per-panel rendering. All transition decisions live in `AuthFlow`.
pub struct AuthTui {
    pub flow: AuthFlow,
    current_field: usize,
    show_password: bool,
}

impl AuthTui {
    pub fn new(flow: AuthFlow) -> Self {
        Self {
            flow,
            current_field: 0,
            show_password: false,
        }
    }

    pub async fn handle_input(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        // A notice is the blocking kind of message: any key dismisses it
        // and nothing else happens until it is gone.
        if self.flow.notice().is_some() {
            self.flow.dismiss_notice();
            return Ok(());
        }

        match key.code {
            KeyCode::Tab => self.next_field(),
            KeyCode::BackTab => self.previous_field(),
            KeyCode::Enter => return self.submit_active().await,
            KeyCode::Esc => self.back_to_login(),
            KeyCode::F(1) => self.show_password = !self.show_password,
            KeyCode::F(2) => {
                if self.flow.panel() == Panel::Login {
                    self.switch_panel(Panel::Signup);
                }
            }
            KeyCode::F(3) => {
                if self.flow.panel() == Panel::Login {
                    self.switch_panel(Panel::PasswordResetRequest);
                }
            }
            KeyCode::Char(c) => self.handle_char_input(c),
            KeyCode::Backspace => {
                if let Some(input) = self.active_input() {
                    input.pop();
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn handle_char_input(&mut self, c: char) {
        // The signup 2FA checkbox toggles with Space.
        if self.flow.panel() == Panel::Signup && self.current_field == 2 {
            if c == ' ' {
                self.flow.signup.requires_2fa = !self.flow.signup.requires_2fa;
            }
            return;
        }

        // The emailed code is six digits.
        if self.flow.panel() == Panel::TwoFactor {
            if c.is_ascii_digit() && self.flow.two_factor.code.len() < 6 {
                self.flow.two_factor.code.push(c);
            }
            return;
        }

        if let Some(input) = self.active_input() {
            input.push(c);
        }
    }

    async fn submit_active(&mut self) -> Result<()> {
        let before = self.flow.panel();

        let result = match before {
            Panel::Login => self.flow.submit_login().await,
            Panel::TwoFactor => self.flow.submit_two_factor().await,
            Panel::Signup => self.flow.submit_signup().await,
            Panel::PasswordResetRequest => self.flow.submit_reset_request().await,
            Panel::NewPassword => self.flow.submit_new_password().await,
        };

        // A failed round-trip leaves the form exactly as it was.
        if let Err(err) = result {
            log::warn!("submission failed: {err:#}");
            return Ok(());
        }

        if self.flow.panel() != before {
            self.current_field = 0;
        }
        Ok(())
    }

    /// The "back to login" links exist on the 2FA, signup and
    /// forgot-password panels only.
    fn back_to_login(&mut self) {
        if matches!(
            self.flow.panel(),
            Panel::TwoFactor | Panel::Signup | Panel::PasswordResetRequest
        ) {
            self.switch_panel(Panel::Login);
        }
    }

    fn switch_panel(&mut self, panel: Panel) {
        self.flow.show_panel(panel);
        self.current_field = 0;
    }

    fn active_input(&mut self) -> Option<&mut String> {
        let flow = &mut self.flow;
        match (flow.panel(), self.current_field) {
            (Panel::Login, 0) => Some(&mut flow.login.email),
            (Panel::Login, 1) => Some(&mut flow.login.password),
            (Panel::TwoFactor, 0) => Some(&mut flow.two_factor.code),
            (Panel::Signup, 0) => Some(&mut flow.signup.email),
            (Panel::Signup, 1) => Some(&mut flow.signup.password),
            (Panel::PasswordResetRequest, 0) => Some(&mut flow.reset_request.email),
            (Panel::NewPassword, 0) => Some(&mut flow.new_password.new_password),
            (Panel::NewPassword, 1) => Some(&mut flow.new_password.confirm_password),
            _ => None,
        }
    }

    fn field_count(&self) -> usize {
        match self.flow.panel() {
            Panel::Login => 2,
            Panel::TwoFactor => 1,
            Panel::Signup => 3,
            Panel::PasswordResetRequest => 1,
            Panel::NewPassword => 2,
        }
    }

    fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % self.field_count();
    }

    fn previous_field(&mut self) {
        let max_fields = self.field_count();
        if self.current_field == 0 {
            self.current_field = max_fields - 1;
        } else {
            self.current_field -= 1;
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Header
                Constraint::Min(10),    // Content
                Constraint::Length(3),  // Footer
            ])
            .split(area);

        self.render_header(frame, chunks[0]);

        match self.flow.panel() {
            Panel::Login => self.render_login(frame, chunks[1]),
            Panel::TwoFactor => self.render_two_factor(frame, chunks[1]),
            Panel::Signup => self.render_signup(frame, chunks[1]),
            Panel::PasswordResetRequest => self.render_reset_request(frame, chunks[1]),
            Panel::NewPassword => self.render_new_password(frame, chunks[1]),
        }

        self.render_footer(frame, chunks[2]);

        if self.flow.notice().is_some() {
            self.render_notice_overlay(frame, area);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let title = format!("🔐 Authgate - {}", self.flow.panel().title());
        let header = Paragraph::new(title)
            .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .style(Style::default().fg(Color::Green)),
            );

        frame.render_widget(header, area);
    }

    fn render_login(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([
                Constraint::Length(3),  // Instructions
                Constraint::Length(3),  // Email
                Constraint::Length(3),  // Password
                Constraint::Min(2),     // Help
            ])
            .split(area);

        let instructions = Paragraph::new("Log in with your email and password")
            .style(Style::default().fg(Color::Cyan))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(instructions, chunks[0]);

        self.render_input(frame, chunks[1], "Email", &self.flow.login.email, 0, false);
        self.render_input(frame, chunks[2], "Password", &self.flow.login.password, 1, true);

        let help_text = vec![
            key_hint_line("Enter", "Log in"),
            key_hint_line("F2", "Create an account"),
            key_hint_line("F3", "Forgot password"),
            key_hint_line("F1", "Toggle password visibility"),
        ];
        self.render_help(frame, chunks[3], help_text);
    }

    fn render_two_factor(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([
                Constraint::Length(3),  // Instructions
                Constraint::Length(3),  // Code
                Constraint::Min(2),     // Help
            ])
            .split(area);

        let instructions = Paragraph::new(format!(
            "Enter the verification code emailed to {}",
            self.flow.two_factor.email
        ))
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(instructions, chunks[0]);

        // Underscore placeholders for the six digits.
        let code = &self.flow.two_factor.code;
        let code_display = (0..6)
            .map(|i| code.chars().nth(i).map_or("_".to_string(), |c| c.to_string()))
            .collect::<Vec<String>>()
            .join(" ");

        let code_input = Paragraph::new(code_display)
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Verification Code")
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Yellow)),
            );
        frame.render_widget(code_input, chunks[1]);

        let help_text = vec![
            key_hint_line("Enter", "Verify"),
            key_hint_line("Esc", "Back to login"),
        ];
        self.render_help(frame, chunks[2], help_text);
    }

    fn render_signup(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([
                Constraint::Length(3),  // Instructions
                Constraint::Length(3),  // Email
                Constraint::Length(3),  // Password
                Constraint::Length(3),  // 2FA checkbox
                Constraint::Min(2),     // Help
            ])
            .split(area);

        let instructions = Paragraph::new("Create a new account")
            .style(Style::default().fg(Color::Cyan))
            .alignment(Alignment::Center);
        frame.render_widget(instructions, chunks[0]);

        self.render_input(frame, chunks[1], "Email", &self.flow.signup.email, 0, false);
        self.render_input(frame, chunks[2], "Password", &self.flow.signup.password, 1, true);

        let checkbox = format!(
            "[{}] Require an emailed code at every login",
            if self.flow.signup.requires_2fa { "x" } else { " " }
        );
        self.render_input(frame, chunks[3], "Two-Factor", &checkbox, 2, false);

        let help_text = vec![
            key_hint_line("Enter", "Sign up"),
            key_hint_line("Space", "Toggle two-factor"),
            key_hint_line("Esc", "Back to login"),
        ];
        self.render_help(frame, chunks[4], help_text);
    }

    fn render_reset_request(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([
                Constraint::Length(3),  // Instructions
                Constraint::Length(3),  // Email
                Constraint::Min(2),     // Help
            ])
            .split(area);

        let instructions = Paragraph::new("Enter your email to receive a password reset link")
            .style(Style::default().fg(Color::Cyan))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(instructions, chunks[0]);

        self.render_input(frame, chunks[1], "Email", &self.flow.reset_request.email, 0, false);

        let help_text = vec![
            key_hint_line("Enter", "Send reset link"),
            key_hint_line("Esc", "Back to login"),
        ];
        self.render_help(frame, chunks[2], help_text);
    }

    fn render_new_password(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([
                Constraint::Length(3),  // Instructions
                Constraint::Length(3),  // New password
                Constraint::Length(3),  // Confirm password
                Constraint::Min(2),     // Help
            ])
            .split(area);

        let instructions = Paragraph::new("Choose a new password for your account")
            .style(Style::default().fg(Color::Cyan))
            .alignment(Alignment::Center);
        frame.render_widget(instructions, chunks[0]);

        self.render_input(
            frame,
            chunks[1],
            "New Password",
            &self.flow.new_password.new_password,
            0,
            true,
        );
        self.render_input(
            frame,
            chunks[2],
            "Confirm Password",
            &self.flow.new_password.confirm_password,
            1,
            true,
        );

        let help_text = vec![
            key_hint_line("Enter", "Reset password"),
            key_hint_line("F1", "Toggle password visibility"),
        ];
        self.render_help(frame, chunks[3], help_text);
    }

    fn render_input(
        &self,
        frame: &mut Frame,
        area: Rect,
        label: &str,
        value: &str,
        field: usize,
        secret: bool,
    ) {
        let is_active = self.current_field == field;
        let display_value = if secret && !self.show_password {
            "*".repeat(value.len())
        } else {
            value.to_string()
        };

        let input = Paragraph::new(display_value)
            .style(if is_active {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(label.to_string())
                    .border_type(BorderType::Rounded)
                    .border_style(if is_active {
                        Style::default().fg(Color::Yellow)
                    } else {
                        Style::default().fg(Color::Gray)
                    }),
            );
        frame.render_widget(input, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
        let help = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Blue)),
        );
        frame.render_widget(help, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let footer_text = vec![
            Span::styled("Tab", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::styled("/", Style::default().fg(Color::Gray)),
            Span::styled("Shift+Tab", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::styled(" Navigate  ", Style::default().fg(Color::Gray)),
            Span::styled("Enter", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::styled(" Submit  ", Style::default().fg(Color::Gray)),
            Span::styled("Ctrl+C", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::styled(" Quit", Style::default().fg(Color::Gray)),
        ];

        let footer = Paragraph::new(Line::from(footer_text))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Blue)),
            );

        frame.render_widget(footer, area);

        // The active panel's error banner overlays the footer line.
        if let Some(error) = self.flow.active_banner().message() {
            let error_area = Rect {
                x: area.x + 2,
                y: area.y + 1,
                width: area.width.saturating_sub(4),
                height: 1,
            };

            let error_msg = Paragraph::new(format!("❌ Error: {}", error))
                .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
                .alignment(Alignment::Center);
            frame.render_widget(error_msg, error_area);
        }
    }

    fn render_notice_overlay(&self, frame: &mut Frame, area: Rect) {
        let popup_area = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Length(5),
                Constraint::Percentage(40),
            ])
            .split(area)[1];

        let popup_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(20),
                Constraint::Percentage(60),
                Constraint::Percentage(20),
            ])
            .split(popup_area)[1];

        frame.render_widget(Clear, popup_area);

        let notice = Paragraph::new(self.flow.notice().unwrap_or_default())
            .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Notice (press any key)")
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Green)),
            );
        frame.render_widget(notice, popup_area);
    }
}

fn key_hint_line(key: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(key, Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::styled(format!(" - {}", action), Style::default().fg(Color::Gray)),
    ])
}
