pub mod client;
pub mod flow;
pub mod models;
pub mod tui;

pub use client::{AuthClient, LoginOutcome, SubmitOutcome};
pub use flow::{AuthFlow, ErrorBanner, Panel, PASSWORD_MISMATCH};
pub use models::*;
pub use tui::AuthTui;
