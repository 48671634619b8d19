use chrono::NaiveDate;
use serde::Deserialize;

use crate::config::Config;
use crate::model::{Payment, Profile, Receipt, SchoolDetails, Session, WhatsAppSettings};
use crate::screens::Screens;
use crate::source::SchoolData;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything the daemon holds for the lifetime of one shell session.
pub struct AppState {
    pub config: Config,
    pub source: Box<dyn SchoolData>,
    pub session: Option<Session>,
    pub screens: Screens,
    /// Loaded on first use; `school.update` edits this copy.
    pub school: Option<SchoolDetails>,
    pub whatsapp: Option<WhatsAppSettings>,
    /// The signed-in user's profile; dropped on logout.
    pub profile: Option<Profile>,
    /// Recorded in order; receipt numbers follow this sequence.
    pub payments: Vec<Payment>,
    pub receipts: Vec<Receipt>,
}

impl AppState {
    pub fn new(config: Config, source: Box<dyn SchoolData>) -> Self {
        let screens = Screens::new(config.page_size);
        Self {
            config,
            source,
            session: None,
            screens,
            school: None,
            whatsapp: None,
            profile: None,
            payments: Vec::new(),
            receipts: Vec::new(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.config.today()
    }
}
