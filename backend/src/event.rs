use std::fmt;

use chrono::{DateTime, NaiveDate};
use draw_core::Participant;
use serde::Deserialize;

const DEFAULT_CURRENCY: &str = "€";
const LONG_DATE: &str = "%A, %B %-d, %Y";

/// Body of `POST /api/email`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExchangeEvent {
    pub name: String,
    pub gift_price: GiftPrice,
    pub currency: Option<String>,
    pub date: String,
    pub participants: Vec<Member>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub email: String,
}

/// The form posts the budget as text, API clients as a number.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum GiftPrice {
    Amount(serde_json::Number),
    Text(String),
}

impl Default for GiftPrice {
    fn default() -> Self {
        GiftPrice::Text(String::new())
    }
}

impl fmt::Display for GiftPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GiftPrice::Amount(n) => write!(f, "{n}"),
            GiftPrice::Text(s) => f.write_str(s.trim()),
        }
    }
}

impl ExchangeEvent {
    /// Members in submission order, identified by their position.
    pub fn participants(&self) -> Vec<Participant> {
        self.participants
            .iter()
            .enumerate()
            .map(|(id, m)| Participant::new(id, m.name.trim(), m.email.trim()))
            .collect()
    }

    pub fn currency(&self) -> &str {
        self.currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
    }

    /// Long-form event date. Unrecognised input is shown as sent.
    pub fn formatted_date(&self) -> String {
        let raw = self.date.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return ts.date_naive().format(LONG_DATE).to_string();
        }
        if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return day.format(LONG_DATE).to_string();
        }
        raw.to_string()
    }

    pub fn budget(&self) -> String {
        format!("{}{}", self.gift_price, self.currency())
    }
}
