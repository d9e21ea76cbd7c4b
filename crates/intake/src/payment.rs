//! Payment collaborator contract.
//!
//! Runs after an accepted submission. The core validates the payment form,
//! converts the USD fee into the gateway's minor units for the selected
//! country and reacts to the gateway's three terminal signals. The checkout
//! widget itself is external.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::notify::{Notice, Notifier};
use crate::sections::Track;
use crate::settings::{CurrencyRate, PaymentSettings};
use crate::validation::{is_email, FormError};

lazy_static! {
    static ref AMOUNT: Regex = Regex::new(r"^\d{0,9}\.?\d{0,2}$").expect("amount pattern");
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentForm {
    /// Fee in USD as typed, at most two decimals.
    #[serde(rename = "amountUSD")]
    pub amount_usd: String,
    pub country: String,
    #[serde(rename = "emailAddress")]
    pub email: String,
}

impl PaymentForm {
    /// Form pre-filled with the configured fee and country.
    pub fn prefilled(settings: &PaymentSettings) -> Self {
        Self {
            amount_usd: settings.base_amount_usd.clone(),
            country: settings.default_country.clone(),
            email: String::new(),
        }
    }

    pub fn validate(&self) -> Vec<FormError> {
        let mut errors = Vec::new();
        let amount = self.amount_usd.trim();
        if amount.is_empty() {
            errors.push(FormError::new("amountUSD", "Payment amount is required."));
        } else if parse_amount(amount).is_none() {
            errors.push(FormError::new(
                "amountUSD",
                "Please enter a valid amount greater than 0.",
            ));
        }

        if self.email.trim().is_empty() {
            errors.push(FormError::new(
                "emailAddress",
                "Email address is required for payment.",
            ));
        } else if !is_email(&self.email) {
            errors.push(FormError::new(
                "emailAddress",
                "Please enter a valid email format.",
            ));
        }
        errors
    }

    /// Build the gateway request, or return the form's violations.
    pub fn quote(&self, track: Track, settings: &PaymentSettings) -> Result<PaymentQuote, Vec<FormError>> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        let usd = parse_amount(self.amount_usd.trim()).ok_or_else(Vec::new)?;
        let rate = resolve_rate(settings, &self.country).ok_or_else(|| {
            vec![FormError::new("country", "No exchange rate is configured.")]
        })?;

        let amount_minor = to_minor_units(usd, rate.rate).ok_or_else(|| {
            vec![FormError::new("amountUSD", "The converted amount is out of range.")]
        })?;
        let quote = PaymentQuote {
            reference: Uuid::new_v4().simple().to_string(),
            email: self.email.trim().to_string(),
            amount_minor,
            currency: rate.currency.clone(),
            symbol: rate.symbol.clone(),
            metadata: vec![
                MetadataField::new("Application Type", "app_type", track.application_type()),
                MetadataField::new(
                    "Original Amount (USD)",
                    "original_amount_usd",
                    self.amount_usd.trim(),
                ),
                MetadataField::new("Selected Country", "selected_country", &rate.country),
                MetadataField::new("Processed Currency", "processed_currency", &rate.currency),
            ],
        };
        debug!(reference = %quote.reference, currency = %quote.currency, amount_minor, "payment quoted");
        Ok(quote)
    }
}

/// Positive amount with at most nine integer digits and two decimals.
fn parse_amount(raw: &str) -> Option<f64> {
    if !AMOUNT.is_match(raw) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

/// `usd * rate` in hundredths, or `None` when it does not fit a `u64`.
fn to_minor_units(usd: f64, rate: f64) -> Option<u64> {
    let minor = (usd * rate * 100.0).round();
    (minor.is_finite() && minor >= 0.0 && minor < u64::MAX as f64).then_some(minor as u64)
}

/// Rate for `country`, falling back to the default country, then to the
/// first configured entry. Country names match case-insensitively.
fn resolve_rate<'a>(settings: &'a PaymentSettings, country: &str) -> Option<&'a CurrencyRate> {
    settings
        .rate_for(country)
        .or_else(|| settings.rate_for(&settings.default_country))
        .or_else(|| settings.rates.first())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataField {
    pub display_name: String,
    pub variable_name: String,
    pub value: String,
}

impl MetadataField {
    fn new(display_name: &str, variable_name: &str, value: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            variable_name: variable_name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Everything the checkout widget is initialised with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentQuote {
    pub reference: String,
    pub email: String,
    /// Amount in the currency's smallest unit.
    pub amount_minor: u64,
    pub currency: String,
    pub symbol: String,
    pub metadata: Vec<MetadataField>,
}

impl PaymentQuote {
    /// Amount in major units, for display.
    pub fn display_amount(&self) -> String {
        format!("{}{:.2}", self.symbol, self.amount_minor as f64 / 100.0)
    }
}

/// Terminal signal from the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PaymentOutcome {
    Success { reference: String },
    Closed,
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStep {
    /// Proceed to the confirmation screen.
    Confirmed,
    /// Remain on the payment step.
    Stay,
}

pub fn on_outcome(outcome: &PaymentOutcome, notifier: &dyn Notifier) -> PaymentStep {
    match outcome {
        PaymentOutcome::Success { reference } => {
            info!(%reference, "payment completed");
            notifier.notify(Notice::success("Payment successful! Verifying transaction..."));
            notifier.notify(Notice::success(
                "Transaction verified! Your application is complete.",
            ));
            PaymentStep::Confirmed
        }
        PaymentOutcome::Closed => {
            notifier.notify(Notice::info("Payment cancelled or closed."));
            PaymentStep::Stay
        }
        PaymentOutcome::Failed { message } => {
            notifier.notify(Notice::error(format!("Payment failed: {message}")));
            PaymentStep::Stay
        }
    }
}
