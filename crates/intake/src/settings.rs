//! Tunables of the intake core.
//!
//! Every field carries a serde default so partial config files (or none at
//! all) deserialize into a complete `IntakeSettings`. File and environment
//! layering is done by the embedding binary.

use serde::{Deserialize, Serialize};

use crate::media::DEFAULT_MAX_MEDIA_BYTES;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeSettings {
    pub media: MediaSettings,
    pub eligibility: EligibilitySettings,
    pub submission: SubmissionSettings,
    pub payment: PaymentSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    /// Upper bound (inclusive) for a single upload, in bytes.
    pub max_bytes: u64,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_MEDIA_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilitySettings {
    pub min_age: i32,
    pub max_age: i32,
}

impl Default for EligibilitySettings {
    fn default() -> Self {
        Self {
            min_age: 18,
            max_age: 35,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionSettings {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000/api/submit-form".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Conversion entry for one payment country.
///
/// Countries are values rather than map keys; layered config sources
/// lowercase keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRate {
    pub country: String,
    pub currency: String,
    /// Local units per USD.
    pub rate: f64,
    pub symbol: String,
}

impl CurrencyRate {
    fn new(country: &str, currency: &str, rate: f64, symbol: &str) -> Self {
        Self {
            country: country.to_string(),
            currency: currency.to_string(),
            rate,
            symbol: symbol.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentSettings {
    /// Pre-filled fee in USD, kept as text like the form input it seeds.
    pub base_amount_usd: String,
    pub default_country: String,
    pub rates: Vec<CurrencyRate>,
}

impl PaymentSettings {
    /// Entry for `country`, ignoring case and surrounding whitespace.
    pub fn rate_for(&self, country: &str) -> Option<&CurrencyRate> {
        let country = country.trim();
        self.rates
            .iter()
            .find(|r| r.country.eq_ignore_ascii_case(country))
    }
}

impl Default for PaymentSettings {
    fn default() -> Self {
        // Illustrative rates; deployments override them in config.
        let rates = vec![
            CurrencyRate::new("Ghana", "GHS", 10.0, "₵"),
            CurrencyRate::new("Nigeria", "NGN", 1500.0, "₦"),
            CurrencyRate::new("Kenya", "KES", 130.0, "KSh"),
            CurrencyRate::new("South Africa", "ZAR", 18.0, "R"),
            CurrencyRate::new("Egypt", "EGP", 47.0, "E£"),
            CurrencyRate::new("Morocco", "MAD", 10.0, "DH"),
            CurrencyRate::new("Algeria", "DZD", 135.0, "DA"),
            CurrencyRate::new("Ethiopia", "ETB", 57.0, "Br"),
            CurrencyRate::new("Tanzania", "TZS", 2500.0, "TSh"),
            CurrencyRate::new("Uganda", "UGX", 3800.0, "USh"),
            CurrencyRate::new("Rwanda", "RWF", 1250.0, "RF"),
            CurrencyRate::new("Cameroon", "XAF", 600.0, "FCFA"),
            CurrencyRate::new("Senegal", "XOF", 600.0, "FCFA"),
            CurrencyRate::new("Ivory Coast", "XOF", 600.0, "FCFA"),
            CurrencyRate::new("Zambia", "ZMW", 25.0, "ZK"),
            CurrencyRate::new("Botswana", "BWP", 13.0, "P"),
            CurrencyRate::new("Mauritius", "MUR", 46.0, "Rs"),
        ];

        Self {
            base_amount_usd: "250".to_string(),
            default_country: "Ghana".to_string(),
            rates,
        }
    }
}
