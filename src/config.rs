use crate::error::AcademyError;
use crate::timer::checked_delay;
use serde::Deserialize;

/// Session settings handed over by the host page as JSON. Every field has
/// a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AcademyConfig {
    pub app_id: String,
    pub app_name: String,
    /// UPI handle that receives payments.
    pub payee: String,
    pub payee_name: String,
    pub currency: String,
    /// Delay before a manually reviewed payment closes.
    pub review_delay_ms: u32,
    /// Cap on terminal scrollback; `None` keeps everything.
    pub log_limit: Option<usize>,
    pub start_xp: u32,
    pub log_filter: String,
}

impl Default for AcademyConfig {
    fn default() -> Self {
        AcademyConfig {
            app_id: "app.lovable.c414da5d74ee4bfeaa7240febd25c5e6".into(),
            app_name: "ethical-hacker-quest-mobile".into(),
            payee: "7020645145@fam".into(),
            payee_name: "Kali Academy".into(),
            currency: "INR".into(),
            review_delay_ms: 3000,
            log_limit: None,
            start_xp: 250,
            log_filter: "info".into(),
        }
    }
}

impl AcademyConfig {
    pub fn from_json(json: &str) -> Result<Self, AcademyError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: AcademyConfig =
            serde_json::from_str(json).map_err(|e| AcademyError::Config(e.to_string()))?;
        if !cfg.payee.contains('@') {
            return Err(AcademyError::Config(format!(
                "payee '{}' is not a UPI handle",
                cfg.payee
            )));
        }
        if checked_delay(cfg.review_delay_ms).is_err() {
            return Err(AcademyError::Config(format!(
                "review_delay_ms {} is out of range",
                cfg.review_delay_ms
            )));
        }
        Ok(cfg)
    }
}
