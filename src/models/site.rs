use std::sync::Arc;

use rocket::figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use super::*;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SiteSettings {
  pub secret_key: String,
  pub admin_key: String,
  pub school_id: i32,
  pub checkout_domain: String,
  pub session_hours: i64,
  pub database_uri: Option<String>,
  pub payments: PaymentSettings,
  pub sendinblue: Option<SendinblueSettings>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PaymentSettings {
  pub webhooks_secret: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SendinblueSettings {
  pub api_url: String,
  pub api_key: String,
  pub sender_name: String,
  pub sender_email: String,
}

impl Default for SiteSettings {
  fn default() -> SiteSettings {
    SiteSettings {
      secret_key: "0123456789ABCDEF0123456789ABCDEF".to_string(),
      admin_key: "dev-admin-key".to_string(),
      school_id: 1,
      checkout_domain: "http://localhost:8000".to_string(),
      session_hours: 72,
      database_uri: std::env::var("DATABASE_URI").ok(),
      payments: PaymentSettings {
        webhooks_secret: "dev-payments-secret".to_string(),
      },
      sendinblue: None,
    }
  }
}

impl SiteSettings {
  pub fn from_figment(figment: &Figment) -> Result<SiteSettings> {
    Ok(figment.extract_inner("site")?)
  }

  pub async fn into_site(self) -> Result<Site> {
    let storage = match &self.database_uri {
      Some(uri) => Storage::postgres(uri).await?,
      None => Storage::memory(),
    };

    let mailer: Arc<dyn Mailer> = match &self.sendinblue {
      Some(settings) => Arc::new(Sendinblue::new(settings.clone())),
      None => Arc::new(LogMailer),
    };

    Ok(Site { settings: self, storage, mailer })
  }
}

#[derive(Clone)]
pub struct Site {
  pub settings: SiteSettings,
  pub storage: Storage,
  pub mailer: Arc<dyn Mailer>,
}
