use log::info;
use serde_json::json;

use crate::error::Result;
use crate::TEMPLATES;
use super::*;

pub trait Mailer: Send + Sync {
  fn send_verification_code(&self, student: &Student, code: &str) -> Result<()>;
  fn send_purchase_receipt(&self, student: &Student, offer: &Offer, amount: &Price) -> Result<()>;
}

pub struct Sendinblue {
  settings: SendinblueSettings,
}

impl Sendinblue {
  pub fn new(settings: SendinblueSettings) -> Sendinblue {
    Sendinblue { settings }
  }

  fn send(
    &self,
    student: &Student,
    subject: &str,
    template: &str,
    context: &tera::Context,
  ) -> Result<()> {
    let html = TEMPLATES.render(template, context)?;

    ureq::post(&format!("{}/v3/smtp/email", self.settings.api_url))
      .set("api-key", &self.settings.api_key)
      .send_json(json!({
        "sender": {
          "name": &self.settings.sender_name,
          "email": &self.settings.sender_email,
        },
        "to": [{
          "email": &student.email,
          "name": &student.name,
        }],
        "subject": subject,
        "htmlContent": html
      }))?;

    Ok(())
  }
}

impl Mailer for Sendinblue {
  fn send_verification_code(&self, student: &Student, code: &str) -> Result<()> {
    let mut context = tera::Context::new();
    context.insert("name", &student.name);
    context.insert("code", code);
    self.send(student, "Verify your email", "emails/verification", &context)
  }

  fn send_purchase_receipt(&self, student: &Student, offer: &Offer, amount: &Price) -> Result<()> {
    let mut context = tera::Context::new();
    context.insert("name", &student.name);
    context.insert("offer_name", &offer.name);
    context.insert(
      "amount",
      &format!("{}.{:02} {}", amount.cents / 100, amount.cents % 100, amount.currency),
    );
    self.send(student, "Your purchase is ready", "emails/receipt", &context)
  }
}

// Deployments without a configured provider (local dev, CI) log instead.
pub struct LogMailer;

impl Mailer for LogMailer {
  fn send_verification_code(&self, student: &Student, code: &str) -> Result<()> {
    info!("verification code for {}: {}", student.email, code);
    Ok(())
  }

  fn send_purchase_receipt(&self, student: &Student, offer: &Offer, _amount: &Price) -> Result<()> {
    info!("purchase receipt for {}: {}", student.email, offer.name);
    Ok(())
  }
}
