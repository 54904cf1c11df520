use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use super::*;

#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[sqlx(type_name = "transaction_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
  Pending,
  Succeeded,
  Failed,
}

/// One purchase attempt. `reference` is the handle the payment provider echoes
/// back in its callbacks; it is unique across all schools.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
  pub id: i32,
  pub student_id: i32,
  pub offer_id: i32,
  pub promocode_id: Option<i32>,
  pub amount: Price,
  pub reference: String,
  pub status: TransactionStatus,
  pub created_at: UtcDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
  pub student_id: i32,
  pub offer_id: i32,
  pub promocode_id: Option<i32>,
  pub amount: Price,
  pub reference: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderForm {
  pub offer_id: i32,
  pub promo_code: Option<String>,
}

impl Transaction {
  // Creates the pending transaction and returns the amount to charge. Talking
  // to the provider with that amount is the caller's business, not ours.
  pub async fn create_order(site: &Site, student: &Student, form: &OrderForm) -> Result<Transaction> {
    let offer = Offer::find(site, form.offer_id).await?;

    let (amount, promocode_id) = match &form.promo_code {
      Some(code) => {
        let promo =
          Promocode::validate(site, student.school_id, code, &offer, Utc::now()).await?;
        (promo.apply(&offer.price), Some(promo.id))
      }
      None => (offer.price.clone(), None),
    };

    site
      .storage
      .transactions
      .create(NewTransaction {
        student_id: student.id,
        offer_id: offer.id,
        promocode_id,
        amount,
        reference: gen_passphrase(),
      })
      .await
  }

  async fn send_receipt(site: &Site, transaction: &Transaction) {
    let sent = async {
      let student = Student::find_by_id(site, transaction.student_id).await?;
      let offer = Offer::find(site, transaction.offer_id).await?;
      site.mailer.send_purchase_receipt(&student, &offer, &transaction.amount)
    }
    .await;

    if let Err(e) = sent {
      warn!("could not send receipt for {}: {}", transaction.reference, e);
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Callback {
  pub transaction_reference: String,
  pub status: String,
  pub amount: i64,
  pub currency: String,
}

impl Callback {
  // Providers deliver at least once and out of order, so every branch here
  // must stay safe under duplicates. The store's conditional transition is the
  // only write; everything after a lost race is a read.
  pub async fn process(&self, site: &Site) -> Result<()> {
    let target = match self.status.as_str() {
      "succeeded" => TransactionStatus::Succeeded,
      "failed" => TransactionStatus::Failed,
      _ => return Err(Error::UnknownCallbackType),
    };

    let outcome = site
      .storage
      .transactions
      .transition(&self.transaction_reference, target)
      .await?;

    match outcome {
      Transition::Applied(transaction) => {
        if target == TransactionStatus::Succeeded {
          Transaction::send_receipt(site, &transaction).await;
        }
        Ok(())
      }
      Transition::AlreadySucceeded if target == TransactionStatus::Succeeded => Ok(()),
      // A settled purchase cannot be revoked by a stray late failure.
      Transition::AlreadySucceeded => Err(Error::TransactionInvalid),
      Transition::AlreadyFailed => Ok(()),
      Transition::NotFound => Err(Error::TransactionInvalid),
    }
  }
}
