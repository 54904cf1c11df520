use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum Discount {
  Percentage(i64),
  Fixed(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Promocode {
  pub id: i32,
  pub school_id: i32,
  pub code: String,
  pub discount: Discount,
  pub expires_at: UtcDateTime,
  pub offer_ids: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct NewPromocode {
  pub school_id: i32,
  pub code: String,
  pub discount: Discount,
  pub expires_at: UtcDateTime,
  pub offer_ids: Vec<i32>,
}

impl Promocode {
  pub async fn validate(
    site: &Site,
    school_id: i32,
    code: &str,
    offer: &Offer,
    now: UtcDateTime,
  ) -> Result<Promocode> {
    let promo = site
      .storage
      .promocodes
      .by_code(school_id, code)
      .await?
      .ok_or(Error::PromoNotFound)?;

    if now >= promo.expires_at {
      return Err(Error::PromocodeExpired);
    }

    // A scoped code behaves as nonexistent for offers outside its scope.
    if !promo.offer_ids.is_empty() && !promo.offer_ids.contains(&offer.id) {
      return Err(Error::PromoNotFound);
    }

    Ok(promo)
  }

  pub fn apply(&self, price: &Price) -> Price {
    let cents = match self.discount {
      Discount::Percentage(percent) => price.cents * (100 - percent) / 100,
      Discount::Fixed(off) => price.cents - off,
    };

    Price {
      cents: cents.max(0),
      currency: price.currency.clone(),
    }
  }
}
