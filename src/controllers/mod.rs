use rocket::{
  data::{self, Data, FromData, ToByteUnit},
  http::Status,
  request::{FromRequest, Outcome, Request},
  serde::json::Json,
  State,
};
use hmac::{Hmac, Mac, NewMac};
use sha2::Sha256;

use crate::error::{Error, Result};
use crate::models::*;

// Create alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

pub type JsonResult<T> = Result<Json<T>>;

pub mod students;
pub mod offers;
pub mod payments;

pub struct Session {
  pub student: Student,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Session {
  type Error = ();

  async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
    async fn build(req: &Request<'_>) -> Option<Session> {
      let site = req.rocket().state::<Site>()?;
      let header = req.headers().get_one("Authorization")?;
      let value = header.strip_prefix("Bearer ")?;
      let student = site
        .storage
        .students
        .student_by_session(value, chrono::Utc::now())
        .await
        .ok()??;
      Some(Session { student })
    }

    match build(req).await {
      Some(session) => Outcome::Success(session),
      None => Outcome::Error((Status::Unauthorized, ())),
    }
  }
}

pub struct AdminSession;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminSession {
  type Error = ();

  async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
    let site = match req.rocket().state::<Site>() {
      Some(site) => site,
      None => return Outcome::Error((Status::Unauthorized, ())),
    };

    let expected = format!("Bearer {}", site.settings.admin_key);
    match req.headers().get_one("Authorization") {
      Some(header) if header == expected => Outcome::Success(AdminSession),
      _ => Outcome::Error((Status::Unauthorized, ())),
    }
  }
}

pub struct PaymentWebhook {
  pub callback: Callback,
}

#[rocket::async_trait]
impl<'r> FromData<'r> for PaymentWebhook {
  type Error = Error;

  async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> data::Outcome<'r, Self> {
    use rocket::data::Outcome;

    let secret = req
      .rocket()
      .state::<Site>()
      .expect("SITE not configured")
      .settings
      .payments
      .webhooks_secret
      .clone();

    let maybe_signature = req
      .headers()
      .get_one("x-payment-signature")
      .and_then(|x| hex::decode(x).ok());

    match maybe_signature {
      None => return Outcome::Forward((data, Status::NotFound)),
      Some(sig) => {
        let bytes = match data.open(512000.bytes()).into_bytes().await {
          Ok(read) if read.is_complete() => read.into_inner(),
          Ok(_) => return Outcome::Error((Status::PayloadTooLarge, Error::validation("payload", "payload too large"))),
          Err(_) => return Outcome::Error((Status::BadRequest, Error::validation("body", "Bad request, can't read body."))),
        };

        let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
          Err(_) => return Outcome::Error((Status::BadRequest, Error::validation("body", "Unexpected error processing hmac"))),
          Ok(a) => a,
        };
        mac.update(&bytes);

        match mac.verify(&sig) {
          Err(_) => Outcome::Error((Status::BadRequest, Error::validation("bad sig", "invalid webhook signature"))),
          _ => {
            match serde_json::from_slice(&bytes) {
              Ok(callback) => Outcome::Success(PaymentWebhook { callback }),
              _ => Outcome::Error((Status::BadRequest, Error::UnknownCallbackType)),
            }
          }
        }
      }
    }
  }
}
