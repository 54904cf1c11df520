use chrono::{Duration, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::error::{Error, Result};
use super::*;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Student {
  pub id: i32,
  pub school_id: i32,
  pub name: String,
  pub email: String,
  pub password_hash: String,
  pub verification_code: Option<String>,
  pub verified: bool,
  pub created_at: UtcDateTime,
}

#[derive(Debug, Clone)]
pub struct NewStudent {
  pub school_id: i32,
  pub name: String,
  pub email: String,
  pub password_hash: String,
  pub verification_code: String,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SessionToken {
  pub id: i32,
  pub student_id: i32,
  pub value: String,
  pub expires_on: UtcDateTime,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
  #[validate(length(min = 2))]
  pub name: String,
  #[validate(email)]
  pub email: String,
  #[validate(length(min = 8))]
  pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInForm {
  pub email: String,
  pub password: String,
}

impl SignUpForm {
  pub async fn save(&self, site: &Site) -> Result<Student> {
    self.validate()?;

    let school_id = site.settings.school_id;
    let existing = site.storage.students.by_email(school_id, &self.email).await?;
    if existing.is_some() {
      return Err(Error::UserAlreadyExists);
    }

    let code = gen_passphrase();
    let student = site
      .storage
      .students
      .create(NewStudent {
        school_id,
        name: self.name.clone(),
        email: self.email.clone(),
        password_hash: hash_credential(&site.settings.secret_key, &self.password),
        verification_code: code.clone(),
      })
      .await?;

    site.mailer.send_verification_code(&student, &code)?;

    Ok(student)
  }
}

impl Student {
  pub async fn find_by_id(site: &Site, id: i32) -> Result<Student> {
    site
      .storage
      .students
      .by_id(id)
      .await?
      .ok_or(Error::UserNotFound)
  }

  // The store clears the code in the same conditional update that flips the
  // verified flag, so a code can never be redeemed twice.
  pub async fn verify(site: &Site, code: &str) -> Result<Student> {
    site
      .storage
      .students
      .claim_verification(code)
      .await?
      .ok_or(Error::VerificationCodeInvalid)
  }

  pub async fn sign_in(site: &Site, form: &SignInForm) -> Result<SessionToken> {
    let hash = hash_credential(&site.settings.secret_key, &form.password);

    let student = site
      .storage
      .students
      .by_email(site.settings.school_id, &form.email)
      .await?
      .filter(|s| s.password_hash == hash)
      .ok_or(Error::UserNotFound)?;

    if !student.verified {
      return Err(Error::UserNotVerified);
    }

    site
      .storage
      .students
      .create_session(
        student.id,
        &gen_passphrase(),
        Utc::now() + Duration::hours(site.settings.session_hours),
      )
      .await
  }

  pub async fn can_access_module(&self, site: &Site, module_id: i32) -> Result<bool> {
    let module = match site.storage.catalog.module_by_id(module_id).await? {
      Some(module) if module.available => module,
      _ => return Err(Error::ModuleNotAvailable),
    };

    if module.free {
      return Ok(true);
    }

    let transactions = site.storage.transactions.for_student(self.id).await?;

    for transaction in transactions {
      if transaction.status != TransactionStatus::Succeeded {
        continue;
      }

      let offer = site.storage.offers.by_id(transaction.offer_id).await?;
      if let Some(offer) = offer {
        if offer.package_ids.contains(&module.package_id) {
          return Ok(true);
        }
      }
    }

    Ok(false)
  }

  pub async fn module_lessons(&self, site: &Site, module_id: i32) -> Result<Vec<Lesson>> {
    if !self.can_access_module(site, module_id).await? {
      return Err(Error::AccessDenied);
    }

    let module = Module::find(site, module_id).await?;
    module.lessons(site).await
  }
}
