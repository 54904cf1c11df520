use sqlx::{postgres::PgRow, FromRow, PgPool, Row};

use crate::error::Result;
use super::super::*;

pub struct PgStorage {
  pub db: PgPool,
}

impl PgStorage {
  pub async fn connect(uri: &str) -> Result<PgStorage> {
    Ok(PgStorage { db: PgPool::connect(uri).await? })
  }
}

// Price and Discount span two columns each, so these rows are put back
// together by hand instead of deriving FromRow.

impl<'r> FromRow<'r, PgRow> for Offer {
  fn from_row(row: &'r PgRow) -> sqlx::Result<Offer> {
    Ok(Offer {
      id: row.try_get("id")?,
      school_id: row.try_get("school_id")?,
      name: row.try_get("name")?,
      description: row.try_get("description")?,
      benefits: row.try_get("benefits")?,
      price: Price {
        cents: row.try_get("price_cents")?,
        currency: row.try_get("price_currency")?,
      },
      package_ids: row.try_get("package_ids")?,
    })
  }
}

#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq)]
#[sqlx(type_name = "discount_type", rename_all = "lowercase")]
enum DiscountKind {
  Percentage,
  Fixed,
}

impl Discount {
  fn kind(&self) -> DiscountKind {
    match self {
      Discount::Percentage(_) => DiscountKind::Percentage,
      Discount::Fixed(_) => DiscountKind::Fixed,
    }
  }

  fn value(&self) -> i64 {
    match self {
      Discount::Percentage(value) | Discount::Fixed(value) => *value,
    }
  }
}

impl<'r> FromRow<'r, PgRow> for Promocode {
  fn from_row(row: &'r PgRow) -> sqlx::Result<Promocode> {
    let value: i64 = row.try_get("discount_value")?;
    let discount = match row.try_get::<DiscountKind, _>("discount_type")? {
      DiscountKind::Percentage => Discount::Percentage(value),
      DiscountKind::Fixed => Discount::Fixed(value),
    };

    Ok(Promocode {
      id: row.try_get("id")?,
      school_id: row.try_get("school_id")?,
      code: row.try_get("code")?,
      discount,
      expires_at: row.try_get("expires_at")?,
      offer_ids: row.try_get("offer_ids")?,
    })
  }
}

impl<'r> FromRow<'r, PgRow> for Transaction {
  fn from_row(row: &'r PgRow) -> sqlx::Result<Transaction> {
    Ok(Transaction {
      id: row.try_get("id")?,
      student_id: row.try_get("student_id")?,
      offer_id: row.try_get("offer_id")?,
      promocode_id: row.try_get("promocode_id")?,
      amount: Price {
        cents: row.try_get("amount_cents")?,
        currency: row.try_get("amount_currency")?,
      },
      reference: row.try_get("reference")?,
      status: row.try_get("status")?,
      created_at: row.try_get("created_at")?,
    })
  }
}

#[rocket::async_trait]
impl CatalogStore for PgStorage {
  async fn create_course(&self, school_id: i32, name: &str) -> Result<Course> {
    let course = sqlx::query_as::<_, Course>(
      "INSERT INTO courses (school_id, name) VALUES ($1, $2) RETURNING *",
    )
    .bind(school_id)
    .bind(name)
    .fetch_one(&self.db)
    .await?;
    Ok(course)
  }

  async fn create_package(&self, course_id: i32, name: &str) -> Result<Package> {
    let package = sqlx::query_as::<_, Package>(
      "INSERT INTO packages (course_id, name) VALUES ($1, $2) RETURNING *",
    )
    .bind(course_id)
    .bind(name)
    .fetch_one(&self.db)
    .await?;
    Ok(package)
  }

  async fn create_module(&self, new: NewModule) -> Result<Module> {
    let module = sqlx::query_as::<_, Module>(
      "INSERT INTO modules (package_id, name, position, available, free)
        VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(new.package_id)
    .bind(new.name)
    .bind(new.position)
    .bind(new.available)
    .bind(new.free)
    .fetch_one(&self.db)
    .await?;
    Ok(module)
  }

  async fn create_lesson(
    &self,
    module_id: i32,
    name: &str,
    position: i32,
    content: &str,
  ) -> Result<Lesson> {
    let lesson = sqlx::query_as::<_, Lesson>(
      "INSERT INTO lessons (module_id, name, position, content)
        VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(module_id)
    .bind(name)
    .bind(position)
    .bind(content)
    .fetch_one(&self.db)
    .await?;
    Ok(lesson)
  }

  async fn course_by_id(&self, id: i32) -> Result<Option<Course>> {
    let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.db)
      .await?;
    Ok(course)
  }

  async fn packages_by_course(&self, course_id: i32) -> Result<Vec<Package>> {
    let packages =
      sqlx::query_as::<_, Package>("SELECT * FROM packages WHERE course_id = $1 ORDER BY id")
        .bind(course_id)
        .fetch_all(&self.db)
        .await?;
    Ok(packages)
  }

  async fn module_by_id(&self, id: i32) -> Result<Option<Module>> {
    let module = sqlx::query_as::<_, Module>("SELECT * FROM modules WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.db)
      .await?;
    Ok(module)
  }

  async fn lessons_by_module(&self, module_id: i32) -> Result<Vec<Lesson>> {
    let lessons = sqlx::query_as::<_, Lesson>(
      "SELECT * FROM lessons WHERE module_id = $1 ORDER BY position",
    )
    .bind(module_id)
    .fetch_all(&self.db)
    .await?;
    Ok(lessons)
  }
}

#[rocket::async_trait]
impl OfferStore for PgStorage {
  async fn create(&self, new: NewOffer) -> Result<Offer> {
    let offer = sqlx::query_as::<_, Offer>(
      "INSERT INTO offers
        (school_id, name, description, benefits, price_cents, price_currency, package_ids)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *",
    )
    .bind(new.school_id)
    .bind(new.name)
    .bind(new.description)
    .bind(new.benefits)
    .bind(new.price.cents)
    .bind(new.price.currency)
    .bind(new.package_ids)
    .fetch_one(&self.db)
    .await?;
    Ok(offer)
  }

  async fn update(&self, update: OfferUpdate) -> Result<Option<Offer>> {
    let offer = sqlx::query_as::<_, Offer>(
      "UPDATE offers SET
        name = COALESCE($3, name),
        description = COALESCE($4, description),
        benefits = COALESCE($5, benefits),
        price_cents = COALESCE($6, price_cents),
        price_currency = COALESCE($7, price_currency),
        package_ids = COALESCE($8, package_ids)
        WHERE id = $1 AND school_id = $2
        RETURNING *",
    )
    .bind(update.id)
    .bind(update.school_id)
    .bind(update.name)
    .bind(update.description)
    .bind(update.benefits)
    .bind(update.price.as_ref().map(|p| p.cents))
    .bind(update.price.as_ref().map(|p| p.currency.clone()))
    .bind(update.packages)
    .fetch_optional(&self.db)
    .await?;
    Ok(offer)
  }

  async fn delete(&self, school_id: i32, id: i32) -> Result<bool> {
    let done = sqlx::query("DELETE FROM offers WHERE id = $2 AND school_id = $1")
      .bind(school_id)
      .bind(id)
      .execute(&self.db)
      .await?;
    Ok(done.rows_affected() > 0)
  }

  async fn by_id(&self, id: i32) -> Result<Option<Offer>> {
    let offer = sqlx::query_as::<_, Offer>("SELECT * FROM offers WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.db)
      .await?;
    Ok(offer)
  }

  async fn by_school(&self, school_id: i32) -> Result<Vec<Offer>> {
    let offers =
      sqlx::query_as::<_, Offer>("SELECT * FROM offers WHERE school_id = $1 ORDER BY id")
        .bind(school_id)
        .fetch_all(&self.db)
        .await?;
    Ok(offers)
  }

  async fn by_packages(&self, package_ids: &[i32]) -> Result<Vec<Offer>> {
    let offers =
      sqlx::query_as::<_, Offer>("SELECT * FROM offers WHERE package_ids && $1 ORDER BY id")
        .bind(package_ids.to_vec())
        .fetch_all(&self.db)
        .await?;
    Ok(offers)
  }
}

#[rocket::async_trait]
impl PromocodeStore for PgStorage {
  async fn create(&self, new: NewPromocode) -> Result<Promocode> {
    let promo = sqlx::query_as::<_, Promocode>(
      "INSERT INTO promocodes
        (school_id, code, discount_type, discount_value, expires_at, offer_ids)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *",
    )
    .bind(new.school_id)
    .bind(new.code)
    .bind(new.discount.kind())
    .bind(new.discount.value())
    .bind(new.expires_at)
    .bind(new.offer_ids)
    .fetch_one(&self.db)
    .await?;
    Ok(promo)
  }

  async fn by_code(&self, school_id: i32, code: &str) -> Result<Option<Promocode>> {
    let promo = sqlx::query_as::<_, Promocode>(
      "SELECT * FROM promocodes WHERE school_id = $1 AND code = $2",
    )
    .bind(school_id)
    .bind(code)
    .fetch_optional(&self.db)
    .await?;
    Ok(promo)
  }
}

#[rocket::async_trait]
impl StudentStore for PgStorage {
  async fn create(&self, new: NewStudent) -> Result<Student> {
    let student = sqlx::query_as::<_, Student>(
      "INSERT INTO students
        (school_id, name, email, password_hash, verification_code, verified, created_at)
        VALUES ($1, $2, $3, $4, $5, false, now())
        RETURNING *",
    )
    .bind(new.school_id)
    .bind(new.name)
    .bind(new.email)
    .bind(new.password_hash)
    .bind(new.verification_code)
    .fetch_one(&self.db)
    .await?;
    Ok(student)
  }

  async fn by_id(&self, id: i32) -> Result<Option<Student>> {
    let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.db)
      .await?;
    Ok(student)
  }

  async fn by_email(&self, school_id: i32, email: &str) -> Result<Option<Student>> {
    let student = sqlx::query_as::<_, Student>(
      "SELECT * FROM students WHERE school_id = $1 AND email = $2",
    )
    .bind(school_id)
    .bind(email)
    .fetch_optional(&self.db)
    .await?;
    Ok(student)
  }

  async fn claim_verification(&self, code: &str) -> Result<Option<Student>> {
    let student = sqlx::query_as::<_, Student>(
      "UPDATE students SET verified = true, verification_code = NULL
        WHERE verification_code = $1
        RETURNING *",
    )
    .bind(code)
    .fetch_optional(&self.db)
    .await?;
    Ok(student)
  }

  async fn create_session(
    &self,
    student_id: i32,
    value: &str,
    expires_on: UtcDateTime,
  ) -> Result<SessionToken> {
    let session = sqlx::query_as::<_, SessionToken>(
      "INSERT INTO session_tokens (student_id, value, expires_on)
        VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(student_id)
    .bind(value)
    .bind(expires_on)
    .fetch_one(&self.db)
    .await?;
    Ok(session)
  }

  async fn student_by_session(&self, value: &str, now: UtcDateTime) -> Result<Option<Student>> {
    let student = sqlx::query_as::<_, Student>(
      "SELECT students.* FROM students
        JOIN session_tokens ON session_tokens.student_id = students.id
        WHERE session_tokens.value = $1 AND session_tokens.expires_on > $2",
    )
    .bind(value)
    .bind(now)
    .fetch_optional(&self.db)
    .await?;
    Ok(student)
  }
}

#[rocket::async_trait]
impl TransactionStore for PgStorage {
  async fn create(&self, new: NewTransaction) -> Result<Transaction> {
    let transaction = sqlx::query_as::<_, Transaction>(
      "INSERT INTO transactions
        (student_id, offer_id, promocode_id, amount_cents, amount_currency, reference, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, 'pending', now())
        RETURNING *",
    )
    .bind(new.student_id)
    .bind(new.offer_id)
    .bind(new.promocode_id)
    .bind(new.amount.cents)
    .bind(new.amount.currency)
    .bind(new.reference)
    .fetch_one(&self.db)
    .await?;
    Ok(transaction)
  }

  async fn by_reference(&self, reference: &str) -> Result<Option<Transaction>> {
    let transaction =
      sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE reference = $1")
        .bind(reference)
        .fetch_optional(&self.db)
        .await?;
    Ok(transaction)
  }

  async fn for_student(&self, student_id: i32) -> Result<Vec<Transaction>> {
    let transactions = sqlx::query_as::<_, Transaction>(
      "SELECT * FROM transactions WHERE student_id = $1 ORDER BY id",
    )
    .bind(student_id)
    .fetch_all(&self.db)
    .await?;
    Ok(transactions)
  }

  async fn transition(&self, reference: &str, target: TransactionStatus) -> Result<Transition> {
    let updated = sqlx::query_as::<_, Transaction>(
      "UPDATE transactions SET status = $2
        WHERE reference = $1 AND status = 'pending'
        RETURNING *",
    )
    .bind(reference)
    .bind(target)
    .fetch_optional(&self.db)
    .await?;

    if let Some(transaction) = updated {
      return Ok(Transition::Applied(transaction));
    }

    match self.by_reference(reference).await? {
      Some(t) if t.status == TransactionStatus::Succeeded => Ok(Transition::AlreadySucceeded),
      Some(_) => Ok(Transition::AlreadyFailed),
      None => Ok(Transition::NotFound),
    }
  }
}
