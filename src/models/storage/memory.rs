use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::error::{Error, Result};
use super::super::*;

/// Backend for deployments without a database_uri: local development and the
/// test suite. Same contracts as the Postgres backend, one process only.
#[derive(Default)]
pub struct MemoryStorage {
  tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
  last_id: i32,
  courses: Vec<Course>,
  packages: Vec<Package>,
  modules: Vec<Module>,
  lessons: Vec<Lesson>,
  offers: Vec<Offer>,
  promocodes: Vec<Promocode>,
  students: Vec<Student>,
  sessions: Vec<SessionToken>,
  transactions: Vec<Transaction>,
}

impl Tables {
  fn next_id(&mut self) -> i32 {
    self.last_id += 1;
    self.last_id
  }
}

impl MemoryStorage {
  pub fn new() -> MemoryStorage {
    MemoryStorage::default()
  }

  fn read(&self) -> RwLockReadGuard<Tables> {
    self.tables.read().expect("storage lock poisoned")
  }

  fn write(&self) -> RwLockWriteGuard<Tables> {
    self.tables.write().expect("storage lock poisoned")
  }
}

#[rocket::async_trait]
impl CatalogStore for MemoryStorage {
  async fn create_course(&self, school_id: i32, name: &str) -> Result<Course> {
    let mut tables = self.write();
    let course = Course { id: tables.next_id(), school_id, name: name.to_string() };
    tables.courses.push(course.clone());
    Ok(course)
  }

  async fn create_package(&self, course_id: i32, name: &str) -> Result<Package> {
    let mut tables = self.write();
    let package = Package { id: tables.next_id(), course_id, name: name.to_string() };
    tables.packages.push(package.clone());
    Ok(package)
  }

  async fn create_module(&self, new: NewModule) -> Result<Module> {
    let mut tables = self.write();
    let module = Module {
      id: tables.next_id(),
      package_id: new.package_id,
      name: new.name,
      position: new.position,
      available: new.available,
      free: new.free,
    };
    tables.modules.push(module.clone());
    Ok(module)
  }

  async fn create_lesson(
    &self,
    module_id: i32,
    name: &str,
    position: i32,
    content: &str,
  ) -> Result<Lesson> {
    let mut tables = self.write();
    let lesson = Lesson {
      id: tables.next_id(),
      module_id,
      name: name.to_string(),
      position,
      content: content.to_string(),
    };
    tables.lessons.push(lesson.clone());
    Ok(lesson)
  }

  async fn course_by_id(&self, id: i32) -> Result<Option<Course>> {
    Ok(self.read().courses.iter().find(|c| c.id == id).cloned())
  }

  async fn packages_by_course(&self, course_id: i32) -> Result<Vec<Package>> {
    Ok(
      self
        .read()
        .packages
        .iter()
        .filter(|p| p.course_id == course_id)
        .cloned()
        .collect(),
    )
  }

  async fn module_by_id(&self, id: i32) -> Result<Option<Module>> {
    Ok(self.read().modules.iter().find(|m| m.id == id).cloned())
  }

  async fn lessons_by_module(&self, module_id: i32) -> Result<Vec<Lesson>> {
    let mut lessons: Vec<Lesson> = self
      .read()
      .lessons
      .iter()
      .filter(|l| l.module_id == module_id)
      .cloned()
      .collect();
    lessons.sort_by_key(|l| l.position);
    Ok(lessons)
  }
}

#[rocket::async_trait]
impl OfferStore for MemoryStorage {
  async fn create(&self, new: NewOffer) -> Result<Offer> {
    let mut tables = self.write();
    let offer = Offer {
      id: tables.next_id(),
      school_id: new.school_id,
      name: new.name,
      description: new.description,
      benefits: new.benefits,
      price: new.price,
      package_ids: new.package_ids,
    };
    tables.offers.push(offer.clone());
    Ok(offer)
  }

  async fn update(&self, update: OfferUpdate) -> Result<Option<Offer>> {
    let mut tables = self.write();
    let offer = tables
      .offers
      .iter_mut()
      .find(|o| o.id == update.id && o.school_id == update.school_id);

    Ok(offer.map(|offer| {
      if let Some(name) = update.name {
        offer.name = name;
      }
      if let Some(description) = update.description {
        offer.description = description;
      }
      if let Some(benefits) = update.benefits {
        offer.benefits = benefits;
      }
      if let Some(price) = update.price {
        offer.price = price;
      }
      if let Some(packages) = update.packages {
        offer.package_ids = packages;
      }
      offer.clone()
    }))
  }

  async fn delete(&self, school_id: i32, id: i32) -> Result<bool> {
    let mut tables = self.write();
    let before = tables.offers.len();
    tables
      .offers
      .retain(|o| !(o.id == id && o.school_id == school_id));
    Ok(tables.offers.len() < before)
  }

  async fn by_id(&self, id: i32) -> Result<Option<Offer>> {
    Ok(self.read().offers.iter().find(|o| o.id == id).cloned())
  }

  async fn by_school(&self, school_id: i32) -> Result<Vec<Offer>> {
    Ok(
      self
        .read()
        .offers
        .iter()
        .filter(|o| o.school_id == school_id)
        .cloned()
        .collect(),
    )
  }

  async fn by_packages(&self, package_ids: &[i32]) -> Result<Vec<Offer>> {
    Ok(
      self
        .read()
        .offers
        .iter()
        .filter(|o| o.package_ids.iter().any(|id| package_ids.contains(id)))
        .cloned()
        .collect(),
    )
  }
}

#[rocket::async_trait]
impl PromocodeStore for MemoryStorage {
  async fn create(&self, new: NewPromocode) -> Result<Promocode> {
    let mut tables = self.write();

    if tables
      .promocodes
      .iter()
      .any(|p| p.school_id == new.school_id && p.code == new.code)
    {
      return Err(Error::validation("uniqueness", "code already exists"));
    }

    let promo = Promocode {
      id: tables.next_id(),
      school_id: new.school_id,
      code: new.code,
      discount: new.discount,
      expires_at: new.expires_at,
      offer_ids: new.offer_ids,
    };
    tables.promocodes.push(promo.clone());
    Ok(promo)
  }

  async fn by_code(&self, school_id: i32, code: &str) -> Result<Option<Promocode>> {
    Ok(
      self
        .read()
        .promocodes
        .iter()
        .find(|p| p.school_id == school_id && p.code == code)
        .cloned(),
    )
  }
}

#[rocket::async_trait]
impl StudentStore for MemoryStorage {
  async fn create(&self, new: NewStudent) -> Result<Student> {
    let mut tables = self.write();

    if tables
      .students
      .iter()
      .any(|s| s.school_id == new.school_id && s.email == new.email)
    {
      return Err(Error::validation("uniqueness", "email already exists"));
    }

    let student = Student {
      id: tables.next_id(),
      school_id: new.school_id,
      name: new.name,
      email: new.email,
      password_hash: new.password_hash,
      verification_code: Some(new.verification_code),
      verified: false,
      created_at: Utc::now(),
    };
    tables.students.push(student.clone());
    Ok(student)
  }

  async fn by_id(&self, id: i32) -> Result<Option<Student>> {
    Ok(self.read().students.iter().find(|s| s.id == id).cloned())
  }

  async fn by_email(&self, school_id: i32, email: &str) -> Result<Option<Student>> {
    Ok(
      self
        .read()
        .students
        .iter()
        .find(|s| s.school_id == school_id && s.email == email)
        .cloned(),
    )
  }

  async fn claim_verification(&self, code: &str) -> Result<Option<Student>> {
    let mut tables = self.write();
    let student = tables
      .students
      .iter_mut()
      .find(|s| s.verification_code.as_deref() == Some(code));

    Ok(student.map(|student| {
      student.verified = true;
      student.verification_code = None;
      student.clone()
    }))
  }

  async fn create_session(
    &self,
    student_id: i32,
    value: &str,
    expires_on: UtcDateTime,
  ) -> Result<SessionToken> {
    let mut tables = self.write();
    let session = SessionToken {
      id: tables.next_id(),
      student_id,
      value: value.to_string(),
      expires_on,
    };
    tables.sessions.push(session.clone());
    Ok(session)
  }

  async fn student_by_session(&self, value: &str, now: UtcDateTime) -> Result<Option<Student>> {
    let tables = self.read();
    let session = tables
      .sessions
      .iter()
      .find(|s| s.value == value && s.expires_on > now);

    Ok(session.and_then(|session| {
      tables
        .students
        .iter()
        .find(|s| s.id == session.student_id)
        .cloned()
    }))
  }
}

#[rocket::async_trait]
impl TransactionStore for MemoryStorage {
  async fn create(&self, new: NewTransaction) -> Result<Transaction> {
    let mut tables = self.write();

    if tables.transactions.iter().any(|t| t.reference == new.reference) {
      return Err(Error::validation("uniqueness", "reference already exists"));
    }

    let transaction = Transaction {
      id: tables.next_id(),
      student_id: new.student_id,
      offer_id: new.offer_id,
      promocode_id: new.promocode_id,
      amount: new.amount,
      reference: new.reference,
      status: TransactionStatus::Pending,
      created_at: Utc::now(),
    };
    tables.transactions.push(transaction.clone());
    Ok(transaction)
  }

  async fn by_reference(&self, reference: &str) -> Result<Option<Transaction>> {
    Ok(
      self
        .read()
        .transactions
        .iter()
        .find(|t| t.reference == reference)
        .cloned(),
    )
  }

  async fn for_student(&self, student_id: i32) -> Result<Vec<Transaction>> {
    Ok(
      self
        .read()
        .transactions
        .iter()
        .filter(|t| t.student_id == student_id)
        .cloned()
        .collect(),
    )
  }

  async fn transition(&self, reference: &str, target: TransactionStatus) -> Result<Transition> {
    let mut tables = self.write();
    let transaction = tables.transactions.iter_mut().find(|t| t.reference == reference);

    Ok(match transaction {
      None => Transition::NotFound,
      Some(t) if t.status == TransactionStatus::Pending => {
        t.status = target;
        Transition::Applied(t.clone())
      }
      Some(t) if t.status == TransactionStatus::Succeeded => Transition::AlreadySucceeded,
      Some(_) => Transition::AlreadyFailed,
    })
  }
}
