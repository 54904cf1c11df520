use std::sync::Arc;

use crate::error::Result;
use super::*;

mod memory;
mod pg;

pub use memory::MemoryStorage;
pub use pg::PgStorage;

#[rocket::async_trait]
pub trait CatalogStore: Send + Sync {
  async fn create_course(&self, school_id: i32, name: &str) -> Result<Course>;
  async fn create_package(&self, course_id: i32, name: &str) -> Result<Package>;
  async fn create_module(&self, new: NewModule) -> Result<Module>;
  async fn create_lesson(
    &self,
    module_id: i32,
    name: &str,
    position: i32,
    content: &str,
  ) -> Result<Lesson>;

  async fn course_by_id(&self, id: i32) -> Result<Option<Course>>;
  async fn packages_by_course(&self, course_id: i32) -> Result<Vec<Package>>;
  async fn module_by_id(&self, id: i32) -> Result<Option<Module>>;
  async fn lessons_by_module(&self, module_id: i32) -> Result<Vec<Lesson>>;
}

#[rocket::async_trait]
pub trait OfferStore: Send + Sync {
  async fn create(&self, new: NewOffer) -> Result<Offer>;
  async fn update(&self, update: OfferUpdate) -> Result<Option<Offer>>;
  async fn delete(&self, school_id: i32, id: i32) -> Result<bool>;
  async fn by_id(&self, id: i32) -> Result<Option<Offer>>;
  async fn by_school(&self, school_id: i32) -> Result<Vec<Offer>>;
  /// Offers whose package set intersects the given packages, each offer once.
  async fn by_packages(&self, package_ids: &[i32]) -> Result<Vec<Offer>>;
}

#[rocket::async_trait]
pub trait PromocodeStore: Send + Sync {
  async fn create(&self, new: NewPromocode) -> Result<Promocode>;
  async fn by_code(&self, school_id: i32, code: &str) -> Result<Option<Promocode>>;
}

#[rocket::async_trait]
pub trait StudentStore: Send + Sync {
  async fn create(&self, new: NewStudent) -> Result<Student>;
  async fn by_id(&self, id: i32) -> Result<Option<Student>>;
  async fn by_email(&self, school_id: i32, email: &str) -> Result<Option<Student>>;
  /// Flips `verified` and clears the code in one conditional update, making
  /// verification codes single-use even under concurrent submissions.
  async fn claim_verification(&self, code: &str) -> Result<Option<Student>>;
  async fn create_session(
    &self,
    student_id: i32,
    value: &str,
    expires_on: UtcDateTime,
  ) -> Result<SessionToken>;
  async fn student_by_session(&self, value: &str, now: UtcDateTime) -> Result<Option<Student>>;
}

/// Outcome of a conditional status transition. A caller that lost the race to
/// a duplicate delivery sees the settled state, not an error.
#[derive(Debug, Clone)]
pub enum Transition {
  Applied(Transaction),
  AlreadySucceeded,
  AlreadyFailed,
  NotFound,
}

#[rocket::async_trait]
pub trait TransactionStore: Send + Sync {
  async fn create(&self, new: NewTransaction) -> Result<Transaction>;
  async fn by_reference(&self, reference: &str) -> Result<Option<Transaction>>;
  async fn for_student(&self, student_id: i32) -> Result<Vec<Transaction>>;
  /// Moves a pending transaction to `target` in a single conditional update.
  /// `target` must be a settled status.
  async fn transition(&self, reference: &str, target: TransactionStatus) -> Result<Transition>;
}

#[derive(Clone)]
pub struct Storage {
  pub catalog: Arc<dyn CatalogStore>,
  pub offers: Arc<dyn OfferStore>,
  pub promocodes: Arc<dyn PromocodeStore>,
  pub students: Arc<dyn StudentStore>,
  pub transactions: Arc<dyn TransactionStore>,
}

impl Storage {
  pub fn memory() -> Storage {
    let store = Arc::new(MemoryStorage::new());

    Storage {
      catalog: store.clone(),
      offers: store.clone(),
      promocodes: store.clone(),
      students: store.clone(),
      transactions: store,
    }
  }

  pub async fn postgres(uri: &str) -> Result<Storage> {
    let store = Arc::new(PgStorage::connect(uri).await?);

    Ok(Storage {
      catalog: store.clone(),
      offers: store.clone(),
      promocodes: store.clone(),
      students: store.clone(),
      transactions: store,
    })
  }
}
