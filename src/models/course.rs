use serde::Serialize;

use crate::error::{Error, Result};
use super::*;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
  pub id: i32,
  pub school_id: i32,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Package {
  pub id: i32,
  pub course_id: i32,
  pub name: String,
}

/// A unit of course content. Gated modules are served only to students holding
/// a succeeded transaction for an offer that grants the module's package.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Module {
  pub id: i32,
  pub package_id: i32,
  pub name: String,
  pub position: i32,
  pub available: bool,
  pub free: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
  pub id: i32,
  pub module_id: i32,
  pub name: String,
  pub position: i32,
  pub content: String,
}

#[derive(Debug, Clone)]
pub struct NewModule {
  pub package_id: i32,
  pub name: String,
  pub position: i32,
  pub available: bool,
  pub free: bool,
}

impl Course {
  pub async fn find(site: &Site, id: i32) -> Result<Course> {
    site
      .storage
      .catalog
      .course_by_id(id)
      .await?
      .ok_or(Error::CourseNotFound)
  }

  pub async fn packages(&self, site: &Site) -> Result<Vec<Package>> {
    site.storage.catalog.packages_by_course(self.id).await
  }
}

impl Module {
  pub async fn find(site: &Site, id: i32) -> Result<Module> {
    site
      .storage
      .catalog
      .module_by_id(id)
      .await?
      .ok_or(Error::ModuleNotFound)
  }

  pub async fn lessons(&self, site: &Site) -> Result<Vec<Lesson>> {
    site.storage.catalog.lessons_by_module(self.id).await
  }
}
