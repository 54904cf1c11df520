use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Error, Result};
use super::*;

/// Money is integer minor units to keep discount arithmetic exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Price {
  #[validate(range(min = 0))]
  pub cents: i64,
  #[validate(length(min = 1))]
  pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
  pub id: i32,
  pub school_id: i32,
  pub name: String,
  pub description: String,
  pub benefits: Vec<String>,
  pub price: Price,
  pub package_ids: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct NewOffer {
  pub school_id: i32,
  pub name: String,
  pub description: String,
  pub benefits: Vec<String>,
  pub price: Price,
  pub package_ids: Vec<i32>,
}

/// Absent fields keep their stored value. `packages` replaces the whole set
/// when supplied, so `Some(vec![])` clears it while `None` leaves it alone.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOfferForm {
  pub name: Option<String>,
  pub description: Option<String>,
  pub benefits: Option<Vec<String>>,
  #[validate]
  pub price: Option<Price>,
  pub packages: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OfferForm {
  #[validate(length(min = 1))]
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub benefits: Vec<String>,
  #[validate]
  pub price: Price,
  #[serde(default)]
  pub packages: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct OfferUpdate {
  pub id: i32,
  pub school_id: i32,
  pub name: Option<String>,
  pub description: Option<String>,
  pub benefits: Option<Vec<String>>,
  pub price: Option<Price>,
  pub packages: Option<Vec<i32>>,
}

impl Offer {
  pub async fn create(site: &Site, school_id: i32, form: &OfferForm) -> Result<Offer> {
    form.validate()?;

    site
      .storage
      .offers
      .create(NewOffer {
        school_id,
        name: form.name.clone(),
        description: form.description.clone(),
        benefits: form.benefits.clone(),
        price: form.price.clone(),
        package_ids: form.packages.clone(),
      })
      .await
  }

  pub async fn update(
    site: &Site,
    school_id: i32,
    id: i32,
    form: &UpdateOfferForm,
  ) -> Result<Offer> {
    form.validate()?;

    site
      .storage
      .offers
      .update(OfferUpdate {
        id,
        school_id,
        name: form.name.clone(),
        description: form.description.clone(),
        benefits: form.benefits.clone(),
        price: form.price.clone(),
        packages: form.packages.clone(),
      })
      .await?
      .ok_or(Error::OfferNotFound)
  }

  pub async fn delete(site: &Site, school_id: i32, id: i32) -> Result<()> {
    if site.storage.offers.delete(school_id, id).await? {
      Ok(())
    } else {
      Err(Error::OfferNotFound)
    }
  }

  pub async fn find(site: &Site, id: i32) -> Result<Offer> {
    site
      .storage
      .offers
      .by_id(id)
      .await?
      .ok_or(Error::OfferNotFound)
  }

  pub async fn all_for_school(site: &Site, school_id: i32) -> Result<Vec<Offer>> {
    site.storage.offers.by_school(school_id).await
  }

  pub async fn for_package(site: &Site, school_id: i32, package_id: i32) -> Result<Vec<Offer>> {
    let offers = site.storage.offers.by_school(school_id).await?;

    Ok(
      offers
        .into_iter()
        .filter(|o| o.package_ids.contains(&package_id))
        .collect(),
    )
  }

  pub async fn for_module(site: &Site, school_id: i32, module_id: i32) -> Result<Vec<Offer>> {
    let module = Module::find(site, module_id).await?;
    Offer::for_package(site, school_id, module.package_id).await
  }

  pub async fn for_course(site: &Site, course_id: i32) -> Result<Vec<Offer>> {
    let course = Course::find(site, course_id).await?;
    let packages = course.packages(site).await?;

    if packages.is_empty() {
      return Ok(vec![]);
    }

    let package_ids: Vec<i32> = packages.iter().map(|p| p.id).collect();
    site.storage.offers.by_packages(&package_ids).await
  }
}
