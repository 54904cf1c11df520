use rocket::serde::json::{json, Value};

use super::*;

#[get("/")]
pub async fn index(site: &State<Site>, _session: AdminSession) -> JsonResult<Vec<Offer>> {
  Ok(Json(Offer::all_for_school(&site, site.settings.school_id).await?))
}

#[post("/", data = "<form>")]
pub async fn create(
  form: Json<OfferForm>,
  site: &State<Site>,
  _session: AdminSession,
) -> JsonResult<Offer> {
  Ok(Json(Offer::create(&site, site.settings.school_id, &form).await?))
}

#[put("/<id>", data = "<form>")]
pub async fn update(
  id: i32,
  form: Json<UpdateOfferForm>,
  site: &State<Site>,
  _session: AdminSession,
) -> JsonResult<Offer> {
  Ok(Json(Offer::update(&site, site.settings.school_id, id, &form).await?))
}

#[delete("/<id>")]
pub async fn delete(id: i32, site: &State<Site>, _session: AdminSession) -> JsonResult<Value> {
  Offer::delete(&site, site.settings.school_id, id).await?;
  Ok(Json(json![{"status": "ok"}]))
}

// Storefront listing, no session required.
#[get("/<course_id>/offers")]
pub async fn course_offers(course_id: i32, site: &State<Site>) -> JsonResult<Vec<Offer>> {
  Ok(Json(Offer::for_course(&site, course_id).await?))
}
