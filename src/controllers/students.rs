use rocket::serde::json::{json, Value};

use super::*;

#[post("/sign-up", data = "<form>")]
pub async fn sign_up(form: Json<SignUpForm>, site: &State<Site>) -> Result<(Status, Json<Value>)> {
  form.save(&site).await?;
  Ok((Status::Created, Json(json![{"status": "ok"}])))
}

#[post("/sign-in", data = "<form>")]
pub async fn sign_in(form: Json<SignInForm>, site: &State<Site>) -> JsonResult<Value> {
  let session = Student::sign_in(&site, &form).await?;
  Ok(Json(json![{"token": session.value}]))
}

#[post("/verify/<code>")]
pub async fn verify(code: &str, site: &State<Site>) -> JsonResult<Value> {
  Student::verify(&site, code).await?;
  Ok(Json(json![{"status": "ok"}]))
}

#[get("/modules/<module_id>/lessons")]
pub async fn module_lessons(
  module_id: i32,
  session: Session,
  site: &State<Site>,
) -> JsonResult<Vec<Lesson>> {
  Ok(Json(session.student.module_lessons(&site, module_id).await?))
}

#[get("/modules/<module_id>/offers")]
pub async fn module_offers(
  module_id: i32,
  session: Session,
  site: &State<Site>,
) -> JsonResult<Vec<Offer>> {
  Ok(Json(Offer::for_module(&site, session.student.school_id, module_id).await?))
}

#[post("/order", data = "<form>")]
pub async fn order(form: Json<OrderForm>, session: Session, site: &State<Site>) -> JsonResult<Value> {
  let transaction = Transaction::create_order(&site, &session.student, &form).await?;
  Ok(Json(json![{
    "reference": transaction.reference,
    "amountDue": transaction.amount,
  }]))
}
