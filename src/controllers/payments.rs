use super::*;

#[post("/callback", data = "<webhook>")]
pub async fn callback(webhook: PaymentWebhook, site: &State<Site>) -> JsonResult<&'static str> {
  webhook.callback.process(&site).await?;
  Ok(Json("OK"))
}
