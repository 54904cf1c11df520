use aula_api::models::SiteSettings;

#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
  let settings = SiteSettings::from_figment(&rocket::Config::figment())
    .expect("Config could not be parsed");

  let site = settings
    .into_site()
    .await
    .expect("Could not validate site state");

  aula_api::server(site).launch().await?;

  Ok(())
}
