use aula_api::models::SiteSettings;

#[tokio::main]
async fn main() {
  let uri = SiteSettings::default()
    .database_uri
    .expect("DATABASE_URI is not set");

  let db = sqlx::PgPool::connect(&uri).await.expect("No database");

  sqlx::migrate!("src/migrations").run(&db).await.unwrap();
}
