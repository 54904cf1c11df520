#![allow(dead_code)]

use std::future::Future;

use rocket::{
  http::{Header, Status},
  local::asynchronous::{Client, LocalResponse},
};
use tokio::runtime::Runtime;

pub use serde::{de::DeserializeOwned, Deserialize};

pub use galvanic_assert::{
  self,
  matchers::{collection::*, *},
  *,
};

use aula_api::models::*;

pub fn run_test<F: Future<Output = Result<(), anyhow::Error>>>(future: F) {
  let result = Runtime::new()
    .expect("could not build runtime")
    .block_on(future);
  result.unwrap();
}

macro_rules! test {
  ($i:ident($client:ident, $site:ident) $($e:tt)* ) => {
    #[test]
    fn $i() {
      crate::support::run_test(async move {
        let settings = aula_api::models::SiteSettings {
          database_uri: None,
          ..Default::default()
        };
        let $site = settings.into_site().await.unwrap();
        let $client =
          crate::support::PublicApiClient::new(aula_api::server($site.clone())).await;
        {$($e)*};
        Ok(())
      })
    }
  }
}

#[derive(Deserialize)]
pub struct ApiError {
  pub error: String,
}

pub struct PublicApiClient {
  pub client: Client,
}

impl PublicApiClient {
  pub async fn new(server: rocket::Rocket<rocket::Build>) -> Self {
    Self {
      client: Client::tracked(server).await.unwrap(),
    }
  }

  pub async fn post<T, B>(&self, path: &str, body: B) -> T
  where
    T: DeserializeOwned,
    B: AsRef<str> + AsRef<[u8]>,
  {
    let response = self.post_response(path, body, None).await;
    parse(response).await
  }

  pub async fn post_status<B>(&self, path: &str, body: B) -> Status
  where
    B: AsRef<str> + AsRef<[u8]>,
  {
    self.post_response(path, body, None).await.status()
  }

  pub async fn auth_post<T, B>(&self, path: &str, body: B, token: &str) -> T
  where
    T: DeserializeOwned,
    B: AsRef<str> + AsRef<[u8]>,
  {
    let response = self.post_response(path, body, Some(token)).await;
    parse(response).await
  }

  pub async fn auth_post_status<B>(&self, path: &str, body: B, token: &str) -> Status
  where
    B: AsRef<str> + AsRef<[u8]>,
  {
    self.post_response(path, body, Some(token)).await.status()
  }

  pub async fn auth_get<T: DeserializeOwned>(&self, path: &str, token: &str) -> T {
    let response = self.get_response(path, Some(token)).await;
    parse(response).await
  }

  pub async fn auth_get_status(&self, path: &str, token: &str) -> Status {
    self.get_response(path, Some(token)).await.status()
  }

  pub async fn get<T: DeserializeOwned>(&self, path: &str) -> T {
    let response = self.get_response(path, None).await;
    parse(response).await
  }

  pub async fn get_status(&self, path: &str) -> Status {
    self.get_response(path, None).await.status()
  }

  pub async fn delete_status(&self, path: &str, token: &str) -> Status {
    self
      .client
      .delete(path)
      .header(bearer(token))
      .dispatch()
      .await
      .status()
  }

  pub async fn put_status<B>(&self, path: &str, body: B, token: &str) -> Status
  where
    B: AsRef<str> + AsRef<[u8]>,
  {
    self
      .client
      .put(path)
      .header(bearer(token))
      .body(body)
      .dispatch()
      .await
      .status()
  }

  pub async fn put<T, B>(&self, path: &str, body: B, token: &str) -> T
  where
    T: DeserializeOwned,
    B: AsRef<str> + AsRef<[u8]>,
  {
    let response = self
      .client
      .put(path)
      .header(bearer(token))
      .body(body)
      .dispatch()
      .await;
    parse(response).await
  }

  // Payment callbacks are signed with HMAC-SHA256 over the raw body.
  pub async fn webhook_post(&self, path: &str, body: &str, secret: &str) -> Status {
    use hmac::{Hmac, Mac, NewMac};
    use sha2::Sha256;

    let mut mac =
      Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key size");
    mac.update(body.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    self
      .client
      .post(path)
      .header(Header::new("x-payment-signature", signature))
      .body(body.to_string())
      .dispatch()
      .await
      .status()
  }

  pub async fn assert_post_error<B>(&self, path: &str, body: B, status: Status, msg: &str)
  where
    B: AsRef<str> + AsRef<[u8]>,
  {
    let response = self.post_response(path, body, None).await;
    assert_eq!(response.status(), status);
    let err: ApiError =
      serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
    assert_that!(&err.error, rematch(msg));
  }

  pub async fn assert_auth_post_error<B>(
    &self,
    path: &str,
    body: B,
    token: &str,
    status: Status,
    msg: &str,
  ) where
    B: AsRef<str> + AsRef<[u8]>,
  {
    let response = self.post_response(path, body, Some(token)).await;
    assert_eq!(response.status(), status);
    let err: ApiError =
      serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
    assert_that!(&err.error, rematch(msg));
  }

  async fn post_response<'a, B>(&'a self, path: &'a str, body: B, token: Option<&str>) -> LocalResponse<'a>
  where
    B: AsRef<str> + AsRef<[u8]>,
  {
    let mut request = self.client.post(path).body(body);
    if let Some(token) = token {
      request = request.header(bearer(token));
    }
    request.dispatch().await
  }

  async fn get_response<'a>(&'a self, path: &'a str, token: Option<&str>) -> LocalResponse<'a> {
    let mut request = self.client.get(path);
    if let Some(token) = token {
      request = request.header(bearer(token));
    }
    request.dispatch().await
  }
}

fn bearer(token: &str) -> Header<'static> {
  Header::new("Authorization", format!("Bearer {}", token))
}

async fn parse<T: DeserializeOwned>(response: LocalResponse<'_>) -> T {
  let string = response.into_string().await.unwrap();
  serde_json::from_str(&string).unwrap_or_else(|_| panic!("Could not parse response {}", string))
}

pub fn rematch<'a>(expr: &'a str) -> Box<dyn Matcher<'a, String> + 'a> {
  Box::new(move |actual: &String| {
    let re = regex::Regex::new(expr).unwrap();
    let builder = MatchResultBuilder::for_("rematch");
    if re.is_match(actual) {
      builder.matched()
    } else {
      builder.failed_because(&format!("{:?} does not match {:?}", expr, actual))
    }
  })
}

pub struct Fixtures {
  pub course: Course,
  pub basic_package: Package,
  pub pro_package: Package,
  pub free_module: Module,
  pub gated_module: Module,
  pub hidden_module: Module,
  pub pro_module: Module,
  pub basic_offer: Offer,
  pub full_offer: Offer,
}

// A small school catalog: one course, two packages, an offer selling the basic
// package and an offer selling both.
pub async fn seed_catalog(site: &Site) -> Fixtures {
  let school_id = site.settings.school_id;
  let catalog = &site.storage.catalog;

  let course = catalog.create_course(school_id, "Rust for artists").await.unwrap();
  let basic_package = catalog.create_package(course.id, "Basic").await.unwrap();
  let pro_package = catalog.create_package(course.id, "Pro").await.unwrap();

  let free_module = catalog
    .create_module(NewModule {
      package_id: basic_package.id,
      name: "Welcome".to_string(),
      position: 0,
      available: true,
      free: true,
    })
    .await
    .unwrap();

  let gated_module = catalog
    .create_module(NewModule {
      package_id: basic_package.id,
      name: "Ownership".to_string(),
      position: 1,
      available: true,
      free: false,
    })
    .await
    .unwrap();

  let hidden_module = catalog
    .create_module(NewModule {
      package_id: basic_package.id,
      name: "Drafts".to_string(),
      position: 2,
      available: false,
      free: false,
    })
    .await
    .unwrap();

  let pro_module = catalog
    .create_module(NewModule {
      package_id: pro_package.id,
      name: "Lifetimes".to_string(),
      position: 0,
      available: true,
      free: false,
    })
    .await
    .unwrap();

  for module in [&free_module, &gated_module, &pro_module] {
    catalog
      .create_lesson(module.id, "Intro", 0, "Welcome to the module")
      .await
      .unwrap();
    catalog
      .create_lesson(module.id, "Practice", 1, "Now try it yourself")
      .await
      .unwrap();
  }

  let basic_offer = site
    .storage
    .offers
    .create(NewOffer {
      school_id,
      name: "Basic access".to_string(),
      description: "The essentials".to_string(),
      benefits: vec!["Forum access".to_string()],
      price: Price { cents: 10000, currency: "EUR".to_string() },
      package_ids: vec![basic_package.id],
    })
    .await
    .unwrap();

  let full_offer = site
    .storage
    .offers
    .create(NewOffer {
      school_id,
      name: "Full access".to_string(),
      description: "Everything, forever".to_string(),
      benefits: vec!["Forum access".to_string(), "Certificate".to_string()],
      price: Price { cents: 18000, currency: "EUR".to_string() },
      package_ids: vec![basic_package.id, pro_package.id],
    })
    .await
    .unwrap();

  Fixtures {
    course,
    basic_package,
    pro_package,
    free_module,
    gated_module,
    hidden_module,
    pro_module,
    basic_offer,
    full_offer,
  }
}

// Walks a fresh student through sign-up and email verification, returning a
// session token for authenticated requests.
pub async fn verified_student(client: &PublicApiClient, site: &Site, email: &str) -> String {
  let body = format!(
    r#"{{"name":"Test Student","email":"{}","password":"qwerty123"}}"#,
    email
  );
  assert_eq!(client.post_status("/students/sign-up", body).await, Status::Created);

  let student = site
    .storage
    .students
    .by_email(site.settings.school_id, email)
    .await
    .unwrap()
    .expect("student was not created");
  let code = student.verification_code.expect("no verification code issued");

  assert_eq!(
    client.post_status(&format!("/students/verify/{}", code), "").await,
    Status::Ok
  );

  let session: serde_json::Value = client
    .post(
      "/students/sign-in",
      format!(r#"{{"email":"{}","password":"qwerty123"}}"#, email),
    )
    .await;

  session["token"].as_str().expect("sign-in returned no token").to_string()
}
