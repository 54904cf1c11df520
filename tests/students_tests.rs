#[macro_use]
mod support;

use rocket::http::Status;
use support::*;

use aula_api::models::*;

test! { sign_up_leaves_the_account_pending_verification(client, site)
  let status = client.post_status(
    "/students/sign-up",
    r#"{"name":"Ada Lovelace","email":"ada@example.com","password":"qwerty123"}"#,
  ).await;
  assert_eq!(status, Status::Created);

  let student = site.storage.students
    .by_email(site.settings.school_id, "ada@example.com").await.unwrap().unwrap();
  assert!(!student.verified);
  assert!(student.verification_code.is_some());
}

test! { duplicate_emails_conflict_without_touching_the_original(client, site)
  let body = r#"{"name":"Ada Lovelace","email":"ada@example.com","password":"qwerty123"}"#;
  assert_eq!(client.post_status("/students/sign-up", body).await, Status::Created);

  let original = site.storage.students
    .by_email(site.settings.school_id, "ada@example.com").await.unwrap().unwrap();

  let retry = r#"{"name":"Impostor","email":"ada@example.com","password":"hunter22222"}"#;
  assert_eq!(client.post_status("/students/sign-up", retry).await, Status::Conflict);

  let after = site.storage.students
    .by_email(site.settings.school_id, "ada@example.com").await.unwrap().unwrap();
  assert_eq!(after, original);
}

test! { verification_codes_are_single_use(client, site)
  let body = r#"{"name":"Ada Lovelace","email":"ada@example.com","password":"qwerty123"}"#;
  assert_eq!(client.post_status("/students/sign-up", body).await, Status::Created);

  let code = site.storage.students
    .by_email(site.settings.school_id, "ada@example.com").await.unwrap().unwrap()
    .verification_code.unwrap();

  let path = format!("/students/verify/{}", code);
  assert_eq!(client.post_status(&path, "").await, Status::Ok);

  let student = site.storage.students
    .by_email(site.settings.school_id, "ada@example.com").await.unwrap().unwrap();
  assert!(student.verified);
  assert!(student.verification_code.is_none());

  client.assert_post_error(&path, "", Status::BadRequest, "verification code is invalid").await;
}

test! { sign_in_requires_a_verified_account_and_a_matching_credential(client, site)
  let body = r#"{"name":"Ada Lovelace","email":"ada@example.com","password":"qwerty123"}"#;
  assert_eq!(client.post_status("/students/sign-up", body).await, Status::Created);

  let credentials = r#"{"email":"ada@example.com","password":"qwerty123"}"#;
  client.assert_post_error("/students/sign-in", credentials, Status::BadRequest, "not verified").await;

  let code = site.storage.students
    .by_email(site.settings.school_id, "ada@example.com").await.unwrap().unwrap()
    .verification_code.unwrap();
  assert_eq!(client.post_status(&format!("/students/verify/{}", code), "").await, Status::Ok);

  let session: serde_json::Value = client.post("/students/sign-in", credentials).await;
  assert!(session["token"].as_str().unwrap().len() > 10);

  let wrong = r#"{"email":"ada@example.com","password":"nope-nope"}"#;
  client.assert_post_error("/students/sign-in", wrong, Status::BadRequest, "doesn't exist").await;
}

test! { content_routes_want_a_session_token(client, site)
  let fixtures = seed_catalog(&site).await;

  let path = format!("/students/modules/{}/lessons", fixtures.free_module.id);
  assert_eq!(client.get_status(&path).await, Status::Unauthorized);
  assert_eq!(client.auth_get_status(&path, "made-up-token").await, Status::Unauthorized);
}

#[test]
fn verification_email_goes_through_the_provider() {
  run_test(async move {
    let mock = mockito::mock("POST", "/v3/smtp/email")
      .with_status(201)
      .with_body("{}")
      .create();

    let settings = SiteSettings {
      database_uri: None,
      sendinblue: Some(SendinblueSettings {
        api_url: mockito::server_url(),
        api_key: "xkeysib-test".to_string(),
        sender_name: "Aula".to_string(),
        sender_email: "hello@aula.example".to_string(),
      }),
      ..Default::default()
    };
    let site = settings.into_site().await.unwrap();
    let client = PublicApiClient::new(aula_api::server(site.clone())).await;

    let status = client.post_status(
      "/students/sign-up",
      r#"{"name":"Grace Hopper","email":"grace@example.com","password":"qwerty123"}"#,
    ).await;
    assert_eq!(status, Status::Created);

    mock.assert();
    Ok(())
  })
}
