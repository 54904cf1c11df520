use chrono::{DateTime, Utc};

pub mod site;
pub mod storage;
pub mod mailer;
pub mod course;
pub mod offer;
pub mod promocode;
pub mod student;
pub mod order;

pub use site::*;
pub use storage::*;
pub use mailer::*;
pub use course::*;
pub use offer::*;
pub use promocode::*;
pub use student::*;
pub use order::*;

pub type UtcDateTime = DateTime<Utc>;

pub fn gen_passphrase() -> String {
  use chbs::{config::BasicConfig, prelude::*};
  let mut config = BasicConfig::default();
  config.separator = "+".into();
  config.capitalize_first = false.into();
  config.to_scheme().generate()
}

// Credentials are stored as keyed HMAC-SHA256 over the password, hex encoded.
// The key is the site secret, so hashes are useless outside this deployment.
pub fn hash_credential(secret: &str, password: &str) -> String {
  use hmac::{Hmac, Mac, NewMac};
  use sha2::Sha256;

  let mut mac =
    Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key size");
  mac.update(password.as_bytes());
  hex::encode(mac.finalize().into_bytes())
}
