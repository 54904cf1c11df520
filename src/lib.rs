#[macro_use]
extern crate rocket;

use tera::Tera;
lazy_static::lazy_static! {
  pub static ref TEMPLATES: Tera = {
    let mut tera = Tera::default();
    tera.add_raw_templates([
      ("emails/verification", include_str!("templates/emails/verification.html.tera")),
      ("emails/receipt", include_str!("templates/emails/receipt.html.tera"))
    ]).expect("No static");
    tera
  };
}

pub mod models;
pub mod error;
pub mod controllers;
pub use controllers::*;

use models::Site;

pub fn server(site: Site) -> rocket::Rocket<rocket::Build> {
  rocket::build()
    .manage(site)
    .mount(
      "/students",
      routes![
        students::sign_up,
        students::sign_in,
        students::verify,
        students::module_lessons,
        students::module_offers,
        students::order,
      ],
    )
    .mount(
      "/offers",
      routes![offers::index, offers::create, offers::update, offers::delete],
    )
    .mount("/courses", routes![offers::course_offers])
    .mount("/payments", routes![payments::callback])
}
