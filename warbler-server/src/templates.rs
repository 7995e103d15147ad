use anyhow::{Context, Result};
use tera::Tera;

/// Every page template, compiled into the binary
const TEMPLATES: [(&str, &str); 17] = [
    ("base.html", include_str!("../templates/base.html")),
    ("_messages.html", include_str!("../templates/_messages.html")),
    ("_users.html", include_str!("../templates/_users.html")),
    ("404.html", include_str!("../templates/404.html")),
    ("home.html", include_str!("../templates/home.html")),
    ("home-anon.html", include_str!("../templates/home-anon.html")),
    ("users/signup.html", include_str!("../templates/users/signup.html")),
    ("users/login.html", include_str!("../templates/users/login.html")),
    ("users/edit.html", include_str!("../templates/users/edit.html")),
    ("users/index.html", include_str!("../templates/users/index.html")),
    ("users/detail.html", include_str!("../templates/users/detail.html")),
    ("users/show.html", include_str!("../templates/users/show.html")),
    ("users/following.html", include_str!("../templates/users/following.html")),
    ("users/followers.html", include_str!("../templates/users/followers.html")),
    ("users/likes.html", include_str!("../templates/users/likes.html")),
    ("messages/new.html", include_str!("../templates/messages/new.html")),
    ("messages/show.html", include_str!("../templates/messages/show.html")),
];

/// Build the template engine. HTML autoescaping stays on.
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES.to_vec())
        .context("Failed to compile page templates")?;
    Ok(tera)
}
