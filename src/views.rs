//! Askama page templates (files under `templates/`).

use askama::Template;

use crate::feed::FeedView;

pub const HTML: &str = "text/html; charset=utf-8";

pub fn render<T: Template>(page: &T) -> askama::Result<String> {
    page.render()
}

/// Front page and category pages.
#[derive(Template)]
#[template(path = "index.html")]
pub struct FeedPage<'a> {
    pub nav: &'static str,
    pub heading: String,
    pub feed: &'a FeedView,
    /// Path pagination links point at, already URL-safe.
    pub base_path: &'a str,
    pub sort_key: &'a str,
    pub show_sort: bool,
}

impl FeedPage<'_> {
    /// Extra query carried by pagination links.
    pub fn sort_query(&self) -> String {
        if self.show_sort { format!("&sort={}", self.sort_key) } else { String::new() }
    }
}

#[derive(Template)]
#[template(path = "post_idea.html")]
pub struct PostIdeaPage {
    pub nav: &'static str,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutPage {
    pub nav: &'static str,
}

#[derive(Template)]
#[template(path = "sponsor.html")]
pub struct SponsorPage {
    pub nav: &'static str,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub nav: &'static str,
    pub status: u16,
    pub message: String,
}
