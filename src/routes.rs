use std::sync::Arc;

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;
use crate::feed::{self, FeedSort, FeedView};
use crate::models::Id;
use crate::moderation;
use crate::repo::Repo;
use crate::session::{Session, SessionConfig};
use crate::views::{self, AboutPage, FeedPage, PostIdeaPage, SponsorPage};
use crate::{ideas, votes};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/index", web::get().to(index))
        .route("/upvote/{id}", web::get().to(upvote))
        .route("/downvote/{id}", web::get().to(downvote))
        .route("/report/{id}", web::get().to(report))
        .route("/ideas/{tags}", web::get().to(ideas_by_category))
        .service(
            web::resource("/post_idea")
                .route(web::get().to(post_idea_form))
                .route(web::post().to(post_idea)),
        )
        .route("/about", web::get().to(about))
        .route("/sponsor", web::get().to(sponsor));
}

#[derive(Clone)]
pub struct AppState { pub repo: Arc<dyn Repo>, pub session: SessionConfig }

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    page: Option<String>,
    sort: Option<String>,
}

impl FeedQuery {
    // unparseable pages behave like the first page
    fn page(&self) -> i64 {
        self.page.as_deref().and_then(|p| p.trim().parse().ok()).unwrap_or(1)
    }
}

#[derive(Debug, Deserialize)]
pub struct IdeaForm {
    title: Option<String>,
    tags: Option<String>,
    twitter_link: Option<String>,
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type(views::HTML).body(body)
}

/// Redirect to the feed, writing the session cookie when markers changed.
fn back_to_feed(session: &Session, cfg: &SessionConfig) -> Result<HttpResponse, ApiError> {
    let mut resp = HttpResponse::Found();
    resp.insert_header((header::LOCATION, "/"));
    if session.is_dirty() {
        resp.cookie(session.to_cookie(cfg)?);
    }
    Ok(resp.finish())
}

fn render_feed(view: &FeedView, heading: String, base_path: &str, show_sort: bool) -> Result<HttpResponse, ApiError> {
    let page = FeedPage {
        nav: "feed",
        heading,
        feed: view,
        base_path,
        sort_key: view.sort.key(),
        show_sort,
    };
    Ok(html(views::render(&page)?))
}

pub async fn index(data: web::Data<AppState>, query: web::Query<FeedQuery>) -> Result<HttpResponse, ApiError> {
    let sort = query.sort.as_deref().map(FeedSort::parse).unwrap_or_default();
    let view = feed::compose(data.repo.as_ref(), sort, query.page()).await?;
    render_feed(&view, "Trending ideas".into(), "/", true)
}

pub async fn ideas_by_category(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse, ApiError> {
    let raw = path.into_inner();
    let view = feed::compose_by_tags(data.repo.as_ref(), &raw, query.page()).await?;
    let heading = if view.tags.is_empty() {
        format!("Ideas tagged {raw}")
    } else {
        let names: Vec<&str> = view.tags.iter().map(|t| t.name.as_str()).collect();
        format!("Ideas tagged {}", names.join(", "))
    };
    // the raw request path keeps its percent-encoding, so links stay valid
    render_feed(&view, heading, req.path(), false)
}

pub async fn upvote(data: web::Data<AppState>, mut session: Session, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    votes::upvote(data.repo.as_ref(), &mut session, path.into_inner()).await?;
    back_to_feed(&session, &data.session)
}

pub async fn downvote(data: web::Data<AppState>, mut session: Session, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    votes::downvote(data.repo.as_ref(), &mut session, path.into_inner()).await?;
    back_to_feed(&session, &data.session)
}

pub async fn report(data: web::Data<AppState>, mut session: Session, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let outcome = moderation::report(data.repo.as_ref(), &mut session, id).await?;
    debug!(idea_id = id, ?outcome, "report handled");
    back_to_feed(&session, &data.session)
}

pub async fn post_idea_form() -> Result<HttpResponse, ApiError> {
    Ok(html(views::render(&PostIdeaPage { nav: "post" })?))
}

pub async fn post_idea(data: web::Data<AppState>, form: web::Form<IdeaForm>) -> Result<HttpResponse, ApiError> {
    let IdeaForm { title, tags, twitter_link } = form.into_inner();
    let title = title.ok_or_else(|| ApiError::Validation("title".into()))?;
    let tags = tags.ok_or_else(|| ApiError::Validation("tags".into()))?;
    ideas::create(data.repo.as_ref(), title, &tags, twitter_link).await?;
    Ok(HttpResponse::Found().insert_header((header::LOCATION, "/")).finish())
}

pub async fn about() -> Result<HttpResponse, ApiError> {
    Ok(html(views::render(&AboutPage { nav: "about" })?))
}

pub async fn sponsor() -> Result<HttpResponse, ApiError> {
    Ok(html(views::render(&SponsorPage { nav: "sponsor" })?))
}
