#![cfg(feature = "inmem-store")]

use actix_web::dev::ServiceResponse;
use actix_web::{test, web, App, HttpResponse};
use ideaboard::repo::inmem::InMemRepo;
use ideaboard::{config, AppState, SecurityHeaders, SessionConfig};
use std::sync::Arc;

fn state() -> web::Data<AppState> {
    web::Data::new(AppState {
        repo: Arc::new(InMemRepo::ephemeral()),
        session: SessionConfig::new("headers-test-secret-0123456789abcdefgh", 1, false),
    })
}

async fn get(mw: SecurityHeaders, uri: &str) -> ServiceResponse {
    let app = test::init_service(App::new().wrap(mw).app_data(state()).configure(config)).await;
    test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await
}

fn header<'a>(resp: &'a ServiceResponse, name: &str) -> Option<&'a str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}

#[actix_web::test]
async fn feed_page_carries_hardening_headers() {
    let resp = get(SecurityHeaders::default(), "/").await;
    assert!(resp.status().is_success());
    let csp = header(&resp, "content-security-policy").unwrap();
    assert!(csp.contains("form-action 'self'"));
    assert!(csp.contains("style-src 'self' 'unsafe-inline'"));
    assert_eq!(header(&resp, "referrer-policy"), Some("same-origin"));
    assert_eq!(header(&resp, "x-content-type-options"), Some("nosniff"));
    assert_eq!(header(&resp, "strict-transport-security"), None);
}

#[actix_web::test]
async fn hsts_only_when_enabled() {
    let resp = get(SecurityHeaders::default().with_hsts(true), "/about").await;
    assert!(resp.status().is_success());
    assert!(header(&resp, "strict-transport-security").unwrap().starts_with("max-age="));
}

#[actix_web::test]
async fn error_pages_are_covered_too() {
    let resp = get(SecurityHeaders::default(), "/upvote/999").await;
    assert_eq!(resp.status(), 404);
    assert_eq!(header(&resp, "x-frame-options"), Some("DENY"));

    let resp = get(SecurityHeaders::default(), "/no/such/page").await;
    assert_eq!(resp.status(), 404);
    assert!(header(&resp, "content-security-policy").is_some());
}

#[actix_web::test]
async fn handler_policy_wins() {
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::default())
            .route("/custom", web::get().to(|| async {
                HttpResponse::Ok()
                    .insert_header((actix_web::http::header::CONTENT_SECURITY_POLICY, "custom-src 'none'"))
                    .finish()
            })),
    )
    .await;
    let resp = test::call_service(&app, test::TestRequest::get().uri("/custom").to_request()).await;
    assert_eq!(header(&resp, "content-security-policy"), Some("custom-src 'none'"));
    assert_eq!(header(&resp, "x-content-type-options"), Some("nosniff"));
}
