#![allow(dead_code)]

use actix_web::{HttpRequest, HttpResponse};
use actix_web_csp_nonce::prelude::*;

/// Renders an inline script tagged with the request nonce read via the
/// request extensions.
pub async fn render_page(req: HttpRequest) -> Result<HttpResponse, CspError> {
    let nonce = req.csp_nonce()?;
    Ok(HttpResponse::Ok()
        .content_type("text/html")
        .body(format!("<script {}>run()</script>", nonce_attr(&nonce))))
}

/// Renders the nonce obtained through the task-local accessor.
pub async fn render_with_accessor() -> Result<HttpResponse, CspError> {
    let nonce = current_nonce()?;
    Ok(HttpResponse::Ok().body(nonce))
}

pub async fn plain() -> HttpResponse {
    HttpResponse::Ok().body("no inline content")
}

pub fn nonce_directives() -> DirectiveConfig {
    DirectiveConfig::new().directive("script_src", "'self' 'nonce'")
}

/// Extracts `<value>` from the first `'nonce-<value>'` source in a header.
pub fn nonce_from_header(header: &str) -> Option<&str> {
    let start = header.find("'nonce-")? + "'nonce-".len();
    let end = header[start..].find('\'')? + start;
    Some(&header[start..end])
}

/// Extracts the value of the first `nonce="…"` attribute in a body.
pub fn nonce_from_body(body: &str) -> Option<&str> {
    let start = body.find("nonce=\"")? + "nonce=\"".len();
    let end = body[start..].find('"')? + start;
    Some(&body[start..end])
}
