use actix_web::{test, web, App, HttpRequest, HttpResponse};
use actix_web_csp_nonce::session::{mount_scope, on_mount, MountParams};
use actix_web_csp_nonce::{
    current_nonce, CspConfig, CspError, CspMiddleware, NonceGenerator, NonceScope, NONCE_PARAM,
};
use std::collections::HashMap;
use std::sync::Arc;

#[path = "../helpers.rs"]
mod helpers;
use helpers::{nonce_directives, nonce_from_header, render_page};

/// Accepts a session upgrade and renders with the mounted scope.
async fn live_mount(
    req: HttpRequest,
    config: web::Data<CspConfig>,
) -> Result<HttpResponse, CspError> {
    let scope = mount_scope(&req, &config);
    let nonce = scope.scope(async { current_nonce() }).await?;
    Ok(HttpResponse::Ok().body(nonce))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[::std::prelude::v1::test]
    fn test_adoption_scenario() {
        let generator = Arc::new(NonceGenerator::default());
        let params = MountParams::new().with_param(NONCE_PARAM, "abc123");

        let scope = on_mount(&params, NonceScope::new(generator.clone()));

        assert_eq!(scope.get_or_create_nonce().unwrap(), "abc123");
        assert_eq!(scope.get_or_create_nonce().unwrap(), "abc123");
        assert_eq!(generator.generated_count(), 0);
    }

    #[::std::prelude::v1::test]
    fn test_missing_nonce_falls_back_to_fresh_value() {
        let generator = Arc::new(NonceGenerator::default());
        let scope = on_mount(&MountParams::new(), NonceScope::new(generator.clone()));

        assert!(!scope.is_issued());
        let nonce = scope.get_or_create_nonce().unwrap();
        assert_eq!(nonce.len(), 32);
        assert_eq!(generator.generated_count(), 1);
    }

    #[::std::prelude::v1::test]
    fn test_unsafe_forwarded_nonce_is_not_adopted() {
        let params: MountParams =
            HashMap::from([(NONCE_PARAM.to_owned(), "x' 'unsafe-eval".to_owned())]).into();
        let scope = on_mount(&params, NonceScope::new(Arc::new(NonceGenerator::default())));

        assert!(!scope.is_issued());
        assert_ne!(scope.get_or_create_nonce().unwrap(), "x' 'unsafe-eval");
    }

    #[::std::prelude::v1::test]
    fn test_query_without_nonce_param() {
        let req = test::TestRequest::with_uri("/live?%zz").to_http_request();
        assert_eq!(MountParams::from_request(&req).forwarded_nonce(), None);
    }

    #[actix_web::test]
    async fn test_session_inherits_page_nonce() {
        let config = CspConfig::new(nonce_directives());
        let stats = config.stats().clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config.clone()))
                .wrap(CspMiddleware::new(config))
                .route("/", web::get().to(render_page))
                .route("/live", web::get().to(live_mount)),
        )
        .await;

        let page = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let header = page
            .headers()
            .get("content-security-policy")
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();
        let page_nonce = nonce_from_header(&header).unwrap().to_owned();

        let req = test::TestRequest::get()
            .uri(&format!("/live?{NONCE_PARAM}={page_nonce}"))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;

        assert_eq!(body, page_nonce.as_str());
        assert_eq!(stats.nonce_adoption_count(), 1);
        assert_eq!(stats.unforwarded_mount_count(), 0);
    }

    #[actix_web::test]
    async fn test_session_without_forwarded_nonce_is_not_fatal() {
        let config = CspConfig::new(nonce_directives());
        let stats = config.stats().clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .route("/live", web::get().to(live_mount)),
        )
        .await;

        let req = test::TestRequest::get().uri("/live").to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        assert_eq!(stats.unforwarded_mount_count(), 1);
        assert_eq!(stats.nonce_generation_count(), 1);
    }
}
