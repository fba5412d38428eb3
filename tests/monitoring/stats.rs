use actix_web::{test, web, App, HttpResponse};
use actix_web_csp_nonce::monitoring::CspStats;
use actix_web_csp_nonce::{CspConfigBuilder, CspMiddleware, DirectiveConfig};
use std::sync::Arc;

#[cfg(test)]
mod tests {
    use super::*;

    #[::std::prelude::v1::test]
    fn test_csp_stats_initial_values() {
        let stats = CspStats::new();

        assert_eq!(stats.request_count(), 0);
        assert_eq!(stats.header_count(), 0);
        assert_eq!(stats.nonce_generation_count(), 0);
        assert_eq!(stats.nonce_adoption_count(), 0);
        assert_eq!(stats.unforwarded_mount_count(), 0);
        assert_eq!(stats.avg_header_generation_time_ns(), 0.0);
        assert_eq!(stats.uptime_secs(), 0);
    }

    #[::std::prelude::v1::test]
    fn test_csp_stats_display() {
        let output = CspStats::default().to_string();

        assert!(output.contains("CSP Middleware Statistics"));
        assert!(output.contains("Nonces generated: 0"));
        assert!(output.contains("Sessions mounted without nonce: 0"));
    }

    #[actix_web::test]
    async fn test_stats_shared_through_builder() {
        let stats = Arc::new(CspStats::new());
        let config = CspConfigBuilder::new()
            .directives(DirectiveConfig::new().directive("style_src", "'nonce'"))
            .with_stats(stats.clone())
            .build();
        let app = test::init_service(
            App::new()
                .wrap(CspMiddleware::new(config))
                .route("/", web::get().to(HttpResponse::Ok)),
        )
        .await;

        test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(stats.request_count(), 2);
        assert_eq!(stats.header_count(), 2);
        assert_eq!(stats.nonce_generation_count(), 2);

        stats.reset();
        assert_eq!(stats.request_count(), 0);
        assert_eq!(stats.header_count(), 0);
    }
}
