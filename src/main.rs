use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use actix_web_csp_nonce::{
    meta_tag, mount_scope, nonce_attr, CspConfig, CspError, CspExtensions, CspMiddleware,
    DirectiveConfig,
};
use std::env;

async fn index(req: HttpRequest) -> Result<HttpResponse, CspError> {
    let nonce = req.csp_nonce()?;
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    {meta}
    <style {attr}>body {{ font-family: sans-serif; }}</style>
</head>
<body>
    <p>Inline script below carries the request nonce.</p>
    <script {attr}>
        const nonce = document.querySelector('meta[name="csp-nonce"]').content;
        fetch('/live/mount?_csp_nonce=' + encodeURIComponent(nonce))
            .then((res) => res.text())
            .then((body) => console.log(body));
    </script>
</body>
</html>"#,
        meta = meta_tag(&nonce),
        attr = nonce_attr(&nonce),
    );
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

/// Stands in for the handshake of a long-lived session.
async fn mount(req: HttpRequest, config: web::Data<CspConfig>) -> Result<HttpResponse, CspError> {
    let scope = mount_scope(&req, &config);
    let nonce = scope.get_or_create_nonce()?;
    Ok(HttpResponse::Ok().body(format!("<script {}></script>", nonce_attr(&nonce))))
}

fn load_config() -> Result<CspConfig, CspError> {
    match env::var("CSP_CONFIG") {
        Ok(path) => CspConfig::from_file(path),
        Err(_) => Ok(CspConfig::new(
            DirectiveConfig::new()
                .directive("script_src", "'self' 'nonce'")
                .directive("style_src", ["'self'", "'nonce'"])
                .directive("img_src", ["'self'", "data:"]),
        )),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config().map_err(std::io::Error::other)?;
    let addr = env::var("CSP_DEMO_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_owned());
    log::info!("Serving CSP demo on http://{addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .wrap(CspMiddleware::new(config.clone()))
            .route("/", web::get().to(index))
            .route("/live/mount", web::get().to(mount))
    })
    .bind(addr)?
    .run()
    .await
}
