use crate::core::config::{CspConfig, CspConfigBuilder};
use crate::core::directives::DirectiveConfig;
use crate::core::policy::PolicyConfig;
use crate::security::scope::NonceScope;
use actix_web::{
    body::{BodySize, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web::Bytes,
    Error, HttpMessage, HttpRequest,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::{
    pin::Pin,
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
    time::Instant,
};

#[derive(Clone)]
pub struct CspMiddleware {
    config: Arc<CspConfig>,
}

impl CspMiddleware {
    #[inline]
    pub fn new(config: CspConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    #[inline]
    pub fn config(&self) -> Arc<CspConfig> {
        self.config.clone()
    }
}

impl<S, B> Transform<S, ServiceRequest> for CspMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<ScopedBody<B>>;
    type Error = Error;
    type Transform = CspMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CspMiddlewareService {
            service: Rc::new(service),
            config: self.config.clone(),
        }))
    }
}

pub struct CspMiddlewareService<S> {
    service: Rc<S>,
    config: Arc<CspConfig>,
}

impl<S, B> Service<ServiceRequest> for CspMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<ScopedBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let config = self.config.clone();

        Box::pin(async move {
            config.stats().increment_request_count();

            let scope = config.new_scope();
            req.extensions_mut().insert(scope.clone());

            let mut res = scope
                .clone()
                .scope(async move { service.call(req).await })
                .await?;

            let timer = Instant::now();
            let value = config.header_value(res.request(), &scope)?;
            res.headers_mut().insert(config.header_name(), value);

            config.stats().increment_header_count();
            config
                .stats()
                .add_header_generation_time(timer.elapsed().as_nanos() as usize);

            Ok(res.map_body(|_, body| ScopedBody::new(body, scope)))
        })
    }
}

/// Response body that keeps the request's nonce scope installed while it is
/// polled, so streamed rendering sees the nonce advertised in the header.
pub struct ScopedBody<B> {
    body: Pin<Box<B>>,
    scope: NonceScope,
}

impl<B> ScopedBody<B> {
    fn new(body: B, scope: NonceScope) -> Self {
        Self {
            body: Box::pin(body),
            scope,
        }
    }
}

impl<B: MessageBody> MessageBody for ScopedBody<B> {
    type Error = B::Error;

    #[inline]
    fn size(&self) -> BodySize {
        self.body.size()
    }

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Bytes, Self::Error>>> {
        let this = self.get_mut();
        let body = this.body.as_mut();
        this.scope.clone().sync_scope(|| body.poll_next(cx))
    }
}

#[inline]
pub fn csp_middleware(policy: impl Into<PolicyConfig>) -> CspMiddleware {
    CspMiddleware::new(CspConfig::new(policy))
}

#[inline]
pub fn csp_middleware_dynamic<F>(f: F) -> CspMiddleware
where
    F: Fn(&HttpRequest) -> DirectiveConfig + Send + Sync + 'static,
{
    CspMiddleware::new(CspConfig::new(PolicyConfig::dynamic(f)))
}

#[inline]
pub fn csp_middleware_report_only(policy: impl Into<PolicyConfig>) -> CspMiddleware {
    CspMiddleware::new(
        CspConfigBuilder::new()
            .policy(policy)
            .report_only(true)
            .build(),
    )
}
