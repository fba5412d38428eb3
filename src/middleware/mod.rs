pub mod csp;
pub mod extensions;

pub use csp::{
    csp_middleware, csp_middleware_dynamic, csp_middleware_report_only, CspMiddleware,
    CspMiddlewareService, ScopedBody,
};
pub use extensions::CspExtensions;
