pub mod constants;
pub mod core;
pub mod error;
pub mod middleware;
pub mod monitoring;
pub mod prelude;
pub mod security;
pub mod session;

// Re-export commonly used types for convenience
pub use crate::constants::NONCE_PARAM;
pub use crate::core::{
    build_header, CspConfig, CspConfigBuilder, CspPolicy, Directive, DirectiveConfig,
    PolicyConfig, Sources,
};
pub use error::CspError;
pub use middleware::{
    csp_middleware, csp_middleware_dynamic, csp_middleware_report_only, CspExtensions,
    CspMiddleware,
};
pub use monitoring::CspStats;
pub use security::{
    adopt_nonce, current_nonce, meta_tag, nonce_attr, CurrentScope, NonceGenerator, NonceScope,
    NonceSource,
};
pub use session::{mount_scope, on_mount, MountParams};
