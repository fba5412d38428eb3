pub use crate::core::{CspConfig, CspConfigBuilder, DirectiveConfig, PolicyConfig};
pub use crate::error::CspError;
pub use crate::middleware::{
    csp_middleware, csp_middleware_dynamic, csp_middleware_report_only, CspExtensions,
    CspMiddleware,
};
pub use crate::security::{current_nonce, meta_tag, nonce_attr, NonceScope};
pub use crate::session::{mount_scope, on_mount, MountParams};
