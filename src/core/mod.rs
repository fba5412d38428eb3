pub mod config;
pub mod directives;
pub mod policy;

pub use config::{CspConfig, CspConfigBuilder};
pub use directives::{normalize_name, Directive, DirectiveConfig, Sources};
pub use policy::{build_header, header_value, CspPolicy, PolicyConfig};
