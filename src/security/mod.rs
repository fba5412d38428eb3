pub mod nonce;
pub mod scope;

pub use nonce::{is_valid_nonce, NonceGenerator};
pub use scope::{
    adopt_nonce, current_nonce, meta_tag, nonce_attr, CurrentScope, NonceScope, NonceSource,
};
