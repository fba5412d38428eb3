use crate::error::CspError;
use crate::security::scope::NonceScope;
use actix_web::HttpMessage;

/// Access to the request's nonce scope from handlers and extractors.
pub trait CspExtensions {
    fn nonce_scope(&self) -> Option<NonceScope>;

    /// The request's nonce, minted on first use. Fails with
    /// [`CspError::NoActiveScope`] when the CSP middleware is not installed.
    fn csp_nonce(&self) -> Result<String, CspError>;
}

impl<T> CspExtensions for T
where
    T: HttpMessage,
{
    fn nonce_scope(&self) -> Option<NonceScope> {
        self.extensions().get::<NonceScope>().cloned()
    }

    fn csp_nonce(&self) -> Result<String, CspError> {
        self.nonce_scope()
            .ok_or(CspError::NoActiveScope)?
            .get_or_create_nonce()
    }
}
