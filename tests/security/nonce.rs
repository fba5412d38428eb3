use actix_web_csp_nonce::security::{is_valid_nonce, NonceGenerator};
use std::collections::HashSet;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_generator_creation() {
        let generator = NonceGenerator::default();

        let nonce = generator.generate().unwrap();
        assert!(!nonce.is_empty());
        assert_eq!(generator.length(), 24);
    }

    #[test]
    fn test_nonce_generation_uniqueness() {
        let generator = NonceGenerator::default();
        let nonces: HashSet<_> = (0..1000).map(|_| generator.generate().unwrap()).collect();

        assert_eq!(nonces.len(), 1000);
        assert_eq!(generator.generated_count(), 1000);
    }

    #[test]
    fn test_nonce_alphabet_is_url_safe_without_padding() {
        let generator = NonceGenerator::default();

        for _ in 0..100 {
            let nonce = generator.generate().unwrap();
            assert_eq!(nonce.len(), 32);
            assert!(nonce
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
            assert!(is_valid_nonce(&nonce));
        }
    }

    #[test]
    fn test_nonce_generator_different_lengths() {
        let gen_16 = NonceGenerator::new(16);
        let gen_24 = NonceGenerator::new(24);
        let gen_48 = NonceGenerator::new(48);

        let nonce_16 = gen_16.generate().unwrap();
        let nonce_24 = gen_24.generate().unwrap();
        let nonce_48 = gen_48.generate().unwrap();

        assert!(nonce_16.len() < nonce_24.len());
        assert!(nonce_24.len() < nonce_48.len());
        assert_eq!(nonce_48.len(), 64);
    }

    #[test]
    fn test_forwarded_nonce_validation() {
        assert!(is_valid_nonce("abc123"));
        assert!(is_valid_nonce("YWJjMTIz+/=="));
        assert!(!is_valid_nonce("abc 123"));
        assert!(!is_valid_nonce("abc'"));
        assert!(!is_valid_nonce("abc\"><script>"));
    }
}
