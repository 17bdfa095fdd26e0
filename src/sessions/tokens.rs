use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

/// Pack a user id into a signed session token.
pub fn encode_token(
    user_id: i64,
    secret: &[u8],
    // expires in seconds
    expires: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let iat = now.timestamp() as usize;
    let exp = (now + Duration::seconds(expires)).timestamp() as usize;

    let claims = TokenClaims {
        sub: user_id.to_string(),
        iat,
        exp,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
}

/// Recover the user id from a session token.
pub fn decode_token(token: &str, secret: &[u8]) -> Result<i64, String> {
    let decoded = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| e.to_string())?;

    decoded
        .claims
        .sub
        .parse::<i64>()
        .map_err(|e| format!("invalid subject: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_decode_valid_token() {
        let secret = b"my-secret-key";

        let token = encode_token(123, secret, 3600).unwrap();
        let decoded_user_id = decode_token(&token, secret).unwrap();

        assert_eq!(decoded_user_id, 123);
    }

    #[test]
    fn test_decode_invalid_token() {
        let secret = b"my-secret-key";

        let result = decode_token("invalid-token", secret);

        assert!(result.is_err());
    }

    #[test]
    fn test_decode_expired_token() {
        let secret = b"my-secret-key";
        let expired_token = encode_token(123, secret, -3600).unwrap();

        let result = decode_token(&expired_token, secret);

        assert!(result.is_err());
    }

    #[test]
    fn test_decode_with_wrong_secret() {
        let token = encode_token(123, b"my-secret-key", 3600).unwrap();

        let result = decode_token(&token, b"another-secret-key");

        assert!(result.is_err());
    }
}
