/// Encoding scheme for single-use email-verification and password-reset links
///
/// A link token is a self-describing payload that carries the target user id
/// alongside an opaque single-use secret:
///
/// ```text
/// base64( "{user_id}:" + urlencode(opaque) )
/// ```
///
/// The opaque part is generated and checked by the one-time token ledger
/// ([`crate::models::one_time_token`]); this module only wraps and unwraps
/// it. Decoding splits on the *first* `:` so the opaque value may itself
/// contain colons once url-decoded.
///
/// # Example
///
/// ```
/// use rentfolio_shared::auth::one_time::{encode_link_token, decode_link_token};
/// use uuid::Uuid;
///
/// let user_id = Uuid::new_v4();
/// let token = encode_link_token(user_id, "opaque-secret");
///
/// let (decoded_id, opaque) = decode_link_token(&token).unwrap();
/// assert_eq!(decoded_id, user_id);
/// assert_eq!(opaque, "opaque-secret");
/// ```

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use uuid::Uuid;

/// Error type for link-token decoding
///
/// Deliberately carries no detail about *which* part of the payload was
/// malformed; all variants must collapse to one generic message at the
/// security boundary.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Malformed link token")]
pub struct LinkTokenError;

/// Encodes a user id and an opaque single-use secret into a link token
pub fn encode_link_token(user_id: Uuid, opaque: &str) -> String {
    let payload = format!("{}:{}", user_id, urlencoding::encode(opaque));
    BASE64.encode(payload.as_bytes())
}

/// Decodes a link token back into `(user_id, opaque)`
///
/// # Errors
///
/// Returns [`LinkTokenError`] if the payload is not valid base64/UTF-8, has
/// no `:` separator, the left side is not a UUID, or the right side is not
/// url-decodable.
pub fn decode_link_token(token: &str) -> Result<(Uuid, String), LinkTokenError> {
    let raw = BASE64.decode(token).map_err(|_| LinkTokenError)?;
    let payload = String::from_utf8(raw).map_err(|_| LinkTokenError)?;

    let (id_part, opaque_part) = payload.split_once(':').ok_or(LinkTokenError)?;
    let user_id = id_part.parse::<Uuid>().map_err(|_| LinkTokenError)?;
    let opaque = urlencoding::decode(opaque_part)
        .map_err(|_| LinkTokenError)?
        .into_owned();

    Ok((user_id, opaque))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = encode_link_token(user_id, "some-opaque-value");

        let (decoded_id, opaque) = decode_link_token(&token).unwrap();
        assert_eq!(decoded_id, user_id);
        assert_eq!(opaque, "some-opaque-value");
    }

    #[test]
    fn test_roundtrip_opaque_with_separator_chars() {
        // The opaque value may contain ':' and other reserved characters;
        // url-encoding keeps the first-colon split unambiguous
        let user_id = Uuid::new_v4();
        let opaque = "a:b:c/d?e=f&g=+h i";
        let token = encode_link_token(user_id, opaque);

        let (decoded_id, decoded) = decode_link_token(&token).unwrap();
        assert_eq!(decoded_id, user_id);
        assert_eq!(decoded, opaque);
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        assert_eq!(decode_link_token("not base64 !!!"), Err(LinkTokenError));
    }

    #[test]
    fn test_decode_rejects_missing_separator() {
        let token = BASE64.encode(Uuid::new_v4().to_string());
        assert_eq!(decode_link_token(&token), Err(LinkTokenError));
    }

    #[test]
    fn test_decode_rejects_non_uuid_user_id() {
        let token = BASE64.encode("not-a-uuid:opaque");
        assert_eq!(decode_link_token(&token), Err(LinkTokenError));
    }

    #[test]
    fn test_decode_rejects_non_utf8_payload() {
        let token = BASE64.encode([0xff, 0xfe, 0xfd]);
        assert_eq!(decode_link_token(&token), Err(LinkTokenError));
    }

    #[test]
    fn test_empty_opaque_roundtrips() {
        let user_id = Uuid::new_v4();
        let token = encode_link_token(user_id, "");

        let (decoded_id, opaque) = decode_link_token(&token).unwrap();
        assert_eq!(decoded_id, user_id);
        assert_eq!(opaque, "");
    }
}
