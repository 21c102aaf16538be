//! Global object identification
//!
//! A global ID is the url-safe base64 encoding of ``type:id``. Clients must
//! treat it as opaque; the resolver uses the ``type`` part to pick the
//! loader and hands the ``id`` part to it unchanged.
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};

use crate::fallible::ResolveError;

const DELIMITER: char = ':';

/// Url-safe alphabet, no padding on output, padding tolerated on input
pub(crate) const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalId {
    pub type_name: String,
    pub id: String,
}

impl GlobalId {
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
        }
    }

    pub fn encode(&self) -> String {
        encode(&self.type_name, &self.id)
    }

    pub fn decode(token: &str) -> Result<Self, ResolveError> {
        decode(token)
    }
}

pub fn encode(type_name: &str, id: &str) -> String {
    ENGINE.encode(format!("{}{}{}", type_name, DELIMITER, id))
}

/// Decodes a token produced by [`encode`].
///
/// The payload is split at the first delimiter, so ids may contain ``:``
/// themselves. Both parts must be non-empty.
pub fn decode(token: &str) -> Result<GlobalId, ResolveError> {
    let invalid = || ResolveError::InvalidIdentifier(token.to_string());

    let bytes = ENGINE.decode(token).map_err(|_| invalid())?;
    let payload = String::from_utf8(bytes).map_err(|_| invalid())?;

    match payload.split_once(DELIMITER) {
        Some((type_name, id)) if !type_name.is_empty() && !id.is_empty() => {
            Ok(GlobalId::new(type_name, id))
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_round_trip() {
        let token = encode("post", "42");
        let id = decode(&token).unwrap();
        assert_eq!(id, GlobalId::new("post", "42"));
    }

    #[test]
    fn test_round_trip_keeps_delimiters_in_id() {
        for (type_name, id) in [
            ("plugin", "akismet/akismet.php"),
            ("enqueued_script", "wp:block-editor"),
            ("user", "ünïcødé"),
            ("term", "7"),
        ] {
            let token = encode(type_name, id);
            assert!(!token.contains(&['+', '/', '='][..]), "{} is not url-safe", token);
            assert_eq!(decode(&token).unwrap(), GlobalId::new(type_name, id));
        }
    }

    #[test]
    fn test_padded_tokens_are_accepted() {
        // "post:42" with standard padding, as issued by other relay servers
        assert_eq!(decode("cG9zdDo0Mg==").unwrap(), GlobalId::new("post", "42"));
    }

    #[test]
    fn test_only_exact_tokens_decode() {
        let token = encode("post", "42");
        for padded in [format!(" {} ", token), format!("{}\n", token)] {
            assert!(matches!(
                decode(&padded),
                Err(ResolveError::InvalidIdentifier(_))
            ));
        }
    }

    #[test]
    fn test_garbage_is_rejected() {
        for token in ["", "!!!", "not base64 at all", "cG9zdA", "OjQy", "cG9zdDo"] {
            assert!(
                matches!(decode(token), Err(ResolveError::InvalidIdentifier(_))),
                "{} should not decode",
                token
            );
        }
    }

    #[test]
    fn test_non_utf8_payload_is_rejected() {
        let token = ENGINE.encode([0xff, 0xfe, b':', b'1']);
        assert!(matches!(
            decode(&token),
            Err(ResolveError::InvalidIdentifier(_))
        ));
    }
}
