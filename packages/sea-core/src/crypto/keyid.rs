//! OpenPGP-style key identifiers.
//!
//! The 64-byte raw public key (x then y) is framed the way an OpenPGP v4
//! public-key packet is framed for fingerprinting, hashed with SHA-1, and
//! the low 8 bytes of the fingerprint become the key id.

use super::codec::from_base64url;
use super::digest::sha1;
use super::keys::split_public_key;
use super::provider::CryptoProvider;
use crate::error::{Error, Result};
use crate::sea::Sea;

/// Packet tag for an old-format public-key packet with a two-byte length
const PACKET_TAG: u8 = 0x99;

/// Bytes kept from the end of the fingerprint
const KEY_ID_SIZE: usize = 8;

/// Compute the 16-hex-character id of a `x.y` public key
pub fn keyid(pub_key: &str) -> Result<String> {
    let (x, y) = split_public_key(pub_key)?;
    let mut body = from_base64url(x).map_err(|e| Error::InvalidKey(format!("key x: {}", e)))?;
    body.extend(from_base64url(y).map_err(|e| Error::InvalidKey(format!("key y: {}", e)))?);

    let length = u16::try_from(body.len())
        .map_err(|_| Error::InvalidKey("public key too long to frame".into()))?;

    let mut framed = Vec::with_capacity(3 + body.len());
    framed.push(PACKET_TAG);
    framed.extend_from_slice(&length.to_be_bytes());
    framed.extend_from_slice(&body);

    let fingerprint = sha1(&framed);
    Ok(hex::encode(&fingerprint[fingerprint.len() - KEY_ID_SIZE..]))
}

impl<P: CryptoProvider> Sea<P> {
    /// [`keyid`], recording failures on this context
    pub fn keyid(&self, pub_key: &str) -> Result<String> {
        self.settle("keyid", keyid(pub_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::codec::to_base64url;

    #[test]
    fn test_known_frame() {
        let x = [1u8; 32];
        let y = [2u8; 32];
        let key = format!("{}.{}", to_base64url(&x), to_base64url(&y));

        let mut framed = vec![0x99, 0x00, 0x40];
        framed.extend_from_slice(&x);
        framed.extend_from_slice(&y);
        let expected = hex::encode(&sha1(&framed)[12..]);

        assert_eq!(keyid(&key).unwrap(), expected);
        assert_eq!(expected.len(), 16);
    }

    #[tokio::test]
    async fn test_deterministic_for_pair() {
        let sea = Sea::new();
        let pair = sea.pair().await.unwrap();
        let a = sea.keyid(&pair.pub_key).unwrap();
        let b = sea.keyid(&pair.pub_key).unwrap();
        assert_eq!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(keyid("nodot"), Err(Error::InvalidKey(_))));
        assert!(matches!(keyid("a!.b?"), Err(Error::InvalidKey(_))));
    }
}
