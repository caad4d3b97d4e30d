//! Wrap instructions attached to an inbound leaf-registration transfer.
//!
//! The payload is CBOR so a registrar can hand over the asset and the
//! wrap parameters in a single transfer.

use serde::{Deserialize, Serialize};

use namewrap_core::{Principal, Timestamp};
use namewrap_perms::Fuses;

use crate::error::{Result, WrapperError};

/// How to wrap a leaf that arrives by direct transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationInstructions {
    /// The leaf label as text; its hash must equal the asset id.
    pub label: String,
    pub owner: Principal,
    pub fuses: Fuses,
    /// Requested expiry, clamped to the registration's expiry.
    pub expiry: Timestamp,
    pub resolver: Option<Principal>,
}

impl RegistrationInstructions {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| WrapperError::IncompatibleName(format!("cannot encode instructions: {e}")))?;
        Ok(buf)
    }

    /// Decode a payload. Malformed bytes or unknown fuse bits are an
    /// incompatible name.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        ciborium::from_reader(payload)
            .map_err(|e| WrapperError::IncompatibleName(format!("malformed instructions: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_roundtrip() {
        let instructions = RegistrationInstructions {
            label: "alice".into(),
            owner: Principal::named("alice"),
            fuses: Fuses::CANNOT_UNWRAP | Fuses::CANNOT_TRANSFER,
            expiry: 1_000,
            resolver: Some(Principal::named("resolver")),
        };

        let bytes = instructions.encode().unwrap();
        assert_eq!(RegistrationInstructions::decode(&bytes).unwrap(), instructions);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            RegistrationInstructions::decode(&[0xff, 0x00, 0x13]),
            Err(WrapperError::IncompatibleName(_))
        ));
    }

    #[test]
    fn test_unknown_fuse_bits_rejected() {
        #[derive(Serialize)]
        struct Loose {
            label: String,
            owner: Principal,
            fuses: u32,
            expiry: Timestamp,
            resolver: Option<Principal>,
        }

        let mut bytes = Vec::new();
        ciborium::into_writer(
            &Loose {
                label: "alice".into(),
                owner: Principal::named("alice"),
                fuses: 1 << 20,
                expiry: 0,
                resolver: None,
            },
            &mut bytes,
        )
        .unwrap();

        assert!(matches!(
            RegistrationInstructions::decode(&bytes),
            Err(WrapperError::IncompatibleName(_))
        ));
    }
}
