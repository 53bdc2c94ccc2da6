use base64::prelude::*;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use prople_scribe_core::endorsement::types::{EndorsementError, SignerBuilder};

use crate::common::types::CommonError;

/// `KeySigner` is the ed25519 signer of the acting profile
///
/// Keys and signatures travel as standard base64 strings.
#[derive(Clone)]
pub struct KeySigner {
    key: SigningKey,
}

impl KeySigner {
    pub fn from_seed(seed: String) -> Result<Self, CommonError> {
        let bytes = BASE64_STANDARD
            .decode(seed)
            .map_err(|err| CommonError::ValidationError(format!("signer: invalid seed: {}", err)))?;

        let secret: [u8; 32] = bytes.try_into().map_err(|_| {
            CommonError::ValidationError("signer: seed must be 32 bytes".to_string())
        })?;

        Ok(Self {
            key: SigningKey::from_bytes(&secret),
        })
    }
}

impl SignerBuilder for KeySigner {
    fn public_key(&self) -> String {
        BASE64_STANDARD.encode(self.key.verifying_key().to_bytes())
    }

    fn sign(&self, message: &[u8]) -> Result<String, EndorsementError> {
        let signature = self.key.sign(message);
        Ok(BASE64_STANDARD.encode(signature.to_bytes()))
    }

    fn verify(
        &self,
        message: &[u8],
        signature: String,
        public_key: String,
    ) -> Result<(), EndorsementError> {
        let key_bytes: [u8; 32] = BASE64_STANDARD
            .decode(public_key)
            .map_err(|err| EndorsementError::SignatureError(err.to_string()))?
            .try_into()
            .map_err(|_| EndorsementError::SignatureError("invalid public key length".to_string()))?;

        let verifying_key = VerifyingKey::from_bytes(&key_bytes)
            .map_err(|err| EndorsementError::SignatureError(err.to_string()))?;

        let signature_bytes = BASE64_STANDARD
            .decode(signature)
            .map_err(|err| EndorsementError::SignatureError(err.to_string()))?;

        let signature = Signature::from_slice(&signature_bytes)
            .map_err(|err| EndorsementError::SignatureError(err.to_string()))?;

        verifying_key
            .verify(message, &signature)
            .map_err(|err| EndorsementError::SignatureError(err.to_string()))
    }
}
