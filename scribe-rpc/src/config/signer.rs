use serde::Deserialize;

use crate::common::types::{CommonError, ToValidate};

/// `Signer` holds the base64 encoded ed25519 seed of the profile's signing key
#[derive(Deserialize, Clone, Default)]
pub struct Signer {
    pub(crate) seed: String,
}

impl Signer {
    pub fn get_seed(&self) -> String {
        self.seed.to_owned()
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").field("seed", &"<redacted>").finish()
    }
}

impl ToValidate for Signer {
    fn validate(&self) -> Result<(), CommonError> {
        if self.seed.is_empty() {
            return Err(CommonError::ValidationError(
                "config: signer:seed is missing".to_string(),
            ));
        }

        Ok(())
    }
}
