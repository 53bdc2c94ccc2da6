use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `ProfileError` provides all specific error types relate with the profile settings
#[derive(Debug, PartialEq, Error, Clone)]
pub enum ProfileError {
    #[error("validation error: {0}")]
    ValidationError(String),
}

/// `Role` is the part a profile plays in the endorsement protocol
///
/// An [`Role::Author`] has no ledger write permission and must route every write through
/// its endorser. An [`Role::Endorser`] counter-signs transactions for its authors. A profile
/// with [`Role::None`] writes to the ledger directly.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Author,
    Endorser,
    #[default]
    None,
}

/// `EndorserSettings` is the endorser reference configured for an author profile
///
/// The `alias` narrows the candidate endorser connections, the `public_did` pins the signer
/// identity accepted from an endorsement response. Both are optional.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct EndorserSettings {
    #[serde(default)]
    pub alias: Option<String>,

    #[serde(default)]
    pub public_did: Option<String>,
}

/// `PolicySettings` used by an endorser profile to decide how incoming requests are handled
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PolicySettings {
    #[serde(default)]
    pub auto_endorse: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ProfileSettings {
    #[serde(default)]
    pub role: Role,

    #[serde(default)]
    pub endorser: Option<EndorserSettings>,

    #[serde(default)]
    pub policy: PolicySettings,
}

impl ProfileSettings {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            ..Default::default()
        }
    }

    pub fn with_endorser(mut self, endorser: EndorserSettings) -> Self {
        self.endorser = Some(endorser);
        self
    }

    pub fn with_policy(mut self, policy: PolicySettings) -> Self {
        self.policy = policy;
        self
    }

    pub fn endorser_alias(&self) -> Option<String> {
        self.endorser
            .as_ref()
            .and_then(|endorser| endorser.alias.to_owned())
            .filter(|alias| !alias.is_empty())
    }

    pub fn endorser_public_did(&self) -> Option<String> {
        self.endorser
            .as_ref()
            .and_then(|endorser| endorser.public_did.to_owned())
            .filter(|did| !did.is_empty())
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if let Some(endorser) = &self.endorser {
            if endorser.alias.as_ref().is_some_and(|alias| alias.trim().is_empty()) {
                return Err(ProfileError::ValidationError(
                    "endorser alias must not be blank".to_string(),
                ));
            }
        }

        Ok(())
    }
}
