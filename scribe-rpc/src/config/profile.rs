use serde::Deserialize;

use prople_scribe_core::profile::types::ProfileSettings;
use prople_scribe_core::profile::Profile as AgentProfile;

use crate::common::types::{CommonError, ToValidate};

/// `Profile` is the acting wallet profile section
///
/// The `role`, `endorser` and `policy` keys are read straight into the typed
/// [`ProfileSettings`], settings that don't apply to the configured role are carried but ignored.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Profile {
    pub(crate) name: String,
    pub(crate) did: String,

    #[serde(flatten)]
    pub(crate) settings: ProfileSettings,
}

impl Profile {
    pub fn build(&self) -> Result<AgentProfile, CommonError> {
        AgentProfile::new(
            self.name.to_owned(),
            self.did.to_owned(),
            self.settings.to_owned(),
        )
        .map_err(|err| CommonError::ValidationError(format!("config: profile: {}", err)))
    }
}

impl ToValidate for Profile {
    fn validate(&self) -> Result<(), CommonError> {
        if self.name.is_empty() {
            return Err(CommonError::ValidationError(
                "config: profile:name is missing".to_string(),
            ));
        }

        if self.did.is_empty() {
            return Err(CommonError::ValidationError(
                "config: profile:did is missing".to_string(),
            ));
        }

        self.settings
            .validate()
            .map_err(|err| CommonError::ValidationError(format!("config: profile: {}", err)))
    }
}
