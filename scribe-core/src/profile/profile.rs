use serde::{Deserialize, Serialize};

use super::types::{ProfileError, ProfileSettings, Role};

/// `Profile` is the acting wallet profile
///
/// The `name` partitions the record store, the `did` is the public identity used when the
/// profile signs or talks to its peers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Profile {
    pub(crate) name: String,
    pub(crate) did: String,
    pub(crate) settings: ProfileSettings,
}

impl Profile {
    pub fn new(name: String, did: String, settings: ProfileSettings) -> Result<Self, ProfileError> {
        if name.is_empty() {
            return Err(ProfileError::ValidationError(
                "profile name was missing".to_string(),
            ));
        }

        if did.is_empty() {
            return Err(ProfileError::ValidationError(
                "profile did was missing".to_string(),
            ));
        }

        settings.validate()?;
        Ok(Self {
            name,
            did,
            settings,
        })
    }

    pub fn get_name(&self) -> String {
        self.name.to_owned()
    }

    pub fn get_did(&self) -> String {
        self.did.to_owned()
    }

    pub fn get_settings(&self) -> &ProfileSettings {
        &self.settings
    }

    pub fn get_role(&self) -> Role {
        self.settings.role
    }

    pub fn is_author(&self) -> bool {
        self.settings.role == Role::Author
    }

    pub fn is_endorser(&self) -> bool {
        self.settings.role == Role::Endorser
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::types::EndorserSettings;

    #[test]
    fn test_build_profile() {
        let settings = ProfileSettings::new(Role::Author).with_endorser(EndorserSettings {
            alias: Some("endorser".to_string()),
            public_did: None,
        });

        let profile = Profile::new(
            "default".to_string(),
            "did:prople:author".to_string(),
            settings,
        );
        assert!(profile.is_ok());

        let profile = profile.unwrap();
        assert!(profile.is_author());
        assert!(!profile.is_endorser());
        assert_eq!(profile.get_name(), "default".to_string());
    }

    #[test]
    fn test_build_profile_validation_error() {
        let table = vec![
            ("", "did:prople:author", "name"),
            ("default", "", "did"),
        ];

        for (name, did, expected) in table {
            let profile = Profile::new(
                name.to_string(),
                did.to_string(),
                ProfileSettings::default(),
            );
            assert!(profile.is_err());

            let ProfileError::ValidationError(msg) = profile.unwrap_err();
            assert!(msg.contains(expected))
        }
    }
}
