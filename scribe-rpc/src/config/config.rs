use serde::Deserialize;

use crate::common::types::{CommonError, ToValidate};

use super::{App, Database, Ledger, Profile, Signer};

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub(crate) database: Database,
    pub(crate) app: App,
    pub(crate) profile: Profile,
    pub(crate) ledger: Ledger,
    pub(crate) signer: Signer,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn db(&self) -> &Database {
        &self.database
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }
}

impl ToValidate for Config {
    fn validate(&self) -> Result<(), CommonError> {
        self.app.validate()?;
        self.database.validate()?;
        self.profile.validate()?;
        self.ledger.validate()?;
        self.signer.validate()?;

        Ok(())
    }
}
