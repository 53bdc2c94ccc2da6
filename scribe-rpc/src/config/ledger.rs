use serde::Deserialize;

use crate::common::types::{CommonError, ToValidate};

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Ledger {
    pub(crate) endpoint: String,
}

impl Ledger {
    pub fn get_endpoint(&self) -> String {
        self.endpoint.to_owned()
    }
}

impl ToValidate for Ledger {
    fn validate(&self) -> Result<(), CommonError> {
        if self.endpoint.is_empty() {
            return Err(CommonError::ValidationError(
                "config: ledger:endpoint is missing".to_string(),
            ));
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(CommonError::ValidationError(format!(
                "config: ledger:endpoint must be an http url: {}",
                self.endpoint
            )));
        }

        Ok(())
    }
}
