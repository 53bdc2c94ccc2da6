use serde::Deserialize;

use crate::common::types::{CommonError, ToValidate};

#[derive(Deserialize, Debug, Clone)]
pub struct App {
    pub(crate) host: String,
    pub(crate) port: String,
}

impl App {
    pub fn get_app_config(&self) -> (String, String) {
        (self.host.to_owned(), self.port.to_owned())
    }
}

impl Default for App {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: "8080".to_string(),
        }
    }
}

impl ToValidate for App {
    fn validate(&self) -> Result<(), CommonError> {
        if self.host.is_empty() {
            return Err(CommonError::ValidationError(
                "config: app:host is missing".to_string(),
            ));
        }

        if self.port.parse::<u16>().is_err() {
            return Err(CommonError::ValidationError(format!(
                "config: app:port is invalid: {}",
                self.port
            )));
        }

        Ok(())
    }
}
