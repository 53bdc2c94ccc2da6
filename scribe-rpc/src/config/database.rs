use serde::Deserialize;

use crate::common::types::{CommonError, ToValidate};

#[derive(Deserialize, Debug, Clone)]
pub struct RocksDBCommon {
    pub(crate) path: String,
    pub(crate) cf_name: String,
}

impl RocksDBCommon {
    pub fn new(path: String, cf_name: String) -> Self {
        Self { path, cf_name }
    }

    pub fn get(&self) -> (String, String) {
        (self.path.to_owned(), self.cf_name.to_owned())
    }
}

impl Default for RocksDBCommon {
    fn default() -> Self {
        Self {
            path: "./db".to_string(),
            cf_name: "".to_string(),
        }
    }
}

impl ToValidate for RocksDBCommon {
    fn validate(&self) -> Result<(), CommonError> {
        if self.path.is_empty() {
            return Err(CommonError::ValidationError(
                "config: rocksdbcommon:path is missing".to_string(),
            ));
        }

        if self.cf_name.is_empty() {
            return Err(CommonError::ValidationError(
                "config: rocksdbcommon:cf_name is missing".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct RocksDBOptions {
    pub(crate) create_if_missing: bool,
    pub(crate) create_missing_columns: bool,
    pub(crate) set_error_if_exists: bool,
    pub(crate) set_wal_dir: String,
}

impl RocksDBOptions {
    pub fn new(wal_dir: String) -> Self {
        Self {
            set_wal_dir: wal_dir,
            ..Default::default()
        }
    }

    pub fn get_create_if_missing(&self) -> bool {
        self.create_if_missing
    }

    pub fn get_create_missing_columns(&self) -> bool {
        self.create_missing_columns
    }

    pub fn get_set_error_if_exists(&self) -> bool {
        self.set_error_if_exists
    }

    pub fn get_set_wal_dir(&self) -> String {
        self.set_wal_dir.to_owned()
    }
}

impl Default for RocksDBOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            create_missing_columns: true,
            set_error_if_exists: false,
            set_wal_dir: "".to_string(),
        }
    }
}

impl ToValidate for RocksDBOptions {
    fn validate(&self) -> Result<(), CommonError> {
        if self.set_wal_dir.is_empty() {
            return Err(CommonError::ValidationError(
                "config: rocksdboptions:wal_dir is missing".to_string(),
            ));
        }

        Ok(())
    }
}

/// `Database` is the single RocksDB instance shared by the transaction and connection stores
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Database {
    pub(crate) common: RocksDBCommon,
    pub(crate) options: RocksDBOptions,
}

impl Database {
    pub fn get_common(&self) -> RocksDBCommon {
        self.common.to_owned()
    }

    pub fn get_db_options(&self) -> RocksDBOptions {
        self.options.to_owned()
    }
}

impl ToValidate for Database {
    fn validate(&self) -> Result<(), CommonError> {
        self.common.validate()?;
        self.options.validate()?;

        Ok(())
    }
}
