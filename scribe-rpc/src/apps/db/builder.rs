use std::sync::Arc;

use rocksdb::{Options, DB};

use crate::common::types::CommonError;
use crate::config::{Config, RocksDBCommon, RocksDBOptions};

use super::Runner;

pub struct Builder {
    cfg: Config,
}

impl Builder {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    pub fn build(
        &mut self,
        db_callback: impl FnOnce(&Config) -> (RocksDBCommon, RocksDBOptions),
    ) -> Result<Runner, CommonError> {
        let (opts_common, opts_db) = db_callback(&self.cfg);
        let (opts_path, opts_cf_name) = opts_common.get();

        let mut opts = Options::default();
        opts.create_if_missing(opts_db.get_create_if_missing());
        opts.create_missing_column_families(opts_db.get_create_missing_columns());
        opts.set_error_if_exists(opts_db.get_set_error_if_exists());
        opts.set_wal_dir(opts_db.get_set_wal_dir());

        let db = DB::open_cf(&opts, opts_path, vec![opts_cf_name.to_owned()])
            .map_err(|err| CommonError::DbError(err.to_string()))?;

        Ok(Runner::new(Arc::new(db), opts_cf_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::helpers::testdb;

    #[test]
    fn test_build_error_if_exists() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().display().to_string();
        let common = RocksDBCommon::new(format!("{}/db", base), "scribe-cf".to_string());

        let first = Builder::new(testdb::global_config().to_owned())
            .build(|_| (common.clone(), RocksDBOptions::new(format!("{}/wal", base))));
        assert!(first.is_ok());
        drop(first);

        let mut strict = RocksDBOptions::new(format!("{}/wal", base));
        strict.set_error_if_exists = true;

        let second =
            Builder::new(testdb::global_config().to_owned()).build(|_| (common.clone(), strict));
        assert!(matches!(second.unwrap_err(), CommonError::DbError(_)));
    }
}
