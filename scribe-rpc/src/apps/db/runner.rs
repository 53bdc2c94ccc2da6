use std::sync::Arc;

use rocksdb::{Direction, IteratorMode, DB};
use tokio::task::spawn_blocking;

use super::types::{DbError, Instruction, OutputOpts};

/// `Runner` executes storage instructions against a single column family
///
/// RocksDB calls are blocking, each instruction runs on tokio's blocking pool.
#[derive(Clone)]
pub struct Runner {
    db: Arc<DB>,
    cf_name: String,
}

impl Runner {
    pub fn new(db: Arc<DB>, cf_name: String) -> Self {
        Self { db, cf_name }
    }

    pub fn get_cf_name(&self) -> String {
        self.cf_name.to_owned()
    }

    pub async fn exec(&self, instruction: Instruction) -> Result<OutputOpts, DbError> {
        let db = self.db.clone();
        let cf_name = self.cf_name.to_owned();

        spawn_blocking(move || {
            let cf = db
                .cf_handle(cf_name.as_str())
                .ok_or(DbError::CfHandleError(cf_name.to_owned()))?;

            match instruction {
                Instruction::SaveCf { key, value } => {
                    db.put_cf(cf, key, value)
                        .map_err(|err| DbError::ExecError(err.to_string()))?;

                    Ok(OutputOpts::None)
                }
                Instruction::GetCf { key } => {
                    let value = db
                        .get_cf(cf, key)
                        .map_err(|err| DbError::ExecError(err.to_string()))?;

                    Ok(OutputOpts::SingleByte { value })
                }
                Instruction::MultiGetCf { keys } => {
                    let values = db
                        .multi_get_cf(keys.iter().map(|key| (cf, key)))
                        .into_iter()
                        .map(|val| val.map_err(|err| DbError::ExecError(err.to_string())))
                        .collect();

                    Ok(OutputOpts::MultiBytes { values })
                }
                Instruction::RemoveCf { key } => {
                    db.delete_cf(cf, key)
                        .map_err(|err| DbError::ExecError(err.to_string()))?;

                    Ok(OutputOpts::None)
                }
                Instruction::ScanPrefixCf { prefix } => {
                    let mut values = Vec::new();
                    let iter = db.iterator_cf(
                        cf,
                        IteratorMode::From(prefix.as_bytes(), Direction::Forward),
                    );

                    for item in iter {
                        let (key, value) = item.map_err(|err| DbError::ExecError(err.to_string()))?;
                        if !key.starts_with(prefix.as_bytes()) {
                            break;
                        }

                        let key = String::from_utf8(key.to_vec())
                            .map_err(|err| DbError::ExecError(err.to_string()))?;
                        values.push((key, value.to_vec()));
                    }

                    Ok(OutputOpts::Entries { values })
                }
            }
        })
        .await
        .map_err(|err| DbError::TaskError(err.to_string()))?
    }
}
