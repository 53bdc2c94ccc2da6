use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DbError {
    #[error("db error: {0}")]
    ExecError(String),

    #[error("cf handler failed: {0}")]
    CfHandleError(String),

    #[error("task error: {0}")]
    TaskError(String),
}

pub enum Instruction {
    SaveCf { key: String, value: Vec<u8> },
    GetCf { key: String },
    MultiGetCf { keys: Vec<String> },
    RemoveCf { key: String },

    /// Every value whose key starts with `prefix`, in key order
    ScanPrefixCf { prefix: String },
}

#[derive(Debug)]
pub enum OutputOpts {
    SingleByte {
        value: Option<Vec<u8>>,
    },
    MultiBytes {
        values: Vec<Result<Option<Vec<u8>>, DbError>>,
    },
    Entries {
        values: Vec<(String, Vec<u8>)>,
    },
    None,
}

impl OutputOpts {
    pub fn is_none(&self) -> bool {
        matches!(self, OutputOpts::None)
    }
}
