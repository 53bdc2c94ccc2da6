use crate::common::types::CommonError;
use crate::rpc::shared::method::{method_path, RpcMethodBuilder};
use crate::rpc::shared::types::RpcMethod;

const METHOD_NOTIFY_REGISTRY: &str = "revocation.domain.notify_registry";
const METHOD_NOTIFY_ENTRY: &str = "revocation.domain.notify_entry";
const METHOD_NOTIFY_TAILS: &str = "revocation.domain.notify_tails";
const METHOD_NOTIFY_ISSUER_REVOKED: &str = "revocation.domain.notify_issuer_revoked";
const METHOD_SAVE_ISSUER_RECORD: &str = "revocation.domain.save_issuer_record";

#[derive(Clone, Debug, PartialEq)]
pub enum Method {
    NotifyRegistry,
    NotifyEntry,
    NotifyTails,
    NotifyIssuerRevoked,
    SaveIssuerRecord,
}

impl Method {
    pub fn all() -> Vec<Method> {
        vec![
            Method::NotifyRegistry,
            Method::NotifyEntry,
            Method::NotifyTails,
            Method::NotifyIssuerRevoked,
            Method::SaveIssuerRecord,
        ]
    }
}

impl RpcMethodBuilder for Method {
    fn build_path(&self) -> &str {
        match self {
            Method::NotifyRegistry => METHOD_NOTIFY_REGISTRY,
            Method::NotifyEntry => METHOD_NOTIFY_ENTRY,
            Method::NotifyTails => METHOD_NOTIFY_TAILS,
            Method::NotifyIssuerRevoked => METHOD_NOTIFY_ISSUER_REVOKED,
            Method::SaveIssuerRecord => METHOD_SAVE_ISSUER_RECORD,
        }
    }
}

impl TryFrom<RpcMethod> for Method {
    type Error = CommonError;

    fn try_from(value: RpcMethod) -> Result<Self, Self::Error> {
        let path = method_path(&value)
            .ok_or(CommonError::MethodError(format!("unknown method: {}", value)))?;

        match path.as_str() {
            METHOD_NOTIFY_REGISTRY => Ok(Self::NotifyRegistry),
            METHOD_NOTIFY_ENTRY => Ok(Self::NotifyEntry),
            METHOD_NOTIFY_TAILS => Ok(Self::NotifyTails),
            METHOD_NOTIFY_ISSUER_REVOKED => Ok(Self::NotifyIssuerRevoked),
            METHOD_SAVE_ISSUER_RECORD => Ok(Self::SaveIssuerRecord),
            _ => Err(CommonError::MethodError(format!("unknown method: {}", value))),
        }
    }
}
