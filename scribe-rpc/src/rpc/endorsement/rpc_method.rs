use crate::common::types::CommonError;
use crate::rpc::shared::method::{method_path, RpcMethodBuilder};
use crate::rpc::shared::types::RpcMethod;

const METHOD_RECEIVE_MESSAGE: &str = "endorsement.agent.receive_message";
const METHOD_ENDORSE: &str = "endorsement.domain.endorse";
const METHOD_REFUSE: &str = "endorsement.domain.refuse";
const METHOD_RESEND: &str = "endorsement.domain.resend";
const METHOD_REQUEST_RESEND: &str = "endorsement.domain.request_resend";
const METHOD_CANCEL: &str = "endorsement.domain.cancel";
const METHOD_GET_TRANSACTION: &str = "endorsement.domain.get_transaction";
const METHOD_LIST_TRANSACTIONS: &str = "endorsement.domain.list_transactions";

#[derive(Clone, Debug, PartialEq)]
pub enum Method {
    ReceiveMessage,
    Endorse,
    Refuse,
    Resend,
    RequestResend,
    Cancel,
    GetTransaction,
    ListTransactions,
}

impl Method {
    pub fn all() -> Vec<Method> {
        vec![
            Method::ReceiveMessage,
            Method::Endorse,
            Method::Refuse,
            Method::Resend,
            Method::RequestResend,
            Method::Cancel,
            Method::GetTransaction,
            Method::ListTransactions,
        ]
    }
}

impl RpcMethodBuilder for Method {
    fn build_path(&self) -> &str {
        match self {
            Method::ReceiveMessage => METHOD_RECEIVE_MESSAGE,
            Method::Endorse => METHOD_ENDORSE,
            Method::Refuse => METHOD_REFUSE,
            Method::Resend => METHOD_RESEND,
            Method::RequestResend => METHOD_REQUEST_RESEND,
            Method::Cancel => METHOD_CANCEL,
            Method::GetTransaction => METHOD_GET_TRANSACTION,
            Method::ListTransactions => METHOD_LIST_TRANSACTIONS,
        }
    }
}

impl TryFrom<RpcMethod> for Method {
    type Error = CommonError;

    fn try_from(value: RpcMethod) -> Result<Self, Self::Error> {
        let path = method_path(&value)
            .ok_or(CommonError::MethodError(format!("unknown method: {}", value)))?;

        match path.as_str() {
            METHOD_RECEIVE_MESSAGE => Ok(Self::ReceiveMessage),
            METHOD_ENDORSE => Ok(Self::Endorse),
            METHOD_REFUSE => Ok(Self::Refuse),
            METHOD_RESEND => Ok(Self::Resend),
            METHOD_REQUEST_RESEND => Ok(Self::RequestResend),
            METHOD_CANCEL => Ok(Self::Cancel),
            METHOD_GET_TRANSACTION => Ok(Self::GetTransaction),
            METHOD_LIST_TRANSACTIONS => Ok(Self::ListTransactions),
            _ => Err(CommonError::MethodError(format!("unknown method: {}", value))),
        }
    }
}
