use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use prople_scribe_core::connection::types::ConnectionRegistry;
use prople_scribe_core::profile::Profile;
use prople_scribe_core::revocation::types::{
    EndorserMetadata, IssuerCredRevRepoBuilder, RegistryEventOptions, RevocationError,
    RevocationEvent,
};
use prople_scribe_core::revocation::RevocationEmitter;

use crate::rpc::shared::method::build_rpc_method;
use crate::rpc::shared::types::{
    RPCService, RpcError, RpcHandler, RpcHandlerOutput, RpcMethod, RpcRoute,
};

use super::rpc_method::Method;
use super::rpc_param::{Domain, Param};

fn handler_error(err: RevocationError) -> RpcError {
    RpcError::HandlerError(err.to_string())
}

fn scoped_event(context: Value, endorser_connection_id: Option<String>) -> RevocationEvent {
    RevocationEvent {
        context,
        processing: None,
        endorser: endorser_connection_id
            .filter(|id| !id.is_empty())
            .map(|connection_id| EndorserMetadata { connection_id }),
    }
}

/// `RevocationHandler` lets the operator raise revocation write intents for the acting profile
#[derive(Clone)]
pub struct RevocationHandler<TRegistry, TIssuerRepo>
where
    TRegistry: ConnectionRegistry,
    TIssuerRepo: IssuerCredRevRepoBuilder,
{
    profile: Profile,
    emitter: RevocationEmitter<TRegistry, TIssuerRepo>,
}

impl<TRegistry, TIssuerRepo> RevocationHandler<TRegistry, TIssuerRepo>
where
    TRegistry: ConnectionRegistry,
    TIssuerRepo: IssuerCredRevRepoBuilder,
{
    pub fn new(profile: Profile, emitter: RevocationEmitter<TRegistry, TIssuerRepo>) -> Self {
        Self { profile, emitter }
    }

    async fn notify(&self, method: Method, domain: Domain) -> RpcHandlerOutput {
        let output = match (method, domain) {
            (
                Method::NotifyRegistry,
                Domain::NotifyRegistry {
                    cred_def_id,
                    rev_reg_size,
                    auto_create_rev_reg,
                    create_pending_rev_reg,
                    endorser_connection_id,
                },
            ) => {
                let options = RegistryEventOptions {
                    auto_create_rev_reg,
                    create_pending_rev_reg,
                    endorser_connection_id,
                };

                let event = self
                    .emitter
                    .notify_revocation_reg_event(&self.profile, cred_def_id, rev_reg_size, options)
                    .await
                    .map_err(handler_error)?;
                serde_json::to_value(event)
            }
            (
                Method::NotifyEntry,
                Domain::NotifyEntry {
                    rev_reg_id,
                    context,
                    endorser_connection_id,
                },
            ) => {
                let event = self
                    .emitter
                    .notify_revocation_entry_event(
                        &self.profile,
                        rev_reg_id,
                        scoped_event(context, endorser_connection_id),
                    )
                    .await
                    .map_err(handler_error)?;
                serde_json::to_value(event)
            }
            (
                Method::NotifyTails,
                Domain::NotifyTails {
                    rev_reg_id,
                    context,
                    endorser_connection_id,
                },
            ) => {
                let event = self
                    .emitter
                    .notify_revocation_tails_file_event(
                        &self.profile,
                        rev_reg_id,
                        scoped_event(context, endorser_connection_id),
                    )
                    .await
                    .map_err(handler_error)?;
                serde_json::to_value(event)
            }
            (
                Method::NotifyIssuerRevoked,
                Domain::NotifyIssuerRevoked {
                    rev_reg_id,
                    cred_rev_id,
                    record,
                },
            ) => {
                let record = self
                    .emitter
                    .notify_issuer_credential_revoked_event(
                        &self.profile,
                        rev_reg_id,
                        cred_rev_id,
                        record,
                    )
                    .await
                    .map_err(handler_error)?;
                serde_json::to_value(record)
            }
            (Method::SaveIssuerRecord, Domain::SaveIssuerRecord { record }) => {
                let record = self
                    .emitter
                    .save_issuer_record(record)
                    .await
                    .map_err(handler_error)?;
                serde_json::to_value(record)
            }
            _ => return Err(RpcError::InvalidParams),
        };

        output.map(Some).map_err(|_| RpcError::InternalError)
    }
}

#[async_trait]
impl<TRegistry, TIssuerRepo> RpcHandler for RevocationHandler<TRegistry, TIssuerRepo>
where
    TRegistry: ConnectionRegistry + 'static,
    TIssuerRepo: IssuerCredRevRepoBuilder + 'static,
{
    async fn call(&self, method: RpcMethod, params: Option<Value>) -> RpcHandlerOutput {
        let param_value = params.ok_or(RpcError::InvalidParams)?;
        let Param::Domain(domain) = Param::try_from(param_value).map_err(|_| RpcError::ParseError)?;
        let rpc_method = Method::try_from(method).map_err(|_| RpcError::MethodNotFound)?;

        self.notify(rpc_method, domain).await
    }
}

impl<TRegistry, TIssuerRepo> RPCService for RevocationHandler<TRegistry, TIssuerRepo>
where
    TRegistry: ConnectionRegistry + 'static,
    TIssuerRepo: IssuerCredRevRepoBuilder + 'static,
{
    fn routes(&self) -> Vec<RpcRoute> {
        let handler: Arc<dyn RpcHandler> = Arc::new(self.clone());
        Method::all()
            .into_iter()
            .map(|method| RpcRoute::new(build_rpc_method(method), handler.clone()))
            .collect()
    }
}
