use log::debug;
use serde::{Deserialize, Serialize};

use crate::connection::types::{ConnectionEntityAccessor, ConnectionRegistry, Job};
use crate::connection::Connection;
use crate::profile::Profile;

use super::types::EndorsementError;

/// `EndorsementDecision` tells a write-intent producer whether its write must be endorsed
///
/// A decision that requires endorsement always carries the endorser connection id, the
/// constructors are the only way to build one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EndorsementDecision {
    requires_endorsement: bool,
    endorser_connection_id: Option<String>,
}

impl EndorsementDecision {
    pub fn not_required() -> Self {
        Self {
            requires_endorsement: false,
            endorser_connection_id: None,
        }
    }

    pub fn required(endorser_connection_id: String) -> Self {
        Self {
            requires_endorsement: true,
            endorser_connection_id: Some(endorser_connection_id),
        }
    }

    pub fn requires_endorsement(&self) -> bool {
        self.requires_endorsement
    }

    pub fn endorser_connection_id(&self) -> Option<String> {
        self.endorser_connection_id.to_owned()
    }
}

/// `EndorserDiscovery` resolves the endorser connection of an author profile
///
/// Candidates are the ready connections owned by the profile's DID whose counterparty plays the
/// [`Job::Endorser`] part, narrowed by the configured alias when there is one. When several
/// candidates remain the most recently assigned one wins, ties are broken by the connection id.
#[derive(Clone)]
pub struct EndorserDiscovery<TRegistry>
where
    TRegistry: ConnectionRegistry,
{
    registry: TRegistry,
}

impl<TRegistry> EndorserDiscovery<TRegistry>
where
    TRegistry: ConnectionRegistry,
{
    pub fn new(registry: TRegistry) -> Self {
        Self { registry }
    }

    pub async fn decide(&self, profile: &Profile) -> Result<EndorsementDecision, EndorsementError> {
        if !profile.is_author() {
            return Ok(EndorsementDecision::not_required());
        }

        let connections = self
            .registry
            .list_connections()
            .await
            .map_err(|err| EndorsementError::RepoError(err.to_string()))?;

        let alias = profile.get_settings().endorser_alias();
        let selected = connections
            .into_iter()
            .filter(|conn| conn.is_ready())
            .filter(|conn| conn.get_their_job() == Some(Job::Endorser))
            .filter(|conn| conn.get_my_did() == profile.get_did())
            .filter(|conn| match &alias {
                Some(alias) => conn.get_alias().as_ref() == Some(alias),
                None => true,
            })
            .max_by(|a, b| rank(a, b));

        match selected {
            Some(conn) => {
                debug!(
                    "[endorsement:decide] profile: {} endorser: {}",
                    profile.get_name(),
                    conn.get_id()
                );
                Ok(EndorsementDecision::required(conn.get_id()))
            }
            None => Err(EndorsementError::EndorserConnectionNotFound(format!(
                "no ready endorser connection for profile: {}",
                profile.get_name()
            ))),
        }
    }
}

fn rank(a: &Connection, b: &Connection) -> std::cmp::Ordering {
    a.get_job_assigned_at()
        .cmp(&b.get_job_assigned_at())
        .then_with(|| a.get_id().cmp(&b.get_id()))
}
