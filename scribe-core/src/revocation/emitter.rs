use log::debug;
use serde_json::{json, Value};

use crate::connection::types::ConnectionRegistry;
use crate::endorsement::EndorserDiscovery;
use crate::events::types::{EventCategory, Topic};
use crate::events::Notifier;
use crate::profile::Profile;

use super::types::{
    EndorserMetadata, IssuerCredRevRecord, IssuerCredRevRepoBuilder, Processing,
    RegistryEventOptions, RevocationError, RevocationEvent,
};

/// `RevocationEmitter` publishes revocation write intents
///
/// The endorsement decision for registry, entry and tails events is computed here, once, before
/// the event is published. Listeners only read the `endorser` metadata. A failing decision aborts
/// the event, nothing is published. Whether the write itself succeeded is reported later under
/// the `TRANSACTION_OUTCOME` category.
#[derive(Clone)]
pub struct RevocationEmitter<TRegistry, TIssuerRepo>
where
    TRegistry: ConnectionRegistry,
    TIssuerRepo: IssuerCredRevRepoBuilder,
{
    discovery: EndorserDiscovery<TRegistry>,
    notifier: Notifier,
    issuer_repo: TIssuerRepo,
}

impl<TRegistry, TIssuerRepo> RevocationEmitter<TRegistry, TIssuerRepo>
where
    TRegistry: ConnectionRegistry,
    TIssuerRepo: IssuerCredRevRepoBuilder,
{
    pub fn new(
        discovery: EndorserDiscovery<TRegistry>,
        notifier: Notifier,
        issuer_repo: TIssuerRepo,
    ) -> Self {
        Self {
            discovery,
            notifier,
            issuer_repo,
        }
    }

    pub async fn notify_revocation_reg_event(
        &self,
        profile: &Profile,
        cred_def_id: String,
        rev_reg_size: u32,
        options: RegistryEventOptions,
    ) -> Result<RevocationEvent, RevocationError> {
        if cred_def_id.is_empty() {
            return Err(RevocationError::ValidationError(
                "cred_def_id was missing".to_string(),
            ));
        }

        let mut event = RevocationEvent {
            context: json!({
                "cred_def_id": cred_def_id,
                "support_revocation": true,
                "rev_reg_size": rev_reg_size,
            }),
            processing: Some(Processing {
                auto_create_rev_reg: options.auto_create_rev_reg,
                create_pending_rev_reg: options.create_pending_rev_reg,
            }),
            endorser: options
                .endorser_connection_id
                .filter(|id| !id.is_empty())
                .map(|connection_id| EndorserMetadata { connection_id }),
        };

        self.attach_endorser(profile, &mut event).await?;
        self.publish(
            profile,
            Topic::new(EventCategory::RevocationRegistry, cred_def_id),
            &event,
        )
        .await?;

        Ok(event)
    }

    pub async fn notify_revocation_entry_event(
        &self,
        profile: &Profile,
        rev_reg_id: String,
        event: RevocationEvent,
    ) -> Result<RevocationEvent, RevocationError> {
        self.notify_rev_reg_scoped(profile, EventCategory::RevocationEntry, rev_reg_id, event)
            .await
    }

    pub async fn notify_revocation_tails_file_event(
        &self,
        profile: &Profile,
        rev_reg_id: String,
        event: RevocationEvent,
    ) -> Result<RevocationEvent, RevocationError> {
        self.notify_rev_reg_scoped(profile, EventCategory::RevocationTails, rev_reg_id, event)
            .await
    }

    /// `save_issuer_record` keeps the issuer's record of an issued credential's registry index
    pub async fn save_issuer_record(
        &self,
        record: IssuerCredRevRecord,
    ) -> Result<IssuerCredRevRecord, RevocationError> {
        if record.rev_reg_id.is_empty() || record.cred_rev_id.is_empty() {
            return Err(RevocationError::ValidationError(
                "rev_reg_id and cred_rev_id are required".to_string(),
            ));
        }

        self.issuer_repo.save_record(&record).await?;
        Ok(record)
    }

    /// `notify_issuer_credential_revoked_event` publishes the issuer's revocation record
    ///
    /// The record is loaded by `(rev_reg_id, cred_rev_id)` when the caller doesn't supply it. No
    /// ledger write follows this event so no endorsement decision is attached.
    pub async fn notify_issuer_credential_revoked_event(
        &self,
        profile: &Profile,
        rev_reg_id: String,
        cred_rev_id: String,
        record: Option<IssuerCredRevRecord>,
    ) -> Result<IssuerCredRevRecord, RevocationError> {
        if cred_rev_id.is_empty() {
            return Err(RevocationError::ValidationError(
                "cred_rev_id was missing".to_string(),
            ));
        }

        let record = match record {
            Some(record) => record,
            None => {
                self.issuer_repo
                    .retrieve_by_ids(rev_reg_id, cred_rev_id.to_owned())
                    .await?
            }
        };

        let metadata =
            serde_json::to_value(&record).map_err(|err| RevocationError::JSONError(err.to_string()))?;

        self.notifier
            .notify(
                profile,
                Topic::new(EventCategory::IssuerRevoke, cred_rev_id),
                metadata,
            )
            .await
            .map_err(|err| RevocationError::EventError(err.to_string()))?;

        Ok(record)
    }

    async fn notify_rev_reg_scoped(
        &self,
        profile: &Profile,
        category: EventCategory,
        rev_reg_id: String,
        mut event: RevocationEvent,
    ) -> Result<RevocationEvent, RevocationError> {
        if rev_reg_id.is_empty() {
            return Err(RevocationError::ValidationError(
                "rev_reg_id was missing".to_string(),
            ));
        }

        self.attach_endorser(profile, &mut event).await?;
        self.publish(profile, Topic::new(category, rev_reg_id), &event)
            .await?;

        Ok(event)
    }

    async fn attach_endorser(
        &self,
        profile: &Profile,
        event: &mut RevocationEvent,
    ) -> Result<(), RevocationError> {
        if event.endorser.is_some() {
            return Ok(());
        }

        let decision = self.discovery.decide(profile).await?;
        if let Some(connection_id) = decision.endorser_connection_id() {
            event.endorser = Some(EndorserMetadata { connection_id });
        }

        Ok(())
    }

    async fn publish(
        &self,
        profile: &Profile,
        topic: Topic,
        event: &RevocationEvent,
    ) -> Result<(), RevocationError> {
        debug!(
            "[revocation:notify] topic: {} endorser: {:?}",
            topic,
            event.endorser_connection_id()
        );

        let metadata: Value =
            serde_json::to_value(event).map_err(|err| RevocationError::JSONError(err.to_string()))?;

        self.notifier
            .notify(profile, topic, metadata)
            .await
            .map_err(|err| RevocationError::EventError(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;
    use tokio::sync::Mutex;

    use crate::connection::types::Job;
    use crate::endorsement::fakes::{ready_connection, MemoryRegistry};
    use crate::endorsement::types::EndorsementError;
    use crate::events::types::{Event, EventError, Listener};
    use crate::events::EventBus;
    use crate::profile::types::{ProfileSettings, Role};
    use crate::revocation::types::IssuerCredRevState;

    mock!(
        FakeIssuerRepo{}

        impl Clone for FakeIssuerRepo {
            fn clone(&self) -> Self;
        }

        #[async_trait]
        impl IssuerCredRevRepoBuilder for FakeIssuerRepo {
            async fn save_record(&self, record: &IssuerCredRevRecord) -> Result<(), RevocationError>;

            async fn retrieve_by_ids(
                &self,
                rev_reg_id: String,
                cred_rev_id: String,
            ) -> Result<IssuerCredRevRecord, RevocationError>;
        }
    );

    #[derive(Clone, Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<Event>>>,
    }

    #[async_trait]
    impl Listener for Recorder {
        async fn on_event(&self, event: Event) -> Result<(), EventError> {
            self.events.lock().await.push(event);
            Ok(())
        }
    }

    fn profile(role: Role) -> Profile {
        Profile::new(
            "issuer".to_string(),
            "did:prople:author".to_string(),
            ProfileSettings::new(role),
        )
        .unwrap()
    }

    fn record() -> IssuerCredRevRecord {
        IssuerCredRevRecord {
            record_id: "rec-1".to_string(),
            state: IssuerCredRevState::Revoked,
            cred_ex_id: Some("cx-1".to_string()),
            rev_reg_id: "RR1".to_string(),
            cred_rev_id: "7".to_string(),
            cred_def_id: Some("CD1".to_string()),
        }
    }

    async fn emitter_with(
        registry: MemoryRegistry,
        issuer_repo: MockFakeIssuerRepo,
    ) -> (RevocationEmitter<MemoryRegistry, MockFakeIssuerRepo>, Recorder) {
        let bus = EventBus::new();
        let recorder = Recorder::default();
        bus.subscribe(
            vec![
                EventCategory::RevocationRegistry,
                EventCategory::RevocationEntry,
                EventCategory::RevocationTails,
                EventCategory::IssuerRevoke,
            ],
            Arc::new(recorder.clone()),
        )
        .await
        .unwrap();

        let emitter = RevocationEmitter::new(
            EndorserDiscovery::new(registry),
            Notifier::new(bus),
            issuer_repo,
        );
        (emitter, recorder)
    }

    fn endorser_registry() -> MemoryRegistry {
        MemoryRegistry::with(vec![ready_connection(
            "E1",
            "did:prople:author",
            "did:prople:endorser",
            Job::Endorser,
        )])
    }

    #[tokio::test]
    async fn test_registry_event_for_author() {
        let (emitter, recorder) =
            emitter_with(endorser_registry(), MockFakeIssuerRepo::new()).await;

        let event = emitter
            .notify_revocation_reg_event(
                &profile(Role::Author),
                "CD1".to_string(),
                100,
                RegistryEventOptions {
                    auto_create_rev_reg: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(event.endorser_connection_id(), Some("E1".to_string()));

        let events = recorder.events.lock().await;
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].topic.to_string(),
            "scribe::REVOCATION::REGISTRY::CD1"
        );
        assert_eq!(events[0].payload["endorser"]["connection_id"], "E1");
        assert_eq!(events[0].payload["context"]["rev_reg_size"], 100);
        assert_eq!(events[0].payload["processing"]["auto_create_rev_reg"], true);
    }

    #[tokio::test]
    async fn test_registry_event_without_endorsement() {
        let (emitter, recorder) =
            emitter_with(MemoryRegistry::default(), MockFakeIssuerRepo::new()).await;

        for role in vec![Role::None, Role::Endorser] {
            let event = emitter
                .notify_revocation_reg_event(
                    &profile(role),
                    "CD1".to_string(),
                    10,
                    RegistryEventOptions::default(),
                )
                .await
                .unwrap();
            assert!(event.endorser.is_none());
        }

        let events = recorder.events.lock().await;
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.payload.get("endorser").is_none()));
    }

    #[tokio::test]
    async fn test_author_without_endorser_aborts() {
        let (emitter, recorder) =
            emitter_with(MemoryRegistry::default(), MockFakeIssuerRepo::new()).await;

        let result = emitter
            .notify_revocation_entry_event(
                &profile(Role::Author),
                "RR1".to_string(),
                RevocationEvent::new(json!({"rev_reg_id": "RR1"})),
            )
            .await;

        assert!(matches!(
            result,
            Err(RevocationError::EndorsementError(
                EndorsementError::EndorserConnectionNotFound(_)
            ))
        ));
        assert!(recorder.events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_explicit_endorser_skips_discovery() {
        let (emitter, recorder) =
            emitter_with(MemoryRegistry::default(), MockFakeIssuerRepo::new()).await;

        let event = emitter
            .notify_revocation_reg_event(
                &profile(Role::Author),
                "CD1".to_string(),
                10,
                RegistryEventOptions {
                    endorser_connection_id: Some("E-explicit".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(event.endorser_connection_id(), Some("E-explicit".to_string()));
        assert_eq!(recorder.events.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_tails_event_topic() {
        let (emitter, recorder) =
            emitter_with(endorser_registry(), MockFakeIssuerRepo::new()).await;

        emitter
            .notify_revocation_tails_file_event(
                &profile(Role::Author),
                "RR1".to_string(),
                RevocationEvent::new(json!({"tails_public_uri": "http://tails/RR1"})),
            )
            .await
            .unwrap();

        let events = recorder.events.lock().await;
        assert_eq!(events[0].topic.to_string(), "scribe::REVOCATION::TAILS::RR1");
        assert_eq!(events[0].payload["endorser"]["connection_id"], "E1");
    }

    #[tokio::test]
    async fn test_validation() {
        let (emitter, _) = emitter_with(endorser_registry(), MockFakeIssuerRepo::new()).await;

        let result = emitter
            .notify_revocation_entry_event(&profile(Role::Author), "".to_string(), RevocationEvent::default())
            .await;
        assert!(matches!(result, Err(RevocationError::ValidationError(_))));

        let result = emitter
            .notify_revocation_reg_event(
                &profile(Role::Author),
                "".to_string(),
                1,
                RegistryEventOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(RevocationError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_issuer_revoke_loads_record() {
        let mut repo = MockFakeIssuerRepo::new();
        repo.expect_retrieve_by_ids()
            .with(eq("RR1".to_string()), eq("7".to_string()))
            .times(1)
            .returning(|_, _| Ok(record()));

        let (emitter, recorder) = emitter_with(MemoryRegistry::default(), repo).await;
        let loaded = emitter
            .notify_issuer_credential_revoked_event(
                &profile(Role::Author),
                "RR1".to_string(),
                "7".to_string(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(loaded, record());

        let events = recorder.events.lock().await;
        assert_eq!(
            events[0].topic.to_string(),
            "scribe::REVOCATION::issuer::revoke::7"
        );
        assert_eq!(events[0].payload["state"], "revoked");
        assert!(events[0].payload.get("endorser").is_none());
    }

    #[tokio::test]
    async fn test_issuer_revoke_with_record() {
        let mut repo = MockFakeIssuerRepo::new();
        repo.expect_retrieve_by_ids().times(0);

        let (emitter, recorder) = emitter_with(MemoryRegistry::default(), repo).await;
        emitter
            .notify_issuer_credential_revoked_event(
                &profile(Role::None),
                "RR1".to_string(),
                "7".to_string(),
                Some(record()),
            )
            .await
            .unwrap();

        assert_eq!(recorder.events.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_issuer_revoke_missing_record() {
        let mut repo = MockFakeIssuerRepo::new();
        repo.expect_retrieve_by_ids()
            .returning(|_, _| Err(RevocationError::RecordNotFound("RR1:7".to_string())));

        let (emitter, recorder) = emitter_with(MemoryRegistry::default(), repo).await;
        let result = emitter
            .notify_issuer_credential_revoked_event(
                &profile(Role::None),
                "RR1".to_string(),
                "7".to_string(),
                None,
            )
            .await;

        assert!(matches!(result, Err(RevocationError::RecordNotFound(_))));
        assert!(recorder.events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_issuer_record() {
        let mut repo = MockFakeIssuerRepo::new();
        repo.expect_save_record()
            .withf(|saved| saved.rev_reg_id == "RR1" && saved.cred_rev_id == "7")
            .times(1)
            .returning(|_| Ok(()));

        let (emitter, recorder) = emitter_with(MemoryRegistry::default(), repo).await;
        let saved = emitter.save_issuer_record(record()).await.unwrap();
        assert_eq!(saved, record());
        assert!(recorder.events.lock().await.is_empty());

        let mut missing_index = record();
        missing_index.cred_rev_id = String::new();
        let result = emitter.save_issuer_record(missing_index).await;
        assert!(matches!(result, Err(RevocationError::ValidationError(_))));
    }
}
