use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use super::domain::{FieldUpdate, Gender};
use super::locations::LocationCatalog;
use super::steps::StepRegistry;
use super::submission::{SubmissionOutcome, SubmissionPipeline};
use super::validation::Validation;
use super::wizard::{WizardController, WizardError, WizardView};

/// Identifier of one hosted wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value).map(Self)
    }
}

/// Wizard snapshot tagged with its session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub wizard: WizardView,
}

#[derive(Debug, Clone)]
pub struct AdvanceResult {
    pub validation: Validation,
    pub session: SessionView,
}

#[derive(Debug, Clone)]
pub struct SubmitResult {
    pub outcome: SubmissionOutcome,
    pub session: SessionView,
}

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;
type SessionTable = Arc<Mutex<HashMap<SessionId, SessionEntry>>>;

/// Outcome error reported when a submission task ends without a result.
pub const INTERRUPTED_SUBMISSION: &str = "submission was interrupted before it completed";

/// How long hosted sessions are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Unsubmitted sessions untouched for this long are dropped.
    pub idle_timeout: Duration,
    /// Submitted sessions stay readable for this long after submission.
    pub submitted_retention: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(2 * 60 * 60),
            submitted_retention: Duration::from_secs(15 * 60),
        }
    }
}

struct SessionEntry {
    controller: WizardController,
    touched_at: Instant,
    submitted_at: Option<Instant>,
}

impl SessionEntry {
    fn new(controller: WizardController, now: Instant) -> Self {
        Self {
            controller,
            touched_at: now,
            submitted_at: None,
        }
    }

    /// Sessions with a submission in flight never expire.
    fn is_expired(&self, policy: &SessionPolicy, now: Instant) -> bool {
        if self.controller.is_submitting() {
            return false;
        }
        match self.submitted_at {
            Some(at) => now.duration_since(at) >= policy.submitted_retention,
            None => now.duration_since(self.touched_at) >= policy.idle_timeout,
        }
    }

    fn view(&self, id: SessionId) -> SessionView {
        SessionView {
            session_id: id,
            wizard: self.controller.view(),
        }
    }
}

fn settle(
    sessions: &Mutex<HashMap<SessionId, SessionEntry>>,
    id: SessionId,
    outcome: &SubmissionOutcome,
) -> Option<SessionView> {
    let mut sessions = sessions.lock().unwrap_or_else(PoisonError::into_inner);
    let entry = sessions.get_mut(&id)?;
    entry.controller.finish_submission(outcome);
    let now = Instant::now();
    entry.touched_at = now;
    if entry.controller.is_submitted() {
        entry.submitted_at = Some(now);
    }
    Some(entry.view(id))
}

/// Marks a session's submission finished, with a failed outcome if the task
/// running it unwinds before reporting one.
struct InFlight {
    sessions: SessionTable,
    id: SessionId,
    settled: bool,
}

impl InFlight {
    fn settle(mut self, outcome: &SubmissionOutcome) -> Option<SessionView> {
        self.settled = true;
        settle(&self.sessions, self.id, outcome)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.settled {
            tracing::error!(session_id = %self.id, "submission task ended without an outcome");
            settle(
                &self.sessions,
                self.id,
                &SubmissionOutcome::failed(INTERRUPTED_SUBMISSION),
            );
        }
    }
}

/// Hosts wizard sessions and runs their submissions.
pub struct RegistrationService {
    registry: Arc<StepRegistry>,
    catalog: Arc<LocationCatalog>,
    pipeline: Arc<SubmissionPipeline>,
    sessions: SessionTable,
    policy: SessionPolicy,
    today: Clock,
}

impl RegistrationService {
    pub fn new(
        registry: Arc<StepRegistry>,
        catalog: Arc<LocationCatalog>,
        pipeline: Arc<SubmissionPipeline>,
    ) -> Self {
        Self {
            registry,
            catalog,
            pipeline,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            policy: SessionPolicy::default(),
            today: Arc::new(|| Local::now().date_naive()),
        }
    }

    /// Evaluates age rules against a fixed date instead of the local calendar.
    pub fn with_fixed_date(mut self, today: NaiveDate) -> Self {
        self.today = Arc::new(move || today);
        self
    }

    pub fn with_session_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &LocationCatalog {
        &self.catalog
    }

    /// Sessions currently held, including expired ones not yet purged.
    pub fn session_count(&self) -> usize {
        self.sessions
            .lock()
            .expect("session table mutex poisoned")
            .len()
    }

    fn with_session<T>(
        &self,
        id: &SessionId,
        operation: impl FnOnce(&mut WizardController) -> Result<T, WizardError>,
    ) -> Result<(T, SessionView), RegistrationServiceError> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().expect("session table mutex poisoned");
        if sessions
            .get(id)
            .is_some_and(|entry| entry.is_expired(&self.policy, now))
        {
            sessions.remove(id);
            tracing::info!(session_id = %id, "registration session expired");
            return Err(RegistrationServiceError::NotFound);
        }

        let entry = sessions
            .get_mut(id)
            .ok_or(RegistrationServiceError::NotFound)?;
        entry.touched_at = now;
        let value = operation(&mut entry.controller)?;
        Ok((value, entry.view(*id)))
    }

    /// Drops every expired session and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.lock().expect("session table mutex poisoned");
        purge(&mut sessions, &self.policy, Instant::now())
    }

    /// Purges expired sessions every `every` until the service is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let service = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(service) = service.upgrade() else {
                    break;
                };
                service.purge_expired();
            }
        })
    }

    pub fn create(&self) -> SessionView {
        let id = SessionId::new();
        let now = Instant::now();
        let controller = WizardController::new(Arc::clone(&self.registry), Arc::clone(&self.catalog));
        let entry = SessionEntry::new(controller, now);
        let view = entry.view(id);

        let mut sessions = self.sessions.lock().expect("session table mutex poisoned");
        purge(&mut sessions, &self.policy, now);
        sessions.insert(id, entry);
        tracing::info!(session_id = %id, "registration session started");
        view
    }

    pub fn view(&self, id: &SessionId) -> Result<SessionView, RegistrationServiceError> {
        self.with_session(id, |_| Ok(())).map(|(_, view)| view)
    }

    pub fn update_field(
        &self,
        id: &SessionId,
        update: FieldUpdate,
    ) -> Result<SessionView, RegistrationServiceError> {
        self.with_session(id, |controller| controller.update_field(update))
            .map(|(_, view)| view)
    }

    pub fn select_gender(
        &self,
        id: &SessionId,
        gender: Gender,
    ) -> Result<SessionView, RegistrationServiceError> {
        self.with_session(id, |controller| controller.select_gender(gender))
            .map(|(_, view)| view)
    }

    pub fn advance(&self, id: &SessionId) -> Result<AdvanceResult, RegistrationServiceError> {
        let today = (self.today)();
        self.with_session(id, |controller| controller.advance_on(today))
            .map(|(validation, session)| AdvanceResult {
                validation,
                session,
            })
    }

    pub fn retreat(&self, id: &SessionId) -> Result<SessionView, RegistrationServiceError> {
        self.with_session(id, WizardController::retreat)
            .map(|(_, view)| view)
    }

    pub fn skip(&self, id: &SessionId) -> Result<SessionView, RegistrationServiceError> {
        self.with_session(id, WizardController::skip)
            .map(|(_, view)| view)
    }

    /// Drops a session. Sessions with a submission in flight are kept.
    pub fn discard(&self, id: &SessionId) -> Result<(), RegistrationServiceError> {
        let mut sessions = self.sessions.lock().expect("session table mutex poisoned");
        match sessions.get(id) {
            None => Err(RegistrationServiceError::NotFound),
            Some(entry) if entry.controller.is_submitting() => {
                Err(WizardError::SubmissionInFlight.into())
            }
            Some(_) => {
                sessions.remove(id);
                tracing::info!(session_id = %id, "registration session discarded");
                Ok(())
            }
        }
    }

    /// Runs the submission pipeline without holding the session table lock.
    ///
    /// The pipeline runs on its own task, so the session is settled even when
    /// the caller stops waiting or the pipeline panics.
    pub async fn submit(&self, id: &SessionId) -> Result<SubmitResult, RegistrationServiceError> {
        let (record, _) = self.with_session(id, WizardController::begin_submission)?;

        let in_flight = InFlight {
            sessions: Arc::clone(&self.sessions),
            id: *id,
            settled: false,
        };
        let pipeline = Arc::clone(&self.pipeline);
        let session_id = *id;
        let task = tokio::spawn(async move {
            let outcome = pipeline.submit(&record).await;
            if outcome.success {
                tracing::info!(%session_id, "registration submitted");
            } else {
                tracing::warn!(
                    %session_id,
                    error = outcome.error.as_deref().unwrap_or_default(),
                    "registration submission failed"
                );
            }
            let session = in_flight.settle(&outcome);
            (outcome, session)
        });

        match task.await {
            Ok((outcome, Some(session))) => Ok(SubmitResult { outcome, session }),
            Ok((_, None)) => Err(RegistrationServiceError::NotFound),
            Err(err) => {
                tracing::error!(session_id = %id, error = %err, "submission task aborted");
                let session = self.view(id)?;
                Ok(SubmitResult {
                    outcome: SubmissionOutcome::failed(INTERRUPTED_SUBMISSION),
                    session,
                })
            }
        }
    }
}

fn purge(
    sessions: &mut HashMap<SessionId, SessionEntry>,
    policy: &SessionPolicy,
    now: Instant,
) -> usize {
    let before = sessions.len();
    sessions.retain(|_, entry| !entry.is_expired(policy, now));
    let purged = before - sessions.len();
    if purged > 0 {
        tracing::debug!(purged, "expired registration sessions dropped");
    }
    purged
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationServiceError {
    #[error("registration session not found")]
    NotFound,
    #[error(transparent)]
    Wizard(#[from] WizardError),
}
