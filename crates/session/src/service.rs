//! Storage-backed session execution.

use std::sync::Arc;

use forma_core::{
    AttemptInput, ExerciseId, LogNotifier, MeasurementType, Milestone, Notifier, SessionId, WorkoutSession,
};
use forma_storage::{Storage, StorageError};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::engine::{AttemptOutcome, FinalizeOutcome, SessionEngine};
use crate::error::SessionError;

/// Errors from session service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Storage failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The engine rejected the operation
    #[error(transparent)]
    Session(#[from] SessionError),

    /// No session stored under the id
    #[error("session not found: {0}")]
    NotFound(SessionId),
}

/// Session service over a shared store.
///
/// Every mutation loads the session, applies the engine and saves it back
/// under one lock. A rejected operation leaves the stored copy untouched.
pub struct SessionService<S: Storage> {
    storage: Arc<Mutex<S>>,
    engine: SessionEngine,
    notifier: Arc<dyn Notifier>,
}

impl<S: Storage> SessionService<S> {
    /// Create a service over `storage`.
    pub fn new(storage: Arc<Mutex<S>>, engine: SessionEngine) -> Self {
        Self {
            storage,
            engine,
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Set the notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// The engine in use.
    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    /// Store a new session.
    pub async fn create(&self, session: &WorkoutSession) -> Result<(), ServiceError> {
        self.storage.lock().await.save_session(session).await?;
        info!("Created session {} ({})", session.id, session.name);
        Ok(())
    }

    /// Load a session.
    pub async fn get(&self, id: SessionId) -> Result<WorkoutSession, ServiceError> {
        self.storage
            .lock()
            .await
            .load_session(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    /// All stored sessions, oldest first.
    pub async fn list(&self) -> Result<Vec<WorkoutSession>, ServiceError> {
        Ok(self.storage.lock().await.list_sessions().await?)
    }

    /// Begin a pending session.
    pub async fn start(&self, id: SessionId) -> Result<WorkoutSession, ServiceError> {
        let ((), session) = self.apply(id, |engine, session| engine.start(session)).await?;
        Ok(session)
    }

    /// Abandon an active session.
    pub async fn abandon(&self, id: SessionId) -> Result<WorkoutSession, ServiceError> {
        let ((), session) = self.apply(id, |engine, session| engine.abandon(session)).await?;
        Ok(session)
    }

    /// Register an unplanned exercise.
    pub async fn add_exercise(
        &self,
        id: SessionId,
        exercise_id: ExerciseId,
        name: String,
        measurement: MeasurementType,
    ) -> Result<(), ServiceError> {
        self.apply(id, |engine, session| {
            engine.add_exercise(session, exercise_id, name, measurement)
        })
        .await?;
        Ok(())
    }

    /// Open the next slot for an exercise.
    pub async fn start_exercise(&self, id: SessionId, exercise_id: ExerciseId) -> Result<(), ServiceError> {
        self.apply(id, |engine, session| engine.start_exercise(session, exercise_id))
            .await?;
        Ok(())
    }

    /// Record one attempt.
    pub async fn record_attempt(
        &self,
        id: SessionId,
        exercise_id: ExerciseId,
        input: AttemptInput,
    ) -> Result<AttemptOutcome, ServiceError> {
        let (outcome, _) = self
            .apply(id, |engine, session| engine.record_attempt(session, exercise_id, input))
            .await?;
        Ok(outcome)
    }

    /// Mark an exercise done.
    pub async fn complete_exercise(&self, id: SessionId, exercise_id: ExerciseId) -> Result<(), ServiceError> {
        self.apply(id, |engine, session| engine.complete_exercise(session, exercise_id))
            .await?;
        Ok(())
    }

    /// Skip an exercise.
    pub async fn skip_exercise(&self, id: SessionId, exercise_id: ExerciseId) -> Result<(), ServiceError> {
        self.apply(id, |engine, session| engine.skip_exercise(session, exercise_id))
            .await?;
        Ok(())
    }

    /// Rebuild the summary and complete the session if every executed
    /// exercise is done. Notifies the owner on completion.
    pub async fn finalize(&self, id: SessionId) -> Result<FinalizeOutcome, ServiceError> {
        let (outcome, session) = self
            .apply(id, |engine, session| Ok(engine.finalize(session)))
            .await?;

        if outcome.completed {
            self.notifier.notify(
                session.user_id,
                &Milestone::SessionCompleted {
                    session_id: session.id,
                    name: session.name.clone(),
                },
            );
        }
        Ok(outcome)
    }

    /// Remove a session.
    pub async fn delete(&self, id: SessionId) -> Result<(), ServiceError> {
        self.storage.lock().await.delete_session(id).await?;
        debug!("Deleted session {}", id);
        Ok(())
    }

    async fn apply<T, F>(&self, id: SessionId, op: F) -> Result<(T, WorkoutSession), ServiceError>
    where
        F: FnOnce(&SessionEngine, &mut WorkoutSession) -> Result<T, SessionError>,
    {
        let mut storage = self.storage.lock().await;
        let mut session = storage.load_session(id).await?.ok_or(ServiceError::NotFound(id))?;

        let value = op(&self.engine, &mut session)?;
        storage.save_session(&session).await?;

        Ok((value, session))
    }
}
