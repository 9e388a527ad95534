use super::{report, ReportDocument, StudentRecord};
use crate::{
    backend::{Backend, Credentials},
    error::{Error, Operation},
    relay::SessionTokenSet,
};
use std::{future::Future, sync::Arc, time::Duration};
use tracing::{debug, instrument};

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(20);

/// Orchestrates the backend and the report renderer for one request at a time.
///
/// Callers bring their own token set; the service never logs in on their behalf and
/// keeps no state between calls.
#[derive(Clone)]
pub struct StudentService {
    backend: Arc<dyn Backend>,
    deadline: Duration,
}

impl StudentService {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, deadline: Duration) -> Self {
        Self { backend, deadline }
    }

    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }

    async fn within_deadline<T, F>(&self, operation: Operation, future: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        tokio::time::timeout(self.deadline, future)
            .await
            .map_err(|_| Error::Cancelled {
                operation,
                deadline: self.deadline,
            })?
    }

    /// Log in upstream and hand back whatever tokens it issued.
    ///
    /// # Errors
    /// Returns the backend error, or [`Error::Cancelled`] past the deadline.
    #[instrument(skip(self, credentials))]
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionTokenSet, Error> {
        self.within_deadline(Operation::Login, self.backend.authenticate(credentials))
            .await
    }

    /// # Errors
    /// Returns the backend error unchanged, or [`Error::Cancelled`] past the deadline.
    #[instrument(skip(self, tokens))]
    pub async fn get_student(
        &self,
        id: u64,
        tokens: &SessionTokenSet,
    ) -> Result<StudentRecord, Error> {
        self.within_deadline(
            Operation::FetchStudent(id),
            self.backend.fetch_record(id, tokens),
        )
        .await
    }

    /// Fetch the record and render it. A failed fetch never reaches the renderer.
    ///
    /// # Errors
    /// Returns the fetch or render error, or [`Error::Cancelled`] past the deadline.
    #[instrument(skip(self, tokens))]
    pub async fn generate_report(
        &self,
        id: u64,
        tokens: &SessionTokenSet,
    ) -> Result<ReportDocument, Error> {
        self.within_deadline(Operation::GenerateReport(id), async {
            let record = self.backend.fetch_record(id, tokens).await?;

            debug!("rendering report for student {}", id);

            tokio::task::spawn_blocking(move || report::render(&record))
                .await
                .map_err(|err| Error::Render {
                    id,
                    reason: err.to_string(),
                })?
        })
        .await
    }
}
