//! Execute a Trans command and classify the server's answer.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Command, Response, TRANS_DATABASE_ERROR, TRANS_ERROR, TRANS_NO_SUCH_COMMAND};
use crate::repository::TransRepository;
use crate::trans::TransError;

/// Why a command did not succeed.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The command is malformed (empty name).
    #[error("invalid command {0:?}")]
    Validation(Command),

    /// The repository failed; the message comes from the partial response.
    #[error("{message}")]
    Repository {
        message: String,
        #[source]
        source: TransError,
    },

    /// The Trans server does not know the command.
    #[error("error command doesn't exists")]
    NoSuchCommand,

    /// A database call inside the command failed.
    #[error("{0}")]
    Database(String),
}

/// The error together with the response to report.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ExecuteFailure {
    pub response: Response,
    #[source]
    pub error: ExecuteError,
}

/// Events the interactor reports as they happen.
pub trait InteractorLogger: Send + Sync {
    fn log_bad_input(&self, command: &Command);
    fn log_repository_error(&self, command: &Command, error: &dyn std::error::Error);
}

/// As a user, I want to run my command on a Trans server and get its
/// response, or an appropriate error.
#[async_trait]
pub trait ExecuteCommand: Send + Sync {
    async fn run(&self, command: Command) -> Result<Response, ExecuteFailure>;
}

/// [`ExecuteCommand`] on top of a [`TransRepository`].
#[derive(Clone)]
pub struct TransInteractor {
    repository: Arc<dyn TransRepository>,
    logger: Arc<dyn InteractorLogger>,
}

impl TransInteractor {
    pub fn new(repository: Arc<dyn TransRepository>, logger: Arc<dyn InteractorLogger>) -> Self {
        Self { repository, logger }
    }
}

#[async_trait]
impl ExecuteCommand for TransInteractor {
    async fn run(&self, command: Command) -> Result<Response, ExecuteFailure> {
        if command.name.is_empty() {
            self.logger.log_bad_input(&command);
            return Err(ExecuteFailure {
                response: Response::with_status(TRANS_ERROR),
                error: ExecuteError::Validation(command),
            });
        }

        let mut response = match self.repository.execute(&command).await {
            Ok(response) => response,
            Err(err) => {
                self.logger.log_repository_error(&command, &err);
                let message = err
                    .response
                    .error()
                    .unwrap_or("error during execution")
                    .to_string();
                return Err(ExecuteFailure {
                    response: err.response,
                    error: ExecuteError::Repository {
                        message,
                        source: err.source,
                    },
                });
            }
        };

        if response.status == TRANS_NO_SUCH_COMMAND {
            let error = ExecuteError::NoSuchCommand;
            response.status = TRANS_ERROR.to_string();
            response.fields.insert("error".to_string(), error.to_string());
            return Err(ExecuteFailure { response, error });
        }

        if let Some(rest) = response.status.strip_prefix(TRANS_DATABASE_ERROR) {
            if rest.is_empty() || rest.starts_with(':') {
                let detail = rest.strip_prefix(':').unwrap_or(rest).to_string();
                let error = ExecuteError::Database(detail.clone());
                self.logger.log_repository_error(&command, &error);
                response.status = TRANS_DATABASE_ERROR.to_string();
                response.fields.insert("error".to_string(), detail);
                return Err(ExecuteFailure { response, error });
            }
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldMap, TRANS_OK};
    use crate::repository::RepositoryError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLogger {
        bad_input: Mutex<Vec<Command>>,
        repository_errors: Mutex<Vec<String>>,
    }

    impl InteractorLogger for RecordingLogger {
        fn log_bad_input(&self, command: &Command) {
            self.bad_input.lock().unwrap().push(command.clone());
        }

        fn log_repository_error(&self, _command: &Command, error: &dyn std::error::Error) {
            self.repository_errors.lock().unwrap().push(error.to_string());
        }
    }

    struct FakeRepository {
        result: Mutex<Option<Result<Response, RepositoryError>>>,
        calls: Mutex<usize>,
    }

    impl FakeRepository {
        fn returning(result: Result<Response, RepositoryError>) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(result)),
                calls: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl TransRepository for FakeRepository {
        async fn execute(&self, _command: &Command) -> Result<Response, RepositoryError> {
            *self.calls.lock().unwrap() += 1;
            self.result.lock().unwrap().take().expect("called once")
        }
    }

    fn interactor(repo: Arc<FakeRepository>) -> (TransInteractor, Arc<RecordingLogger>) {
        let logger = Arc::new(RecordingLogger::default());
        (TransInteractor::new(repo, logger.clone()), logger)
    }

    #[tokio::test]
    async fn empty_command_is_rejected_before_repository() {
        let repo = FakeRepository::returning(Ok(Response::default()));
        let (interactor, logger) = interactor(repo.clone());

        let failure = interactor.run(Command::default()).await.unwrap_err();
        assert!(matches!(failure.error, ExecuteError::Validation(_)));
        assert_eq!(*repo.calls.lock().unwrap(), 0);
        assert_eq!(logger.bad_input.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn repository_error_without_detail() {
        let repo = FakeRepository::returning(Err(RepositoryError {
            response: Response::default(),
            source: TransError::Busy,
        }));
        let (interactor, logger) = interactor(repo);

        let failure = interactor
            .run(Command::new("command 1"))
            .await
            .unwrap_err();
        assert_eq!(failure.to_string(), "error during execution");
        assert_eq!(failure.response, Response::default());
        assert_eq!(*logger.repository_errors.lock().unwrap(), ["trans server is busy"]);
    }

    #[tokio::test]
    async fn repository_error_uses_error_field() {
        let mut response = Response::default();
        response.fields.insert("error".into(), "trans command timed out after 1s".into());
        let repo = FakeRepository::returning(Err(RepositoryError {
            response,
            source: TransError::Timeout(std::time::Duration::from_secs(1)),
        }));
        let (interactor, _) = interactor(repo);

        let failure = interactor.run(Command::new("c")).await.unwrap_err();
        assert_eq!(failure.to_string(), "trans command timed out after 1s");
        assert!(matches!(
            failure.error,
            ExecuteError::Repository { source: TransError::Timeout(_), .. }
        ));
    }

    #[tokio::test]
    async fn no_such_command() {
        let repo = FakeRepository::returning(Ok(Response::with_status(TRANS_NO_SUCH_COMMAND)));
        let (interactor, _) = interactor(repo);

        let failure = interactor
            .run(Command::new("command 1"))
            .await
            .unwrap_err();
        assert!(matches!(failure.error, ExecuteError::NoSuchCommand));
        assert_eq!(failure.to_string(), "error command doesn't exists");

        let mut expected = Response::with_status(TRANS_ERROR);
        expected
            .fields
            .insert("error".into(), "error command doesn't exists".into());
        assert_eq!(failure.response, expected);
    }

    #[tokio::test]
    async fn database_error_detail_is_extracted() {
        let repo = FakeRepository::returning(Ok(Response::with_status(
            "TRANS_DATABASE_ERROR:ERROR EXECUTING QUERY",
        )));
        let (interactor, logger) = interactor(repo);

        let failure = interactor
            .run(Command::new("command 1"))
            .await
            .unwrap_err();
        assert_eq!(failure.to_string(), "ERROR EXECUTING QUERY");
        assert_eq!(failure.response.status, TRANS_DATABASE_ERROR);
        assert_eq!(failure.response.error(), Some("ERROR EXECUTING QUERY"));
        assert_eq!(*logger.repository_errors.lock().unwrap(), ["ERROR EXECUTING QUERY"]);
    }

    #[tokio::test]
    async fn success_passes_through() {
        let mut fields = FieldMap::new();
        fields.insert("ad_id".into(), "99".into());
        let response = Response {
            status: TRANS_OK.into(),
            fields,
        };
        let repo = FakeRepository::returning(Ok(response.clone()));
        let (interactor, logger) = interactor(repo);

        let out = interactor.run(Command::new("command 1")).await.unwrap();
        assert_eq!(out, response);
        assert!(logger.repository_errors.lock().unwrap().is_empty());
        assert!(logger.bad_input.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_statuses_pass_through() {
        for status in [TRANS_ERROR, "TRANS_ERROR:ad not found", "TRANS_DATABASE_ERRORS"] {
            let repo = FakeRepository::returning(Ok(Response::with_status(status)));
            let (interactor, _) = interactor(repo);
            let out = interactor.run(Command::new("c")).await.unwrap();
            assert_eq!(out.status, status);
        }
    }
}
