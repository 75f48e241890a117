//! Command gateway: runs a [`Command`] through a [`TransHandler`] and
//! normalizes the decoded fields into a [`Response`].

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Command, Response};
use crate::trans::{TransError, TransHandler};

/// Transport failure together with the best-effort response.
///
/// `response.fields["error"]` describes the failure so callers can still
/// render a structured body.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct RepositoryError {
    pub response: Response,
    #[source]
    pub source: TransError,
}

/// Storage-like access to the Trans server.
#[async_trait]
pub trait TransRepository: Send + Sync {
    async fn execute(&self, command: &Command) -> Result<Response, RepositoryError>;
}

/// [`TransRepository`] backed by a [`TransHandler`].
#[derive(Clone)]
pub struct TransRepo {
    handler: Arc<dyn TransHandler>,
}

impl TransRepo {
    pub fn new(handler: Arc<dyn TransHandler>) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl TransRepository for TransRepo {
    async fn execute(&self, command: &Command) -> Result<Response, RepositoryError> {
        let mut fields = match self.handler.send_command(command).await {
            Ok(fields) => fields,
            Err(source) => {
                let mut response = Response::default();
                response.fields.insert("error".to_string(), source.to_string());
                return Err(RepositoryError { response, source });
            }
        };

        let status = fields.remove("status").unwrap_or_default();
        Ok(Response { status, fields })
    }
}
