use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// the one capability every stage and tutor is built on.
///
/// implementations must be safe to call from many tasks at once and keep no
/// state between calls. failures (network, quota, rejected request) surface
/// as `ErmError::Generation`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// backend label for logs
    fn name(&self) -> &str;

    async fn generate(&self, system: &str, user: &str) -> Result<String>;
}

/// one generator handle per pipeline role
#[derive(Clone)]
pub struct StageGenerators {
    pub analysis: Arc<dyn TextGenerator>,
    pub table: Arc<dyn TextGenerator>,
    pub sql: Arc<dyn TextGenerator>,
    pub tutor: Arc<dyn TextGenerator>,
}

impl StageGenerators {
    /// a single handle serving every role
    pub fn shared(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            analysis: Arc::clone(&generator),
            table: Arc::clone(&generator),
            sql: Arc::clone(&generator),
            tutor: generator,
        }
    }
}

impl std::fmt::Debug for StageGenerators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageGenerators")
            .field("analysis", &self.analysis.name())
            .field("table", &self.table.name())
            .field("sql", &self.sql.name())
            .field("tutor", &self.tutor.name())
            .finish()
    }
}
