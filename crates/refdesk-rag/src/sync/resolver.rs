//! Corpus resolution
//!
//! Resolves a display name to an existing remote corpus, or creates one
//! with the configured embedding model when no corpus carries that name.

use std::sync::Arc;

use crate::error::Result;
use crate::providers::CorpusService;
use crate::types::CorpusRecord;

/// Resolves display names to corpus records
pub struct CorpusResolver {
    service: Arc<dyn CorpusService>,
}

impl CorpusResolver {
    /// Create a resolver over a corpus service
    pub fn new(service: Arc<dyn CorpusService>) -> Self {
        Self { service }
    }

    /// Return the corpus with the given display name, creating it if absent.
    ///
    /// Matching is exact on display name. When several corpora share the
    /// name, the first in listing order wins and a warning names the rest.
    /// Remote failures propagate unchanged; there is no retry.
    pub async fn resolve_or_create(
        &self,
        display_name: &str,
        description: &str,
    ) -> Result<CorpusRecord> {
        let corpora = self.service.list_corpora().await?;
        let mut matches = corpora
            .into_iter()
            .filter(|corpus| corpus.display_name == display_name);

        if let Some(existing) = matches.next() {
            let duplicates = matches.count();
            if duplicates > 0 {
                tracing::warn!(
                    "{} additional corpora named '{}'; using {}",
                    duplicates,
                    display_name,
                    existing.resource_name
                );
            }
            tracing::info!(
                "Resolved corpus '{}' (id {})",
                display_name,
                existing.short_id()
            );
            return Ok(existing);
        }

        tracing::info!("No corpus named '{}', creating one", display_name);
        self.service.create_corpus(display_name, description).await
    }
}
