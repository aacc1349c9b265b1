//! Bulk embedding of chunks in paced batches.

use std::sync::Arc;

use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::error::IndexError;
use crate::models::Chunk;
use crate::ratelimit::Pacer;
use crate::store::EmbeddingProvider;

/// Embeds chunk batches through a provider, pausing between batches.
///
/// A failing batch aborts the whole call and reports exactly which chunk
/// range was in flight, so callers can retry from a known position.
pub struct EmbeddingIndexer {
    provider: Arc<dyn EmbeddingProvider>,
    pacer: Arc<dyn Pacer>,
    batch_size: usize,
}

impl EmbeddingIndexer {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        pacer: Arc<dyn Pacer>,
        config: &EmbeddingConfig,
    ) -> Self {
        Self {
            provider,
            pacer,
            batch_size: config.batch_size.max(1),
        }
    }

    /// Embed all chunks in order, one vector per chunk.
    pub async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>, IndexError> {
        let mut vectors = Vec::with_capacity(chunks.len());

        for (i, batch) in chunks.chunks(self.batch_size).enumerate() {
            let start = i * self.batch_size;
            let end = start + batch.len();
            if i > 0 {
                self.pacer.pause().await;
            }

            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embedded = self
                .provider
                .embed_batch(&texts)
                .await
                .map_err(|source| IndexError::BatchFailed { start, end, source })?;

            if embedded.len() != batch.len() {
                return Err(IndexError::BatchFailed {
                    start,
                    end,
                    source: anyhow::anyhow!(
                        "provider returned {} vectors for {} inputs",
                        embedded.len(),
                        batch.len()
                    ),
                });
            }

            debug!(start, end, model = self.provider.model_name(), "embedded batch");
            vectors.extend(embedded);
        }

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkMetadata;
    use crate::ratelimit::NoopPacer;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn chunk(i: usize) -> Chunk {
        Chunk {
            id: format!("c{i}"),
            document_id: "d1".into(),
            index: i,
            content: format!("chunk number {i}"),
            tags: Vec::new(),
            hash: String::new(),
            metadata: ChunkMetadata::new("markdown-semantic"),
        }
    }

    /// Provider that fails on a chosen batch ordinal.
    struct FlakyProvider {
        fail_on_batch: Option<usize>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for FlakyProvider {
        fn model_name(&self) -> &str {
            "flaky"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_batch == Some(call) {
                return Err(anyhow!("throttled"));
            }
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
        async fn search_by_embedding(
            &self,
            _embedding: &[f32],
            _limit: usize,
        ) -> Result<Vec<crate::models::RankedUnit>> {
            Ok(Vec::new())
        }
    }

    struct CountingPacer(AtomicUsize);

    #[async_trait]
    impl Pacer for CountingPacer {
        async fn pause(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config(batch_size: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            batch_size,
            batch_interval_ms: 0,
        }
    }

    #[tokio::test]
    async fn embeds_every_chunk_in_order() {
        let indexer = EmbeddingIndexer::new(
            Arc::new(FlakyProvider {
                fail_on_batch: None,
                calls: AtomicUsize::new(0),
            }),
            Arc::new(NoopPacer),
            &config(3),
        );
        let chunks: Vec<Chunk> = (0..7).map(chunk).collect();
        let vectors = indexer.embed_chunks(&chunks).await.unwrap();
        assert_eq!(vectors.len(), 7);
    }

    #[tokio::test]
    async fn pauses_between_batches_but_not_before_the_first() {
        let pacer = Arc::new(CountingPacer(AtomicUsize::new(0)));
        let indexer = EmbeddingIndexer::new(
            Arc::new(FlakyProvider {
                fail_on_batch: None,
                calls: AtomicUsize::new(0),
            }),
            pacer.clone(),
            &config(2),
        );
        let chunks: Vec<Chunk> = (0..5).map(chunk).collect();
        indexer.embed_chunks(&chunks).await.unwrap();
        // 3 batches, pauses only between them.
        assert_eq!(pacer.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failing_batch_reports_its_chunk_range() {
        let indexer = EmbeddingIndexer::new(
            Arc::new(FlakyProvider {
                fail_on_batch: Some(1),
                calls: AtomicUsize::new(0),
            }),
            Arc::new(NoopPacer),
            &config(3),
        );
        let chunks: Vec<Chunk> = (0..8).map(chunk).collect();
        let err = indexer.embed_chunks(&chunks).await.unwrap_err();
        let IndexError::BatchFailed { start, end, .. } = err;
        assert_eq!(start, 3);
        assert_eq!(end, 6);
    }

    #[tokio::test]
    async fn empty_input_embeds_nothing() {
        let provider = Arc::new(FlakyProvider {
            fail_on_batch: None,
            calls: AtomicUsize::new(0),
        });
        let indexer = EmbeddingIndexer::new(provider.clone(), Arc::new(NoopPacer), &config(4));
        let vectors = indexer.embed_chunks(&[]).await.unwrap();
        assert!(vectors.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
