//! LanceDB-backed vector store.

use super::{cosine_similarity, MetadataFilter, VectorIndex};
use crate::embeddings::{create_provider, embed_in_batches, EmbeddingConfig, EmbeddingProvider};
use crate::types::{Chunk, ChunkMetadata, ScoredChunk};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
    UInt32Array,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use ragbot_core::{AppConfig, AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Chunk metadata that has no column of its own.
#[derive(Debug, Serialize, Deserialize)]
struct StoredMetadata {
    #[serde(default)]
    start_index: usize,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// One LanceDB table per collection under `persist_directory`.
///
/// The table is created on the first non-empty [`VectorIndex::add_chunks`];
/// the embedding settings it was built with are recorded next to it and
/// checked whenever the store is reopened.
pub struct LanceDbStore {
    connection: Connection,
    persist_directory: PathBuf,
    collection: String,
    embedding: EmbeddingConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    table: RwLock<Option<Table>>,
}

impl LanceDbStore {
    /// Open the store described by the application config.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let embedding = EmbeddingConfig::from(&config.embedding);
        let embedder = create_provider(&embedding)?;
        Self::open(
            &config.persist_directory,
            &config.collection_name,
            embedding,
            embedder,
        )
        .await
    }

    pub async fn open(
        persist_directory: &Path,
        collection: &str,
        embedding: EmbeddingConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        std::fs::create_dir_all(persist_directory).map_err(|e| {
            AppError::Knowledge(format!(
                "Failed to create vector store directory {:?}: {}",
                persist_directory, e
            ))
        })?;

        let uri = persist_directory.to_string_lossy().to_string();
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to connect to LanceDB: {}", e)))?;

        let store = Self {
            connection,
            persist_directory: persist_directory.to_path_buf(),
            collection: collection.to_string(),
            embedding,
            embedder,
            table: RwLock::new(None),
        };

        if store.table_exists().await? {
            if let Some(recorded) = EmbeddingConfig::load(&store.embedding_record_path())? {
                recorded.validate_consistency(&store.embedding).map_err(|e| {
                    AppError::Config(format!(
                        "Collection '{}' was built with different embeddings: {}. \
                         Delete the collection or restore the previous embedding settings.",
                        collection, e
                    ))
                })?;
            }

            let table = store
                .connection
                .open_table(collection)
                .execute()
                .await
                .map_err(|e| AppError::Knowledge(format!("Failed to open table: {}", e)))?;
            *store.table.write().await = Some(table);

            tracing::info!(
                collection = %collection,
                path = %persist_directory.display(),
                "Opened existing collection"
            );
        } else {
            tracing::info!(
                collection = %collection,
                path = %persist_directory.display(),
                "Collection does not exist yet; it will be created on first upload"
            );
        }

        Ok(store)
    }

    pub fn embedding_config(&self) -> &EmbeddingConfig {
        &self.embedding
    }

    pub fn persist_directory(&self) -> &Path {
        &self.persist_directory
    }

    async fn table_exists(&self) -> AppResult<bool> {
        let names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to list tables: {}", e)))?;
        Ok(names.iter().any(|n| n == &self.collection))
    }

    fn embedding_record_path(&self) -> PathBuf {
        self.persist_directory
            .join(format!("{}.embedding.json", self.collection))
    }

    fn schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("source", DataType::Utf8, false),
            Field::new("file_path", DataType::Utf8, false),
            Field::new("position", DataType::UInt32, false),
            Field::new("metadata", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.embedding.dimensions as i32,
                ),
                false,
            ),
        ]))
    }

    fn chunks_to_batch(&self, chunks: &[Chunk], vectors: Vec<Vec<f32>>) -> AppResult<RecordBatch> {
        let metadata = chunks
            .iter()
            .map(|c| {
                serde_json::to_string(&StoredMetadata {
                    start_index: c.metadata.start_index,
                    extra: c.metadata.extra.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let values = Float32Array::from_iter_values(vectors.into_iter().flatten());
        let vector_array = FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            self.embedding.dimensions as i32,
            Arc::new(values),
            None,
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to build vector column: {}", e)))?;

        RecordBatch::try_new(
            self.schema(),
            vec![
                Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.id.as_str()))),
                Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.text.as_str()))),
                Arc::new(StringArray::from_iter_values(
                    chunks.iter().map(|c| c.metadata.source.as_str()),
                )),
                Arc::new(StringArray::from_iter_values(
                    chunks.iter().map(|c| c.metadata.file_path.as_str()),
                )),
                Arc::new(UInt32Array::from_iter_values(
                    chunks.iter().map(|c| c.metadata.position),
                )),
                Arc::new(StringArray::from_iter_values(metadata.iter().map(String::as_str))),
                Arc::new(vector_array),
            ],
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to create RecordBatch: {}", e)))
    }

    fn rows_to_chunks(batch: &RecordBatch) -> AppResult<Vec<(Chunk, Vec<f32>)>> {
        let id = string_column(batch, "id")?;
        let text = string_column(batch, "text")?;
        let source = string_column(batch, "source")?;
        let file_path = string_column(batch, "file_path")?;
        let metadata = string_column(batch, "metadata")?;
        let position = batch
            .column_by_name("position")
            .and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
            .ok_or_else(|| AppError::Knowledge("Invalid position column".to_string()))?;
        let vectors = batch
            .column_by_name("vector")
            .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
            .ok_or_else(|| AppError::Knowledge("Invalid vector column".to_string()))?;

        let mut rows = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let stored: StoredMetadata = serde_json::from_str(metadata.value(row))
                .map_err(|e| AppError::Knowledge(format!("Failed to parse metadata: {}", e)))?;

            let vector_ref = vectors.value(row);
            let vector = vector_ref
                .as_any()
                .downcast_ref::<Float32Array>()
                .ok_or_else(|| AppError::Knowledge("Invalid vector values".to_string()))?
                .values()
                .to_vec();

            let chunk = Chunk {
                id: id.value(row).to_string(),
                text: text.value(row).to_string(),
                metadata: ChunkMetadata {
                    source: source.value(row).to_string(),
                    file_path: file_path.value(row).to_string(),
                    position: position.value(row),
                    start_index: stored.start_index,
                    extra: stored.extra,
                },
            };
            rows.push((chunk, vector));
        }

        Ok(rows)
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| AppError::Knowledge(format!("Invalid {} column", name)))
}

#[async_trait]
impl VectorIndex for LanceDbStore {
    fn collection_name(&self) -> &str {
        &self.collection
    }

    async fn add_chunks(&self, chunks: &[Chunk]) -> AppResult<Vec<String>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors =
            embed_in_batches(self.embedder.as_ref(), &texts, self.embedding.batch_size).await?;

        if let Some(bad) = vectors.iter().find(|v| v.len() != self.embedding.dimensions) {
            return Err(AppError::Embedding(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.embedding.dimensions,
                bad.len()
            )));
        }

        let batch = self.chunks_to_batch(chunks, vectors)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

        let mut table = self.table.write().await;
        match table.as_ref() {
            Some(existing) => {
                existing
                    .add(reader)
                    .execute()
                    .await
                    .map_err(|e| AppError::Knowledge(format!("Failed to add chunks: {}", e)))?;
            }
            None => {
                let created = self
                    .connection
                    .create_table(&self.collection, reader)
                    .execute()
                    .await
                    .map_err(|e| AppError::Knowledge(format!("Failed to create table: {}", e)))?;
                self.embedding.save(&self.embedding_record_path())?;
                *table = Some(created);

                tracing::info!(collection = %self.collection, "Created collection");
            }
        }

        tracing::info!(
            collection = %self.collection,
            chunks = chunks.len(),
            "Added chunks to vector store"
        );

        Ok(chunks.iter().map(|c| c.id.clone()).collect())
    }

    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> AppResult<Vec<ScoredChunk>> {
        let Some(table) = self.table.read().await.clone() else {
            tracing::debug!(collection = %self.collection, "Search on empty store");
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query).await?;

        let mut search = table
            .query()
            .nearest_to(query_vector.clone())
            .map_err(|e| AppError::Knowledge(format!("Failed to create query: {}", e)))?
            .distance_type(DistanceType::Cosine)
            .limit(k);
        if let Some(predicate) = filter.and_then(MetadataFilter::to_predicate) {
            search = search.only_if(predicate);
        }

        let batches: Vec<RecordBatch> = search
            .execute()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to execute search: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to collect results: {}", e)))?;

        let mut results = Vec::new();
        for batch in &batches {
            for (chunk, vector) in Self::rows_to_chunks(batch)? {
                let score = cosine_similarity(&query_vector, &vector);
                results.push(ScoredChunk { chunk, score });
            }
        }

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);

        tracing::debug!(
            collection = %self.collection,
            results = results.len(),
            k,
            "Similarity search"
        );

        Ok(results)
    }

    async fn collection_count(&self) -> AppResult<usize> {
        let Some(table) = self.table.read().await.clone() else {
            return Ok(0);
        };

        table
            .count_rows(None)
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to count rows: {}", e)))
    }

    async fn list_collections(&self) -> AppResult<Vec<String>> {
        self.connection
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to list tables: {}", e)))
    }

    async fn delete_collection(&self) -> AppResult<()> {
        let mut table = self.table.write().await;
        *table = None;

        if self.table_exists().await? {
            match self.connection.drop_table(&self.collection, &[]).await {
                Ok(()) | Err(lancedb::Error::TableNotFound { .. }) => {}
                Err(e) => {
                    return Err(AppError::Knowledge(format!(
                        "Failed to drop table '{}': {}",
                        self.collection, e
                    )))
                }
            }
        }

        let record = self.embedding_record_path();
        if record.exists() {
            std::fs::remove_file(&record)?;
        }

        tracing::info!(collection = %self.collection, "Deleted collection");
        Ok(())
    }
}
