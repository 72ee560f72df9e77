//! Vector store gateway wrapping the Qdrant client.
//!
//! Holds (id, vector, paragraph index, note label) tuples in one named
//! collection. Ingestion rewrites the collection wholesale; queries run a
//! k-nearest-neighbor search and hand back labels plus paragraph indices.
//!
//! The four upsert arguments travel as separate aligned arrays and there
//! is no transaction across them: a partial failure can leave the
//! collection inconsistent, and the fix is to re-run ingestion.

use qdrant_client::qdrant::{
    value::Kind, CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant, QdrantError};

/// Dimension of text-embedding-ada-002 vectors.
pub const EMBEDDING_DIM: usize = 1536;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("collection '{0}' already exists; reset the store before re-creating it")]
    CollectionExists(String),

    #[error("upsert arrays misaligned: {0}")]
    DimensionMismatch(String),

    #[error("vector store error: {0}")]
    Backend(#[from] QdrantError),
}

/// One nearest-neighbor match: which note, which paragraph, how close.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub label: String,
    pub paragraph: usize,
    pub score: f32,
}

pub struct VectorStore {
    client: Qdrant,
    dims: usize,
}

impl VectorStore {
    pub fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Qdrant::from_url(url).build()?;
        Ok(Self {
            client,
            dims: EMBEDDING_DIM,
        })
    }

    /// Drop every collection. Idempotent: a store with zero collections
    /// stays that way.
    pub async fn reset_all(&self) -> Result<(), StoreError> {
        let collections = self.client.list_collections().await?;
        for collection in collections.collections {
            log::debug!("dropping collection '{}'", collection.name);
            self.client.delete_collection(collection.name).await?;
        }
        Ok(())
    }

    /// Create the named collection, cosine distance. Fails if it already
    /// exists; ingestion is expected to reset first.
    pub async fn create_collection(&self, name: &str) -> Result<(), StoreError> {
        if self.client.collection_exists(name).await? {
            return Err(StoreError::CollectionExists(name.to_string()));
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name).vectors_config(
                    VectorParamsBuilder::new(self.dims as u64, Distance::Cosine),
                ),
            )
            .await?;
        Ok(())
    }

    /// Insert index-aligned (id, embedding, paragraph, label) tuples.
    /// All four slices must have equal length and every vector must have
    /// the collection dimension; checked before anything goes on the wire.
    pub async fn upsert(
        &self,
        name: &str,
        ids: &[u64],
        embeddings: &[Vec<f32>],
        paragraphs: &[usize],
        labels: &[String],
    ) -> Result<(), StoreError> {
        check_aligned(ids, embeddings, paragraphs, labels, self.dims)?;

        let mut points = Vec::with_capacity(ids.len());
        for i in 0..ids.len() {
            let mut payload = Payload::new();
            payload.insert("note", labels[i].as_str());
            payload.insert("paragraph", paragraphs[i] as i64);

            points.push(PointStruct::new(ids[i], embeddings[i].clone(), payload));
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(name, points).wait(true))
            .await?;
        Ok(())
    }

    /// The `k` stored vectors nearest to `query`, nearest first (Qdrant
    /// returns cosine similarity descending, which is distance ascending).
    /// Ties are ordered however the backend returns them.
    pub async fn search(
        &self,
        name: &str,
        query: Vec<f32>,
        k: usize,
    ) -> Result<Vec<Hit>, StoreError> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(name, query, k as u64).with_payload(true),
            )
            .await?;

        let mut hits = Vec::with_capacity(response.result.len());
        for point in response.result {
            let label = point.payload.get("note").and_then(|v| match &v.kind {
                Some(Kind::StringValue(s)) => Some(s.clone()),
                _ => None,
            });
            let paragraph = point.payload.get("paragraph").and_then(|v| match &v.kind {
                Some(Kind::IntegerValue(i)) if *i >= 0 => Some(*i as usize),
                _ => None,
            });

            match (label, paragraph) {
                (Some(label), Some(paragraph)) => hits.push(Hit {
                    label,
                    paragraph,
                    score: point.score,
                }),
                _ => log::warn!("search hit with unusable payload, skipping"),
            }
        }

        Ok(hits)
    }
}

fn check_aligned(
    ids: &[u64],
    embeddings: &[Vec<f32>],
    paragraphs: &[usize],
    labels: &[String],
    dims: usize,
) -> Result<(), StoreError> {
    if ids.len() != embeddings.len()
        || ids.len() != paragraphs.len()
        || ids.len() != labels.len()
    {
        return Err(StoreError::DimensionMismatch(format!(
            "ids={} embeddings={} paragraphs={} labels={}",
            ids.len(),
            embeddings.len(),
            paragraphs.len(),
            labels.len()
        )));
    }

    for (i, embedding) in embeddings.iter().enumerate() {
        if embedding.len() != dims {
            return Err(StoreError::DimensionMismatch(format!(
                "embedding {} has {} dimensions, expected {}",
                i,
                embedding.len(),
                dims
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_arrays_pass() {
        let ids = vec![0, 1];
        let embeddings = vec![vec![0.0; 4], vec![0.0; 4]];
        let paragraphs = vec![0, 1];
        let labels = vec!["A.md".to_string(), "A.md".to_string()];
        assert!(check_aligned(&ids, &embeddings, &paragraphs, &labels, 4).is_ok());
    }

    #[test]
    fn unequal_lengths_are_rejected() {
        let ids = vec![0, 1];
        let embeddings = vec![vec![0.0; 4]];
        let paragraphs = vec![0, 1];
        let labels = vec!["A.md".to_string(), "A.md".to_string()];
        assert!(matches!(
            check_aligned(&ids, &embeddings, &paragraphs, &labels, 4),
            Err(StoreError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn wrong_vector_dimension_is_rejected() {
        let ids = vec![0];
        let embeddings = vec![vec![0.0; 3]];
        let paragraphs = vec![0];
        let labels = vec!["A.md".to_string()];
        assert!(matches!(
            check_aligned(&ids, &embeddings, &paragraphs, &labels, 4),
            Err(StoreError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn empty_upsert_is_aligned() {
        assert!(check_aligned(&[], &[], &[], &[], 4).is_ok());
    }
}
