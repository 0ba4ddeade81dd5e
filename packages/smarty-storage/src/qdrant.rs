use std::collections::HashMap;

use qdrant_client::{
	Payload, Qdrant,
	qdrant::{
		Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, DeletePointsBuilder,
		Distance, FieldType, Filter, PointId, PointStruct, Query, QueryPointsBuilder, ScoredPoint,
		UpsertPointsBuilder, Value, VectorParamsBuilder, point_id::PointIdOptions, value::Kind,
	},
};
use uuid::Uuid;

use crate::{Error, Result};

pub const NOTE_ID_KEY: &str = "note_id";
pub const OWNER_ID_KEY: &str = "owner_id";

pub struct QdrantStore {
	pub client: Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}

/// One ranked hit from a nearest-neighbour query.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
	pub note_id: Uuid,
	pub score: f32,
	pub owner_id: Option<String>,
}

impl QdrantStore {
	pub fn new(cfg: &smarty_config::Qdrant) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Creates the cosine collection and its owner payload index when missing.
	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
					VectorParamsBuilder::new(u64::from(self.vector_dim), Distance::Cosine),
				),
			)
			.await?;
		self.client
			.create_field_index(CreateFieldIndexCollectionBuilder::new(
				self.collection.clone(),
				OWNER_ID_KEY,
				FieldType::Keyword,
			))
			.await?;

		tracing::info!(collection = %self.collection, "Qdrant collection created.");

		Ok(())
	}

	/// Writes the note's vector, replacing any previous point with the same id.
	pub async fn upsert_note(&self, note_id: Uuid, vector: Vec<f32>, owner_id: &str) -> Result<()> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Vector has {} dimensions; collection expects {}.",
				vector.len(),
				self.vector_dim
			)));
		}

		let mut payload_map = HashMap::new();

		payload_map.insert(NOTE_ID_KEY.to_string(), Value::from(note_id.to_string()));
		payload_map.insert(OWNER_ID_KEY.to_string(), Value::from(owner_id.to_string()));

		let point = PointStruct::new(note_id.to_string(), vector, Payload::from(payload_map));
		let upsert = UpsertPointsBuilder::new(self.collection.clone(), vec![point]).wait(true);

		self.client.upsert_points(upsert).await?;

		Ok(())
	}

	pub async fn delete_note(&self, note_id: Uuid) -> Result<()> {
		let ids = vec![PointId::from(note_id.to_string())];
		let delete = DeletePointsBuilder::new(self.collection.clone()).points(ids).wait(true);

		match self.client.delete_points(delete).await {
			Ok(_) => {},
			Err(err) =>
				if is_not_found_error(&err) {
					tracing::info!(note_id = %note_id, "Qdrant point missing during delete.");
				} else {
					return Err(err.into());
				},
		}

		Ok(())
	}

	/// Nearest notes to `vector` among points owned by `owner_id`.
	pub async fn query_notes(
		&self,
		vector: Vec<f32>,
		top_k: u32,
		owner_id: &str,
	) -> Result<Vec<VectorMatch>> {
		let filter = Filter::must([Condition::matches(OWNER_ID_KEY, owner_id.to_string())]);
		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.filter(filter)
			.limit(u64::from(top_k))
			.with_payload(true);
		let response = self.client.query(search).await?;

		Ok(response.result.iter().filter_map(scored_point_to_match).collect())
	}
}

fn is_not_found_error(err: &qdrant_client::QdrantError) -> bool {
	let message = err.to_string().to_lowercase();
	let point_not_found =
		(message.contains("not found") || message.contains("404")) && message.contains("point");
	let no_point_found = message.contains("no point") && message.contains("found");

	point_not_found || no_point_found
}

fn scored_point_to_match(point: &ScoredPoint) -> Option<VectorMatch> {
	let note_id = point.id.as_ref().and_then(point_id_to_uuid)?;

	Some(VectorMatch {
		note_id,
		score: point.score,
		owner_id: payload_string(&point.payload, OWNER_ID_KEY),
	})
}

fn point_id_to_uuid(point_id: &PointId) -> Option<Uuid> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Uuid::parse_str(id).ok(),
		_ => None,
	}
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	match &payload.get(key)?.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}
