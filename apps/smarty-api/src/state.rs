use std::sync::Arc;

use smarty_service::SmartyService;
use smarty_storage::{db::Db, qdrant::QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SmartyService>,
}
impl AppState {
	/// Connects Postgres and Qdrant and makes sure the schema and collection exist.
	pub async fn new(config: smarty_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let qdrant = QdrantStore::new(&config.storage.qdrant)?;

		qdrant.ensure_collection().await?;

		let service = SmartyService::new(config, db, qdrant);

		Ok(Self::from_service(Arc::new(service)))
	}

	pub fn from_service(service: Arc<SmartyService>) -> Self {
		Self { service }
	}
}
