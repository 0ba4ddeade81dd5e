use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, SmartyService, time_serde};
use smarty_domain::writegate;
use smarty_storage::models::Category;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
	pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteCategoryRequest {
	pub id: Uuid,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryView {
	pub category_id: Uuid,
	pub name: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl From<Category> for CategoryView {
	fn from(category: Category) -> Self {
		Self {
			category_id: category.category_id,
			name: category.name,
			created_at: category.created_at,
		}
	}
}

impl SmartyService {
	pub async fn create_category(&self, req: CreateCategoryRequest) -> Result<CategoryView> {
		let name = writegate::category_name(&req.name)?;
		let category = Category {
			category_id: Uuid::new_v4(),
			name: name.to_string(),
			created_at: time_serde::now(),
		};
		let category = self.backends.store.create_category(&category).await?;

		self.categories.invalidate().await;

		tracing::info!(category_id = %category.category_id, "Category created.");

		Ok(category.into())
	}

	/// Categories are global and cached for `categories.cache_ttl_secs`.
	pub async fn list_categories(&self) -> Result<Vec<CategoryView>> {
		let store = self.backends.store.as_ref();
		let categories = self.categories.get_or_refresh(|| store.list_categories()).await?;

		Ok(categories.into_iter().map(CategoryView::from).collect())
	}

	/// Notes keep pointing at a deleted category; lists then show no category name for them.
	pub async fn delete_category(&self, req: DeleteCategoryRequest) -> Result<()> {
		if self.backends.store.find_category(req.id).await?.is_none()
			|| !self.backends.store.delete_category(req.id).await?
		{
			return Err(Error::NotFound { message: "Category not found.".to_string() });
		}

		self.categories.invalidate().await;

		tracing::info!(category_id = %req.id, "Category deleted.");

		Ok(())
	}
}
