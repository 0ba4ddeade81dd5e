use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub categories: Categories,
	#[serde(default)]
	pub search: Search,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Category list caching. The list is global and changes rarely.
#[derive(Debug, Deserialize)]
pub struct Categories {
	#[serde(default = "default_cache_ttl_secs")]
	pub cache_ttl_secs: u64,
}
impl Default for Categories {
	fn default() -> Self {
		Self { cache_ttl_secs: default_cache_ttl_secs() }
	}
}

#[derive(Debug, Deserialize)]
pub struct Search {
	#[serde(default = "default_top_k")]
	pub default_top_k: u32,
	#[serde(default = "default_max_top_k")]
	pub max_top_k: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self { default_top_k: default_top_k(), max_top_k: default_max_top_k() }
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	/// Header carrying the owner id, injected by the identity gateway in front of the service.
	#[serde(default = "default_owner_header")]
	pub owner_header: String,
	/// Shared secret expected as a bearer token from the gateway. Blank disables the check.
	pub api_auth_token: Option<String>,
}

fn default_cache_ttl_secs() -> u64 {
	300
}

fn default_top_k() -> u32 {
	10
}

fn default_max_top_k() -> u32 {
	50
}

fn default_owner_header() -> String {
	"x-smarty-user-id".to_string()
}
