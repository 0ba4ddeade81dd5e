pub mod embedding_text;
pub mod writegate;
