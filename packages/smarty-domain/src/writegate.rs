use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectCode {
	RejectEmptyOwner,
	RejectEmptyTitle,
	RejectEmptyCategoryName,
	RejectEmptyQuery,
}
impl RejectCode {
	pub fn message(self) -> &'static str {
		match self {
			Self::RejectEmptyOwner => "owner_id is required.",
			Self::RejectEmptyTitle => "Title is required.",
			Self::RejectEmptyCategoryName => "Category name is required.",
			Self::RejectEmptyQuery => "Query is required.",
		}
	}
}

pub struct NoteInput<'a> {
	pub owner_id: &'a str,
	pub title: &'a str,
}

pub fn owner(owner_id: &str) -> Result<&str, RejectCode> {
	let trimmed = owner_id.trim();

	if trimmed.is_empty() {
		return Err(RejectCode::RejectEmptyOwner);
	}

	Ok(trimmed)
}

/// Checks a note write. Owner problems win over title problems so callers map them to 401 first.
pub fn note(input: &NoteInput<'_>) -> Result<(), RejectCode> {
	owner(input.owner_id)?;

	if input.title.trim().is_empty() {
		return Err(RejectCode::RejectEmptyTitle);
	}

	Ok(())
}

pub fn category_name(name: &str) -> Result<&str, RejectCode> {
	let trimmed = name.trim();

	if trimmed.is_empty() {
		return Err(RejectCode::RejectEmptyCategoryName);
	}

	Ok(trimmed)
}

pub fn query(text: &str) -> Result<&str, RejectCode> {
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return Err(RejectCode::RejectEmptyQuery);
	}

	Ok(trimmed)
}
