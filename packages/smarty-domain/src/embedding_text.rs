/// Separator placed between a note's title and its content before embedding.
pub const TITLE_CONTENT_SEPARATOR: &str = "\n\n";

/// Text embedded for a note. Missing content embeds as an empty body so the title always leads.
pub fn note_embedding_text(title: &str, content: Option<&str>) -> String {
	let content = content.unwrap_or_default();
	let mut out =
		String::with_capacity(title.len() + TITLE_CONTENT_SEPARATOR.len() + content.len());

	out.push_str(title);
	out.push_str(TITLE_CONTENT_SEPARATOR);
	out.push_str(content);

	out
}
