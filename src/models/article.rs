use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Paragraph,
    Heading,
    Quote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Body of an article. The format is decided when the article is written
/// and stored next to the body, so reads never have to guess.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", content = "body", rename_all = "lowercase")]
pub enum ArticleContent {
    Markdown(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Deserialize)]
#[serde(tag = "format", content = "body", rename_all = "lowercase")]
enum TaggedContent {
    Markdown(String),
    Blocks(Vec<ContentBlock>),
}

/// Accepted request shapes: the tagged form, a bare markdown string, or a
/// bare list of blocks from older editors.
#[derive(Deserialize)]
#[serde(untagged)]
enum ContentRepr {
    Tagged(TaggedContent),
    Markdown(String),
    Blocks(Vec<ContentBlock>),
}

impl<'de> Deserialize<'de> for ArticleContent {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match ContentRepr::deserialize(deserializer)? {
            ContentRepr::Tagged(TaggedContent::Markdown(body)) | ContentRepr::Markdown(body) => {
                ArticleContent::Markdown(body)
            }
            ContentRepr::Tagged(TaggedContent::Blocks(blocks)) | ContentRepr::Blocks(blocks) => {
                ArticleContent::Blocks(blocks)
            }
        })
    }
}

impl ArticleContent {
    pub fn format(&self) -> &'static str {
        match self {
            ArticleContent::Markdown(_) => "markdown",
            ArticleContent::Blocks(_) => "blocks",
        }
    }

    /// Split into the `(content_format, content_body)` column pair.
    pub fn to_columns(&self) -> serde_json::Result<(&'static str, String)> {
        let body = match self {
            ArticleContent::Markdown(text) => text.clone(),
            ArticleContent::Blocks(blocks) => serde_json::to_string(blocks)?,
        };
        Ok((self.format(), body))
    }

    pub fn from_columns(format: &str, body: String) -> Result<Self> {
        match format {
            "markdown" => Ok(ArticleContent::Markdown(body)),
            "blocks" => Ok(ArticleContent::Blocks(serde_json::from_str(&body)?)),
            other => Err(AppError::validation(format!(
                "unknown content format: {other}"
            ))),
        }
    }
}

impl Default for ArticleContent {
    fn default() -> Self {
        ArticleContent::Markdown(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub date: NaiveDate,
    pub read_time: String,
    pub tags: Vec<String>,
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epigraph: Option<String>,
    pub content: ArticleContent,
}

impl Article {
    pub fn apply(&mut self, update: ArticleUpdate) {
        if let Some(slug) = update.slug {
            self.slug = slug;
        }
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(excerpt) = update.excerpt {
            self.excerpt = excerpt;
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        if let Some(read_time) = update.read_time {
            self.read_time = read_time;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(featured) = update.featured {
            self.featured = featured;
        }
        if let Some(epigraph) = update.epigraph {
            self.epigraph = Some(epigraph).filter(|e| !e.is_empty());
        }
        if let Some(content) = update.content {
            self.content = content;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub read_time: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub epigraph: Option<String>,
    #[serde(default)]
    pub content: ArticleContent,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleUpdate {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub date: Option<NaiveDate>,
    pub read_time: Option<String>,
    pub tags: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub epigraph: Option<String>,
    pub content: Option<ArticleContent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_tagged_and_legacy_content() {
        let tagged: ArticleContent =
            serde_json::from_str(r##"{"format":"markdown","body":"# Hi"}"##).unwrap();
        assert_eq!(tagged, ArticleContent::Markdown("# Hi".into()));

        let bare: ArticleContent = serde_json::from_str(r#""plain text""#).unwrap();
        assert_eq!(bare, ArticleContent::Markdown("plain text".into()));

        let blocks: ArticleContent = serde_json::from_str(
            r#"[{"type":"quote","text":"Know thyself","author":"Socrates"}]"#,
        )
        .unwrap();
        match blocks {
            ArticleContent::Blocks(b) => {
                assert_eq!(b[0].kind, BlockKind::Quote);
                assert_eq!(b[0].author.as_deref(), Some("Socrates"));
            }
            other => panic!("expected blocks, got {other:?}"),
        }
    }

    #[test]
    fn serializes_with_explicit_format_tag() {
        let json = serde_json::to_value(ArticleContent::Markdown("x".into())).unwrap();
        assert_eq!(json, serde_json::json!({"format": "markdown", "body": "x"}));
    }

    #[test]
    fn columns_keep_the_format() {
        let content = ArticleContent::Blocks(vec![ContentBlock {
            kind: BlockKind::Paragraph,
            text: "[not markdown]".into(),
            author: None,
        }]);
        let (format, body) = content.to_columns().unwrap();
        assert_eq!(format, "blocks");
        assert_eq!(ArticleContent::from_columns(format, body).unwrap(), content);

        // A markdown body that happens to look like JSON stays markdown.
        let md = ArticleContent::Markdown("[]".into());
        let (format, body) = md.to_columns().unwrap();
        assert_eq!(ArticleContent::from_columns(format, body).unwrap(), md);
    }
}
