use serde::Serialize;

/// How to derive output content from a matched element. Any tag that is not
/// one of the builtin kinds names an attribute to read verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Text,
    Title,
    Link,
    Attribute(String),
}

impl DataType {
    pub fn parse(tag: &str) -> DataType {
        let trimmed = tag.trim();
        match trimmed.to_lowercase().as_str() {
            "" | "text" => DataType::Text,
            "title" => DataType::Title,
            "link" | "href" => DataType::Link,
            _ => DataType::Attribute(trimmed.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            DataType::Text => "text",
            DataType::Title => "title",
            DataType::Link => "link",
            DataType::Attribute(name) => name,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRecord {
    pub data_type: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub data: Vec<ExtractedRecord>,
    pub next_page: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub success: bool,
    pub data_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
