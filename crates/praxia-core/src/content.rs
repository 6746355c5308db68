//! Assistant message content parsing.
//!
//! Assistant replies are free text that may embed a JSON document, either as
//! the whole message or inside a fenced code block. [`parse_content`] runs an
//! ordered list of shape matchers and returns the first match as a typed
//! value. Anything that does not match, including malformed JSON inside a
//! fence, comes back as [`ParsedContent::Text`] so it can still be displayed.

use serde_json::{Map, Value};

use crate::models::{HealthReference, HealthSource, PollStatus, SourceIcon, XrayAnalysis};

/// The shape in which structured content was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentShape {
    /// The whole message is a JSON object.
    Json,
    /// A JSON object inside a ```` ```json ```` fence.
    FencedJson,
    /// A JSON object inside an untagged ```` ``` ```` fence.
    Fenced,
}

/// Status reported by structured assistant content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentStatus {
    Processing,
    Completed,
    Timeout,
    Other(String),
}

/// Result of [`parse_content`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedContent {
    Structured {
        shape: ContentShape,
        value: Map<String, Value>,
    },
    Text(String),
}

type Matcher = fn(&str) -> Option<Map<String, Value>>;

/// Matchers in the order they are tried.
const MATCHERS: &[(ContentShape, Matcher)] = &[
    (ContentShape::Json, match_json),
    (ContentShape::FencedJson, match_fenced_json),
    (ContentShape::Fenced, match_fenced),
];

/// Parse assistant message content.
pub fn parse_content(content: &str) -> ParsedContent {
    MATCHERS
        .iter()
        .find_map(|(shape, matcher)| {
            matcher(content).map(|value| ParsedContent::Structured {
                shape: *shape,
                value,
            })
        })
        .unwrap_or_else(|| ParsedContent::Text(content.to_string()))
}

fn match_json(content: &str) -> Option<Map<String, Value>> {
    as_object(content.trim())
}

fn match_fenced_json(content: &str) -> Option<Map<String, Value>> {
    fenced_block(content, "```json").and_then(as_object)
}

fn match_fenced(content: &str) -> Option<Map<String, Value>> {
    fenced_block(content, "```").and_then(as_object)
}

/// Returns the trimmed text between `open` and the next closing fence.
fn fenced_block<'a>(content: &'a str, open: &str) -> Option<&'a str> {
    let start = content.find(open)? + open.len();
    let rest = &content[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

fn as_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

impl ParsedContent {
    /// Returns the structured value, if any.
    pub fn value(&self) -> Option<&Map<String, Value>> {
        match self {
            ParsedContent::Structured { value, .. } => Some(value),
            ParsedContent::Text(_) => None,
        }
    }

    /// Returns the shape the content was found in.
    pub fn shape(&self) -> Option<ContentShape> {
        match self {
            ParsedContent::Structured { shape, .. } => Some(*shape),
            ParsedContent::Text(_) => None,
        }
    }

    /// Returns the `status` field of structured content.
    pub fn status(&self) -> Option<ContentStatus> {
        let status = self.value()?.get("status")?.as_str()?;
        Some(match status {
            "processing" => ContentStatus::Processing,
            "completed" => ContentStatus::Completed,
            "timeout" => ContentStatus::Timeout,
            other => ContentStatus::Other(other.to_string()),
        })
    }

    /// Returns the id of the X-ray analysis this message refers to.
    pub fn xray_analysis_id(&self) -> Option<i64> {
        let id = self.value()?.get("xray_analysis_id")?;
        id.as_i64()
            .or_else(|| id.as_str().and_then(|s| s.parse().ok()))
            .filter(|id| *id != 0)
    }

    /// Returns the analysis id if this message is waiting on an X-ray result.
    pub fn pending_xray(&self) -> Option<i64> {
        match self.status() {
            Some(ContentStatus::Processing) => self.xray_analysis_id(),
            _ => None,
        }
    }

    /// Returns the finished analysis embedded in the message, if any.
    pub fn xray_result(&self) -> Option<XrayAnalysis> {
        let value = self.value()?.get("xray_analysis_result")?.clone();
        serde_json::from_value::<XrayAnalysis>(value)
            .ok()
            .filter(|analysis| !analysis.is_processing())
    }

    /// Return the content re-serialized with a completed X-ray result.
    ///
    /// Returns `None` for unstructured content, which is left untouched.
    pub fn with_xray_result(&self, analysis: &XrayAnalysis) -> Option<String> {
        let mut value = self.value()?.clone();
        value.insert("status".to_string(), Value::String("completed".to_string()));
        value.insert(
            "xray_analysis_result".to_string(),
            serde_json::to_value(analysis).ok()?,
        );
        serde_json::to_string(&value).ok()
    }

    /// Extract cited research from `related_research`.
    pub fn research_sources(&self) -> Vec<HealthReference> {
        let Some(entries) = self
            .value()
            .and_then(|value| value.get("related_research"))
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };

        entries.iter().filter_map(Value::as_object).map(reference).collect()
    }
}

fn reference(research: &Map<String, Value>) -> HealthReference {
    let field = |key: &str| {
        research
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let name = field("journal").unwrap_or_else(|| "Medical Journal".to_string());
    let url = field("doi").map(|doi| format!("https://doi.org/{}", doi));

    HealthReference {
        source: HealthSource {
            icon: SourceIcon::for_source(&name),
            name,
            url: url.clone(),
        },
        title: field("title").unwrap_or_else(|| "Research Article".to_string()),
        description: Some(field("abstract").unwrap_or_default()),
        url,
        date: field("publication_date"),
    }
}
