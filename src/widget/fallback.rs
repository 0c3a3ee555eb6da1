use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use dioxus::logger::tracing::{debug, warn};
use futures::future::{AbortHandle, Abortable};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Generation, ToolPayload, WidgetReference};

const TOOL_NAME_KEYS: [&str; 3] = ["toolName", "tool_name", "tool"];
const QUESTION_KEYS: [&str; 5] = ["question", "userQuestion", "user_question", "prompt", "query"];

/// Body of a summarization request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub structured_content: Value,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

impl SummaryRequest {
    /// `None` when the payload has no structured content to summarize.
    pub fn from_payload(
        payload: &ToolPayload,
        tool_name: Option<&str>,
        widget: Option<&WidgetReference>,
    ) -> Option<Self> {
        if !payload.has_structured_content() {
            return None;
        }
        let metadata = &payload.metadata;
        let tool_name = tool_name
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| first_text(metadata, &TOOL_NAME_KEYS));

        Some(Self {
            structured_content: payload.structured_content.clone()?,
            metadata: metadata.clone(),
            tool_name,
            widget_reference: widget.map(|w| w.to_string()),
            question: first_text(metadata, &QUESTION_KEYS),
        })
    }
}

fn first_text(metadata: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| metadata.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// Produces a textual summary of structured tool output.
#[async_trait(?Send)]
pub trait Summarizer {
    async fn summarize(&self, request: &SummaryRequest) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackView {
    Loading,
    Summary(String),
    Failed(String),
    NoData,
}

impl FallbackView {
    pub fn text(&self) -> &str {
        match self {
            FallbackView::Loading => "Summarizing tool output…",
            FallbackView::Summary(text) | FallbackView::Failed(text) => text,
            FallbackView::NoData => "No structured data to summarize.",
        }
    }
}

/// Stands in for a widget that could not be resolved. At most one
/// summarization is in flight; starting another or cancelling aborts it.
pub struct FallbackSummarizer {
    summarizer: Rc<dyn Summarizer>,
    generation: Generation,
    in_flight: RefCell<Option<AbortHandle>>,
}

impl FallbackSummarizer {
    pub fn new(summarizer: Rc<dyn Summarizer>) -> Self {
        Self {
            summarizer,
            generation: Generation::default(),
            in_flight: RefCell::new(None),
        }
    }

    /// Returns the view to show, or `None` when this request was aborted
    /// or superseded and its outcome must not be shown.
    pub async fn summarize(
        &self,
        payload: &ToolPayload,
        tool_name: Option<&str>,
        widget: Option<&WidgetReference>,
    ) -> Option<FallbackView> {
        self.cancel();
        let Some(request) = SummaryRequest::from_payload(payload, tool_name, widget) else {
            return Some(FallbackView::NoData);
        };

        let ticket = self.generation.advance();
        let (handle, registration) = AbortHandle::new_pair();
        *self.in_flight.borrow_mut() = Some(handle);

        let summarizer = self.summarizer.clone();
        let outcome = Abortable::new(
            async move { summarizer.summarize(&request).await },
            registration,
        )
        .await;

        if !self.generation.is_current(ticket) {
            debug!("dropping superseded summary");
            return None;
        }
        self.in_flight.borrow_mut().take();

        match outcome {
            Err(_aborted) => None,
            Ok(Ok(summary)) if summary.trim().is_empty() => Some(FallbackView::NoData),
            Ok(Ok(summary)) => Some(FallbackView::Summary(summary)),
            Ok(Err(e)) => {
                warn!("summarizing tool output failed: {e:#}");
                Some(FallbackView::Failed(format!("{e:#}")))
            }
        }
    }

    pub fn cancel(&self) {
        self.generation.advance();
        if let Some(handle) = self.in_flight.borrow_mut().take() {
            handle.abort();
        }
    }
}
