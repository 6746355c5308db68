//! Chat session endpoints.

use tracing::{debug, instrument};

use praxia_core::Result;
use praxia_core::content::parse_content;
use praxia_core::models::{
    ChatMessage, ChatSession, ChatSessionSummary, ChatTitleRequest, DEFAULT_CHAT_TITLE,
    SendMessageRequest, SendMessageResponse,
};

use crate::client::ApiClient;
use crate::endpoints;
use crate::request::{ApiRequest, FilePart, MultipartForm};

/// Chat session endpoints.
#[derive(Debug, Clone, Copy)]
pub struct ChatApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ChatApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list_sessions(&self) -> Result<Vec<ChatSessionSummary>> {
        self.client
            .request(ApiRequest::get(endpoints::CHAT_SESSIONS))
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_session(&self, id: i64) -> Result<ChatSession> {
        self.client
            .request(ApiRequest::get(endpoints::chat_session(id)))
            .await
    }

    /// Create a session, titled "New Chat" unless a title is given.
    #[instrument(skip(self))]
    pub async fn create_session(&self, title: Option<&str>) -> Result<ChatSession> {
        let title = title.unwrap_or(DEFAULT_CHAT_TITLE);
        let request = ApiRequest::post(endpoints::CHAT_SESSIONS).json(&ChatTitleRequest { title })?;
        self.client.request(request).await
    }

    #[instrument(skip(self))]
    pub async fn messages(&self, session_id: i64) -> Result<Vec<ChatMessage>> {
        self.client
            .request(ApiRequest::get(endpoints::chat_messages(session_id)))
            .await
    }

    /// Post a message, optionally with an X-ray image for the assistant to
    /// analyse.
    ///
    /// Messages with an image are sent as multipart and get the longer
    /// deadline. Research cited in the assistant's answer is attached to the
    /// returned AI message as sources.
    #[instrument(skip(self, content, xray), fields(has_xray = xray.is_some()))]
    pub async fn send_message(
        &self,
        session_id: i64,
        content: &str,
        xray: Option<FilePart>,
    ) -> Result<SendMessageResponse> {
        let config = self.client.config();
        let path = endpoints::chat_messages(session_id);

        let request = match xray {
            Some(file) => {
                let form = MultipartForm::new()
                    .text("content", content)
                    .file("xray_image", file);
                ApiRequest::post(path)
                    .multipart(form)
                    .timeout(config.chat_file_timeout)
            }
            None => ApiRequest::post(path)
                .json(&SendMessageRequest { content })?
                .timeout(config.chat_text_timeout),
        };

        let mut response: SendMessageResponse = self.client.request(request).await?;
        attach_sources(&mut response.ai_message);
        Ok(response)
    }

    /// Wait for the X-ray analysis an assistant message is still processing.
    ///
    /// Returns the message with the finished analysis merged into its
    /// content, or `None` if the message is not waiting on an analysis.
    #[instrument(skip(self, message), fields(message_id = message.id))]
    pub async fn resolve_pending_xray(&self, message: &ChatMessage) -> Result<Option<ChatMessage>> {
        let parsed = parse_content(&message.content);
        let Some(analysis_id) = parsed.pending_xray() else {
            return Ok(None);
        };

        debug!(analysis_id, "Message is waiting on an X-ray analysis");
        let options = self.client.config().chat_xray_poll;
        let analysis = self
            .client
            .xray()
            .poll_for_results(analysis_id, Some(options))
            .await?;

        let mut resolved = message.clone();
        if let Some(content) = parsed.with_xray_result(&analysis) {
            resolved.content = content;
        }
        Ok(Some(resolved))
    }

    #[instrument(skip(self))]
    pub async fn update_title(&self, session_id: i64, title: &str) -> Result<ChatSession> {
        let request = ApiRequest::patch(endpoints::chat_session(session_id))
            .json(&ChatTitleRequest { title })?;
        self.client.request(request).await
    }

    #[instrument(skip(self))]
    pub async fn delete_session(&self, session_id: i64) -> Result<()> {
        self.client
            .request_empty(ApiRequest::delete(endpoints::chat_session(session_id)))
            .await
    }
}

fn attach_sources(message: &mut ChatMessage) {
    if message.content.is_empty() {
        return;
    }

    let sources = parse_content(&message.content).research_sources();
    if !sources.is_empty() {
        debug!(count = sources.len(), "Attaching research sources");
        message.sources = sources;
    }
}
