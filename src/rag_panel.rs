use crate::client::PanelClient;
use crate::error::{PanelError, Result};
use crate::view::{ActionButton, ListView, Notifier, Pane};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const DEFAULT_NB_CHUNKS_TO_RETRIEVE: u32 = 10;
pub const DEFAULT_NB_MULTI_QUERIES: u32 = 3;

const NO_CHUNK_PLACEHOLDER: &str = "No chunk found.";
const SELECT_CHUNK_PLACEHOLDER: &str = "Select a chunk to display its content.";
const CHUNK_LOADING_PLACEHOLDER: &str = "Loading content…";
const ANSWER_WAIT_PLACEHOLDER: &str = "Please wait…";

/// Retrieval strategy selected in the mode dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RagMode {
    #[default]
    Default,
    MultiQuery,
    Fusion,
}

impl RagMode {
    /// Parse a selector value; anything unknown is the default mode
    pub fn from_selector(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "multi-query" | "multi_query" | "multiquery" => RagMode::MultiQuery,
            "rag-fusion" | "fusion" | "rag_fusion" => RagMode::Fusion,
            _ => RagMode::Default,
        }
    }

    pub fn selector(&self) -> &'static str {
        match self {
            RagMode::Default => "default",
            RagMode::MultiQuery => "multi-query",
            RagMode::Fusion => "rag-fusion",
        }
    }
}

/// Payload of `set_rag_mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagConfiguration {
    pub use_multi_query: bool,
    pub use_rag_fusion: bool,
    pub nb_chunks_to_retrieve: u32,
    pub nb_multi_queries: u32,
}

impl RagConfiguration {
    pub fn new(mode: RagMode, nb_chunks_to_retrieve: u32, nb_multi_queries: u32) -> Self {
        RagConfiguration {
            use_multi_query: mode == RagMode::MultiQuery,
            use_rag_fusion: mode == RagMode::Fusion,
            nb_chunks_to_retrieve,
            nb_multi_queries,
        }
    }

    /// Build the configuration from raw form values, falling back to the
    /// defaults when a count is missing, not a number, or not positive
    pub fn from_form(mode: &str, nb_chunks: Option<&str>, nb_queries: Option<&str>) -> Self {
        Self::new(
            RagMode::from_selector(mode),
            parse_count(nb_chunks).unwrap_or(DEFAULT_NB_CHUNKS_TO_RETRIEVE),
            parse_count(nb_queries).unwrap_or(DEFAULT_NB_MULTI_QUERIES),
        )
    }

    pub fn mode(&self) -> RagMode {
        match (self.use_multi_query, self.use_rag_fusion) {
            (true, _) => RagMode::MultiQuery,
            (false, true) => RagMode::Fusion,
            (false, false) => RagMode::Default,
        }
    }
}

impl Default for RagConfiguration {
    fn default() -> Self {
        Self::new(
            RagMode::Default,
            DEFAULT_NB_CHUNKS_TO_RETRIEVE,
            DEFAULT_NB_MULTI_QUERIES,
        )
    }
}

/// Leading-digit parse of a form field, `None` for anything not positive
fn parse_count(raw: Option<&str>) -> Option<u32> {
    let digits: String = raw?
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u32>().ok().filter(|n| *n > 0)
}

/// A chunk returned with an answer, addressed by its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSummary {
    pub title: Option<String>,
}

impl ChunkSummary {
    /// Label shown in the list; untitled chunks are numbered from 1
    pub fn label(&self, index: usize) -> String {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("Chunk {}", index + 1),
        }
    }
}

/// The server sends either `{title}` objects or bare chunk texts
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RawChunk {
    Titled { title: Option<String> },
    Text(String),
}

impl From<RawChunk> for ChunkSummary {
    fn from(raw: RawChunk) -> Self {
        match raw {
            RawChunk::Titled { title } => ChunkSummary { title },
            RawChunk::Text(_) => ChunkSummary { title: None },
        }
    }
}

#[derive(Deserialize, Debug)]
struct MessageResponse {
    #[serde(default)]
    message: String,
    num_chunks: Option<usize>,
    num_texts: Option<usize>,
}

#[derive(Serialize)]
struct ChunkTextRequest {
    chunk_index: usize,
}

#[derive(Deserialize, Debug)]
struct ChunkTextResponse {
    status: String,
    text: Option<String>,
    message: Option<String>,
}

#[derive(Serialize)]
struct QuestionRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize, Debug)]
struct AnswerResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    relevant_chunks: Option<Vec<RawChunk>>,
}

/// Everything the RAG page shows
#[derive(Debug, Clone)]
pub struct RagPanelView {
    pub configure_button: ActionButton,
    pub load_index_button: ActionButton,
    pub answer: Pane,
    pub chunk_list: ListView,
    pub chunk_title: Option<String>,
    pub chunk_detail: Pane,
}

impl Default for RagPanelView {
    fn default() -> Self {
        RagPanelView {
            configure_button: ActionButton::new("Apply mode"),
            load_index_button: ActionButton::new("Load index").disabled(),
            answer: Pane::empty(),
            chunk_list: ListView::new(NO_CHUNK_PLACEHOLDER),
            chunk_title: None,
            chunk_detail: Pane::placeholder(SELECT_CHUNK_PLACEHOLDER),
        }
    }
}

#[derive(Default)]
struct RagPanelState {
    view: RagPanelView,
    /// Chunks of the last answer; replaced wholesale, never patched
    chunks: Vec<ChunkSummary>,
    /// Bumped on every chunk click or re-render; older responses are dropped
    chunk_generation: u64,
    /// Set once a configuration has been accepted by the server
    configured: bool,
}

impl RagPanelState {
    fn render_chunks(&mut self) {
        let labels: Vec<String> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(idx, chunk)| chunk.label(idx))
            .collect();
        self.view.chunk_list.render(labels);
        self.chunk_generation += 1;
    }
}

/// Controller for the RAG query page
pub struct RagPanel<N: Notifier> {
    client: PanelClient,
    base_path: String,
    notifier: N,
    state: Mutex<RagPanelState>,
}

impl<N: Notifier> RagPanel<N> {
    /// Create a controller for the endpoints under `base_path`
    pub fn new(client: PanelClient, base_path: impl Into<String>, notifier: N) -> Self {
        RagPanel {
            client,
            base_path: base_path.into(),
            notifier,
            state: Mutex::new(RagPanelState::default()),
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Snapshot of the current view
    pub fn view(&self) -> RagPanelView {
        self.state().view.clone()
    }

    /// Chunks of the most recent answer
    pub fn cached_chunks(&self) -> Vec<ChunkSummary> {
        self.state().chunks.clone()
    }

    fn state(&self) -> MutexGuard<'_, RagPanelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn path(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_path, endpoint)
    }

    /// Send the retrieval configuration; unlocks index loading on success
    pub async fn configure(&self, config: RagConfiguration) {
        {
            let mut state = self.state();
            if state.view.configure_button.disabled {
                debug!("Configuration already in flight, ignoring");
                return;
            }
            state.view.configure_button.set_loading(true);
        }

        let result: Result<MessageResponse> =
            self.client.post_json(&self.path("set_rag_mode"), &config).await;

        let alert = {
            let mut state = self.state();
            let alert = match result {
                Ok(response) => {
                    info!("{}", response.message);
                    state.configured = true;
                    state.view.load_index_button.disabled = false;
                    "RAG mode configured successfully!".to_string()
                }
                Err(err) => {
                    error!("RAG configuration failed: {}", err);
                    format!("Error: {}", err)
                }
            };
            state.view.configure_button.set_loading(false);
            alert
        };
        self.notifier.alert(&alert);
    }

    /// Read back the configuration currently active on the server
    pub async fn current_configuration(&self) -> Result<RagConfiguration> {
        self.client.get_json(&self.path("set_rag_mode")).await
    }

    /// Load the index, then the chunk source, clearing any cached chunks
    pub async fn load_index(&self) {
        {
            let mut state = self.state();
            if state.view.load_index_button.is_loading() {
                debug!("Index load already in flight, ignoring");
                return;
            }
            if !state.configured {
                drop(state);
                warn!("Load index requested before the RAG mode was configured");
                self.notifier.alert("Configure the RAG mode first.");
                return;
            }
            state.view.load_index_button.set_loading(true);
        }

        let result = self.load_index_and_chunks().await;

        let alert = {
            let mut state = self.state();
            let alert = match result {
                Ok(()) => {
                    state.chunks.clear();
                    state.render_chunks();
                    state.view.chunk_detail.set_placeholder(SELECT_CHUNK_PLACEHOLDER);
                    "Index and chunks loaded! Ask your question.".to_string()
                }
                Err(err) => {
                    error!("Loading index failed: {}", err);
                    format!("Error: {}", err)
                }
            };
            state.view.load_index_button.set_loading(false);
            alert
        };
        self.notifier.alert(&alert);
    }

    async fn load_index_and_chunks(&self) -> Result<()> {
        let index: MessageResponse = self.client.get_json(&self.path("Load_Annoy_Index")).await?;
        info!("{}", index.message);

        let chunks: MessageResponse = self.client.get_json(&self.path("Load_Chunks")).await?;
        info!("{}", chunks.message);
        if let (Some(num_chunks), Some(num_texts)) = (chunks.num_chunks, chunks.num_texts) {
            info!("Server holds {} chunks and {} texts", num_chunks, num_texts);
        }

        Ok(())
    }

    /// Ask a question; an empty question is ignored
    pub async fn submit_question(&self, question: &str) {
        let query = question.trim();
        if query.is_empty() {
            return;
        }

        self.state().view.answer.set_placeholder(ANSWER_WAIT_PLACEHOLDER);

        let result: Result<AnswerResponse> = self
            .client
            .post_json(&self.path("Retrieve_And_Generate"), &QuestionRequest { query })
            .await;

        let mut state = self.state();
        match result {
            Ok(answer) => {
                state.view.answer.set_text(answer.response);
                state.chunks = answer
                    .relevant_chunks
                    .unwrap_or_default()
                    .into_iter()
                    .map(ChunkSummary::from)
                    .collect();
                info!("Answer received with {} chunks", state.chunks.len());
                state.render_chunks();
            }
            Err(err) => {
                error!("Question failed: {}", err);
                state.view.answer.set_error(err.to_string());
            }
        }
    }

    /// Rebuild the chunk list from the cached chunks
    pub fn render_chunk_list(&self) {
        self.state().render_chunks();
    }

    /// Show only chunks whose label contains `term`
    pub fn filter_chunks(&self, term: &str) {
        self.state().view.chunk_list.apply_filter(term);
    }

    /// Click on the chunk at `index`: highlight it and fetch its text
    pub async fn select_chunk(&self, index: usize) {
        let Some(generation) = self.begin_chunk_selection(index) else {
            warn!("No visible chunk at position {}", index);
            return;
        };

        let result = self.fetch_chunk_text(index).await;
        self.apply_chunk_text(generation, index, result);
    }

    fn begin_chunk_selection(&self, index: usize) -> Option<u64> {
        let mut state = self.state();
        let label = state.view.chunk_list.activate(index)?.label.clone();

        state.view.chunk_title = Some(label);
        state.view.chunk_detail.set_placeholder(CHUNK_LOADING_PLACEHOLDER);
        state.chunk_generation += 1;
        Some(state.chunk_generation)
    }

    fn apply_chunk_text(&self, generation: u64, index: usize, result: Result<String>) {
        let mut state = self.state();
        if state.chunk_generation != generation {
            debug!("Discarding stale text for chunk {}", index);
            return;
        }

        match result {
            Ok(text) => state.view.chunk_detail.set_text(text),
            Err(PanelError::Server(message)) => {
                error!("Chunk {} rejected: {}", index, message);
                state.view.chunk_detail.set_error(format!("Error: {}", message));
            }
            Err(err) => {
                error!("Chunk {} could not be loaded: {}", index, err);
                state
                    .view
                    .chunk_detail
                    .set_error(format!("Error while retrieving the chunk: {}", err));
            }
        }
    }

    async fn fetch_chunk_text(&self, index: usize) -> Result<String> {
        let response: ChunkTextResponse = self
            .client
            .post_json(
                &self.path("Access_Text_Of_Chunk"),
                &ChunkTextRequest { chunk_index: index },
            )
            .await?;

        if response.status == "success" {
            Ok(response.text.unwrap_or_default())
        } else {
            Err(PanelError::Server(
                response
                    .message
                    .unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelsConfig;
    use crate::view::testing::RecordingNotifier;
    use crate::view::PaneKind;
    use mockito::Matcher;
    use serde_json::json;

    const BASE: &str = "/Rag_Using_Page";

    fn panel_for(server: &mockito::ServerGuard) -> RagPanel<RecordingNotifier> {
        let config = PanelsConfig::default().with_server_url(server.url());
        let client = PanelClient::new(&config).unwrap();
        RagPanel::new(client, BASE, RecordingNotifier::default())
    }

    async fn mock_json(
        server: &mut mockito::ServerGuard,
        method: &str,
        path: &str,
        status: usize,
        body: serde_json::Value,
    ) -> mockito::Mock {
        server
            .mock(method, path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    async fn answered_panel(
        server: &mut mockito::ServerGuard,
        chunks: serde_json::Value,
    ) -> (RagPanel<RecordingNotifier>, mockito::Mock) {
        let mock = server
            .mock("POST", "/Rag_Using_Page/Retrieve_And_Generate")
            .match_body(Matcher::Json(json!({"query": "Capital of France?"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"status": "success", "response": "Paris", "relevant_chunks": chunks})
                    .to_string(),
            )
            .create_async()
            .await;
        let panel = panel_for(server);
        panel.submit_question("Capital of France?").await;
        (panel, mock)
    }

    #[test]
    fn test_configuration_maps_mode_to_flags() {
        let default = RagConfiguration::from_form("default", Some("5"), Some("2"));
        assert!(!default.use_multi_query && !default.use_rag_fusion);

        let multi = RagConfiguration::from_form("multi-query", Some("5"), Some("2"));
        assert!(multi.use_multi_query && !multi.use_rag_fusion);
        assert_eq!(multi.mode(), RagMode::MultiQuery);

        let fusion = RagConfiguration::from_form("rag-fusion", Some("5"), Some("2"));
        assert!(!fusion.use_multi_query && fusion.use_rag_fusion);
        assert_eq!(fusion.nb_chunks_to_retrieve, 5);
        assert_eq!(fusion.nb_multi_queries, 2);
    }

    #[test]
    fn test_configuration_falls_back_to_defaults() {
        let config = RagConfiguration::from_form("default", None, Some("many"));
        assert_eq!(config.nb_chunks_to_retrieve, 10);
        assert_eq!(config.nb_multi_queries, 3);

        let config = RagConfiguration::from_form("default", Some("0"), Some("-4"));
        assert_eq!(config.nb_chunks_to_retrieve, 10);
        assert_eq!(config.nb_multi_queries, 3);

        let config = RagConfiguration::from_form("default", Some(" 12abc"), Some(""));
        assert_eq!(config.nb_chunks_to_retrieve, 12);
        assert_eq!(config.nb_multi_queries, 3);
    }

    #[test]
    fn test_chunk_label_falls_back_to_position() {
        assert_eq!(ChunkSummary { title: None }.label(0), "Chunk 1");
        assert_eq!(ChunkSummary { title: Some(String::new()) }.label(2), "Chunk 3");
        assert_eq!(
            ChunkSummary { title: Some("Paris".to_string()) }.label(0),
            "Paris"
        );
    }

    #[tokio::test]
    async fn test_configure_enables_load_index() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/Rag_Using_Page/set_rag_mode")
            .match_body(Matcher::Json(json!({
                "use_multi_query": true,
                "use_rag_fusion": false,
                "nb_chunks_to_retrieve": 10,
                "nb_multi_queries": 3
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "success", "message": "modes set"}"#)
            .create_async()
            .await;

        let panel = panel_for(&server);
        assert!(panel.view().load_index_button.disabled);

        panel
            .configure(RagConfiguration::from_form("multi-query", None, None))
            .await;

        mock.assert_async().await;
        let view = panel.view();
        assert!(!view.load_index_button.disabled);
        assert!(!view.configure_button.disabled);
        assert_eq!(view.configure_button.label, "Apply mode");
        assert_eq!(panel.notifier().alerts(), vec!["RAG mode configured successfully!"]);
    }

    #[tokio::test]
    async fn test_configure_failure_keeps_load_index_disabled() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/Rag_Using_Page/set_rag_mode")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let panel = panel_for(&server);
        panel.configure(RagConfiguration::default()).await;

        let view = panel.view();
        assert!(view.load_index_button.disabled);
        assert_eq!(view.configure_button.label, "Apply mode");
        assert!(!view.configure_button.disabled);
        let alerts = panel.notifier().alerts();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains("500"));
        assert!(alerts[0].contains("boom"));
    }

    #[tokio::test]
    async fn test_load_index_requires_configuration() {
        let mut server = mockito::Server::new_async().await;
        let index = server
            .mock("GET", "/Rag_Using_Page/Load_Annoy_Index")
            .expect(0)
            .create_async()
            .await;

        let panel = panel_for(&server);
        panel.load_index().await;

        index.assert_async().await;
        assert_eq!(panel.notifier().alerts(), vec!["Configure the RAG mode first."]);
    }

    #[tokio::test]
    async fn test_load_index_clears_cached_chunks() {
        let mut server = mockito::Server::new_async().await;
        let _mock = mock_json(
            &mut server,
            "POST",
            "/Rag_Using_Page/set_rag_mode",
            200,
            json!({"message": "ok"}),
        )
        .await;
        let _mock = mock_json(
            &mut server,
            "GET",
            "/Rag_Using_Page/Load_Annoy_Index",
            200,
            json!({"status": "success", "message": "Annoy index loaded successfully."}),
        )
        .await;
        let _mock = mock_json(
            &mut server,
            "GET",
            "/Rag_Using_Page/Load_Chunks",
            200,
            json!({"status": "success", "message": "Chunks loaded", "num_chunks": 4, "num_texts": 4}),
        )
        .await;

        let (panel, _answer) = answered_panel(&mut server, json!([{"title": "A"}, {"title": "B"}])).await;
        assert_eq!(panel.cached_chunks().len(), 2);

        panel.configure(RagConfiguration::default()).await;
        panel.load_index().await;

        let view = panel.view();
        assert!(panel.cached_chunks().is_empty());
        assert_eq!(view.chunk_list.message(), Some(NO_CHUNK_PLACEHOLDER));
        assert_eq!(view.chunk_detail, Pane::placeholder(SELECT_CHUNK_PLACEHOLDER));
        assert!(!view.load_index_button.disabled);
        assert_eq!(view.load_index_button.label, "Load index");
    }

    #[tokio::test]
    async fn test_load_chunks_failure_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = mock_json(
            &mut server,
            "POST",
            "/Rag_Using_Page/set_rag_mode",
            200,
            json!({"message": "ok"}),
        )
        .await;
        let _mock = mock_json(
            &mut server,
            "GET",
            "/Rag_Using_Page/Load_Annoy_Index",
            200,
            json!({"message": "loaded"}),
        )
        .await;
        let _mock = mock_json(
            &mut server,
            "GET",
            "/Rag_Using_Page/Load_Chunks",
            500,
            json!({"status": "error", "message": "pickle missing"}),
        )
        .await;

        let (panel, _answer) = answered_panel(&mut server, json!([{"title": "A"}])).await;
        panel.configure(RagConfiguration::default()).await;
        panel.load_index().await;

        let alerts = panel.notifier().alerts();
        let last = alerts.last().unwrap();
        assert!(last.contains("500"));
        assert!(last.contains("pickle missing"));
        assert_eq!(panel.cached_chunks().len(), 1);
        assert!(!panel.view().load_index_button.disabled);
    }

    #[tokio::test]
    async fn test_answer_replaces_chunks_in_order() {
        let mut server = mockito::Server::new_async().await;
        let (panel, _answer) = answered_panel(
            &mut server,
            json!([{"title": "Paris"}, {"title": "France"}, "raw chunk text"]),
        )
        .await;

        let view = panel.view();
        assert_eq!(view.answer.content, "Paris");
        assert_eq!(view.answer.kind, PaneKind::Text);
        assert_eq!(
            view.chunk_list.visible_labels(),
            vec!["Paris", "France", "Chunk 3"]
        );
    }

    #[tokio::test]
    async fn test_empty_question_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/Rag_Using_Page/Retrieve_And_Generate")
            .expect(0)
            .create_async()
            .await;

        let panel = panel_for(&server);
        panel.submit_question("   ").await;

        mock.assert_async().await;
        assert_eq!(panel.view().answer, Pane::empty());
    }

    #[tokio::test]
    async fn test_failed_question_keeps_previous_chunks() {
        let mut server = mockito::Server::new_async().await;
        let (panel, _answer) = answered_panel(&mut server, json!([{"title": "Kept"}])).await;

        let _failure = server
            .mock("POST", "/Rag_Using_Page/Retrieve_And_Generate")
            .match_body(Matcher::Json(json!({"query": "Another one"})))
            .with_status(500)
            .with_body("server error")
            .create_async()
            .await;

        panel.submit_question("Another one").await;

        let view = panel.view();
        assert!(view.answer.is_error());
        assert!(view.answer.content.contains("500"));
        assert!(view.answer.content.contains("server error"));
        assert_eq!(view.chunk_list.visible_labels(), vec!["Kept"]);
    }

    #[tokio::test]
    async fn test_select_chunk_shows_text() {
        let mut server = mockito::Server::new_async().await;
        let (panel, _answer) = answered_panel(
            &mut server,
            json!([{"title": "a"}, {"title": "b"}, {"title": "c"}]),
        )
        .await;
        let _chunk = server
            .mock("POST", "/Rag_Using_Page/Access_Text_Of_Chunk")
            .match_body(Matcher::Json(json!({"chunk_index": 2})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "success", "text": "hello"}"#)
            .create_async()
            .await;

        panel.select_chunk(2).await;

        let view = panel.view();
        assert_eq!(view.chunk_detail.content, "hello");
        assert_eq!(view.chunk_detail.kind, PaneKind::Text);
        assert_eq!(view.chunk_title.as_deref(), Some("c"));
        assert_eq!(view.chunk_list.active_index(), Some(2));
    }

    #[tokio::test]
    async fn test_select_chunk_server_error_is_inline() {
        let mut server = mockito::Server::new_async().await;
        let (panel, _answer) = answered_panel(&mut server, json!([{"title": "a"}])).await;
        let _mock = mock_json(
            &mut server,
            "POST",
            "/Rag_Using_Page/Access_Text_Of_Chunk",
            200,
            json!({"status": "error", "message": "no such chunk"}),
        )
        .await;

        panel.select_chunk(0).await;

        let detail = panel.view().chunk_detail;
        assert!(detail.is_error());
        assert_eq!(detail.content, "Error: no such chunk");
    }

    #[tokio::test]
    async fn test_configure_ignores_click_while_in_flight() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/Rag_Using_Page/set_rag_mode")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "ok"}"#)
            .expect(1)
            .create_async()
            .await;

        let panel = panel_for(&server);
        tokio::join!(
            panel.configure(RagConfiguration::default()),
            panel.configure(RagConfiguration::default())
        );

        mock.assert_async().await;
        assert_eq!(panel.notifier().alerts(), vec!["RAG mode configured successfully!"]);
        assert!(!panel.view().configure_button.disabled);
    }

    #[tokio::test]
    async fn test_load_index_ignores_click_while_in_flight() {
        let mut server = mockito::Server::new_async().await;
        let _mode = mock_json(
            &mut server,
            "POST",
            "/Rag_Using_Page/set_rag_mode",
            200,
            json!({"message": "ok"}),
        )
        .await;
        let index = server
            .mock("GET", "/Rag_Using_Page/Load_Annoy_Index")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "loaded"}"#)
            .expect(1)
            .create_async()
            .await;
        let _chunks = mock_json(
            &mut server,
            "GET",
            "/Rag_Using_Page/Load_Chunks",
            200,
            json!({"message": "chunks loaded"}),
        )
        .await;

        let panel = panel_for(&server);
        panel.configure(RagConfiguration::default()).await;
        tokio::join!(panel.load_index(), panel.load_index());

        index.assert_async().await;
        assert_eq!(
            panel.notifier().alerts(),
            vec![
                "RAG mode configured successfully!",
                "Index and chunks loaded! Ask your question."
            ]
        );
        assert!(!panel.view().load_index_button.disabled);
    }

    #[tokio::test]
    async fn test_select_chunk_status_error_is_inline() {
        let mut server = mockito::Server::new_async().await;
        let (panel, _answer) = answered_panel(&mut server, json!([{"title": "a"}])).await;
        let _chunk = mock_json(
            &mut server,
            "POST",
            "/Rag_Using_Page/Access_Text_Of_Chunk",
            400,
            json!({"status": "error", "message": "Chunk index is required."}),
        )
        .await;

        panel.select_chunk(0).await;

        let detail = panel.view().chunk_detail;
        assert!(detail.is_error());
        assert!(detail.content.contains("400"));
        assert!(detail.content.contains("Chunk index is required."));
    }

    #[tokio::test]
    async fn test_hidden_chunk_cannot_be_selected() {
        let mut server = mockito::Server::new_async().await;
        let (panel, _answer) =
            answered_panel(&mut server, json!([{"title": "Louvre"}, {"title": "Eiffel"}])).await;
        let chunk = server
            .mock("POST", "/Rag_Using_Page/Access_Text_Of_Chunk")
            .expect(0)
            .create_async()
            .await;

        panel.filter_chunks("eiffel");
        panel.select_chunk(0).await;

        chunk.assert_async().await;
        let view = panel.view();
        assert_eq!(view.chunk_list.active_index(), None);
        assert_eq!(view.chunk_title, None);
    }

    #[tokio::test]
    async fn test_stale_chunk_response_is_discarded() {
        let mut server = mockito::Server::new_async().await;
        let (panel, _answer) = answered_panel(&mut server, json!([{"title": "a"}, {"title": "b"}])).await;

        let first = panel.begin_chunk_selection(0).unwrap();
        let second = panel.begin_chunk_selection(1).unwrap();

        panel.apply_chunk_text(second, 1, Ok("second".to_string()));
        panel.apply_chunk_text(first, 0, Ok("first".to_string()));

        let view = panel.view();
        assert_eq!(view.chunk_detail.content, "second");
        assert_eq!(view.chunk_list.active_index(), Some(1));
    }

    #[tokio::test]
    async fn test_filter_leaves_cache_alone() {
        let mut server = mockito::Server::new_async().await;
        let (panel, _answer) = answered_panel(
            &mut server,
            json!([{"title": "Eiffel Tower"}, {"title": "Louvre"}, {"title": "eiffel bridge"}]),
        )
        .await;

        panel.filter_chunks("EIFFEL");
        assert_eq!(
            panel.view().chunk_list.visible_labels(),
            vec!["Eiffel Tower", "eiffel bridge"]
        );
        assert_eq!(panel.cached_chunks().len(), 3);

        panel.filter_chunks("");
        assert_eq!(
            panel.view().chunk_list.visible_labels(),
            vec!["Eiffel Tower", "Louvre", "eiffel bridge"]
        );
    }

    #[tokio::test]
    async fn test_current_configuration_is_read_back() {
        let mut server = mockito::Server::new_async().await;
        let _mock = mock_json(
            &mut server,
            "GET",
            "/Rag_Using_Page/set_rag_mode",
            200,
            json!({
                "use_multi_query": false,
                "use_rag_fusion": true,
                "nb_chunks_to_retrieve": 7,
                "nb_multi_queries": 3
            }),
        )
        .await;

        let panel = panel_for(&server);
        let config = panel.current_configuration().await.unwrap();
        assert_eq!(config.mode(), RagMode::Fusion);
        assert_eq!(config.nb_chunks_to_retrieve, 7);
    }
}
