use crate::client::PanelClient;
use crate::error::{PanelError, Result};
use crate::filter::filter_names;
use crate::view::{DownloadLink, ListView, Pane};
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

const NO_FILE_PLACEHOLDER: &str = "No file found.";
const FILE_ERROR_MESSAGE: &str = "Error while loading the file.";

/// Everything the document page shows
#[derive(Debug, Clone)]
pub struct DocumentBrowserView {
    pub file_list: ListView,
    /// Heading above the text, the name of the displayed file
    pub file_name: Option<String>,
    pub file_text: Pane,
    pub download: DownloadLink,
}

impl Default for DocumentBrowserView {
    fn default() -> Self {
        DocumentBrowserView {
            file_list: ListView::new(NO_FILE_PLACEHOLDER),
            file_name: None,
            file_text: Pane::empty(),
            download: DownloadLink::default(),
        }
    }
}

#[derive(Default)]
struct BrowserState {
    view: DocumentBrowserView,
    /// Names from the last successful list fetch
    all_files: Vec<String>,
    content_generation: u64,
}

/// Controller for the document browser page
pub struct DocumentBrowser {
    client: PanelClient,
    base_path: String,
    state: Mutex<BrowserState>,
}

impl DocumentBrowser {
    /// Create a controller for the endpoints under `base_path`
    pub fn new(client: PanelClient, base_path: impl Into<String>) -> Self {
        DocumentBrowser {
            client,
            base_path: base_path.into(),
            state: Mutex::new(BrowserState::default()),
        }
    }

    pub fn view(&self) -> DocumentBrowserView {
        self.state().view.clone()
    }

    /// Names from the last successful list fetch, unfiltered
    pub fn all_files(&self) -> Vec<String> {
        self.state().all_files.clone()
    }

    fn state(&self) -> MutexGuard<'_, BrowserState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Server path of a file, escaped as a single segment
    pub fn file_path(&self, file_name: &str) -> String {
        format!(
            "{}/get_file/{}",
            self.base_path,
            urlencoding::encode(file_name)
        )
    }

    /// Fetch the file names and render them
    pub async fn load_file_list(&self) {
        let result: Result<Vec<String>> = self
            .client
            .get_json(&format!("{}/list_files", self.base_path))
            .await;

        let mut state = self.state();
        match result {
            Ok(files) => {
                info!("Loaded {} file names", files.len());
                state.view.file_list.render(files.iter().cloned());
                state.all_files = files;
            }
            Err(err) => {
                error!("Loading file list failed: {}", err);
                state.all_files.clear();
                state
                    .view
                    .file_list
                    .show_message(format!("Error while loading the file list: {}", err));
            }
        }
    }

    /// Clear and rebuild the list from `files`
    pub fn render_file_list(&self, files: &[String]) {
        self.state().view.file_list.render(files.iter().cloned());
    }

    /// Re-render the subset of all files whose name contains `term`
    pub fn filter_files(&self, term: &str) {
        let mut state = self.state();
        let filtered = filter_names(&state.all_files, term);
        state.view.file_list.render(filtered);
    }

    /// Click on the rendered item at `index`
    pub async fn select_file(&self, index: usize) {
        let file_name = {
            let mut state = self.state();
            match state.view.file_list.activate(index) {
                Some(item) => item.label.clone(),
                None => {
                    debug!("No file at position {}", index);
                    return;
                }
            }
        };

        self.display_file_content(&file_name).await;
    }

    /// Fetch a file and show its text together with a download link
    pub async fn display_file_content(&self, file_name: &str) {
        let generation = self.begin_file_display();
        let result = self.client.get_text(&self.file_path(file_name)).await;
        self.apply_file_content(generation, file_name, result);
    }

    fn begin_file_display(&self) -> u64 {
        let mut state = self.state();
        state.content_generation += 1;
        state.content_generation
    }

    fn apply_file_content(&self, generation: u64, file_name: &str, result: Result<String>) {
        let mut state = self.state();
        if state.content_generation != generation {
            debug!("Discarding stale content for {}", file_name);
            return;
        }

        match result {
            Ok(content) => {
                let href = self.client.url(&self.file_path(file_name));
                state.view.file_name = Some(file_name.to_string());
                state.view.file_text.set_text(content);
                state.view.download.point_at(href, file_name);
            }
            Err(err) => {
                error!("Loading {} failed: {}", file_name, err);
                state.view.file_name = None;
                state
                    .view
                    .file_text
                    .set_error(format!("{}: {}", FILE_ERROR_MESSAGE, err));
                state.view.download.hide();
            }
        }
    }

    /// Save a file from the server into `dir`, returning the written path
    pub async fn download(&self, file_name: &str, dir: &Path) -> Result<PathBuf> {
        if !is_plain_file_name(file_name) {
            return Err(PanelError::Config(format!(
                "refusing to save under a non-plain name: {}",
                file_name
            )));
        }

        let content = self.client.get_text(&self.file_path(file_name)).await?;
        let target = dir.join(file_name);
        tokio::fs::write(&target, content).await?;

        info!("Saved {} to {}", file_name, target.display());
        Ok(target)
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}
