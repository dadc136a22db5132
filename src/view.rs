//! Plain view models standing in for the page elements.
//!
//! Controllers only mutate these structs; a renderer (see `console`) decides
//! how they are shown.

use crate::filter::matches_term;

/// One entry of a rendered list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub label: String,
    pub active: bool,
    pub hidden: bool,
}

/// A list that is either a set of items or a single inline message
#[derive(Debug, Clone, Default)]
pub struct ListView {
    items: Vec<ListItem>,
    message: Option<String>,
    placeholder: String,
}

impl ListView {
    pub fn new(placeholder: impl Into<String>) -> Self {
        ListView {
            items: Vec::new(),
            message: None,
            placeholder: placeholder.into(),
        }
    }

    /// Clear and rebuild the list; shows the placeholder when `labels` is empty
    pub fn render<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = labels
            .into_iter()
            .map(|label| ListItem {
                label: label.into(),
                active: false,
                hidden: false,
            })
            .collect();

        self.message = if self.items.is_empty() {
            Some(self.placeholder.clone())
        } else {
            None
        };
    }

    /// Replace the list with a single inline message (used for errors)
    pub fn show_message(&mut self, message: impl Into<String>) {
        self.items.clear();
        self.message = Some(message.into());
    }

    /// Mark item `index` active and every other item inactive; hidden items
    /// cannot be activated
    pub fn activate(&mut self, index: usize) -> Option<&ListItem> {
        if self.items.get(index).map_or(true, |item| item.hidden) {
            return None;
        }
        for (i, item) in self.items.iter_mut().enumerate() {
            item.active = i == index;
        }
        self.items.get(index)
    }

    /// Hide every item whose label does not contain `term`
    pub fn apply_filter(&mut self, term: &str) {
        for item in &mut self.items {
            item.hidden = !matches_term(&item.label, term);
        }
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn visible_labels(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|item| !item.hidden)
            .map(|item| item.label.as_str())
            .collect()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.items.iter().position(|item| item.active)
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(|item| item.label.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneKind {
    Text,
    Placeholder,
    Error,
}

/// A block of text such as the answer or the chunk detail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pane {
    pub kind: PaneKind,
    pub content: String,
}

impl Pane {
    pub fn placeholder(content: impl Into<String>) -> Self {
        Pane {
            kind: PaneKind::Placeholder,
            content: content.into(),
        }
    }

    pub fn empty() -> Self {
        Pane {
            kind: PaneKind::Text,
            content: String::new(),
        }
    }

    pub fn set_text(&mut self, content: impl Into<String>) {
        self.kind = PaneKind::Text;
        self.content = content.into();
    }

    pub fn set_placeholder(&mut self, content: impl Into<String>) {
        self.kind = PaneKind::Placeholder;
        self.content = content.into();
    }

    pub fn set_error(&mut self, content: impl Into<String>) {
        self.kind = PaneKind::Error;
        self.content = content.into();
    }

    pub fn is_error(&self) -> bool {
        self.kind == PaneKind::Error
    }
}

pub const LOADING_LABEL: &str = "Loading…";

/// A button that shows a loading label while its action is in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub label: String,
    pub disabled: bool,
    original_label: String,
}

impl ActionButton {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        ActionButton {
            original_label: label.clone(),
            label,
            disabled: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.disabled = loading;
        self.label = if loading {
            LOADING_LABEL.to_string()
        } else {
            self.original_label.clone()
        };
    }

    pub fn is_loading(&self) -> bool {
        self.label == LOADING_LABEL && self.disabled
    }
}

/// Download control for the selected document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadLink {
    pub href: String,
    pub file_name: String,
    pub visible: bool,
}

impl DownloadLink {
    pub fn point_at(&mut self, href: impl Into<String>, file_name: impl Into<String>) {
        self.href = href.into();
        self.file_name = file_name.into();
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}

/// Modal notifications (the alert dialog)
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}
