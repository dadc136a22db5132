//! Terminal rendering of the panel views.

use crate::document_browser::DocumentBrowserView;
use crate::rag_panel::RagPanelView;
use crate::view::{ListView, Notifier, Pane, PaneKind};
use log::warn;
use std::fmt::Write;

/// Shows alerts on the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&self, message: &str) {
        warn!("alert: {}", message);
        println!("\n[!] {}", message);
    }
}

fn render_list(out: &mut String, list: &ListView) {
    if let Some(message) = list.message() {
        let _ = writeln!(out, "    {}", message);
        return;
    }

    for (idx, item) in list.items().iter().enumerate() {
        if item.hidden {
            continue;
        }
        let marker = if item.active { '>' } else { ' ' };
        let _ = writeln!(out, "  {}[{}] {}", marker, idx, item.label);
    }
}

fn render_pane(out: &mut String, pane: &Pane) {
    match pane.kind {
        PaneKind::Text => {
            let _ = writeln!(out, "{}", pane.content);
        }
        PaneKind::Placeholder => {
            let _ = writeln!(out, "({})", pane.content);
        }
        PaneKind::Error => {
            let _ = writeln!(out, "error: {}", pane.content);
        }
    }
}

/// Text rendition of the RAG page
pub fn render_rag(view: &RagPanelView) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "[{}]{}  [{}]{}",
        view.configure_button.label,
        if view.configure_button.disabled { " (disabled)" } else { "" },
        view.load_index_button.label,
        if view.load_index_button.disabled { " (disabled)" } else { "" },
    );

    out.push_str("\n== Answer ==\n");
    render_pane(&mut out, &view.answer);

    out.push_str("\n== Chunks ==\n");
    render_list(&mut out, &view.chunk_list);

    out.push_str("\n== Chunk ==\n");
    if let Some(title) = &view.chunk_title {
        let _ = writeln!(out, "# {}", title);
    }
    render_pane(&mut out, &view.chunk_detail);

    out
}

/// Text rendition of the document page
pub fn render_documents(view: &DocumentBrowserView) -> String {
    let mut out = String::new();

    out.push_str("== Files ==\n");
    render_list(&mut out, &view.file_list);

    if let Some(name) = &view.file_name {
        let _ = writeln!(out, "\n# {}", name);
    } else {
        out.push('\n');
    }
    render_pane(&mut out, &view.file_text);

    if view.download.visible {
        let _ = writeln!(
            out,
            "\nDownload: {} (save as {})",
            view.download.href, view.download.file_name
        );
    }

    out
}
