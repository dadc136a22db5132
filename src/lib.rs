pub mod client;
pub mod config;
pub mod console;
pub mod document_browser;
pub mod error;
pub mod filter;
pub mod rag_panel;
pub mod shell;
pub mod view;
