//! Line-oriented front end for both panels.

use crate::console::{render_documents, render_rag};
use crate::document_browser::DocumentBrowser;
use crate::rag_panel::{RagConfiguration, RagPanel};
use crate::view::Notifier;
use anyhow::Result;
use log::{error, info};
use std::io::{BufRead, Write};
use std::path::PathBuf;

const RAG_HELP: &str = "\
commands:
  mode <default|multi-query|rag-fusion> [chunks] [queries]
  show-mode
  load
  ask <question>
  chunk <n>
  search [term]
  view | help | exit";

const PAGES_HELP: &str = "\
commands:
  open <n|name>
  search [term]
  download <n|name> [--to dir]
  refresh
  view | help | exit";

#[derive(Debug, PartialEq, Eq)]
pub enum RagCommand {
    Mode {
        mode: String,
        nb_chunks: Option<String>,
        nb_queries: Option<String>,
    },
    ShowMode,
    Load,
    Ask(String),
    Chunk(usize),
    Search(String),
    View,
    Help,
    Exit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PagesCommand {
    Open(String),
    Search(String),
    Download { file: String, dir: Option<PathBuf> },
    Refresh,
    View,
    Help,
    Exit,
}

/// Split a line into the command word and the rest
fn split_command(line: &str) -> (String, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), rest.trim()),
        None => (line.to_lowercase(), ""),
    }
}

pub fn parse_rag_command(line: &str) -> std::result::Result<RagCommand, String> {
    let (word, rest) = split_command(line);

    match word.as_str() {
        "mode" => {
            let mut args = rest.split_whitespace();
            let mode = args
                .next()
                .ok_or_else(|| "mode needs a value".to_string())?
                .to_string();
            Ok(RagCommand::Mode {
                mode,
                nb_chunks: args.next().map(str::to_string),
                nb_queries: args.next().map(str::to_string),
            })
        }
        "show-mode" => Ok(RagCommand::ShowMode),
        "load" => Ok(RagCommand::Load),
        "ask" => Ok(RagCommand::Ask(rest.to_string())),
        "chunk" => rest
            .parse()
            .map(RagCommand::Chunk)
            .map_err(|_| format!("not a chunk number: {:?}", rest)),
        "search" => Ok(RagCommand::Search(rest.to_string())),
        "view" | "" => Ok(RagCommand::View),
        "help" => Ok(RagCommand::Help),
        "exit" | "quit" => Ok(RagCommand::Exit),
        other => Err(format!("unknown command: {}", other)),
    }
}

pub fn parse_pages_command(line: &str) -> std::result::Result<PagesCommand, String> {
    let (word, rest) = split_command(line);

    match word.as_str() {
        "open" if !rest.is_empty() => Ok(PagesCommand::Open(rest.to_string())),
        "open" => Err("open needs a file".to_string()),
        "search" => Ok(PagesCommand::Search(rest.to_string())),
        "download" => {
            let (file, dir) = match rest.rsplit_once("--to") {
                Some((file, dir)) if !dir.trim().is_empty() => {
                    (file.trim(), Some(PathBuf::from(dir.trim())))
                }
                Some(_) => return Err("--to needs a directory".to_string()),
                None => (rest, None),
            };
            if file.is_empty() {
                return Err("download needs a file".to_string());
            }
            Ok(PagesCommand::Download {
                file: file.to_string(),
                dir,
            })
        }
        "refresh" => Ok(PagesCommand::Refresh),
        "view" | "" => Ok(PagesCommand::View),
        "help" => Ok(PagesCommand::Help),
        "exit" | "quit" => Ok(PagesCommand::Exit),
        other => Err(format!("unknown command: {}", other)),
    }
}

/// Run the RAG panel until `exit` or end of input
pub async fn run_rag_shell<N, R, W>(panel: &RagPanel<N>, input: R, mut output: W) -> Result<()>
where
    N: Notifier,
    R: BufRead,
    W: Write,
{
    info!("RAG panel ready. Type 'help' for commands.");
    writeln!(output, "{}", RAG_HELP)?;

    for line in input.lines() {
        let line = line?;

        let command = match parse_rag_command(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(output, "{}", message)?;
                continue;
            }
        };

        match command {
            RagCommand::Mode {
                mode,
                nb_chunks,
                nb_queries,
            } => {
                let config = RagConfiguration::from_form(
                    &mode,
                    nb_chunks.as_deref(),
                    nb_queries.as_deref(),
                );
                panel.configure(config).await;
            }
            RagCommand::ShowMode => match panel.current_configuration().await {
                Ok(config) => writeln!(
                    output,
                    "mode: {}, chunks: {}, multi-queries: {}",
                    config.mode().selector(),
                    config.nb_chunks_to_retrieve,
                    config.nb_multi_queries
                )?,
                Err(err) => {
                    error!("Reading RAG mode failed: {}", err);
                    writeln!(output, "error: {}", err)?;
                }
            },
            RagCommand::Load => panel.load_index().await,
            RagCommand::Ask(question) => panel.submit_question(&question).await,
            RagCommand::Chunk(index) => panel.select_chunk(index).await,
            RagCommand::Search(term) => panel.filter_chunks(&term),
            RagCommand::View => {}
            RagCommand::Help => {
                writeln!(output, "{}", RAG_HELP)?;
                continue;
            }
            RagCommand::Exit => break,
        }

        writeln!(output, "\n{}", render_rag(&panel.view()))?;
        output.flush()?;
    }

    info!("Goodbye!");
    Ok(())
}

/// Resolve `n|name` against the rendered list
fn resolve_file(browser: &DocumentBrowser, target: &str) -> Option<(Option<usize>, String)> {
    let view = browser.view();

    if let Ok(index) = target.parse::<usize>() {
        return view
            .file_list
            .label(index)
            .map(|label| (Some(index), label.to_string()));
    }

    let position = view
        .file_list
        .items()
        .iter()
        .position(|item| item.label == target);
    Some((position, target.to_string()))
}

/// Run the document browser until `exit` or end of input
pub async fn run_pages_shell<R, W>(browser: &DocumentBrowser, input: R, mut output: W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    browser.load_file_list().await;
    writeln!(output, "{}", PAGES_HELP)?;
    writeln!(output, "\n{}", render_documents(&browser.view()))?;

    for line in input.lines() {
        let line = line?;

        let command = match parse_pages_command(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(output, "{}", message)?;
                continue;
            }
        };

        match command {
            PagesCommand::Open(target) => match resolve_file(browser, &target) {
                Some((Some(index), _)) => browser.select_file(index).await,
                Some((None, name)) => browser.display_file_content(&name).await,
                None => {
                    writeln!(output, "no file at {}", target)?;
                    continue;
                }
            },
            PagesCommand::Search(term) => browser.filter_files(&term),
            PagesCommand::Download { file, dir } => {
                let Some((_, name)) = resolve_file(browser, &file) else {
                    writeln!(output, "no file at {}", file)?;
                    continue;
                };
                let dir = dir.unwrap_or_else(|| PathBuf::from("."));
                match browser.download(&name, &dir).await {
                    Ok(path) => writeln!(output, "saved {}", path.display())?,
                    Err(err) => {
                        error!("Download of {} failed: {}", name, err);
                        writeln!(output, "error: {}", err)?;
                    }
                }
                continue;
            }
            PagesCommand::Refresh => browser.load_file_list().await,
            PagesCommand::View => {}
            PagesCommand::Help => {
                writeln!(output, "{}", PAGES_HELP)?;
                continue;
            }
            PagesCommand::Exit => break,
        }

        writeln!(output, "\n{}", render_documents(&browser.view()))?;
        output.flush()?;
    }

    Ok(())
}
