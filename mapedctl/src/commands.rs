//! Handlers for the `mapedctl` subcommands
use anyhow::Result;
use libmapedit::{
    Editor, Error,
    marker::MemoryLayer,
    sink::{HttpSink, LogSink, WriteRequest, WriteSink},
    source::FeedSource,
    store::ReloadSummary,
};
use tracing::warn;

pub(crate) mod locations;
pub(crate) mod session;

/// Where edits go: the real endpoint, or the log when there is none (or for a dry run)
#[derive(Debug)]
pub(crate) enum Sink {
    Http(HttpSink),
    Log(LogSink),
}

impl Sink {
    pub(crate) fn new(endpoint_url: Option<String>, dry_run: bool) -> Self {
        match (endpoint_url, dry_run) {
            (Some(url), false) => Sink::Http(HttpSink::new(url)),
            (None, false) => {
                warn!("No endpoint url configured, edits will only be logged");
                Sink::Log(LogSink)
            }
            (_, true) => Sink::Log(LogSink),
        }
    }

    /// Wait for outstanding requests before the process exits
    pub(crate) async fn flush(&self) {
        if let Sink::Http(sink) = self {
            sink.flush().await
        }
    }
}

impl WriteSink for Sink {
    fn send(&self, request: WriteRequest) {
        match self {
            Sink::Http(sink) => sink.send(request),
            Sink::Log(sink) => sink.send(request),
        }
    }
}

pub(crate) type AppEditor = Editor<MemoryLayer, Sink>;

/// Load the feed into the editor. An empty feed is not an error here, it just leaves the editor
/// empty.
pub(crate) async fn load(
    editor: &mut AppEditor,
    source: &dyn FeedSource,
) -> Result<Option<ReloadSummary>> {
    match editor.reload_from(source).await {
        Ok(summary) => Ok(Some(summary)),
        Err(Error::FeedEmpty) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Print the status message left by the last editor action
pub(crate) fn print_status(editor: &AppEditor) {
    if let Some(status) = editor.status() {
        println!("{}", status.text);
    }
}
