//! An interactive editing session
//!
//! Everything runs on a single event loop: lines typed by the operator, ticks of the reload
//! interval, and completed feed fetches all arrive as events and are handled one at a time.
//! Fetches run in the background, so a reload can still be in flight while the operator edits.
use crate::{
    cli::{SessionCommands, SessionLine},
    commands::{AppEditor, print_status},
    output::{
        self, OutputFormat,
        rows::{LegendRow, LocationRow},
    },
};
use anyhow::Result;
use clap::Parser;
use libmapedit::{
    Error,
    location::Status,
    mode::Mode,
    schedule::{Scheduler, TokioScheduler},
    source::FeedSource,
    store::LocationForm,
};
use std::{sync::Arc, time::Duration};
use strum::IntoEnumIterator;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc::{UnboundedSender, unbounded_channel},
};
use tracing::{debug, info, warn};

#[derive(Debug)]
enum Event {
    Line(String),
    EndOfInput,
    Tick,
    Fetched(libmapedit::Result<String>),
}

enum Flow {
    Continue,
    Quit,
}

fn start_fetch(source: &Arc<dyn FeedSource>, tx: &UnboundedSender<Event>) {
    let source = source.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let res = source.fetch().await;
        _ = tx.send(Event::Fetched(res));
    });
}

fn print_locations(editor: &AppEditor) -> Result<()> {
    let store = editor.store();
    let rows = store
        .locations()
        .filter_map(|loc| store.marker(loc.id).map(|m| LocationRow::new(loc, m)));
    println!("{}", output::format_seq(rows, OutputFormat::Table)?);
    Ok(())
}

fn print_legend(editor: &AppEditor) -> Result<()> {
    let rows = Status::iter()
        .map(LegendRow::status)
        .chain(
            editor
                .driver_legend()
                .map(|(name, color)| LegendRow::driver(name, color)),
        )
        .collect::<Vec<_>>();
    println!("{}", output::format_seq(rows, OutputFormat::Table)?);
    Ok(())
}

fn print_form(form: &LocationForm) {
    println!("name:      {}", form.name);
    println!("hub:       {}", form.hub);
    println!("address:   {}", form.address);
    println!("viability: {}", form.viability);
    println!("notes:     {}", form.notes);
    println!("expecting: {}", form.expecting);
    println!("driver:    {}", form.driver);
}

fn print_state(editor: &AppEditor) {
    println!("Mode: {}", editor.mode());
    match editor.edit_target() {
        Some(id) => println!("Editing ID {id}"),
        None => println!("No location selected for editing"),
    }
    if let Some((lat, lng)) = editor.selected_coordinate() {
        println!("Selected coordinate: {lat:.6}, {lng:.6}");
    }
    println!(
        "{} locations loaded, next id is {}",
        editor.store().len(),
        editor.store().next_id()
    );
}

/// Handle a single line of operator input
fn handle_line(
    editor: &mut AppEditor,
    form: &mut LocationForm,
    line: &str,
    source: &Arc<dyn FeedSource>,
    tx: &UnboundedSender<Event>,
) -> Result<Flow> {
    if line.trim().is_empty() {
        return Ok(Flow::Continue);
    }
    let command = match SessionLine::try_parse_from(line.split_whitespace()) {
        Ok(parsed) => parsed.command,
        Err(e) => {
            println!("{e}");
            return Ok(Flow::Continue);
        }
    };
    debug!(?command, "session command");
    // validation failures are reported through the editor status, not as errors
    match command {
        SessionCommands::View => editor.set_mode(Mode::View),
        SessionCommands::Edit => editor.set_mode(Mode::Edit),
        SessionCommands::Click { lat, lng } => _ = editor.select_coordinate(lat, lng),
        SessionCommands::Select { id } => {
            if let Ok(loaded) = editor.begin_edit(id) {
                *form = loaded;
            }
        }
        SessionCommands::Set { field, value } => {
            field.set(form, value.join(" "));
            return Ok(Flow::Continue);
        }
        SessionCommands::Form => {
            print_form(form);
            return Ok(Flow::Continue);
        }
        SessionCommands::Submit => {
            if editor.submit(form.clone()).is_ok() {
                *form = LocationForm::default();
            }
        }
        SessionCommands::Delete { id } => _ = editor.delete(id),
        SessionCommands::List => {
            print_locations(editor)?;
            return Ok(Flow::Continue);
        }
        SessionCommands::Legend => {
            print_legend(editor)?;
            return Ok(Flow::Continue);
        }
        SessionCommands::Reload => {
            start_fetch(source, tx);
            println!("Reloading...");
            return Ok(Flow::Continue);
        }
        SessionCommands::Status => {
            print_state(editor);
            return Ok(Flow::Continue);
        }
        SessionCommands::Quit => return Ok(Flow::Quit),
    }
    print_status(editor);
    Ok(Flow::Continue)
}

fn handle_fetched(editor: &mut AppEditor, res: libmapedit::Result<String>) {
    match res.and_then(|text| editor.apply_feed(&text)) {
        Ok(summary) => info!(
            locations = summary.locations,
            dropped = summary.dropped,
            "feed reloaded"
        ),
        Err(Error::FeedEmpty) => debug!("ignoring empty feed"),
        Err(e) => warn!(?e, "Error loading feed"),
    }
}

/// Run the session until the operator quits or input ends
pub(crate) async fn run(
    editor: &mut AppEditor,
    source: Arc<dyn FeedSource>,
    refresh: Duration,
) -> Result<()> {
    let (tx, mut rx) = unbounded_channel();

    let tick_tx = tx.clone();
    let mut scheduler = TokioScheduler;
    let interval = scheduler.on_interval(
        refresh,
        Box::new(move || {
            _ = tick_tx.send(Event::Tick);
        }),
    );

    let line_tx = tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let event = match lines.next_line().await {
                Ok(Some(line)) => Event::Line(line),
                Ok(None) => Event::EndOfInput,
                Err(e) => {
                    warn!(?e, "Failed to read input");
                    Event::EndOfInput
                }
            };
            let done = matches!(event, Event::EndOfInput);
            if line_tx.send(event).is_err() || done {
                break;
            }
        }
    });

    start_fetch(&source, &tx);
    println!("Mode: {}. Type 'help' for a list of commands.", editor.mode());
    let mut form = LocationForm::default();
    while let Some(event) = rx.recv().await {
        match event {
            Event::Tick => {
                // the mode may have changed since the interval was set up
                if editor.reload_permitted() {
                    start_fetch(&source, &tx);
                }
            }
            Event::Fetched(res) => handle_fetched(editor, res),
            Event::Line(line) => {
                if let Flow::Quit = handle_line(editor, &mut form, &line, &source, &tx)? {
                    break;
                }
            }
            Event::EndOfInput => break,
        }
    }
    interval.cancel();
    Ok(())
}
