//! One-shot commands that load the feed, apply a single action, and exit
use crate::{
    cli::{Commands, FieldArgs, OutputOptions},
    commands::{AppEditor, load, print_status},
    output::{
        self,
        rows::{LegendRow, LocationRow},
    },
};
use anyhow::{Result, anyhow};
use libmapedit::{
    location::{LocationId, Status},
    mode::Mode,
    source::FeedSource,
    store::LocationForm,
};
use strum::IntoEnumIterator;
use tracing::debug;

/// Handle the location commands
pub(crate) async fn handle_command(
    command: Commands,
    editor: &mut AppEditor,
    source: &dyn FeedSource,
) -> Result<()> {
    let summary = load(editor, source).await?;
    debug!(?summary, "loaded feed");
    match command {
        Commands::Show { output } => show(editor, output),
        Commands::Legend { output } => legend(editor, output),
        Commands::Add { lat, lng, fields } => add(editor, lat, lng, fields),
        Commands::Modify { id, fields } => modify(editor, id, fields),
        Commands::Remove { id } => {
            editor.set_mode(Mode::Edit);
            let res = editor.delete(id).map(|_| ());
            print_status(editor);
            Ok(res?)
        }
        Commands::Session | Commands::Config => Err(anyhow!("Not a location command")),
    }
}

fn show(editor: &AppEditor, output: OutputOptions) -> Result<()> {
    let store = editor.store();
    let rows = store
        .locations()
        .filter_map(|loc| store.marker(loc.id).map(|m| LocationRow::new(loc, m)));
    let str = output::format_seq(rows, output.format)?;
    println!("{str}");
    Ok(())
}

fn legend(editor: &AppEditor, output: OutputOptions) -> Result<()> {
    let str = output::format_seq(Status::iter().map(LegendRow::status), output.format)?;
    println!("{str}");
    let drivers: Vec<_> = editor
        .driver_legend()
        .map(|(name, color)| LegendRow::driver(name, color))
        .collect();
    if drivers.is_empty() {
        println!("No drivers assigned");
    } else {
        println!("{}", output::format_seq(drivers, output.format)?);
    }
    Ok(())
}

fn add(editor: &mut AppEditor, lat: f64, lng: f64, mut fields: FieldArgs) -> Result<()> {
    if fields.name.is_none() {
        fields.name = inquire::Text::new("Location name:").prompt_skippable()?;
    }
    let mut form = LocationForm {
        hub: "No".into(),
        expecting: "No".into(),
        ..Default::default()
    };
    fields.apply_to(&mut form);

    editor.set_mode(Mode::Edit);
    let res = editor
        .select_coordinate(lat, lng)
        .and_then(|_| editor.submit(form));
    print_status(editor);
    res?;
    Ok(())
}

fn modify(editor: &mut AppEditor, id: LocationId, fields: FieldArgs) -> Result<()> {
    editor.set_mode(Mode::Edit);
    let res = editor.begin_edit(id).and_then(|mut form| {
        fields.apply_to(&mut form);
        editor.submit(form)
    });
    print_status(editor);
    res?;
    Ok(())
}
