use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use libmapedit::{location::LocationId, store::LocationForm};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Use the given configuration file")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Url of the published csv feed")]
    pub feed_url: Option<String>,
    #[arg(
        long,
        global = true,
        conflicts_with = "feed_url",
        help = "Read the feed from a local csv file"
    )]
    pub feed_file: Option<PathBuf>,
    #[arg(long, global = true, help = "Url of the endpoint that edits are posted to")]
    pub endpoint_url: Option<String>,
    #[arg(long, global = true, help = "Log edits instead of sending them")]
    pub dry_run: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct OutputOptions {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// Values for the fields of a location. Fields that are not given keep their current value.
#[derive(Args, Debug, Default)]
pub struct FieldArgs {
    #[arg(long, help = "Name of the location")]
    pub name: Option<String>,
    #[arg(long, help = "Whether the location is a hub ('Yes' or 'No')")]
    pub hub: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long, help = "Viability score out of 10")]
    pub viability: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long, help = "Whether a load is expected ('Yes' or 'No')")]
    pub expecting: Option<String>,
    #[arg(long, help = "Name of the driver responsible for the location")]
    pub driver: Option<String>,
}

impl FieldArgs {
    pub fn apply_to(self, form: &mut LocationForm) {
        let fields = [
            (self.name, &mut form.name),
            (self.hub, &mut form.hub),
            (self.address, &mut form.address),
            (self.viability, &mut form.viability),
            (self.notes, &mut form.notes),
            (self.expecting, &mut form.expecting),
            (self.driver, &mut form.driver),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "List all locations in the feed")]
    Show {
        #[command(flatten)]
        output: OutputOptions,
    },
    #[command(about = "Show the marker status colors and the current driver colors")]
    Legend {
        #[command(flatten)]
        output: OutputOptions,
    },
    #[command(about = "Add a new location")]
    Add {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[command(flatten)]
        fields: FieldArgs,
    },
    #[command(
        about="Modify properties of an existing location",
        group(
            clap::ArgGroup::new("modify")
                .required(true)
                .multiple(true)
                .args(&["name", "hub", "address", "viability", "notes", "expecting", "driver"]),
        ))]
    Modify {
        #[arg(long)]
        id: LocationId,
        #[command(flatten)]
        fields: FieldArgs,
    },
    #[command(about = "Remove an existing location")]
    Remove { id: LocationId },
    #[command(about = "Run an interactive editing session that keeps reloading the feed")]
    Session,
    #[command(about = "Save the effective configuration to the configuration file")]
    Config,
}

/// Fields of the edit form that can be set during a session
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum FormField {
    Name,
    Hub,
    Address,
    Viability,
    Notes,
    Expecting,
    Driver,
}

impl FormField {
    pub fn set(&self, form: &mut LocationForm, value: String) {
        let field = match self {
            FormField::Name => &mut form.name,
            FormField::Hub => &mut form.hub,
            FormField::Address => &mut form.address,
            FormField::Viability => &mut form.viability,
            FormField::Notes => &mut form.notes,
            FormField::Expecting => &mut form.expecting,
            FormField::Driver => &mut form.driver,
        };
        *field = value;
    }
}

/// A single line typed during an interactive session
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_flag = true)]
pub struct SessionLine {
    #[command(subcommand)]
    pub command: SessionCommands,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    #[command(about = "Switch to view mode")]
    View,
    #[command(about = "Switch to edit mode")]
    Edit,
    #[command(about = "Pick a coordinate on the map for a new location")]
    Click {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
    #[command(about = "Load an existing location into the form for editing")]
    Select { id: LocationId },
    #[command(about = "Set a field of the form")]
    Set {
        field: FormField,
        #[arg(allow_hyphen_values = true)]
        value: Vec<String>,
    },
    #[command(about = "Show the form")]
    Form,
    #[command(about = "Add or update a location from the form")]
    Submit,
    #[command(about = "Delete a location")]
    Delete { id: LocationId },
    #[command(about = "List all locations")]
    List,
    #[command(about = "Show the marker legend")]
    Legend,
    #[command(about = "Reload the feed now")]
    Reload,
    #[command(about = "Show the current mode and selection")]
    Status,
    #[command(about = "End the session")]
    Quit,
}
