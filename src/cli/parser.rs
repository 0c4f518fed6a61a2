use clap::{Parser, Subcommand};

/// Command-line interface definition for fdcalllog
/// Fire department call log on SQLite
#[derive(Parser)]
#[command(
    name = "fdcalllog",
    version = env!("CARGO_PKG_VERSION"),
    about = "Fire department call log: incident reports, responders and apparatus with per-year incident numbers",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    /// Log in as this member ("First Last") for commands that change data
    #[arg(global = true, long = "user", value_name = "NAME")]
    pub user: Option<String>,

    /// PIN for --user
    #[arg(global = true, long = "pin", value_name = "PIN")]
    pub pin: Option<String>,

    /// Print results as JSON instead of tables
    #[arg(global = true, long = "json")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing fields to the configuration file")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(long = "editor", help = "Specify the editor to use")]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// File, edit and look up calls
    Call {
        #[command(subcommand)]
        action: CallCmd,
    },

    /// Department members, PINs and admin rights
    User {
        #[command(subcommand)]
        action: UserCmd,
    },

    /// Dropdown values (call types, towns, apparatus, roles, ...)
    Picklist {
        #[command(subcommand)]
        action: PicklistCmd,
    },

    /// Application settings stored in the database
    Settings {
        #[command(subcommand)]
        action: SettingsCmd,
    },

    /// Print the internal log table
    Log,

    /// Print the audit trail
    Audit {
        #[arg(long, help = "Only entries for this table (calls, users, picklists, settings)")]
        table: Option<String>,

        #[arg(long, help = "Only entries for this record id")]
        record: Option<i64>,
    },
}

/// Fields shared by `call add` and `call edit`.
#[derive(clap::Args, Debug, Default)]
pub struct CallFields {
    #[arg(long = "type", help = "Call type, e.g. \"Structure Fire\"")]
    pub call_type: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub town: Option<String>,

    #[arg(long = "mutual-aid")]
    pub mutual_aid: Option<String>,

    #[arg(long = "notes", help = "Location notes")]
    pub location_notes: Option<String>,

    #[arg(long, help = "Dispatch time (YYYY-MM-DD HH:MM)")]
    pub dispatched: Option<String>,

    #[arg(long)]
    pub enroute: Option<String>,

    #[arg(long = "on-scene")]
    pub on_scene: Option<String>,

    #[arg(long)]
    pub clear: Option<String>,

    #[arg(long)]
    pub narrative: Option<String>,

    #[arg(long = "incident", help = "Incident number (YYYY-NNN); assigned when omitted")]
    pub incident_number: Option<String>,

    #[arg(
        long = "apparatus",
        value_delimiter = ',',
        help = "Apparatus picklist ids (comma separated)"
    )]
    pub apparatus: Vec<i64>,

    #[arg(
        long = "responder",
        value_name = "ID[:ROLE]",
        help = "Responder user id with optional role, repeatable"
    )]
    pub responders: Vec<String>,
}

#[derive(Subcommand)]
pub enum CallCmd {
    /// File a new call
    Add {
        #[command(flatten)]
        fields: CallFields,
    },

    /// Edit a call (only the given fields change)
    Edit {
        id: i64,

        #[command(flatten)]
        fields: CallFields,

        #[arg(
            long = "clear-associations",
            help = "Remove all apparatus and responders before applying --apparatus/--responder"
        )]
        clear_associations: bool,
    },

    /// Show one call with apparatus and responders
    Show { id: i64 },

    /// List recent calls, or the calls of one dispatch year
    List {
        #[arg(long)]
        year: Option<i32>,

        #[arg(long)]
        limit: Option<i64>,

        #[arg(long, default_value_t = 1)]
        page: i64,
    },

    /// Search calls by creation date, type, town and text
    Search {
        #[arg(long, help = "Created on or after (YYYY-MM-DD or timestamp)")]
        from: Option<String>,

        #[arg(long, help = "Created on or before (YYYY-MM-DD or timestamp)")]
        to: Option<String>,

        #[arg(long = "type")]
        call_type: Option<String>,

        #[arg(long)]
        town: Option<String>,

        #[arg(long, help = "Case-sensitive text in address or incident number")]
        text: Option<String>,

        #[arg(long = "filter", value_name = "KEY=VALUE", help = "Raw filter pair, repeatable")]
        filters: Vec<String>,

        #[arg(long)]
        limit: Option<i64>,

        #[arg(long, default_value_t = 1)]
        page: i64,
    },

    /// Years that have calls
    Years,

    /// Preview the next incident number
    NextNumber {
        #[arg(long)]
        year: Option<i32>,
    },

    /// Remove a call's apparatus and responders (the record is kept)
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum UserCmd {
    /// List members
    List {
        #[arg(long, help = "Include deactivated members")]
        all: bool,

        #[arg(long, help = "Only administrators")]
        admins: bool,
    },

    /// Add a member
    Add {
        #[arg(long)]
        first: String,

        #[arg(long)]
        last: String,

        #[arg(long, default_value = "Member")]
        position: String,

        #[arg(long = "ems", default_value = "None")]
        ems_level: String,

        #[arg(long = "new-pin")]
        new_pin: String,

        #[arg(long)]
        admin: bool,
    },

    /// Change your own PIN
    Pin {
        #[arg(long = "new-pin")]
        new_pin: String,
    },

    /// Set another member's PIN
    SetPin {
        id: i64,

        #[arg(long = "new-pin")]
        new_pin: String,
    },

    /// Change a member's position
    Position { id: i64, position: String },

    /// Grant (or with --revoke, remove) admin rights
    Admin {
        id: i64,

        #[arg(long)]
        revoke: bool,
    },

    /// Set a member's join date (YYYY-MM-DD); omit to clear it
    Joined { id: i64, date: Option<String> },

    /// Deactivate a member
    Deactivate { id: i64 },
}

#[derive(Subcommand)]
pub enum PicklistCmd {
    /// List categories, or the values of one category
    List {
        category: Option<String>,

        #[arg(long, help = "Include disabled values")]
        all: bool,
    },

    /// Add a value to a category
    Add {
        category: String,
        value: String,

        #[arg(long = "order")]
        sort_order: Option<i64>,
    },

    /// Disable a value
    Disable { id: i64 },
}

#[derive(Subcommand)]
pub enum SettingsCmd {
    /// List all settings
    List,

    /// Print one setting
    Get { key: String },

    /// Change a setting
    Set { key: String, value: String },
}
