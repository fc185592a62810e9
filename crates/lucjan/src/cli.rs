//! Clap derive structures for the `lucjan` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lucjan -- monitor and control a Lucjan solid-fuel boiler controller
#[derive(Debug, Parser)]
#[command(
    name = "lucjan",
    version,
    about = "Monitor and control a Lucjan boiler controller from the command line",
    long_about = "Reads live status (thermos.json) and persisted settings (config.txt)\n\
        from a Lucjan boiler controller on the local network, and applies\n\
        runtime or persisted changes.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Boiler profile to use
    #[arg(long, short = 'p', env = "LUCJAN_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller hostname or IP (overrides profile)
    #[arg(long, short = 'H', env = "LUCJAN_HOST", global = true)]
    pub host: Option<String>,

    /// Controller HTTP port (overrides profile)
    #[arg(long, env = "LUCJAN_PORT", global = true)]
    pub port: Option<u16>,

    /// Basic auth username (overrides profile)
    #[arg(long, short = 'u', env = "LUCJAN_USERNAME", global = true)]
    pub username: Option<String>,

    /// Basic auth password (overrides profile)
    #[arg(long, env = "LUCJAN_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "LUCJAN_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "LUCJAN_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.output.unwrap_or(OutputFormat::Table)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show temperatures, outputs, hopper and settings
    #[command(alias = "st")]
    Status,

    /// Follow the boiler, printing a line per poll until Ctrl-C
    Watch(WatchArgs),

    /// Show the controller's config.txt
    DeviceConfig(DeviceConfigArgs),

    /// List or change adjustable settings
    #[command(alias = "ctl")]
    Controls(ControlsArgs),

    /// Persist a raw config.txt parameter
    SetParam {
        /// Parameter name, e.g. CWU_TRYB
        name: String,
        /// New value
        value: String,
    },

    /// Set a raw runtime variable (not persisted)
    SetVar {
        /// Variable name, e.g. OUT_WENTYLATOR
        name: String,
        /// New value
        value: String,
    },

    /// Switch the boiler between AUTO and manual (RECZNY) mode
    Mode {
        #[arg(value_enum)]
        mode: ModeArg,
    },

    /// Enable or disable the CO heating circuit and 4D valve
    CoCircuit {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Set a target temperature (runtime and persisted)
    Setpoint {
        #[arg(value_enum)]
        circuit: CircuitArg,
        /// Temperature in °C
        temp: i64,
    },

    /// Reset an active alarm
    AlarmReset,

    /// Make the controller re-read config.txt
    ConfigReload,

    /// Mark the fuel hopper as refilled
    HopperFull,

    /// Restart the controller
    Reset,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval in seconds, 10-300 (overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

// ── Device config ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeviceConfigArgs {
    /// Print config.txt exactly as stored on the device
    #[arg(long)]
    pub raw: bool,
}

// ── Controls ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ControlsArgs {
    #[command(subcommand)]
    pub command: ControlsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ControlsCommand {
    /// List every control with its current value
    #[command(alias = "ls")]
    List,

    /// Change one control
    Set {
        /// Control key, see `controls list`
        key: String,
        /// New value: on/off for switches, an option for selects, a number
        /// for numbers; omit for buttons
        value: Option<String>,
    },
}

// ── Write arguments ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Auto,
    #[value(alias = "reczny")]
    Manual,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CircuitArg {
    /// Boiler water (PIEC_ZADANA, 30-80 °C)
    Boiler,
    /// Domestic hot water (CWU_ZADANA, 30-65 °C)
    HotWater,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// host, port, username, password_env, timeout or poll_interval
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile to store for (default: active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
