use std::io::{IsTerminal, Write};

use auvgate_frame::{opcode_name, Command, FlagGroup, StateFrame, Telemetry, TuningFrame};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct CommandOutput<'a> {
    kind: &'static str,
    opcode: u8,
    opcode_name: &'static str,
    len: usize,
    hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a StateFrame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tuning: Option<&'a TuningFrame>,
}

pub fn print_command(command: &Command, frame: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = CommandOutput {
                kind: command_kind(command),
                opcode: command.opcode(),
                opcode_name: opcode_name(command.opcode()),
                len: frame.len(),
                hex: hex::encode(frame),
                state: match command {
                    Command::State(state) => Some(state),
                    _ => None,
                },
                tuning: match command {
                    Command::Tuning(tuning) => Some(tuning),
                    _ => None,
                },
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut rows = vec![
                ("opcode".to_string(), command.opcode().to_string()),
                ("kind".to_string(), command_kind(command).to_string()),
            ];
            rows.extend(command_rows(command));
            rows.push(("hex".to_string(), hex::encode(frame)));
            print_table(rows);
        }
        OutputFormat::Pretty => {
            let fields = command_rows(command)
                .into_iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!(
                "{} ({}) len={} {}",
                opcode_name(command.opcode()),
                command.opcode(),
                frame.len(),
                fields
            );
        }
        OutputFormat::Raw => print_raw(frame),
    }
}

pub fn print_telemetry(telemetry: &Telemetry, frame: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(telemetry).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => print_table(telemetry_rows(telemetry)),
        OutputFormat::Pretty => {
            println!(
                "roll={} pitch={} yaw={} depth={} altitude={} voltage={} leak={} pid={} errors={}",
                telemetry.roll,
                telemetry.pitch,
                telemetry.yaw,
                telemetry.depth,
                telemetry.altitude,
                telemetry.voltage,
                telemetry.leak,
                enabled(&telemetry.pid),
                enabled(&telemetry.errors),
            );
        }
        OutputFormat::Raw => print_raw(frame),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_table(rows: Vec<(String, String)>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["FIELD", "VALUE"]);
    for (name, value) in rows {
        table.add_row(vec![name, value]);
    }
    println!("{table}");
}

fn command_kind(command: &Command) -> &'static str {
    match command {
        Command::State(_) => "state",
        Command::Tuning(_) => "tuning",
        Command::SaveTuning => "save",
    }
}

fn command_rows(command: &Command) -> Vec<(String, String)> {
    match command {
        Command::State(state) => vec![
            row("thrust_x", state.thrust_x),
            row("thrust_y", state.thrust_y),
            row("thrust_w", state.thrust_w),
            row("thrust_z", state.thrust_z),
            row("depth", state.depth),
            row("altitude", state.altitude),
            row("yaw", state.yaw),
            row("velocity_x", state.velocity_x),
            row("velocity_y", state.velocity_y),
            row("controllers", enabled(&state.controllers)),
            row("payload", enabled(&state.payload)),
            row("navigation", state.navigation),
        ],
        Command::Tuning(tuning) => vec![
            row("channel", tuning.channel),
            row("p", tuning.p),
            row("i", tuning.i),
            row("d", tuning.d),
        ],
        Command::SaveTuning => Vec::new(),
    }
}

fn telemetry_rows(telemetry: &Telemetry) -> Vec<(String, String)> {
    vec![
        row("roll", telemetry.roll),
        row("pitch", telemetry.pitch),
        row("yaw", telemetry.yaw),
        row("gyro_z", telemetry.gyro_z),
        row("depth", telemetry.depth),
        row("altitude", telemetry.altitude),
        row("velocity_x", telemetry.velocity_x),
        row("velocity_y", telemetry.velocity_y),
        row("pos_x", telemetry.pos_x),
        row("pos_y", telemetry.pos_y),
        row("voltage", telemetry.voltage),
        row("current", telemetry.current),
        row("pid", enabled(&telemetry.pid)),
        row("payload", enabled(&telemetry.payload)),
        row("leak", telemetry.leak),
        row("errors", enabled(&telemetry.errors)),
        row("temperature", telemetry.temperature),
    ]
}

fn row(name: &str, value: impl ToString) -> (String, String) {
    (name.to_string(), value.to_string())
}

/// Comma-separated names of the set flags, or `-`.
fn enabled<G: FlagGroup>(group: &G) -> String {
    let names = G::NAMES
        .iter()
        .enumerate()
        .filter(|(index, _)| group.get(*index))
        .map(|(_, name)| *name)
        .collect::<Vec<_>>();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(",")
    }
}
