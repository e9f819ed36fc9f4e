use std::io::IsTerminal;
use std::time::Duration;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use localchan_transport::Endpoint;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
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
struct EndpointOutput<'a> {
    name: &'a str,
    kind: &'a str,
    address: String,
}

pub fn print_endpoint(name: &str, endpoint: &Endpoint, format: OutputFormat) {
    let out = EndpointOutput {
        name,
        kind: endpoint.kind().as_str(),
        address: endpoint.address().display().to_string(),
    };
    match format {
        OutputFormat::Json => println!("{}", to_json_line(&out)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["NAME", "KIND", "ADDRESS"])
                .add_row(vec![out.name, out.kind, out.address.as_str()]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", out.address),
    }
}

pub fn print_response(
    endpoint: &Endpoint,
    response: &Value,
    elapsed: Duration,
    format: OutputFormat,
) {
    match format {
        // Bare response, one line.
        OutputFormat::Json => println!("{}", to_json_line(response)),
        OutputFormat::Pretty => println!(
            "{}",
            serde_json::to_string_pretty(response).unwrap_or_else(|_| "null".to_string())
        ),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ENDPOINT", "ELAPSED", "RESPONSE"])
                .add_row(vec![
                    endpoint.to_string(),
                    format!("{}ms", elapsed.as_millis()),
                    to_json_line(response),
                ]);
            println!("{table}");
        }
    }
}

fn to_json_line<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}
