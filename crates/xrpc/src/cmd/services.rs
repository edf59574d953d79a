use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use crate::cmd::{Context, ServicesArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct ServiceRow {
    name: String,
    endpoints: Vec<String>,
    connect_timeout_ms: u128,
    read_timeout_ms: u128,
    write_timeout_ms: u128,
}

pub fn run(_args: ServicesArgs, ctx: &Context) -> CliResult<i32> {
    let config = ctx.load_config()?;
    let rows: Vec<ServiceRow> = config
        .services
        .iter()
        .map(|(name, service)| {
            let client = service.client_config();
            ServiceRow {
                name: name.clone(),
                endpoints: service.endpoints(),
                connect_timeout_ms: client.connect_timeout().as_millis(),
                read_timeout_ms: client.read_timeout().as_millis(),
                write_timeout_ms: client.write_timeout().as_millis(),
            }
        })
        .collect();

    match ctx.format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SERVICE", "ENDPOINTS", "CONNECT", "READ", "WRITE"]);
            for row in &rows {
                table.add_row(vec![
                    row.name.clone(),
                    row.endpoints.join(", "),
                    format!("{}ms", row.connect_timeout_ms),
                    format!("{}ms", row.read_timeout_ms),
                    format!("{}ms", row.write_timeout_ms),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in &rows {
                println!(
                    "{} {} connect={}ms read={}ms write={}ms",
                    row.name,
                    row.endpoints.join(","),
                    row.connect_timeout_ms,
                    row.read_timeout_ms,
                    row.write_timeout_ms
                );
            }
        }
    }

    Ok(SUCCESS)
}
