use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use xrpc_frame::Response;

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
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ResponseOutput<'a> {
    service: &'a str,
    id: u16,
    version: u16,
    log_id: u32,
    body_len: u32,
    body: String,
}

pub fn print_response(service: &str, resp: &Response, format: OutputFormat) {
    let header = &resp.header;
    match format {
        OutputFormat::Json => {
            let out = ResponseOutput {
                service,
                id: header.id,
                version: header.version,
                log_id: header.log_id,
                body_len: header.body_len,
                body: body_preview(resp.body.as_ref()),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SERVICE", "ID", "LOG ID", "SIZE", "BODY"])
                .add_row(vec![
                    service.to_string(),
                    header.id.to_string(),
                    header.log_id.to_string(),
                    header.body_len.to_string(),
                    body_preview(resp.body.as_ref()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "service={} id={} log_id={} size={} body={}",
                service,
                header.id,
                header.log_id,
                header.body_len,
                body_preview(resp.body.as_ref())
            );
        }
        OutputFormat::Raw => print_raw(resp.body.as_ref()),
    }
}

/// Signaling result in the relay's HTTP envelope shape.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalingOutput<'a> {
    pub err_no: i32,
    pub err_msg: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SdpData<'a>>,
}

#[derive(Serialize)]
pub struct SdpData<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub sdp: &'a str,
}

pub fn print_signaling(out: &SignalingOutput<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ERRNO", "MESSAGE", "TYPE", "SDP"])
                .add_row(vec![
                    out.err_no.to_string(),
                    out.err_msg.to_string(),
                    out.data.as_ref().map_or("-", |d| d.kind).to_string(),
                    out.data.as_ref().map_or("-", |d| d.sdp).to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match &out.data {
            Some(data) => println!("{} ({}):\n{}", out.err_msg, data.kind, data.sdp),
            None => println!("{}", out.err_msg),
        },
        OutputFormat::Raw => {
            if let Some(data) = &out.data {
                print_raw(data.sdp.as_bytes());
            }
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn body_preview(body: &[u8]) -> String {
    match std::str::from_utf8(body) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", body.len()),
    }
}
