use std::fs;

use bytes::{Buf, Bytes};
use xrpc_frame::Request;

use crate::cmd::{log_id_or_new, CallArgs, Context};
use crate::exit::{frame_error, rpc_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::print_response;

pub fn run(args: CallArgs, ctx: &Context) -> CliResult<i32> {
    let registry = ctx.registry()?;
    let client = registry.client(&args.service).ok_or_else(|| {
        rpc_error(
            "call failed",
            xrpc_client::RpcError::UnknownService(args.service.clone()),
        )
    })?;

    let payload = resolve_payload(&args)?;
    let log_id = log_id_or_new(args.log_id);
    tracing::debug!(service = %args.service, log_id, size = payload.len(), "sending request");

    let request = Request::new(payload.reader(), log_id)
        .map_err(|err| frame_error("request rejected", err))?
        .with_id(args.id);
    let response = client
        .call(request)
        .map_err(|err| rpc_error("call failed", err))?;

    print_response(&args.service, &response, ctx.format);
    Ok(SUCCESS)
}

fn resolve_payload(args: &CallArgs) -> CliResult<Bytes> {
    if let Some(json) = &args.json {
        serde_json::from_str::<serde_json::Value>(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
        return Ok(Bytes::copy_from_slice(json.as_bytes()));
    }
    if let Some(data) = &args.data {
        return Ok(Bytes::copy_from_slice(data.as_bytes()));
    }
    if let Some(path) = &args.file {
        return fs::read(path).map(Bytes::from).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Ok(Bytes::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CallArgs {
        CallArgs {
            service: "xrtc".to_string(),
            json: None,
            data: None,
            file: None,
            id: 0,
            log_id: None,
        }
    }

    #[test]
    fn invalid_json_is_usage_error() {
        let err = resolve_payload(&CallArgs {
            json: Some("{not json".to_string()),
            ..args()
        })
        .unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn no_payload_sends_empty_body() {
        assert!(resolve_payload(&args()).unwrap().is_empty());
    }

    #[test]
    fn missing_file_fails() {
        let err = resolve_payload(&CallArgs {
            file: Some("/nonexistent/xrpc-body".into()),
            ..args()
        })
        .unwrap_err();
        assert_eq!(err.code, crate::exit::FAILURE);
    }
}
