use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use xrpc_frame::{read_frame, FrameError, Response, DEFAULT_MAX_BODY};
use xrpc_transport::{RpcListener, RpcStream};

use crate::cmd::{parse_duration, EchoArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS, USAGE};

const SERVE_TIMEOUT: Duration = Duration::from_secs(5);

pub fn run(args: EchoArgs) -> CliResult<i32> {
    let reply = resolve_reply(&args)?;
    let delay = args.delay.as_deref().map(parse_duration).transpose()?;

    let listener =
        RpcListener::bind(args.addr.as_str()).map_err(|err| transport_error("bind failed", err))?;
    // Bound address on stdout so callers can use port 0.
    println!("{}", listener.local_addr());

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut served = 0usize;
    while running.load(Ordering::SeqCst) {
        if args.count.is_some_and(|limit| served >= limit) {
            break;
        }

        let stream = listener
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;
        match serve_one(stream, reply.as_ref(), delay) {
            Ok(()) => served += 1,
            Err(err) => {
                let err = frame_error("exchange failed", err);
                tracing::warn!(error = %err, "dropping connection");
            }
        }
    }

    Ok(SUCCESS)
}

fn serve_one(
    mut stream: RpcStream,
    reply: Option<&Bytes>,
    delay: Option<Duration>,
) -> Result<(), FrameError> {
    stream.set_read_timeout(SERVE_TIMEOUT);
    let request = read_frame(&mut stream, DEFAULT_MAX_BODY);
    let request = match request {
        Ok(request) => request,
        Err(err) => {
            stream.close();
            return Err(err);
        }
    };

    tracing::info!(
        peer = ?stream.peer_addr(),
        id = request.header.id,
        log_id = request.header.log_id,
        size = request.body.len(),
        "answering request"
    );

    if let Some(delay) = delay {
        std::thread::sleep(delay);
    }

    let body = reply.cloned().unwrap_or(request.body);
    stream.set_write_timeout(SERVE_TIMEOUT);
    let result = Response::reply_to(&request.header, body).and_then(|resp| resp.write_to(&mut stream));
    stream.close();
    result
}

fn resolve_reply(args: &EchoArgs) -> CliResult<Option<Bytes>> {
    let Some(reply) = &args.reply else {
        return Ok(None);
    };
    serde_json::from_str::<serde_json::Value>(reply)
        .map_err(|err| CliError::new(USAGE, format!("--reply is not valid JSON: {err}")))?;
    Ok(Some(Bytes::copy_from_slice(reply.as_bytes())))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
