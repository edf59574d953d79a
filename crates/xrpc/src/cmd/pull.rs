use crate::cmd::{log_id_or_new, Context, PullArgs};
use crate::exit::{backend_error, rpc_error, CliResult, SUCCESS};
use crate::output::{print_signaling, OutputFormat, SdpData, SignalingOutput};
use crate::signaling::{flag, OfferResponse, PullRequest, CMDNO_PULL};

pub fn run(args: PullArgs, ctx: &Context) -> CliResult<i32> {
    let sdp = args.offer.resolve_sdp()?;
    let registry = ctx.registry()?;
    let log_id = log_id_or_new(args.stream.log_id);

    let request = PullRequest {
        cmdno: CMDNO_PULL,
        uid: args.stream.uid,
        stream_name: &args.stream.stream_name,
        audio: flag(args.offer.audio),
        video: flag(args.offer.video),
        sdp: &sdp,
    };
    tracing::info!(
        uid = args.stream.uid,
        stream_name = %args.stream.stream_name,
        log_id,
        "pull"
    );

    let resp: OfferResponse = registry
        .call(&args.stream.target, &request, log_id)
        .map_err(|err| rpc_error("pull failed", err))?;
    report_offer("pull", resp, ctx.format)
}

/// Print the backend's answer SDP, or fail on a non-zero errno.
pub(crate) fn report_offer(verb: &str, resp: OfferResponse, format: OutputFormat) -> CliResult<i32> {
    if resp.err_no != 0 {
        return Err(backend_error(verb, resp.err_no, &resp.err_msg));
    }
    print_signaling(
        &SignalingOutput {
            err_no: 0,
            err_msg: "success",
            data: Some(SdpData {
                kind: "offer",
                sdp: &resp.offer,
            }),
        },
        format,
    );
    Ok(SUCCESS)
}
