use crate::cmd::{log_id_or_new, Context, PushArgs};
use crate::exit::CliResult;
use crate::signaling::{flag, OfferResponse, PushRequest, CMDNO_PUSH};

pub fn run(args: PushArgs, ctx: &Context) -> CliResult<i32> {
    let sdp = args.offer.resolve_sdp()?;
    let registry = ctx.registry()?;
    let log_id = log_id_or_new(args.stream.log_id);

    let request = PushRequest {
        cmdno: CMDNO_PUSH,
        uid: args.stream.uid,
        stream_name: &args.stream.stream_name,
        audio: flag(args.offer.audio),
        video: flag(args.offer.video),
        dtls_on: flag(!args.no_dtls),
        sdp: &sdp,
    };
    tracing::info!(
        uid = args.stream.uid,
        stream_name = %args.stream.stream_name,
        log_id,
        "push"
    );

    let resp: OfferResponse = registry
        .call(&args.stream.target, &request, log_id)
        .map_err(|err| crate::exit::rpc_error("push failed", err))?;
    super::pull::report_offer("push", resp, ctx.format)
}
