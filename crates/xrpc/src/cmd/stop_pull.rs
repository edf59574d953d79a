use crate::cmd::{log_id_or_new, Context, StopPullArgs};
use crate::exit::{backend_error, rpc_error, CliResult, SUCCESS};
use crate::output::{print_signaling, SignalingOutput};
use crate::signaling::{StopPullRequest, StopResponse, CMDNO_STOP_PULL};

pub fn run(args: StopPullArgs, ctx: &Context) -> CliResult<i32> {
    let registry = ctx.registry()?;
    let log_id = log_id_or_new(args.stream.log_id);

    let request = StopPullRequest {
        cmdno: CMDNO_STOP_PULL,
        uid: args.stream.uid,
        stream_name: &args.stream.stream_name,
    };
    tracing::info!(
        uid = args.stream.uid,
        stream_name = %args.stream.stream_name,
        log_id,
        "stop pull"
    );

    let resp: StopResponse = registry
        .call(&args.stream.target, &request, log_id)
        .map_err(|err| rpc_error("stop-pull failed", err))?;
    if resp.err_no != 0 {
        return Err(backend_error("stop-pull", resp.err_no, &resp.err_msg));
    }

    print_signaling(
        &SignalingOutput {
            err_no: 0,
            err_msg: "success",
            data: None,
        },
        ctx.format,
    );
    Ok(SUCCESS)
}
