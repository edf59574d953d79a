//! Backend command payloads for the signaling verbs.

use serde::{Deserialize, Serialize};

pub const CMDNO_PUSH: i32 = 1;
pub const CMDNO_PULL: i32 = 2;
pub const CMDNO_STOP_PULL: i32 = 5;

/// Default logical service for the media backend.
pub const XRTC_SERVICE: &str = "xrtc";

#[derive(Debug, Serialize)]
pub struct PushRequest<'a> {
    pub cmdno: i32,
    pub uid: u64,
    pub stream_name: &'a str,
    pub audio: i32,
    pub video: i32,
    pub dtls_on: i32,
    pub sdp: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PullRequest<'a> {
    pub cmdno: i32,
    pub uid: u64,
    pub stream_name: &'a str,
    pub audio: i32,
    pub video: i32,
    pub sdp: &'a str,
}

#[derive(Debug, Serialize)]
pub struct StopPullRequest<'a> {
    pub cmdno: i32,
    pub uid: u64,
    pub stream_name: &'a str,
}

/// Backend reply to push and pull.
#[derive(Debug, Default, Deserialize)]
pub struct OfferResponse {
    #[serde(default)]
    pub err_no: i32,
    #[serde(default)]
    pub err_msg: String,
    #[serde(default)]
    pub offer: String,
}

/// Backend reply to stop-pull.
#[derive(Debug, Default, Deserialize)]
pub struct StopResponse {
    #[serde(default)]
    pub err_no: i32,
    #[serde(default)]
    pub err_msg: String,
}

pub fn flag(on: bool) -> i32 {
    i32::from(on)
}
