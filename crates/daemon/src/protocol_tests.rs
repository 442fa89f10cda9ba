// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn command_request() -> CommandRequest {
    CommandRequest {
        command: CommandName::Plan,
        repo_dir: PathBuf::from("/work/repo"),
        project: Project::new("owner/repo", "staging"),
        workspace: "default".to_string(),
        pull: PullRequest::new(7, "alice", "https://example.com/pull/7"),
        user: User::new("alice"),
        comment_args: vec!["-target=aws_instance.web".to_string()],
        pull_status: PullStatus {
            approved: true,
            mergeable: false,
        },
    }
}

#[test]
fn encode_decode_roundtrip_request() {
    let request = Request::Command {
        request: command_request(),
    };

    let encoded = encode(&request).expect("encode failed");
    let decoded: Request = decode(&encoded).expect("decode failed");

    assert_eq!(request, decoded);
}

#[test]
fn encode_returns_json_without_length_prefix() {
    let encoded = encode(&Request::Ping).expect("encode failed");
    let json_str = std::str::from_utf8(&encoded).expect("invalid utf8");

    assert_eq!(json_str, r#"{"type":"Ping"}"#);
}

#[test]
fn requests_are_tagged_by_type() {
    let encoded = encode(&Request::UnlockPull {
        repo: "owner/repo".to_string(),
        num: 3,
    })
    .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&encoded).unwrap();

    assert_eq!(value["type"], "UnlockPull");
    assert_eq!(value["repo"], "owner/repo");
    assert_eq!(value["num"], 3);
}

#[test]
fn command_request_defaults_optional_fields() {
    let json = r#"{
        "type": "Command",
        "request": {
            "command": "apply",
            "repo_dir": "/work/repo",
            "project": {"repo_full_name": "owner/repo", "path": "."},
            "workspace": "default",
            "pull": {"num": 1, "author": "bob", "url": "u", "branch": "", "base_repo": ""},
            "user": {"username": "bob"}
        }
    }"#;

    let decoded: Request = decode(json.as_bytes()).unwrap();
    let Request::Command { request } = decoded else {
        panic!("expected Command request");
    };
    assert!(request.comment_args.is_empty());
    assert_eq!(request.pull_status, PullStatus::default());
}

#[test]
fn into_context_carries_every_field() {
    let (ctx, project) = command_request().into_context();

    assert_eq!(project, Project::new("owner/repo", "staging"));
    assert_eq!(ctx.command, CommandName::Plan);
    assert_eq!(ctx.repo_dir, PathBuf::from("/work/repo"));
    assert_eq!(ctx.pull.num, 7);
    assert_eq!(ctx.user.username, "alice");
    assert_eq!(ctx.comment_args, vec!["-target=aws_instance.web"]);
    assert!(ctx.pull_status.approved);
    assert!(!ctx.pull_status.mergeable);
}

#[test]
fn command_result_response_roundtrip() {
    let response = Response::CommandResult {
        result: ProjectResult::error("running plan steps: boom").with_output("partial"),
    };

    let decoded: Response = decode(&encode(&response).unwrap()).unwrap();

    match decoded {
        Response::CommandResult { result } => {
            assert_eq!(result.output, "partial");
            assert_eq!(result.error.as_deref(), Some("running plan steps: boom"));
        }
        other => panic!("expected CommandResult, got {:?}", other),
    }
}

#[tokio::test]
async fn read_write_message_roundtrip() {
    let original = b"hello world";

    let mut buffer = Vec::new();
    write_message(&mut buffer, original)
        .await
        .expect("write failed");

    assert_eq!(buffer.len(), 4 + original.len());

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.expect("read failed");

    assert_eq!(read_back, original);
}

#[tokio::test]
async fn write_message_adds_big_endian_length_prefix() {
    let data = b"test data";

    let mut buffer = Vec::new();
    write_message(&mut buffer, data)
        .await
        .expect("write failed");

    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    assert_eq!(len, data.len());
    assert_eq!(&buffer[4..], data);
}

#[tokio::test]
async fn read_message_on_empty_stream_is_connection_closed() {
    let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn read_message_with_truncated_body_is_connection_closed() {
    let mut buffer = 10u32.to_be_bytes().to_vec();
    buffer.extend_from_slice(b"abc");

    let mut cursor = std::io::Cursor::new(buffer);
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn read_message_rejects_oversized_length() {
    let buffer = (MAX_MESSAGE_SIZE as u32 + 1).to_be_bytes().to_vec();

    let mut cursor = std::io::Cursor::new(buffer);
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
}

#[tokio::test]
async fn read_request_times_out_on_silent_peer() {
    let (mut client, _server) = tokio::io::duplex(64);
    let err = read_request(&mut client, Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Timeout));
}

#[tokio::test]
async fn write_response_then_read_message_decodes() {
    let mut buffer = Vec::new();
    write_response(&mut buffer, &Response::Pong, DEFAULT_TIMEOUT)
        .await
        .unwrap();

    let mut cursor = std::io::Cursor::new(buffer);
    let bytes = read_message(&mut cursor).await.unwrap();
    assert_eq!(decode::<Response>(&bytes).unwrap(), Response::Pong);
}
