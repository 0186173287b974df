mod common;

use common::{binary_payload, context, served_dir, spawn_session};
use hftpd::config::ProtocolConfig;

#[tokio::test]
async fn test_quit_replies_ok_and_closes() {
    let dir = served_dir(&[]);
    let (mut client, handle) = spawn_session(context(dir.path(), ProtocolConfig::default()));

    client.send("QUIT").await;
    assert_eq!(client.status().await, "0 OK");
    client.expect_closed().await;
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_get_metadata_reports_true_size() {
    let payload = binary_payload(7_777);
    let dir = served_dir(&[("data.bin", &payload), ("hello.txt", b"hello\n")]);
    let (mut client, _handle) = spawn_session(context(dir.path(), ProtocolConfig::default()));

    client.send("get_metadata data.bin").await;
    assert_eq!(client.status().await, "0 OK");
    assert_eq!(client.line().await.as_deref(), Some("7777"));

    client.send("GET_METADATA hello.txt").await;
    assert_eq!(client.status().await, "0 OK");
    assert_eq!(client.line().await.as_deref(), Some("6"));
}

#[tokio::test]
async fn test_missing_file_keeps_connection_open() {
    let dir = served_dir(&[("present.txt", b"here")]);
    let (mut client, _handle) = spawn_session(context(dir.path(), ProtocolConfig::default()));

    client.send("get_metadata missing.txt").await;
    assert_eq!(client.status().await, "202 FILE NOT FOUND");

    client.send("get_metadata present.txt").await;
    assert_eq!(client.status().await, "0 OK");
    assert_eq!(client.line().await.as_deref(), Some("4"));
}

#[tokio::test]
async fn test_traversal_is_file_not_found() {
    let dir = served_dir(&[]);
    let (mut client, _handle) = spawn_session(context(dir.path(), ProtocolConfig::default()));

    client.send("get_metadata ../../etc/passwd").await;
    assert_eq!(client.status().await, "202 FILE NOT FOUND");
    client.send("get_slice .. 0 1").await;
    assert_eq!(client.status().await, "202 FILE NOT FOUND");
}

#[tokio::test]
async fn test_get_file_listing() {
    let dir = served_dir(&[("b.txt", b"b"), ("a.txt", b"a")]);
    let (mut client, _handle) = spawn_session(context(dir.path(), ProtocolConfig::default()));

    client.send("get_file_listing").await;
    assert_eq!(client.status().await, "0 OK");
    let first = client.listing().await;
    assert_eq!(first, vec!["a.txt", "b.txt"]);

    client.send("get_file_listing").await;
    assert_eq!(client.status().await, "0 OK");
    assert_eq!(client.listing().await, first);
}

#[tokio::test]
async fn test_get_file_listing_empty_directory() {
    let dir = served_dir(&[]);
    let (mut client, _handle) = spawn_session(context(dir.path(), ProtocolConfig::default()));

    client.send("get_file_listing").await;
    assert_eq!(client.status().await, "0 OK");
    assert!(client.listing().await.is_empty());
}

#[tokio::test]
async fn test_get_slice_round_trips_bytes() {
    let payload = binary_payload(50_000);
    let dir = served_dir(&[("data.bin", &payload)]);
    let (mut client, _handle) = spawn_session(context(dir.path(), ProtocolConfig::default()));

    for (offset, size) in [(0usize, 50_000usize), (13, 4_096), (4_095, 8_193), (49_999, 1)] {
        client.send(&format!("get_slice data.bin {} {}", offset, size)).await;
        assert_eq!(client.status().await, "0 OK");
        let expected = &payload[offset..offset + size];
        assert_eq!(client.slice().await, expected, "slice {} {}", offset, size);
    }
}

#[tokio::test]
async fn test_get_slice_frames_respect_chunk_size() {
    let dir = served_dir(&[("data.txt", b"abcdefghijklmnopqrstuvwxyz")]);
    let protocol = ProtocolConfig {
        slice_chunk_size: 10,
        ..ProtocolConfig::default()
    };
    let (mut client, _handle) = spawn_session(context(dir.path(), protocol));

    client.send("get_slice data.txt 2 24").await;
    assert_eq!(client.status().await, "0 OK");
    let frames = client.slice_frames().await;
    // "cdefghijkl", "mnopqrstuv", "wxyz"
    assert_eq!(frames, vec!["Y2RlZmdoaWprbA==", "bW5vcHFyc3R1dg==", "d3h5eg=="]);
}

#[tokio::test]
async fn test_zero_length_slice_sends_only_end_frame() {
    let dir = served_dir(&[("data.txt", b"abc")]);
    let (mut client, _handle) = spawn_session(context(dir.path(), ProtocolConfig::default()));

    client.send("get_slice data.txt 1 0").await;
    assert_eq!(client.status().await, "0 OK");
    assert_eq!(client.line().await.as_deref(), Some(""));
}

#[tokio::test]
async fn test_bad_offsets() {
    let dir = served_dir(&[("data.txt", b"0123456789")]);
    let (mut client, _handle) = spawn_session(context(dir.path(), ProtocolConfig::default()));

    for args in ["0 11", "10 1", "-1 2", "2 -1", "9223372036854775807 1"] {
        client.send(&format!("get_slice data.txt {}", args)).await;
        assert_eq!(client.status().await, "203 OFFSET EXCEEDS FILE SIZE", "args {}", args);
    }

    client.send("get_slice data.txt 8 2").await;
    assert_eq!(client.status().await, "0 OK");
    assert_eq!(client.slice().await, b"89");
}

#[tokio::test]
async fn test_invalid_command_keeps_connection_open() {
    let dir = served_dir(&[("a.txt", b"a")]);
    let (mut client, _handle) = spawn_session(context(dir.path(), ProtocolConfig::default()));

    client.send("put_file a.txt").await;
    assert_eq!(client.status().await, "200 NO SUCH COMMAND");

    client.send("get_metadata a.txt").await;
    assert_eq!(client.status().await, "0 OK");
    assert_eq!(client.line().await.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_invalid_arguments() {
    let dir = served_dir(&[("a.txt", b"a")]);
    let (mut client, _handle) = spawn_session(context(dir.path(), ProtocolConfig::default()));

    for line in [
        "quit now",
        "get_file_listing extra",
        "get_metadata",
        "get_metadata a.txt b.txt",
        "get_slice a.txt 0",
        "get_slice a.txt zero 1",
        "get_slice a.txt 0 one",
    ] {
        client.send(line).await;
        assert_eq!(client.status().await, "201 INVALID ARGUMENTS FOR COMMAND", "line {:?}", line);
    }

    client.send("quit").await;
    assert_eq!(client.status().await, "0 OK");
    client.expect_closed().await;
}

#[tokio::test]
async fn test_bad_eol_closes_connection() {
    let dir = served_dir(&[("a.txt", b"a")]);
    let (mut client, handle) = spawn_session(context(dir.path(), ProtocolConfig::default()));

    client.send_raw(b"get_metadata a.txt\nget_file_listing\r\n").await;
    assert_eq!(client.status().await, "100 BAD EOL");
    client.expect_closed().await;
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_non_ascii_request_is_bad_request() {
    let dir = served_dir(&[]);
    let (mut client, _handle) = spawn_session(context(dir.path(), ProtocolConfig::default()));

    client.send("get_metadata ñandú.txt").await;
    assert_eq!(client.status().await, "101 BAD REQUEST");
    client.expect_closed().await;
}

#[tokio::test]
async fn test_unterminated_flood_is_bad_request() {
    let dir = served_dir(&[]);
    let protocol = ProtocolConfig {
        read_block_size: 16,
        max_buffer_size: 32,
        ..ProtocolConfig::default()
    };
    let (mut client, _handle) = spawn_session(context(dir.path(), protocol));

    client.send_raw(&[b'x'; 64]).await;
    assert_eq!(client.status().await, "101 BAD REQUEST");
    client.expect_closed().await;
}

#[tokio::test]
async fn test_blank_lines_and_padding_are_ignored() {
    let dir = served_dir(&[("a.txt", b"abc")]);
    let (mut client, _handle) = spawn_session(context(dir.path(), ProtocolConfig::default()));

    client.send_raw(b"\r\n   \r\n  get_metadata a.txt  \r\n").await;
    assert_eq!(client.status().await, "0 OK");
    assert_eq!(client.line().await.as_deref(), Some("3"));
}

#[tokio::test]
async fn test_pipelined_requests() {
    let dir = served_dir(&[("a.txt", b"abc")]);
    let (mut client, handle) = spawn_session(context(dir.path(), ProtocolConfig::default()));

    client
        .send_raw(b"get_metadata a.txt\r\nget_slice a.txt 0 3\r\nbogus\r\nquit\r\n")
        .await;

    assert_eq!(client.status().await, "0 OK");
    assert_eq!(client.line().await.as_deref(), Some("3"));
    assert_eq!(client.status().await, "0 OK");
    assert_eq!(client.slice().await, b"abc");
    assert_eq!(client.status().await, "200 NO SUCH COMMAND");
    assert_eq!(client.status().await, "0 OK");
    client.expect_closed().await;
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_internal_error_keeps_session_open() {
    let dir = served_dir(&[]);
    let root = dir.path().join("not-created");
    let (mut client, _handle) = spawn_session(context(&root, ProtocolConfig::default()));

    client.send("get_file_listing").await;
    assert_eq!(client.status().await, "199 INTERNAL SERVER ERROR");

    client.send("quit").await;
    assert_eq!(client.status().await, "0 OK");
}

// sysfs attributes report a page-sized length but reject reads, so the
// failure happens after the range has already been accepted
#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_read_failure_mid_slice_closes_session() {
    let root = std::path::Path::new("/sys/class/net/lo");
    let attr = root.join("speed");
    if !attr.is_file() || std::fs::read(&attr).is_ok() {
        return;
    }
    let (mut client, handle) = spawn_session(context(root, ProtocolConfig::default()));

    client.send("get_slice speed 0 10").await;
    assert_eq!(client.status().await, "0 OK");
    client.expect_closed().await;
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_newline_terminator() {
    let dir = served_dir(&[("a.txt", b"abc")]);
    let protocol = ProtocolConfig {
        terminator: "\n".to_string(),
        ..ProtocolConfig::default()
    };
    let (mut client, _handle) = spawn_session(context(dir.path(), protocol));

    client.send_raw(b"get_metadata a.txt\n").await;
    assert_eq!(client.status().await, "0 OK");
    assert_eq!(client.line().await.as_deref(), Some("3"));
}

#[tokio::test]
async fn test_peer_close_mid_line_ends_quietly() {
    let dir = served_dir(&[]);
    let (mut client, handle) = spawn_session(context(dir.path(), ProtocolConfig::default()));

    client.send_raw(b"get_meta").await;
    drop(client);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_idle_session_times_out() {
    let dir = served_dir(&[]);
    let protocol = ProtocolConfig {
        read_timeout_secs: Some(1),
        ..ProtocolConfig::default()
    };
    let (mut client, handle) = spawn_session(context(dir.path(), protocol));

    client.expect_closed().await;
    handle.await.unwrap().unwrap();
}
