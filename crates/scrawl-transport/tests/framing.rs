//! Integration tests for TCP framing over real loopback sockets.

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use scrawl_transport::{
    Connection, MAX_FRAME_LEN, TcpTransport, Transport, TransportError,
};

/// Binds a transport on a random loopback port and returns it with the
/// address clients should dial.
async fn bound_transport() -> (TcpTransport, String) {
    let transport = TcpTransport::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr = transport.local_addr().expect("local addr").to_string();
    (transport, addr)
}

#[tokio::test]
async fn test_single_write_yields_each_frame() {
    let (mut transport, addr) = bound_transport().await;

    let mut client = TcpStream::connect(&addr).await.unwrap();
    let conn = transport.accept().await.unwrap();

    client.write_all(b"alpha\nbeta\ngamma\n").await.unwrap();

    assert_eq!(conn.recv().await.unwrap().unwrap(), b"alpha");
    assert_eq!(conn.recv().await.unwrap().unwrap(), b"beta");
    assert_eq!(conn.recv().await.unwrap().unwrap(), b"gamma");
}

#[tokio::test]
async fn test_frame_split_across_writes_decodes_identically() {
    let (mut transport, addr) = bound_transport().await;

    let mut client = TcpStream::connect(&addr).await.unwrap();
    let conn = transport.accept().await.unwrap();

    // One frame delivered one byte at a time must reassemble exactly.
    for b in b"{\"type\":\"chat\"}" {
        client.write_all(&[*b]).await.unwrap();
        client.flush().await.unwrap();
    }
    client.write_all(b"\n").await.unwrap();

    assert_eq!(
        conn.recv().await.unwrap().unwrap(),
        b"{\"type\":\"chat\"}"
    );
}

#[tokio::test]
async fn test_partial_frame_survives_until_separator() {
    let (mut transport, addr) = bound_transport().await;

    let mut client = TcpStream::connect(&addr).await.unwrap();
    let conn = transport.accept().await.unwrap();

    client.write_all(b"first\nsecond-par").await.unwrap();
    assert_eq!(conn.recv().await.unwrap().unwrap(), b"first");

    client.write_all(b"t\n").await.unwrap();
    assert_eq!(conn.recv().await.unwrap().unwrap(), b"second-part");
}

#[tokio::test]
async fn test_empty_lines_are_skipped() {
    let (mut transport, addr) = bound_transport().await;

    let mut client = TcpStream::connect(&addr).await.unwrap();
    let conn = transport.accept().await.unwrap();

    client.write_all(b"\n\n\nreal\n").await.unwrap();
    assert_eq!(conn.recv().await.unwrap().unwrap(), b"real");
}

#[tokio::test]
async fn test_clean_close_returns_none() {
    let (mut transport, addr) = bound_transport().await;

    let mut client = TcpStream::connect(&addr).await.unwrap();
    let conn = transport.accept().await.unwrap();

    client.write_all(b"bye\n").await.unwrap();
    client.shutdown().await.unwrap();

    assert_eq!(conn.recv().await.unwrap().unwrap(), b"bye");
    assert_eq!(conn.recv().await.unwrap(), None);
}

#[tokio::test]
async fn test_unterminated_trailing_bytes_dropped_on_close() {
    let (mut transport, addr) = bound_transport().await;

    let mut client = TcpStream::connect(&addr).await.unwrap();
    let conn = transport.accept().await.unwrap();

    client.write_all(b"whole\nhalf-a-fra").await.unwrap();
    client.shutdown().await.unwrap();

    assert_eq!(conn.recv().await.unwrap().unwrap(), b"whole");
    assert_eq!(conn.recv().await.unwrap(), None);
}

#[tokio::test]
async fn test_oversized_frame_is_rejected() {
    let (mut transport, addr) = bound_transport().await;

    let mut client = TcpStream::connect(&addr).await.unwrap();
    let conn = transport.accept().await.unwrap();

    let recv_task = tokio::spawn(async move { conn.recv().await });

    // Feed more than MAX_FRAME_LEN bytes without ever sending a newline.
    let chunk = vec![b'x'; 8 * 1024];
    let mut sent = 0;
    while sent <= MAX_FRAME_LEN {
        if client.write_all(&chunk).await.is_err() {
            break; // server side already gave up, which is the point
        }
        sent += chunk.len();
    }

    let result = recv_task.await.unwrap();
    assert!(matches!(result, Err(TransportError::FrameTooLong(_))));
}

#[tokio::test]
async fn test_send_writes_frame_verbatim() {
    use tokio::io::AsyncReadExt;

    let (mut transport, addr) = bound_transport().await;

    let mut client = TcpStream::connect(&addr).await.unwrap();
    let conn = transport.accept().await.unwrap();

    conn.send(b"{\"type\":\"ack\"}\n").await.unwrap();
    conn.close().await.unwrap();

    let mut received = Vec::new();
    client.read_to_end(&mut received).await.unwrap();
    assert_eq!(received, b"{\"type\":\"ack\"}\n");
}

#[tokio::test]
async fn test_connection_ids_are_unique() {
    let (mut transport, addr) = bound_transport().await;

    let _c1 = TcpStream::connect(&addr).await.unwrap();
    let _c2 = TcpStream::connect(&addr).await.unwrap();
    let a = transport.accept().await.unwrap();
    let b = transport.accept().await.unwrap();
    assert_ne!(a.id(), b.id());
}
