//! Integration tests for the POP3 client.
//!
//! These tests script the server side with `tokio_test::io::Builder`, which
//! also asserts that the client writes exactly the expected commands.

#![allow(clippy::unwrap_used)]

use relaycheck_pop3::{Capability, Client, Error};
use tokio_test::io::Builder;

#[tokio::test]
async fn test_greeting_is_recorded() {
    let mock = Builder::new()
        .read(b"+OK Dovecot ready.\r\n")
        .write(b"QUIT\r\n")
        .read(b"+OK Logging out.\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    assert_eq!(client.greeting(), "Dovecot ready.");
    client.quit().await.unwrap();
}

#[tokio::test]
async fn test_negative_greeting_is_rejected() {
    let mock = Builder::new().read(b"-ERR too many connections\r\n").build();

    let err = Client::from_stream(mock).await.unwrap_err();
    assert!(err.is_rejection());
}

#[tokio::test]
async fn test_login_stat_uidl_quit() {
    let mock = Builder::new()
        .read(b"+OK POP3 ready\r\n")
        .write(b"USER alice\r\n")
        .read(b"+OK\r\n")
        .write(b"PASS wonderland\r\n")
        .read(b"+OK maildrop locked and ready\r\n")
        .write(b"UIDL\r\n")
        .read(b"+OK unique-id listing follows\r\n1 whqtswO00WBw418f9t5JxYwZ\r\n2 QhdPYR:00WBw1Ph7x7\r\n.\r\n")
        .write(b"STAT\r\n")
        .read(b"+OK 2 320\r\n")
        .write(b"QUIT\r\n")
        .read(b"+OK bye\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let mut client = client.login("alice", "wonderland").await.unwrap();

    let uids = client.uidl().await.unwrap();
    assert_eq!(uids.len(), 2);
    assert_eq!(uids[1].number, 2);
    assert_eq!(uids[1].unique_id, "QhdPYR:00WBw1Ph7x7");

    let stat = client.stat().await.unwrap();
    assert_eq!(stat.count, 2);
    assert_eq!(stat.size, 320);

    client.quit().await.unwrap();
}

#[tokio::test]
async fn test_failed_password_returns_client_for_quit() {
    let mock = Builder::new()
        .read(b"+OK POP3 ready\r\n")
        .write(b"USER alice\r\n")
        .read(b"+OK\r\n")
        .write(b"PASS wrong\r\n")
        .read(b"-ERR [AUTH] invalid password\r\n")
        .write(b"QUIT\r\n")
        .read(b"+OK\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let failure = client.login("alice", "wrong").await.unwrap_err();
    match &failure.error {
        Error::Rejected { command, message } => {
            assert_eq!(*command, "PASS");
            assert_eq!(message, "[AUTH] invalid password");
        }
        other => panic!("unexpected error: {other}"),
    }

    failure.client.quit().await.unwrap();
}

#[tokio::test]
async fn test_capa_and_auth_plain() {
    let mock = Builder::new()
        .read(b"+OK ready\r\n")
        .write(b"CAPA\r\n")
        .read(b"+OK Capability list follows\r\nUSER\r\nUIDL\r\nSASL PLAIN\r\n.\r\n")
        .write(b"AUTH PLAIN AGFsaWNlAHdvbmRlcmxhbmQ=\r\n")
        .read(b"+OK Logged in.\r\n")
        .build();

    let mut client = Client::from_stream(mock).await.unwrap();
    let caps = client.capabilities().await.unwrap();
    assert!(caps.contains(&Capability::Uidl));
    assert!(caps.supports_sasl("PLAIN"));

    let _client = client.auth_plain("alice", "wonderland").await.unwrap();
}

#[tokio::test]
async fn test_capa_unsupported_is_empty() {
    let mock = Builder::new()
        .read(b"+OK ready\r\n")
        .write(b"CAPA\r\n")
        .read(b"-ERR unknown command\r\n")
        .build();

    let mut client = Client::from_stream(mock).await.unwrap();
    let caps = client.capabilities().await.unwrap();
    assert!(caps.is_empty());
}

#[tokio::test]
async fn test_uidl_unsupported_is_rejection() {
    let mock = Builder::new()
        .read(b"+OK ready\r\n")
        .write(b"USER bob\r\n")
        .read(b"+OK\r\n")
        .write(b"PASS pw\r\n")
        .read(b"+OK\r\n")
        .write(b"UIDL\r\n")
        .read(b"-ERR command not implemented\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let mut client = client.login("bob", "pw").await.unwrap();
    let err = client.uidl().await.unwrap_err();
    assert!(err.is_rejection());
}

#[tokio::test]
async fn test_byte_stuffed_lines_are_unstuffed() {
    let mock = Builder::new()
        .read(b"+OK ready\r\n")
        .write(b"CAPA\r\n")
        .read(b"+OK\r\n..STRANGE\r\n.\r\n")
        .build();

    let mut client = Client::from_stream(mock).await.unwrap();
    let caps = client.capabilities().await.unwrap();
    assert!(caps.contains(&Capability::Other(".STRANGE".to_string())));
}

#[tokio::test]
async fn test_connection_closed_mid_session() {
    let mock = Builder::new()
        .read(b"+OK ready\r\n")
        .write(b"USER carol\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let failure = client.login("carol", "pw").await.unwrap_err();
    assert!(matches!(failure.error, Error::ConnectionClosed));
}
