//! Connection handling over in-memory streams

use parking_lot::Mutex;
use roomchatd_core::*;
use roomchatd_modules::register_default_modules;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

fn handler() -> (ConnectionHandler, Arc<Mutex<ChatState>>) {
    let config = Config::default();
    let state = Arc::new(Mutex::new(ChatState::new(&config.session)));
    let mut router = Router::new();
    register_default_modules(&mut router, MotdManager::new(vec!["hello there".to_string()]));
    let handler = ConnectionHandler::new(Arc::new(config), state.clone(), Arc::new(router));
    (handler, state)
}

#[tokio::test]
async fn test_session_lifecycle_until_quit() {
    let (handler, state) = handler();
    let (mut client, server) = tokio::io::duplex(4096);

    let task = tokio::spawn(async move {
        handler
            .handle_connection(server, "10.0.0.1:4000".to_string())
            .await
    });

    client
        .write_all(b"/login alice\r\n\n/join lobby\r/quit\n")
        .await
        .unwrap();

    let mut output = String::new();
    client.read_to_string(&mut output).await.unwrap();
    task.await.unwrap().unwrap();

    let expected = [
        "<= hello there",
        "=> /login alice",
        "<= You are now known as alice.",
        "=> ",
        "<= You are not in a channel! Join one with /join <channel>.",
        "=> /join lobby",
        "<= alice has joined lobby",
        "<= Users in lobby: alice",
        "=> /quit",
        "<= You have left lobby.",
        "<= Goodbye!",
    ];
    assert_eq!(output.lines().collect::<Vec<_>>(), expected);

    let state = state.lock();
    assert!(state.sessions().is_empty());
    assert!(state.channels().is_empty());
}

#[tokio::test]
async fn test_blank_line_is_chat_text() {
    let (handler, state) = handler();
    let (mut client, server) = tokio::io::duplex(4096);

    let task = tokio::spawn(async move {
        handler
            .handle_connection(server, "10.0.0.4:4000".to_string())
            .await
    });

    client
        .write_all(b"\n/join lobby\n\n/quit\n")
        .await
        .unwrap();

    let mut output = String::new();
    client.read_to_string(&mut output).await.unwrap();
    task.await.unwrap().unwrap();

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines[..3],
        [
            "<= hello there",
            "=> ",
            "<= You are not in a channel! Join one with /join <channel>.",
        ]
    );
    // Inside a channel an empty line is said like any other text
    let name = lines
        .iter()
        .find_map(|l| l.strip_prefix("<= Users in lobby: "))
        .unwrap()
        .to_string();
    assert!(lines.contains(&format!("<= {}: ", name).as_str()));
    assert!(state.lock().sessions().is_empty());
}

#[tokio::test]
async fn test_dropped_connection_is_cleaned_up() {
    let (handler, state) = handler();
    let (client, server) = tokio::io::duplex(4096);

    let task = tokio::spawn(async move {
        handler
            .handle_connection(server, "10.0.0.2:4000".to_string())
            .await
    });

    let (read_half, mut write_half) = tokio::io::split(client);
    write_half.write_all(b"/join lobby\n").await.unwrap();

    let mut lines = BufReader::new(read_half).lines();
    while let Some(line) = lines.next_line().await.unwrap() {
        if line.starts_with("<= Users in lobby:") {
            break;
        }
    }
    assert_eq!(state.lock().channels().len(), 1);

    drop(write_half);
    drop(lines);
    task.await.unwrap().unwrap();

    let state = state.lock();
    assert!(state.sessions().is_empty());
    assert!(state.channels().is_empty());
}

#[tokio::test]
async fn test_overlong_line_drops_connection() {
    let mut config = Config::default();
    config.connection.max_line_length = 32;
    let state = Arc::new(Mutex::new(ChatState::new(&config.session)));
    let mut router = Router::new();
    register_default_modules(&mut router, MotdManager::new(vec!["hi".to_string()]));
    let handler = ConnectionHandler::new(Arc::new(config), state.clone(), Arc::new(router));

    let (mut client, server) = tokio::io::duplex(4096);
    let task = tokio::spawn(async move {
        handler
            .handle_connection(server, "10.0.0.3:4000".to_string())
            .await
    });

    client.write_all(&[b'x'; 100]).await.unwrap();
    let mut output = String::new();
    client.read_to_string(&mut output).await.unwrap();
    task.await.unwrap().unwrap();

    assert_eq!(output, "<= hi\n");
    assert!(state.lock().sessions().is_empty());
}

#[tokio::test]
async fn test_server_accepts_tcp_clients() {
    let mut config = Config::default();
    config.server.motd = Some("tcp welcome".to_string());
    config.connection.bind_address = "127.0.0.1".to_string();
    config.connection.port = Some(0);

    let mut router = Router::new();
    let motd = MotdManager::from_config(&config.server).unwrap();
    register_default_modules(&mut router, motd);
    let server = Arc::new(Server::new(config, router));

    let listener = server.bind(Environment::Dev).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accept = {
        let server = server.clone();
        tokio::spawn(async move { server.serve(listener).await })
    };

    let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    assert_eq!(lines.next_line().await.unwrap().unwrap(), "<= tcp welcome");

    write_half.write_all(b"/rooms\n").await.unwrap();
    assert_eq!(lines.next_line().await.unwrap().unwrap(), "=> /rooms");
    assert_eq!(
        lines.next_line().await.unwrap().unwrap(),
        "<= There are no channels. Create one with /join <channel>."
    );
    assert_eq!(server.state().lock().sessions().len(), 1);

    accept.abort();
}
