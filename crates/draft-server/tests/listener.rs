//! Serving over a real socket.

use std::time::Duration;

use draft_server::{middleware, Engine, Server, ServerConfig, ShutdownSignal};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8_lossy(&buf).into_owned()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_serves_until_shutdown() {
    let mut engine = Engine::new();
    engine.use_middleware([middleware::recovery()]);
    engine
        .get("/hello/:name", |c| {
            let name = c.param("name").unwrap_or_default().to_owned();
            c.string(200, format_args!("hello {name}"));
        })
        .unwrap();
    engine.get("/panic", |_| panic!("handler failure")).unwrap();
    let dispatcher = engine.build();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServerConfig::builder()
        .shutdown_timeout(Duration::from_secs(2))
        .build();
    let shutdown = ShutdownSignal::new();
    let server = tokio::spawn(
        Server::new(std::sync::Arc::clone(&dispatcher), config).serve(listener, shutdown.clone()),
    );

    let response = raw_request(
        addr,
        "GET /hello/ada HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.ends_with("hello ada"), "{response}");

    let response = raw_request(
        addr,
        "GET /panic HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 500"), "{response}");
    assert!(
        response.ends_with(r#"{"message":"Internal Server Error"}"#),
        "{response}"
    );

    let response = raw_request(
        addr,
        "GET /nowhere HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");
    assert!(response.ends_with("404 NOT FOUND: /nowhere"), "{response}");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop")
        .expect("server task should not panic")
        .expect("server should exit cleanly");

    assert_eq!(dispatcher.pool().idle(), dispatcher.pool().allocated());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut engine = Engine::new();
    engine.post("/upload", |c| c.status(204)).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServerConfig::builder().max_body_bytes(8).build();
    let shutdown = ShutdownSignal::new();
    let server = Server::new(engine.build(), config);
    let server = tokio::spawn(server.serve(listener, shutdown.clone()));

    let response = raw_request(
        addr,
        "POST /upload HTTP/1.1\r\nHost: localhost\r\nContent-Length: 16\r\n\
         Connection: close\r\n\r\n0123456789abcdef",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 413"), "{response}");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
