use shardline::config::Config;
use shardline::http::HttpMessage;
use shardline::http::request::{Method, Request};
use shardline::http::response::{Response, StatusCode};
use shardline::server::HttpServer;
use tokio::io::{AsyncBufReadExt, BufReader};

fn say_hello(_: &Request) -> Response {
    let mut response = Response::new(StatusCode::Ok);
    response.set_header("Content-Type", "text/html");
    response.set_body("");
    response
}

fn send_html(_: &Request) -> Response {
    let mut response = Response::new(StatusCode::Ok);
    response.set_header("Content-Type", "text/html");
    response.set_body(
        "<!doctype html>\n<html>\n<body>\n\n\
         <h1>Hello, world in an Html page</h1>\n\
         <p>A Paragraph</p>\n\n\
         </body>\n</html>\n",
    );
    response
}

/// Resolves once `quit` is entered. Never resolves if stdin is closed.
async fn quit_command() {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim() == "quit" {
            return;
        }
    }
    std::future::pending::<()>().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    let mut server = HttpServer::new(cfg.server.clone());
    server
        .register_handler("/", Method::HEAD, say_hello)
        .register_handler("/", Method::GET, say_hello)
        .register_handler("/hello.html", Method::HEAD, send_html)
        .register_handler("/hello.html", Method::GET, send_html);

    let handle = server.start(&cfg.host, cfg.port)?;
    tracing::info!("Listening on {}, enter [quit] to stop", handle.local_addr());

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }

        _ = quit_command() => {
            tracing::info!("'quit' command entered");
        }
    }

    tokio::task::spawn_blocking(move || handle.stop()).await?;

    Ok(())
}
