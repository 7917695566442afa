use std::time::Duration;

use anyhow::{Result, anyhow};
use movie_info_server::config::{Parser, ServerConfig};
use rand::Rng as _;
use tempfile::TempDir;

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
}

pub fn test_config(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix(format!("{}_", test_name))?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?;
    let port = port.to_string();
    let args = &[
        "movie-info-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--listen-address",
        "127.0.0.1",
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

pub fn base_url(args: &ServerConfig) -> reqwest::Url {
    format!("http://127.0.0.1:{}/", args.port)
        .parse()
        .expect("valid base url")
}

/// Boots the server in a background task and waits until it answers health
/// checks. The task lives for the rest of the test runtime.
pub async fn launch_env(args: &ServerConfig) -> Result<reqwest::Client> {
    let state = movie_info_server::build_state(args).await?;
    let server_args = args.clone();
    tokio::spawn(async move {
        if let Err(e) =
            movie_info_server::run_graceful_with_state(server_args, state, futures::future::pending())
                .await
        {
            tracing::error!("Server failed: {e}");
        }
    });

    let client = reqwest::Client::new();
    let health_url = base_url(args).join("health")?;
    for _ in 0..50 {
        match client.get(health_url.clone()).send().await {
            Ok(response) if response.status().is_success() => return Ok(client),
            _ => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
    Err(anyhow!("Server did not come up"))
}
