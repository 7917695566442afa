use movie_info_server::{Result, config::ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = ServerConfig::load()?;
    movie_info_server::run(args).await
}
