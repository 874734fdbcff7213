//! tp-mcp - TrainingPeaks MCP server and credential CLI.

use std::io::BufReader;
use std::sync::Arc;

use tp_mcp::tools::{NoBrowserSource, ToolRegistry};
use tp_mcp::{cli, server, AuthContext, Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let code = runtime.block_on(async_main())?;
    std::process::exit(code);
}

async fn async_main() -> anyhow::Result<i32> {
    // stdout carries MCP traffic and command output, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tp_mcp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    let ctx = AuthContext::from_config(&config);
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.first().map(|a| a.eq_ignore_ascii_case("serve")) == Some(true) {
        info!("Starting MCP server on stdio");
        let registry = ToolRegistry::new(ctx, Arc::new(NoBrowserSource));
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        server::serve(&registry, stdin, tokio::io::stdout()).await?;
        return Ok(0);
    }

    let mut stdin = BufReader::new(std::io::stdin());
    let mut stdout = std::io::stdout();
    cli::run(&args, &ctx, &mut stdin, &mut stdout).await
}
