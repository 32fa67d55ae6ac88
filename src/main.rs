use anyhow::Context;
use clap::Parser;
use defect_detective::{analyzer, api, cli, config, store};
use cli::{Cli, Commands, OutputFormat};
use config::Config;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().context("設定の読み込みに失敗しました")?;

    match cli.command {
        Commands::Serve { bind } => {
            let addr = bind.unwrap_or(config.bind_addr);
            api::serve(&config, addr).await?;
        }

        Commands::Analyze { image, no_save, include_image } => {
            eprintln!("🔍 defect-detective - 欠陥解析\n");

            let bytes = std::fs::read(&image)
                .with_context(|| format!("画像を読み込めません: {}", image.display()))?;
            let upload = analyzer::Upload {
                filename: image
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| image.display().to_string()),
                content_type: Some(analyzer::mime_type_for_path(&image).to_string()),
                bytes,
            };

            let store = Arc::new(store::AnalysisStore::open(&config.database_location())?);
            let client = analyzer::GeminiClient::new(&config)?;
            let pipeline = analyzer::AnalysisPipeline::new(client, store);

            let mut result = if no_save {
                pipeline.analyze(upload).await?
            } else {
                pipeline.run(upload).await?
            };
            eprintln!("✔ {}件の欠陥を検出", result.total_defects);

            if !include_image {
                result.image_encoded = None;
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::History { limit, format } => {
            let store = store::AnalysisStore::open(&config.database_location())?;
            let results = store.list_recent(limit)?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
                OutputFormat::Table => {
                    if results.is_empty() {
                        println!("解析結果はありません");
                    }
                    for r in &results {
                        println!(
                            "{}  {}  {:>3}件  {}",
                            r.id,
                            r.upload_time.format("%Y-%m-%d %H:%M:%S"),
                            r.total_defects,
                            r.filename
                        );
                    }
                }
            }
        }

        Commands::Show { id } => {
            let store = store::AnalysisStore::open(&config.database_location())?;
            let result = store.get_by_id(&id)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
