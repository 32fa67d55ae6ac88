use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "defect-detective")]
#[command(about = "製造・工業画像の欠陥AI解析API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// HTTP APIサーバーを起動
    Serve {
        /// 待ち受けアドレス（省略時は BIND_ADDR、既定 0.0.0.0:8001）
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// ローカル画像を1枚解析して結果JSONを出力
    Analyze {
        /// 画像ファイルのパス
        #[arg(required = true)]
        image: PathBuf,

        /// 結果を保存しない
        #[arg(long)]
        no_save: bool,

        /// 出力JSONにBase64画像を含める
        #[arg(long)]
        include_image: bool,
    },

    /// 最近の解析結果を表示
    History {
        /// 表示件数
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// 出力形式 (table/json)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// 解析結果を1件表示
    Show {
        /// 解析ID
        #[arg(required = true)]
        id: String,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "t" => Ok(OutputFormat::Table),
            "json" | "j" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json", s)),
        }
    }
}
