use std::path::PathBuf;

use clap::Parser;

/// 从「小説家になろう」/「カクヨム」抓取小说并打包成EPUB
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// 小说ID（なろう的ncode或カクヨム的作品ID）
    pub novel_id: String,

    /// 下载并嵌入插图（仅なろう支持）
    #[arg(short, long)]
    pub illustration: bool,

    /// 对正文做纵中横排版转换
    #[arg(short, long)]
    pub tcy: bool,

    /// 只抓取指定话数，如 1,3-5,10
    #[arg(short, long)]
    pub range: Option<String>,

    /// 输出文件路径，默认为 <novel_id>.epub
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 从カクヨム抓取
    #[arg(short, long)]
    pub kakuyomu: bool,
}
