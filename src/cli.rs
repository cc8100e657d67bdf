// cli.rs — 命令行接口定义模块
// 使用 clap 的 derive 模式定义所有子命令和参数

use clap::{Parser, Subcommand}; // Parser: 解析命令行参数的 trait; Subcommand: 定义子命令的 trait
use clap_complete::Shell; // Shell 枚举：Bash, Zsh, Fish, Elvish, PowerShell

/// wallhaven.cc 随机壁纸获取工具
///
/// 抓取 wallhaven 搜索页，把随机壁纸下载到固定的"当前壁纸"文件，
/// 喜欢的可以备份到存档目录。
#[derive(Parser)]
#[command(name = "randwall")]
#[command(version)] // 自动从 Cargo.toml 读取 version 字段
#[command(about = "wallhaven.cc 随机壁纸获取工具 — 抓取搜索页并下载壁纸到本地")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 交互模式：逐张获取壁纸，询问是否备份、是否继续
    ///
    /// 用法示例:
    ///   randwall run
    ///   randwall run --purity 110 --sorting toplist
    Run {
        /// 分类开关 (General/Anime/People)，如 "111"=全部, "100"=仅General
        #[arg(short, long)]
        categories: Option<String>,

        /// 纯净度开关 (SFW/Sketchy/NSFW)，如 "100"=仅SFW
        #[arg(short, long)]
        purity: Option<String>,

        /// 最低分辨率，如 "1920x1080"
        #[arg(short, long)]
        atleast: Option<String>,

        /// 排序方式 (date_added/relevance/random/views/favorites/toplist)
        #[arg(short, long)]
        sorting: Option<String>,

        /// 排序方向 (asc/desc)
        #[arg(short, long)]
        order: Option<String>,
    },

    /// 获取一张壁纸后立即退出，适合脚本或定时任务调用
    ///
    /// 用法示例:
    ///   randwall fetch
    ///   randwall fetch --archive
    ///   randwall fetch -a 3840x2160 -s toplist
    Fetch {
        /// 分类开关 (General/Anime/People)，如 "111"=全部
        #[arg(short, long)]
        categories: Option<String>,

        /// 纯净度开关 (SFW/Sketchy/NSFW)，如 "100"=仅SFW
        #[arg(short, long)]
        purity: Option<String>,

        /// 最低分辨率，如 "1920x1080"
        #[arg(short, long)]
        atleast: Option<String>,

        /// 排序方式 (date_added/relevance/random/views/favorites/toplist)
        #[arg(short, long)]
        sorting: Option<String>,

        /// 排序方向 (asc/desc)
        #[arg(short, long)]
        order: Option<String>,

        /// 下载完成后直接备份到存档目录，不询问
        #[arg(long)]
        archive: bool,
    },

    /// 生成 shell 补全脚本（支持 bash, zsh, fish, elvish, powershell）
    ///
    /// 用法示例：
    ///   randwall completions zsh > ~/.zsh/completions/_randwall
    ///   randwall completions fish > ~/.config/fish/completions/randwall.fish
    Completions {
        /// 目标 shell 类型
        shell: Shell,
    },

    /// 配置管理操作
    ///
    /// 用法示例:
    ///   randwall config show
    ///   randwall config dump
    ///   randwall config set purity "110"
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// 配置管理操作
#[derive(Subcommand)]
pub enum ConfigAction {
    /// 查看当前所有配置简报
    Show,
    /// 生成配置文件对应的 JSON Schema
    Schema,
    /// 以 TOML 格式打印当前完整配置内容
    Dump,
    /// 设置默认搜索参数 (支持: categories, purity, atleast, sorting, order)
    Set {
        /// 要设置的键
        key: String,
        /// 要设置的值
        value: String,
    },
}
