// main.rs — 程序入口
// 负责初始化异步运行时、解析命令行参数、分发子命令

mod cli; // 声明 cli 模块，对应 src/cli.rs
mod config; // 声明 config 模块，对应 src/config.rs
mod error;
mod session; // 声明 session 模块，对应 src/session.rs
mod source;

// 初始化多语言支持，嵌入 locales 目录下的所有翻译
rust_i18n::i18n!("locales");

use clap::{CommandFactory, Parser}; // 引入 Parser trait 的 parse() 方法; CommandFactory 用于生成补全脚本
use clap_complete::generate; // 引入补全脚本生成函数
use cli::{Cli, Commands}; // 引入 CLI 结构体和子命令枚举
use config::AppConfig; // 引入应用配置
use error::FetchError;
use rust_i18n::t; // 引入翻译宏
use session::ImageCursor;
use source::wallhaven::WallhavenClient;
use source::{SearchQuery, WallpaperSource};
use std::io::{BufRead, Write};

/// `#[tokio::main]` 宏将 async main 转换为同步 main + tokio 运行时
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 自动检测系统语言并设置
    let locale = std::env::var("LANG").unwrap_or_else(|_| "en".to_string());
    if locale.starts_with("zh") {
        rust_i18n::set_locale("zh-CN");
    } else {
        rust_i18n::set_locale("en");
    }

    // 解析命令行参数
    let cli = Cli::parse();

    // 创建应用配置（读取环境变量、设置路径）
    let mut config = AppConfig::new();

    // 确保图片目录和存档目录存在
    config.ensure_dirs()?;

    // 根据子命令分发执行逻辑
    match &cli.command {
        Commands::Run {
            categories,
            purity,
            atleast,
            sorting,
            order,
        } => {
            handle_run(
                &config,
                categories.as_deref(),
                purity.as_deref(),
                atleast.as_deref(),
                sorting.as_deref(),
                order.as_deref(),
            )
            .await?;
        }

        Commands::Fetch {
            categories,
            purity,
            atleast,
            sorting,
            order,
            archive,
        } => {
            handle_fetch(
                &config,
                categories.as_deref(),
                purity.as_deref(),
                atleast.as_deref(),
                sorting.as_deref(),
                order.as_deref(),
                *archive,
            )
            .await?;
        }

        Commands::Completions { shell } => {
            generate(
                *shell,
                &mut Cli::command(),
                "randwall",
                &mut std::io::stdout(),
            );
        }

        Commands::Config { action } => {
            handle_config(&mut config, action)?;
        }
    }

    Ok(())
}

/// 用命令行覆盖项和配置默认值拼出本次使用的搜索参数
fn build_query(
    config: &AppConfig,
    categories: Option<&str>,
    purity: Option<&str>,
    atleast: Option<&str>,
    sorting: Option<&str>,
    order: Option<&str>,
) -> SearchQuery {
    let defaults = &config.search_defaults;

    SearchQuery {
        categories: categories.unwrap_or(&defaults.categories).to_string(),
        purity: purity.unwrap_or(&defaults.purity).to_string(),
        atleast: atleast.unwrap_or(&defaults.atleast).to_string(),
        sorting: sorting.unwrap_or(&defaults.sorting).to_string(),
        order: order.unwrap_or(&defaults.order).to_string(),
    }
}

/// 处理 run 子命令：交互式循环获取壁纸
///
/// 每一轮：游标取下一个详情页 → 解析原图地址 → 下载覆盖当前壁纸文件
/// → 询问是否备份 → 询问是否继续。游标只在当前条目处理完后才前进，
/// 下载失败时用户选择继续会重试同一张。
async fn handle_run(
    config: &AppConfig,
    categories: Option<&str>,
    purity: Option<&str>,
    atleast: Option<&str>,
    sorting: Option<&str>,
    order: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let query = build_query(config, categories, purity, atleast, sorting, order);
    let client = WallhavenClient::new(query)?;
    let mut cursor = ImageCursor::new();

    println!("{}", t!("search_start"));

    loop {
        let detail_url = match cursor.advance(&client).await {
            Ok(url) => url,
            Err(FetchError::EmptyListing { .. }) => {
                println!("{}", t!("no_results"));
                break;
            }
            Err(e) => return Err(e.into()),
        };

        match client.detail(&detail_url).await {
            Ok(detail) => match client.download(&detail.url, &config.current_path).await {
                Ok(()) => {
                    cursor.commit();
                    println!("{}", t!("retrieved", alt => detail.alt));

                    if prompt_yes_no(&t!("prompt_backup"), false)? {
                        archive_copy(config, &detail.url)?;
                    }
                }
                Err(FetchError::Download { status, .. }) => {
                    // 游标不前进，用户选择继续时重试同一张
                    println!("{}", t!("download_failed", status => status));
                }
                Err(e) => return Err(e.into()),
            },
            Err(FetchError::MissingImage { url }) => {
                // 页面结构异常，跳过这一条，避免反复撞同一个坏链接
                println!("{}", t!("missing_image", url => url));
                cursor.commit();
            }
            Err(e) => return Err(e.into()),
        }

        if !prompt_yes_no(&t!("prompt_continue"), true)? {
            break;
        }
    }

    Ok(())
}

/// 处理 fetch 子命令：获取一张壁纸后退出
///
/// 解析失败、下载被拒、搜索无结果都只打印提示正常退出，
/// 方便脚本调用；连接层错误照常返回非零。
async fn handle_fetch(
    config: &AppConfig,
    categories: Option<&str>,
    purity: Option<&str>,
    atleast: Option<&str>,
    sorting: Option<&str>,
    order: Option<&str>,
    archive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let query = build_query(config, categories, purity, atleast, sorting, order);
    let client = WallhavenClient::new(query)?;
    let mut cursor = ImageCursor::new();

    println!("{}", t!("search_start"));

    let detail_url = match cursor.advance(&client).await {
        Ok(url) => url,
        Err(FetchError::EmptyListing { .. }) => {
            println!("{}", t!("no_results"));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let detail = match client.detail(&detail_url).await {
        Ok(detail) => detail,
        Err(FetchError::MissingImage { url }) => {
            println!("{}", t!("missing_image", url => url));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match client.download(&detail.url, &config.current_path).await {
        Ok(()) => {
            println!("{}", t!("retrieved", alt => detail.alt));
            println!("{}", t!("save_path", path => config.current_path.display()));

            if archive {
                archive_copy(config, &detail.url)?;
            }
            Ok(())
        }
        Err(FetchError::Download { status, .. }) => {
            println!("{}", t!("download_failed", status => status));
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// 把当前壁纸复制进存档目录，文件名取原图 URL 的最后一段
/// 存档从不覆盖：目标已存在时保留原文件并提示
fn archive_copy(config: &AppConfig, image_url: &str) -> std::io::Result<()> {
    let filename = image_url.rsplit('/').next().unwrap_or("wallpaper.jpg");
    let archive_path = config.archive_dir.join(filename);

    if archive_path.exists() {
        println!("{}", t!("archive_exists", path => archive_path.display()));
        return Ok(());
    }

    std::fs::copy(&config.current_path, &archive_path)?;
    println!("{}", t!("archived", path => archive_path.display()));

    Ok(())
}

/// 在终端上问一个是/否问题
///
/// 空输入取 default_yes 指定的默认值。stdin 已关闭（EOF）时一律
/// 按"否"处理，避免重定向输入时在默认"是"的问题上死循环。
fn prompt_yes_no(prompt: &str, default_yes: bool) -> std::io::Result<bool> {
    print!("{}", prompt);
    std::io::stdout().flush()?;

    read_answer(std::io::stdin().lock(), default_yes)
}

/// 从输入源读一行并解析回答，EOF 一律返回"否"
fn read_answer(mut input: impl BufRead, default_yes: bool) -> std::io::Result<bool> {
    let mut line = String::new();
    let n = input.read_line(&mut line)?;
    if n == 0 {
        return Ok(false);
    }

    Ok(parse_answer(&line, default_yes))
}

/// 解析是/否回答：y/yes（不分大小写）为是，空输入取默认值，其余为否
fn parse_answer(input: &str, default_yes: bool) -> bool {
    match input.trim().to_lowercase().as_str() {
        "" => default_yes,
        "y" | "yes" => true,
        _ => false,
    }
}

/// 处理 config 子命令：查看或修改配置
fn handle_config(
    config: &mut AppConfig,
    action: &cli::ConfigAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        cli::ConfigAction::Show => {
            println!("{}", t!("config_title"));
            println!(
                "{}",
                t!("config_path", path => config.config_path.display())
            );
            println!(
                "{}",
                t!("config_picture_dir", path => config.picture_dir.display())
            );
            println!(
                "{}",
                t!("config_archive_dir", path => config.archive_dir.display())
            );
            println!("{}", t!("config_search_defaults"));
            println!(
                "{}",
                t!("config_categories", value => config.search_defaults.categories)
            );
            println!(
                "{}",
                t!("config_purity", value => config.search_defaults.purity)
            );
            println!(
                "{}",
                t!("config_atleast", value => config.search_defaults.atleast)
            );
            println!(
                "{}",
                t!("config_sorting", value => config.search_defaults.sorting)
            );
            println!(
                "{}",
                t!("config_order", value => config.search_defaults.order)
            );
        }
        cli::ConfigAction::Schema => {
            println!("{}", AppConfig::get_schema());
        }
        cli::ConfigAction::Dump => {
            println!("{}", config.to_toml());
        }
        cli::ConfigAction::Set { key, value } => {
            match key.as_str() {
                "categories" => {
                    if !config::is_filter_mask(value) {
                        return Err(t!("config_error_invalid_mask", value => value).into());
                    }
                    config.search_defaults.categories = value.clone();
                }
                "purity" => {
                    if !config::is_filter_mask(value) {
                        return Err(t!("config_error_invalid_mask", value => value).into());
                    }
                    config.search_defaults.purity = value.clone();
                }
                "atleast" => config.search_defaults.atleast = value.clone(),
                "sorting" => config.search_defaults.sorting = value.clone(),
                "order" => config.search_defaults.order = value.clone(),
                _ => return Err(t!("config_error_unknown_key", key => key).into()),
            }
            config.save()?;
            println!("{}", t!("config_updated", key => key, value => value));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn config_at(root: &Path) -> AppConfig {
        let picture_dir = root.to_path_buf();
        AppConfig {
            archive_dir: picture_dir.join("wallpapers"),
            current_path: picture_dir.join("wallpaper.jpg"),
            config_path: root.join("config.toml"),
            search_defaults: config::SearchDefaults::default(),
            picture_dir,
        }
    }

    // --- parse_answer / read_answer ---

    #[test]
    fn empty_answer_takes_the_default() {
        assert!(parse_answer("\n", true));
        assert!(!parse_answer("\n", false));
    }

    #[test]
    fn yes_answers_ignore_case() {
        assert!(parse_answer("y\n", false));
        assert!(parse_answer("YES\n", false));
        assert!(parse_answer("  yes  \n", false));
    }

    #[test]
    fn anything_else_is_no() {
        assert!(!parse_answer("n\n", true));
        assert!(!parse_answer("quit\n", true));
        assert!(!parse_answer("yep\n", true));
    }

    #[test]
    fn eof_answer_is_no_even_when_default_is_yes() {
        assert!(!read_answer(std::io::Cursor::new(""), true).unwrap());
        assert!(!read_answer(std::io::Cursor::new(""), false).unwrap());
    }

    #[test]
    fn blank_line_still_takes_the_default() {
        assert!(read_answer(std::io::Cursor::new("\n"), true).unwrap());
        assert!(!read_answer(std::io::Cursor::new("\n"), false).unwrap());
    }

    // --- build_query ---

    #[test]
    fn query_falls_back_to_config_defaults() {
        let config = config_at(Path::new("/tmp/pics"));
        let query = build_query(&config, None, None, None, None, None);

        assert_eq!(query.categories, "111");
        assert_eq!(query.purity, "100");
        assert_eq!(query.atleast, "1920x1080");
        assert_eq!(query.sorting, "random");
        assert_eq!(query.order, "desc");
    }

    #[test]
    fn query_overrides_win_over_defaults() {
        let config = config_at(Path::new("/tmp/pics"));
        let query = build_query(&config, None, Some("110"), None, Some("views"), Some("asc"));

        assert_eq!(query.categories, "111");
        assert_eq!(query.purity, "110");
        assert_eq!(query.sorting, "views");
        assert_eq!(query.order, "asc");
    }

    // --- archive_copy ---

    #[test]
    fn archive_takes_basename_from_image_url() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_at(dir.path());
        std::fs::create_dir_all(&config.archive_dir).unwrap();
        std::fs::write(&config.current_path, "first").unwrap();

        archive_copy(&config, "https://w.wallhaven.cc/full/wg/wg-abc.jpg").unwrap();

        assert_eq!(
            std::fs::read_to_string(config.archive_dir.join("wg-abc.jpg")).unwrap(),
            "first"
        );
    }

    #[test]
    fn archive_never_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_at(dir.path());
        std::fs::create_dir_all(&config.archive_dir).unwrap();

        let url = "https://w.wallhaven.cc/full/wg/wg-abc.jpg";
        std::fs::write(&config.current_path, "first").unwrap();
        archive_copy(&config, url).unwrap();

        // 工作文件已换成下一张，重复存档同一 URL 不得改动已有存档
        std::fs::write(&config.current_path, "second").unwrap();
        archive_copy(&config, url).unwrap();

        assert_eq!(
            std::fs::read_to_string(config.archive_dir.join("wg-abc.jpg")).unwrap(),
            "first"
        );
    }
}
