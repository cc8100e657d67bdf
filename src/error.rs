// error.rs — 错误类型定义模块
// 按照故障的性质划分变体，驱动层据此决定是跳过、重试还是退出

use thiserror::Error;

/// 抓取与下载流程中可能出现的所有错误
///
/// `#[from]` 让 `?` 操作符自动把底层错误转换成对应的变体，
/// 调用方可以通过 match 区分可恢复错误（MissingImage、Download）
/// 和致命错误（Transport、EmptyListing、Io）。
#[derive(Debug, Error)]
pub enum FetchError {
    /// 连接层失败：DNS 解析、连接被拒绝、超时等
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 详情页中找不到 `<img id="wallpaper">` 元素
    /// 说明页面结构变化或链接不是有效的详情页，不是网络问题
    #[error("no wallpaper element found at {url}")]
    MissingImage { url: String },

    /// 图片请求返回了非 2xx 状态码，目标文件未被写入
    #[error("download failed with HTTP {status}: {url}")]
    Download { status: u16, url: String },

    /// 连续多次刷新后搜索结果仍然为空
    #[error("listing still empty after {attempts} fetches")]
    EmptyListing { attempts: u32 },

    /// 本地文件系统错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
