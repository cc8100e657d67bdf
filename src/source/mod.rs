// source/mod.rs — 壁纸源抽象接口模块
// 定义壁纸站客户端必须实现的通用 Trait 以及共享的数据结构
pub mod wallhaven;

use crate::error::FetchError;
use async_trait::async_trait; // 异步 Trait 支持宏
use std::path::Path;

/// 搜索参数
///
/// 构造后不再修改，由客户端插值成搜索 URL。
/// categories / purity 是三位开关位字符串（如 "111"、"100"），
/// 每一位独立表示开或关，可以同时打开多位。
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// 分类开关 (General/Anime/People)
    pub categories: String,
    /// 纯净度开关 (SFW/Sketchy/NSFW)
    pub purity: String,
    /// 最低分辨率（如 "1920x1080"）
    pub atleast: String,
    /// 排序方式（如 "random"）
    pub sorting: String,
    /// 排序方向 (asc/desc)
    pub order: String,
}

/// 从详情页解析出的单张壁纸记录
#[derive(Debug, Clone)]
pub struct ImageDetail {
    /// 原图的直接下载 URL
    pub url: String,
    /// 图片的描述文本，页面缺失时为空字符串
    pub alt: String,
}

/// 壁纸源的抽象 Trait
///
/// 列表、详情、下载三个操作同时也是呈现层（GUI）依赖的边界：
/// 界面拿 `listing` 渲染缩略图列表，拿 `detail` 解析原图地址，
/// 再用 `download` 落盘。
///
/// # 异步 Trait 说明
/// Rust 原生对 Trait 中的 async fn 支持有限，
/// 这里使用 `async_trait` 宏来支持异步接口。
#[async_trait]
pub trait WallpaperSource {
    /// 抓取一页搜索结果，返回按页面顺序排列的详情页链接
    /// 空列表是合法的"无结果"值，不是错误
    async fn listing(&self) -> Result<Vec<String>, FetchError>;

    /// 抓取一个详情页，解析出原图 URL 和描述文本
    async fn detail(&self, url: &str) -> Result<ImageDetail, FetchError>;

    /// 把图片下载到指定路径，失败时不留下部分写入的文件
    async fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}
