// wallhaven.rs — wallhaven.cc 抓取客户端模块
// 站点没有对外的 JSON 接口可用，搜索和详情都抓 HTML 页面解析

use super::{ImageDetail, SearchQuery, WallpaperSource};
use crate::error::FetchError;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File; // tokio 提供的异步文件操作
use tokio::io::AsyncWriteExt; // 异步写入 trait，提供 write_all() 等方法

/// 建立 TCP 连接的超时
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// 单个请求（含读完响应体）的总超时
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// wallhaven.cc 异步客户端
///
/// 持有 HTTP 客户端和构造时固定下来的搜索参数，
/// 同一个客户端反复抓取的是同一个搜索 URL。
///
/// # Rust 特性说明
/// - `reqwest::Client` 内部维护连接池，应该复用而非每次请求都创建新的
/// - scraper 的 `Html` 不是 `Send`，所以解析和提取都紧跟在抓取之后的
///   同步代码段里完成，解析结果从不跨 await 点持有
pub struct WallhavenClient {
    /// HTTP 客户端（内部有连接池，应复用）
    client: reqwest::Client,

    /// 站点基础 URL
    base_url: String,

    /// 本次会话的搜索参数
    query: SearchQuery,
}

impl WallhavenClient {
    /// 创建新的 wallhaven 客户端
    ///
    /// 显式配置连接超时和请求总超时，避免网络异常时无限阻塞。
    pub fn new(query: SearchQuery) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("randwall/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: String::from("https://wallhaven.cc"),
            query,
        })
    }

    /// 把搜索参数插值成完整的搜索 URL
    ///
    /// 参数顺序固定：categories, purity, atleast, sorting, order。
    /// 值原样写入，不做编码转换（全部是站点定义的简单 token）。
    pub fn search_url(&self) -> String {
        format!(
            "{}/search?categories={}&purity={}&atleast={}&sorting={}&order={}",
            self.base_url,
            self.query.categories,
            self.query.purity,
            self.query.atleast,
            self.query.sorting,
            self.query.order,
        )
    }

    /// 抓取一个页面并解析成 HTML 文档
    ///
    /// 这里刻意不检查 HTTP 状态码：错误页同样按 HTML 解析，
    /// 下游提取不到目标元素时自然得到空结果。
    /// 只有连接层失败（DNS、超时、拒绝连接）会返回 Transport 错误。
    async fn fetch_document(&self, url: &str) -> Result<Html, FetchError> {
        let body = self.client.get(url).send().await?.text().await?;
        Ok(Html::parse_document(&body))
    }
}

#[async_trait]
impl WallpaperSource for WallhavenClient {
    async fn listing(&self) -> Result<Vec<String>, FetchError> {
        let doc = self.fetch_document(&self.search_url()).await?;
        Ok(extract_listing(&doc))
    }

    async fn detail(&self, url: &str) -> Result<ImageDetail, FetchError> {
        let doc = self.fetch_document(url).await?;
        extract_detail(&doc).ok_or_else(|| FetchError::MissingImage {
            url: url.to_string(),
        })
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let response = self.client.get(url).send().await?;

        // 先验状态码再碰文件系统，失败的请求不会截断已有的目标文件
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Download {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        // 写入同目录下的临时文件，完整落盘后再改名到目标路径
        let tmp = dest.with_extension("part");
        if let Err(e) = write_body(response, &tmp).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        tokio::fs::rename(&tmp, dest).await?;

        Ok(())
    }
}

/// 把响应体按块流式写入指定路径
async fn write_body(mut response: reqwest::Response, path: &Path) -> Result<(), FetchError> {
    let mut file = File::create(path).await?;

    // chunk() 每次吐出一段响应体，读完返回 None
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(())
}

/// 从搜索结果页提取所有详情页链接，保持页面顺序
/// 找不到任何链接时返回空列表，这是合法的"无结果"，不是错误
fn extract_listing(doc: &Html) -> Vec<String> {
    let selector = Selector::parse("a.preview").unwrap();

    doc.select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// 从详情页提取原图 URL 和描述文本
///
/// 目标元素是页面里唯一的 `<img id="wallpaper">`。元素缺失或没有
/// src 属性时返回 None；alt 缺失不算错，记录为空字符串。
/// 站点输出的是协议相对地址（// 开头），这里补全成 https:。
fn extract_detail(doc: &Html) -> Option<ImageDetail> {
    let selector = Selector::parse("img#wallpaper").unwrap();
    let img = doc.select(&selector).next()?;

    let src = img.value().attr("src")?;
    let alt = img.value().attr("alt").unwrap_or("");

    let url = if src.starts_with("//") {
        format!("https:{}", src)
    } else {
        src.to_string()
    };

    Some(ImageDetail {
        url,
        alt: alt.to_string(),
    })
}

/// 按原图 URL 推导缩略图地址，供呈现层渲染预览列表
///
/// 规则：取 URL 的最后一段作为图片 id，id 的前两个字符是分片目录，
/// 如 .../wallpapers/full/wg-abc123 -> https://th.wallhaven.cc/small/wg/wg-abc123.jpg
/// id 不足两个字符时无法推导，返回 None。
#[allow(dead_code)]
pub fn thumbnail_url(image_url: &str) -> Option<String> {
    let basename = image_url.rsplit('/').next()?;
    let shard = basename.get(0..2)?;

    Some(format!(
        "https://th.wallhaven.cc/small/{}/{}.jpg",
        shard, basename
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn default_query() -> SearchQuery {
        SearchQuery {
            categories: "111".to_string(),
            purity: "100".to_string(),
            atleast: "1920x1080".to_string(),
            sorting: "random".to_string(),
            order: "desc".to_string(),
        }
    }

    // --- search_url ---

    #[test]
    fn search_url_with_defaults() {
        let client = WallhavenClient::new(default_query()).unwrap();
        assert_eq!(
            client.search_url(),
            "https://wallhaven.cc/search?categories=111&purity=100&atleast=1920x1080&sorting=random&order=desc"
        );
    }

    #[test]
    fn search_url_copies_values_verbatim() {
        let client = WallhavenClient::new(SearchQuery {
            categories: "010".to_string(),
            purity: "110".to_string(),
            atleast: "3840x2160".to_string(),
            sorting: "toplist".to_string(),
            order: "asc".to_string(),
        })
        .unwrap();

        assert_eq!(
            client.search_url(),
            "https://wallhaven.cc/search?categories=010&purity=110&atleast=3840x2160&sorting=toplist&order=asc"
        );
    }

    // --- extract_listing ---

    #[test]
    fn listing_preserves_document_order() {
        let doc = Html::parse_document(
            r#"<html><body>
                <figure><a class="preview" href="https://wallhaven.cc/w/aaa111"></a></figure>
                <a href="https://wallhaven.cc/tag/42">not a preview</a>
                <figure><a class="preview" href="https://wallhaven.cc/w/bbb222"></a></figure>
            </body></html>"#,
        );

        assert_eq!(
            extract_listing(&doc),
            vec![
                "https://wallhaven.cc/w/aaa111".to_string(),
                "https://wallhaven.cc/w/bbb222".to_string(),
            ]
        );
    }

    #[test]
    fn listing_empty_when_no_previews() {
        let doc = Html::parse_document("<html><body><p>nothing here</p></body></html>");
        assert!(extract_listing(&doc).is_empty());
    }

    // --- extract_detail ---

    #[test]
    fn detail_prefixes_protocol_relative_src() {
        let doc = Html::parse_document(
            r#"<img id="wallpaper" src="//wallpapers.wallhaven.cc/wallpapers/full/wallhaven-abc.jpg" alt="Misty Mountains">"#,
        );

        let detail = extract_detail(&doc).unwrap();
        assert_eq!(
            detail.url,
            "https://wallpapers.wallhaven.cc/wallpapers/full/wallhaven-abc.jpg"
        );
        assert_eq!(detail.alt, "Misty Mountains");
    }

    #[test]
    fn detail_keeps_absolute_src() {
        let doc = Html::parse_document(
            r#"<img id="wallpaper" src="https://w.wallhaven.cc/full/wg/wg-abc.jpg" alt="x">"#,
        );

        let detail = extract_detail(&doc).unwrap();
        assert_eq!(detail.url, "https://w.wallhaven.cc/full/wg/wg-abc.jpg");
    }

    #[test]
    fn detail_missing_alt_becomes_empty_string() {
        let doc = Html::parse_document(r#"<img id="wallpaper" src="//host/full/a.jpg">"#);
        assert_eq!(extract_detail(&doc).unwrap().alt, "");
    }

    #[test]
    fn detail_none_without_wallpaper_element() {
        let doc = Html::parse_document(r#"<img id="banner" src="//host/banner.jpg">"#);
        assert!(extract_detail(&doc).is_none());
    }

    #[test]
    fn detail_none_without_src() {
        let doc = Html::parse_document(r#"<img id="wallpaper" alt="broken">"#);
        assert!(extract_detail(&doc).is_none());
    }

    // --- thumbnail_url ---

    #[test]
    fn thumbnail_shards_by_first_two_chars() {
        assert_eq!(
            thumbnail_url("https://wallpapers.wallhaven.cc/wallpapers/full/wg-abc123").as_deref(),
            Some("https://th.wallhaven.cc/small/wg/wg-abc123.jpg")
        );
    }

    #[test]
    fn thumbnail_none_for_short_basename() {
        assert_eq!(thumbnail_url("https://wallhaven.cc/w/x"), None);
        assert_eq!(thumbnail_url("https://wallhaven.cc/w/"), None);
    }

    // --- download ---

    /// 起一个只服务一次请求的本地 HTTP 端点，返回指向它的 URL
    async fn serve_once(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await; // 读掉请求头
            socket.write_all(&response).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}/img.jpg", addr)
    }

    #[tokio::test]
    async fn download_writes_full_body() {
        let body = vec![0xABu8; 4096];
        let mut response = format!(
            "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(&body);
        let url = serve_once(response).await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("wallpaper.jpg");
        let client = WallhavenClient::new(default_query()).unwrap();

        client.download(&url, &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), body);
        assert!(!dest.with_extension("part").exists());
    }

    #[tokio::test]
    async fn download_error_status_leaves_no_file() {
        let response =
            b"HTTP/1.1 404 Not Found\r\ncontent-length: 9\r\nconnection: close\r\n\r\nnot found"
                .to_vec();
        let url = serve_once(response).await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("wallpaper.jpg");
        let client = WallhavenClient::new(default_query()).unwrap();

        match client.download(&url, &dest).await.unwrap_err() {
            FetchError::Download { status, .. } => assert_eq!(status, 404),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }

    #[tokio::test]
    async fn download_aborted_body_cleans_up_temp_file() {
        // 宣告的长度比实际发送的多，传输中断后不应留下任何文件
        let mut response =
            b"HTTP/1.1 200 OK\r\ncontent-length: 8192\r\nconnection: close\r\n\r\n".to_vec();
        response.extend_from_slice(&[0u8; 1024]);
        let url = serve_once(response).await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("wallpaper.jpg");
        let client = WallhavenClient::new(default_query()).unwrap();

        let err = client.download(&url, &dest).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }

    #[tokio::test]
    async fn failed_download_keeps_existing_dest_intact() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("wallpaper.jpg");
        std::fs::write(&dest, "current wallpaper").unwrap();
        let client = WallhavenClient::new(default_query()).unwrap();

        // 非 2xx：已有的目标文件原样保留
        let url = serve_once(
            b"HTTP/1.1 404 Not Found\r\ncontent-length: 9\r\nconnection: close\r\n\r\nnot found"
                .to_vec(),
        )
        .await;
        client.download(&url, &dest).await.unwrap_err();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "current wallpaper");

        // 传输中断：目标文件同样不动，临时文件也被清走
        let mut response =
            b"HTTP/1.1 200 OK\r\ncontent-length: 8192\r\nconnection: close\r\n\r\n".to_vec();
        response.extend_from_slice(&[0u8; 1024]);
        let url = serve_once(response).await;
        client.download(&url, &dest).await.unwrap_err();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "current wallpaper");
        assert!(!dest.with_extension("part").exists());
    }
}
