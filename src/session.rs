// session.rs — 批次游标模块
// 维护一页搜索结果和其中的游标位置，耗尽时向壁纸源换取新的一页

use crate::error::FetchError;
use crate::source::WallpaperSource;

/// 每次换页最多连续抓取的次数，全部为空则报 EmptyListing
const MAX_REFILL_FETCHES: u32 = 3;

/// 搜索结果里的位置游标
///
/// 持有当前列表和一个零起点位置，位置始终落在 [0, listing.len()] 内。
/// `advance` 返回当前位置的链接但不移动位置；调用方处理成功后再调
/// `commit` 前进一格，这样下载中途失败不会悄悄跳过一张图。
/// 走到列表末尾后，下一次 `advance` 会丢弃旧列表、重新抓取同一个
/// 搜索 URL 并把位置归零。
///
/// 游标本身不引入任何随机性，表面上的随机完全来自远端
/// sorting=random 参数在换页时的新结果。
pub struct ImageCursor {
    listing: Vec<String>,
    position: usize,
}

impl ImageCursor {
    /// 创建空游标，首次 advance 时才真正抓取列表
    pub fn new() -> Self {
        Self {
            listing: Vec::new(),
            position: 0,
        }
    }

    /// 返回游标当前指向的详情页链接，必要时先换页
    ///
    /// 未 commit 时重复调用返回同一个链接。
    pub async fn advance<S>(&mut self, source: &S) -> Result<String, FetchError>
    where
        S: WallpaperSource,
    {
        if self.position >= self.listing.len() {
            self.refill(source).await?;
        }

        Ok(self.listing[self.position].clone())
    }

    /// 把游标前进一格，在当前条目处理成功（或决定跳过）后调用
    pub fn commit(&mut self) {
        self.position += 1;
    }

    /// 整页替换当前列表并把位置归零
    ///
    /// 远端持续返回空列表时不无限重试：最多抓 MAX_REFILL_FETCHES 次，
    /// 全空则把 EmptyListing 交给调用方。
    async fn refill<S>(&mut self, source: &S) -> Result<(), FetchError>
    where
        S: WallpaperSource,
    {
        for _ in 0..MAX_REFILL_FETCHES {
            let listing = source.listing().await?;
            if !listing.is_empty() {
                self.listing = listing;
                self.position = 0;
                return Ok(());
            }
        }

        Err(FetchError::EmptyListing {
            attempts: MAX_REFILL_FETCHES,
        })
    }
}
