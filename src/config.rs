// config.rs — 配置管理模块
// 遵循 Unix 风格：优先从 ~/.config/randwall/config.toml 读取配置

use schemars::JsonSchema; // 引入用于生成 JSON Schema 的 trait
use serde::{Deserialize, Serialize}; // 引入序列化与反序列化 trait
use shellexpand::tilde; // 用于展开 ~ 和环境变量
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// 展开路径中的 ~ 和环境变量 ($HOME, $XDG_CONFIG_HOME 等)
fn expand_path(path_str: &str) -> PathBuf {
    let expanded = tilde(path_str).into_owned();
    PathBuf::from(expanded)
}

/// 校验 categories / purity 这类三位开关位字符串
/// 每一位独立表示开或关，只允许 0 和 1
pub fn is_filter_mask(value: &str) -> bool {
    value.len() == 3 && value.bytes().all(|b| b == b'0' || b == b'1')
}

/// 映射 config.toml 文件内容的嵌套结构体
#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct ConfigFile {
    #[serde(default)]
    common: CommonConfig,
}

#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct CommonConfig {
    /// 图片根目录 (支持 ~、$HOME 等环境变量，相对路径则相对于 $HOME)
    /// 不配置则默认为 ~/Pictures
    picture_dir: Option<String>,
    /// 默认搜索参数
    #[serde(default)]
    search: SearchDefaults,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SearchDefaults {
    /// 分类开关 (General/Anime/People)
    #[serde(default = "default_categories")]
    pub categories: String,
    /// 纯净度开关 (SFW/Sketchy/NSFW)
    #[serde(default = "default_purity")]
    pub purity: String,
    /// 最低分辨率
    #[serde(default = "default_atleast")]
    pub atleast: String,
    /// 排序方式
    #[serde(default = "default_sorting")]
    pub sorting: String,
    /// 排序方向
    #[serde(default = "default_order")]
    pub order: String,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            purity: default_purity(),
            atleast: default_atleast(),
            sorting: default_sorting(),
            order: default_order(),
        }
    }
}

fn default_categories() -> String {
    "111".to_string()
}
fn default_purity() -> String {
    "100".to_string()
}
fn default_atleast() -> String {
    "1920x1080".to_string()
}
fn default_sorting() -> String {
    "random".to_string()
}
fn default_order() -> String {
    "desc".to_string()
}

/// 应用全局配置项
pub struct AppConfig {
    /// 图片根目录
    pub picture_dir: PathBuf,
    /// 存档子目录，备份的壁纸按原文件名存放，从不覆盖
    pub archive_dir: PathBuf,
    /// "当前壁纸"工作文件，每次下载都会覆盖
    pub current_path: PathBuf,
    /// 配置文件所在路径
    pub config_path: PathBuf,
    /// 默认搜索参数
    pub search_defaults: SearchDefaults,
}

impl AppConfig {
    /// 初始化配置
    pub fn new() -> Self {
        let home = env::var("HOME").expect("无法获取 $HOME 环境变量");
        let home_path = PathBuf::from(&home);
        let config_dir = home_path.join(".config").join("randwall");
        let config_path = config_dir.join("config.toml");

        let config_file = Self::load_config_from_file(&config_path).unwrap_or_default();

        // 图片目录：
        // 1. 配置了路径则展开 ~ 和环境变量，相对路径相对于 $HOME
        // 2. 未配置则默认使用 $HOME/Pictures
        let picture_dir = if let Some(dir_str) = config_file.common.picture_dir {
            let p = expand_path(&dir_str);
            if p.is_absolute() { p } else { home_path.join(p) }
        } else {
            home_path.join("Pictures")
        };

        // 两个固定派生路径：存档子目录和当前壁纸文件
        let archive_dir = picture_dir.join("wallpapers");
        let current_path = picture_dir.join("wallpaper.jpg");

        Self {
            picture_dir,
            archive_dir,
            current_path,
            config_path,
            search_defaults: config_file.common.search,
        }
    }

    /// 辅助函数：解析 TOML 配置文件
    /// 文件缺失或无法解析时返回 None，调用方落回默认配置
    fn load_config_from_file(path: &Path) -> Option<ConfigFile> {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| toml::from_str(&content).ok())
    }

    /// 确保所有必要的目录都存在，重复调用无副作用
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::create_dir_all(&self.picture_dir)?;
        fs::create_dir_all(&self.archive_dir)?;

        Ok(())
    }

    /// 将配置保存回文件
    pub fn save(&self) -> std::io::Result<()> {
        let config_file = ConfigFile {
            common: CommonConfig {
                picture_dir: Some(self.picture_dir.to_string_lossy().to_string()),
                search: SearchDefaults {
                    categories: self.search_defaults.categories.clone(),
                    purity: self.search_defaults.purity.clone(),
                    atleast: self.search_defaults.atleast.clone(),
                    sorting: self.search_defaults.sorting.clone(),
                    order: self.search_defaults.order.clone(),
                },
            },
        };

        let toml_str = toml::to_string_pretty(&config_file)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        fs::write(&self.config_path, toml_str)
    }

    /// 获取配置文件的 JSON Schema
    pub fn get_schema() -> String {
        let schema = schemars::schema_for!(ConfigFile);
        serde_json::to_string_pretty(&schema).unwrap()
    }

    /// 将当前配置转换为 TOML 字符串
    pub fn to_toml(&self) -> String {
        let config_file = ConfigFile {
            common: CommonConfig {
                picture_dir: Some(self.picture_dir.to_string_lossy().to_string()),
                search: SearchDefaults {
                    categories: self.search_defaults.categories.clone(),
                    purity: self.search_defaults.purity.clone(),
                    atleast: self.search_defaults.atleast.clone(),
                    sorting: self.search_defaults.sorting.clone(),
                    order: self.search_defaults.order.clone(),
                },
            },
        };

        let toml_str = toml::to_string_pretty(&config_file)
            .unwrap_or_else(|_| "# Error serializing config".to_string());

        // 在 [common.search] 节前插入开关位说明
        // toml 库不支持带注释序列化，所以手动插入
        toml_str.replace(
            "[common.search]",
            "# categories / purity 为三位 0/1 开关位\n# categories: General/Anime/People; purity: SFW/Sketchy/NSFW\n[common.search]",
        )
    }
}
