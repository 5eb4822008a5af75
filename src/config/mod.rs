use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Headless browser bring-up and navigation timeouts
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Chrome/Chromium binary; auto-detected when unset.
    #[serde(default)]
    pub executable: Option<PathBuf>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_launch_args")]
    pub launch_args: Vec<String>,

    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    #[serde(default = "default_initial_wait_ms")]
    pub initial_wait_ms: u64,

    /// Extra full-page-load attempts for the start URL.
    #[serde(default = "default_load_retries")]
    pub load_retries: usize,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// CSS selectors for the listing feed markup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectorConfig {
    #[serde(default = "default_listing_selector")]
    pub listing: String,
    #[serde(default = "default_link_selector")]
    pub link: String,
    #[serde(default = "default_freshness_selector")]
    pub freshness: String,
    #[serde(default = "default_location_selector")]
    pub location: String,
    #[serde(default = "default_duplicate_count_selector")]
    pub duplicate_count: String,
    #[serde(default = "default_page_link_selector")]
    pub page_link: String,
    #[serde(default = "default_paging_button_selector")]
    pub paging_button: String,
    #[serde(default = "default_button_icon_selector")]
    pub button_icon: String,
    #[serde(default)]
    pub next_control: NextControlConfig,
}

/// Icon-class fragments that identify the forward paging button.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NextControlConfig {
    #[serde(default = "default_forward_markers")]
    pub forward_markers: Vec<String>,
    #[serde(default = "default_disabled_markers")]
    pub disabled_markers: Vec<String>,
}

/// Acceptance rules for a single listing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    #[serde(default = "default_districts")]
    pub districts: Vec<String>,

    #[serde(default = "default_duplicate_ceiling")]
    pub duplicate_ceiling: u32,

    #[serde(default)]
    pub markers: FreshnessMarkers,
}

/// Phrases the feed uses to describe how old a listing is.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FreshnessMarkers {
    #[serde(default = "default_today_markers")]
    pub today: Vec<String>,
    #[serde(default = "default_hours_markers")]
    pub hours_ago: Vec<String>,
    #[serde(default = "default_minutes_markers")]
    pub minutes_ago: Vec<String>,
    #[serde(default = "default_yesterday_markers")]
    pub yesterday: Vec<String>,
}

/// Crawl loop configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlConfig {
    #[serde(default = "default_start_url")]
    pub start_url: String,

    #[serde(default = "default_stale_page_limit")]
    pub stale_page_limit: u32,

    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}
fn default_launch_args() -> Vec<String> {
    [
        "--no-sandbox",
        "--disable-setuid-sandbox",
        "--disable-dev-shm-usage",
        "--disable-accelerated-2d-canvas",
        "--no-first-run",
        "--no-zygote",
        "--disable-gpu",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_navigation_timeout_ms() -> u64 {
    60_000
}
fn default_initial_wait_ms() -> u64 {
    30_000
}
fn default_load_retries() -> usize {
    2
}
fn default_retry_delay_ms() -> u64 {
    5_000
}
fn default_listing_selector() -> String {
    "li.ard7gu7".to_string()
}
fn default_link_selector() -> String {
    "a.cqzlgv9".to_string()
}
fn default_freshness_selector() -> String {
    "span.c1u6gyxh.tx5yyjc".to_string()
}
fn default_location_selector() -> String {
    "span.c1u6gyxh.t1u18gyr".to_string()
}
fn default_duplicate_count_selector() -> String {
    "span.c1k1v7xu".to_string()
}
fn default_page_link_selector() -> String {
    "div.Paging_pagingItem__Y3r2u a".to_string()
}
fn default_paging_button_selector() -> String {
    "button.Paging_redirectPageBtn__KvsqJ".to_string()
}
fn default_button_icon_selector() -> String {
    "i".to_string()
}
fn default_forward_markers() -> Vec<String> {
    vec!["rightIcon".to_string(), "right".to_string()]
}
fn default_disabled_markers() -> Vec<String> {
    vec!["Disable".to_string(), "disable".to_string()]
}
fn default_districts() -> Vec<String> {
    [
        "cầu giấy",
        "đống đa",
        "ba đình",
        "bắc từ liêm",
        "nam từ liêm",
        "tây hồ",
        "hoàng mai",
        "hai bà trưng",
        "thanh xuân",
        "hà đông",
        "hoàn kiếm",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_duplicate_ceiling() -> u32 {
    3
}
fn default_today_markers() -> Vec<String> {
    vec!["hôm nay".to_string()]
}
fn default_hours_markers() -> Vec<String> {
    vec!["giờ".to_string()]
}
fn default_minutes_markers() -> Vec<String> {
    vec!["phút".to_string()]
}
fn default_yesterday_markers() -> Vec<String> {
    vec!["hôm qua".to_string()]
}
fn default_start_url() -> String {
    "https://www.nhatot.com/thue-phong-tro-ha-noi".to_string()
}
fn default_stale_page_limit() -> u32 {
    15
}
fn default_settle_delay_ms() -> u64 {
    2_000
}
fn default_output_path() -> PathBuf {
    PathBuf::from("data/listings.csv")
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            user_agent: default_user_agent(),
            launch_args: default_launch_args(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            initial_wait_ms: default_initial_wait_ms(),
            load_retries: default_load_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing: default_listing_selector(),
            link: default_link_selector(),
            freshness: default_freshness_selector(),
            location: default_location_selector(),
            duplicate_count: default_duplicate_count_selector(),
            page_link: default_page_link_selector(),
            paging_button: default_paging_button_selector(),
            button_icon: default_button_icon_selector(),
            next_control: NextControlConfig::default(),
        }
    }
}

impl Default for NextControlConfig {
    fn default() -> Self {
        Self {
            forward_markers: default_forward_markers(),
            disabled_markers: default_disabled_markers(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            districts: default_districts(),
            duplicate_ceiling: default_duplicate_ceiling(),
            markers: FreshnessMarkers::default(),
        }
    }
}

impl Default for FreshnessMarkers {
    fn default() -> Self {
        Self {
            today: default_today_markers(),
            hours_ago: default_hours_markers(),
            minutes_ago: default_minutes_markers(),
            yesterday: default_yesterday_markers(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_url: default_start_url(),
            stale_page_limit: default_stale_page_limit(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
        }
    }
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn initial_wait(&self) -> Duration {
        Duration::from_millis(self.initial_wait_ms)
    }
}

impl CrawlConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::Environment::with_prefix("CRAWLER")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("filter.districts"),
            )
            .build()
            .context("Failed to assemble configuration sources")?;

        cfg.try_deserialize()
            .context("Invalid crawler configuration")
    }
}
