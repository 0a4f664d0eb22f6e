use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 门户 ---
    pub login_url: String,
    pub upload_url: String,
    /// 订单列表页（物流导出）
    pub orders_page_url: String,
    pub login_username: String,
    pub login_password: String,
    /// 登录成功后页面上出现的欢迎语
    pub welcome_marker: String,
    /// 页面结构覆盖文件（TOML，可选）
    pub portal_layout_file: Option<PathBuf>,

    // --- 库存导出（HTTP） ---
    pub inventory_login_url: String,
    pub inventory_file_url: String,
    pub inventory_output_file: PathBuf,

    // --- 本地目录 ---
    pub local_orders_dir: PathBuf,
    pub local_processed_dir: PathBuf,
    /// 截图保存目录
    pub screenshot_dir: PathBuf,
    /// 浏览器下载目录
    pub download_dir: PathBuf,
    /// 门户导出的物流文件名
    pub tracking_file_name: String,

    // --- FTP ---
    pub ftp_host: String,
    pub ftp_user: String,
    pub ftp_password: String,
    pub remote_orders_dir: String,
    pub remote_archive_dir: String,
    pub remote_inventory_dir: String,
    pub remote_tracking_dir: String,

    // --- 邮件 ---
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender_email: String,
    pub email_password: String,
    pub receiver_email: String,

    // --- 等待与重试 ---
    pub short_wait_secs: u64,
    pub long_wait_secs: u64,
    pub max_retries: u32,
    pub retry_delay_secs: u64,

    // --- 浏览器 ---
    /// 自定义 Chrome 路径，不设置时由 chromiumoxide 自动查找
    pub chrome_executable: Option<PathBuf>,

    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            login_url: String::new(),
            upload_url: String::new(),
            orders_page_url: String::new(),
            login_username: String::new(),
            login_password: String::new(),
            welcome_marker: "Welcome,".to_string(),
            portal_layout_file: None,
            inventory_login_url: String::new(),
            inventory_file_url: String::new(),
            inventory_output_file: PathBuf::from("shopify.csv"),
            local_orders_dir: PathBuf::from("orders"),
            local_processed_dir: PathBuf::from("orders/processed"),
            screenshot_dir: PathBuf::from("."),
            download_dir: PathBuf::from("downloads"),
            tracking_file_name: "4101_tps_tracking.csv".to_string(),
            ftp_host: String::new(),
            ftp_user: String::new(),
            ftp_password: String::new(),
            remote_orders_dir: "/out/orders".to_string(),
            remote_archive_dir: "/out/orders/archive".to_string(),
            remote_inventory_dir: "/in/inventory".to_string(),
            remote_tracking_dir: "/in/fulfillments".to_string(),
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            sender_email: String::new(),
            email_password: String::new(),
            receiver_email: String::new(),
            short_wait_secs: 5,
            long_wait_secs: 30,
            max_retries: 3,
            retry_delay_secs: 5,
            chrome_executable: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量（以及 .env 文件）加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        // .env 不存在时直接使用进程环境变量
        let _ = dotenvy::dotenv();

        let default = Self::default();
        Ok(Self {
            login_url: env_string("LOGIN_URL", default.login_url),
            upload_url: env_string("UPLOAD_URL", default.upload_url),
            orders_page_url: env_string("ORDERS_PAGE_URL", default.orders_page_url),
            login_username: env_string("LOGIN_USERNAME", default.login_username),
            login_password: env_string("LOGIN_PASSWORD", default.login_password),
            welcome_marker: env_string("WELCOME_MARKER", default.welcome_marker),
            portal_layout_file: std::env::var("PORTAL_LAYOUT_FILE").ok().map(PathBuf::from),
            inventory_login_url: env_string("INVENTORY_LOGIN_URL", default.inventory_login_url),
            inventory_file_url: env_string("INVENTORY_FILE_URL", default.inventory_file_url),
            inventory_output_file: env_path("INVENTORY_OUTPUT_FILE", default.inventory_output_file),
            local_orders_dir: env_path("LOCAL_ORDERS_DIR", default.local_orders_dir),
            local_processed_dir: env_path("LOCAL_PROCESSED_DIR", default.local_processed_dir),
            screenshot_dir: env_path("SCREENSHOT_DIR", default.screenshot_dir),
            download_dir: env_path("DOWNLOAD_DIR", default.download_dir),
            tracking_file_name: env_string("TRACKING_FILE_NAME", default.tracking_file_name),
            ftp_host: env_string("FTP_HOST", default.ftp_host),
            ftp_user: env_string("FTP_USER", default.ftp_user),
            ftp_password: env_string("FTP_PASS", default.ftp_password),
            remote_orders_dir: env_string("REMOTE_ORDERS_DIR", default.remote_orders_dir),
            remote_archive_dir: env_string("REMOTE_ARCHIVE_DIR", default.remote_archive_dir),
            remote_inventory_dir: env_string("REMOTE_INVENTORY_DIR", default.remote_inventory_dir),
            remote_tracking_dir: env_string("REMOTE_TRACKING_DIR", default.remote_tracking_dir),
            smtp_host: env_string("SMTP_HOST", default.smtp_host),
            smtp_port: env_parse("SMTP_PORT", default.smtp_port)?,
            sender_email: env_string("SENDER_EMAIL", default.sender_email),
            email_password: env_string("EMAIL_PASSWORD", default.email_password),
            receiver_email: env_string("RECEIVER_EMAIL", default.receiver_email),
            short_wait_secs: env_parse("SHORT_WAIT_SECS", default.short_wait_secs)?,
            long_wait_secs: env_parse("LONG_WAIT_SECS", default.long_wait_secs)?,
            max_retries: env_parse("MAX_RETRIES", default.max_retries)?,
            retry_delay_secs: env_parse("RETRY_DELAY_SECS", default.retry_delay_secs)?,
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().map(PathBuf::from),
            verbose_logging: env_parse("VERBOSE_LOGGING", default.verbose_logging)?,
        })
    }

    /// 检查必需的配置项
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("LOGIN_URL", &self.login_url),
            ("UPLOAD_URL", &self.upload_url),
            ("LOGIN_USERNAME", &self.login_username),
            ("LOGIN_PASSWORD", &self.login_password),
        ];

        for (var_name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing {
                    var_name: var_name.to_string(),
                });
            }
        }

        if self.max_retries == 0 {
            return Err(ConfigError::Invalid {
                var_name: "MAX_RETRIES".to_string(),
                value: "0".to_string(),
                expected_type: "正整数".to_string(),
            });
        }

        Ok(())
    }

    pub fn short_wait(&self) -> Duration {
        Duration::from_secs(self.short_wait_secs)
    }

    pub fn long_wait(&self) -> Duration {
        Duration::from_secs(self.long_wait_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// FTP 是否已配置
    pub fn ftp_enabled(&self) -> bool {
        !self.ftp_host.is_empty()
    }

    /// 邮件是否已配置
    pub fn email_enabled(&self) -> bool {
        !self.sender_email.is_empty() && !self.receiver_email.is_empty()
    }

    /// 库存导出是否已配置
    pub fn inventory_enabled(&self) -> bool {
        !self.inventory_login_url.is_empty() && !self.inventory_file_url.is_empty()
    }

    /// 物流导出是否已配置
    pub fn tracking_enabled(&self) -> bool {
        !self.orders_page_url.is_empty()
    }
}

fn env_string(var_name: &str, default: String) -> String {
    std::env::var(var_name).unwrap_or(default)
}

fn env_path(var_name: &str, default: PathBuf) -> PathBuf {
    std::env::var(var_name).map(PathBuf::from).unwrap_or(default)
}

fn env_parse<T: FromStr>(var_name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => parse_value(var_name, &value),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(var_name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var_name: var_name.to_string(),
        value: value.to_string(),
        expected_type: std::any::type_name::<T>().to_string(),
    })
}
