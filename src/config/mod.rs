pub mod cli;

use crate::core::ConfigProvider;
use crate::utils::validation::Validate;
use clap::Parser;
use std::fmt;

#[derive(Clone, Parser)]
#[command(name = "region-etl")]
#[command(about = "Fetches the Korean standard region code registry into a JSON snapshot")]
pub struct CliConfig {
    #[arg(
        long,
        default_value = "http://apis.data.go.kr/1741000/StanReginCd/getStanReginCdList"
    )]
    pub base_url: String,

    /// data.go.kr 核發的服務金鑰
    #[arg(long, env = "REGION_SERVICE_KEY", hide_env_values = true)]
    pub service_key: String,

    #[arg(long, default_value = "1000")]
    pub page_size: usize,

    #[arg(long, default_value = "assets/data")]
    pub output_path: String,

    #[arg(long, default_value = "30")]
    pub timeout_seconds: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn service_key(&self) -> &str {
        &self.service_key
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> crate::utils::error::Result<()> {
        use crate::utils::validation::*;

        // 驗證API端點
        validate_url("base_url", &self.base_url)?;

        // 驗證服務金鑰
        validate_non_empty_string("service_key", &self.service_key)?;

        // 驗證每頁筆數
        validate_positive_number("page_size", self.page_size, 1)?;

        // 驗證輸出路徑
        validate_path("output_path", &self.output_path)?;

        // 驗證逾時秒數
        validate_positive_number("timeout_seconds", self.timeout_seconds as usize, 1)?;

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }
}

// 服務金鑰不得出現在任何日誌輸出
impl fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliConfig")
            .field("base_url", &self.base_url)
            .field("service_key", &"***")
            .field("page_size", &self.page_size)
            .field("output_path", &self.output_path)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("verbose", &self.verbose)
            .finish()
    }
}
