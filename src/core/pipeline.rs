use crate::core::parser;
use crate::core::{ConfigProvider, Pipeline, Record, Storage, TransformResult};
use crate::utils::error::Result;
use chrono::Local;
use reqwest::Client;
use std::time::Duration;

pub struct RegionPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> RegionPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for RegionPipeline<S, C> {
    /// 逐頁抓取，直到伺服器回報的 totalCount 收齊為止
    async fn extract(&self) -> Result<Vec<Record>> {
        let mut accumulated: Vec<Record> = Vec::new();
        let mut page: u32 = 1;

        loop {
            tracing::info!("📡 Requesting page {}", page);

            let response = self
                .client
                .get(self.config.base_url())
                .query(&[("ServiceKey", self.config.service_key())])
                .query(&[("pageNo", page)])
                .query(&[("numOfRows", self.config.page_size())])
                .query(&[("flag", "Y")])
                .timeout(Duration::from_secs(self.config.timeout_seconds()))
                .send()
                .await?;

            tracing::info!("📨 Response status: {}", response.status());

            // 非 2xx 一律視為致命錯誤，整次執行作廢
            let body = response.error_for_status()?.text().await?;
            tracing::debug!("Response preview: {}...", preview(&body, 200));

            let page_data = parser::parse_region_page(&body)?;
            if page_data.records.is_empty() {
                tracing::info!("No rows on page {}, collection finished", page);
                break;
            }
            accumulated.extend(page_data.records);

            // totalCount 缺漏時以累計筆數代替，等同於在本頁結束
            let total = page_data.total_count.unwrap_or(accumulated.len());
            tracing::info!(
                "📊 Page {} collected, {}/{} records",
                page,
                accumulated.len(),
                total
            );

            if accumulated.len() >= total {
                break;
            }
            page += 1;
        }

        Ok(accumulated)
    }

    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult> {
        tracing::info!("🔧 Serializing {} records", data.len());

        // 保留非 ASCII 字元原樣輸出，縮排固定兩格
        let json_output = serde_json::to_string_pretty(&data)?;

        Ok(TransformResult {
            records: data,
            json_output,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let current_date = Local::now().format("%Y%m%d");
        let file_name = format!("region_{}.json", current_date);

        self.storage
            .write_file(&file_name, result.json_output.as_bytes())
            .await?;

        let output_path = format!("{}/{}", self.config.output_path(), file_name);
        tracing::info!("💾 Snapshot saved: {}", output_path);
        Ok(output_path)
    }
}

/// First `limit` characters of a response body, for log lines.
fn preview(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::FetchError;
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        base_url: String,
        service_key: String,
        page_size: usize,
        output_path: String,
        timeout_seconds: u64,
    }

    impl MockConfig {
        fn new(base_url: String) -> Self {
            Self {
                base_url,
                service_key: "test-key".to_string(),
                page_size: 2,
                output_path: "test_output".to_string(),
                timeout_seconds: 5,
            }
        }
    }

    impl ConfigProvider for MockConfig {
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

    fn page_body(start: usize, count: usize, total_count: Option<usize>) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><StanReginCd><head>");
        if let Some(total) = total_count {
            xml.push_str(&format!("<totalCount>{}</totalCount>", total));
        }
        xml.push_str("</head>");
        for i in start..start + count {
            xml.push_str(&format!(
                "<row><region_cd>{}</region_cd><locatadd_nm>지역{}</locatadd_nm></row>",
                i, i
            ));
        }
        xml.push_str("</StanReginCd>");
        xml
    }

    #[tokio::test]
    async fn test_extract_single_page_when_total_matches() {
        let server = MockServer::start();

        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/region")
                .query_param("ServiceKey", "test-key")
                .query_param("pageNo", "1")
                .query_param("numOfRows", "2")
                .query_param("flag", "Y");
            then.status(200)
                .header("Content-Type", "application/xml")
                .body(page_body(1, 2, Some(2)));
        });

        let storage = MockStorage::new();
        let config = MockConfig::new(server.url("/region"));
        let pipeline = RegionPipeline::new(storage, config);

        let records = pipeline.extract().await.unwrap();

        api_mock.assert();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].data.get("region_cd").unwrap().as_str().unwrap(),
            "1"
        );
    }

    #[tokio::test]
    async fn test_extract_walks_pages_until_total_reached() {
        let server = MockServer::start();

        let page1 = server.mock(|when, then| {
            when.method(GET).path("/region").query_param("pageNo", "1");
            then.status(200).body(page_body(1, 2, Some(5)));
        });
        let page2 = server.mock(|when, then| {
            when.method(GET).path("/region").query_param("pageNo", "2");
            then.status(200).body(page_body(3, 2, Some(5)));
        });
        let page3 = server.mock(|when, then| {
            when.method(GET).path("/region").query_param("pageNo", "3");
            then.status(200).body(page_body(5, 1, Some(5)));
        });

        let storage = MockStorage::new();
        let config = MockConfig::new(server.url("/region"));
        let pipeline = RegionPipeline::new(storage, config);

        let records = pipeline.extract().await.unwrap();

        page1.assert();
        page2.assert();
        page3.assert();
        assert_eq!(records.len(), 5);
        // record order follows page arrival order
        let codes: Vec<&str> = records
            .iter()
            .map(|r| r.data.get("region_cd").unwrap().as_str().unwrap())
            .collect();
        assert_eq!(codes, vec!["1", "2", "3", "4", "5"]);
    }

    #[tokio::test]
    async fn test_extract_stops_on_empty_page() {
        let server = MockServer::start();

        let page1 = server.mock(|when, then| {
            when.method(GET).path("/region").query_param("pageNo", "1");
            then.status(200).body(page_body(1, 2, Some(100)));
        });
        // totalCount still claims more, but the page carries no rows
        let page2 = server.mock(|when, then| {
            when.method(GET).path("/region").query_param("pageNo", "2");
            then.status(200).body(page_body(1, 0, Some(100)));
        });
        let page3 = server.mock(|when, then| {
            when.method(GET).path("/region").query_param("pageNo", "3");
            then.status(200).body(page_body(1, 0, Some(100)));
        });

        let storage = MockStorage::new();
        let config = MockConfig::new(server.url("/region"));
        let pipeline = RegionPipeline::new(storage, config);

        let records = pipeline.extract().await.unwrap();

        page1.assert();
        page2.assert();
        page3.assert_hits(0);
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_extract_stops_when_total_count_missing() {
        let server = MockServer::start();

        let page1 = server.mock(|when, then| {
            when.method(GET).path("/region").query_param("pageNo", "1");
            then.status(200).body(page_body(1, 2, None));
        });
        let page2 = server.mock(|when, then| {
            when.method(GET).path("/region").query_param("pageNo", "2");
            then.status(200).body(page_body(3, 2, None));
        });

        let storage = MockStorage::new();
        let config = MockConfig::new(server.url("/region"));
        let pipeline = RegionPipeline::new(storage, config);

        let records = pipeline.extract().await.unwrap();

        page1.assert();
        page2.assert_hits(0);
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_extract_http_error_is_fatal() {
        let server = MockServer::start();

        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/region");
            then.status(500);
        });

        let storage = MockStorage::new();
        let config = MockConfig::new(server.url("/region"));
        let pipeline = RegionPipeline::new(storage, config);

        let err = pipeline.extract().await.unwrap_err();

        api_mock.assert();
        assert!(matches!(err, FetchError::ApiError(_)));
    }

    #[tokio::test]
    async fn test_extract_garbage_body_is_fatal() {
        let server = MockServer::start();

        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/region");
            then.status(200).body("<html>maintenance page");
        });

        let storage = MockStorage::new();
        let config = MockConfig::new(server.url("/region"));
        let pipeline = RegionPipeline::new(storage, config);

        let err = pipeline.extract().await.unwrap_err();

        api_mock.assert();
        assert!(matches!(err, FetchError::XmlError(_)));
    }

    #[tokio::test]
    async fn test_transform_renders_pretty_json() {
        let storage = MockStorage::new();
        let config = MockConfig::new("http://test.com".to_string());
        let pipeline = RegionPipeline::new(storage, config);

        let mut data = HashMap::new();
        data.insert(
            "locatadd_nm".to_string(),
            serde_json::Value::String("서울특별시".to_string()),
        );
        data.insert("locat_rm".to_string(), serde_json::Value::Null);
        let input = vec![Record { data }];

        let result = pipeline.transform(input.clone()).await.unwrap();

        assert_eq!(result.records.len(), 1);
        // two-space indent, no \u escapes
        assert!(result.json_output.starts_with("[\n  {"));
        assert!(result.json_output.contains("서울특별시"));

        let parsed: Vec<Record> = serde_json::from_str(&result.json_output).unwrap();
        assert_eq!(parsed[0].data, input[0].data);
    }

    #[tokio::test]
    async fn test_transform_empty_collection() {
        let storage = MockStorage::new();
        let config = MockConfig::new("http://test.com".to_string());
        let pipeline = RegionPipeline::new(storage, config);

        let result = pipeline.transform(Vec::new()).await.unwrap();

        assert!(result.records.is_empty());
        assert_eq!(result.json_output, "[]");
    }

    #[tokio::test]
    async fn test_load_writes_dated_snapshot() {
        let storage = MockStorage::new();
        let config = MockConfig::new("http://test.com".to_string());
        let pipeline = RegionPipeline::new(storage.clone(), config);

        let result = TransformResult {
            records: Vec::new(),
            json_output: "[]".to_string(),
        };

        let output_path = pipeline.load(result).await.unwrap();

        let expected_name = format!("region_{}.json", Local::now().format("%Y%m%d"));
        assert_eq!(output_path, format!("test_output/{}", expected_name));

        let written = storage.get_file(&expected_name).await;
        assert_eq!(written, Some(b"[]".to_vec()));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("서울특별시", 2), "서울");
        assert_eq!(preview("abc", 200), "abc");
    }
}
