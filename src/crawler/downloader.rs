use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::epub::image::Image;

/// 两次网络请求之间的间隔，别给源站添麻烦
static FETCH_INTERVAL: Duration = Duration::from_secs(1);

pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(ua_generator::ua::spoof_ua())
            .build()?;
        Ok(Self { client })
    }

    /// 抓一个页面的 HTML
    pub async fn text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// 抓图片，文件名由内容哈希推导，同图必然同名
    pub async fn image(&self, url: &str) -> Result<Image> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let data = response.bytes().await?;

        let mut hasher = Sha256::new();
        hasher.update(&data);
        let id = format!("{:x}", hasher.finalize());

        let extension = Path::new(url)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("jpg");
        let name = format!("{}.{}", &id[..16], extension);
        Ok(Image {
            id,
            name,
            media_type: media_type(extension).to_string(),
            data,
        })
    }

    /// 相邻两次请求之间的礼貌性停顿
    pub async fn pause(&self) {
        tokio::time::sleep(FETCH_INTERVAL).await;
    }
}

fn media_type(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type() {
        assert_eq!("image/png", media_type("png"));
        assert_eq!("image/jpeg", media_type("jpg"));
        assert_eq!("image/jpeg", media_type("jpeg"));
        assert_eq!("image/gif", media_type("gif"));
        assert_eq!("application/octet-stream", media_type("bin"));
    }
}
