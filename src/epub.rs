pub mod chapter;
pub mod image;
pub mod metadata;
pub mod package;
pub mod snapshot;

pub use chapter::{Chapter, Episode};
pub use image::Image;
pub use metadata::Metadata;
pub use package::{PackageReader, PackageWriter};
pub use snapshot::{Snapshot, SnapshotEpisode, SnapshotImage};

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Local};
use tokio::fs;
use tracing::{info, instrument};

static CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
    <rootfiles>
        <rootfile full-path="src/content.opf" media-type="application/oebps-package+xml"/>
    </rootfiles>
</container>"#;

static STYLE_CSS: &str = r#"html {
    writing-mode: vertical-rl;
    -epub-writing-mode: vertical-rl;
}

body {
    font-family: serif;
    line-height: 1.75;
}

p {
    margin: 0;
}

.tcy {
    text-combine-upright: all;
    -webkit-text-combine: horizontal;
}

img {
    max-width: 100%;
    max-height: 100%;
}
"#;

static TEXT_CONTENT_1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
    <meta charset="UTF-8"/>
    <title>"#;

static TEXT_CONTENT_2: &str = r#"</title>
    <link rel="stylesheet" type="text/css" href="../style.css"/>
</head>
<body>
    <h1>"#;

static TEXT_CONTENT_3: &str = r#"</h1>
"#;

static TEXT_CONTENT_4: &str = r#"</body>
</html>"#;

/// 渲染一话的正文页面，段落已是转义过的 HTML 片段
pub fn episode_xhtml(title: &str, paragraphs: &[String]) -> String {
    let mut xhtml = String::new();
    xhtml.push_str(TEXT_CONTENT_1);
    xhtml.push_str(title);
    xhtml.push_str(TEXT_CONTENT_2);
    xhtml.push_str(title);
    xhtml.push_str(TEXT_CONTENT_3);
    for paragraph in paragraphs {
        xhtml.push_str(&format!("    <p>{}</p>\n", paragraph));
    }
    xhtml.push_str(TEXT_CONTENT_4);
    xhtml
}

/// 组装好的一本书，generate 负责落盘。
/// 本次新抓的内容现场渲染，其余从旧包里按字节原样搬运
pub struct Epub {
    pub novel_id: String,
    pub title: String,
    pub author: String,
    pub timestamp: DateTime<Local>,
    pub chapters: Vec<Chapter>,
    /// 本次新抓的图
    pub images: Vec<Image>,
    /// 沿用旧包的图
    pub carried_images: Vec<SnapshotImage>,
    pub snapshot: Snapshot,
    pub output: PathBuf,
}

impl Epub {
    #[instrument(skip_all)]
    pub async fn generate(&self) -> Result<()> {
        info!("正在生成EPUB文件: {}", self.title);
        let updating = fs::try_exists(&self.output).await?;
        let tmp_path = self.tmp_path();
        let mut writer = PackageWriter::create(&tmp_path).await?;

        // 本次新抓的图片按内容哈希去重后写入
        let mut image_ids = HashSet::new();
        let mut unique_images = Vec::new();
        for image in &self.images {
            if image_ids.insert(image.id.clone()) {
                unique_images.push(image.descriptor());
                writer
                    .add(&format!("src/image/{}", image.name), &image.data)
                    .await?;
            }
        }

        // 本次新抓的正文
        for episode in self.episodes() {
            if episode.fetched {
                writer
                    .add(
                        &format!("src/text/{}.xhtml", episode.id),
                        episode_xhtml(&episode.title, &episode.paragraphs).as_bytes(),
                    )
                    .await?;
            }
        }

        // 没有更新的部分从旧包里原样搬运
        if updating {
            let old = PackageReader::open(&self.output).await?;
            for image in &self.carried_images {
                if image_ids.insert(image.id.clone()) {
                    unique_images.push(image.clone());
                    let name = format!("src/image/{}", image.name);
                    let data = old.read(&name).await?;
                    writer.add(&name, &data).await?;
                }
            }
            for episode in self.episodes() {
                if !episode.fetched {
                    let name = format!("src/text/{}.xhtml", episode.id);
                    let data = old.read(&name).await?;
                    writer.add(&name, &data).await?;
                }
            }
        }

        writer
            .add("META-INF/container.xml", CONTAINER_XML.as_bytes())
            .await?;
        writer.add("src/style.css", STYLE_CSS.as_bytes()).await?;
        writer
            .add(
                "src/content.opf",
                Metadata::content_opf(self, &unique_images).as_bytes(),
            )
            .await?;
        writer
            .add("src/navigation.xhtml", Metadata::navigation(self).as_bytes())
            .await?;
        writer
            .add(
                "src/metadata.json",
                serde_json::to_string(&self.snapshot)?.as_bytes(),
            )
            .await?;
        writer.finish().await?;

        // 全部写完才顶替目标文件，中途失败不会破坏旧包
        fs::rename(&tmp_path, &self.output).await?;
        if updating {
            info!("已更新 {}", self.output.display());
        } else {
            info!("已生成 {}", self.output.display());
        }
        Ok(())
    }

    /// 按章节顺序展开的全部话
    pub fn episodes(&self) -> impl Iterator<Item = &Episode> {
        self.chapters.iter().flat_map(|chapter| chapter.episodes.iter())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .output
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.output.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("narou_fetch_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    fn sample_epub(output: PathBuf) -> Epub {
        let mut snapshot = Snapshot::new("n1234ab".to_string(), false, true, false);
        snapshot.episodes.insert(
            "1".to_string(),
            SnapshotEpisode {
                id: "1".to_string(),
                title: "第1話".to_string(),
                created_at: "2021-06-20T21:08:00".to_string(),
                updated_at: "2021-06-20T21:08:00".to_string(),
                images: Vec::new(),
            },
        );
        snapshot.episodes.insert(
            "2".to_string(),
            SnapshotEpisode {
                id: "2".to_string(),
                title: "第2話".to_string(),
                created_at: "2021-07-01T12:00:00".to_string(),
                updated_at: "2021-07-01T12:00:00".to_string(),
                images: vec![SnapshotImage {
                    id: "f".repeat(64),
                    name: format!("{}.png", "f".repeat(16)),
                    media_type: "image/png".to_string(),
                }],
            },
        );
        Epub {
            novel_id: "n1234ab".to_string(),
            title: "タイトル".to_string(),
            author: "作者名".to_string(),
            timestamp: Local::now(),
            chapters: vec![
                Chapter {
                    name: "default".to_string(),
                    episodes: vec![Episode {
                        id: "1".to_string(),
                        title: "第1話".to_string(),
                        paragraphs: vec!["　段落1".to_string()],
                        created_at: "2021-06-20T21:08:00".to_string(),
                        updated_at: "2021-06-20T21:08:00".to_string(),
                        fetched: true,
                    }],
                },
                Chapter {
                    name: "第一章".to_string(),
                    episodes: vec![Episode {
                        id: "2".to_string(),
                        title: "第2話".to_string(),
                        paragraphs: vec!["「段落2」".to_string()],
                        created_at: "2021-07-01T12:00:00".to_string(),
                        updated_at: "2021-07-01T12:00:00".to_string(),
                        fetched: true,
                    }],
                },
            ],
            images: vec![Image {
                id: "f".repeat(64),
                name: format!("{}.png", "f".repeat(16)),
                media_type: "image/png".to_string(),
                data: Bytes::from_static(b"PNGDATA"),
            }],
            carried_images: Vec::new(),
            snapshot,
            output,
        }
    }

    #[test]
    fn test_episode_xhtml() {
        let xhtml = episode_xhtml(
            "第1話",
            &["　段落1".to_string(), "<br />".to_string()],
        );
        assert!(xhtml.contains("<title>第1話</title>"));
        assert!(xhtml.contains("<h1>第1話</h1>"));
        assert!(xhtml.contains("    <p>　段落1</p>\n    <p><br /></p>\n"));
    }

    #[test]
    fn test_content_opf() {
        let epub = sample_epub(PathBuf::from("unused.epub"));
        let images = [SnapshotImage {
            id: "f".repeat(64),
            name: "image1.png".to_string(),
            media_type: "image/png".to_string(),
        }];
        let opf = Metadata::content_opf(&epub, &images);
        assert!(opf.contains("<dc:identifier id=\"book-id\">n1234ab</dc:identifier>"));
        assert!(opf.contains("<dc:title>タイトル</dc:title>"));
        assert!(opf.contains("<dc:creator>作者名</dc:creator>"));
        assert!(opf.contains(
            "<item id=\"episode-1\" href=\"text/1.xhtml\" media-type=\"application/xhtml+xml\"/>"
        ));
        assert!(opf.contains(
            "<item id=\"image-image1.png\" href=\"image/image1.png\" media-type=\"image/png\"/>"
        ));
        assert!(opf.contains("page-progression-direction=\"rtl\""));
        assert!(opf.contains("<itemref idref=\"episode-1\"/>"));
        assert!(opf.contains("<itemref idref=\"episode-2\"/>"));
    }

    #[test]
    fn test_navigation() {
        let epub = sample_epub(PathBuf::from("unused.epub"));
        let nav = Metadata::navigation(&epub);
        // 默认章的话平铺，命名章有自己的小节
        assert!(nav.contains("<li><a href=\"text/1.xhtml\">第1話</a></li>"));
        assert!(nav.contains("<span>第一章</span>"));
        assert!(nav.contains("<li><a href=\"text/2.xhtml\">第2話</a></li>"));
    }

    #[test]
    fn test_navigation_skips_empty_chapters() {
        let mut epub = sample_epub(PathBuf::from("unused.epub"));
        epub.chapters.push(Chapter::new("空の章".to_string()));
        let nav = Metadata::navigation(&epub);
        assert!(!nav.contains("空の章"));
    }

    #[tokio::test]
    async fn test_generate_and_read_back() {
        let output = test_dir("generate.epub");
        let _ = std::fs::remove_file(&output);
        let epub = sample_epub(output.clone());
        epub.generate().await.unwrap();

        let reader = PackageReader::open(&output).await.unwrap();
        assert_eq!(
            b"application/epub+zip".to_vec(),
            reader.read("mimetype").await.unwrap()
        );
        let raw = reader.read("src/metadata.json").await.unwrap();
        let snapshot: Snapshot = serde_json::from_slice(&raw).unwrap();
        assert_eq!(epub.snapshot, snapshot);
        assert_eq!(
            episode_xhtml("第1話", &["　段落1".to_string()]).into_bytes(),
            reader.read("src/text/1.xhtml").await.unwrap()
        );
        assert_eq!(
            b"PNGDATA".to_vec(),
            reader
                .read(&format!("src/image/{}.png", "f".repeat(16)))
                .await
                .unwrap()
        );
        std::fs::remove_file(&output).unwrap();
    }

    #[tokio::test]
    async fn test_generate_update_carries_old_bytes() {
        let output = test_dir("update.epub");
        let _ = std::fs::remove_file(&output);
        let first = sample_epub(output.clone());
        first.generate().await.unwrap();

        // 第二次运行：第1话沿用，第2话重新抓取，图片从旧包搬运
        let mut second = sample_epub(output.clone());
        second.chapters[0].episodes[0].fetched = false;
        second.chapters[1].episodes[0].paragraphs = vec!["改稿後".to_string()];
        second.images = Vec::new();
        second.carried_images = vec![SnapshotImage {
            id: "f".repeat(64),
            name: format!("{}.png", "f".repeat(16)),
            media_type: "image/png".to_string(),
        }];
        second.generate().await.unwrap();

        let reader = PackageReader::open(&output).await.unwrap();
        // 沿用的话逐字节等于上次生成的内容
        assert_eq!(
            episode_xhtml("第1話", &["　段落1".to_string()]).into_bytes(),
            reader.read("src/text/1.xhtml").await.unwrap()
        );
        assert_eq!(
            episode_xhtml("第2話", &["改稿後".to_string()]).into_bytes(),
            reader.read("src/text/2.xhtml").await.unwrap()
        );
        assert_eq!(
            b"PNGDATA".to_vec(),
            reader
                .read(&format!("src/image/{}.png", "f".repeat(16)))
                .await
                .unwrap()
        );
        std::fs::remove_file(&output).unwrap();
    }
}
