use chrono::Utc;
use tracing::{info, instrument};

use crate::epub::snapshot::SnapshotImage;
use crate::epub::Epub;

pub struct Metadata;

impl Metadata {
    /// 生成content.opf：manifest + spine，竖排书从右往左翻
    #[instrument(skip_all)]
    pub fn content_opf(epub: &Epub, images: &[SnapshotImage]) -> String {
        info!("正在生成content.opf");
        let mut opf = String::new();
        opf.push_str(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="book-id">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
        <dc:identifier id="book-id">"#,
        );
        opf.push_str(&epub.novel_id);
        opf.push_str(
            r#"</dc:identifier>
        <dc:title>"#,
        );
        opf.push_str(&epub.title);
        opf.push_str(
            r#"</dc:title>
        <dc:creator>"#,
        );
        opf.push_str(&epub.author);
        opf.push_str(
            r#"</dc:creator>
        <dc:language>ja</dc:language>
        <meta property="dcterms:modified">"#,
        );
        opf.push_str(
            &epub
                .timestamp
                .with_timezone(&Utc)
                .format("%Y-%m-%dT%H:%M:%SZ")
                .to_string(),
        );
        opf.push_str(
            r#"</meta>
    </metadata>
    <manifest>
        <item id="style" href="style.css" media-type="text/css"/>
        <item id="navigation" href="navigation.xhtml" media-type="application/xhtml+xml" properties="nav"/>"#,
        );
        for episode in epub.episodes() {
            opf.push_str(&format!(
                r#"
        <item id="episode-{}" href="text/{}.xhtml" media-type="application/xhtml+xml"/>"#,
                episode.id, episode.id
            ));
        }
        for image in images {
            opf.push_str(&format!(
                r#"
        <item id="image-{}" href="image/{}" media-type="{}"/>"#,
                image.name, image.name, image.media_type
            ));
        }
        opf.push_str(
            r#"
    </manifest>
    <spine page-progression-direction="rtl">"#,
        );
        for episode in epub.episodes() {
            opf.push_str(&format!(
                r#"
        <itemref idref="episode-{}"/>"#,
                episode.id
            ));
        }
        opf.push_str(
            r#"
    </spine>
</package>"#,
        );
        info!("content.opf生成完成");
        opf
    }

    /// 生成navigation.xhtml：默认章的话平铺在顶层，命名章带子目录
    #[instrument(skip_all)]
    pub fn navigation(epub: &Epub) -> String {
        info!("正在生成navigation.xhtml");
        let mut nav = String::new();
        nav.push_str(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head>
    <title>"#,
        );
        nav.push_str(&epub.title);
        nav.push_str(
            r#"</title>
</head>
<body>
    <nav epub:type="toc">
        <ol>"#,
        );
        for (index, chapter) in epub.chapters.iter().enumerate() {
            if chapter.episodes.is_empty() {
                continue;
            }
            if index == 0 {
                // 未命名的默认章
                Self::navigation_episodes(&mut nav, chapter, "            ");
            } else {
                nav.push_str(&format!(
                    r#"
            <li>
                <span>{}</span>
                <ol>"#,
                    chapter.name
                ));
                Self::navigation_episodes(&mut nav, chapter, "                ");
                nav.push_str(
                    r#"
                </ol>
            </li>"#,
                );
            }
        }
        nav.push_str(
            r#"
        </ol>
    </nav>
</body>
</html>"#,
        );
        info!("navigation.xhtml生成完成");
        nav
    }

    fn navigation_episodes(nav: &mut String, chapter: &crate::epub::Chapter, indent: &str) {
        for episode in &chapter.episodes {
            nav.push_str(&format!(
                "\n{}<li><a href=\"text/{}.xhtml\">{}</a></li>",
                indent, episode.id, episode.title
            ));
        }
    }
}
