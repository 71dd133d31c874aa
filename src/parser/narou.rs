use std::sync::LazyLock;

use anyhow::Result;
use chrono::NaiveDateTime;
use regex::Regex;
use scraper::Html;

use crate::epub::chapter::{Chapter, Episode};
use crate::parser::{escape, walk, DomVisitor, Frame, IndexPage};

static EPISODE_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/[a-z0-9]+/([1-9][0-9]*)/$").unwrap());
static UPDATED_AT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{4}/[0-9]{2}/[0-9]{2} [0-9]{2}:[0-9]{2}").unwrap());

/// 目录页上的 "2021/06/20 21:08" 转成 ISO-8601
fn parse_datetime(text: &str) -> Option<String> {
    let matched = UPDATED_AT_PATTERN.find(text)?;
    let datetime = NaiveDateTime::parse_from_str(matched.as_str(), "%Y/%m/%d %H:%M").ok()?;
    Some(datetime.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// 小説家になろう的目录页解析器。目录分页，调用方带着已累积的
/// 章节逐页重新喂入，直到没有下一页为止
pub struct IndexParser {
    title: String,
    author: String,
    next_page: Option<String>,
    chapters: Vec<Chapter>,
    current_chapter: String,
}

impl IndexParser {
    pub fn new(seed: Vec<Chapter>) -> Self {
        let chapters = if seed.is_empty() {
            Chapter::initial()
        } else {
            seed
        };
        Self {
            title: String::new(),
            author: String::new(),
            next_page: None,
            chapters,
            current_chapter: String::new(),
        }
    }

    pub fn parse(mut self, html: &str) -> Result<IndexPage> {
        let document = Html::parse_document(html);
        walk(&document, &mut self)?;
        Ok(IndexPage {
            title: self.title,
            author: self.author,
            next_page: self.next_page,
            chapters: self.chapters,
        })
    }

    fn last_episode_mut(&mut self) -> Option<&mut Episode> {
        self.chapters.last_mut()?.episodes.last_mut()
    }
}

impl DomVisitor for IndexParser {
    fn start(&mut self, stack: &[Frame]) -> Result<()> {
        let Some(frame) = stack.last() else {
            return Ok(());
        };
        if frame.has_class("c-pager__item--next") {
            if let Some(href) = frame.attr("href") {
                self.next_page = Some(href.to_string());
            }
        }
        if frame.has_class("p-eplist__subtitle") {
            if let Some(href) = frame.attr("href") {
                // 链接必须是 /{workpart}/{数字}/ 的形式，认不出来就是解析错误
                let Some(captures) = EPISODE_ID_PATTERN.captures(href) else {
                    anyhow::bail!("无法识别 episode_id: {}", href);
                };
                if let Some(chapter) = self.chapters.last_mut() {
                    chapter.episodes.push(Episode::stub(captures[1].to_string()));
                }
            }
        }
        // 改稿时间藏在更新栏 span 的 title 属性里
        if frame.tag == "span" {
            if let Some(title) = frame.attr("title") {
                if title.contains("改稿") {
                    if let Some(timestamp) = parse_datetime(title) {
                        if let Some(episode) = self.last_episode_mut() {
                            episode.updated_at = timestamp;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn end(&mut self, stack: &[Frame]) -> Result<()> {
        let Some(frame) = stack.last() else {
            return Ok(());
        };
        // 章节标题攒到下一个块关闭时生效，成为新的章节边界
        if frame.tag == "div" && !self.current_chapter.is_empty() {
            self.chapters
                .push(Chapter::new(std::mem::take(&mut self.current_chapter)));
        }
        Ok(())
    }

    fn data(&mut self, stack: &[Frame], text: &str) -> Result<()> {
        let Some(frame) = stack.last() else {
            return Ok(());
        };
        if frame.has_class("p-novel__title") {
            self.title.push_str(&escape(text.trim_end()));
        }
        // 作者名在作者栏的子元素里
        if stack.len() >= 2 && stack[stack.len() - 2].has_class("p-novel__author") {
            self.author.push_str(&escape(text.trim_end()));
        }
        if frame.has_class("p-eplist__chapter-title") {
            self.current_chapter.push_str(&escape(text.trim_end()));
        }
        if frame.has_class("p-eplist__update") {
            if let Some(timestamp) = parse_datetime(text) {
                if let Some(episode) = self.last_episode_mut() {
                    episode.created_at = timestamp.clone();
                    if episode.updated_at.is_empty() {
                        episode.updated_at = timestamp;
                    }
                }
            }
        }
        Ok(())
    }
}
