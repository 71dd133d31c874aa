use anyhow::{anyhow, Result};
use scraper::Html;
use serde_json::Value;

use crate::epub::chapter::{Chapter, Episode};
use crate::parser::{escape, walk, DomVisitor, Frame, IndexPage};

/// カクヨム的目录页解析器。目录不是标签结构而是整页内嵌的一块
/// JSON，armed 期间把 script 的文本攒进缓冲，关闭标签时一次性解析
pub struct IndexParser {
    title: String,
    author: String,
    chapters: Vec<Chapter>,
    json_flg: bool,
    buff: String,
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
            chapters,
            json_flg: false,
            buff: String::new(),
        }
    }

    pub fn parse(mut self, html: &str) -> Result<IndexPage> {
        let document = Html::parse_document(html);
        walk(&document, &mut self)?;
        Ok(IndexPage {
            title: self.title,
            author: self.author,
            // 目录只有一页
            next_page: None,
            chapters: self.chapters,
        })
    }

    /// 顺着 __NEXT_DATA__ 里的引用表把作品、章、话串起来
    fn apply_state(&mut self, raw: &str) -> Result<()> {
        let data: Value = serde_json::from_str(raw)?;
        let work_id = str_field(&data["query"], "workId")?;
        let state = &data["props"]["pageProps"]["__APOLLO_STATE__"];
        if !state.is_object() {
            anyhow::bail!("__NEXT_DATA__ 中缺少 __APOLLO_STATE__");
        }

        let work = &state[format!("Work:{}", work_id).as_str()];
        self.title = escape(str_field(work, "title")?).trim().to_string();
        let author_ref = str_field(&work["author"], "__ref")?;
        self.author = escape(str_field(&state[author_ref], "activityName")?)
            .trim()
            .to_string();

        let tocs = work["tableOfContents"]
            .as_array()
            .ok_or_else(|| anyhow!("__NEXT_DATA__ 中缺少 tableOfContents"))?;
        for toc in tocs {
            let toc_chapter = &state[str_field(toc, "__ref")?];
            // chapter 为 null 的裸包装不开新章，话留在当前章里
            if let Some(chapter_ref) = toc_chapter["chapter"]["__ref"].as_str() {
                let name = str_field(&state[chapter_ref], "title")?;
                self.chapters
                    .push(Chapter::new(escape(name).trim().to_string()));
            }
            let episode_refs = toc_chapter["episodeUnions"]
                .as_array()
                .ok_or_else(|| anyhow!("__NEXT_DATA__ 中缺少 episodeUnions"))?;
            for episode_ref in episode_refs {
                let episode = &state[str_field(episode_ref, "__ref")?];
                let id = escape(str_field(episode, "id")?).trim().to_string();
                let published = escape(str_field(episode, "publishedAt")?).trim().to_string();
                if let Some(chapter) = self.chapters.last_mut() {
                    chapter.episodes.push(Episode {
                        id,
                        created_at: published.clone(),
                        updated_at: published,
                        ..Default::default()
                    });
                }
            }
        }
        Ok(())
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Result<&'a str> {
    value[key]
        .as_str()
        .ok_or_else(|| anyhow!("__NEXT_DATA__ 中缺少字段: {}", key))
}

impl DomVisitor for IndexParser {
    fn start(&mut self, stack: &[Frame]) -> Result<()> {
        let Some(frame) = stack.last() else {
            return Ok(());
        };
        if frame.tag == "script" && frame.id.as_deref() == Some("__NEXT_DATA__") {
            self.json_flg = true;
        }
        Ok(())
    }

    fn end(&mut self, stack: &[Frame]) -> Result<()> {
        let Some(frame) = stack.last() else {
            return Ok(());
        };
        if frame.tag == "script" && self.json_flg {
            let buff = std::mem::take(&mut self.buff);
            self.apply_state(&buff)?;
            self.json_flg = false;
        }
        Ok(())
    }

    fn data(&mut self, _stack: &[Frame], text: &str) -> Result<()> {
        if self.json_flg {
            self.buff.push_str(text);
        }
        Ok(())
    }
}
