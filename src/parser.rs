pub mod kakuyomu;
pub mod narou;

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use scraper::{ElementRef, Html, Node};

use crate::epub::chapter::Chapter;
use crate::site::Site;

/// 一页目录的解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPage {
    pub title: String,
    pub author: String,
    /// 下一页链接的 href，没有下一页时为 None
    pub next_page: Option<String>,
    pub chapters: Vec<Chapter>,
}

/// 单话页面的解析结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodePage {
    pub title: String,
    pub paragraphs: Vec<String>,
    /// 段落里引用到的插图，下载和路径替换由上层完成
    pub images: Vec<ImageRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub alt: String,
    pub src: String,
}

/// 打开标签时压栈的上下文帧
#[derive(Debug)]
pub struct Frame {
    pub tag: String,
    pub id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
}

impl Frame {
    fn new(element: &scraper::node::Element) -> Self {
        Self {
            tag: element.name().to_string(),
            id: element.id().map(|id| id.to_string()),
            classes: element.classes().map(|class| class.to_string()).collect(),
            attrs: element
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.iter().any(|class| class == name)
    }
}

/// DOM 事件回调。回调拿到的是整条帧栈，栈顶就是当前元素
pub(crate) trait DomVisitor {
    fn start(&mut self, stack: &[Frame]) -> Result<()> {
        let _ = stack;
        Ok(())
    }

    fn end(&mut self, stack: &[Frame]) -> Result<()> {
        let _ = stack;
        Ok(())
    }

    fn data(&mut self, stack: &[Frame], text: &str) -> Result<()> {
        let _ = (stack, text);
        Ok(())
    }
}

/// 把整棵 DOM 还原成开闭标签和文本的事件流，上下文用显式栈维护
pub(crate) fn walk<V: DomVisitor>(html: &Html, visitor: &mut V) -> Result<()> {
    let mut stack = Vec::new();
    walk_element(html.root_element(), visitor, &mut stack)
}

fn walk_element<V: DomVisitor>(
    element: ElementRef,
    visitor: &mut V,
    stack: &mut Vec<Frame>,
) -> Result<()> {
    stack.push(Frame::new(element.value()));
    visitor.start(stack)?;
    for child in element.children() {
        match child.value() {
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    walk_element(child_element, visitor, stack)?;
                }
            }
            Node::Text(text) => visitor.data(stack, text)?,
            _ => {}
        }
    }
    visitor.end(stack)?;
    stack.pop();
    Ok(())
}

/// 与 Python html.escape 一致的转义，含双引号和单引号
pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

static NAROU_PARAGRAPH_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^L[1-9][0-9]*$").unwrap());
static KAKUYOMU_PARAGRAPH_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^p[1-9][0-9]*$").unwrap());

/// 单话页面解析器，两个站点共用同一套状态机，只有段落 id 的
/// 形式、标题的标记 class 和插图开关不同
pub struct EpisodeParser {
    paragraph_id: &'static Regex,
    title_class: &'static str,
    include_images: bool,
    page: EpisodePage,
    paragraph_flg: bool,
    current_paragraph: String,
}

impl EpisodeParser {
    pub fn narou(include_images: bool) -> Self {
        Self::new(&NAROU_PARAGRAPH_ID, "p-novel__title", include_images)
    }

    /// カクヨム不支持插图，无论开关如何都不处理 img
    pub fn kakuyomu() -> Self {
        Self::new(&KAKUYOMU_PARAGRAPH_ID, "widget-episodeTitle", false)
    }

    fn new(paragraph_id: &'static Regex, title_class: &'static str, include_images: bool) -> Self {
        Self {
            paragraph_id,
            title_class,
            include_images,
            page: EpisodePage::default(),
            paragraph_flg: false,
            current_paragraph: String::new(),
        }
    }

    pub fn parse(mut self, html: &str) -> Result<EpisodePage> {
        let document = Html::parse_document(html);
        walk(&document, &mut self)?;
        Ok(self.page)
    }

    fn id_matches(&self, frame: &Frame) -> bool {
        frame
            .id
            .as_deref()
            .is_some_and(|id| self.paragraph_id.is_match(id))
    }
}

impl DomVisitor for EpisodeParser {
    fn start(&mut self, stack: &[Frame]) -> Result<()> {
        let Some(frame) = stack.last() else {
            return Ok(());
        };
        if self.id_matches(frame) {
            self.paragraph_flg = true;
        }
        // ruby/rt 原样保留，rb 这层包装丢掉只留文本
        if self.paragraph_flg {
            match frame.tag.as_str() {
                "ruby" => self.current_paragraph.push_str("<ruby>"),
                "rt" => self.current_paragraph.push_str("<rt>"),
                "br" => self.current_paragraph.push_str("<br />"),
                "img" if self.include_images => {
                    let alt = frame.attr("alt").unwrap_or("");
                    if let Some(src) = frame.attr("src") {
                        if !src.is_empty() {
                            self.current_paragraph.push_str(&format!(
                                "<img alt=\"{}\" src=\"{}\"/>",
                                escape(alt),
                                src
                            ));
                            self.page.images.push(ImageRef {
                                alt: alt.to_string(),
                                src: src.to_string(),
                            });
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn end(&mut self, stack: &[Frame]) -> Result<()> {
        let Some(frame) = stack.last() else {
            return Ok(());
        };
        if self.paragraph_flg {
            match frame.tag.as_str() {
                "ruby" => self.current_paragraph.push_str("</ruby>"),
                "rt" => self.current_paragraph.push_str("</rt>"),
                "p" => {
                    // 空白段落是装饰行，直接丢掉
                    if self.current_paragraph.trim().is_empty() {
                        self.current_paragraph.clear();
                    } else {
                        self.page
                            .paragraphs
                            .push(std::mem::take(&mut self.current_paragraph));
                    }
                }
                _ => {}
            }
        }
        if self.id_matches(frame) {
            self.paragraph_flg = false;
        }
        Ok(())
    }

    fn data(&mut self, stack: &[Frame], text: &str) -> Result<()> {
        let Some(frame) = stack.last() else {
            return Ok(());
        };
        if self.paragraph_flg && matches!(frame.tag.as_str(), "ruby" | "rb" | "rt" | "p") {
            self.current_paragraph.push_str(&escape(text.trim_end()));
        }
        if frame.has_class(self.title_class) {
            self.page.title.push_str(&escape(text.trim_end()));
        }
        Ok(())
    }
}

/// 按站点分发目录页解析，seed 为前面页已累积的章节
pub fn parse_index(site: Site, html: &str, seed: Vec<Chapter>) -> Result<IndexPage> {
    match site {
        Site::Narou => narou::IndexParser::new(seed).parse(html),
        Site::Kakuyomu => kakuyomu::IndexParser::new(seed).parse(html),
    }
}

pub fn parse_episode(site: Site, html: &str, include_images: bool) -> Result<EpisodePage> {
    match site {
        Site::Narou => EpisodeParser::narou(include_images).parse(html),
        Site::Kakuyomu => EpisodeParser::kakuyomu().parse(html),
    }
}
