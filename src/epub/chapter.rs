/// 单话。目录解析阶段只有 id 和时间戳，正文抓取后才填充标题和段落
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Episode {
    pub id: String,
    pub title: String,
    pub paragraphs: Vec<String>,
    /// ISO-8601 文本，增量判断时直接按字典序比较
    pub created_at: String,
    pub updated_at: String,
    /// 本次运行是否重新抓取了正文
    pub fetched: bool,
}

impl Episode {
    pub fn stub(id: String) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

/// 章，按站点顺序收纳连续的话
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chapter {
    pub name: String,
    pub episodes: Vec<Episode>,
}

impl Chapter {
    pub fn new(name: String) -> Self {
        Self {
            name,
            episodes: Vec::new(),
        }
    }

    /// 初始章节列表，未命名的默认章永远排在最前
    pub fn initial() -> Vec<Chapter> {
        vec![Chapter::new("default".to_string())]
    }
}
