use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 留给下次增量更新用的快照，序列化成包内的 src/metadata.json。
/// 标志位必须和上次运行一致，混着用会在任何抓取开始之前被拦下来。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub novel_id: String,
    #[serde(default)]
    pub kakuyomu: bool,
    #[serde(default)]
    pub illustration: bool,
    #[serde(default)]
    pub tcy: bool,
    #[serde(default)]
    pub episodes: BTreeMap<String, SnapshotEpisode>,
}

impl Snapshot {
    pub fn new(novel_id: String, kakuyomu: bool, illustration: bool, tcy: bool) -> Self {
        Self {
            novel_id,
            kakuyomu,
            illustration,
            tcy,
            episodes: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEpisode {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub images: Vec<SnapshotImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotImage {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub media_type: String,
}
