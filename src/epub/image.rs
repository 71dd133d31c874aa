use bytes::Bytes;

use crate::epub::snapshot::SnapshotImage;

/// 一张插图，id 为内容哈希，跨话去重
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub id: String,
    pub name: String,
    pub media_type: String,
    pub data: Bytes,
}

impl Image {
    /// 写进快照里的描述，不含图片本体
    pub fn descriptor(&self) -> SnapshotImage {
        SnapshotImage {
            id: self.id.clone(),
            name: self.name.clone(),
            media_type: self.media_type.clone(),
        }
    }
}
