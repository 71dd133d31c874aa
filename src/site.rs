use std::fmt;

/// 小说来源站点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    /// 小説家になろう
    Narou,
    /// カクヨム
    Kakuyomu,
}

impl Site {
    /// 目录页地址，なろう按页翻，カクヨム一页包含完整目录
    pub fn index_url(&self, novel_id: &str, page: u32) -> String {
        match self {
            Site::Narou => format!("https://ncode.syosetu.com/{}/?p={}", novel_id, page),
            Site::Kakuyomu => format!("https://kakuyomu.jp/works/{}", novel_id),
        }
    }

    pub fn episode_url(&self, novel_id: &str, episode_id: &str) -> String {
        match self {
            Site::Narou => format!("https://ncode.syosetu.com/{}/{}/", novel_id, episode_id),
            Site::Kakuyomu => {
                format!("https://kakuyomu.jp/works/{}/episodes/{}", novel_id, episode_id)
            }
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Site::Narou => write!(f, "narou"),
            Site::Kakuyomu => write!(f, "kakuyomu"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_url() {
        assert_eq!(
            "https://ncode.syosetu.com/n1234ab/?p=2",
            Site::Narou.index_url("n1234ab", 2)
        );
        assert_eq!(
            "https://kakuyomu.jp/works/4852201425154996685",
            Site::Kakuyomu.index_url("4852201425154996685", 1)
        );
    }

    #[test]
    fn test_episode_url() {
        assert_eq!(
            "https://ncode.syosetu.com/n1234ab/12/",
            Site::Narou.episode_url("n1234ab", "12")
        );
        assert_eq!(
            "https://kakuyomu.jp/works/485/episodes/16816",
            Site::Kakuyomu.episode_url("485", "16816")
        );
    }
}
