use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

static RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[1-9][0-9]*(-[1-9][0-9]*)?(,[1-9][0-9]*(-[1-9][0-9]*)?)*$").unwrap()
});

/// 区间上限，防止把一个写错的范围展开成天文数字
static MAX_EPISODE_NUM: u32 = 10_000;

/// 把 "1,2,3" 或 "10-20" 这样的范围表达式展开成 1 起始的话数集合
pub fn parse_range(range: &str) -> Result<HashSet<String>> {
    let range = range.replace(' ', "");
    if !RANGE_PATTERN.is_match(&range) {
        anyhow::bail!("range 的格式不正确: {}", range);
    }
    let mut episode_nums = HashSet::new();
    for part in range.split(',') {
        if let Some((start, end)) = part.split_once('-') {
            let start: u32 = start.parse()?;
            let end: u32 = end.parse()?;
            if end > MAX_EPISODE_NUM {
                anyhow::bail!("range 中包含的值过大: {}", end);
            }
            for num in start..=end {
                episode_nums.insert(num.to_string());
            }
        } else {
            episode_nums.insert(part.to_string());
        }
    }
    Ok(episode_nums)
}
