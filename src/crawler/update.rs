use std::collections::HashSet;

use crate::epub::chapter::Episode;
use crate::epub::snapshot::SnapshotEpisode;

/// 每话的增量决策
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// 在范围之外但上次已经收进包里，原样沿用
    Keep,
    /// 没有更新，跳过下载并沿用上次的内容
    Skip,
    /// 重新下载
    Fetch,
    /// 从未抓取过又不在范围内，从输出里彻底剔除
    Drop,
}

/// 对一话做增量判定。num 为 0 起始的列表下标，范围过滤按 num+1 比较。
///
/// 注意这里的不对称：范围之外的话，上次存在快照条目时沿用（已经
/// 收进包里的话绝不能因为这次缩小范围而消失），没有快照条目时剔除。
pub fn plan_episode(
    num: usize,
    episode: &Episode,
    prior: Option<&SnapshotEpisode>,
    targets: Option<&HashSet<String>>,
) -> Plan {
    let in_targets = targets.is_none_or(|targets| targets.contains(&(num + 1).to_string()));
    if let Some(prior) = prior {
        if !in_targets {
            return Plan::Keep;
        }
        let current = std::cmp::max(&episode.created_at, &episode.updated_at);
        let previous = std::cmp::max(&prior.created_at, &prior.updated_at);
        if current <= previous {
            return Plan::Skip;
        }
    } else if !in_targets {
        return Plan::Drop;
    }
    Plan::Fetch
}
