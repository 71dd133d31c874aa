pub mod downloader;
pub mod update;

pub use downloader::Downloader;
pub use update::{plan_episode, Plan};

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use tracing::{info, instrument};
use url::Url;

use crate::cli::Args;
use crate::epub::{Chapter, Epub, Image, PackageReader, Snapshot, SnapshotEpisode, SnapshotImage};
use crate::parser::{parse_episode, parse_index, IndexPage};
use crate::range::parse_range;
use crate::site::Site;
use crate::tcy::tcy;

pub struct Crawler {
    site: Site,
    novel_id: String,
    illustration: bool,
    tcy: bool,
    targets: Option<HashSet<String>>,
    output: PathBuf,
    downloader: Downloader,
}

impl Crawler {
    pub fn new(args: &Args) -> Result<Self> {
        let site = if args.kakuyomu {
            Site::Kakuyomu
        } else {
            Site::Narou
        };
        if args.kakuyomu && args.illustration {
            anyhow::bail!("カクヨム不支持插图下载");
        }
        // 范围解析放在任何网络请求之前，写错了立刻报出来
        let targets = match &args.range {
            Some(range) => Some(parse_range(range)?),
            None => None,
        };
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.epub", args.novel_id)));
        Ok(Self {
            site,
            novel_id: args.novel_id.clone(),
            illustration: args.illustration,
            tcy: args.tcy,
            targets,
            output,
            downloader: Downloader::new()?,
        })
    }

    #[instrument(skip_all)]
    pub async fn run(&self) -> Result<()> {
        let prior = self.load_snapshot().await?;
        if let Some(prior) = &prior {
            self.check_snapshot(prior)?;
            info!("输出文件已存在，执行增量更新");
        }
        let timestamp = Local::now();

        let index = self.fetch_index().await?;
        info!("目录获取完成: {} / {}", index.title, index.author);

        let mut chapters = index.chapters;
        let prior_episodes = prior.map(|p| p.episodes).unwrap_or_default();
        let mut snapshot = Snapshot::new(
            self.novel_id.clone(),
            self.site == Site::Kakuyomu,
            self.illustration,
            self.tcy,
        );
        let mut images = Vec::new();
        let mut carried_images = Vec::new();
        let mut dropped_ids = HashSet::new();
        let mut fetched = 0usize;
        let mut skipped = 0usize;

        let mut num = 0usize;
        for chapter in chapters.iter_mut() {
            for episode in chapter.episodes.iter_mut() {
                let prior_entry = prior_episodes.get(&episode.id);
                let plan = plan_episode(num, episode, prior_entry, self.targets.as_ref());
                num += 1;
                match plan {
                    // Keep/Skip 只在快照条目存在时返回
                    Plan::Keep | Plan::Skip => {
                        if let Some(prev) = prior_entry {
                            episode.title = prev.title.clone();
                            carried_images.extend(prev.images.iter().cloned());
                            snapshot.episodes.insert(episode.id.clone(), prev.clone());
                            if plan == Plan::Skip {
                                skipped += 1;
                                info!("第{}话无更新，跳过: {}", num, prev.title);
                            }
                        }
                    }
                    Plan::Drop => {
                        dropped_ids.insert(episode.id.clone());
                    }
                    Plan::Fetch => {
                        let episode_images =
                            self.fetch_episode(episode, &mut images).await?;
                        snapshot.episodes.insert(
                            episode.id.clone(),
                            SnapshotEpisode {
                                id: episode.id.clone(),
                                title: episode.title.clone(),
                                created_at: episode.created_at.clone(),
                                updated_at: episode.updated_at.clone(),
                                images: episode_images,
                            },
                        );
                        fetched += 1;
                    }
                }
            }
        }
        for chapter in chapters.iter_mut() {
            chapter
                .episodes
                .retain(|episode| !dropped_ids.contains(&episode.id));
        }
        info!(
            "下载完成: 新抓取{}话，沿用{}话，剔除{}话",
            fetched,
            skipped,
            dropped_ids.len()
        );

        let epub = Epub {
            novel_id: self.novel_id.clone(),
            title: index.title,
            author: index.author,
            timestamp,
            chapters,
            images,
            carried_images,
            snapshot,
            output: self.output.clone(),
        };
        epub.generate().await
    }

    /// 输出文件已存在时读出上次运行留下的快照
    async fn load_snapshot(&self) -> Result<Option<Snapshot>> {
        if !tokio::fs::try_exists(&self.output).await? {
            return Ok(None);
        }
        let reader = PackageReader::open(&self.output).await?;
        let raw = reader.read("src/metadata.json").await?;
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    /// 增量更新要求和上次运行的参数完全一致
    fn check_snapshot(&self, prior: &Snapshot) -> Result<()> {
        if prior.novel_id != self.novel_id {
            anyhow::bail!(
                "输出文件属于另一部小说: {} (本次: {})",
                prior.novel_id,
                self.novel_id
            );
        }
        if prior.kakuyomu != (self.site == Site::Kakuyomu) {
            anyhow::bail!("输出文件的站点和本次运行不一致");
        }
        if prior.illustration != self.illustration {
            anyhow::bail!("输出文件的插图开关和本次运行不一致");
        }
        if prior.tcy != self.tcy {
            anyhow::bail!("输出文件的纵中横开关和本次运行不一致");
        }
        Ok(())
    }

    /// 逐页抓目录直到没有下一页，章节结构跨页累积
    #[instrument(skip_all)]
    async fn fetch_index(&self) -> Result<IndexPage> {
        let mut page = 1u32;
        let mut chapters = Chapter::initial();
        loop {
            let url = self.site.index_url(&self.novel_id, page);
            info!("正在获取目录第{}页", page);
            let html = self.downloader.text(&url).await?;
            let mut index = parse_index(self.site, &html, std::mem::take(&mut chapters))?;
            match &index.next_page {
                Some(href) => {
                    page = next_page_number(&url, href)?;
                    chapters = std::mem::take(&mut index.chapters);
                    self.downloader.pause().await;
                }
                None => return Ok(index),
            }
        }
    }

    /// 抓一话的正文和插图，返回写进快照的插图描述
    async fn fetch_episode(
        &self,
        episode: &mut crate::epub::Episode,
        images: &mut Vec<Image>,
    ) -> Result<Vec<SnapshotImage>> {
        let url = self.site.episode_url(&self.novel_id, &episode.id);
        let html = self.downloader.text(&url).await?;
        let page = parse_episode(self.site, &html, self.illustration)?;
        info!("已抓取: {}", page.title);
        episode.title = page.title;
        episode.paragraphs = page.paragraphs;
        episode.fetched = true;

        let mut episode_images = Vec::new();
        // 同一话里同一张图只下载一次
        let mut seen: HashMap<String, String> = HashMap::new();
        for image_ref in &page.images {
            let name = match seen.get(&image_ref.src) {
                Some(name) => name.clone(),
                None => {
                    self.downloader.pause().await;
                    let image = self
                        .downloader
                        .image(&format!("https:{}", image_ref.src))
                        .await?;
                    let name = image.name.clone();
                    episode_images.push(image.descriptor());
                    images.push(image);
                    seen.insert(image_ref.src.clone(), name.clone());
                    name
                }
            };
            // 正文里的原始地址替换成包内路径
            let from = format!("src=\"{}\"", image_ref.src);
            let to = format!("src=\"../image/{}\"", name);
            for paragraph in episode.paragraphs.iter_mut() {
                *paragraph = paragraph.replace(&from, &to);
            }
        }
        if self.tcy {
            for paragraph in episode.paragraphs.iter_mut() {
                *paragraph = tcy(paragraph);
            }
        }
        self.downloader.pause().await;
        Ok(episode_images)
    }
}

/// 从下一页链接的 href 里解析出页码
fn next_page_number(base: &str, href: &str) -> Result<u32> {
    let url = Url::parse(base)?.join(href)?;
    let page = url
        .query_pairs()
        .find(|(key, _)| key == "p")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| anyhow::anyhow!("下一页链接中没有页码: {}", href))?;
    Ok(page.parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crawler(novel_id: &str, kakuyomu: bool, illustration: bool, tcy: bool) -> Crawler {
        let args = Args {
            novel_id: novel_id.to_string(),
            illustration,
            tcy,
            range: None,
            output: None,
            kakuyomu,
        };
        Crawler::new(&args).unwrap()
    }

    #[test]
    fn test_next_page_number() {
        assert_eq!(
            2,
            next_page_number("https://ncode.syosetu.com/n1234ab/?p=1", "/n1234ab/?p=2").unwrap()
        );
        assert!(next_page_number("https://ncode.syosetu.com/n1234ab/", "/n1234ab/").is_err());
    }

    #[test]
    fn test_new_rejects_kakuyomu_illustration() {
        let args = Args {
            novel_id: "485".to_string(),
            illustration: true,
            tcy: false,
            range: None,
            output: None,
            kakuyomu: true,
        };
        assert!(Crawler::new(&args).is_err());
    }

    #[test]
    fn test_new_rejects_bad_range() {
        let args = Args {
            novel_id: "n1234ab".to_string(),
            illustration: false,
            tcy: false,
            range: Some("1-".to_string()),
            output: None,
            kakuyomu: false,
        };
        assert!(Crawler::new(&args).is_err());
    }

    #[test]
    fn test_default_output_path() {
        let c = crawler("n1234ab", false, false, false);
        assert_eq!(PathBuf::from("n1234ab.epub"), c.output);
    }

    #[test]
    fn test_check_snapshot() {
        let c = crawler("n1234ab", false, true, false);
        assert!(c
            .check_snapshot(&Snapshot::new("n1234ab".to_string(), false, true, false))
            .is_ok());
        assert!(c
            .check_snapshot(&Snapshot::new("n9999zz".to_string(), false, true, false))
            .is_err());
        assert!(c
            .check_snapshot(&Snapshot::new("n1234ab".to_string(), true, true, false))
            .is_err());
        assert!(c
            .check_snapshot(&Snapshot::new("n1234ab".to_string(), false, false, false))
            .is_err());
        assert!(c
            .check_snapshot(&Snapshot::new("n1234ab".to_string(), false, true, true))
            .is_err());
    }
}
