use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use narou_fetch::{Args, Crawler, logger, utils};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logger::init();
    let args = Args::parse();

    let crawler = Crawler::new(&args)?;
    let start = Instant::now();
    crawler.run().await?;
    utils::display_elapsed_time(start.elapsed());
    Ok(())
}
