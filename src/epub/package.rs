use std::path::Path;

use anyhow::Result;
use async_zip::tokio::read::fs::ZipFileReader;
use async_zip::tokio::write::ZipFileWriter;
use async_zip::{Compression, ZipEntryBuilder};
use tokio::fs::File;

/// 新包的写入端。mimetype 必须无压缩且排在最前，创建时就写好
pub struct PackageWriter {
    inner: ZipFileWriter<File>,
}

impl PackageWriter {
    pub async fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).await?;
        let mut inner = ZipFileWriter::with_tokio(file);
        let entry = ZipEntryBuilder::new("mimetype".into(), Compression::Stored);
        inner.write_entry_whole(entry, b"application/epub+zip").await?;
        Ok(Self { inner })
    }

    pub async fn add(&mut self, path: &str, content: &[u8]) -> Result<()> {
        let entry = ZipEntryBuilder::new(path.into(), Compression::Deflate);
        self.inner.write_entry_whole(entry, content).await?;
        Ok(())
    }

    pub async fn finish(self) -> Result<()> {
        self.inner.close().await?;
        Ok(())
    }
}

/// 旧包的只读端，增量更新时从里面原样搬字节
pub struct PackageReader {
    inner: ZipFileReader,
}

impl PackageReader {
    pub async fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            inner: ZipFileReader::new(path).await?,
        })
    }

    /// 按包内路径读出一个条目的原始字节
    pub async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let index = self.entry_index(name)?;
        let mut reader = self.inner.reader_with_entry(index).await?;
        let mut buff = Vec::new();
        reader.read_to_end_checked(&mut buff).await?;
        Ok(buff)
    }

    fn entry_index(&self, name: &str) -> Result<usize> {
        for (index, entry) in self.inner.file().entries().iter().enumerate() {
            if entry.filename().as_str()? == name {
                return Ok(index);
            }
        }
        anyhow::bail!("旧文件中找不到条目: {}", name)
    }
}
