//! Where the feed text comes from
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the complete text of the feed
    async fn fetch(&self) -> Result<String>;
}

/// The published csv export of the spreadsheet
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn fetch(&self) -> Result<String> {
        debug!(url = %self.url, "fetching feed");
        let resp = self.client.get(&self.url).send().await?;
        if !resp.status().is_success() {
            return Err(Error::FeedStatus(resp.status()));
        }
        Ok(resp.text().await?)
    }
}

/// A feed exported to a local file
#[derive(Debug, Clone)]
pub struct FileFeed {
    path: PathBuf,
}

impl FileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FeedSource for FileFeed {
    async fn fetch(&self) -> Result<String> {
        debug!(path = ?self.path, "reading feed");
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::feed::FeedSnapshot;
    use std::io::Write;
    use test_log::test;

    #[test(tokio::test)]
    async fn test_file_feed() {
        let path = std::env::temp_dir().join(format!("mapedit-feed-{}.csv", std::process::id()));
        let mut file = std::fs::File::create(&path).expect("create feed file");
        writeln!(file, "ID,Location,Hub,Address,Lat,Lng,Viability,Notes,Expecting,Driver")
            .expect("write");
        writeln!(file, "5,Depot,Yes,1 Main St,40.0,-74.0,8,ok,No,").expect("write");
        drop(file);

        let text = FileFeed::new(&path).fetch().await.expect("read feed");
        let snapshot = FeedSnapshot::parse(&text);
        assert_eq!(snapshot.next_id, 6);
        std::fs::remove_file(&path).expect("remove feed file");

        let err = FileFeed::new(&path).fetch().await.expect_err("file is gone");
        assert!(!err.is_user_visible());
    }
}
