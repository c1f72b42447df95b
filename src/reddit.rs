use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{FeedError, Result};
use crate::fetcher::{GroupDirectory, PageFetcher};
use crate::types::{Cursor, Item, Page};

pub struct Reddit {
    client: Client,
    base_url: String,
    page_size: u32,
}

impl std::fmt::Debug for Reddit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reddit")
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl Reddit {
    pub fn new(base_url: &str, page_size: u32, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| FeedError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size,
        })
    }

    fn feed_url(&self) -> String {
        format!("{}/.json", self.base_url)
    }

    fn about_url(&self, group: &str) -> String {
        format!(
            "{}/r/{}/about.json",
            self.base_url,
            urlencoding::encode(group)
        )
    }

    /// GET a URL and return the body. Connection and body read failures are
    /// transport errors; a non-success status is a response error.
    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Response(format!("{} returned {}", url, status)));
        }

        response
            .text()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))
    }
}

/// Query pairs for one feed page request. `after` is omitted at the start.
pub fn feed_query(cursor: &Cursor, page_size: u32) -> Vec<(&'static str, String)> {
    let mut query = vec![("limit", page_size.to_string())];
    if let Some(after) = cursor.token() {
        query.push(("after", after.to_string()));
    }
    query
}

// Reddit listing response types

#[derive(Deserialize)]
struct RdListing {
    data: Option<RdListingData>,
}

#[derive(Deserialize)]
struct RdListingData {
    children: Option<Vec<RdChild>>,
}

#[derive(Deserialize)]
struct RdChild {
    data: RdPost,
}

#[derive(Deserialize)]
struct RdPost {
    name: String,
    title: Option<String>,
    subreddit: Option<String>,
    created_utc: Option<f64>,
    created: Option<f64>,
    thumbnail: Option<String>,
    url: Option<String>,
    permalink: Option<String>,
    ups: Option<i64>,
    num_comments: Option<i64>,
}

#[derive(Deserialize)]
struct RdAbout {
    data: Option<RdAboutData>,
}

#[derive(Deserialize)]
struct RdAboutData {
    icon_img: Option<String>,
}

fn parse_timestamp(secs: Option<f64>) -> DateTime<Utc> {
    secs.and_then(|s| DateTime::from_timestamp(s as i64, 0))
        .unwrap_or_else(Utc::now)
}

fn non_negative(n: Option<i64>) -> u64 {
    n.unwrap_or(0).max(0) as u64
}

/// Reddit uses placeholders like `self`, `default` or `nsfw` instead of a URL.
fn thumbnail(raw: Option<String>) -> Option<String> {
    raw.filter(|t| t.starts_with("https://") || t.starts_with("http://"))
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

/// Map a listing body to a page.
pub fn parse_listing(body: &str, base_url: &str) -> Result<Page> {
    let listing: RdListing =
        serde_json::from_str(body).map_err(|e| FeedError::Response(e.to_string()))?;

    let children = listing
        .data
        .and_then(|d| d.children)
        .ok_or(FeedError::EmptyPage)?;

    let items = children
        .into_iter()
        .map(|child| {
            let post = child.data;
            // The id becomes the next cursor; a blank one would restart the feed.
            if post.name.trim().is_empty() {
                return Err(FeedError::Response("post without an id".into()));
            }
            Ok(Item {
                id: post.name,
                created_at: parse_timestamp(post.created_utc.or(post.created)),
                title: post.title.unwrap_or_default(),
                source_group: post.subreddit.unwrap_or_default(),
                thumbnail_url: thumbnail(post.thumbnail),
                upvote_count: non_negative(post.ups),
                comment_count: non_negative(post.num_comments),
                url: non_empty(post.url),
                permalink: non_empty(post.permalink).map(|p| {
                    if p.starts_with('/') {
                        format!("{}{}", base_url, p)
                    } else {
                        p
                    }
                }),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Page::new(items)
}

/// Icon URL from a group's about document.
pub fn parse_about(body: &str) -> Result<Option<String>> {
    let about: RdAbout =
        serde_json::from_str(body).map_err(|e| FeedError::Response(e.to_string()))?;
    Ok(non_empty(about.data.and_then(|d| d.icon_img)))
}

#[async_trait]
impl PageFetcher for Reddit {
    fn name(&self) -> &str {
        "Reddit"
    }

    async fn fetch(&self, cursor: &Cursor) -> Result<Page> {
        let query = feed_query(cursor, self.page_size);
        let body = self.get_text(&self.feed_url(), &query).await?;
        parse_listing(&body, &self.base_url)
    }
}

#[async_trait]
impl GroupDirectory for Reddit {
    async fn group_icon(&self, group: &str) -> Result<Option<String>> {
        if group.is_empty() {
            return Ok(None);
        }
        let body = self.get_text(&self.about_url(group), &[]).await?;
        parse_about(&body)
    }
}
