use std::env;

use anyhow::Context;

const DEFAULT_SOURCE_URL: &str = "https://webwidgets.prod.btwb.com/webwidgets/wods";
const DEFAULT_TRACK_ID: &str = "573806";
const DEFAULT_DAYS: u32 = 32;

const DEFAULT_TITLE: &str = "Crossfit Werk WODs";
const DEFAULT_SUBTITLE: &str = "scraped from https://crossfitwerk.de/workout-of-the-day";
const DEFAULT_FEED_URL: &str = "https://znull.github.io/werk-feed/workouts.atom";
const DEFAULT_SITE_URL: &str = "https://crossfitwerk.de/workout-of-the-day";
const DEFAULT_LOGO: &str = "https://images.squarespace-cdn.com/content/v1/638096caaf6dba73fe17c5c8/a599d2e8-074d-4aa0-a6db-f99537367f72/253590-2015_12_17_09_38_50.png?format=1500w";

/// Upstream widget endpoint settings, read from the environment.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub url: String,
    pub token: String,
    pub track_id: String,
    pub days: u32,
}

impl SourceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let token =
            env::var("BTWB_TOKEN").context("BTWB_TOKEN environment variable is not set")?;
        let url = env::var("WODFEED_SOURCE_URL").unwrap_or_else(|_| DEFAULT_SOURCE_URL.into());
        let track_id = env::var("WODFEED_TRACK_ID").unwrap_or_else(|_| DEFAULT_TRACK_ID.into());
        let days = match env::var("WODFEED_DAYS") {
            Ok(v) => v
                .parse()
                .context("WODFEED_DAYS should parse to an integer")?,
            Err(_) => DEFAULT_DAYS,
        };
        Ok(Self {
            url,
            token,
            track_id,
            days,
        })
    }
}

/// Feed-level metadata emitted in the Atom document.
#[derive(Debug, Clone)]
pub struct FeedMeta {
    pub title: String,
    pub subtitle: String,
    pub feed_url: String,
    pub site_url: String,
    pub language: String,
    pub logo: String,
}

impl FeedMeta {
    pub fn from_env() -> Self {
        Self {
            title: env::var("WODFEED_TITLE").unwrap_or_else(|_| DEFAULT_TITLE.into()),
            subtitle: env::var("WODFEED_SUBTITLE").unwrap_or_else(|_| DEFAULT_SUBTITLE.into()),
            feed_url: env::var("WODFEED_FEED_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.into()),
            site_url: env::var("WODFEED_SITE_URL").unwrap_or_else(|_| DEFAULT_SITE_URL.into()),
            language: env::var("WODFEED_LANGUAGE").unwrap_or_else(|_| "en".into()),
            logo: env::var("WODFEED_LOGO").unwrap_or_else(|_| DEFAULT_LOGO.into()),
        }
    }
}
