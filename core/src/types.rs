//! Domain DTOs for the Substack read API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch any drift between the two crates. Posts are
//! server-authoritative value objects identified by `slug` within a
//! publication — the client never constructs or mutates them. `date` stays
//! an ISO-8601 string exactly as the API ships it.

use serde::{Deserialize, Serialize};

/// URL variants of one image asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVariants {
    pub original: String,
    pub small: String,
    pub medium: String,
    pub large: String,
}

/// Cover image: the usual variants plus an Open Graph rendition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverImage {
    #[serde(flatten)]
    pub variants: ImageVariants,
    pub og: String,
}

/// Six named colors extracted from the cover image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPalette {
    pub vibrant: String,
    pub light_vibrant: String,
    pub dark_vibrant: String,
    pub muted: String,
    pub light_muted: String,
    pub dark_muted: String,
}

/// A single post as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub slug: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub excerpt: String,
    pub body_html: String,
    pub reading_time_minutes: u32,
    pub audio_url: String,
    pub date: String,
    pub likes: u32,
    pub paywall: bool,
    pub cover_image: CoverImage,
    pub cover_image_color_palette: ColorPalette,
    pub author: String,
    pub author_image: ImageVariants,
}

/// Transport wrapper around every response payload.
///
/// Only `data` is semantically meaningful; the metadata fields are
/// transport bookkeeping and deserialize leniently so a terse envelope
/// still parses. The endpoint layer unwraps `data` and discards the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub status: String,
    #[serde(default, rename = "endpointName")]
    pub endpoint_name: String,
    #[serde(default, rename = "requestId")]
    pub request_id: String,
    #[serde(default, rename = "startedTimeStamp")]
    pub started_time_stamp: u64,
    #[serde(default, rename = "fulfilledTimeStamp")]
    pub fulfilled_time_stamp: u64,
}
