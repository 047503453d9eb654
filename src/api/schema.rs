//! Response envelopes and the validating decode boundary.
//!
//! Every backend response wraps its payload in `data`. List payloads are decoded record by
//! record: a record that does not match its schema is rejected and counted instead of
//! failing the whole page.
//!
//! Two paginated shapes exist. The student listing reports a fetched range
//! (`meta.total`, `meta.range.to`); the dormitory listing reports page numbers
//! (`current_page`, `last_page`). Each endpoint decodes its own envelope and both are
//! normalised into [`PageInfo`].

use crate::errors::{Error, Result};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

/// Single-object envelope
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    /// Payload
    pub data: T,
}

/// Unpaged list envelope
#[derive(Debug, Deserialize)]
pub struct ListEnvelope {
    /// Raw records, validated individually
    #[serde(default)]
    pub data: Vec<Value>,
}

/// Fetched-range bounds, 1-based and inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FetchedRange {
    /// First item index on the page
    #[serde(default)]
    pub from: Option<u64>,
    /// Last item index on the page
    #[serde(default)]
    pub to: Option<u64>,
}

/// Range-style pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RangeMeta {
    /// Total matching records
    #[serde(default)]
    pub total: Option<u64>,
    /// Bounds of the page just fetched
    #[serde(default)]
    pub range: Option<FetchedRange>,
}

/// Envelope of the range-paginated student listing
#[derive(Debug, Deserialize)]
pub struct RangePageEnvelope {
    /// Raw records
    #[serde(default)]
    pub data: Vec<Value>,
    /// Pagination metadata
    #[serde(default)]
    pub meta: Option<RangeMeta>,
}

/// Envelope of the page-numbered dormitory listing
#[derive(Debug, Deserialize)]
pub struct NumberedPageEnvelope {
    /// Raw records
    #[serde(default)]
    pub data: Vec<Value>,
    /// Page just fetched
    #[serde(default)]
    pub current_page: Option<u32>,
    /// Last available page
    #[serde(default)]
    pub last_page: Option<u32>,
    /// Total matching records
    #[serde(default)]
    pub total: Option<u64>,
}

/// Pagination metadata normalised across endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageInfo {
    /// The page covered items `from..=to` of `total`
    Range {
        /// First item index
        from: Option<u64>,
        /// Last item index
        to: u64,
        /// Total matching records
        total: u64,
    },
    /// The page was `current` of `last`
    Numbered {
        /// Page just fetched
        current: u32,
        /// Last available page
        last: u32,
        /// Total matching records, if reported
        total: Option<u64>,
    },
}

impl PageInfo {
    /// Whether further pages exist beyond the one described.
    #[must_use]
    pub fn has_more(&self) -> bool {
        match *self {
            Self::Range { to, total, .. } => to < total,
            Self::Numbered { current, last, .. } => current < last,
        }
    }

    /// Total matching records, if known.
    #[must_use]
    pub const fn total(&self) -> Option<u64> {
        match *self {
            Self::Range { total, .. } => Some(total),
            Self::Numbered { total, .. } => total,
        }
    }
}

impl RangeMeta {
    /// Normalised metadata; `None` unless both the range end and the total were sent.
    #[must_use]
    pub fn page_info(self) -> Option<PageInfo> {
        let range = self.range?;
        Some(PageInfo::Range {
            from: range.from,
            to: range.to?,
            total: self.total?,
        })
    }
}

/// One fetched page of validated records
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Records that matched the schema
    pub items: Vec<T>,
    /// Pagination metadata, if the backend sent any
    pub info: Option<PageInfo>,
    /// Number of records dropped for not matching the schema
    pub rejected: usize,
}

impl<T> Page<T> {
    /// A page without metadata.
    #[must_use]
    pub const fn unpaged(items: Vec<T>) -> Self {
        Self {
            items,
            info: None,
            rejected: 0,
        }
    }
}

/// Decodes raw records, dropping and logging the ones that do not match `T`.
///
/// Returns the accepted records and the number rejected.
pub fn decode_records<T: DeserializeOwned>(raw: Vec<Value>, kind: &str) -> (Vec<T>, usize) {
    let mut accepted = Vec::with_capacity(raw.len());
    let mut rejected = 0;
    for record in raw {
        match serde_json::from_value::<T>(record) {
            Ok(item) => accepted.push(item),
            Err(e) => {
                rejected += 1;
                warn!(kind, error = %e, "Rejected record that does not match schema");
            }
        }
    }
    (accepted, rejected)
}

/// Parses a body into `T`, mapping failures to [`Error::InvalidResponse`].
pub fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::InvalidResponse {
        message: e.to_string(),
    })
}

/// Decodes a range-paginated listing.
pub fn decode_range_page<T: DeserializeOwned>(body: &str, kind: &str) -> Result<Page<T>> {
    let envelope: RangePageEnvelope = parse_body(body)?;
    let (items, rejected) = decode_records(envelope.data, kind);
    Ok(Page {
        items,
        info: envelope.meta.and_then(RangeMeta::page_info),
        rejected,
    })
}

/// Decodes a page-numbered listing.
pub fn decode_numbered_page<T: DeserializeOwned>(body: &str, kind: &str) -> Result<Page<T>> {
    let envelope: NumberedPageEnvelope = parse_body(body)?;
    let (items, rejected) = decode_records(envelope.data, kind);
    let info = match (envelope.current_page, envelope.last_page) {
        (Some(current), Some(last)) => Some(PageInfo::Numbered {
            current,
            last,
            total: envelope.total,
        }),
        _ => None,
    };
    Ok(Page {
        items,
        info,
        rejected,
    })
}

/// Extracts a human-readable message from an error body.
///
/// Uses the `message` field of a JSON body when present, otherwise the first 200
/// characters of the raw text.
#[must_use]
pub fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| body.chars().take(200).collect(),
        |parsed| parsed.message,
    )
}
