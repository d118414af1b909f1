/// An uploaded analysis file.
///
/// Content is held in memory only and shared read-only (`Arc<[u8]>`), so
/// cloning a record or handing it to a renderer never copies the bytes and
/// never allows them to change.
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Kind of analysis file. Each variant has a renderer in [`crate::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisFileCategory {
    /// Python `cProfile` / `pstats` dump.
    Pstats,
}

impl AnalysisFileCategory {
    /// Every category, in display order.
    pub const ALL: [AnalysisFileCategory; 1] = [AnalysisFileCategory::Pstats];

    /// Short label used in pickers and in serialised form.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pstats => "pstats",
        }
    }

    /// File extension (without the dot) typically used by this category.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pstats => "pstats",
        }
    }

    /// Guess the category from a file name's extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::ALL
            .into_iter()
            .find(|c| c.extension().eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for AnalysisFileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown analysis file category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for AnalysisFileCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

/// Immutable record of one uploaded file.
#[derive(Clone)]
pub struct AnalysisFile {
    name: String,
    category: AnalysisFileCategory,
    uploaded_at: DateTime<Local>,
    content: Arc<[u8]>,
}

impl AnalysisFile {
    /// Create a record stamped with the current local time.
    pub fn new(
        name: impl Into<String>,
        category: AnalysisFileCategory,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self::with_timestamp(name, category, Local::now(), content)
    }

    /// Create a record with an explicit upload timestamp.
    pub fn with_timestamp(
        name: impl Into<String>,
        category: AnalysisFileCategory,
        uploaded_at: DateTime<Local>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            uploaded_at,
            content: content.into().into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> AnalysisFileCategory {
        self.category
    }

    pub fn uploaded_at(&self) -> DateTime<Local> {
        self.uploaded_at
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Content size in bytes.
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Upload time as `HH:MM:SS`.
    pub fn uploaded_short(&self) -> String {
        self.uploaded_at.format("%H:%M:%S").to_string()
    }

    /// Upload time as `YYYY-MM-DD HH:MM:SS`.
    pub fn uploaded_long(&self) -> String {
        self.uploaded_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

// Content is omitted: it can be megabytes of binary data.
impl fmt::Debug for AnalysisFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisFile")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("uploaded_at", &self.uploaded_at)
            .field("size", &self.content.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn category_round_trips_through_label() {
        for category in AnalysisFileCategory::ALL {
            assert_eq!(category.label().parse::<AnalysisFileCategory>(), Ok(category));
        }
        assert_eq!("PSTATS".parse::<AnalysisFileCategory>(), Ok(AnalysisFileCategory::Pstats));
        assert_eq!(
            "flamegraph".parse::<AnalysisFileCategory>(),
            Err(UnknownCategory("flamegraph".into()))
        );
    }

    #[test]
    fn category_serialises_lowercase() {
        let json = serde_json::to_string(&AnalysisFileCategory::Pstats).unwrap();
        assert_eq!(json, "\"pstats\"");
    }

    #[test]
    fn category_from_file_name() {
        assert_eq!(
            AnalysisFileCategory::from_file_name("run.pstats"),
            Some(AnalysisFileCategory::Pstats)
        );
        assert_eq!(
            AnalysisFileCategory::from_file_name("RUN.PSTATS"),
            Some(AnalysisFileCategory::Pstats)
        );
        assert_eq!(AnalysisFileCategory::from_file_name("run.prof"), None);
        assert_eq!(AnalysisFileCategory::from_file_name("pstats"), None);
    }

    #[test]
    fn timestamps_format_short_and_long() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap();
        let file = AnalysisFile::with_timestamp("a.pstats", AnalysisFileCategory::Pstats, at, b"x".to_vec());
        assert_eq!(file.uploaded_short(), "07:05:02");
        assert_eq!(file.uploaded_long(), "2024-03-09 07:05:02");
    }

    #[test]
    fn clones_share_content() {
        let file = AnalysisFile::new("a.pstats", AnalysisFileCategory::Pstats, vec![1u8, 2, 3]);
        let copy = file.clone();
        assert_eq!(copy.content(), &[1, 2, 3]);
        assert_eq!(file.content().as_ptr(), copy.content().as_ptr());
        assert_eq!(file.size(), 3);
    }

    #[test]
    fn debug_omits_content() {
        let file = AnalysisFile::new("a.pstats", AnalysisFileCategory::Pstats, vec![0xAB; 64]);
        let debug = format!("{file:?}");
        assert!(debug.contains("a.pstats"));
        assert!(debug.contains("size: 64"));
        assert!(!debug.contains("content"));
    }
}
