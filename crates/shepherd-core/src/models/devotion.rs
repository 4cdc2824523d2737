use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::utils::{cmp_ignore_case, contains_ignore_case, format_long_date};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Devotion {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub subtitle: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub book: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub video_url: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub total_views: i64,
}

/// Writable fields of a devotion, sent on create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevotionInput {
    pub date: String,
    pub title: String,
    pub subtitle: String,
    pub book: String,
    pub video_url: String,
    pub content: String,
    pub is_active: bool,
}

/// Columns the devotions table can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevotionSortColumn {
    Date,
    Title,
    Book,
    Views,
    Status,
}

impl DevotionSortColumn {
    pub fn label(&self) -> &'static str {
        match self {
            DevotionSortColumn::Date => "Date",
            DevotionSortColumn::Title => "Title",
            DevotionSortColumn::Book => "Book",
            DevotionSortColumn::Views => "Views",
            DevotionSortColumn::Status => "Status",
        }
    }
}

impl Devotion {
    /// Search over title, content and book
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty()
            || contains_ignore_case(&self.title, query)
            || contains_ignore_case(&self.content, query)
            || contains_ignore_case(&self.book, query)
    }

    /// Ascending comparison on `column`, ties broken by title then id
    pub fn compare_by(&self, other: &Devotion, column: DevotionSortColumn) -> Ordering {
        let primary = match column {
            DevotionSortColumn::Date => self.date.cmp(&other.date),
            DevotionSortColumn::Title => cmp_ignore_case(&self.title, &other.title),
            DevotionSortColumn::Book => cmp_ignore_case(&self.book, &other.book),
            DevotionSortColumn::Views => self.total_views.cmp(&other.total_views),
            DevotionSortColumn::Status => self.is_active.cmp(&other.is_active),
        };
        primary
            .then_with(|| cmp_ignore_case(&self.title, &other.title))
            .then_with(|| self.id.cmp(&other.id))
    }

    pub fn formatted_date(&self) -> String {
        format_long_date(&self.date)
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_active {
            "Active"
        } else {
            "Inactive"
        }
    }

    pub fn to_input(&self) -> DevotionInput {
        DevotionInput {
            date: self.date.clone(),
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            book: self.book.clone(),
            video_url: self.video_url.clone(),
            content: self.content.clone(),
            is_active: self.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devotion(id: i64, date: &str, title: &str, book: &str, views: i64) -> Devotion {
        Devotion {
            id,
            date: date.to_string(),
            title: title.to_string(),
            subtitle: String::new(),
            book: book.to_string(),
            video_url: String::new(),
            content: format!("Reflection on {}", book),
            created_at: None,
            is_active: true,
            total_views: views,
        }
    }

    #[test]
    fn test_parse_api_devotion() {
        let json = r#"{"id":12,"date":"2025-03-02","title":"Good Shepherd","subtitle":"Psalm 23",
            "book":"Psalms","videoUrl":"https://v.example/1","content":"The Lord is my shepherd",
            "createdAt":"2025-03-01T08:00:00Z","isActive":true,"totalViews":41}"#;
        let d: Devotion = serde_json::from_str(json).unwrap();
        assert_eq!(d.id, 12);
        assert_eq!(d.video_url, "https://v.example/1");
        assert_eq!(d.total_views, 41);
        assert_eq!(d.formatted_date(), "Sunday, 02-03-2025");
    }

    #[test]
    fn test_null_text_fields_become_empty() {
        let json = r#"{"id":3,"date":"2025-03-02","title":"T","subtitle":null,"book":null,
            "videoUrl":null,"content":null,"isActive":false}"#;
        let d: Devotion = serde_json::from_str(json).unwrap();
        assert_eq!(d.subtitle, "");
        assert_eq!(d.video_url, "");
        assert_eq!(d.status_label(), "Inactive");
    }

    #[test]
    fn test_input_serializes_camel_case() {
        let input = devotion(1, "2025-01-05", "Light", "John", 0).to_input();
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["videoUrl"], "");
        assert_eq!(json["isActive"], true);
        assert!(json.get("id").is_none());
        assert!(json.get("totalViews").is_none());
    }

    #[test]
    fn test_matches_search() {
        let d = devotion(1, "2025-01-05", "Light of the World", "John", 3);
        assert!(d.matches_search(""));
        assert!(d.matches_search("light"));
        assert!(d.matches_search("JOHN"));
        assert!(d.matches_search("reflection"));
        assert!(!d.matches_search("exodus"));
    }

    #[test]
    fn test_compare_by_columns() {
        let a = devotion(1, "2025-01-05", "Alpha", "Zechariah", 10);
        let b = devotion(2, "2025-02-05", "beta", "Amos", 2);

        assert_eq!(a.compare_by(&b, DevotionSortColumn::Date), Ordering::Less);
        assert_eq!(a.compare_by(&b, DevotionSortColumn::Title), Ordering::Less);
        assert_eq!(a.compare_by(&b, DevotionSortColumn::Book), Ordering::Greater);
        assert_eq!(a.compare_by(&b, DevotionSortColumn::Views), Ordering::Greater);
        // Same status falls back to title
        assert_eq!(a.compare_by(&b, DevotionSortColumn::Status), Ordering::Less);
    }
}
