use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::utils::{cmp_ignore_case, contains_ignore_case, format_long_date, format_time};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurchEvent {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub description: String,
    #[serde(default)]
    pub event_date: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub event_time: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub location: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_eligible_to_check_in: bool,
    #[serde(default)]
    pub event_image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub attendees: Vec<Attendee>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub penatalayans: Vec<Penatalayan>,
}

/// A member as embedded in attendance and service records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A check-in at an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    #[serde(default)]
    pub id: i64,
    pub user: User,
    #[serde(default)]
    pub church_event_id: i64,
    #[serde(default)]
    pub check_in_time: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

/// A member serving at an event (worship leader, usher, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Penatalayan {
    #[serde(default)]
    pub id: i64,
    pub user: User,
    #[serde(rename = "jenisPelayanan", default)]
    pub service_role: String,
    #[serde(default)]
    pub church_event_id: i64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub index: i64,
}

/// Writable fields of a church event. Sent as multipart text parts.
#[derive(Debug, Clone, PartialEq)]
pub struct ChurchEventInput {
    pub title: String,
    pub description: String,
    pub event_date: String,
    pub event_time: String,
    pub location: String,
    pub is_active: bool,
    pub is_eligible_to_check_in: bool,
    /// Existing image to keep when no new file is attached
    pub event_image_url: Option<String>,
}

impl ChurchEventInput {
    /// Multipart text fields, in wire names
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("title", self.title.clone()),
            ("description", self.description.clone()),
            ("eventDate", self.event_date.clone()),
            ("eventTime", self.event_time.clone()),
            ("location", self.location.clone()),
            ("isActive", self.is_active.to_string()),
            ("isEligibleToCheckIn", self.is_eligible_to_check_in.to_string()),
        ]
    }
}

/// Columns the church events table can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChurchEventSortColumn {
    Title,
    EventDate,
    Status,
    CheckIn,
}

impl ChurchEventSortColumn {
    pub fn label(&self) -> &'static str {
        match self {
            ChurchEventSortColumn::Title => "Title",
            ChurchEventSortColumn::EventDate => "Date",
            ChurchEventSortColumn::Status => "Status",
            ChurchEventSortColumn::CheckIn => "Check-in",
        }
    }
}

impl ChurchEvent {
    /// Search over title and location
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty()
            || contains_ignore_case(&self.title, query)
            || contains_ignore_case(&self.location, query)
    }

    /// Ascending comparison on `column`, ties broken by date then title
    pub fn compare_by(&self, other: &ChurchEvent, column: ChurchEventSortColumn) -> Ordering {
        let by_date = |a: &ChurchEvent, b: &ChurchEvent| {
            a.event_date
                .cmp(&b.event_date)
                .then_with(|| a.event_time.cmp(&b.event_time))
        };
        let primary = match column {
            ChurchEventSortColumn::Title => cmp_ignore_case(&self.title, &other.title),
            ChurchEventSortColumn::EventDate => by_date(self, other),
            ChurchEventSortColumn::Status => self.is_active.cmp(&other.is_active),
            ChurchEventSortColumn::CheckIn => {
                self.is_eligible_to_check_in.cmp(&other.is_eligible_to_check_in)
            }
        };
        primary
            .then_with(|| by_date(self, other))
            .then_with(|| cmp_ignore_case(&self.title, &other.title))
            .then_with(|| self.id.cmp(&other.id))
    }

    pub fn formatted_date(&self) -> String {
        format_long_date(&self.event_date)
    }

    pub fn formatted_time(&self) -> String {
        if self.event_time.trim().is_empty() {
            "-".to_string()
        } else {
            format_time(&self.event_time)
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_active {
            "Active"
        } else {
            "Inactive"
        }
    }

    /// Image URL, if the event has a non-blank one
    pub fn image_url(&self) -> Option<&str> {
        self.event_image_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// Service roster ordered by its position index
    pub fn servants(&self) -> Vec<&Penatalayan> {
        let mut servants: Vec<&Penatalayan> = self.penatalayans.iter().collect();
        servants.sort_by_key(|p| p.index);
        servants
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT_JSON: &str = r#"{
        "id": 4, "title": "Easter Service", "description": "Sunrise service",
        "eventDate": "2025-04-20", "eventTime": "06:00:00", "location": "Main Hall",
        "isActive": true, "isEligibleToCheckIn": true,
        "eventImageUrl": "https://img.example/easter.jpg",
        "createdAt": "2025-03-01T00:00:00Z", "updatedAt": "2025-03-02T00:00:00Z",
        "attendees": [{"id": 1, "user": {"id": 9, "name": "Ana", "email": "a@x.com",
            "role": "member", "isActive": true, "createdAt": "2024-01-01"},
            "churchEventId": 4, "checkInTime": "2025-04-20T06:05:00Z",
            "createdAt": "2025-04-20T06:05:00Z", "isActive": true,
            "latitude": -6.2, "longitude": 106.8}],
        "penatalayans": [
            {"id": 2, "user": {"id": 10, "name": "Budi"}, "jenisPelayanan": "Usher",
             "churchEventId": 4, "isActive": true, "index": 2},
            {"id": 3, "user": {"id": 11, "name": "Citra"}, "jenisPelayanan": "Worship Leader",
             "churchEventId": 4, "isActive": true, "index": 1}
        ]
    }"#;

    fn event(id: i64, title: &str, date: &str, active: bool, check_in: bool) -> ChurchEvent {
        ChurchEvent {
            id,
            title: title.to_string(),
            description: String::new(),
            event_date: date.to_string(),
            event_time: String::new(),
            location: "Chapel".to_string(),
            is_active: active,
            is_eligible_to_check_in: check_in,
            event_image_url: None,
            created_at: None,
            updated_at: None,
            attendees: Vec::new(),
            penatalayans: Vec::new(),
        }
    }

    #[test]
    fn test_parse_full_event() {
        let e: ChurchEvent = serde_json::from_str(EVENT_JSON).unwrap();
        assert_eq!(e.attendees.len(), 1);
        assert_eq!(e.attendees[0].user.name, "Ana");
        assert_eq!(e.formatted_date(), "Sunday, 20-04-2025");
        assert_eq!(e.formatted_time(), "06:00");
        assert_eq!(e.image_url(), Some("https://img.example/easter.jpg"));

        let servants = e.servants();
        assert_eq!(servants[0].service_role, "Worship Leader");
        assert_eq!(servants[1].user.name, "Budi");
    }

    #[test]
    fn test_parse_sparse_event() {
        let json = r#"{"id":5,"title":"Prayer","eventDate":"2025-05-01","description":null,
            "location":null,"attendees":null,"eventImageUrl":"  "}"#;
        let e: ChurchEvent = serde_json::from_str(json).unwrap();
        assert!(e.attendees.is_empty());
        assert_eq!(e.location, "");
        assert_eq!(e.image_url(), None);
        assert_eq!(e.formatted_time(), "-");
    }

    #[test]
    fn test_compare_by_columns() {
        let a = event(1, "Youth Night", "2025-01-10", true, false);
        let b = event(2, "bible study", "2025-02-10", false, true);

        assert_eq!(a.compare_by(&b, ChurchEventSortColumn::Title), Ordering::Greater);
        assert_eq!(a.compare_by(&b, ChurchEventSortColumn::EventDate), Ordering::Less);
        assert_eq!(a.compare_by(&b, ChurchEventSortColumn::Status), Ordering::Greater);
        assert_eq!(a.compare_by(&b, ChurchEventSortColumn::CheckIn), Ordering::Less);
    }

    #[test]
    fn test_matches_search() {
        let e = event(1, "Youth Night", "2025-01-10", true, false);
        assert!(e.matches_search("youth"));
        assert!(e.matches_search("chapel"));
        assert!(!e.matches_search("choir"));
    }

    #[test]
    fn test_text_fields_use_wire_names() {
        let input = ChurchEventInput {
            title: "Retreat".to_string(),
            description: String::new(),
            event_date: "2025-06-01".to_string(),
            event_time: "09:00".to_string(),
            location: "Camp".to_string(),
            is_active: true,
            is_eligible_to_check_in: false,
            event_image_url: None,
        };
        let fields = input.text_fields();
        assert!(fields.contains(&("eventDate", "2025-06-01".to_string())));
        assert!(fields.contains(&("isEligibleToCheckIn", "false".to_string())));
        assert!(!fields.iter().any(|(k, _)| *k == "eventImageUrl"));
    }
}
