//! Editable forms for devotions and church events.
//!
//! Forms hold raw text as typed. `validate()` checks required fields and
//! formats, and produces the input type the API client sends.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::attachment::ImageAttachment;
use crate::models::{ChurchEvent, ChurchEventInput, Devotion, DevotionInput};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must look like {expected} (got \"{value}\")")]
    Invalid {
        field: &'static str,
        expected: &'static str,
        value: String,
    },
}

fn required(field: &'static str, value: &str) -> Result<String, FormError> {
    let value = value.trim();
    if value.is_empty() {
        Err(FormError::Missing(field))
    } else {
        Ok(value.to_string())
    }
}

fn check_date(field: &'static str, value: &str) -> Result<String, FormError> {
    let value = required(field, value)?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| FormError::Invalid {
            field,
            expected: "YYYY-MM-DD",
            value,
        })
}

/// Blank is allowed; otherwise HH:MM (seconds are dropped)
fn check_time(field: &'static str, value: &str) -> Result<String, FormError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(String::new());
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| FormError::Invalid {
            field,
            expected: "HH:MM",
            value: value.to_string(),
        })
}

/// Church event create/edit form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChurchEventForm {
    pub title: String,
    pub description: String,
    pub event_date: String,
    pub event_time: String,
    pub location: String,
    pub is_active: bool,
    pub is_eligible_to_check_in: bool,
    /// Image already stored on the server (edit only)
    pub existing_image_url: Option<String>,
    /// Path typed by the user for a new image
    pub image_path: String,
    /// New image, loaded from `image_path`
    pub image: Option<ImageAttachment>,
}

impl ChurchEventForm {
    /// Blank form for a new event. New events start active.
    pub fn new() -> Self {
        Self {
            is_active: true,
            ..Default::default()
        }
    }

    /// Form pre-filled from an existing event
    pub fn from_event(event: &ChurchEvent) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            event_date: event.event_date.chars().take(10).collect(),
            event_time: event.event_time.chars().take(5).collect(),
            location: event.location.clone(),
            is_active: event.is_active,
            is_eligible_to_check_in: event.is_eligible_to_check_in,
            existing_image_url: event.image_url().map(str::to_string),
            image_path: String::new(),
            image: None,
        }
    }

    pub fn validate(&self) -> Result<ChurchEventInput, FormError> {
        let title = required("Title", &self.title)?;
        let event_date = check_date("Event date", &self.event_date)?;
        let event_time = check_time("Event time", &self.event_time)?;

        Ok(ChurchEventInput {
            title,
            description: self.description.trim().to_string(),
            event_date,
            event_time,
            location: self.location.trim().to_string(),
            is_active: self.is_active,
            is_eligible_to_check_in: self.is_eligible_to_check_in,
            event_image_url: self.existing_image_url.clone(),
        })
    }

    /// What the image field currently shows: a new attachment wins over the
    /// stored URL.
    pub fn image_preview(&self) -> Option<String> {
        match (&self.image, &self.existing_image_url) {
            (Some(image), _) => Some(image.preview()),
            (None, Some(url)) => Some(url.clone()),
            (None, None) => None,
        }
    }
}

/// Devotion create/edit form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevotionForm {
    pub date: String,
    pub title: String,
    pub subtitle: String,
    pub book: String,
    pub video_url: String,
    pub content: String,
    pub is_active: bool,
}

impl DevotionForm {
    pub fn from_devotion(devotion: &Devotion) -> Self {
        let input = devotion.to_input();
        Self {
            date: input.date.chars().take(10).collect(),
            title: input.title,
            subtitle: input.subtitle,
            book: input.book,
            video_url: input.video_url,
            content: input.content,
            is_active: input.is_active,
        }
    }

    pub fn validate(&self) -> Result<DevotionInput, FormError> {
        let date = check_date("Date", &self.date)?;
        let title = required("Title", &self.title)?;
        let content = required("Content", &self.content)?;

        Ok(DevotionInput {
            date,
            title,
            subtitle: self.subtitle.trim().to_string(),
            book: self.book.trim().to_string(),
            video_url: self.video_url.trim().to_string(),
            content,
            is_active: self.is_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_event_form() -> ChurchEventForm {
        ChurchEventForm {
            title: "  Youth Camp ".to_string(),
            event_date: "2025-07-14".to_string(),
            event_time: "08:30".to_string(),
            location: "Lembang".to_string(),
            ..ChurchEventForm::new()
        }
    }

    #[test]
    fn test_event_form_valid() {
        let input = filled_event_form().validate().unwrap();
        assert_eq!(input.title, "Youth Camp");
        assert_eq!(input.event_date, "2025-07-14");
        assert_eq!(input.event_time, "08:30");
        assert!(input.is_active);
        assert_eq!(input.event_image_url, None);
    }

    #[test]
    fn test_event_form_required_fields() {
        let mut form = filled_event_form();
        form.title = "   ".to_string();
        assert_eq!(form.validate(), Err(FormError::Missing("Title")));

        let mut form = filled_event_form();
        form.event_date.clear();
        assert_eq!(form.validate(), Err(FormError::Missing("Event date")));
    }

    #[test]
    fn test_event_form_rejects_bad_date_and_time() {
        let mut form = filled_event_form();
        form.event_date = "14/07/2025".to_string();
        assert!(matches!(
            form.validate(),
            Err(FormError::Invalid { field: "Event date", .. })
        ));

        let mut form = filled_event_form();
        form.event_time = "25:00".to_string();
        assert!(matches!(
            form.validate(),
            Err(FormError::Invalid { field: "Event time", .. })
        ));
    }

    #[test]
    fn test_event_form_time_optional_and_seconds_dropped() {
        let mut form = filled_event_form();
        form.event_time.clear();
        assert_eq!(form.validate().unwrap().event_time, "");

        form.event_time = "18:00:00".to_string();
        assert_eq!(form.validate().unwrap().event_time, "18:00");
    }

    #[test]
    fn test_event_form_from_event_keeps_image_url() {
        let event: ChurchEvent = serde_json::from_str(
            r#"{"id":3,"title":"Choir","eventDate":"2025-03-02T00:00:00Z","eventTime":"10:00:00",
                "isActive":false,"isEligibleToCheckIn":true,"eventImageUrl":"https://img/x.png"}"#,
        )
        .unwrap();
        let form = ChurchEventForm::from_event(&event);
        assert_eq!(form.event_date, "2025-03-02");
        assert_eq!(form.event_time, "10:00");
        assert!(!form.is_active);
        assert_eq!(form.image_preview().as_deref(), Some("https://img/x.png"));

        let input = form.validate().unwrap();
        assert_eq!(input.event_image_url.as_deref(), Some("https://img/x.png"));
    }

    #[test]
    fn test_new_image_overrides_preview() {
        let mut form = filled_event_form();
        form.existing_image_url = Some("https://img/old.png".to_string());
        form.image = Some(ImageAttachment {
            file_name: "new.png".to_string(),
            mime: "image/png".to_string(),
            bytes: vec![0; 2048],
        });
        assert_eq!(form.image_preview().as_deref(), Some("new.png · image/png · 2.0 KB"));
    }

    #[test]
    fn test_devotion_form() {
        let form = DevotionForm {
            date: "2025-01-05".to_string(),
            title: "Grace".to_string(),
            content: "Ephesians 2:8".to_string(),
            book: " Ephesians ".to_string(),
            ..Default::default()
        };
        let input = form.validate().unwrap();
        assert_eq!(input.book, "Ephesians");

        let missing = DevotionForm {
            content: String::new(),
            ..form
        };
        assert_eq!(missing.validate(), Err(FormError::Missing("Content")));
    }
}
