use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ContentKind, PublicRecord, Record};
use crate::i18n::{Locale, LocalizedText};

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct News {
    pub id: String,
    pub title: LocalizedText,
    #[serde(default)]
    pub summary: LocalizedText,
    #[serde(default)]
    pub body: LocalizedText,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for News {
    const KIND: ContentKind = ContentKind::News;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status(&self) -> bool {
        self.published
    }

    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn category(&self) -> Option<&str> {
        non_empty(&self.category)
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = Vec::with_capacity(7);
        fields.extend(self.title.variants());
        fields.extend(self.summary.variants());
        fields.extend(self.body.variants());
        fields.push(&self.category);
        fields
    }

    fn title(&self) -> &str {
        self.title.get(Locale::DEFAULT)
    }
}

impl PublicRecord for News {
    fn localized(&self, locale: Locale) -> Value {
        json!({
            "id": self.id,
            "title": self.title.get(locale),
            "summary": self.summary.get(locale),
            "body": self.body.get(locale),
            "category": self.category,
            "imageUrl": self.image_url,
            "createdAt": self.created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub achieved_on: Option<NaiveDate>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Achievement {
    const KIND: ContentKind = ContentKind::Achievement;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status(&self) -> bool {
        self.published
    }

    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn category(&self) -> Option<&str> {
        non_empty(&self.category)
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = Vec::with_capacity(6);
        fields.extend(self.title.variants());
        fields.extend(self.description.variants());
        fields.push(&self.student_name);
        fields.push(&self.category);
        fields
    }

    fn title(&self) -> &str {
        self.title.get(Locale::DEFAULT)
    }
}

impl PublicRecord for Achievement {
    fn localized(&self, locale: Locale) -> Value {
        json!({
            "id": self.id,
            "title": self.title.get(locale),
            "description": self.description.get(locale),
            "studentName": self.student_name,
            "category": self.category,
            "achievedOn": self.achieved_on,
            "imageUrl": self.image_url,
            "createdAt": self.created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub position: LocalizedText,
    #[serde(default)]
    pub bio: LocalizedText,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Teacher {
    const KIND: ContentKind = ContentKind::Teacher;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status(&self) -> bool {
        self.published
    }

    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = Vec::with_capacity(6 + self.subjects.len());
        fields.extend(self.name.variants());
        fields.extend(self.position.variants());
        fields.extend(self.bio.variants());
        fields.extend(self.subjects.iter().map(String::as_str));
        fields
    }

    fn title(&self) -> &str {
        self.name.get(Locale::DEFAULT)
    }

    fn sort_order(&self) -> i64 {
        self.sort_order
    }
}

impl PublicRecord for Teacher {
    fn localized(&self, locale: Locale) -> Value {
        json!({
            "id": self.id,
            "name": self.name.get(locale),
            "position": self.position.get(locale),
            "bio": self.bio.get(locale),
            "subjects": self.subjects,
            "email": self.email,
            "imageUrl": self.image_url,
            "sortOrder": self.sort_order,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub duration_weeks: Option<u32>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Course {
    const KIND: ContentKind = ContentKind::Course;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status(&self) -> bool {
        self.published
    }

    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn category(&self) -> Option<&str> {
        non_empty(&self.category)
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = Vec::with_capacity(6);
        fields.extend(self.title.variants());
        fields.extend(self.description.variants());
        fields.push(&self.category);
        fields.push(&self.level);
        fields
    }

    fn title(&self) -> &str {
        self.title.get(Locale::DEFAULT)
    }

    fn sort_order(&self) -> i64 {
        self.sort_order
    }
}

impl PublicRecord for Course {
    fn localized(&self, locale: Locale) -> Value {
        json!({
            "id": self.id,
            "title": self.title.get(locale),
            "description": self.description.get(locale),
            "category": self.category,
            "level": self.level,
            "durationWeeks": self.duration_weeks,
            "imageUrl": self.image_url,
            "sortOrder": self.sort_order,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub responded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for ContactMessage {
    const KIND: ContentKind = ContentKind::ContactMessage;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status(&self) -> bool {
        self.responded
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.name.as_str(),
            self.email.as_str(),
            self.subject.as_str(),
            self.message.as_str(),
        ];
        if let Some(phone) = &self.phone {
            fields.push(phone);
        }
        fields
    }

    fn title(&self) -> &str {
        &self.subject
    }
}
