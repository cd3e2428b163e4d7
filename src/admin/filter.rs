use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::content::Record;
use crate::validation::normalize_search;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishFilter {
    #[default]
    All,
    Published,
    Unpublished,
}

impl PublishFilter {
    pub fn matches(self, status: bool) -> bool {
        match self {
            PublishFilter::All => true,
            PublishFilter::Published => status,
            PublishFilter::Unpublished => !status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    Title,
    SortOrder,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    #[serde(default)]
    pub publish: PublishFilter,
    /// `None` means every category.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub sort_field: SortField,
    #[serde(default)]
    pub sort_direction: SortDirection,
}

impl FilterState {
    /// 客户端传入的筛选条件：空白分类视为全部，搜索词去空白并截断
    pub fn normalized(mut self) -> Self {
        self.category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        self.search = normalize_search(&self.search);
        self
    }

    pub fn matches<T: Record>(&self, record: &T) -> bool {
        if !self.publish.matches(record.status()) {
            return false;
        }
        if T::KIND.has_category() {
            if let Some(category) = self.category.as_deref() {
                if record.category() != Some(category) {
                    return false;
                }
            }
        }
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        record
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    fn compare<T: Record>(&self, a: &T, b: &T) -> Ordering {
        let ordering = match self.sort_field {
            SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
            SortField::Title => a.title().to_lowercase().cmp(&b.title().to_lowercase()),
            SortField::SortOrder => a.sort_order().cmp(&b.sort_order()),
            SortField::Status => a.status().cmp(&b.status()),
        };
        match self.sort_direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Records passing `filter`, sorted. The sort is stable, so equal keys keep
/// their load order in both directions.
pub fn visible_records<'a, T: Record>(records: &'a [T], filter: &FilterState) -> Vec<&'a T> {
    let mut visible: Vec<&T> = records.iter().filter(|r| filter.matches(*r)).collect();
    visible.sort_by(|a, b| filter.compare(*a, *b));
    visible
}
