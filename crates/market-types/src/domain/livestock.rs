use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Goat,
    Sheep,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LivestockStatus {
    Available,
    Sold,
}

/// A catalog listing. Image bytes live in the image store; the listing only
/// carries their ids so list queries stay small.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Livestock {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    pub breed: String,
    pub age_months: u32,
    pub weight_kg: f64,
    pub gender: Gender,
    pub description: String,
    pub price_cents: i64,
    pub status: LivestockStatus,
    pub image_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLivestock {
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub age_months: u32,
    #[serde(default)]
    pub weight_kg: f64,
    pub gender: Gender,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
}

/// Partial admin edit; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LivestockPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub breed: Option<String>,
    pub age_months: Option<u32>,
    pub weight_kg: Option<f64>,
    pub gender: Option<Gender>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub status: Option<LivestockStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LivestockFilter {
    pub category: Option<Category>,
    pub status: Option<LivestockStatus>,
    pub q: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub id: Uuid,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Image {
    pub fn new(content_type: String, data: Vec<u8>) -> anyhow::Result<Self> {
        if !content_type.starts_with("image/") {
            anyhow::bail!("unsupported content type {content_type}");
        }
        if data.is_empty() {
            anyhow::bail!("image is empty");
        }
        Ok(Self {
            id: Uuid::new_v4(),
            content_type,
            data,
        })
    }
}

/// Upper bound on a single listing price (one billion in major units).
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

fn validate_fields(name: &str, price_cents: i64, weight_kg: f64) -> anyhow::Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("name empty");
    }
    if price_cents <= 0 {
        anyhow::bail!("price must be > 0");
    }
    if price_cents > MAX_PRICE_CENTS {
        anyhow::bail!("price must be at most {MAX_PRICE_CENTS} cents");
    }
    if !weight_kg.is_finite() || weight_kg < 0.0 {
        anyhow::bail!("weight must be a non-negative number");
    }
    Ok(())
}

impl Livestock {
    pub fn new(input: NewLivestock) -> anyhow::Result<Self> {
        validate_fields(&input.name, input.price_cents, input.weight_kg)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            category: input.category,
            breed: input.breed.trim().to_string(),
            age_months: input.age_months,
            weight_kg: input.weight_kg,
            gender: input.gender,
            description: input.description,
            price_cents: input.price_cents,
            status: LivestockStatus::Available,
            image_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, patch: LivestockPatch) -> anyhow::Result<()> {
        let name = patch.name.unwrap_or_else(|| self.name.clone());
        let price_cents = patch.price_cents.unwrap_or(self.price_cents);
        let weight_kg = patch.weight_kg.unwrap_or(self.weight_kg);
        validate_fields(&name, price_cents, weight_kg)?;

        self.name = name.trim().to_string();
        self.price_cents = price_cents;
        self.weight_kg = weight_kg;
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(breed) = patch.breed {
            self.breed = breed.trim().to_string();
        }
        if let Some(age) = patch.age_months {
            self.age_months = age;
        }
        if let Some(gender) = patch.gender {
            self.gender = gender;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_available(&self) -> bool {
        self.status == LivestockStatus::Available
    }

    pub fn cover_image(&self) -> Option<Uuid> {
        self.image_ids.first().copied()
    }
}

impl LivestockFilter {
    pub fn matches(&self, item: &Livestock) -> bool {
        if self.category.is_some_and(|c| c != item.category) {
            return false;
        }
        if self.status.is_some_and(|s| s != item.status) {
            return false;
        }
        if self.min_price.is_some_and(|min| item.price_cents < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| item.price_cents > max) {
            return false;
        }
        match self.q.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                item.name.to_lowercase().contains(&q)
                    || item.breed.to_lowercase().contains(&q)
                    || item.description.to_lowercase().contains(&q)
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewLivestock {
        NewLivestock {
            name: "Billy".into(),
            category: Category::Goat,
            breed: "Boer".into(),
            age_months: 14,
            weight_kg: 38.5,
            gender: Gender::Male,
            description: "Healthy buck".into(),
            price_cents: 45_000,
        }
    }

    #[test]
    fn new_listing_defaults_available() {
        let item = Livestock::new(input()).unwrap();
        assert!(item.is_available());
        assert!(item.image_ids.is_empty());
        assert_eq!(item.cover_image(), None);
    }

    #[test]
    fn rejects_bad_price_and_name() {
        let mut bad = input();
        bad.price_cents = 0;
        assert!(Livestock::new(bad).is_err());

        let mut bad = input();
        bad.name = "  ".into();
        assert!(Livestock::new(bad).is_err());

        let mut bad = input();
        bad.price_cents = i64::MAX;
        assert!(Livestock::new(bad).is_err());

        let mut top = input();
        top.price_cents = MAX_PRICE_CENTS;
        assert!(Livestock::new(top).is_ok());
    }

    #[test]
    fn patch_updates_only_given_fields() {
        let mut item = Livestock::new(input()).unwrap();
        item.apply(LivestockPatch {
            price_cents: Some(50_000),
            status: Some(LivestockStatus::Sold),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(item.price_cents, 50_000);
        assert_eq!(item.status, LivestockStatus::Sold);
        assert_eq!(item.breed, "Boer");

        let err = item.apply(LivestockPatch {
            price_cents: Some(-1),
            ..Default::default()
        });
        assert!(err.is_err());
        assert_eq!(item.price_cents, 50_000);
    }

    #[test]
    fn filter_matches_text_and_price() {
        let item = Livestock::new(input()).unwrap();
        let f = LivestockFilter {
            q: Some("boer".into()),
            max_price: Some(45_000),
            ..Default::default()
        };
        assert!(f.matches(&item));

        let f = LivestockFilter {
            category: Some(Category::Sheep),
            ..Default::default()
        };
        assert!(!f.matches(&item));
    }

    #[test]
    fn image_requires_image_content_type() {
        assert!(Image::new("text/plain".into(), vec![1]).is_err());
        assert!(Image::new("image/png".into(), vec![]).is_err());
        assert!(Image::new("image/png".into(), vec![1, 2]).is_ok());
    }
}
