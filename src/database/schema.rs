use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::constants::{PRICE_DECIMAL_PLACES, PRICE_MAX_DIGITS};

pub type Id = i32;

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub password: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

/// Public view of a [`User`]; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: Id,
    pub email: String,
    pub name: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.to_owned(),
            name: user.name.to_owned(),
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct AuthToken {
    pub key: String,
    pub user_id: Id,
    pub created: DateTime<Utc>,
}

/// Tags and ingredients are both per-user labels and share one table layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Tag,
    Ingredient,
}

impl LabelKind {
    pub fn table(&self) -> &'static str {
        match self {
            LabelKind::Tag => "tags",
            LabelKind::Ingredient => "ingredients",
        }
    }

    pub fn link_table(&self) -> &'static str {
        match self {
            LabelKind::Tag => "recipe_tags",
            LabelKind::Ingredient => "recipe_ingredients",
        }
    }

    pub fn link_column(&self) -> &'static str {
        match self {
            LabelKind::Tag => "tag_id",
            LabelKind::Ingredient => "ingredient_id",
        }
    }

    /// Name used for the URL segment, the recipe payload key and the recipe list filter.
    pub fn field(&self) -> &'static str {
        self.table()
    }
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    pub id: Id,
    pub name: String,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct LinkedLabel {
    pub recipe_id: Id,
    pub id: Id,
    pub name: String,
}

impl From<LinkedLabel> for Label {
    fn from(value: LinkedLabel) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeRow {
    pub id: Id,
    pub user_id: Id,
    pub title: String,
    pub description: String,
    pub time_minutes: i32,
    pub price_cents: i64,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: Id,
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: String,
    pub tags: Vec<Label>,
    pub ingredients: Vec<Label>,
}

impl Recipe {
    pub fn from_row(row: &RecipeRow, tags: Vec<Label>, ingredients: Vec<Label>) -> Self {
        Self {
            id: row.id,
            title: row.title.to_owned(),
            time_minutes: row.time_minutes,
            price: Price::from_cents(row.price_cents),
            link: row.link.to_owned(),
            tags,
            ingredients,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub description: String,
}

impl RecipeDetail {
    pub fn from_row(row: &RecipeRow, tags: Vec<Label>, ingredients: Vec<Label>) -> Self {
        Self {
            recipe: Recipe::from_row(row, tags, ingredients),
            description: row.description.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceError {
    Invalid,
    Negative,
    TooManyDecimalPlaces,
    TooManyWholeDigits,
}

impl fmt::Display for PriceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceError::Invalid => write!(f, "A valid number is required."),
            PriceError::Negative => write!(f, "Ensure this value is greater than or equal to 0."),
            PriceError::TooManyDecimalPlaces => write!(
                f,
                "Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."
            ),
            PriceError::TooManyWholeDigits => write!(
                f,
                "Ensure that there are no more than {} digits before the decimal point.",
                PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES
            ),
        }
    }
}

impl std::error::Error for PriceError {}

/// A non-negative amount with two decimal places, held as whole cents.
///
/// Serialized as a decimal string (`"5.25"`). Parsing accepts either a JSON
/// number or a decimal string and rejects anything that does not fit
/// `PRICE_MAX_DIGITS` digits with `PRICE_DECIMAL_PLACES` of them after the point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price {
    cents: i64,
}

impl Price {
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub fn cents(&self) -> i64 {
        self.cents
    }

    pub fn parse(raw: &str) -> Result<Self, PriceError> {
        let raw = raw.trim();
        let (negative, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction)
        {
            return Err(PriceError::Invalid);
        }

        let significant = whole.trim_start_matches('0');
        let all_zero = significant.is_empty() && fraction.bytes().all(|b| b == b'0');
        if negative && !all_zero {
            return Err(PriceError::Negative);
        }
        if fraction.len() > PRICE_DECIMAL_PLACES {
            return Err(PriceError::TooManyDecimalPlaces);
        }
        if significant.len() > PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES {
            return Err(PriceError::TooManyWholeDigits);
        }

        let whole: i64 = if significant.is_empty() {
            0
        } else {
            significant.parse().map_err(|_| PriceError::Invalid)?
        };
        let fraction: i64 = format!("{fraction:0<width$}", width = PRICE_DECIMAL_PLACES)
            .parse()
            .map_err(|_| PriceError::Invalid)?;

        Ok(Self::from_cents(whole * 100 + fraction))
    }
}

impl TryFrom<&Value> for Price {
    type Error = PriceError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Price::parse(s),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Price::parse(&i.to_string()),
                (None, Some(f)) if f.is_finite() => Price::parse(&format!("{f}")),
                _ => Err(PriceError::Invalid),
            },
            _ => Err(PriceError::Invalid),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn price_parses_decimal_strings_and_numbers() {
        assert_eq!(Price::parse("5.25"), Ok(Price::from_cents(525)));
        assert_eq!(Price::parse("7"), Ok(Price::from_cents(700)));
        assert_eq!(Price::parse("0.5"), Ok(Price::from_cents(50)));
        assert_eq!(Price::parse(".5"), Ok(Price::from_cents(50)));
        assert_eq!(Price::parse("007.00"), Ok(Price::from_cents(700)));
        assert_eq!(Price::try_from(&json!(5.99)), Ok(Price::from_cents(599)));
        assert_eq!(Price::try_from(&json!(12)), Ok(Price::from_cents(1200)));
        assert_eq!(Price::try_from(&json!("999.99")), Ok(Price::from_cents(99999)));
    }

    #[test]
    fn price_rejects_out_of_range_values() {
        assert_eq!(Price::parse("-1.00"), Err(PriceError::Negative));
        assert_eq!(Price::parse("-0.00"), Ok(Price::from_cents(0)));
        assert_eq!(Price::parse("1.999"), Err(PriceError::TooManyDecimalPlaces));
        assert_eq!(Price::parse("1000"), Err(PriceError::TooManyWholeDigits));
        assert_eq!(Price::parse("abc"), Err(PriceError::Invalid));
        assert_eq!(Price::parse(""), Err(PriceError::Invalid));
        assert_eq!(Price::parse("."), Err(PriceError::Invalid));
        assert_eq!(Price::parse("1.2.3"), Err(PriceError::Invalid));
        assert_eq!(Price::try_from(&json!(true)), Err(PriceError::Invalid));
        assert_eq!(Price::try_from(&Value::Null), Err(PriceError::Invalid));
    }

    #[test]
    fn price_serializes_with_two_decimal_places() {
        assert_eq!(json!(Price::from_cents(525)), json!("5.25"));
        assert_eq!(json!(Price::from_cents(700)), json!("7.00"));
        assert_eq!(json!(Price::from_cents(5)), json!("0.05"));
    }

    #[test]
    fn recipe_detail_flattens_recipe_fields() {
        let row = RecipeRow {
            id: 3,
            user_id: 1,
            title: String::from("Eggs Benedict"),
            description: String::from("Poach the eggs"),
            time_minutes: 60,
            price_cents: 700,
            link: String::new(),
        };
        let tags = vec![Label {
            id: 1,
            name: String::from("Breakfast"),
        }];

        let value = serde_json::to_value(RecipeDetail::from_row(&row, tags, vec![])).unwrap();

        assert_eq!(
            value,
            json!({
                "id": 3,
                "title": "Eggs Benedict",
                "time_minutes": 60,
                "price": "7.00",
                "link": "",
                "tags": [{"id": 1, "name": "Breakfast"}],
                "ingredients": [],
                "description": "Poach the eggs",
            })
        );
        assert!(value.get("user_id").is_none());
    }

    #[test]
    fn user_profile_has_no_password() {
        let user = User {
            id: 1,
            email: String::from("test@example.com"),
            password: String::from("$argon2id$..."),
            name: String::from("Test Name"),
            is_active: true,
            is_staff: false,
            date_joined: Utc::now(),
        };

        let value = serde_json::to_value(UserProfile::from(&user)).unwrap();

        assert_eq!(
            value,
            json!({"id": 1, "email": "test@example.com", "name": "Test Name"})
        );
    }
}
