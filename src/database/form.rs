use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

use serde::Serialize;
use serde_json::Value;

use crate::{
    constants::{MAX_FIELD_LENGTH, MIN_PASSWORD_LENGTH},
    error::ApiError,
    schema::{Id, LabelKind, Price},
};

pub type FormData = HashMap<String, Value>;

const REQUIRED: &str = "This field is required.";

/// Messages collected per field, rendered as `{"field": ["message", ...]}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, messages)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

/// Rules for a string field.
#[derive(Debug, Clone, Copy)]
pub struct Text {
    required: bool,
    allow_blank: bool,
    trim: bool,
    min_length: usize,
    max_length: Option<usize>,
}

impl Text {
    pub const fn required() -> Self {
        Self {
            required: true,
            allow_blank: false,
            trim: true,
            min_length: 0,
            max_length: Some(MAX_FIELD_LENGTH),
        }
    }

    pub const fn optional() -> Self {
        Self {
            required: false,
            ..Self::required()
        }
    }

    pub const fn required_if(required: bool) -> Self {
        Self {
            required,
            ..Self::required()
        }
    }

    pub const fn blank(self) -> Self {
        Self {
            allow_blank: true,
            ..self
        }
    }

    pub const fn untrimmed(self) -> Self {
        Self { trim: false, ..self }
    }

    pub const fn min_length(self, min_length: usize) -> Self {
        Self { min_length, ..self }
    }

    pub const fn unbounded(self) -> Self {
        Self {
            max_length: None,
            ..self
        }
    }
}

/// A label reference inside a recipe payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelRef {
    Id(Id),
    Name(String),
}

/// Field-by-field reader over a JSON object. Every getter records its own
/// errors, so one pass reports every bad field at once; `finish` turns the
/// collected errors into an [`ApiError::Validation`].
pub struct Form {
    inner: FormData,
    errors: ValidationErrors,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self {
            inner: data,
            errors: ValidationErrors::default(),
        }
    }

    pub fn error(&mut self, key: &str, message: impl Into<String>) {
        self.errors.add(key, message);
    }

    pub fn get_str(&mut self, key: &str, rules: Text) -> Option<String> {
        let value = match self.inner.get(key).cloned() {
            Some(Value::Null) => {
                self.error(key, "This field may not be null.");
                return None;
            }
            Some(Value::String(value)) => value,
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => {
                self.error(key, "Not a valid string.");
                return None;
            }
            None => {
                if rules.required {
                    self.error(key, REQUIRED);
                }
                return None;
            }
        };

        self.check_str(key, value, rules)
    }

    fn check_str(&mut self, key: &str, value: String, rules: Text) -> Option<String> {
        let value = if rules.trim {
            value.trim().to_owned()
        } else {
            value
        };
        let length = value.chars().count();

        if value.is_empty() && !rules.allow_blank {
            self.error(key, "This field may not be blank.");
            return None;
        }
        if let Some(max_length) = rules.max_length {
            if length > max_length {
                self.error(
                    key,
                    format!("Ensure this field has no more than {max_length} characters."),
                );
                return None;
            }
        }
        if !value.is_empty() && length < rules.min_length {
            self.error(
                key,
                format!(
                    "Ensure this field has at least {} characters.",
                    rules.min_length
                ),
            );
            return None;
        }

        Some(value)
    }

    /// Reads a non-negative integer. Numeric strings are accepted.
    pub fn get_number(&mut self, key: &str, required: bool) -> Option<i32> {
        let parsed = match self.inner.get(key).cloned() {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            Some(Value::Null) => {
                self.error(key, "This field may not be null.");
                return None;
            }
            Some(_) => None,
            None => {
                if required {
                    self.error(key, REQUIRED);
                }
                return None;
            }
        };

        match parsed {
            Some(n) if n < 0 => {
                self.error(key, "Ensure this value is greater than or equal to 0.");
                None
            }
            Some(n) => match i32::try_from(n) {
                Ok(n) => Some(n),
                Err(_) => {
                    self.error(
                        key,
                        format!("Ensure this value is less than or equal to {}.", i32::MAX),
                    );
                    None
                }
            },
            None => {
                self.error(key, "A valid integer is required.");
                None
            }
        }
    }

    pub fn get_price(&mut self, key: &str, required: bool) -> Option<Price> {
        match self.inner.get(key).cloned() {
            Some(Value::Null) => {
                self.error(key, "This field may not be null.");
                None
            }
            Some(value) => match Price::try_from(&value) {
                Ok(price) => Some(price),
                Err(e) => {
                    self.error(key, e.to_string());
                    None
                }
            },
            None => {
                if required {
                    self.error(key, REQUIRED);
                }
                None
            }
        }
    }

    /// Reads a list of `{"id": n}` / `{"name": "..."}` objects.
    pub fn get_labels(&mut self, key: &str) -> Option<Vec<LabelRef>> {
        let items = match self.inner.get(key).cloned() {
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.error(
                    key,
                    format!(
                        "Expected a list of items but got type \"{}\".",
                        json_type(&other)
                    ),
                );
                return None;
            }
            None => return None,
        };

        let mut refs = Vec::with_capacity(items.len());
        let mut valid = true;

        for (i, item) in items.iter().enumerate() {
            match parse_label_ref(item) {
                Ok(label) => refs.push(label),
                Err(message) => {
                    self.error(key, format!("Item {i}: {message}"));
                    valid = false;
                }
            }
        }

        valid.then_some(refs)
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

fn parse_label_ref(item: &Value) -> Result<LabelRef, String> {
    let object = match item.as_object() {
        Some(object) => object,
        None => return Err(String::from("Expected an object with an \"id\" or a \"name\".")),
    };

    match (object.get("id"), object.get("name")) {
        (Some(id), _) if !id.is_null() => id
            .as_i64()
            .and_then(|id| Id::try_from(id).ok())
            .map(LabelRef::Id)
            .ok_or_else(|| String::from("Incorrect type. Expected pk value.")),
        (_, Some(Value::String(name))) => {
            let name = name.trim();
            if name.is_empty() {
                Err(String::from("Name may not be blank."))
            } else if name.chars().count() > MAX_FIELD_LENGTH {
                Err(format!(
                    "Ensure name has no more than {MAX_FIELD_LENGTH} characters."
                ))
            } else {
                Ok(LabelRef::Name(name.to_owned()))
            }
        }
        _ => Err(String::from("Expected an object with an \"id\" or a \"name\".")),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Normalises an address the way accounts are stored: surrounding whitespace
/// removed and the domain part lower-cased. The local part keeps its case.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_owned(),
    }
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn get_email(form: &mut Form, required: bool) -> Option<String> {
    let email = form.get_str("email", Text::required_if(required))?;
    if !is_valid_email(&email) {
        form.error("email", "Enter a valid email address.");
        return None;
    }
    Some(normalize_email(&email))
}

fn get_password(form: &mut Form, required: bool) -> Option<String> {
    form.get_str(
        "password",
        Text::required_if(required)
            .untrimmed()
            .unbounded()
            .min_length(MIN_PASSWORD_LENGTH),
    )
}

/// Fields accepted by registration and profile updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl UserChanges {
    pub fn parse(data: FormData, partial: bool) -> Result<Self, ApiError> {
        let mut form = Form::from_data(data);
        let required = !partial;

        let changes = Self {
            email: get_email(&mut form, required),
            password: get_password(&mut form, required),
            name: form.get_str("name", Text::required_if(required)),
        };

        form.finish()?;
        Ok(changes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl TryFrom<UserChanges> for NewUser {
    type Error = ApiError;

    fn try_from(value: UserChanges) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::default();
        for (field, present) in [
            ("email", value.email.is_some()),
            ("password", value.password.is_some()),
            ("name", value.name.is_some()),
        ] {
            if !present {
                errors.add(field, REQUIRED);
            }
        }

        match (value.email, value.password, value.name) {
            (Some(email), Some(password), Some(name)) => Ok(Self {
                email,
                password,
                name,
            }),
            _ => Err(ApiError::Validation(errors)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn parse(data: FormData) -> Result<Self, ApiError> {
        let mut form = Form::from_data(data);
        let email = form.get_str("email", Text::required());
        let password = form.get_str("password", Text::required().untrimmed().unbounded());
        form.finish()?;

        match (email, password) {
            (Some(email), Some(password)) => Ok(Self {
                email: normalize_email(&email),
                password,
            }),
            _ => Err(ApiError::InvalidCredentials),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelChanges {
    pub name: Option<String>,
}

impl LabelChanges {
    pub fn parse(data: FormData, partial: bool) -> Result<Self, ApiError> {
        let mut form = Form::from_data(data);
        let name = form.get_str("name", Text::required_if(!partial));
        form.finish()?;

        Ok(Self { name })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLabel {
    pub name: String,
}

impl TryFrom<LabelChanges> for NewLabel {
    type Error = ApiError;

    fn try_from(value: LabelChanges) -> Result<Self, Self::Error> {
        match value.name {
            Some(name) => Ok(Self { name }),
            None => Err(ApiError::field("name", REQUIRED)),
        }
    }
}

/// A recipe payload. With `partial` every field is optional (PATCH);
/// otherwise `title`, `time_minutes` and `price` must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Price>,
    pub link: Option<String>,
    pub tags: Option<Vec<LabelRef>>,
    pub ingredients: Option<Vec<LabelRef>>,
}

impl RecipeChanges {
    pub fn parse(data: FormData, partial: bool) -> Result<Self, ApiError> {
        let mut form = Form::from_data(data);
        let required = !partial;

        let changes = Self {
            title: form.get_str("title", Text::required_if(required)),
            description: form.get_str("description", Text::optional().blank().unbounded()),
            time_minutes: form.get_number("time_minutes", required),
            price: form.get_price("price", required),
            link: form.get_str("link", Text::optional().blank()),
            tags: form.get_labels(LabelKind::Tag.field()),
            ingredients: form.get_labels(LabelKind::Ingredient.field()),
        };

        form.finish()?;
        Ok(changes)
    }

    pub fn labels(&self, kind: LabelKind) -> Option<&[LabelRef]> {
        match kind {
            LabelKind::Tag => self.tags.as_deref(),
            LabelKind::Ingredient => self.ingredients.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub title: String,
    pub description: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: String,
    pub tags: Vec<LabelRef>,
    pub ingredients: Vec<LabelRef>,
}

impl NewRecipe {
    pub fn labels(&self, kind: LabelKind) -> &[LabelRef] {
        match kind {
            LabelKind::Tag => &self.tags,
            LabelKind::Ingredient => &self.ingredients,
        }
    }
}

impl TryFrom<RecipeChanges> for NewRecipe {
    type Error = ApiError;

    fn try_from(value: RecipeChanges) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::default();
        for (field, present) in [
            ("title", value.title.is_some()),
            ("time_minutes", value.time_minutes.is_some()),
            ("price", value.price.is_some()),
        ] {
            if !present {
                errors.add(field, REQUIRED);
            }
        }

        match (value.title, value.time_minutes, value.price) {
            (Some(title), Some(time_minutes), Some(price)) => Ok(Self {
                title,
                description: value.description.unwrap_or_default(),
                time_minutes,
                price,
                link: value.link.unwrap_or_default(),
                tags: value.tags.unwrap_or_default(),
                ingredients: value.ingredients.unwrap_or_default(),
            }),
            _ => Err(ApiError::Validation(errors)),
        }
    }
}
