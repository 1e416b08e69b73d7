use std::collections::HashMap;

use crate::{
    error::ApiError,
    schema::{Id, LabelKind},
};

pub type QueryParams = HashMap<String, String>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelFilters {
    /// Only labels linked to at least one of the owner's recipes.
    pub assigned_only: bool,
}

impl LabelFilters {
    pub fn from_query(query: &QueryParams) -> Result<Self, ApiError> {
        let assigned_only = match query.get("assigned_only").map(|v| v.trim()) {
            None | Some("") => false,
            Some(value) => value
                .parse::<i64>()
                .map(|v| v != 0)
                .map_err(|_| ApiError::field("assigned_only", "A valid integer is required."))?,
        };

        Ok(Self { assigned_only })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilters {
    pub tags: Option<Vec<Id>>,
    pub ingredients: Option<Vec<Id>>,
}

impl RecipeFilters {
    pub fn from_query(query: &QueryParams) -> Result<Self, ApiError> {
        Ok(Self {
            tags: parse_ids(query, LabelKind::Tag.field())?,
            ingredients: parse_ids(query, LabelKind::Ingredient.field())?,
        })
    }
}

/// Parses `?key=1,2,3`. An absent or empty parameter means no filter.
fn parse_ids(query: &QueryParams, key: &str) -> Result<Option<Vec<Id>>, ApiError> {
    let raw = match query.get(key).map(|v| v.trim()) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };

    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<Id>().map_err(|_| {
                ApiError::field(key, "Expected a comma separated list of integer ids.")
            })
        })
        .collect::<Result<Vec<Id>, ApiError>>()
        .map(|ids| (!ids.is_empty()).then_some(ids))
}
