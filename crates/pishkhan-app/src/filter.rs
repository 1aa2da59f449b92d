// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{EntityKind, Field, Record};

/// Categorical value meaning "no constraint on this field".
pub const ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub search_term: String,
    pub categorical: BTreeMap<Field, String>,
}

impl FilterState {
    pub fn category(&self, field: Field) -> &str {
        self.categorical.get(&field).map_or(ALL, String::as_str)
    }

    pub fn set_category(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        if value == ALL {
            self.categorical.remove(&field);
        } else {
            self.categorical.insert(field, value);
        }
    }

    pub fn clear(&mut self) {
        self.search_term.clear();
        self.categorical.clear();
    }

    pub fn is_active(&self) -> bool {
        !self.search_term.trim().is_empty()
            || self.categorical.values().any(|value| value != ALL)
    }
}

/// Which fields a list view searches and which it offers as categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterEngine {
    search_fields: Vec<Field>,
    category_fields: Vec<Field>,
}

impl FilterEngine {
    pub fn new(search_fields: Vec<Field>, category_fields: Vec<Field>) -> Self {
        Self {
            search_fields,
            category_fields,
        }
    }

    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Workspace => Self::new(
                vec![Field::Name, Field::Description, Field::Tags],
                vec![Field::Plan, Field::Role],
            ),
            EntityKind::Project => Self::new(
                vec![Field::Name, Field::Description, Field::Tags],
                vec![Field::Status],
            ),
            EntityKind::Integration => Self::new(
                vec![Field::Name, Field::Description, Field::Provider],
                vec![Field::Status, Field::Provider],
            ),
        }
    }

    pub fn search_fields(&self) -> &[Field] {
        &self.search_fields
    }

    pub fn category_fields(&self) -> &[Field] {
        &self.category_fields
    }

    /// Records passing the text search and every active categorical filter,
    /// in input order.
    pub fn apply<'a, I>(&self, records: I, state: &FilterState) -> Vec<&'a Record>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let needle = state.search_term.trim().to_lowercase();
        records
            .into_iter()
            .filter(|record| self.matches_search(record, &needle))
            .filter(|record| matches_categories(record, state))
            .collect()
    }

    fn matches_search(&self, record: &Record, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.search_fields.iter().any(|field| {
            record.any_text(*field, |value| value.to_lowercase().contains(needle))
        })
    }

    /// Distinct values present for `field`, in first-seen order, with the
    /// `all` sentinel first. Used to cycle a categorical filter.
    pub fn category_options<'a, I>(&self, records: I, field: Field) -> Vec<String>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut options = vec![ALL.to_owned()];
        for record in records {
            if let Some(value) = record.category_value(field)
                && !options.iter().any(|option| option == value)
            {
                options.push(value.to_owned());
            }
        }
        options
    }
}

fn matches_categories(record: &Record, state: &FilterState) -> bool {
    state
        .categorical
        .iter()
        .filter(|(_, wanted)| wanted.as_str() != ALL)
        .all(|(field, wanted)| record.category_value(*field) == Some(wanted.as_str()))
}
