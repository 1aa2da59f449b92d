// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::{DeviceClass, ViewportFacts};

pub const DEFAULT_FALLBACK_PAGE_SIZE: usize = 6;

/// Layout constants for a card grid, in the viewport's unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub reserved_height: u32,
    pub row_height: u32,
    pub columns_when_wide: usize,
    pub fallback_page_size: usize,
}

impl GridLayout {
    pub const CELLS: Self = Self {
        reserved_height: 8,
        row_height: 6,
        columns_when_wide: 3,
        fallback_page_size: DEFAULT_FALLBACK_PAGE_SIZE,
    };
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::CELLS
    }
}

/// Items per page for the given viewport. Never less than one.
pub fn compute_page_size(viewport: &ViewportFacts, layout: &GridLayout) -> usize {
    if !viewport.is_desktop {
        return layout.fallback_page_size.max(1);
    }
    rows_that_fit(viewport.height, layout) * layout.columns_when_wide.max(1)
}

pub fn items_per_row(viewport: &ViewportFacts, layout: &GridLayout) -> usize {
    match viewport.device {
        DeviceClass::Mobile => 1,
        DeviceClass::Tablet => layout.columns_when_wide.clamp(1, 2),
        DeviceClass::Desktop | DeviceClass::LargeDisplay => layout.columns_when_wide.max(1),
    }
}

fn rows_that_fit(height: u32, layout: &GridLayout) -> usize {
    let available = i64::from(height) - i64::from(layout.reserved_height);
    let rows = available.div_euclid(i64::from(layout.row_height.max(1)));
    usize::try_from(rows.max(1)).unwrap_or(1)
}
