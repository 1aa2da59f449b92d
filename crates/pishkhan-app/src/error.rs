// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

use crate::{EntityKind, RecordId};

/// Failures the engines surface to the page that owns them. None of these
/// are fatal; pages recover by notifying and, for `NotFound`, redirecting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{field} is required")]
    Validation { field: &'static str },

    #[error("confirmation failed: {0}")]
    Transport(String),

    #[error("{} {id} not found", kind.as_str())]
    NotFound { kind: EntityKind, id: RecordId },

    #[error("record {0} already has a change in flight")]
    Busy(RecordId),

    #[error("deleting a record requires explicit confirmation")]
    Unconfirmed,
}

impl EngineError {
    /// Persian message for the status line.
    pub fn notice(&self) -> String {
        match self {
            Self::Validation { field } => format!("فیلد «{field}» الزامی است"),
            Self::Transport(_) => "عملیات ناموفق بود؛ تغییرات بازگردانده شد".to_owned(),
            Self::NotFound { kind, .. } => format!("{} مورد نظر یافت نشد", kind.label()),
            Self::Busy(_) => "تغییر قبلی هنوز در حال انجام است".to_owned(),
            Self::Unconfirmed => "حذف بدون تأیید انجام نمی‌شود".to_owned(),
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
