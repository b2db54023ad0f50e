//! Compatibility adapter for legacy production documents.
//!
//! # Responsibility
//! - Decode the historical document shape (Portuguese field and category
//!   names, boolean revision flag, ISO-8601 string timestamps).
//! - Map decoded documents onto the canonical `ProjectRecord` shape.
//!
//! # Invariants
//! - Conversion never fails: malformed or missing category data degrades to
//!   "not completed" instead of erroring.
//! - The completion engine only ever sees the canonical shape; all legacy
//!   knowledge stays inside this module.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::model::record::{CategoryState, ProjectRecord, RecordStatus};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;

static ISO_UTC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})(?:\.(\d{1,3}))?Z$")
        .expect("valid iso timestamp regex")
});

const LEGACY_FINALIZED: &str = "finalizado";
const LEGACY_REVISION_PHASE: &str = "revision";

/// Timestamp as stored by legacy writers: epoch millis or ISO-8601 text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LegacyTimestamp {
    Millis(i64),
    Text(String),
}

impl LegacyTimestamp {
    /// Resolves to epoch milliseconds, `None` when the text form is
    /// unparseable.
    pub fn epoch_ms(&self) -> Option<i64> {
        match self {
            Self::Millis(value) => Some(*value),
            Self::Text(value) => parse_iso_utc(value),
        }
    }
}

/// Category entry in a legacy document.
///
/// The dashboard era stored plain booleans; the manager era stored a state
/// object. Both decode here.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LegacyCategoryDoc {
    Flag(bool),
    State(LegacyCategoryState),
}

/// Manager-era category state object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyCategoryState {
    #[serde(default)]
    pub concluido: bool,
    #[serde(default)]
    pub observacoes: String,
    #[serde(default)]
    pub usuario: String,
    #[serde(default, rename = "dataAtualizacao")]
    pub data_atualizacao: Option<LegacyTimestamp>,
}

/// Top-level legacy production document.
///
/// Every field is optional; real stored documents miss most of them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyProjectDoc {
    pub project_number: Option<String>,
    pub plaza: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub status: Option<String>,
    /// Boolean revision marker, replaced by the free-text `phase` field.
    #[serde(alias = "revisao")]
    pub is_revision: Option<bool>,
    #[serde(alias = "fase")]
    pub phase: Option<String>,
    pub categories: Option<BTreeMap<String, LegacyCategoryDoc>>,
    pub points: Option<BTreeMap<String, u32>>,
    pub data_finalizacao: Option<LegacyTimestamp>,
    pub finalizado_automaticamente: Option<bool>,
}

impl LegacyProjectDoc {
    /// Converts the legacy document into a canonical record.
    ///
    /// # Contract
    /// - Missing category map means all categories incomplete.
    /// - Unknown status text maps to `InProgress`.
    /// - A finalized document without `dataFinalizacao` falls back to the
    ///   latest category update time, then to `0`, so the converted record
    ///   still satisfies shape validation.
    pub fn into_record(self) -> ProjectRecord {
        let owner = self
            .user_name
            .or(self.user_email)
            .unwrap_or_default();
        let mut record = ProjectRecord::new(
            self.project_number.unwrap_or_else(|| "N/A".to_string()),
            self.plaza.unwrap_or_else(|| "N/A".to_string()),
            owner,
        );

        record.phase = self.phase.or_else(|| {
            // Backfill rule mirrored by migration 0002_phase.sql.
            (self.is_revision == Some(true)).then(|| LEGACY_REVISION_PHASE.to_string())
        });

        if let Some(categories) = self.categories {
            for (key, doc) in categories {
                let name = canonical_category_name(&key);
                record.categories.insert(name, category_state_from_doc(doc));
            }
        }
        if let Some(points) = self.points {
            record.points = points;
        }

        if self.status.as_deref() == Some(LEGACY_FINALIZED) {
            let fallback = record
                .categories
                .values()
                .map(|state| state.updated_at)
                .max()
                .unwrap_or(0);
            record.status = RecordStatus::Finalized;
            record.finalized_at = Some(
                self.data_finalizacao
                    .and_then(|value| value.epoch_ms())
                    .unwrap_or(fallback),
            );
            record.finalized_automatically = self.finalizado_automaticamente.unwrap_or(false);
        }

        record
    }
}

/// Maps a legacy Portuguese category key to the canonical vocabulary.
///
/// Already-canonical and unknown keys pass through unchanged; unknown keys
/// are tolerated on read and ignored by scoring.
pub fn canonical_category_name(key: &str) -> String {
    match key {
        "luminotecnico" => "lighting".to_string(),
        "eletrico" => "electrical".to_string(),
        "planilhao" => "budget".to_string(),
        "croqui" => "sketch".to_string(),
        other => other.to_string(),
    }
}

fn category_state_from_doc(doc: LegacyCategoryDoc) -> CategoryState {
    match doc {
        LegacyCategoryDoc::Flag(completed) => CategoryState {
            completed,
            ..CategoryState::default()
        },
        LegacyCategoryDoc::State(state) => CategoryState {
            completed: state.concluido,
            notes: state.observacoes,
            updated_by: state.usuario,
            updated_at: state
                .data_atualizacao
                .and_then(|value| value.epoch_ms())
                .unwrap_or(0),
        },
    }
}

/// Parses a strict UTC ISO-8601 timestamp (`YYYY-MM-DDTHH:MM:SS[.fff]Z`)
/// into epoch milliseconds.
///
/// Returns `None` on any other shape; legacy callers degrade to `0` rather
/// than failing the whole document.
pub fn parse_iso_utc(value: &str) -> Option<i64> {
    let caps = ISO_UTC_RE.captures(value.trim())?;
    let field = |index: usize| caps.get(index).map(|m| m.as_str());

    let year: i64 = field(1)?.parse().ok()?;
    let month: i64 = field(2)?.parse().ok()?;
    let day: i64 = field(3)?.parse().ok()?;
    let hour: i64 = field(4)?.parse().ok()?;
    let minute: i64 = field(5)?.parse().ok()?;
    let second: i64 = field(6)?.parse().ok()?;
    let millis: i64 = match field(7) {
        Some(fraction) => format!("{fraction:0<3}").parse().ok()?,
        None => 0,
    };

    if !(1..=12).contains(&month)
        || !(1..=31).contains(&day)
        || hour > 23
        || minute > 59
        || second > 59
    {
        return None;
    }

    let days = days_from_civil(year, month, day);
    Some(((days * 86_400 + hour * 3_600 + minute * 60 + second) * 1_000) + millis)
}

// Howard Hinnant's days-from-civil algorithm; proleptic Gregorian calendar,
// day 0 is 1970-01-01.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = if month > 2 { month - 3 } else { month + 9 };
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}
