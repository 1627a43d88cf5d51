//! Copying an entity from one locale to others.

use crate::rows::{Row, exact_row, format_key, upsert_row};
use crate::{L10nError, L10nResult};
use polyglot_db::{Connection, with_savepoint};
use polyglot_model::{LANGUAGE_CODE_COLUMN, ModelMeta};
use polyglot_types::LanguageCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

const LOCALIZE_SAVEPOINT: &str = "polyglot_localize";

/// Source locale and target locales of a localize operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizeRequest {
    pub from: LanguageCode,
    pub to: BTreeSet<LanguageCode>,
}

impl LocalizeRequest {
    pub fn new(from: LanguageCode, to: impl IntoIterator<Item = LanguageCode>) -> Self {
        Self {
            from,
            to: to.into_iter().collect(),
        }
    }
}

/// Copies each key's `from` row to every target locale.
///
/// Each (key, target) pair is written in its own savepoint. The first
/// failure stops the loop; pairs already written stay written. Existing
/// target rows are overwritten, so repeating a request is a no-op.
pub(crate) fn localize(
    conn: &Connection,
    meta: &ModelMeta,
    keys: &[Vec<Value>],
    request: &LocalizeRequest,
) -> L10nResult<usize> {
    if !meta.is_localizable() {
        warn!(
            entity = meta.entity_type(),
            "localize requested for an entity that is not localizable"
        );
        return Ok(0);
    }

    let mut written = 0;
    for key in keys {
        let source = exact_row(conn, meta, key, &request.from)?.ok_or_else(|| {
            L10nError::NotFound {
                entity_type: meta.entity_type().to_string(),
                key: format_key(key),
                locale: request.from.clone(),
            }
        })?;

        for target in &request.to {
            if *target == request.from {
                debug!(entity = meta.entity_type(), locale = %target, "skipping copy onto source locale");
                continue;
            }
            let row = localized_copy(&source, target);
            with_savepoint(conn, LOCALIZE_SAVEPOINT, |conn| upsert_row(conn, meta, &row))?;
            written += 1;
        }
    }

    info!(
        entity = meta.entity_type(),
        from = %request.from,
        targets = request.to.len(),
        keys = keys.len(),
        written,
        "localized rows"
    );
    Ok(written)
}

fn localized_copy(source: &Row, target: &LanguageCode) -> Row {
    let mut row = source.clone();
    row.insert(LANGUAGE_CODE_COLUMN.into(), Value::from(target.as_str()));
    row
}
