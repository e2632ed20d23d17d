//! Batch planning of phonetic-name updates.
//!
//! The planner walks a batch of name records, decides per record whether the
//! given and/or family name needs a phonetic reading, and emits one change
//! proposal per record that does. It performs no I/O; fetching records and
//! committing accepted proposals belong to the contact store.

use anyhow::Result;

use crate::surname;
use crate::translit;

/// Snapshot of one contact's name fields, owned by the contact store.
#[derive(Debug, Clone)]
pub struct NameRecord {
    pub id: String,
    pub given_name: String,
    pub family_name: String,
    pub phonetic_given_name: Option<String>,
    pub phonetic_family_name: Option<String>,
}

/// A proposed phonetic-name change for one record. Carries only the fields
/// that actually changed; `selected` defaults to true and may be toggled by
/// a review step before commit.
#[derive(Debug, Clone)]
pub struct ChangeProposal {
    pub record_id: String,
    pub phonetic_given_name: Option<String>,
    pub phonetic_family_name: Option<String>,
    pub selected: bool,
}

/// Plan phonetic-name updates for a batch of records.
///
/// Given names go through the base transliterator, family names through the
/// surname resolver. With `strip_tones` set, tone diacritics are removed
/// from the computed values. Records whose name fields contain no Han
/// characters produce no proposal. Output preserves input order.
///
/// An existing phonetic value does not exempt a field: readings are
/// recomputed whenever the source field is eligible.
///
/// If the record source yields an error, planning aborts with that error and
/// no partial batch is returned.
pub fn plan_updates<I>(records: I, strip_tones: bool) -> Result<Vec<ChangeProposal>>
where
    I: IntoIterator<Item = Result<NameRecord>>,
{
    let mut proposals = Vec::new();
    for record in records {
        let record = record?;
        if let Some(proposal) = plan_record(&record, strip_tones) {
            proposals.push(proposal);
        }
    }
    Ok(proposals)
}

fn plan_record(record: &NameRecord, strip_tones: bool) -> Option<ChangeProposal> {
    let post = |reading: String| {
        if strip_tones {
            translit::strip_tones(&reading)
        } else {
            reading
        }
    };

    let given = translit::contains_han(&record.given_name)
        .then(|| post(translit::to_latin(&record.given_name)));
    let family = translit::contains_han(&record.family_name)
        .then(|| post(surname::resolve_family_name(&record.family_name)));

    if given.is_none() && family.is_none() {
        return None;
    }

    Some(ChangeProposal {
        record_id: record.id.clone(),
        phonetic_given_name: given,
        phonetic_family_name: family,
        selected: true,
    })
}
