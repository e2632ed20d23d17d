//! The contact store: a vdir of vCard files.
//!
//! This is the I/O boundary around the planner. Records are snapshots of the
//! `N` property of each card; accepted proposals are written back as
//! `X-PHONETIC-FIRST-NAME` / `X-PHONETIC-LAST-NAME` extension properties and
//! the file is replaced atomically.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use thiserror::Error;
use vcard4::property::{AnyProperty, ExtensionProperty};
use vcard4::{parse, Vcard};

use crate::planner::{ChangeProposal, NameRecord};

pub const PHONETIC_GIVEN_PROP: &str = "X-PHONETIC-FIRST-NAME";
pub const PHONETIC_FAMILY_PROP: &str = "X-PHONETIC-LAST-NAME";

/// Errors at the store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Enumerating the record source failed; the whole batch is abandoned.
    #[error("failed to enumerate contacts in {}: {cause}", path.display())]
    Enumeration { path: PathBuf, cause: anyhow::Error },
    /// Writing one card file failed; sibling records are unaffected.
    #[error("failed to update {}: {cause}", path.display())]
    Persistence { path: PathBuf, cause: anyhow::Error },
}

/// Outcome of a best-effort commit.
#[derive(Debug, Default)]
pub struct CommitReport {
    pub updated: usize,
    pub failed: Vec<StoreError>,
}

/// Enumerate name records from every vCard file under `vdir`.
///
/// Each yielded item is either a record or an enumeration error; the planner
/// treats the first error as a whole-batch failure, so a broken file never
/// results in a silently partial scan.
pub fn fetch_candidate_records(vdir: &Path) -> Vec<Result<NameRecord>> {
    let mut files = match list_vcf_files(vdir) {
        Ok(files) => files,
        Err(err) => {
            return vec![Err(StoreError::Enumeration {
                path: vdir.to_path_buf(),
                cause: err,
            }
            .into())]
        }
    };
    files.sort();

    let mut records = Vec::new();
    for path in files {
        match read_cards(&path) {
            Ok(cards) => {
                for (idx, card) in cards.iter().enumerate() {
                    records.push(Ok(card_to_record(&path, idx, card)));
                }
            }
            Err(err) => records.push(Err(StoreError::Enumeration {
                path: path.clone(),
                cause: err,
            }
            .into())),
        }
    }
    records
}

/// Apply every selected proposal to its card file. Failures are collected
/// per file and do not stop the remaining files from being written.
pub fn commit(proposals: &[ChangeProposal]) -> CommitReport {
    let mut report = CommitReport::default();

    // Group selected proposals by file so each file is rewritten once.
    let mut by_file: BTreeMap<PathBuf, Vec<(usize, &ChangeProposal)>> = BTreeMap::new();
    for proposal in proposals.iter().filter(|p| p.selected) {
        match parse_record_id(&proposal.record_id) {
            Ok((path, idx)) => by_file.entry(path).or_default().push((idx, proposal)),
            Err(err) => report.failed.push(StoreError::Persistence {
                path: PathBuf::from(&proposal.record_id),
                cause: err,
            }),
        }
    }

    for (path, updates) in by_file {
        let count = updates.len();
        match commit_file(&path, &updates) {
            Ok(()) => report.updated += count,
            Err(err) => report.failed.push(StoreError::Persistence { path, cause: err }),
        }
    }
    report
}

fn commit_file(path: &Path, updates: &[(usize, &ChangeProposal)]) -> Result<()> {
    let mut cards = read_cards(path)?;
    for (idx, proposal) in updates {
        let card = cards
            .get_mut(*idx)
            .ok_or_else(|| anyhow!("card index {idx} out of range"))?;
        if let Some(value) = &proposal.phonetic_given_name {
            set_extension_text(card, PHONETIC_GIVEN_PROP, value);
        }
        if let Some(value) = &proposal.phonetic_family_name {
            set_extension_text(card, PHONETIC_FAMILY_PROP, value);
        }
    }
    write_cards(path, &cards)
}

fn card_to_record(path: &Path, idx: usize, card: &Vcard) -> NameRecord {
    NameRecord {
        id: record_id(path, idx),
        given_name: name_component(card, 1),
        family_name: name_component(card, 0),
        phonetic_given_name: extension_text(card, PHONETIC_GIVEN_PROP),
        phonetic_family_name: extension_text(card, PHONETIC_FAMILY_PROP),
    }
}

/// Record ids are `<path>#<card index>`; paths never contain `#` fragments
/// we generate, and the index is always the final fragment.
pub fn record_id(path: &Path, idx: usize) -> String {
    format!("{}#{idx}", path.display())
}

fn parse_record_id(id: &str) -> Result<(PathBuf, usize)> {
    let (path, idx) = id
        .rsplit_once('#')
        .ok_or_else(|| anyhow!("malformed record id: {id}"))?;
    let idx = idx
        .parse::<usize>()
        .with_context(|| format!("malformed record id: {id}"))?;
    Ok((PathBuf::from(path), idx))
}

/// N is family;given;middle;prefix;suffix. Missing components are empty.
fn name_component(card: &Vcard, idx: usize) -> String {
    card.name
        .as_ref()
        .and_then(|n| n.value.get(idx))
        .cloned()
        .unwrap_or_default()
}

fn extension_text(card: &Vcard, name: &str) -> Option<String> {
    card.extensions
        .iter()
        .find(|ext| ext.name.eq_ignore_ascii_case(name))
        .and_then(|ext| match &ext.value {
            AnyProperty::Text(text) => Some(text.clone()),
            _ => None,
        })
}

fn set_extension_text(card: &mut Vcard, name: &str, value: &str) {
    let existing = card
        .extensions
        .iter_mut()
        .find(|ext| ext.name.eq_ignore_ascii_case(name));
    match existing {
        Some(ext) => ext.value = AnyProperty::Text(value.to_string()),
        None => card.extensions.push(ExtensionProperty {
            group: None,
            name: name.to_string(),
            value: AnyProperty::Text(value.to_string()),
            parameters: None,
        }),
    }
}

fn read_cards(path: &Path) -> Result<Vec<Vcard>> {
    let input = fs::read_to_string(path)
        .with_context(|| format!("failed to read vCard file at {}", path.display()))?;
    parse(&input)
        .map_err(|err| anyhow!(err))
        .with_context(|| format!("parsing vCard data in {}", path.display()))
}

fn write_cards(path: &Path, cards: &[Vcard]) -> Result<()> {
    let mut output = String::new();
    for (idx, card) in cards.iter().enumerate() {
        if idx > 0 {
            output.push_str("\r\n");
        }
        let mut card_text = card.to_string();
        if !card_text.ends_with("\r\n") {
            card_text.push_str("\r\n");
        }
        output.push_str(&card_text);
    }
    write_atomic(path, output.as_bytes())
}

pub fn list_vcf_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_vcf(root, &mut files)?;
    Ok(files)
}

fn collect_vcf(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to read directory {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_vcf(&path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("vcf"))
            .unwrap_or(false)
        {
            files.push(path);
        }
    }
    Ok(())
}

fn write_atomic(target: &Path, data: &[u8]) -> Result<()> {
    let parent = target
        .parent()
        .ok_or_else(|| anyhow!("target path has no parent: {}", target.display()))?;

    let temp_name = target
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| format!(".{name}.tmp"))
        .unwrap_or_else(|| ".pinbook.tmp".to_string());
    let temp_path = parent.join(temp_name);

    fs::write(&temp_path, data)
        .with_context(|| format!("failed to write temp file {}", temp_path.display()))?;
    fs::rename(&temp_path, target)
        .with_context(|| format!("failed to replace {}", target.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner;
    use tempfile::TempDir;

    const CARD: &str = "BEGIN:VCARD\r\nVERSION:4.0\r\nFN:王 伟\r\nN:王;伟;;;\r\nEND:VCARD\r\n";

    #[test]
    fn test_fetch_reads_name_components() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wang.vcf");
        fs::write(&path, CARD).unwrap();

        let records = fetch_candidate_records(dir.path());
        assert_eq!(records.len(), 1);
        let record = records[0].as_ref().unwrap();
        assert_eq!(record.family_name, "王");
        assert_eq!(record.given_name, "伟");
        assert_eq!(record.id, record_id(&path, 0));
        assert!(record.phonetic_given_name.is_none());
    }

    #[test]
    fn test_fetch_surfaces_unparseable_file_as_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.vcf"), "not a vcard").unwrap();

        let records = fetch_candidate_records(dir.path());
        assert_eq!(records.len(), 1);
        assert!(records[0].is_err());
    }

    #[test]
    fn test_commit_writes_phonetic_extensions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wang.vcf");
        fs::write(&path, CARD).unwrap();

        let records = fetch_candidate_records(dir.path());
        let proposals = planner::plan_updates(records, false).unwrap();
        let report = commit(&proposals);
        assert_eq!(report.updated, 1);
        assert!(report.failed.is_empty());

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("X-PHONETIC-FIRST-NAME:wěi"));
        assert!(written.contains("X-PHONETIC-LAST-NAME:wáng"));
        // Original name untouched
        assert!(written.contains("N:王;伟;;;"));
    }

    #[test]
    fn test_commit_skips_deselected_proposals() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wang.vcf");
        fs::write(&path, CARD).unwrap();

        let records = fetch_candidate_records(dir.path());
        let mut proposals = planner::plan_updates(records, false).unwrap();
        proposals[0].selected = false;

        let report = commit(&proposals);
        assert_eq!(report.updated, 0);
        let written = fs::read_to_string(&path).unwrap();
        assert!(!written.contains("X-PHONETIC-FIRST-NAME"));
    }

    #[test]
    fn test_commit_failure_is_per_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wang.vcf");
        fs::write(&path, CARD).unwrap();

        let records = fetch_candidate_records(dir.path());
        let mut proposals = planner::plan_updates(records, false).unwrap();
        // A proposal pointing at a missing file fails alone
        proposals.push(ChangeProposal {
            record_id: record_id(&dir.path().join("gone.vcf"), 0),
            phonetic_given_name: Some("wěi".to_string()),
            phonetic_family_name: None,
            selected: true,
        });

        let report = commit(&proposals);
        assert_eq!(report.updated, 1);
        assert_eq!(report.failed.len(), 1);
    }

    #[test]
    fn test_recommit_overwrites_existing_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wang.vcf");
        fs::write(&path, CARD).unwrap();

        let records = fetch_candidate_records(dir.path());
        let proposals = planner::plan_updates(records, false).unwrap();
        commit(&proposals);

        // Second run with tone stripping replaces the values in place
        let records = fetch_candidate_records(dir.path());
        let proposals = planner::plan_updates(records, true).unwrap();
        commit(&proposals);

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("X-PHONETIC-FIRST-NAME:wei"));
        assert!(!written.contains("wěi"));
        assert_eq!(written.matches("X-PHONETIC-FIRST-NAME").count(), 1);
    }
}
