//! Cross-source deduplication keyed by canonical phone.
//!
//! Candidate lists are folded in the order given; callers fix that order
//! (the import pipeline passes the message backup before the tabular file),
//! and it decides ties in the name preference rule.

use crate::domain::{choose_name, CanonicalPhone, ContactCandidate, MergedContact, NamePick};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Per input list: contacts whose every candidate came from that list.
    pub exclusive: Vec<usize>,
    /// Contacts with candidates from two or more lists.
    pub merged: usize,
    pub total: usize,
}

impl MergeStats {
    pub fn exclusive_to(&self, list: usize) -> usize {
        self.exclusive.get(list).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// One entry per distinct canonical phone, in first-seen order.
    pub contacts: Vec<MergedContact>,
    pub stats: MergeStats,
}

pub fn merge_candidates(lists: &[Vec<ContactCandidate>]) -> MergeOutcome {
    let mut positions: HashMap<CanonicalPhone, usize> = HashMap::new();
    let mut contacts: Vec<MergedContact> = Vec::new();
    let mut contributors: Vec<BTreeSet<usize>> = Vec::new();

    for (list_index, list) in lists.iter().enumerate() {
        for candidate in list {
            match positions.get(&candidate.phone) {
                Some(&position) => {
                    absorb(&mut contacts[position], candidate);
                    contributors[position].insert(list_index);
                }
                None => {
                    positions.insert(candidate.phone.clone(), contacts.len());
                    contacts.push(MergedContact::from_candidate(candidate));
                    contributors.push(BTreeSet::from([list_index]));
                }
            }
        }
    }

    let mut exclusive = vec![0; lists.len()];
    let mut merged = 0;
    for lists_seen in &contributors {
        if lists_seen.len() > 1 {
            merged += 1;
        } else if let Some(&only) = lists_seen.iter().next() {
            exclusive[only] += 1;
        }
    }

    let total = contacts.len();
    MergeOutcome {
        contacts,
        stats: MergeStats {
            exclusive,
            merged,
            total,
        },
    }
}

/// Folds one more candidate into an existing merged contact.
pub fn absorb(target: &mut MergedContact, candidate: &ContactCandidate) {
    if choose_name(&target.display_name, &candidate.display_name) == NamePick::Incoming {
        target.display_name = candidate.display_name.clone();
    }

    fill_if_empty(&mut target.email, candidate.email.as_deref());
    fill_if_empty(&mut target.address, candidate.address.as_deref());

    if !target.sources.iter().any(|source| source == &candidate.source) {
        target.sources.push(candidate.source.clone());
    }

    if target.message_count == 0 {
        target.message_count = candidate.message_count;
    }

    target.first_seen_at = earliest(target.first_seen_at, candidate.first_seen_at);
    target.last_seen_at = latest(target.last_seen_at, candidate.last_seen_at);
}

fn fill_if_empty(slot: &mut Option<String>, incoming: Option<&str>) {
    let occupied = slot.as_deref().is_some_and(|value| !value.trim().is_empty());
    if occupied {
        return;
    }
    if let Some(value) = incoming.map(str::trim).filter(|value| !value.is_empty()) {
        *slot = Some(value.to_string());
    }
}

fn earliest(left: Option<i64>, right: Option<i64>) -> Option<i64> {
    match (left, right) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn latest(left: Option<i64>, right: Option<i64>) -> Option<i64> {
    match (left, right) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}
