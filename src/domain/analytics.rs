use std::collections::HashMap;

use itertools::Itertools as _;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::backend::ticket::{Area, Kind, Status, Ticket};

/// Conjunctive created-at filter: every selected bucket must hold.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Period {
    pub year: Option<i32>,
    /// 1 = Jan–Jun, 2 = Jul–Dec.
    pub semester: Option<u8>,
    /// 1–4.
    pub quarter: Option<u8>,
    /// 1–12.
    pub month: Option<u8>,
}

impl Period {
    pub fn contains(&self, at: OffsetDateTime) -> bool {
        let month = u8::from(at.month());

        if self.year.is_some_and(|y| at.year() != y) {
            return false;
        }
        if self
            .semester
            .is_some_and(|s| (if month <= 6 { 1 } else { 2 }) != s)
        {
            return false;
        }
        if self.quarter.is_some_and(|q| (month + 2) / 3 != q) {
            return false;
        }
        if self.month.is_some_and(|m| month != m) {
            return false;
        }
        true
    }

    pub fn filter(&self, tickets: Vec<Ticket>) -> Vec<Ticket> {
        tickets
            .into_iter()
            .filter(|t| self.contains(t.created_at))
            .collect()
    }
}

/// Error-kind ticket counts per area. Every known area is present, zero
/// counts included, sorted by descending count.
pub fn errors_by_area(tickets: &[Ticket]) -> Vec<(Area, usize)> {
    let mut counts: Vec<(Area, usize)> =
        Area::ALL.into_iter().map(|a| (a, 0)).collect();

    for ticket in tickets.iter().filter(|t| t.kind == Kind::Error) {
        if let Some((_, count)) =
            counts.iter_mut().find(|(a, _)| *a == ticket.area)
        {
            *count += 1;
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// For each area with tickets, the kind with the highest count there;
/// areas ranked by that top count, descending.
pub fn top_kind_by_area(tickets: &[Ticket]) -> Vec<(Area, Kind, usize)> {
    let mut matrix: HashMap<Area, HashMap<Kind, usize>> = HashMap::new();
    for ticket in tickets {
        *matrix
            .entry(ticket.area)
            .or_default()
            .entry(ticket.kind)
            .or_default() += 1;
    }

    let mut results: Vec<(Area, Kind, usize)> = Area::ALL
        .into_iter()
        .filter_map(|area| {
            let kinds = matrix.get(&area)?;
            // Iterate kinds in declaration order so ties resolve to the
            // first kind.
            let mut best: Option<(Kind, usize)> = None;
            for kind in Kind::ALL {
                if let Some(&count) = kinds.get(&kind) {
                    if best.map_or(true, |(_, c)| count > c) {
                        best = Some((kind, count));
                    }
                }
            }
            let (kind, count) = best?;
            Some((area, kind, count))
        })
        .collect();

    results.sort_by(|a, b| b.2.cmp(&a.2));
    results
}

/// Resolved share of the ticket set as a one-decimal percent string.
pub fn resolution_rate(tickets: &[Ticket]) -> String {
    if tickets.is_empty() {
        return "0.0".to_string();
    }
    let resolved = tickets
        .iter()
        .filter(|t| t.status == Status::Resolved)
        .count();
    format!("{:.1}", resolved as f64 / tickets.len() as f64 * 100.0)
}

/// Distinct years present in the data, newest first.
pub fn years(tickets: &[Ticket]) -> Vec<i32> {
    tickets
        .iter()
        .map(|t| t.created_at.year())
        .unique()
        .sorted_by(|a, b| b.cmp(a))
        .collect()
}
