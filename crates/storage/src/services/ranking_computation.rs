use std::collections::HashMap;

use chrono::Datelike;
use uuid::Uuid;

use crate::dto::ranking::{MemberStats, RankingEntry, RankingEvent, TypeBreakdown};
use crate::error::Result;
use crate::models::{AttendanceRecord, EventType, Medal, MemberInfo, PointsTable};

pub const DEFAULT_RECENT_EVENTS: usize = 5;

/// Per-member totals for one year, before positions are assigned.
#[derive(Debug, Clone)]
pub struct MemberAggregate {
    pub member: MemberInfo,
    pub total_points: u64,
    pub total_kilometers: u64,
    pub events: Vec<RankingEvent>,
}

impl MemberAggregate {
    fn new(member: &MemberInfo) -> Self {
        Self {
            member: member.clone(),
            total_points: 0,
            total_kilometers: 0,
            events: Vec::new(),
        }
    }

    fn add(&mut self, event: RankingEvent) {
        self.total_points += u64::from(event.points);
        self.total_kilometers += u64::from(event.kilometers);
        self.events.push(event);
    }

    pub fn total_events(&self) -> u32 {
        saturating_count(self.events.len())
    }

    pub fn medal(&self) -> Option<Medal> {
        Medal::for_points(self.total_points)
    }

    fn into_entry(mut self, position: u32) -> RankingEntry {
        let medal = self.medal();
        let total_events = self.total_events();
        self.events.sort_by_key(|e| e.date);

        RankingEntry {
            position,
            user_id: self.member.user_id,
            name: self.member.display_name,
            email: self.member.email,
            total_events,
            total_points: self.total_points,
            total_kilometers: self.total_kilometers,
            medal: medal.map(|m| m.label().to_string()),
            medal_color: medal.map(|m| m.color().to_string()),
            events: self.events,
        }
    }
}

/// Narrows a length to the `u32` used in responses, clamping at `u32::MAX`.
fn saturating_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

fn counts_for_year(record: &AttendanceRecord, year: i32) -> bool {
    record.is_attended() && record.event.date.year() == year
}

fn to_ranking_event(record: &AttendanceRecord, table: &PointsTable) -> Result<RankingEvent> {
    Ok(RankingEvent {
        event_id: record.event.event_id,
        name: record.event.name.clone(),
        event_type: record.event.event_type,
        date: record.event.date,
        kilometers: record.event.kilometers,
        points: table.points_for(record.event.event_type)?,
    })
}

/// Groups the attended records of `year` by member, in order of first
/// appearance in `records`.
pub fn aggregate_members(
    year: i32,
    records: &[AttendanceRecord],
    table: &PointsTable,
) -> Result<Vec<MemberAggregate>> {
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut groups: Vec<MemberAggregate> = Vec::new();

    for record in records.iter().filter(|r| counts_for_year(r, year)) {
        let event = to_ranking_event(record, table)?;

        let slot = *index.entry(record.user_id()).or_insert_with(|| {
            groups.push(MemberAggregate::new(&record.member));
            groups.len() - 1
        });
        groups[slot].add(event);
    }

    Ok(groups)
}

/// Builds the yearly ranking.
///
/// Members are ordered by points, then kilometers, both descending. Members
/// still tied keep the order in which they first appear in `records`.
/// Members without an attended event in `year` are left out.
pub fn build_ranking(
    year: i32,
    records: &[AttendanceRecord],
    table: &PointsTable,
) -> Result<Vec<RankingEntry>> {
    let mut groups = aggregate_members(year, records, table)?;

    // stable
    groups.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| b.total_kilometers.cmp(&a.total_kilometers))
    });

    Ok(groups
        .into_iter()
        .enumerate()
        .map(|(i, group)| group.into_entry(saturating_count(i).saturating_add(1)))
        .collect())
}

/// Statistics for one member. A member without attended events gets zeroed
/// statistics rather than an error.
pub fn member_stats(
    user_id: Uuid,
    year: i32,
    records: &[AttendanceRecord],
    table: &PointsTable,
    recent_limit: usize,
) -> Result<MemberStats> {
    let mut aggregate: Option<MemberAggregate> = None;

    for record in records
        .iter()
        .filter(|r| r.user_id() == user_id && counts_for_year(r, year))
    {
        let event = to_ranking_event(record, table)?;
        aggregate
            .get_or_insert_with(|| MemberAggregate::new(&record.member))
            .add(event);
    }

    let Some(aggregate) = aggregate else {
        return Ok(MemberStats::empty(user_id, year));
    };

    let by_type = EventType::ALL
        .into_iter()
        .filter_map(|event_type| {
            let (count, points) = aggregate
                .events
                .iter()
                .filter(|e| e.event_type == event_type)
                .fold((0u32, 0u64), |(c, p), e| (c.saturating_add(1), p + u64::from(e.points)));
            (count > 0).then_some(TypeBreakdown {
                event_type,
                count,
                points,
            })
        })
        .collect();

    let mut recent_events = aggregate.events.clone();
    recent_events.sort_by(|a, b| b.date.cmp(&a.date));
    recent_events.truncate(recent_limit);

    let medal = aggregate.medal();

    Ok(MemberStats {
        user_id,
        year,
        total_events: aggregate.total_events(),
        total_points: aggregate.total_points,
        total_kilometers: aggregate.total_kilometers,
        medal: medal.map(|m| m.label().to_string()),
        medal_color: medal.map(|m| m.color().to_string()),
        by_type,
        recent_events,
    })
}
