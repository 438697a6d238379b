use glam::Vec3;

use super::{
    error::{MdlError, TableContext},
    events::AnimEvent,
    headers::{mstudioevent_t, mstudioseqdesc_t, NEW_EVENT_STYLE},
};
use crate::binaries::{trim_nulls, BinArray, TrackedCursor};

/// What an event does: a catalog entry, or a name an NPC class declares itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Known(AnimEvent),
    Custom(String),
}

impl EventKind {
    pub fn known(&self) -> Option<AnimEvent> {
        match self {
            EventKind::Known(event) => Some(*event),
            EventKind::Custom(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            EventKind::Known(event) => event.name(),
            EventKind::Custom(name) => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SeqEvent {
    pub kind: EventKind,
    /// Position within the sequence, 0 to 1.
    pub cycle: f32,
    pub options: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sequence {
    pub label: String,
    pub activity_name: String,
    pub flags: i32,
    pub activity_weight: i32,
    pub events: Vec<SeqEvent>,
    pub bbox_min: Vec3,
    pub bbox_max: Vec3,
    pub keyvalues: String,
}

/// Read the sequence table. Event tables are relative to their sequence.
pub(crate) fn read_sequences(
    buffer: &mut TrackedCursor,
    table: &BinArray,
) -> Result<Vec<Sequence>, MdlError> {
    let raw: Vec<(u64, mstudioseqdesc_t)> = table.read_table(buffer, 0).table("sequences")?;
    log::debug!("{} sequences", raw.len());

    raw.iter()
        .map(|(start, seq)| read_sequence(buffer, *start, seq))
        .collect()
}

fn read_sequence(
    buffer: &mut TrackedCursor,
    start: u64,
    seq: &mstudioseqdesc_t,
) -> Result<Sequence, MdlError> {
    let label = seq.label_index.read_str(buffer, start).table("sequence label")?;
    let activity_name = seq
        .activity_name_index
        .read_str(buffer, start)
        .table("sequence activity")?;

    let raw_events: Vec<(u64, mstudioevent_t)> =
        seq.events.read_table(buffer, start).table("sequence events")?;

    let mut events = Vec::with_capacity(raw_events.len());
    for (event_start, raw) in &raw_events {
        let kind = match event_kind(buffer, *event_start, raw, &label)? {
            Some(kind) => kind,
            None => continue,
        };
        events.push(SeqEvent {
            kind,
            cycle: raw.cycle,
            options: trim_nulls(&raw.options),
        });
    }

    let keyvalues = if seq.keyvalue_size != 0 {
        seq.keyvalue_index
            .read_str(buffer, start)
            .table("sequence keyvalues")?
    } else {
        String::new()
    };

    Ok(Sequence {
        label,
        activity_name,
        flags: seq.flags,
        activity_weight: seq.activity_weight,
        events,
        bbox_min: seq.bbmin,
        bbox_max: seq.bbmax,
        keyvalues,
    })
}

/// Resolve the event type. `None` drops the event.
fn event_kind(
    buffer: &mut TrackedCursor,
    start: u64,
    raw: &mstudioevent_t,
    sequence: &str,
) -> Result<Option<EventKind>, MdlError> {
    if raw.event_type & NEW_EVENT_STYLE != 0 {
        let name = raw.name_index.read_str(buffer, start).table("event name")?;

        if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
            // Numbers always refer to the catalog.
            return match name.parse().ok().and_then(AnimEvent::from_code) {
                Some(event) => Ok(Some(EventKind::Known(event))),
                None => Err(MdlError::UnknownEvent {
                    sequence: sequence.to_owned(),
                    name,
                }),
            };
        }

        Ok(Some(match AnimEvent::from_name(&name) {
            Some(event) => EventKind::Known(event),
            None => EventKind::Custom(name),
        }))
    } else {
        let code = raw.event;
        match AnimEvent::from_code(code) {
            Some(event) => Ok(Some(EventKind::Known(event))),
            None => {
                log::warn!(
                    "{}: skipping unknown event {} ({:?})",
                    sequence,
                    code,
                    trim_nulls(&raw.options)
                );
                Ok(None)
            }
        }
    }
}
