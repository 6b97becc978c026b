//! Collision resolution between protocol slots.
//!
//! Resolution order for a collision between existing value `e` and
//! incoming value `v`:
//!   1. `e` defines forward-combine → result is `e` combined with `v`.
//!   2. else `v` defines reverse-combine (`Override`) → `v` wins.
//!   3. else the collision is an error naming the key and both sides.

use crate::{
    error::{CollisionError, ExpandError},
    slot::{Draft, DraftPolicy, Slot},
    value::Value,
};
use std::collections::BTreeMap;

/// Merge two whole extension items, as product and zip do.
pub(crate) fn combine_items(existing: Slot, incoming: Slot) -> Result<Slot, ExpandError> {
    combine_slots(None, existing, incoming)
}

/// Merge the two sides of a collision under `key` (`None` at item level).
pub(crate) fn combine_slots(
    key: Option<&str>,
    existing: Slot,
    incoming: Slot,
) -> Result<Slot, ExpandError> {
    match existing {
        // forward-combine carriers
        Slot::Overridable(_) => Ok(incoming),
        Slot::Override(_) => Ok(existing),
        Slot::Combinable(c) => {
            let rhs = incoming.resolve()?;
            Ok(c.step(rhs))
        }
        Slot::Nested(draft) => combine_into_draft(key, draft, incoming),

        // no forward protocol on the existing side
        existing => reverse_combine(key, existing, incoming),
    }
}

fn combine_into_draft(
    key: Option<&str>,
    existing: Draft,
    incoming: Slot,
) -> Result<Slot, ExpandError> {
    match existing.policy() {
        DraftPolicy::Final => Err(CollisionError::Finalized {
            key: key.map(str::to_string),
        }
        .into()),
        DraftPolicy::Plain => reverse_combine(key, Slot::Nested(existing), incoming),
        DraftPolicy::Combinable => match incoming {
            Slot::Nested(d) => Ok(Slot::Nested(combine_drafts(&existing, &d)?)),
            Slot::Plain(Value::Record(r)) => {
                let incoming = Draft::from_record(r, DraftPolicy::Plain);
                Ok(Slot::Nested(combine_drafts(&existing, &incoming)?))
            }
            // forward-combine only merges record shapes; an Override still
            // wins through its reverse capability.
            Slot::Override(_) => Ok(incoming),
            incoming => Err(CollisionError::NotARecord {
                key: key.map(str::to_string),
                incoming: incoming.to_string(),
            }
            .into()),
        },
    }
}

fn reverse_combine(key: Option<&str>, existing: Slot, incoming: Slot) -> Result<Slot, ExpandError> {
    match incoming {
        Slot::Override(_) => Ok(incoming),
        incoming => Err(CollisionError::NoProtocol {
            key: key.map(str::to_string),
            existing: existing.to_string(),
            incoming: incoming.to_string(),
        }
        .into()),
    }
}

/// Key-by-key merge of two drafts.
///
/// A finalized existing draft rejects any combine, even on disjoint keys;
/// the result takes its policy from the incoming side, so merging a raw
/// record literal leaves a draft whose next collision errors.
pub(crate) fn combine_drafts(existing: &Draft, incoming: &Draft) -> Result<Draft, ExpandError> {
    if existing.policy() == DraftPolicy::Final {
        return Err(CollisionError::Finalized { key: None }.into());
    }

    let mut fields: BTreeMap<String, Slot> = existing.fields().clone();
    for (k, v) in incoming.fields() {
        let merged = match fields.remove(k) {
            Some(e) => combine_slots(Some(k), e, v.clone())?,
            None => v.clone(),
        };
        fields.insert(k.clone(), merged);
    }

    Ok(Draft::new(fields, incoming.policy()))
}
