//! # Companions
//!
//! Plans the rows of the symmetric companion relation between bookings on
//! the same trip.
//!
//! ## Symmetry
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Trip T                                                                 │
//! │                                                                         │
//! │  Booking A (customer a)  lists b, c                                    │
//! │  Booking B (customer b)  lists a                                       │
//! │  Booking C (customer c)  lists a                                       │
//! │                                                                         │
//! │  Stored rows (booking_id, companion_customer_id):                      │
//! │    (A, b) (A, c) (B, a) (C, a)                                         │
//! │                                                                         │
//! │  Editing A's list to [b] must also drop (C, a):                        │
//! │    delete (A, c) (C, a)                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A customer holds at most one open booking per trip, so on a given trip a
//! customer id identifies exactly one booking.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A booking as seen by the companion planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TripBooking {
    pub booking_id: String,
    pub customer_id: String,
}

/// One stored companion row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CompanionLink {
    pub booking_id: String,
    pub companion_customer_id: String,
}

impl CompanionLink {
    pub fn new(booking_id: impl Into<String>, companion_customer_id: impl Into<String>) -> Self {
        CompanionLink {
            booking_id: booking_id.into(),
            companion_customer_id: companion_customer_id.into(),
        }
    }
}

/// Rows to insert and delete to reach the desired relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanionPlan {
    pub insert: Vec<CompanionLink>,
    pub delete: Vec<CompanionLink>,
}

impl CompanionPlan {
    pub fn is_empty(&self) -> bool {
        self.insert.is_empty() && self.delete.is_empty()
    }
}

/// Rows that involve the subject booking in either direction.
fn links_touching(subject: &TripBooking, existing: &[CompanionLink]) -> BTreeSet<CompanionLink> {
    existing
        .iter()
        .filter(|link| {
            link.booking_id == subject.booking_id
                || (link.companion_customer_id == subject.customer_id
                    && link.booking_id != subject.booking_id)
        })
        .cloned()
        .collect()
}

/// Plans the rows needed after `subject`'s companion list becomes `desired`.
///
/// ## Arguments
/// * `subject` - the booking whose list changed
/// * `desired` - the new companion customer ids (duplicates are collapsed)
/// * `trip_bookings` - all open bookings on the same trip, subject included
/// * `existing` - all current companion rows of bookings on the trip
///
/// ## Errors
/// - `SelfCompanion` when the list contains the subject's own customer
/// - `CompanionNotOnTrip` when a companion has no open booking on the trip
pub fn plan_companion_sync(
    subject: &TripBooking,
    desired: &[String],
    trip_bookings: &[TripBooking],
    existing: &[CompanionLink],
) -> CoreResult<CompanionPlan> {
    let desired: BTreeSet<&str> = desired.iter().map(|id| id.trim()).collect();

    if desired.contains(subject.customer_id.as_str()) {
        return Err(CoreError::SelfCompanion(subject.customer_id.clone()));
    }

    let mut target = BTreeSet::new();
    for customer_id in &desired {
        let companion_booking = trip_bookings
            .iter()
            .find(|b| b.customer_id == *customer_id && b.booking_id != subject.booking_id)
            .ok_or_else(|| CoreError::CompanionNotOnTrip(customer_id.to_string()))?;

        target.insert(CompanionLink::new(&subject.booking_id, *customer_id));
        target.insert(CompanionLink::new(
            &companion_booking.booking_id,
            &subject.customer_id,
        ));
    }

    let current = links_touching(subject, existing);

    Ok(CompanionPlan {
        insert: target.difference(&current).cloned().collect(),
        delete: current.difference(&target).cloned().collect(),
    })
}

/// Plans the removal of every row touching `subject`, used when a booking is
/// cancelled, refunded or deleted.
pub fn plan_companion_removal(subject: &TripBooking, existing: &[CompanionLink]) -> CompanionPlan {
    CompanionPlan {
        insert: Vec::new(),
        delete: links_touching(subject, existing).into_iter().collect(),
    }
}

/// Checks the relation is symmetric across a trip.
///
/// Returns the rows whose mirror is missing; empty means symmetric.
pub fn asymmetric_links(trip_bookings: &[TripBooking], links: &[CompanionLink]) -> Vec<CompanionLink> {
    let customer_of = |booking_id: &str| {
        trip_bookings
            .iter()
            .find(|b| b.booking_id == booking_id)
            .map(|b| b.customer_id.as_str())
    };
    let booking_of = |customer_id: &str| {
        trip_bookings
            .iter()
            .find(|b| b.customer_id == customer_id)
            .map(|b| b.booking_id.as_str())
    };
    let all: BTreeSet<&CompanionLink> = links.iter().collect();

    links
        .iter()
        .filter(|link| {
            let mirrored = match (
                customer_of(&link.booking_id),
                booking_of(&link.companion_customer_id),
            ) {
                (Some(customer), Some(other_booking)) => {
                    all.contains(&CompanionLink::new(other_booking, customer))
                }
                _ => false,
            };
            !mirrored
        })
        .cloned()
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(id: &str, customer: &str) -> TripBooking {
        TripBooking {
            booking_id: id.to_string(),
            customer_id: customer.to_string(),
        }
    }

    fn trip() -> Vec<TripBooking> {
        vec![booking("A", "a"), booking("B", "b"), booking("C", "c")]
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn apply(existing: &mut Vec<CompanionLink>, plan: &CompanionPlan) {
        existing.retain(|l| !plan.delete.contains(l));
        existing.extend(plan.insert.iter().cloned());
    }

    #[test]
    fn test_adding_companions_creates_mirror_rows() {
        let trip = trip();
        let plan = plan_companion_sync(&trip[0], &ids(&["b", "c"]), &trip, &[]).unwrap();

        assert!(plan.delete.is_empty());
        assert_eq!(
            plan.insert,
            vec![
                CompanionLink::new("A", "b"),
                CompanionLink::new("A", "c"),
                CompanionLink::new("B", "a"),
                CompanionLink::new("C", "a"),
            ]
        );
    }

    #[test]
    fn test_removing_companion_drops_both_directions() {
        let trip = trip();
        let mut links = Vec::new();
        let plan = plan_companion_sync(&trip[0], &ids(&["b", "c"]), &trip, &links).unwrap();
        apply(&mut links, &plan);

        let plan = plan_companion_sync(&trip[0], &ids(&["b"]), &trip, &links).unwrap();
        assert!(plan.insert.is_empty());
        assert_eq!(
            plan.delete,
            vec![CompanionLink::new("A", "c"), CompanionLink::new("C", "a")]
        );

        apply(&mut links, &plan);
        assert!(asymmetric_links(&trip, &links).is_empty());
    }

    #[test]
    fn test_edit_from_the_other_side_stays_symmetric() {
        let trip = trip();
        let mut links = Vec::new();
        let plan = plan_companion_sync(&trip[0], &ids(&["b"]), &trip, &links).unwrap();
        apply(&mut links, &plan);
        // B now also travels with C; A must stay linked because B keeps a.
        let plan = plan_companion_sync(&trip[1], &ids(&["a", "c"]), &trip, &links).unwrap();
        apply(&mut links, &plan);
        assert!(asymmetric_links(&trip, &links).is_empty());
        assert!(links.contains(&CompanionLink::new("A", "b")));
        assert!(links.contains(&CompanionLink::new("C", "b")));

        // B drops everyone: A's and C's mirror rows go too.
        let plan = plan_companion_sync(&trip[1], &[], &trip, &links).unwrap();
        apply(&mut links, &plan);
        assert!(links.is_empty());
    }

    #[test]
    fn test_unchanged_list_is_a_no_op() {
        let trip = trip();
        let mut links = Vec::new();
        let plan = plan_companion_sync(&trip[0], &ids(&["c"]), &trip, &links).unwrap();
        apply(&mut links, &plan);
        let plan = plan_companion_sync(&trip[0], &ids(&["c", "c"]), &trip, &links).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_self_companion_is_rejected() {
        let trip = trip();
        let err = plan_companion_sync(&trip[0], &ids(&["a"]), &trip, &[]).unwrap_err();
        assert!(matches!(err, CoreError::SelfCompanion(c) if c == "a"));
    }

    #[test]
    fn test_companion_must_be_on_trip() {
        let trip = trip();
        let err = plan_companion_sync(&trip[0], &ids(&["z"]), &trip, &[]).unwrap_err();
        assert!(matches!(err, CoreError::CompanionNotOnTrip(c) if c == "z"));
    }

    #[test]
    fn test_removal_clears_everything_touching_booking() {
        let trip = trip();
        let mut links = Vec::new();
        let plan = plan_companion_sync(&trip[0], &ids(&["b", "c"]), &trip, &links).unwrap();
        apply(&mut links, &plan);
        let plan = plan_companion_sync(&trip[1], &ids(&["a", "c"]), &trip, &links).unwrap();
        apply(&mut links, &plan);

        let plan = plan_companion_removal(&trip[0], &links);
        apply(&mut links, &plan);

        assert_eq!(
            links,
            vec![CompanionLink::new("B", "c"), CompanionLink::new("C", "b")]
        );
        assert!(asymmetric_links(&trip, &links).is_empty());
    }

    #[test]
    fn test_asymmetric_links_reports_missing_mirror() {
        let trip = trip();
        let links = vec![CompanionLink::new("A", "b")];
        assert_eq!(asymmetric_links(&trip, &links), links);
    }
}
