//! Seat selection engine.
//!
//! A [`Selection`] is an ordered set of seat ids, always interpreted
//! against a specific [`SeatMap`](crate::state::SeatMap) snapshot. All
//! mutation goes through [`Selection::toggle`] and
//! [`Selection::reconcile`], which keep the set bounded to bookable seats.

use crate::state::{SeatId, SeatMap};

/// Ordered, duplicate-free set of selected seats.
///
/// Order is user selection order and survives into the booking request and
/// receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    seats: Vec<SeatId>,
}

impl Selection {
    /// Toggle a seat against the given seat map snapshot.
    ///
    /// A selected seat is deselected. An unselected bookable seat is
    /// appended. Toggling a booked or unknown seat is a no-op: the UI
    /// renders such seats inert, so there is nothing to report.
    pub fn toggle(&mut self, seat: SeatId, map: &SeatMap) {
        if let Some(position) = self.seats.iter().position(|&s| s == seat) {
            self.seats.remove(position);
        } else if map.is_bookable(seat) {
            self.seats.push(seat);
        }
    }

    /// Drop seats that are no longer bookable in `map`, returning the
    /// dropped ids in selection order.
    ///
    /// Run against every fresh snapshot before submission so a request is
    /// never built from stale availability.
    pub fn reconcile(&mut self, map: &SeatMap) -> Vec<SeatId> {
        let mut dropped = Vec::new();
        self.seats.retain(|&seat| {
            if map.is_bookable(seat) {
                true
            } else {
                dropped.push(seat);
                false
            }
        });
        dropped
    }

    /// Whether the seat is currently selected.
    #[must_use]
    pub fn contains(&self, seat: SeatId) -> bool {
        self.seats.contains(&seat)
    }

    /// Number of selected seats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Selected seat ids in selection order.
    #[must_use]
    pub fn seat_ids(&self) -> &[SeatId] {
        &self.seats
    }

    /// Total fare at the given per-seat price.
    #[must_use]
    pub fn fare(&self, unit_price: u32) -> u32 {
        self.len() as u32 * unit_price
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.seats.clear();
    }
}
