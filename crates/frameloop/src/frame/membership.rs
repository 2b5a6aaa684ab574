//! Which side of the frame every tracked body is on, and what happens to it
//! as sensor contacts come and go.
//!
//! One record per body. Callbacks mutate the record and report position
//! rewrites as [`Crossing`] values; the caller applies them to the world.

use std::collections::BTreeMap;

use glam::Vec2;

use crate::api::types::{Direction, EntityId};
use crate::frame::region::FrameBounds;

/// Membership of a tracked body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Inside the frame. `edge` is set when an edge sensor also saw it before
    /// activation; activation settles which side it is really on.
    Inside { edge: Option<Direction> },
    /// Seen by an edge sensor and never inside.
    Outside { approach: Direction },
    /// An outside body overlapping the interior of an active frame.
    EnteringInside { approach: Direction },
    /// An inside body overlapping an edge sensor of an active frame.
    EnteringOutside { exit: Direction },
}

/// How a crossing body is duplicated while it straddles the wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostLayout {
    /// Eight copies tiling the 3×3 neighbourhood, centre excluded.
    Ring,
    /// One copy on the far side of the frame from the approach edge.
    Single(Direction),
}

impl GhostLayout {
    /// Offsets of each copy from its source body.
    pub fn offsets(self, size: Vec2) -> Vec<Vec2> {
        match self {
            GhostLayout::Ring => {
                let mut out = Vec::with_capacity(8);
                for i in 0..3 {
                    for j in 0..3 {
                        if i == 1 && j == 1 {
                            continue;
                        }
                        out.push(Vec2::new((i - 1) as f32 * size.x, (j - 1) as f32 * size.y));
                    }
                }
                out
            }
            GhostLayout::Single(approach) => vec![-approach.unit() * size],
        }
    }
}

impl Membership {
    pub fn is_transitional(self) -> bool {
        matches!(
            self,
            Membership::EnteringInside { .. } | Membership::EnteringOutside { .. }
        )
    }

    /// Whether the body counts as inside for zone, mask and fall-speed purposes.
    pub fn is_inside(self) -> bool {
        matches!(
            self,
            Membership::Inside { .. } | Membership::EnteringOutside { .. }
        )
    }

    pub fn ghost_layout(self) -> Option<GhostLayout> {
        match self {
            Membership::EnteringOutside { .. } => Some(GhostLayout::Ring),
            Membership::EnteringInside { approach } => Some(GhostLayout::Single(approach)),
            _ => None,
        }
    }
}

/// Outcome of a callback that the world has to see.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crossing {
    /// An inside body left through `exit` and reappears on the opposite side.
    Wrapped { body: EntityId, exit: Direction, shift: Vec2 },
    /// An outside body went through the frame and comes out the far side.
    PassedThrough { body: EntityId, approach: Direction, shift: Vec2 },
    /// A transition was abandoned; the body fell back to `to`.
    Cancelled { body: EntityId, to: Membership },
}

impl Crossing {
    /// Position change to apply, if any.
    pub fn shift(&self) -> Option<(EntityId, Vec2)> {
        match *self {
            Crossing::Wrapped { body, shift, .. } | Crossing::PassedThrough { body, shift, .. } => {
                Some((body, shift))
            }
            Crossing::Cancelled { .. } => None,
        }
    }
}

/// A body whose zone returns to outside when the frame deactivates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lowered {
    pub body: EntityId,
    /// Was mid-crossing; its position must be pulled back into the bounds.
    pub was_crossing: bool,
}

/// The membership table, keyed by body.
#[derive(Debug)]
pub struct MembershipTable {
    actor: EntityId,
    size: Vec2,
    records: BTreeMap<EntityId, Membership>,
}

impl MembershipTable {
    pub fn new(actor: EntityId, size: Vec2) -> Self {
        Self {
            actor,
            size,
            records: BTreeMap::new(),
        }
    }

    pub fn actor(&self) -> EntityId {
        self.actor
    }

    pub fn get(&self, body: EntityId) -> Option<Membership> {
        self.records.get(&body).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, Membership)> + '_ {
        self.records.iter().map(|(&id, &m)| (id, m))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn on_interior_stay(&mut self, body: EntityId, active: bool) -> Option<Crossing> {
        match self.records.get(&body).copied() {
            None if active => {
                log::warn!("{body} appeared inside an active frame untracked; ignoring");
            }
            None => {
                self.records.insert(body, Membership::Inside { edge: None });
            }
            Some(Membership::Outside { approach }) => {
                let next = if active {
                    log::debug!("{body} entering frame from {approach:?}");
                    Membership::EnteringInside { approach }
                } else {
                    Membership::Inside { edge: Some(approach) }
                };
                self.records.insert(body, next);
            }
            Some(_) => {}
        }
        None
    }

    /// A wrapped body keeps an Inside record with no edge: it lands just
    /// inside the opposite edge, and dropping it would leave its raised zone
    /// behind at deactivation.
    pub fn on_interior_exit(&mut self, body: EntityId, active: bool) -> Option<Crossing> {
        match self.records.get(&body).copied()? {
            Membership::EnteringOutside { exit } if active => {
                self.records.insert(body, Membership::Inside { edge: None });
                let shift = -exit.unit() * self.size;
                log::debug!("{body} wrapped out through {exit:?}");
                Some(Crossing::Wrapped { body, exit, shift })
            }
            Membership::EnteringInside { approach } => {
                let to = Membership::Outside { approach };
                self.records.insert(body, to);
                Some(Crossing::Cancelled { body, to })
            }
            Membership::Inside { .. } | Membership::EnteringOutside { .. } if !active => {
                self.records.remove(&body);
                None
            }
            _ => None,
        }
    }

    pub fn on_edge_stay(&mut self, body: EntityId, edge: Direction, active: bool) -> Option<Crossing> {
        let next = match self.records.get(&body).copied() {
            None if body == self.actor => return None,
            None => Membership::Outside { approach: edge },
            Some(Membership::Inside { .. }) if active => {
                log::debug!("{body} leaving frame through {edge:?}");
                Membership::EnteringOutside { exit: edge }
            }
            Some(Membership::Inside { .. }) => Membership::Inside { edge: Some(edge) },
            Some(Membership::Outside { .. }) => Membership::Outside { approach: edge },
            Some(Membership::EnteringInside { .. }) => Membership::EnteringInside { approach: edge },
            Some(Membership::EnteringOutside { .. }) => Membership::EnteringOutside { exit: edge },
        };
        self.records.insert(body, next);
        None
    }

    /// Exits only count for the edge the record currently points at.
    ///
    /// A completed pass-through releases the record instead of making the
    /// body Inside: the shifted position lies past the far edge, outside the
    /// frame. The far edge band re-tracks it as Outside if it still touches.
    pub fn on_edge_exit(&mut self, body: EntityId, edge: Direction, active: bool) -> Option<Crossing> {
        match self.records.get(&body).copied()? {
            Membership::Outside { approach } if approach == edge => {
                self.records.remove(&body);
                None
            }
            Membership::EnteringInside { approach } if approach == edge => {
                self.records.remove(&body);
                if !active {
                    return None;
                }
                let shift = -approach.unit() * self.size;
                log::debug!("{body} passed through frame from {approach:?}");
                Some(Crossing::PassedThrough { body, approach, shift })
            }
            Membership::EnteringOutside { exit } if exit == edge => {
                let to = Membership::Inside { edge: None };
                self.records.insert(body, to);
                Some(Crossing::Cancelled { body, to })
            }
            Membership::Inside { edge: Some(seen) } if seen == edge => {
                self.records.insert(body, Membership::Inside { edge: None });
                None
            }
            _ => None,
        }
    }

    /// Drop records of bodies that no longer exist.
    pub fn prune_stale(&mut self, mut alive: impl FnMut(EntityId) -> bool) {
        self.records.retain(|&id, _| alive(id));
    }

    /// Settle dual memberships against the frozen bounds and return every
    /// body that now counts as inside.
    pub fn enter_frame(
        &mut self,
        bounds: &FrameBounds,
        mut position: impl FnMut(EntityId) -> Option<Vec2>,
    ) -> Vec<EntityId> {
        let mut raised = Vec::new();
        for (&id, record) in self.records.iter_mut() {
            match *record {
                Membership::Inside { edge: Some(edge) } => {
                    let outside = position(id).is_some_and(|p| !bounds.contains(p));
                    if outside && id != self.actor {
                        *record = Membership::Outside { approach: edge };
                    } else {
                        *record = Membership::Inside { edge: None };
                        raised.push(id);
                    }
                }
                Membership::Inside { edge: None } | Membership::EnteringOutside { .. } => {
                    raised.push(id);
                }
                _ => {}
            }
        }
        raised
    }

    /// Cancel every in-flight crossing and return the bodies to lower.
    pub fn leave_frame(&mut self) -> Vec<Lowered> {
        let mut lowered = Vec::new();
        for (&id, record) in self.records.iter_mut() {
            match *record {
                Membership::Inside { .. } => lowered.push(Lowered {
                    body: id,
                    was_crossing: false,
                }),
                Membership::EnteringOutside { .. } => {
                    *record = Membership::Inside { edge: None };
                    lowered.push(Lowered {
                        body: id,
                        was_crossing: true,
                    });
                }
                Membership::EnteringInside { approach } => {
                    *record = Membership::Outside { approach };
                }
                Membership::Outside { .. } => {}
            }
        }
        lowered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec2;

    const ACTOR: EntityId = EntityId(1);
    const BODY: EntityId = EntityId(7);

    fn table() -> MembershipTable {
        MembershipTable::new(ACTOR, Vec2::new(10.0, 6.0))
    }

    #[test]
    fn interior_while_inactive_tracks_inside() {
        let mut t = table();
        t.on_interior_stay(BODY, false);
        assert_eq!(t.get(BODY), Some(Membership::Inside { edge: None }));
    }

    #[test]
    fn untracked_body_in_active_interior_is_ignored() {
        let mut t = table();
        assert!(t.on_interior_stay(BODY, true).is_none());
        assert!(t.is_empty());
    }

    #[test]
    fn edge_while_inactive_remembers_edge() {
        let mut t = table();
        t.on_interior_stay(BODY, false);
        t.on_edge_stay(BODY, Direction::Right, false);
        assert_eq!(
            t.get(BODY),
            Some(Membership::Inside { edge: Some(Direction::Right) })
        );
        t.on_edge_exit(BODY, Direction::Right, false);
        assert_eq!(t.get(BODY), Some(Membership::Inside { edge: None }));
    }

    #[test]
    fn wrap_out_shifts_by_frame_size() {
        let mut t = table();
        t.on_interior_stay(BODY, false);
        t.on_edge_stay(BODY, Direction::Right, true);
        assert_eq!(
            t.get(BODY),
            Some(Membership::EnteringOutside { exit: Direction::Right })
        );

        let crossing = t.on_interior_exit(BODY, true);
        assert_eq!(
            crossing,
            Some(Crossing::Wrapped {
                body: BODY,
                exit: Direction::Right,
                shift: Vec2::new(-10.0, 0.0)
            })
        );
        assert_eq!(t.get(BODY), Some(Membership::Inside { edge: None }));
        assert!(!t.get(BODY).is_some_and(Membership::is_transitional));
    }

    #[test]
    fn pass_through_shifts_against_approach() {
        let mut t = table();
        t.on_edge_stay(BODY, Direction::Up, true);
        t.on_interior_stay(BODY, true);
        assert_eq!(
            t.get(BODY),
            Some(Membership::EnteringInside { approach: Direction::Up })
        );

        let crossing = t.on_edge_exit(BODY, Direction::Up, true);
        assert_eq!(crossing.and_then(|c| c.shift()), Some((BODY, Vec2::new(0.0, -6.0))));
        assert!(t.get(BODY).is_none());
    }

    #[test]
    fn abandoned_crossings_are_cancelled() {
        let mut t = table();
        t.on_interior_stay(BODY, false);
        t.on_edge_stay(BODY, Direction::Left, true);
        let c = t.on_edge_exit(BODY, Direction::Left, true);
        assert!(matches!(c, Some(Crossing::Cancelled { .. })));
        assert_eq!(t.get(BODY), Some(Membership::Inside { edge: None }));

        let other = EntityId(8);
        t.on_edge_stay(other, Direction::Down, true);
        t.on_interior_stay(other, true);
        t.on_interior_exit(other, true);
        assert_eq!(
            t.get(other),
            Some(Membership::Outside { approach: Direction::Down })
        );
    }

    #[test]
    fn actor_is_never_outside() {
        let mut t = table();
        t.on_edge_stay(ACTOR, Direction::Left, false);
        assert!(t.get(ACTOR).is_none());
    }

    #[test]
    fn later_edge_wins_at_corners() {
        let mut t = table();
        t.on_edge_stay(BODY, Direction::Up, false);
        t.on_edge_stay(BODY, Direction::Right, false);
        assert_eq!(
            t.get(BODY),
            Some(Membership::Outside { approach: Direction::Right })
        );
        // Leaving the stale edge keeps the record.
        t.on_edge_exit(BODY, Direction::Up, false);
        assert!(t.get(BODY).is_some());
        t.on_edge_exit(BODY, Direction::Right, false);
        assert!(t.get(BODY).is_none());
    }

    #[test]
    fn enter_frame_settles_dual_membership() {
        let mut t = table();
        let far = EntityId(8);
        t.on_interior_stay(BODY, false);
        t.on_edge_stay(BODY, Direction::Right, false);
        t.on_interior_stay(far, false);
        t.on_edge_stay(far, Direction::Right, false);

        let bounds = FrameBounds::around(Vec2::ZERO, UVec2::new(10, 6));
        let raised = t.enter_frame(&bounds, |id| {
            Some(if id == far { Vec2::new(5.3, 0.0) } else { Vec2::new(4.7, 0.0) })
        });

        assert_eq!(raised, vec![BODY]);
        assert_eq!(t.get(BODY), Some(Membership::Inside { edge: None }));
        assert_eq!(
            t.get(far),
            Some(Membership::Outside { approach: Direction::Right })
        );
    }

    #[test]
    fn leave_frame_cancels_everything() {
        let mut t = table();
        let entering = EntityId(8);
        t.on_interior_stay(BODY, false);
        t.on_edge_stay(BODY, Direction::Right, true);
        t.on_edge_stay(entering, Direction::Left, true);
        t.on_interior_stay(entering, true);

        let lowered = t.leave_frame();
        assert_eq!(
            lowered,
            vec![Lowered { body: BODY, was_crossing: true }]
        );
        assert!(t.iter().all(|(_, m)| !m.is_transitional()));
        assert_eq!(
            t.get(entering),
            Some(Membership::Outside { approach: Direction::Left })
        );
    }

    #[test]
    fn prune_drops_dead_records() {
        let mut t = table();
        t.on_interior_stay(BODY, false);
        t.on_interior_stay(EntityId(8), false);
        t.prune_stale(|id| id != BODY);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn ring_offsets_skip_centre() {
        let offsets = GhostLayout::Ring.offsets(Vec2::new(10.0, 6.0));
        assert_eq!(offsets.len(), 8);
        assert!(!offsets.contains(&Vec2::ZERO));
        assert!(offsets.contains(&Vec2::new(-10.0, 0.0)));
        assert!(offsets.contains(&Vec2::new(10.0, 6.0)));

        let single = GhostLayout::Single(Direction::Right).offsets(Vec2::new(10.0, 6.0));
        assert_eq!(single, vec![Vec2::new(-10.0, 0.0)]);
    }
}
