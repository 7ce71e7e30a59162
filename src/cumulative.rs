use crate::constraint::Constraint;
use crate::error::{Inconsistency, ModelError, PropagationResult};
use crate::propagator::{PropagationContext, Propagator, PropagatorControlBlock};
use crate::sparse_set::ReversibleSparseSet;
use crate::variable::{check_distinct, VarRef};
use crate::Depth;
use tracing::trace;

/// Change of the mandatory profile at `time`.
struct Event {
    time: i64,
    delta: i64,
}

/// Interval `[start, end)` between two consecutive profile events, at constant `height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub start: i64,
    pub end: i64,
    pub height: i64,
}

/// Tasks with start variables, fixed lengths and fixed resource heights never use more
/// than `limit` at any time.
///
/// Filtering is time-tabling: the mandatory parts `[latest start, earliest start + length)`
/// of the tasks are summed into a profile of slots. A slot above `limit` fails. A task
/// whose height does not fit on top of a slot loses every start that would make it
/// overlap that slot. Fixed tasks lying outside the window of every unfixed task are
/// dropped from `omega`, the reversible set of tasks still swept.
pub struct CumulativePropagator {
    pcb: PropagatorControlBlock,
    starts: Vec<VarRef>,
    lengths: Vec<i64>,
    heights: Vec<i64>,
    limit: i64,
    omega: ReversibleSparseSet,
    events: Vec<Event>,
    slots: Vec<Slot>,
}

impl CumulativePropagator {
    pub fn new(
        starts: Vec<VarRef>,
        lengths: Vec<i64>,
        heights: Vec<i64>,
        limit: i64,
    ) -> Result<Self, ModelError> {
        check_distinct(&starts, "cumulative")?;
        for (what, found) in [("lengths", lengths.len()), ("heights", heights.len())] {
            if found != starts.len() {
                return Err(ModelError::LengthMismatch {
                    constraint: "cumulative",
                    what,
                    expected: starts.len(),
                    found,
                });
            }
        }
        if let Some(t) = (0..starts.len()).find(|&t| lengths[t] < 0 || heights[t] < 0) {
            return Err(ModelError::InvalidArgument {
                constraint: "cumulative",
                reason: format!("task {t} has a negative length or height"),
            });
        }
        if limit < 0 {
            return Err(ModelError::InvalidArgument {
                constraint: "cumulative",
                reason: format!("negative limit {limit}"),
            });
        }
        let omega = ReversibleSparseSet::new(starts.len());
        Ok(Self {
            pcb: PropagatorControlBlock::new(),
            starts,
            lengths,
            heights,
            limit,
            omega,
            events: Vec::new(),
            slots: Vec::new(),
        })
    }

    /// Tasks still swept.
    pub fn relevant_tasks(&self) -> &[usize] {
        self.omega.present()
    }

    /// Slots computed by the last call.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    fn is_void(&self, t: usize) -> bool {
        self.lengths[t] == 0 || self.heights[t] == 0
    }

    fn mandatory_part(&self, t: usize) -> Option<(i64, i64)> {
        let start = self.starts[t].borrow();
        let (est, lst) = (start.get_lb(), start.get_ub());
        (lst < est + self.lengths[t]).then_some((lst, est + self.lengths[t]))
    }

    /// Rebuilds the slots from the mandatory parts of the tasks in `omega`.
    fn build_time_table(&mut self) -> PropagationResult {
        self.events.clear();
        for &t in self.omega.present() {
            if self.is_void(t) {
                continue;
            }
            if let Some((from, to)) = self.mandatory_part(t) {
                self.events.push(Event {
                    time: from,
                    delta: self.heights[t],
                });
                self.events.push(Event {
                    time: to,
                    delta: -self.heights[t],
                });
            }
        }
        // Ends come before starts at the same time.
        self.events.sort_unstable_by_key(|e| (e.time, e.delta));

        self.slots.clear();
        let mut height = 0;
        let mut i = 0;
        while i < self.events.len() {
            let tick = self.events[i].time;
            while i < self.events.len() && self.events[i].time == tick {
                height += self.events[i].delta;
                i += 1;
            }
            if height > self.limit {
                trace!(time = tick, height, limit = self.limit, "profile overflow");
                return Err(Inconsistency::NoSupport {
                    constraint: "cumulative",
                });
            }
            // Not merged with an equal neighbour: every slot then lies either inside or
            // outside the mandatory part of each task.
            if height > 0 && i < self.events.len() {
                self.slots.push(Slot {
                    start: tick,
                    end: self.events[i].time,
                    height,
                });
            }
        }
        Ok(())
    }

    fn filter_starts(&mut self) -> PropagationResult {
        let tasks = self.omega.present().to_vec();
        for t in tasks {
            if self.is_void(t) || self.starts[t].borrow().is_assigned() {
                continue;
            }
            let (len, h) = (self.lengths[t], self.heights[t]);
            if h > self.limit {
                trace!(task = t, height = h, limit = self.limit, "task higher than the limit");
                return Err(Inconsistency::NoSupport {
                    constraint: "cumulative",
                });
            }
            let own = self.mandatory_part(t);
            for k in 0..self.slots.len() {
                let slot = self.slots[k];
                let covered = own.is_some_and(|(from, to)| from <= slot.start && slot.end <= to);
                let others = if covered { slot.height - h } else { slot.height };
                if others + h > self.limit {
                    self.starts[t]
                        .borrow_mut()
                        .dom
                        .remove_values_in_range(slot.start - len + 1, slot.end - 1)?;
                }
            }
        }
        Ok(())
    }

    fn shrink_omega(&mut self, depth: Depth) {
        let mut min_start = i64::MAX;
        let mut max_end = i64::MIN;
        for &t in self.omega.present() {
            let start = self.starts[t].borrow();
            if !start.is_assigned() {
                min_start = min_start.min(start.get_lb());
                max_end = max_end.max(start.get_ub() + self.lengths[t]);
            }
        }
        let dropped: Vec<usize> = self
            .omega
            .present()
            .iter()
            .copied()
            .filter(|&t| {
                let start = self.starts[t].borrow();
                match start.try_value() {
                    Some(s) => s + self.lengths[t] <= min_start || s >= max_end,
                    None => false,
                }
            })
            .collect();
        if !dropped.is_empty() {
            trace!(dropped = dropped.len(), left = self.omega.size() - dropped.len(), "omega shrinks");
        }
        for t in dropped {
            self.omega.remove(t, depth);
        }
    }
}

impl Constraint for CumulativePropagator {
    fn scope(&self) -> &[VarRef] {
        &self.starts
    }

    fn check_values(&self, tuple: &[i64]) -> bool {
        let mut events: Vec<(i64, i64)> = Vec::with_capacity(2 * tuple.len());
        for (t, &s) in tuple.iter().enumerate() {
            if self.lengths[t] > 0 && self.heights[t] > 0 {
                events.push((s, self.heights[t]));
                events.push((s + self.lengths[t], -self.heights[t]));
            }
        }
        events.sort_unstable();
        let mut height = 0;
        events.into_iter().all(|(_, delta)| {
            height += delta;
            height <= self.limit
        })
    }
}

impl Propagator for CumulativePropagator {
    fn name(&self) -> &'static str {
        "cumulative"
    }

    #[tracing::instrument(name = "cumulative", level = "trace", skip(self))]
    fn run_propagator(&mut self, ctx: PropagationContext) -> PropagationResult {
        self.build_time_table()?;
        self.filter_starts()?;
        self.shrink_omega(ctx.depth);
        Ok(())
    }

    fn restore_before(&mut self, depth: Depth) {
        self.omega.restore_before(depth);
    }

    fn get_cb(&self) -> &PropagatorControlBlock {
        &self.pcb
    }

    fn get_cb_mut(&mut self) -> &mut PropagatorControlBlock {
        &mut self.pcb
    }
}
