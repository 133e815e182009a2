//! Per-table timers.
//!
//! Every timer lives in a named slot. Arming a slot cancels whatever was
//! armed there before. An expired timer posts `TimerFired` back to the
//! table inbox carrying the generation it was armed with; the actor only
//! acts on it if that generation is still the armed one, so a timer that
//! fires while the seat is acting is ignored.

use serde::Serialize;
use std::collections::HashMap;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Duration, sleep},
};

use super::messages::TableMessage;
use crate::game::entities::SeatIndex;

/// What a timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TimerSlot {
    /// A human seat owes a bid or a card.
    Turn(SeatIndex),
    /// A seat was vacated mid-game and waits for a human.
    SeatReplacement(SeatIndex),
    /// The game finished and humans may confirm a rematch.
    PlayAgain,
}

#[derive(Debug)]
struct ArmedTimer {
    generation: u64,
    task: JoinHandle<()>,
}

/// Timer handles owned by one table actor.
#[derive(Debug)]
pub struct TableTimers {
    /// Weak so pending timers don't keep a table alive.
    inbox: mpsc::WeakSender<TableMessage>,
    next_generation: u64,
    armed: HashMap<TimerSlot, ArmedTimer>,
}

impl TableTimers {
    pub fn new(inbox: mpsc::WeakSender<TableMessage>) -> Self {
        Self {
            inbox,
            next_generation: 0,
            armed: HashMap::new(),
        }
    }

    /// Arm `slot` to fire after `after`, replacing any timer already there.
    /// Returns the new generation.
    pub fn arm(&mut self, slot: TimerSlot, after: Duration) -> u64 {
        self.cancel(slot);
        self.next_generation += 1;
        let generation = self.next_generation;
        let inbox = self.inbox.clone();
        let task = tokio::spawn(async move {
            sleep(after).await;
            if let Some(inbox) = inbox.upgrade() {
                let _ = inbox
                    .send(TableMessage::TimerFired { slot, generation })
                    .await;
            }
        });
        self.armed.insert(slot, ArmedTimer { generation, task });
        generation
    }

    /// Cancel `slot`. Returns whether anything was armed.
    pub fn cancel(&mut self, slot: TimerSlot) -> bool {
        match self.armed.remove(&slot) {
            Some(timer) => {
                timer.task.abort();
                true
            }
            None => false,
        }
    }

    /// Claim an expiry. Returns false for stale or cancelled timers, which
    /// must be ignored.
    pub fn take_if_current(&mut self, slot: TimerSlot, generation: u64) -> bool {
        match self.armed.get(&slot) {
            Some(timer) if timer.generation == generation => {
                self.armed.remove(&slot);
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self, slot: TimerSlot) -> bool {
        self.armed.contains_key(&slot)
    }

    /// Cancel every turn timer, leaving replacement and rematch timers.
    pub fn cancel_turns(&mut self) {
        let turns: Vec<TimerSlot> = self
            .armed
            .keys()
            .filter(|slot| matches!(slot, TimerSlot::Turn(_)))
            .copied()
            .collect();
        for slot in turns {
            self.cancel(slot);
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, timer) in self.armed.drain() {
            timer.task.abort();
        }
    }
}

impl Drop for TableTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    async fn next_fire(rx: &mut mpsc::Receiver<TableMessage>) -> Option<(TimerSlot, u64)> {
        match timeout(Duration::from_secs(120), rx.recv()).await {
            Ok(Some(TableMessage::TimerFired { slot, generation })) => Some((slot, generation)),
            _ => None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_duration() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut timers = TableTimers::new(tx.downgrade());
        let generation = timers.arm(TimerSlot::Turn(1), Duration::from_secs(30));
        let fired = next_fire(&mut rx).await;
        assert_eq!(fired, Some((TimerSlot::Turn(1), generation)));
        assert!(timers.take_if_current(TimerSlot::Turn(1), generation));
        assert!(!timers.is_armed(TimerSlot::Turn(1)));
        assert_eq!(next_fire(&mut rx).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_previous_timer() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut timers = TableTimers::new(tx.downgrade());
        let first = timers.arm(TimerSlot::Turn(0), Duration::from_secs(10));
        let second = timers.arm(TimerSlot::Turn(0), Duration::from_secs(20));
        assert_ne!(first, second);
        assert_eq!(next_fire(&mut rx).await, Some((TimerSlot::Turn(0), second)));
        assert!(!timers.take_if_current(TimerSlot::Turn(0), first));
        assert!(timers.take_if_current(TimerSlot::Turn(0), second));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut timers = TableTimers::new(tx.downgrade());
        timers.arm(TimerSlot::PlayAgain, Duration::from_secs(5));
        timers.arm(TimerSlot::Turn(2), Duration::from_secs(5));
        assert!(timers.cancel(TimerSlot::PlayAgain));
        timers.cancel_turns();
        assert!(!timers.cancel(TimerSlot::PlayAgain));
        assert_eq!(next_fire(&mut rx).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn late_fire_after_cancel_is_stale() {
        let (tx, _rx) = mpsc::channel(8);
        let mut timers = TableTimers::new(tx.downgrade());
        let generation = timers.arm(TimerSlot::SeatReplacement(3), Duration::from_secs(60));
        timers.cancel(TimerSlot::SeatReplacement(3));
        assert!(!timers.take_if_current(TimerSlot::SeatReplacement(3), generation));
    }
}
