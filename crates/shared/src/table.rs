//! Legal transitions of a table between calling, correcting and busy, plus
//! queue edits. The store runs the same rules authoritatively; clients use
//! them to reject requests that are already known to fail.

use crate::{
    domain::{Table, TableStatus, TeamId},
    error::TransitionError,
    protocol::TableAction,
};

type Result<T> = std::result::Result<T, TransitionError>;

impl Table {
    /// Applies `action` in place. On error the table is left untouched.
    pub fn apply(&mut self, action: &TableAction, now: i64) -> Result<()> {
        match action {
            TableAction::StartCoordination { team } => self.start_coordination(team, now),
            TableAction::FinishCoordination => self.finish_coordination().map(|_| ()),
            TableAction::PauseCoordination => self.pause_coordination(),
            TableAction::SwitchToCalling => {
                self.switch_to_calling();
                Ok(())
            }
            TableAction::SwitchToBusy => {
                self.switch_to_busy();
                Ok(())
            }
            TableAction::CallTeam { team } => self.check_call_team(team),
            TableAction::SkipToNext => self.skip_to_next(),
            TableAction::AddToQueue { team, pos } => self.add_to_queue(team.clone(), *pos),
            TableAction::RemoveFromQueue { team } => self.remove_from_queue(team),
            TableAction::SwapTeamsInQueue { first, second } => {
                self.swap_teams_in_queue(first, second)
            }
        }
    }

    /// Like [`Table::apply`] but only reports whether the action would succeed.
    pub fn check(&self, action: &TableAction, now: i64) -> Result<()> {
        self.clone().apply(action, now)
    }

    pub fn start_coordination(&mut self, team: &TeamId, now: i64) -> Result<()> {
        if self.status == TableStatus::Correcting {
            return Err(TransitionError::AlreadyCorrecting);
        }
        let pos = self
            .position_of(team)
            .ok_or_else(|| TransitionError::TeamNotInQueue { team: team.clone() })?;
        let team = self.queue.remove(pos);
        self.current_coordination_team = Some(team);
        self.current_coordination_start_time = Some(now);
        self.status = TableStatus::Correcting;
        Ok(())
    }

    /// Ends the current correction and returns the team that was being
    /// corrected. The table becomes busy; callers that want to call the next
    /// team follow up with [`Table::switch_to_calling`].
    pub fn finish_coordination(&mut self) -> Result<Option<TeamId>> {
        self.ensure_correcting()?;
        let team = self.current_coordination_team.take();
        self.current_coordination_start_time = None;
        self.status = TableStatus::Busy;
        Ok(team)
    }

    /// Interrupts the current correction without counting it as finished:
    /// the team goes back to the head of the queue.
    pub fn pause_coordination(&mut self) -> Result<()> {
        self.ensure_correcting()?;
        if let Some(team) = self.current_coordination_team.take() {
            self.queue.retain(|queued| *queued != team);
            self.queue.insert(0, team);
        }
        self.current_coordination_start_time = None;
        self.status = TableStatus::Busy;
        Ok(())
    }

    pub fn switch_to_calling(&mut self) {
        self.clear_current();
        self.status = TableStatus::Calling;
    }

    pub fn switch_to_busy(&mut self) {
        self.clear_current();
        self.status = TableStatus::Busy;
    }

    /// Summoning a team is a display signal only; the queue is not touched.
    pub fn check_call_team(&self, team: &TeamId) -> Result<()> {
        if self.status != TableStatus::Calling {
            return Err(TransitionError::NotCalling {
                status: self.status,
            });
        }
        if !self.contains(team) {
            return Err(TransitionError::TeamNotInQueue { team: team.clone() });
        }
        Ok(())
    }

    /// Moves the head of the queue to its tail.
    pub fn skip_to_next(&mut self) -> Result<()> {
        if self.queue.is_empty() {
            return Err(TransitionError::EmptyQueue);
        }
        self.queue.rotate_left(1);
        Ok(())
    }

    /// Inserts `team` at `pos`, or at the end when `pos` is absent or past it.
    pub fn add_to_queue(&mut self, team: TeamId, pos: Option<usize>) -> Result<()> {
        if self.contains(&team) {
            return Err(TransitionError::TeamAlreadyInQueue { team });
        }
        if self.current_coordination_team.as_ref() == Some(&team) {
            return Err(TransitionError::TeamBeingCorrected { team });
        }
        let pos = pos
            .filter(|pos| *pos <= self.queue.len())
            .unwrap_or(self.queue.len());
        self.queue.insert(pos, team);
        Ok(())
    }

    pub fn remove_from_queue(&mut self, team: &TeamId) -> Result<()> {
        let pos = self
            .position_of(team)
            .ok_or_else(|| TransitionError::TeamNotInQueue { team: team.clone() })?;
        self.queue.remove(pos);
        Ok(())
    }

    pub fn swap_teams_in_queue(&mut self, first: &TeamId, second: &TeamId) -> Result<()> {
        let a = self
            .position_of(first)
            .ok_or_else(|| TransitionError::TeamNotInQueue { team: first.clone() })?;
        let b = self
            .position_of(second)
            .ok_or_else(|| TransitionError::TeamNotInQueue {
                team: second.clone(),
            })?;
        self.queue.swap(a, b);
        Ok(())
    }

    fn ensure_correcting(&self) -> Result<()> {
        if self.status == TableStatus::Correcting {
            Ok(())
        } else {
            Err(TransitionError::NotCorrecting {
                status: self.status,
            })
        }
    }

    fn clear_current(&mut self) {
        self.current_coordination_team = None;
        self.current_coordination_start_time = None;
    }
}

#[cfg(test)]
#[path = "tests/table_tests.rs"]
mod tests;
