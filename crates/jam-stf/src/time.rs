//! The `Time(parent_slot, current_slot)` helper used by Safrole and the
//! header validator (§4.3, §4.4, §4.5).

use crate::config::Config;
use crate::types::TimeSlot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Time {
    pub parent_slot: TimeSlot,
    pub current_slot: TimeSlot,
}

impl Time {
    pub fn new(parent_slot: TimeSlot, current_slot: TimeSlot) -> Self {
        Self {
            parent_slot,
            current_slot,
        }
    }

    pub fn is_new_epoch(&self, cfg: &Config) -> bool {
        self.current_slot / cfg.epoch_length != self.parent_slot / cfg.epoch_length
    }

    pub fn is_consecutive_epoch(&self, cfg: &Config) -> bool {
        self.current_slot / cfg.epoch_length == self.parent_slot / cfg.epoch_length + 1
    }

    /// Whether the *parent* slot fell at or after the ticket-submission
    /// deadline Y within its own epoch.
    pub fn prior_was_in_ticket_submission_tail(&self, cfg: &Config) -> bool {
        (self.parent_slot % cfg.epoch_length) >= cfg.ticket_submission_end
    }

    /// Whether the current block's slot crosses Y within the current
    /// epoch, i.e. the parent was still inside the window and the current
    /// slot is at or past it.
    pub fn did_cross_ticket_submission_end(&self, cfg: &Config) -> bool {
        !self.is_new_epoch(cfg)
            && (self.parent_slot % cfg.epoch_length) < cfg.ticket_submission_end
            && (self.current_slot % cfg.epoch_length) >= cfg.ticket_submission_end
    }

    pub fn epoch_slot(&self, cfg: &Config) -> u32 {
        self.current_slot % cfg.epoch_length
    }

    pub fn epoch(&self, cfg: &Config) -> u32 {
        self.current_slot / cfg.epoch_length
    }

    pub fn rotation_index(&self, cfg: &Config) -> u32 {
        self.current_slot / cfg.rotation_period
    }

    pub fn parent_rotation_index(&self, cfg: &Config) -> u32 {
        self.parent_slot / cfg.rotation_period
    }

    pub fn is_same_rotation_as_current(&self, slot: TimeSlot, cfg: &Config) -> bool {
        slot / cfg.rotation_period == self.rotation_index(cfg)
    }
}
