//! Duty-cycled scanning
//!
//! Scanning drains the battery, so discovery alternates between an active
//! scan window and a pause. The scheduler is a plain state machine: every
//! call returns the actions the caller has to carry out (start/stop the
//! transport scan, arm/cancel the single wake-up timer). Each armed timer
//! carries a [`TimerToken`]; a tick whose token is not the current one is
//! stale and does nothing.

use std::time::Duration;

use log::{debug, info, trace};

/// Identifies one armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanPhase {
    #[default]
    Off,
    Scanning,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanAction {
    StartScan,
    StopScan,
    /// Arm the wake-up timer, replacing any pending one.
    ArmTimer { after: Duration, token: TimerToken },
    CancelTimer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanScheduler {
    phase: ScanPhase,
    scan_window: Duration,
    pause_window: Duration,
    armed: Option<TimerToken>,
    next_token: u64,
}

impl ScanScheduler {
    pub fn new(scan_window: Duration, pause_window: Duration) -> Self {
        Self {
            phase: ScanPhase::Off,
            scan_window,
            pause_window,
            armed: None,
            next_token: 0,
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn armed_timer(&self) -> Option<TimerToken> {
        self.armed
    }

    pub fn scan_window(&self) -> Duration {
        self.scan_window
    }

    pub fn pause_window(&self) -> Duration {
        self.pause_window
    }

    /// Begins a scan window now. Does nothing while already scanning; a
    /// pending pause is cut short.
    pub fn start(&mut self) -> Vec<ScanAction> {
        match self.phase {
            ScanPhase::Scanning => {
                trace!("Scan already active, ignoring start.");
                Vec::new()
            }
            ScanPhase::Off | ScanPhase::Paused => {
                info!("Starting scan window of {:?}.", self.scan_window);
                self.phase = ScanPhase::Scanning;
                vec![ScanAction::StartScan, self.arm(self.scan_window)]
            }
        }
    }

    /// Turns scanning off and cancels the pending timer.
    pub fn stop(&mut self) -> Vec<ScanAction> {
        let mut actions = Vec::new();
        if self.phase == ScanPhase::Scanning {
            actions.push(ScanAction::StopScan);
        }
        if self.armed.take().is_some() {
            actions.push(ScanAction::CancelTimer);
        }
        if self.phase != ScanPhase::Off {
            info!("Scan scheduler stopped.");
        }
        self.phase = ScanPhase::Off;
        actions
    }

    /// Handles a timer tick. A new scan window only opens if
    /// `keep_scanning` still holds when the pause ends.
    pub fn on_timer(&mut self, token: TimerToken, keep_scanning: bool) -> Vec<ScanAction> {
        if self.armed != Some(token) {
            debug!("Ignoring stale scan timer {:?}.", token);
            return Vec::new();
        }
        self.armed = None;

        match self.phase {
            ScanPhase::Scanning => {
                info!("Pausing scan for {:?}.", self.pause_window);
                self.phase = ScanPhase::Paused;
                vec![ScanAction::StopScan, self.arm(self.pause_window)]
            }
            ScanPhase::Paused if keep_scanning => {
                info!("Resuming scan.");
                self.phase = ScanPhase::Scanning;
                vec![ScanAction::StartScan, self.arm(self.scan_window)]
            }
            ScanPhase::Paused => {
                debug!("Pause elapsed but scanning is no longer wanted.");
                self.phase = ScanPhase::Off;
                Vec::new()
            }
            ScanPhase::Off => Vec::new(),
        }
    }

    fn arm(&mut self, after: Duration) -> ScanAction {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.armed = Some(token);
        ScanAction::ArmTimer { after, token }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCAN: Duration = Duration::from_secs(2);
    const PAUSE: Duration = Duration::from_secs(10);

    fn armed_token(actions: &[ScanAction]) -> TimerToken {
        actions
            .iter()
            .find_map(|a| match a {
                ScanAction::ArmTimer { token, .. } => Some(*token),
                _ => None,
            })
            .expect("no timer armed")
    }

    #[test]
    fn alternates_scan_and_pause() {
        let mut scheduler = ScanScheduler::new(SCAN, PAUSE);

        let actions = scheduler.start();
        let t1 = armed_token(&actions);
        assert_eq!(
            actions,
            vec![ScanAction::StartScan, ScanAction::ArmTimer { after: SCAN, token: t1 }]
        );

        let actions = scheduler.on_timer(t1, true);
        let t2 = armed_token(&actions);
        assert_eq!(
            actions,
            vec![ScanAction::StopScan, ScanAction::ArmTimer { after: PAUSE, token: t2 }]
        );
        assert_eq!(scheduler.phase(), ScanPhase::Paused);

        let actions = scheduler.on_timer(t2, true);
        let t3 = armed_token(&actions);
        assert_eq!(
            actions,
            vec![ScanAction::StartScan, ScanAction::ArmTimer { after: SCAN, token: t3 }]
        );
        assert_eq!(scheduler.phase(), ScanPhase::Scanning);
    }

    #[test]
    fn start_is_idempotent() {
        let mut scheduler = ScanScheduler::new(SCAN, PAUSE);
        let first = scheduler.start();
        assert_eq!(first.len(), 2);
        assert!(scheduler.start().is_empty());
        assert_eq!(scheduler.armed_timer(), Some(armed_token(&first)));
    }

    #[test]
    fn start_during_pause_resumes_immediately() {
        let mut scheduler = ScanScheduler::new(SCAN, PAUSE);
        let t1 = armed_token(&scheduler.start());
        let t2 = armed_token(&scheduler.on_timer(t1, true));

        let actions = scheduler.start();
        assert_eq!(actions[0], ScanAction::StartScan);
        // the pause timer is replaced
        assert!(scheduler.on_timer(t2, true).is_empty());
        assert_eq!(scheduler.phase(), ScanPhase::Scanning);
    }

    #[test]
    fn stop_cancels_timer_and_makes_it_stale() {
        let mut scheduler = ScanScheduler::new(SCAN, PAUSE);
        let t1 = armed_token(&scheduler.start());

        assert_eq!(
            scheduler.stop(),
            vec![ScanAction::StopScan, ScanAction::CancelTimer]
        );
        assert!(scheduler.on_timer(t1, true).is_empty());
        assert_eq!(scheduler.phase(), ScanPhase::Off);
        assert!(scheduler.stop().is_empty());
    }

    #[test]
    fn stop_while_paused_only_cancels_timer() {
        let mut scheduler = ScanScheduler::new(SCAN, PAUSE);
        let t1 = armed_token(&scheduler.start());
        scheduler.on_timer(t1, true);
        assert_eq!(scheduler.stop(), vec![ScanAction::CancelTimer]);
    }

    #[test]
    fn pause_end_without_keep_scanning_stays_off() {
        let mut scheduler = ScanScheduler::new(SCAN, PAUSE);
        let t1 = armed_token(&scheduler.start());
        let t2 = armed_token(&scheduler.on_timer(t1, true));

        assert!(scheduler.on_timer(t2, false).is_empty());
        assert_eq!(scheduler.phase(), ScanPhase::Off);
        assert_eq!(scheduler.armed_timer(), None);
    }

    #[test]
    fn every_scan_window_is_bounded_by_a_timer() {
        let mut scheduler = ScanScheduler::new(SCAN, PAUSE);
        let mut actions = scheduler.start();
        for _ in 0..10 {
            if scheduler.phase() == ScanPhase::Scanning {
                assert!(scheduler.armed_timer().is_some());
            }
            let token = armed_token(&actions);
            actions = scheduler.on_timer(token, true);
        }
    }
}
