use core::time::Duration;

use shutter_core::bench::Bench;
use shutter_core::sequencer::{Command, Phase};
use shutter_core::shooting::{ExposureSetting, LineId, ShootingParameters};

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "focus",
        "focus [hold|release]                    - pulse or manually drive the focus line",
    ),
    (
        "shoot",
        "shoot <count> <delay> <exposure|hold> <interval> - start a shooting sequence",
    ),
    (
        "stop",
        "stop                                    - cancel the sequence and release both lines",
    ),
    (
        "step",
        "step                                    - fire the next scheduled timer",
    ),
    (
        "run",
        "run                                     - fire timers until the sequencer is idle",
    ),
    (
        "status",
        "status                                  - display sequencer state",
    ),
    (
        "help",
        "help [topic]                            - show help for a command",
    ),
];

/// Interactive session over a virtual-clock sequencer bench.
///
/// Commands feed the same state machine the firmware runs; timer firings are
/// advanced explicitly with `step`/`run` so every transition is observable.
pub struct Session {
    bench: Bench,
    seen_changes: usize,
    seen_notifications: usize,
}

impl Session {
    pub fn new() -> Self {
        Self {
            bench: Bench::new(),
            seen_changes: 0,
            seen_notifications: 0,
        }
    }

    pub fn handle_command(&mut self, line: &str) -> Vec<String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Vec::new();
        };
        let args: Vec<&str> = words.collect();

        match verb.to_ascii_lowercase().as_str() {
            "focus" => self.handle_focus(&args),
            "shoot" => self.handle_shoot(&args),
            "stop" => self.apply(Command::Stop),
            "step" => self.handle_step(),
            "run" => self.handle_run(),
            "status" => self.handle_status(),
            "help" => Self::handle_help(args.first().copied()),
            other => vec![format!("Unknown command `{other}`. Try `help`.")],
        }
    }

    fn handle_focus(&mut self, args: &[&str]) -> Vec<String> {
        match args {
            [] => self.apply(Command::TriggerFocus),
            ["hold"] => self.apply(Command::SetFocus(true)),
            ["release"] => self.apply(Command::SetFocus(false)),
            _ => vec!["Usage: focus [hold|release]".to_string()],
        }
    }

    fn handle_shoot(&mut self, args: &[&str]) -> Vec<String> {
        let [count, delay, exposure, interval] = args else {
            return vec!["Usage: shoot <count> <delay> <exposure|hold> <interval>".to_string()];
        };

        let parsed = count
            .parse::<u16>()
            .map_err(|_| format!("Invalid shot count `{count}`"))
            .and_then(|count| {
                Ok(ShootingParameters::new(
                    count,
                    parse_duration(delay)?,
                    parse_exposure(exposure)?,
                    parse_duration(interval)?,
                ))
            });

        match parsed {
            Ok(params) => self.apply(Command::StartShooting(params)),
            Err(message) => vec![message],
        }
    }

    fn handle_step(&mut self) -> Vec<String> {
        if self.bench.fire_next().is_none() {
            return vec!["No timer pending.".to_string()];
        }
        self.drain()
    }

    fn handle_run(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut fired = 0usize;
        // Drain after every firing so each report carries its own timestamp.
        while self.bench.fire_next().is_some() {
            fired += 1;
            lines.extend(self.drain());
        }
        lines.push(format!("{fired} timer(s) fired."));
        lines
    }

    fn handle_status(&self) -> Vec<String> {
        let phase = match self.bench.phase() {
            Phase::Idle => "idle",
            Phase::FocusActive => "focus active",
            Phase::WaitingToShoot => "waiting to shoot",
            Phase::ShutterActive => "shutter active",
        };
        let params = self.bench.controller().parameters();
        let pending = match self.bench.timers().next() {
            Some(timer) => format!("{:?} in {}ms", timer.event, timer.after.as_millis()),
            None => "none".to_string(),
        };

        vec![
            format!("phase: {phase}"),
            format!(
                "progress: {}/{} shots",
                self.bench.progress(),
                params.target_count
            ),
            format!(
                "lines: focus={} shutter={}",
                level(self.bench.outputs().is_active(LineId::Focus)),
                level(self.bench.outputs().is_active(LineId::Shutter)),
            ),
            format!("pending timer: {pending}"),
            format!("virtual clock: t+{}ms", self.bench.now().as_millis()),
        ]
    }

    fn handle_help(topic: Option<&str>) -> Vec<String> {
        match topic {
            None => HELP_TOPICS
                .iter()
                .map(|(_, text)| (*text).to_string())
                .collect(),
            Some(topic) => {
                let wanted = topic.to_ascii_lowercase();
                HELP_TOPICS
                    .iter()
                    .filter(|(name, _)| *name == wanted)
                    .map(|(_, text)| (*text).to_string())
                    .collect::<Vec<_>>()
            }
        }
    }

    fn apply(&mut self, command: Command) -> Vec<String> {
        self.bench.apply(command);
        self.drain()
    }

    /// Reports transitions and notifications produced since the last drain,
    /// stamped with the virtual clock.
    fn drain(&mut self) -> Vec<String> {
        let stamp = self.bench.now().as_millis();
        let mut lines = Vec::new();

        for change in &self.bench.outputs().changes()[self.seen_changes..] {
            let action = if change.active { "asserted" } else { "released" };
            lines.push(format!("[t+{stamp}ms] {} {action}", change.line));
        }
        self.seen_changes = self.bench.outputs().changes().len();

        let target = self.bench.controller().parameters().target_count;
        for shots in &self.bench.notifications()[self.seen_notifications..] {
            lines.push(format!("[t+{stamp}ms] progress {shots}/{target} notified"));
        }
        self.seen_notifications = self.bench.notifications().len();

        lines
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn level(active: bool) -> &'static str {
    if active { "active" } else { "released" }
}

fn parse_exposure(text: &str) -> Result<ExposureSetting, String> {
    if text.eq_ignore_ascii_case("hold") {
        Ok(ExposureSetting::Hold)
    } else {
        parse_duration(text).map(ExposureSetting::Timed)
    }
}

/// Parses `500ms`, `2s`, or a bare millisecond count.
fn parse_duration(text: &str) -> Result<Duration, String> {
    let (digits, unit) = match text.find(|c: char| !c.is_ascii_digit()) {
        Some(split) => text.split_at(split),
        None => (text, "ms"),
    };
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("Invalid duration `{text}`"))?;
    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(format!("Invalid duration `{text}` (use ms or s)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_output(session: &mut Session, line: &str) -> String {
        session.handle_command(line).join("\n")
    }

    #[test]
    fn parse_duration_accepts_suffixes_and_bare_millis() {
        assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_duration("2s"), Ok(Duration::from_secs(2)));
        assert_eq!(parse_duration("750"), Ok(Duration::from_millis(750)));
        assert!(parse_duration("2h").is_err());
        assert!(parse_duration("fast").is_err());
    }

    #[test]
    fn shoot_then_run_reports_every_transition() {
        let mut session = Session::new();
        let start = all_output(&mut session, "shoot 2 0 100ms 50ms");
        assert!(start.contains("shutter asserted"));

        let run = all_output(&mut session, "run");
        assert!(run.contains("[t+100ms] shutter released"));
        assert!(run.contains("[t+100ms] progress 1/2 notified"));
        assert!(run.contains("[t+250ms] progress 2/2 notified"));
        assert!(run.contains("3 timer(s) fired."));
    }

    #[test]
    fn status_reflects_a_held_exposure() {
        let mut session = Session::new();
        session.handle_command("shoot 1 0 hold 0");

        let status = all_output(&mut session, "status");
        assert!(status.contains("phase: shutter active"));
        assert!(status.contains("shutter=active"));
        assert!(status.contains("pending timer: none"));
    }

    #[test]
    fn stop_releases_lines_and_reports_them() {
        let mut session = Session::new();
        session.handle_command("shoot 1 0 hold 0");

        let stop = all_output(&mut session, "stop");
        assert!(stop.contains("shutter released"));

        let status = all_output(&mut session, "status");
        assert!(status.contains("phase: idle"));
    }

    #[test]
    fn malformed_shoot_reports_usage() {
        let mut session = Session::new();
        let output = all_output(&mut session, "shoot 3");
        assert!(output.contains("Usage: shoot"));

        let output = all_output(&mut session, "shoot many 0 0 0");
        assert!(output.contains("Invalid shot count"));
    }

    #[test]
    fn long_sequences_run_to_completion() {
        let mut session = Session::new();
        session.handle_command("shoot 40 0 10 10");

        let run = all_output(&mut session, "run");
        assert!(run.contains("79 timer(s) fired."));

        let status = all_output(&mut session, "status");
        assert!(status.contains("progress: 40/40 shots"));
        assert!(status.contains("phase: idle"));
    }

    #[test]
    fn step_with_nothing_pending_says_so() {
        let mut session = Session::new();
        let output = all_output(&mut session, "step");
        assert!(output.contains("No timer pending."));
    }
}
